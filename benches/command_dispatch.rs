//! Command dispatch benchmark suite.
//!
//! Measures the driver-side cost of one command without a page host:
//! - Request framing and parsing
//! - `Node` dispatch against an in-memory page
//!
//! Run with: cargo bench --bench command_dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use page_driver::protocol::wire::{read_request, write_request};
use page_driver::protocol::CommandRequest;
use page_driver::{Command, Credentials, ErrorMessage, InvocationResult, Page, PageManager};
use tokio::runtime::Runtime;

// ============================================================================
// In-memory Page
// ============================================================================

/// Page that reports every node attached and echoes the function name.
struct EchoPage;

#[async_trait]
impl Page for EchoPage {
    async fn invoke_capybara_function(&self, name: &str, _arguments: &[String]) -> InvocationResult {
        if name == "isAttached" {
            InvocationResult::value(true)
        } else {
            InvocationResult::value(name)
        }
    }

    async fn set_credentials(&self, _credentials: Credentials) -> Result<(), ErrorMessage> {
        Ok(())
    }
}

// ============================================================================
// Benchmark Parameters
// ============================================================================

const ARGUMENT_COUNTS: &[usize] = &[1, 8, 64];

fn arguments(count: usize) -> Vec<String> {
    std::iter::once("text".to_string())
        .chain((0..count).map(|i| format!("node-{i}")))
        .collect()
}

// ============================================================================
// Benchmark: Framing
// ============================================================================

fn bench_framing(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let mut group = c.benchmark_group("framing");

    for &count in ARGUMENT_COUNTS {
        let request = CommandRequest::new("Node", arguments(count));
        group.bench_with_input(BenchmarkId::new("round_trip", count), &request, |b, request| {
            b.to_async(&rt).iter(|| async {
                let mut buf = Vec::new();
                write_request(&mut buf, request).await.expect("write");
                let mut reader = buf.as_slice();
                black_box(read_request(&mut reader).await.expect("read"))
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Node Dispatch
// ============================================================================

fn bench_node_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let manager = PageManager::new(Arc::new(EchoPage));

    let mut group = c.benchmark_group("node_dispatch");

    for &count in ARGUMENT_COUNTS {
        let args = arguments(count);
        group.bench_with_input(BenchmarkId::new("execute", count), &args, |b, args| {
            b.to_async(&rt).iter(|| async {
                let command =
                    Command::parse("Node", args.clone(), Arc::clone(&manager)).expect("parse");
                black_box(command.execute().await.expect("execute"))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_framing, bench_node_dispatch);
criterion_main!(benches);
