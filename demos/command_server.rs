//! Command server bound to a page host.
//!
//! Demonstrates:
//! - Binding the page host listener and printing its URL
//! - Waiting for the page host READY handshake
//! - Serving command clients until Ctrl+C
//!
//! Usage:
//!   cargo run --example command_server
//!   cargo run --example command_server -- --debug
//!   cargo run --example command_server -- --port 9200

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use page_driver::{Result, Server};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    port: u16,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let port = args
            .iter()
            .position(|a| a == "--port")
            .and_then(|i| args.get(i + 1))
            .and_then(|p| p.parse().ok())
            .unwrap_or(0);

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            port,
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "page_driver=debug"
    } else {
        "page_driver=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let server = Server::builder()
        .command_port(args.port)
        .connect_timeout(Duration::from_secs(120))
        .build()?;

    let listener = server.bind_page_host().await?;
    println!("[Setup] Start the page host with: {}", listener.ws_url());

    let manager = server.connect_page(listener).await?;
    let commands = server.listen(manager).await?;

    // Clients wait for this exact line on stdout
    println!("listening on port: {}", commands.port());

    println!("Press Ctrl+C to exit...");
    tokio::signal::ctrl_c().await.ok();

    commands.shutdown();
    Ok(())
}
