//! In-memory [`Page`] for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::protocol::{ErrorMessage, InvocationResult};

use super::{Credentials, Page};

/// A page that answers invocations from a queue and records every call.
///
/// Once the queue is empty, invocations return `undefined`.
#[derive(Default)]
pub(crate) struct ScriptedPage {
    results: Mutex<VecDeque<InvocationResult>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
    credentials: Mutex<Option<Credentials>>,
    credentials_calls: AtomicUsize,
    shut_down: AtomicBool,
    credentials_error: Option<ErrorMessage>,
}

impl ScriptedPage {
    pub(crate) fn new(results: impl IntoIterator<Item = InvocationResult>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().collect()),
            ..Self::default()
        }
    }

    /// A page whose `set_credentials` always fails with `error`.
    pub(crate) fn rejecting_credentials(error: ErrorMessage) -> Self {
        Self {
            credentials_error: Some(error),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_names(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub(crate) fn credentials(&self) -> Option<Credentials> {
        self.credentials.lock().clone()
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Number of `set_credentials` calls, rejected ones included.
    pub(crate) fn credentials_calls(&self) -> usize {
        self.credentials_calls.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Page for ScriptedPage {
    async fn invoke_capybara_function(
        &self,
        name: &str,
        arguments: &[String],
    ) -> InvocationResult {
        self.calls
            .lock()
            .push((name.to_string(), arguments.to_vec()));
        self.results
            .lock()
            .pop_front()
            .unwrap_or_else(InvocationResult::undefined)
    }

    async fn set_credentials(&self, credentials: Credentials) -> Result<(), ErrorMessage> {
        self.credentials_calls.fetch_add(1, Ordering::AcqRel);
        if let Some(error) = &self.credentials_error {
            return Err(error.clone());
        }
        *self.credentials.lock() = Some(credentials);
        Ok(())
    }

    fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
    }
}
