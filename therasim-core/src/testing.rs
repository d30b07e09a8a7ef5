//! Testing utilities.
//!
//! [`MockBackend`] stands in for the external completion service in
//! deterministic tests: it returns scripted responses in order and
//! records every call it receives, so tests can assert both on outputs
//! and on the exact prompts the pipeline built.

use crate::llm::{GenError, TextGen};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded round trip.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
}

/// A scripted completion backend.
pub struct MockBackend {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    /// Create a mock with no scripted responses.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock preloaded with responses, returned in order.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for response in responses {
            mock.queue_response(response);
        }
        mock
    }

    /// Append a response to the script.
    pub fn queue_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .push_back(response.into());
    }

    /// How many calls the mock has received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock lock poisoned").len()
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }

    /// The most recent recorded call, if any.
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .last()
            .cloned()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGen for MockBackend {
    async fn complete_text(&self, system: &str, user: &str) -> Result<String, GenError> {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .push(RecordedCall {
                system: system.to_string(),
                user: user.to_string(),
            });

        Ok(self
            .responses
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .unwrap_or_else(|| "The mock backend has no more scripted responses.".to_string()))
    }
}
