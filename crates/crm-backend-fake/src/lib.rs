//! In-memory [`Backend`] for tests and local development.

pub mod fixtures;

use std::collections::HashMap;
use std::time::Duration;

use crm_client::{Backend, ClientError};
use http::StatusCode;
use parking_lot::Mutex;
use serde_json::{Value, json};

/// A canned failure. Rebuilt into a [`ClientError`] on every call.
#[derive(Debug, Clone)]
pub enum Failure {
    /// 401 with `exc_type: AuthenticationError`.
    Auth,
    Status(u16, String),
    Transport(String),
}

impl Failure {
    fn to_error(&self) -> ClientError {
        match self {
            Failure::Auth => ClientError::from_error_body(
                StatusCode::UNAUTHORIZED,
                &json!({ "exc_type": "AuthenticationError", "message": "Not logged in" }),
            ),
            Failure::Status(code, message) => ClientError::from_error_body(
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                &json!({ "message": message }),
            ),
            Failure::Transport(message) => ClientError::Transport(message.clone()),
        }
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Value(Value),
    Fail(Failure),
}

/// Answers each method with a fixed reply and records every call.
///
/// Methods without a reply fail with a transport error.
#[derive(Default)]
pub struct FakeBackend {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<(String, Value)>>,
    delay: Option<Duration>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preloaded with every method in [`fixtures`].
    pub fn with_fixtures() -> Self {
        let backend = Self::new();
        for method in fixtures::METHODS {
            if let Some(value) = fixtures::fixture(method) {
                backend.respond(method, value);
            }
        }
        backend
    }

    /// Hold every reply back for `delay`, so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_response(self, method: &str, value: Value) -> Self {
        self.respond(method, value);
        self
    }

    pub fn respond(&self, method: &str, value: Value) {
        self.replies
            .lock()
            .insert(method.to_string(), Reply::Value(value));
    }

    pub fn fail(&self, method: &str, failure: Failure) {
        self.replies
            .lock()
            .insert(method.to_string(), Reply::Fail(failure));
    }

    /// Number of calls made to `method`.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|(m, _)| m == method).count()
    }

    /// Params of every call to `method`, oldest first.
    pub fn params(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Backend for FakeBackend {
    async fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        self.calls.lock().push((method.to_string(), params));
        let reply = self.replies.lock().get(method).cloned();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Value(value)) => Ok(value),
            Some(Reply::Fail(failure)) => Err(failure.to_error()),
            None => Err(ClientError::Transport(format!("no reply for {method}"))),
        }
    }
}
