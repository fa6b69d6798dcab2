use std::future::Future;

use serde_json::Value;

use crate::error::ClientError;

/// A remote method-call surface (`/api/method/<name>` style).
///
/// Caches in this workspace only ever talk to the server through this trait;
/// [`crate::HttpBackend`] is the production implementation and tests supply
/// in-memory fakes.
pub trait Backend: Send + Sync + 'static {
    /// Invoke `method` with a JSON object of params.
    ///
    /// Implementations unwrap the server's `message` envelope when present and
    /// return the whole body otherwise.
    fn call(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, ClientError>> + Send;
}
