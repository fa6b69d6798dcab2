use std::time::Duration;

use http::StatusCode;
use serde_json::Value;
use tracing::debug;
use ureq::Agent;

use crate::backend::Backend;
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Site root, e.g. `https://crm.example.com`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub timeout: Duration,
}

impl HttpBackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            api_secret: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// [`Backend`] over `POST <base_url>/api/method/<method>`.
///
/// ureq is blocking, so every call runs on tokio's blocking pool.
#[derive(Clone)]
pub struct HttpBackend {
    agent: Agent,
    base_url: String,
    authorization: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &HttpBackendConfig) -> Self {
        let agent = Agent::new_with_config(
            Agent::config_builder()
                .timeout_global(Some(config.timeout))
                .http_status_as_error(false)
                .build(),
        );

        let authorization = match (&config.api_key, &config.api_secret) {
            (Some(key), Some(secret)) => Some(format!("token {key}:{secret}")),
            _ => None,
        };

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/api/method/{}", self.base_url, method)
    }
}

impl Backend for HttpBackend {
    async fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let agent = self.agent.clone();
        let url = self.method_url(method);
        let authorization = self.authorization.clone();
        let body = serde_json::to_string(&params)?;

        debug!(method, "calling remote method");
        tokio::task::spawn_blocking(move || send(&agent, &url, authorization.as_deref(), body))
            .await
            .map_err(|e| ClientError::Transport(format!("request task failed: {e}")))?
    }
}

fn send(
    agent: &Agent,
    url: &str,
    authorization: Option<&str>,
    body: String,
) -> Result<Value, ClientError> {
    let mut request = agent
        .post(url)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json");
    if let Some(token) = authorization {
        request = request.header("Authorization", token);
    }

    let mut response = request
        .send(body)
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    let status = response.status();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    decode_response(status, &text)
}

/// Unwrap the `message` envelope, or turn an error status into [`ClientError::Server`].
pub(crate) fn decode_response(status: StatusCode, text: &str) -> Result<Value, ClientError> {
    if !status.is_success() {
        let body = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        return Err(ClientError::from_error_body(status, &body));
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    match serde_json::from_str(text)? {
        Value::Object(mut body) => {
            if let Some(exc_type) = body.get("exc_type").and_then(Value::as_str) {
                if exc_type == "AuthenticationError" || exc_type == "SessionExpired" {
                    return Err(ClientError::from_error_body(status, &Value::Object(body)));
                }
            }
            Ok(body.remove("message").unwrap_or(Value::Object(body)))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_envelope_is_unwrapped() {
        let value = decode_response(StatusCode::OK, r#"{"message": [1, 2]}"#).unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn body_without_message_is_returned_whole() {
        let value =
            decode_response(StatusCode::OK, r#"{"docs": [], "user_settings": "{}"}"#).unwrap();
        assert_eq!(value, json!({ "docs": [], "user_settings": "{}" }));
    }

    #[test]
    fn empty_body_is_null() {
        assert_eq!(decode_response(StatusCode::OK, "").unwrap(), Value::Null);
    }

    #[test]
    fn error_status_carries_exc_type() {
        let err = decode_response(
            StatusCode::UNAUTHORIZED,
            r#"{"exc_type": "AuthenticationError", "message": "Not permitted"}"#,
        )
        .unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn html_error_page() {
        let err = decode_response(StatusCode::BAD_GATEWAY, "<html>oops</html>").unwrap_err();
        assert!(!err.is_auth());
        assert!(err.to_string().contains("<html>oops</html>"));
    }

    #[test]
    fn malformed_success_body_is_a_decode_error() {
        let err = decode_response(StatusCode::OK, "{not json").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn authorization_header_requires_key_and_secret() {
        let mut config = HttpBackendConfig::new("https://crm.example.com/");
        assert!(HttpBackend::new(&config).authorization.is_none());

        config.api_key = Some("k".into());
        config.api_secret = Some("s".into());
        let backend = HttpBackend::new(&config);
        assert_eq!(backend.authorization.as_deref(), Some("token k:s"));
        assert_eq!(
            backend.method_url("next_crm.api.views.get_views"),
            "https://crm.example.com/api/method/next_crm.api.views.get_views"
        );
    }
}
