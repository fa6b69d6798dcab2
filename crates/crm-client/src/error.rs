use http::StatusCode;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server error ({status}): {message}")]
    Server {
        status: StatusCode,
        exc_type: Option<String>,
        message: String,
    },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

const AUTH_EXC_TYPES: [&str; 2] = ["AuthenticationError", "SessionExpired"];

impl ClientError {
    /// Build a server error from a non-2xx response body.
    pub fn from_error_body(status: StatusCode, body: &Value) -> Self {
        let exc_type = body
            .get("exc_type")
            .and_then(Value::as_str)
            .map(str::to_string);

        let message = ["message", "exception", "_error_message"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| body.as_str().map(str::to_string))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        ClientError::Server {
            status,
            exc_type,
            message,
        }
    }

    /// Whether the caller should be sent back to the login flow.
    pub fn is_auth(&self) -> bool {
        match self {
            ClientError::Server {
                status, exc_type, ..
            } => {
                *status == StatusCode::UNAUTHORIZED
                    || (*status == StatusCode::FORBIDDEN
                        && exc_type.as_deref() != Some("PermissionError"))
                    || exc_type
                        .as_deref()
                        .is_some_and(|t| AUTH_EXC_TYPES.contains(&t))
            }
            ClientError::Transport(_) | ClientError::Decode(_) => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ClientError::Server { status, .. } => *status,
            ClientError::Transport(_) => StatusCode::BAD_GATEWAY,
            ClientError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
