use crm_client::api::{
    CALL_INTEGRATION_ENABLED, LEGACY_TWILIO_ENABLED, WHATSAPP_ENABLED, WHATSAPP_INSTALLED,
};
use crm_client::{Backend, FailureReporter, truthy};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Site integrations the desk adapts to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrationFlags {
    pub call_enabled: bool,
    pub twilio_enabled: bool,
    pub exotel_enabled: bool,
    /// `twilio`, `exotel` or empty.
    pub default_calling_medium: String,
    pub whatsapp_enabled: bool,
    pub whatsapp_installed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSettings {
    pub twilio_enabled: bool,
    pub exotel_enabled: bool,
    pub default_calling_medium: String,
}

/// The shapes the call-integration check has answered with across server
/// versions.
#[derive(Debug, Clone, PartialEq)]
pub enum CallIntegrationResponse {
    /// Twilio-only servers answer with a bare boolean.
    Flag(bool),
    Detailed {
        twilio_enabled: bool,
        exotel_enabled: bool,
        default_calling_medium: String,
    },
    /// An object using other key spellings.
    Aliased {
        twilio: Option<bool>,
        exotel: Option<bool>,
        medium: Option<String>,
    },
    Unknown,
}

const DETAILED_KEYS: [&str; 3] = ["twilio_enabled", "exotel_enabled", "default_calling_medium"];

impl CallIntegrationResponse {
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::Bool(enabled) => CallIntegrationResponse::Flag(*enabled),
            Value::Object(map) if DETAILED_KEYS.iter().any(|k| map.contains_key(*k)) => {
                CallIntegrationResponse::Detailed {
                    twilio_enabled: map.get("twilio_enabled").is_some_and(truthy),
                    exotel_enabled: map.get("exotel_enabled").is_some_and(truthy),
                    default_calling_medium: medium(map.get("default_calling_medium")),
                }
            }
            Value::Object(map) => CallIntegrationResponse::Aliased {
                twilio: map.get("twilio").map(truthy),
                exotel: map.get("exotel").map(truthy),
                medium: map
                    .get("defaultCallingMedium")
                    .map(|m| medium(Some(m)))
                    .filter(|m| !m.is_empty()),
            },
            _ => CallIntegrationResponse::Unknown,
        }
    }

    pub fn settings(&self) -> CallSettings {
        match self {
            CallIntegrationResponse::Flag(enabled) => CallSettings {
                twilio_enabled: *enabled,
                ..CallSettings::default()
            },
            CallIntegrationResponse::Detailed {
                twilio_enabled,
                exotel_enabled,
                default_calling_medium,
            } => CallSettings {
                twilio_enabled: *twilio_enabled,
                exotel_enabled: *exotel_enabled,
                default_calling_medium: default_calling_medium.clone(),
            },
            CallIntegrationResponse::Aliased {
                twilio,
                exotel,
                medium,
            } => CallSettings {
                twilio_enabled: twilio.unwrap_or(false),
                exotel_enabled: exotel.unwrap_or(false),
                default_calling_medium: medium.clone().unwrap_or_default(),
            },
            CallIntegrationResponse::Unknown => CallSettings::default(),
        }
    }
}

fn medium(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl IntegrationFlags {
    /// Query every integration check. Failed checks leave their flags off.
    pub async fn fetch<B: Backend>(backend: &B, reporter: &FailureReporter) -> Self {
        let epoch = reporter.epoch();
        let (whatsapp_enabled, whatsapp_installed, call) = tokio::join!(
            check(backend, reporter, epoch, WHATSAPP_ENABLED),
            check(backend, reporter, epoch, WHATSAPP_INSTALLED),
            call_settings(backend, reporter, epoch),
        );

        let flags = IntegrationFlags {
            call_enabled: call.twilio_enabled || call.exotel_enabled,
            twilio_enabled: call.twilio_enabled,
            exotel_enabled: call.exotel_enabled,
            default_calling_medium: call.default_calling_medium,
            whatsapp_enabled,
            whatsapp_installed,
        };
        debug!(?flags, "integration flags fetched");
        flags
    }
}

async fn check<B: Backend>(
    backend: &B,
    reporter: &FailureReporter,
    epoch: u64,
    method: &str,
) -> bool {
    match backend.call(method, json!({})).await {
        Ok(value) => truthy(&value),
        Err(e) => {
            reporter.report_from(epoch, method, &e);
            false
        }
    }
}

/// Call settings from the current endpoint, or from the Twilio-only endpoint
/// older servers expose.
async fn call_settings<B: Backend>(
    backend: &B,
    reporter: &FailureReporter,
    epoch: u64,
) -> CallSettings {
    let err = match backend.call(CALL_INTEGRATION_ENABLED, json!({})).await {
        Ok(value) => return CallIntegrationResponse::classify(&value).settings(),
        Err(e) => e,
    };
    warn!(error = %err, "call integration check failed, trying legacy twilio endpoint");

    match backend.call(LEGACY_TWILIO_ENABLED, json!({})).await {
        Ok(value) => {
            let twilio_enabled = truthy(&value);
            CallSettings {
                twilio_enabled,
                exotel_enabled: false,
                default_calling_medium: if twilio_enabled { "twilio".into() } else { String::new() },
            }
        }
        Err(e) => {
            reporter.report_from(epoch, LEGACY_TWILIO_ENABLED, &e);
            CallSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_is_twilio_only() {
        let settings = CallIntegrationResponse::classify(&json!(true)).settings();
        assert!(settings.twilio_enabled);
        assert!(!settings.exotel_enabled);
        assert_eq!(settings.default_calling_medium, "");
    }

    #[test]
    fn detailed_shape() {
        let response = CallIntegrationResponse::classify(&json!({
            "twilio_enabled": 0,
            "exotel_enabled": 1,
            "default_calling_medium": "exotel"
        }));
        assert!(matches!(response, CallIntegrationResponse::Detailed { .. }));
        let settings = response.settings();
        assert!(!settings.twilio_enabled);
        assert!(settings.exotel_enabled);
        assert_eq!(settings.default_calling_medium, "exotel");
    }

    #[test]
    fn one_detailed_key_is_enough() {
        let response = CallIntegrationResponse::classify(&json!({ "twilio_enabled": true, "exotel": true }));
        let settings = response.settings();
        assert!(settings.twilio_enabled);
        assert!(!settings.exotel_enabled);
    }

    #[test]
    fn aliased_keys() {
        let response = CallIntegrationResponse::classify(&json!({
            "twilio": false,
            "exotel": "yes",
            "defaultCallingMedium": "exotel"
        }));
        assert_eq!(
            response,
            CallIntegrationResponse::Aliased {
                twilio: Some(false),
                exotel: Some(true),
                medium: Some("exotel".into()),
            }
        );
    }

    #[test]
    fn anything_else_is_disabled() {
        for value in [json!(null), json!(1), json!("twilio"), json!([true])] {
            assert_eq!(CallIntegrationResponse::classify(&value).settings(), CallSettings::default());
        }
        assert_eq!(CallIntegrationResponse::classify(&json!({})).settings(), CallSettings::default());
    }
}
