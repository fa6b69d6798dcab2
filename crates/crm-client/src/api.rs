//! Typed wrappers over the server methods this layer consumes.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::backend::Backend;
use crate::error::ClientError;
use crate::meta::DocTypeResponse;
use crate::value::Doc;

pub const GET_DOCTYPE: &str = "frappe.desk.form.load.getdoctype";
pub const GET_DOC: &str = "frappe.client.get";
pub const SAVE_USER_SETTINGS: &str = "frappe.model.utils.user_settings.save";
pub const GET_VIEWS: &str = "next_crm.api.views.get_views";
pub const GET_DEFAULT_OPEN_VIEW: &str = "next_crm.api.views.get_default_open_view";
pub const GET_USERS: &str = "next_crm.api.session.get_users";
pub const WHATSAPP_ENABLED: &str = "next_crm.api.whatsapp.is_whatsapp_enabled";
pub const WHATSAPP_INSTALLED: &str = "next_crm.api.whatsapp.is_whatsapp_installed";
pub const CALL_INTEGRATION_ENABLED: &str = "crm.integrations.api.is_call_integration_enabled";
pub const LEGACY_TWILIO_ENABLED: &str = "next_crm.integrations.twilio.api.is_enabled";

/// Schema for `doctype` and its child tables, plus the user's settings.
pub async fn get_doctype<B: Backend>(
    backend: &B,
    doctype: &str,
) -> Result<DocTypeResponse, ClientError> {
    let value = backend
        .call(
            GET_DOCTYPE,
            json!({ "doctype": doctype, "with_parent": 1, "cached_timestamp": null }),
        )
        .await?;
    Ok(serde_json::from_value(value)?)
}

/// One document, e.g. a settings singleton where `name == doctype`.
pub async fn get_doc<B: Backend>(backend: &B, doctype: &str, name: &str) -> Result<Doc, ClientError> {
    let value = backend
        .call(GET_DOC, json!({ "doctype": doctype, "name": name }))
        .await?;
    Ok(serde_json::from_value(value)?)
}

/// Raw view records, optionally narrowed to one doctype.
///
/// Records are left undecoded so one malformed entry does not discard the
/// whole collection.
pub async fn get_views<B: Backend>(
    backend: &B,
    doctype: Option<&str>,
) -> Result<Vec<Value>, ClientError> {
    let value = backend
        .call(GET_VIEWS, json!({ "doctype": doctype.unwrap_or_default() }))
        .await?;
    match value {
        Value::Array(views) => Ok(views),
        Value::Null => Ok(Vec::new()),
        other => {
            debug!(response = %other, "views response is not a list");
            Ok(Vec::new())
        }
    }
}

/// `doctype -> view type` map as the server computed it, undecoded.
pub async fn get_default_open_view<B: Backend>(backend: &B) -> Result<Value, ClientError> {
    backend.call(GET_DEFAULT_OPEN_VIEW, json!({})).await
}

pub async fn save_user_settings<B: Backend>(
    backend: &B,
    doctype: &str,
    settings: &Map<String, Value>,
) -> Result<(), ClientError> {
    let encoded = serde_json::to_string(settings)?;
    backend
        .call(
            SAVE_USER_SETTINGS,
            json!({ "doctype": doctype, "user_settings": encoded }),
        )
        .await?;
    Ok(())
}
