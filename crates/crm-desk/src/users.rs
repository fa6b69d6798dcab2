use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crm_client::{Backend, Doc, FailureReporter, api, truthy};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

/// Resolves to the logged-in user in [`UserDirectory::user`].
pub const SESSION_USER: &str = "sessionUser";

pub const ROLE_SYSTEM_MANAGER: &str = "System Manager";
pub const ROLE_SALES_MANAGER: &str = "Sales Manager";
pub const ROLE_SALES_USER: &str = "Sales User";

/// A user as the server sends it. Fields this type has no accessor for are
/// kept as they came.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(Doc);

impl UserRecord {
    pub fn from_doc(doc: Doc) -> Self {
        UserRecord(doc)
    }

    /// Placeholder for a user the directory has not loaded, named after the
    /// local part of the email.
    pub fn stub(email: &str) -> Self {
        let local = email.split('@').next().filter(|l| !l.is_empty()).unwrap_or(email);
        let mut doc = Doc::new();
        doc.insert("name".into(), json!(email));
        doc.insert("email".into(), json!(email));
        doc.insert("full_name".into(), json!(local));
        doc.insert("first_name".into(), json!(local));
        doc.insert("last_name".into(), json!(""));
        doc.insert("user_image".into(), Value::Null);
        doc.insert("role".into(), Value::Null);
        UserRecord(doc)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> &str {
        self.text("name").unwrap_or_default()
    }

    pub fn email(&self) -> Option<&str> {
        self.text("email")
    }

    pub fn full_name(&self) -> Option<&str> {
        self.text("full_name")
    }

    pub fn first_name(&self) -> Option<&str> {
        self.text("first_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        self.text("last_name")
    }

    pub fn user_image(&self) -> Option<&str> {
        self.text("user_image")
    }

    pub fn role(&self) -> Option<&str> {
        self.text("role").filter(|r| !r.is_empty())
    }

    /// Older servers spell the flag `is_telphony_agent`.
    pub fn is_telephony_agent(&self) -> bool {
        ["is_telephony_agent", "is_telphony_agent"]
            .iter()
            .any(|key| self.0.get(*key).is_some_and(truthy))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Doc {
        &self.0
    }

    /// Overlay `fields`; keys in `fields` win.
    pub fn merge(&mut self, fields: Doc) {
        self.0.extend(fields);
    }
}

/// Users of the site, keyed by name (and `Administrator` also by email).
pub struct UserDirectory<B: Backend> {
    backend: Arc<B>,
    reporter: FailureReporter,
    session_user: RwLock<String>,
    users: RwLock<HashMap<String, UserRecord>>,
    crm_users: RwLock<Vec<String>>,
    generation: AtomicU64,
}

impl<B: Backend> UserDirectory<B> {
    pub fn new(backend: Arc<B>, reporter: FailureReporter, session_user: impl Into<String>) -> Self {
        Self {
            backend,
            reporter,
            session_user: RwLock::new(session_user.into()),
            users: RwLock::new(HashMap::new()),
            crm_users: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn session_user(&self) -> String {
        self.session_user.read().clone()
    }

    pub fn set_session_user(&self, email: impl Into<String>) {
        *self.session_user.write() = email.into();
    }

    /// Fetch `[all_users, crm_users]` and merge every record into what is
    /// already known.
    pub async fn reload(&self) -> bool {
        let generation = self.generation.load(Ordering::SeqCst);
        let epoch = self.reporter.epoch();
        let result = self.backend.call(api::GET_USERS, json!({})).await;
        if generation != self.generation.load(Ordering::SeqCst) {
            debug!("dropping users fetched before reset");
            return false;
        }

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                self.reporter.report_from(epoch, api::GET_USERS, &e);
                return false;
            }
        };

        let (all_users, crm_users) = match value {
            Value::Array(mut parts) => {
                let crm = if parts.len() > 1 { parts.swap_remove(1) } else { Value::Null };
                let all = parts.into_iter().next().unwrap_or(Value::Null);
                (all, crm)
            }
            other => {
                debug!(response = %other, "users response is not a pair");
                (Value::Null, Value::Null)
            }
        };

        let mut merged = 0;
        {
            let mut users = self.users.write();
            for record in as_list(all_users) {
                let Value::Object(fields) = record else {
                    continue;
                };
                let Some(name) = fields.get("name").and_then(Value::as_str).map(str::to_string)
                else {
                    continue;
                };
                let entry = users.entry(name.clone()).or_default();
                entry.merge(fields);
                let entry = entry.clone();

                if name == "Administrator" {
                    if let Some(email) = entry.email().filter(|e| !e.is_empty()) {
                        users.insert(email.to_string(), entry.clone());
                    }
                }
                merged += 1;
            }
        }

        let crm: Vec<String> = as_list(crm_users)
            .into_iter()
            .filter_map(|u| match u {
                Value::String(name) => Some(name),
                Value::Object(fields) => fields.get("name").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect();
        info!(users = merged, crm_users = crm.len(), "users loaded");
        *self.crm_users.write() = crm;
        true
    }

    /// Names of users with access to the CRM.
    pub fn crm_users(&self) -> Vec<String> {
        self.crm_users.read().clone()
    }

    /// `email`'s record, the session user's for `None` or `"sessionUser"`.
    /// Unknown users get a stub, which is remembered until a reload fills
    /// it in.
    pub fn user(&self, email: Option<&str>) -> UserRecord {
        let email = match email.filter(|e| !e.is_empty() && *e != SESSION_USER) {
            Some(email) => email.to_string(),
            None => self.session_user(),
        };

        if let Some(user) = self.users.read().get(&email) {
            return user.clone();
        }
        self.users
            .write()
            .entry(email.clone())
            .or_insert_with(|| UserRecord::stub(&email))
            .clone()
    }

    pub fn role(&self, email: Option<&str>) -> Option<String> {
        self.user(email).role().map(str::to_string)
    }

    pub fn is_admin(&self, email: Option<&str>) -> bool {
        self.role(email).as_deref() == Some(ROLE_SYSTEM_MANAGER)
    }

    pub fn is_manager(&self, email: Option<&str>) -> bool {
        self.role(email).as_deref() == Some(ROLE_SALES_MANAGER) || self.is_admin(email)
    }

    pub fn is_sales_user(&self, email: Option<&str>) -> bool {
        self.role(email).as_deref() == Some(ROLE_SALES_USER)
    }

    pub fn is_telephony_agent(&self, email: Option<&str>) -> bool {
        self.user(email).is_telephony_agent()
    }

    /// Overlay `fields` on the session user's record.
    pub fn update_current_user(&self, fields: Doc) {
        let email = self.session_user();
        self.user(Some(&email));
        if let Some(user) = self.users.write().get_mut(&email) {
            user.merge(fields);
        }
    }

    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.users.write().clear();
        self.crm_users.write().clear();
    }
}

fn as_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_uses_local_part() {
        let stub = UserRecord::stub("sam@example.com");
        assert_eq!(stub.name(), "sam@example.com");
        assert_eq!(stub.full_name(), Some("sam"));
        assert_eq!(stub.last_name(), Some(""));
        assert_eq!(stub.role(), None);
    }

    #[test]
    fn stub_without_at_sign() {
        let stub = UserRecord::stub("Guest");
        assert_eq!(stub.first_name(), Some("Guest"));
    }

    #[test]
    fn merge_keeps_existing_fields() {
        let mut user = UserRecord::stub("sam@example.com");
        let mut update = Doc::new();
        update.insert("user_image".into(), json!("/files/sam.png"));
        update.insert("role".into(), json!("Sales User"));
        user.merge(update);

        assert_eq!(user.user_image(), Some("/files/sam.png"));
        assert_eq!(user.role(), Some("Sales User"));
        assert_eq!(user.first_name(), Some("sam"));
    }

    #[test]
    fn telephony_flag_either_spelling() {
        let mut user = UserRecord::default();
        assert!(!user.is_telephony_agent());
        let mut doc = Doc::new();
        doc.insert("is_telphony_agent".into(), json!(1));
        user.merge(doc);
        assert!(user.is_telephony_agent());
    }
}
