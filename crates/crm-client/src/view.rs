use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::de;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ViewType {
    #[default]
    List,
    GroupBy,
    Kanban,
    Other(String),
}

impl ViewType {
    pub fn as_str(&self) -> &str {
        match self {
            ViewType::List => "list",
            ViewType::GroupBy => "group_by",
            ViewType::Kanban => "kanban",
            ViewType::Other(s) => s.as_str(),
        }
    }

    /// Empty strings mean "list", like a missing type does.
    pub fn parse(s: &str) -> Self {
        match s {
            "" | "list" => ViewType::List,
            "group_by" => ViewType::GroupBy,
            "kanban" => ViewType::Kanban,
            other => ViewType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ViewType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ViewType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.map(|s| ViewType::parse(&s)).unwrap_or_default())
    }
}

/// A saved list, group-by or kanban configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    pub name: String,
    #[serde(rename = "type", default)]
    pub view_type: ViewType,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub dt: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub pinned: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub public: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub group: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_default: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_standard: bool,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub label: Option<String>,
    /// Filters, columns, ordering and anything else the server attaches.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ViewDescriptor {
    pub fn new(name: impl Into<String>, view_type: ViewType) -> Self {
        Self {
            name: name.into(),
            view_type,
            dt: None,
            pinned: false,
            public: false,
            group: false,
            is_default: false,
            is_standard: false,
            icon: None,
            label: None,
            extra: Map::new(),
        }
    }

    /// `"<dt> <type>"`, the key of the standard and default view maps.
    pub fn type_key(&self) -> Option<String> {
        self.dt
            .as_deref()
            .filter(|dt| !dt.is_empty())
            .map(|dt| view_key(dt, &self.view_type))
    }
}

pub fn view_key(doctype: &str, view_type: &ViewType) -> String {
    format!("{doctype} {view_type}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_or_null_type_is_list() {
        let a: ViewDescriptor = serde_json::from_value(json!({ "name": "v1" })).unwrap();
        let b: ViewDescriptor =
            serde_json::from_value(json!({ "name": "v2", "type": null })).unwrap();
        assert_eq!(a.view_type, ViewType::List);
        assert_eq!(b.view_type, ViewType::List);
    }

    #[test]
    fn flags_and_extra_fields() {
        let v: ViewDescriptor = serde_json::from_value(json!({
            "name": "VIEW-0001",
            "type": "kanban",
            "dt": "CRM Lead",
            "pinned": 1,
            "public": 0,
            "is_standard": true,
            "filters": "{\"status\": \"Open\"}",
        }))
        .unwrap();

        assert_eq!(v.view_type, ViewType::Kanban);
        assert!(v.pinned);
        assert!(!v.public);
        assert!(v.is_standard);
        assert_eq!(v.type_key().as_deref(), Some("CRM Lead kanban"));
        assert!(v.extra.contains_key("filters"));
    }

    #[test]
    fn type_key_needs_doctype() {
        let v = ViewDescriptor::new("x", ViewType::List);
        assert_eq!(v.type_key(), None);
    }
}
