use std::collections::HashMap;

use crm_client::ViewType;
use serde::{Deserialize, Serialize};

pub const VIEW_TYPE_PARAM: &str = "viewType";

/// A desk navigation target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
    #[serde(default)]
    pub query: HashMap<String, String>,
}

impl Route {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The `viewType` param, when set and non-empty.
    pub fn view_type(&self) -> Option<ViewType> {
        self.params
            .get(VIEW_TYPE_PARAM)
            .filter(|t| !t.is_empty())
            .map(|t| ViewType::parse(t))
    }
}
