use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::de;

/// Server field types. Types this layer has no special handling for are kept
/// verbatim in [`FieldType::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum FieldType {
    #[default]
    Data,
    Text,
    SmallText,
    LongText,
    TextEditor,
    Select,
    Link,
    DynamicLink,
    Currency,
    Float,
    Percent,
    Int,
    Check,
    Date,
    Datetime,
    Time,
    Duration,
    Table,
    TableMultiSelect,
    Attach,
    AttachImage,
    Phone,
    Rating,
    Autocomplete,
    /// Not sent by the server: a `Link` to `User`, promoted during normalization.
    User,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Data => "Data",
            FieldType::Text => "Text",
            FieldType::SmallText => "Small Text",
            FieldType::LongText => "Long Text",
            FieldType::TextEditor => "Text Editor",
            FieldType::Select => "Select",
            FieldType::Link => "Link",
            FieldType::DynamicLink => "Dynamic Link",
            FieldType::Currency => "Currency",
            FieldType::Float => "Float",
            FieldType::Percent => "Percent",
            FieldType::Int => "Int",
            FieldType::Check => "Check",
            FieldType::Date => "Date",
            FieldType::Datetime => "Datetime",
            FieldType::Time => "Time",
            FieldType::Duration => "Duration",
            FieldType::Table => "Table",
            FieldType::TableMultiSelect => "Table MultiSelect",
            FieldType::Attach => "Attach",
            FieldType::AttachImage => "Attach Image",
            FieldType::Phone => "Phone",
            FieldType::Rating => "Rating",
            FieldType::Autocomplete => "Autocomplete",
            FieldType::User => "User",
            FieldType::Other(s) => s.as_str(),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Data" | "" => FieldType::Data,
            "Text" => FieldType::Text,
            "Small Text" => FieldType::SmallText,
            "Long Text" => FieldType::LongText,
            "Text Editor" => FieldType::TextEditor,
            "Select" => FieldType::Select,
            "Link" => FieldType::Link,
            "Dynamic Link" => FieldType::DynamicLink,
            "Currency" => FieldType::Currency,
            "Float" => FieldType::Float,
            "Percent" => FieldType::Percent,
            "Int" => FieldType::Int,
            "Check" => FieldType::Check,
            "Date" => FieldType::Date,
            "Datetime" => FieldType::Datetime,
            "Time" => FieldType::Time,
            "Duration" => FieldType::Duration,
            "Table" => FieldType::Table,
            "Table MultiSelect" => FieldType::TableMultiSelect,
            "Attach" => FieldType::Attach,
            "Attach Image" => FieldType::AttachImage,
            "Phone" => FieldType::Phone,
            "Rating" => FieldType::Rating,
            "Autocomplete" => FieldType::Autocomplete,
            "User" => FieldType::User,
            other => FieldType::Other(other.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Currency | FieldType::Float | FieldType::Percent | FieldType::Int
        )
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.map(|s| FieldType::parse(&s)).unwrap_or_default())
    }
}

/// One field of a document type's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub fieldname: String,
    #[serde(default)]
    pub fieldtype: FieldType,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub label: Option<String>,
    /// Choice list (Select), target doctype (Link/Table) or the name of the
    /// field holding a currency code (Currency).
    #[serde(default, deserialize_with = "de::opt_string")]
    pub options: Option<String>,
    #[serde(default, deserialize_with = "de::precision")]
    pub precision: Option<u32>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub depends_on: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub reqd: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub hidden: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub read_only: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub in_list_view: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDescriptor {
    pub fn new(fieldname: impl Into<String>, fieldtype: FieldType) -> Self {
        Self {
            fieldname: fieldname.into(),
            fieldtype,
            label: None,
            options: None,
            precision: None,
            depends_on: None,
            reqd: false,
            hidden: false,
            read_only: false,
            in_list_view: false,
            extra: Map::new(),
        }
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }
}

/// Schema and type-level flags of one document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocTypeMeta {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, deserialize_with = "de::flag")]
    pub istable: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub issingle: bool,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub title_field: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocTypeMeta {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
            istable: false,
            issingle: false,
            title_field: None,
            extra: Map::new(),
        }
    }

    pub fn field(&self, fieldname: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.fieldname == fieldname)
    }
}

/// Response of the schema endpoint: the requested doctype plus its child tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocTypeResponse {
    #[serde(default)]
    pub docs: Vec<DocTypeMeta>,
    #[serde(default)]
    pub user_settings: UserSettingsPayload,
}

/// The shapes `user_settings` has been seen in.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UserSettingsPayload {
    #[default]
    Missing,
    /// A JSON document serialized into a string, the usual shape.
    Encoded(String),
    Object(Map<String, Value>),
    Unknown(Value),
}

impl UserSettingsPayload {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => UserSettingsPayload::Missing,
            Value::String(s) => UserSettingsPayload::Encoded(s),
            Value::Object(map) => UserSettingsPayload::Object(map),
            other => UserSettingsPayload::Unknown(other),
        }
    }

    /// Decode into a settings object. Anything that is not an object decodes
    /// to an empty one.
    pub fn into_settings(self) -> Map<String, Value> {
        match self {
            UserSettingsPayload::Object(map) => map,
            UserSettingsPayload::Encoded(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    debug!(kind = json_kind(&other), "user settings is not an object");
                    Map::new()
                }
                Err(e) => {
                    debug!(error = %e, "user settings is not valid JSON");
                    Map::new()
                }
            },
            UserSettingsPayload::Unknown(other) => {
                debug!(kind = json_kind(&other), "unexpected user settings payload");
                Map::new()
            }
            UserSettingsPayload::Missing => Map::new(),
        }
    }
}

impl<'de> Deserialize<'de> for UserSettingsPayload {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Value::deserialize(d).map(UserSettingsPayload::from_value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
