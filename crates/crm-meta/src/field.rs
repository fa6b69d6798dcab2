use crm_client::{FieldDescriptor, FieldType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    fn new(option: &str) -> Self {
        Self {
            label: option.to_string(),
            value: option.to_string(),
        }
    }
}

/// `options` after interpretation by field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOptions {
    None,
    Choices(Vec<SelectOption>),
    /// Target doctype of a Link or table field.
    Target(String),
    Raw(String),
}

/// A field as the desk renders it. Derived from the cached descriptor, which
/// is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedField {
    pub fieldtype: FieldType,
    pub options: FieldOptions,
    pub df: FieldDescriptor,
}

impl NormalizedField {
    pub fn fieldname(&self) -> &str {
        &self.df.fieldname
    }

    pub fn label(&self) -> &str {
        self.df.label.as_deref().unwrap_or(&self.df.fieldname)
    }

    pub fn choices(&self) -> &[SelectOption] {
        match &self.options {
            FieldOptions::Choices(choices) => choices,
            _ => &[],
        }
    }
}

pub fn normalize(df: &FieldDescriptor) -> NormalizedField {
    let options = df.options.as_deref();
    let (fieldtype, options) = match (&df.fieldtype, options) {
        (FieldType::Select, Some(raw)) => (FieldType::Select, FieldOptions::Choices(choices(raw))),
        (FieldType::Link, Some("User")) => (FieldType::User, FieldOptions::Target("User".into())),
        (
            FieldType::Link
            | FieldType::DynamicLink
            | FieldType::Table
            | FieldType::TableMultiSelect,
            Some(target),
        ) => (df.fieldtype.clone(), FieldOptions::Target(target.to_string())),
        (fieldtype, Some(raw)) => (fieldtype.clone(), FieldOptions::Raw(raw.to_string())),
        (fieldtype, None) => (fieldtype.clone(), FieldOptions::None),
    };

    NormalizedField {
        fieldtype,
        options,
        df: df.clone(),
    }
}

/// Newline-separated choices with a leading blank entry.
fn choices(raw: &str) -> Vec<SelectOption> {
    let mut choices: Vec<SelectOption> = raw.split('\n').map(SelectOption::new).collect();
    if choices.first().is_none_or(|c| !c.value.is_empty()) {
        choices.insert(0, SelectOption::new(""));
    }
    choices
}
