//! `depends_on` visibility expressions.
//!
//! Fields carry expressions such as `eval:doc.status == 'Open'`. They are
//! evaluated against the document with a small expression language: member
//! and index access on `doc`, literals, comparison, `!`, `&&`, `||`, array
//! literals, `in_list`/`cint`/`flt`/`cstr`, and a handful of string and array
//! methods. Nothing else is reachable from an expression.

mod eval;
mod lexer;
mod parser;

use crm_client::{Doc, truthy};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid depends_on expression: {0}")]
pub struct ExprError(pub String);

/// A parsed expression, reusable across documents.
#[derive(Debug, Clone)]
pub struct DependsOn(Condition);

#[derive(Debug, Clone)]
enum Condition {
    Always,
    /// Bare fieldname: visible when the field is set. Child tables count as
    /// set when they have rows.
    Field(String),
    Expression(parser::Expr),
}

impl DependsOn {
    /// Parse an expression with or without its `eval:` prefix.
    pub fn parse(expression: &str) -> Result<Self, ExprError> {
        let trimmed = expression.trim();
        let Some(source) = trimmed.strip_prefix("eval:") else {
            return Ok(DependsOn(if trimmed.is_empty() {
                Condition::Always
            } else {
                Condition::Field(trimmed.to_string())
            }));
        };

        let source = source.trim();
        if source.is_empty() {
            return Ok(DependsOn(Condition::Always));
        }
        let expr = parser::parse(lexer::tokenize(source)?)?;
        Ok(DependsOn(Condition::Expression(expr)))
    }

    pub fn evaluate(&self, doc: &Doc) -> Result<bool, ExprError> {
        match &self.0 {
            Condition::Always => Ok(true),
            Condition::Field(name) => Ok(match doc.get(name) {
                Some(Value::Array(rows)) => !rows.is_empty(),
                Some(value) => truthy(value),
                None => false,
            }),
            Condition::Expression(expr) => eval::eval(expr, doc).map(|v| truthy(&v)),
        }
    }
}

/// Whether a field guarded by `expression` is visible for `doc`.
///
/// Absent expressions and expressions that fail to parse or evaluate yield
/// `true`.
pub fn evaluate_depends_on(expression: Option<&str>, doc: &Doc) -> bool {
    let Some(expression) = expression else {
        return true;
    };
    match DependsOn::parse(expression).and_then(|e| e.evaluate(doc)) {
        Ok(visible) => visible,
        Err(e) => {
            debug!(expression, error = %e, "depends_on evaluation failed, treating as visible");
            true
        }
    }
}
