//! Number, percent and currency rendering of document fields.

use crm_client::{Doc, FieldDescriptor, flt};
use crm_format::{MAX_PRECISION, NumberFormat, format_currency, format_number};

pub const FALLBACK_CURRENCY: &str = "USD";

/// Site-wide defaults applied when a field or document does not say otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayDefaults {
    pub currency: String,
    pub number_format: NumberFormat,
}

impl Default for DisplayDefaults {
    fn default() -> Self {
        Self {
            currency: FALLBACK_CURRENCY.to_string(),
            number_format: NumberFormat::WESTERN,
        }
    }
}

/// Currency code for a currency field.
///
/// Options naming a `doctype:field` path are not followed and fall back to
/// the default. Otherwise the code is read from the document, then from the
/// parent document.
pub fn resolve_currency<'a>(
    df: Option<&'a FieldDescriptor>,
    doc: &'a Doc,
    parent: Option<&'a Doc>,
    default: &'a str,
) -> &'a str {
    let Some(options) = df.and_then(|df| df.options.as_deref()).filter(|o| !o.is_empty()) else {
        return default;
    };
    if options.contains(':') {
        return default;
    }

    currency_code(doc, options)
        .or_else(|| parent.and_then(|p| currency_code(p, options)))
        .unwrap_or(default)
}

fn currency_code<'a>(doc: &'a Doc, fieldname: &str) -> Option<&'a str> {
    doc.get(fieldname)
        .and_then(|v| v.as_str())
        .filter(|code| !code.is_empty())
}

pub fn formatted_float(
    df: Option<&FieldDescriptor>,
    fieldname: &str,
    doc: &Doc,
    defaults: &DisplayDefaults,
) -> String {
    let precision = df.and_then(|df| df.precision);
    format_number(flt(doc.get(fieldname)), defaults.number_format, precision)
}

pub fn formatted_percent(
    df: Option<&FieldDescriptor>,
    fieldname: &str,
    doc: &Doc,
    defaults: &DisplayDefaults,
) -> String {
    format!("{}%", formatted_float(df, fieldname, doc, defaults))
}

pub fn formatted_currency(
    df: Option<&FieldDescriptor>,
    fieldname: &str,
    doc: &Doc,
    parent: Option<&Doc>,
    defaults: &DisplayDefaults,
) -> String {
    let currency = resolve_currency(df, doc, parent, &defaults.currency);
    format_currency(
        flt(doc.get(fieldname)),
        currency,
        df.and_then(|df| df.precision),
        defaults.number_format,
    )
}

/// Field value rounded to its declared precision.
pub fn float_with_precision(
    df: Option<&FieldDescriptor>,
    fieldname: &str,
    doc: &Doc,
    defaults: &DisplayDefaults,
) -> f64 {
    let precision = df
        .and_then(|df| df.precision)
        .unwrap_or(defaults.number_format.precision());
    let factor = 10f64.powi(precision.min(MAX_PRECISION) as i32);
    (flt(doc.get(fieldname)) * factor).round() / factor
}

/// Amount with grouping and precision but no currency symbol.
pub fn currency_with_precision(
    df: Option<&FieldDescriptor>,
    fieldname: &str,
    doc: &Doc,
    defaults: &DisplayDefaults,
) -> String {
    format_currency(
        flt(doc.get(fieldname)),
        "",
        df.and_then(|df| df.precision),
        defaults.number_format,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_client::FieldType;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Doc {
        value.as_object().cloned().unwrap_or_default()
    }

    fn currency_field(options: &str) -> FieldDescriptor {
        FieldDescriptor::new("annual_revenue", FieldType::Currency).with_options(options)
    }

    // ── Currency resolution ─────────────────────────────────────

    #[test]
    fn colon_options_use_default() {
        let df = currency_field("CRM Organization:currency");
        let d = doc(json!({ "CRM Organization:currency": "EUR", "currency": "EUR" }));
        assert_eq!(resolve_currency(Some(&df), &d, None, "USD"), "USD");
    }

    #[test]
    fn doc_beats_parent() {
        let df = currency_field("currency");
        let d = doc(json!({ "currency": "EUR" }));
        let parent = doc(json!({ "currency": "INR" }));
        assert_eq!(resolve_currency(Some(&df), &d, Some(&parent), "USD"), "EUR");
    }

    #[test]
    fn parent_used_when_doc_empty() {
        let df = currency_field("currency");
        let d = doc(json!({ "currency": "" }));
        let parent = doc(json!({ "currency": "INR" }));
        assert_eq!(resolve_currency(Some(&df), &d, Some(&parent), "USD"), "INR");
        assert_eq!(resolve_currency(Some(&df), &d, None, "USD"), "USD");
    }

    #[test]
    fn missing_field_uses_default() {
        assert_eq!(resolve_currency(None, &Doc::new(), None, "GBP"), "GBP");
    }

    // ── Rendering ───────────────────────────────────────────────

    #[test]
    fn currency_rendering() {
        let defaults = DisplayDefaults::default();
        let df = currency_field("currency");
        let d = doc(json!({ "annual_revenue": 1234.5, "currency": "USD" }));
        assert_eq!(formatted_currency(Some(&df), "annual_revenue", &d, None, &defaults), "$ 1,234.50");

        let d = doc(json!({ "annual_revenue": "1500000", "currency": "JPY" }));
        assert_eq!(formatted_currency(Some(&df), "annual_revenue", &d, None, &defaults), "¥ 1,500,000");
    }

    #[test]
    fn float_and_percent_use_field_precision() {
        let defaults = DisplayDefaults::default();
        let df = FieldDescriptor::new("probability", FieldType::Percent).with_precision(1);
        let d = doc(json!({ "probability": 62.345 }));
        assert_eq!(formatted_float(Some(&df), "probability", &d, &defaults), "62.3");
        assert_eq!(formatted_percent(Some(&df), "probability", &d, &defaults), "62.3%");
        assert_eq!(float_with_precision(Some(&df), "probability", &d, &defaults), 62.3);
    }

    #[test]
    fn missing_value_renders_as_zero() {
        let defaults = DisplayDefaults::default();
        assert_eq!(formatted_float(None, "amount", &Doc::new(), &defaults), "0.00");
        assert_eq!(currency_with_precision(None, "amount", &Doc::new(), &defaults), "0.00");
    }
}
