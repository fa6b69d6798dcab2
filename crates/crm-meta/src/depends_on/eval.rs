use std::cmp::Ordering;

use crm_client::{Doc, flt, truthy};
use serde_json::Value;

use super::ExprError;
use super::parser::{CompareOp, Expr, number};

pub(crate) fn eval(expr: &Expr, doc: &Doc) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Doc => Ok(Value::Object(doc.clone())),
        Expr::Array(items) => items
            .iter()
            .map(|item| eval(item, doc))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Member(target, name) => {
            if matches!(**target, Expr::Doc) {
                return Ok(doc.get(name).cloned().unwrap_or(Value::Null));
            }
            Ok(member(&eval(target, doc)?, name))
        }
        Expr::Index(target, index) => {
            let target = eval(target, doc)?;
            let index = eval(index, doc)?;
            Ok(match (&target, &index) {
                (Value::Array(items), Value::Number(n)) => n
                    .as_u64()
                    .and_then(|i| items.get(i as usize).cloned())
                    .unwrap_or(Value::Null),
                (_, Value::String(key)) => member(&target, key),
                _ => Value::Null,
            })
        }
        Expr::Call(name, args) => call(name, args, doc),
        Expr::MethodCall(target, name, args) => {
            let target = eval(target, doc)?;
            let args = args
                .iter()
                .map(|a| eval(a, doc))
                .collect::<Result<Vec<_>, _>>()?;
            method(&target, name, &args)
        }
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval(inner, doc)?))),
        Expr::Neg(inner) => Ok(number(-to_number(&eval(inner, doc)?))),
        Expr::Compare(op, left, right) => {
            let left = eval(left, doc)?;
            let right = eval(right, doc)?;
            Ok(Value::Bool(compare(*op, &left, &right)))
        }
        Expr::And(left, right) => {
            let left = eval(left, doc)?;
            if truthy(&left) {
                eval(right, doc)
            } else {
                Ok(left)
            }
        }
        Expr::Or(left, right) => {
            let left = eval(left, doc)?;
            if truthy(&left) {
                Ok(left)
            } else {
                eval(right, doc)
            }
        }
    }
}

fn member(target: &Value, name: &str) -> Value {
    match (target, name) {
        (Value::Object(map), _) => map.get(name).cloned().unwrap_or(Value::Null),
        (Value::Array(items), "length") => Value::from(items.len()),
        (Value::String(s), "length") => Value::from(s.chars().count()),
        _ => Value::Null,
    }
}

fn call(name: &str, args: &[Expr], doc: &Doc) -> Result<Value, ExprError> {
    let args = args
        .iter()
        .map(|a| eval(a, doc))
        .collect::<Result<Vec<_>, _>>()?;
    match (name, args.as_slice()) {
        ("in_list", [list, value]) => Ok(Value::Bool(contains(list, value))),
        ("cint", [value]) => Ok(Value::from(to_number(value).trunc() as i64)),
        ("flt", [value]) => Ok(number(flt(Some(value)))),
        ("cstr", [value]) => Ok(Value::String(to_display(value))),
        _ => Err(ExprError(format!("unsupported function: {name}/{}", args.len()))),
    }
}

fn method(target: &Value, name: &str, args: &[Value]) -> Result<Value, ExprError> {
    match (target, name, args) {
        (Value::Array(_), "includes", [value]) => Ok(Value::Bool(contains(target, value))),
        (Value::String(s), "includes", [Value::String(needle)]) => {
            Ok(Value::Bool(s.contains(needle.as_str())))
        }
        (Value::String(s), "startsWith", [Value::String(prefix)]) => {
            Ok(Value::Bool(s.starts_with(prefix.as_str())))
        }
        (Value::String(s), "endsWith", [Value::String(suffix)]) => {
            Ok(Value::Bool(s.ends_with(suffix.as_str())))
        }
        (Value::String(s), "trim", []) => Ok(Value::String(s.trim().to_string())),
        (Value::String(s), "toLowerCase", []) => Ok(Value::String(s.to_lowercase())),
        (Value::String(s), "toUpperCase", []) => Ok(Value::String(s.to_uppercase())),
        _ => Err(ExprError(format!("unsupported method: {name}"))),
    }
}

fn contains(list: &Value, value: &Value) -> bool {
    match list {
        Value::Array(items) => items.iter().any(|item| loose_eq(item, value)),
        Value::String(s) => value.as_str().is_some_and(|v| s.contains(v)),
        _ => false,
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::Eq => loose_eq(left, right),
        CompareOp::NotEq => !loose_eq(left, right),
        CompareOp::StrictEq => strict_eq(left, right),
        CompareOp::StrictNotEq => !strict_eq(left, right),
        CompareOp::Lt => order(left, right) == Some(Ordering::Less),
        CompareOp::Lte => matches!(order(left, right), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => order(left, right) == Some(Ordering::Greater),
        CompareOp::Gte => matches!(
            order(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// `==` with JavaScript-style coercion between numbers, numeric strings and
/// booleans.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(_) | Value::Bool(_) | Value::String(_), Value::Number(_) | Value::Bool(_))
        | (Value::Number(_) | Value::Bool(_), Value::String(_)) => {
            let (a, b) = (to_number(left), to_number(right));
            !a.is_nan() && a == b
        }
        _ => left == right,
    }
}

fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Some(a.cmp(b));
    }
    to_number(left).partial_cmp(&to_number(right))
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn to_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
