//! Input literal grammar shared by the compiled-language harnesses.
//!
//! A raw input is a comma-separated list of top-level arguments, each a
//! JSON value: `[1,3,12,0,0], 9` or `"abc"` or `[[1,2],[3]]`.

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
#[error("input literal is not valid: {0}")]
pub struct LiteralError(String);

/// Split a raw input literal into its top-level arguments
pub fn parse_args(raw_input: &str) -> Result<Vec<Value>, LiteralError> {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(&format!("[{}]", trimmed)) {
        Ok(Value::Array(args)) => Ok(args),
        Ok(other) => Err(LiteralError(format!("expected an argument list, got {}", other))),
        Err(e) => Err(LiteralError(e.to_string())),
    }
}

/// Scalar element kinds, ordered so that numeric widening is `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scalar {
    Int,
    Long,
    Double,
    Bool,
    Str,
}

/// Static type inferred for a literal value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// `null`, or the element of an empty array
    Unknown,
    Scalar(Scalar),
    Array(Box<Shape>),
    /// Heterogeneous values with no common type
    Mixed,
}

fn is_numeric(scalar: Scalar) -> bool {
    matches!(scalar, Scalar::Int | Scalar::Long | Scalar::Double)
}

fn unify(a: Shape, b: Shape) -> Shape {
    match (a, b) {
        (Shape::Unknown, other) | (other, Shape::Unknown) => other,
        (Shape::Scalar(x), Shape::Scalar(y)) if x == y => Shape::Scalar(x),
        (Shape::Scalar(x), Shape::Scalar(y)) if is_numeric(x) && is_numeric(y) => {
            Shape::Scalar(x.max(y))
        }
        (Shape::Array(x), Shape::Array(y)) => match unify(*x, *y) {
            Shape::Mixed => Shape::Mixed,
            inner => Shape::Array(Box::new(inner)),
        },
        _ => Shape::Mixed,
    }
}

/// Infer the static shape of a value
pub fn shape_of(value: &Value) -> Shape {
    match value {
        Value::Null => Shape::Unknown,
        Value::Bool(_) => Shape::Scalar(Scalar::Bool),
        Value::Number(n) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => Shape::Scalar(Scalar::Int),
            Some(_) => Shape::Scalar(Scalar::Long),
            None => Shape::Scalar(Scalar::Double),
        },
        Value::String(_) => Shape::Scalar(Scalar::Str),
        Value::Array(items) => {
            let element = items
                .iter()
                .map(shape_of)
                .fold(Shape::Unknown, unify);
            match element {
                Shape::Mixed => Shape::Mixed,
                inner => Shape::Array(Box::new(inner)),
            }
        }
        Value::Object(_) => Shape::Mixed,
    }
}

/// Number rendered for a target scalar kind (`1` in a double array → `1.0`)
pub fn number_text(value: &serde_json::Number, target: Scalar) -> String {
    let text = value.to_string();
    match target {
        Scalar::Double if !text.contains(['.', 'e', 'E']) => format!("{}.0", text),
        _ => text,
    }
}

/// String rendered as a double-quoted, escaped source literal
pub fn string_text(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}
