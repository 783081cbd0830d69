//! Bound parameter values.
//!
//! Every value pulled out of a query tree becomes a [`ParamValue`] in the
//! ordered parameter list, so the emitted SQL only ever contains
//! placeholders. The lone exception is the audited DDL path, which inlines
//! values through [`ParamValue::to_sql_inline`].

use serde_json::Value;

use crate::error::{BuildError, Result};

/// A value bound to a placeholder in the generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl ParamValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// Only used for statement kinds whose dialect forbids bound
    /// parameters (DDL). Everything else goes through the parameter list.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
        }
    }
}

impl TryFrom<&Value> for ParamValue {
    type Error = BuildError;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => n.as_i64().map_or_else(
                || {
                    n.as_f64()
                        .map(Self::Float)
                        .ok_or(BuildError::UnsupportedValue("number"))
                },
                |i| Ok(Self::Int(i)),
            ),
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Array(_) => Err(BuildError::UnsupportedValue("array")),
            Value::Object(_) => Err(BuildError::UnsupportedValue("object")),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(String::from(s))
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inline_null() {
        assert_eq!(ParamValue::Null.to_sql_inline(), "NULL");
    }

    #[test]
    fn inline_bool() {
        assert_eq!(ParamValue::Bool(true).to_sql_inline(), "TRUE");
        assert_eq!(ParamValue::Bool(false).to_sql_inline(), "FALSE");
    }

    #[test]
    fn inline_numbers() {
        assert_eq!(ParamValue::Int(42).to_sql_inline(), "42");
        assert_eq!(ParamValue::Int(-100).to_sql_inline(), "-100");
        assert_eq!(ParamValue::Float(2.5).to_sql_inline(), "2.5");
    }

    #[test]
    fn inline_text_escaping() {
        // Single quotes are escaped by doubling
        assert_eq!(
            ParamValue::Text(String::from("O'Brien")).to_sql_inline(),
            "'O''Brien'"
        );
        let malicious = "'; DROP TABLE users; --";
        assert_eq!(
            ParamValue::Text(String::from(malicious)).to_sql_inline(),
            "'''; DROP TABLE users; --'"
        );
    }

    #[test]
    fn from_json() {
        assert_eq!(ParamValue::try_from(&json!(null)).unwrap(), ParamValue::Null);
        assert_eq!(
            ParamValue::try_from(&json!(true)).unwrap(),
            ParamValue::Bool(true)
        );
        assert_eq!(ParamValue::try_from(&json!(7)).unwrap(), ParamValue::Int(7));
        assert_eq!(
            ParamValue::try_from(&json!(2.5)).unwrap(),
            ParamValue::Float(2.5)
        );
        assert_eq!(
            ParamValue::try_from(&json!("x")).unwrap(),
            ParamValue::Text(String::from("x"))
        );
    }

    #[test]
    fn structures_are_not_bindable() {
        assert!(ParamValue::try_from(&json!([1, 2])).is_err());
        assert!(ParamValue::try_from(&json!({"a": 1})).is_err());
    }
}
