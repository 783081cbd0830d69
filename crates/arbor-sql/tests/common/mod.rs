#![allow(dead_code)]

use arbor_sql::{BuildError, DialectName, ParamValue, Query, SqlBuilder};
use serde_json::Value;

pub fn builder(dialect: DialectName) -> SqlBuilder {
    SqlBuilder::new(dialect)
        .unwrap_or_else(|e| panic!("Failed to load dialect {dialect}: {e}"))
}

pub fn build(dialect: DialectName, query: &Value) -> Query {
    builder(dialect)
        .build(query)
        .unwrap_or_else(|e| panic!("Failed to build {query}: {e}"))
}

pub fn build_err(dialect: DialectName, query: &Value) -> BuildError {
    builder(dialect)
        .build(query)
        .expect_err(&format!("Expected build failure for: {query}"))
}

pub fn text(s: &str) -> ParamValue {
    ParamValue::Text(String::from(s))
}
