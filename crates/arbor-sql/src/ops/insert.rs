//! INSERT statements.

use serde_json::Value;

use crate::builder::SqlBuilder;
use crate::context::BuildCtx;
use crate::error::{BuildError, Result};

/// The ANSI INSERT grammar. A statement carries exactly one row source:
/// whole documents, positional value rows, or a nested SELECT.
const INSERT_SYNTAX: &str =
    "(INSERT { INTO [$table]} [$columns] { [$documents] | [$values] | [$select]})";

pub(crate) fn register(builder: &mut SqlBuilder) -> Result<()> {
    builder.register_syntax("$insert", INSERT_SYNTAX)?;
    builder.register_operator("$insert", op_insert);
    builder.register_operator("$table", op_table);
    builder.register_operator("$documents", op_documents);
    builder.register_operator("$values", op_values);
    Ok(())
}

fn op_insert(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    ctx.set_main_operator("$insert");
    let syntax = ctx
        .syntax("$insert")
        .ok_or_else(|| BuildError::UnknownSyntax(String::from("$insert")))?;
    ctx.build(value, identifier, Some(syntax), " ")
}

fn op_table(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    match value.as_str() {
        Some(name) => ctx.quote(name),
        None => Err(BuildError::TypeMismatch {
            operator: String::from("$table"),
            expected: String::from("string"),
        }),
    }
}

/// Whole-document insertion. The column list comes from the first
/// document; every document contributes one VALUES group, binding NULL for
/// columns it does not carry. Values flatten in row-major order.
fn op_documents(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    let documents: Vec<&serde_json::Map<String, Value>> = match value {
        Value::Object(map) => vec![map],
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| BuildError::TypeMismatch {
                    operator: String::from("$documents"),
                    expected: String::from("array of objects"),
                })
            })
            .collect::<Result<_>>()?,
        _ => {
            return Err(BuildError::TypeMismatch {
                operator: String::from("$documents"),
                expected: String::from("object, non-empty array of objects"),
            });
        }
    };

    let columns: Vec<&str> = documents[0].keys().map(String::as_str).collect();
    if columns.is_empty() {
        return Err(BuildError::TypeMismatch {
            operator: String::from("$documents"),
            expected: String::from("objects with at least one column"),
        });
    }
    let column_list = columns
        .iter()
        .map(|column| ctx.quote(column))
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    let mut rows = Vec::with_capacity(documents.len());
    for document in &documents {
        let row = columns
            .iter()
            .map(|column| ctx.add_value(document.get(*column).unwrap_or(&Value::Null)))
            .collect::<Result<Vec<_>>>()?;
        rows.push(format!("({})", row.join(", ")));
    }

    Ok(format!("({column_list}) VALUES {}", rows.join(", ")))
}

/// Positional value rows: a flat array is a single row, an array of arrays
/// is one row per inner array.
fn op_values(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    let items = value
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from("$values"),
            expected: String::from("non-empty array"),
        })?;

    let rows: Vec<&[Value]> = if items.iter().all(Value::is_array) {
        items
            .iter()
            .filter_map(|row| row.as_array().map(Vec::as_slice))
            .collect()
    } else if items.iter().any(Value::is_array) {
        return Err(BuildError::TypeMismatch {
            operator: String::from("$values"),
            expected: String::from("array of rows or array of values, not a mix"),
        });
    } else {
        vec![items.as_slice()]
    };

    let mut groups = Vec::with_capacity(rows.len());
    for row in rows {
        let bound = row
            .iter()
            .map(|item| ctx.add_value(item))
            .collect::<Result<Vec<_>>>()?;
        groups.push(format!("({})", bound.join(", ")));
    }

    Ok(format!("VALUES {}", groups.join(", ")))
}
