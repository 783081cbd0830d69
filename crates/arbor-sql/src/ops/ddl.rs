//! DDL statements: CREATE TABLE, indexes, DROP TABLE.

use serde_json::{Map, Value};

use crate::builder::SqlBuilder;
use crate::context::BuildCtx;
use crate::define::{Fixture, OperatorDef, Render, Shape, TypeDef};
use crate::dialect::DialectName;
use crate::error::{BuildError, Result};

const CREATE_SYNTAX: &str = "(CREATE TABLE <$table> (<$define>{, [$index]}))";

const COLUMN_ATTRS: [&str; 5] = ["$type", "$primary", "$notNull", "$unique", "$default"];
const INDEX_KEYS: [&str; 4] = ["$name", "$columns", "$table", "$unique"];

pub(crate) fn register(builder: &mut SqlBuilder) -> Result<()> {
    builder.register_syntax("$create", CREATE_SYNTAX)?;
    builder.register_operator("$create", op_create);
    builder.register_operator("$define", op_define);
    builder.register_operator("$index", op_index);
    builder.register_def(drop_def())?;
    Ok(())
}

fn op_create(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    ctx.set_main_operator("$create");
    let syntax = ctx
        .syntax("$create")
        .ok_or_else(|| BuildError::UnknownSyntax(String::from("$create")))?;
    ctx.build(value, identifier, Some(syntax), " ")
}

/// Column definitions: name to raw type text, or name to an attribute
/// object (`$type`, `$primary`, `$notNull`, `$unique`, `$default`).
fn op_define(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    let map = value
        .as_object()
        .filter(|map| !map.is_empty())
        .ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from("$define"),
            expected: String::from("non-empty object"),
        })?;

    let mut parts = Vec::with_capacity(map.len());
    for (name, definition) in map {
        let column = ctx.quote(name)?;
        match definition {
            Value::String(type_text) => parts.push(format!("{column} {type_text}")),
            Value::Object(attrs) => parts.push(column_definition(ctx, &column, attrs)?),
            _ => {
                return Err(BuildError::TypeMismatch {
                    operator: String::from("$define"),
                    expected: String::from("string, object"),
                });
            }
        }
    }
    Ok(parts.join(", "))
}

fn column_definition(
    ctx: &mut BuildCtx<'_>,
    column: &str,
    attrs: &Map<String, Value>,
) -> Result<String> {
    for key in attrs.keys() {
        if !COLUMN_ATTRS.contains(&key.as_str()) {
            return Err(BuildError::UnknownExpression(key.clone()));
        }
    }

    let type_text = attrs
        .get("$type")
        .and_then(Value::as_str)
        .ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from("$type"),
            expected: String::from("string"),
        })?;

    let mut sql = format!("{column} {type_text}");
    if bool_attr(attrs, "$primary")? {
        sql.push_str(" PRIMARY KEY");
    }
    if bool_attr(attrs, "$notNull")? {
        sql.push_str(" NOT NULL");
    }
    if bool_attr(attrs, "$unique")? {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = attrs.get("$default") {
        // DDL: rendered through add_value, which inlines for statement
        // kinds the dialect keeps parameter-free.
        let rendered = ctx.add_value(default)?;
        sql.push_str(" DEFAULT ");
        sql.push_str(&rendered);
    }
    Ok(sql)
}

fn bool_attr(attrs: &Map<String, Value>, key: &str) -> Result<bool> {
    match attrs.get(key) {
        None => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(BuildError::TypeMismatch {
            operator: String::from(key),
            expected: String::from("boolean"),
        }),
    }
}

/// An index. Nested under `$create` it renders as an inline INDEX clause;
/// standalone it renders a full CREATE INDEX statement and requires
/// `$table`.
fn op_index(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    let map = value
        .as_object()
        .ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from("$index"),
            expected: String::from("object"),
        })?;
    for key in map.keys() {
        if !INDEX_KEYS.contains(&key.as_str()) {
            return Err(BuildError::UnknownExpression(key.clone()));
        }
    }

    let name = map
        .get("$name")
        .and_then(Value::as_str)
        .ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from("$name"),
            expected: String::from("string"),
        })?;
    let columns = index_columns(ctx, map.get("$columns"))?;
    let unique = if bool_attr(map, "$unique")? {
        "UNIQUE "
    } else {
        ""
    };
    let quoted_name = ctx.quote(name)?;

    if ctx.main_operator() == Some("$create") {
        Ok(format!("{unique}INDEX {quoted_name} ({columns})"))
    } else {
        let table = map
            .get("$table")
            .and_then(Value::as_str)
            .ok_or_else(|| BuildError::InvalidContext {
                operator: String::from("$index"),
                message: String::from("a standalone index needs a $table"),
            })?;
        let quoted_table = ctx.quote(table)?;
        Ok(format!(
            "(CREATE {unique}INDEX {quoted_name} ON {quoted_table} ({columns}))"
        ))
    }
}

fn index_columns(ctx: &BuildCtx<'_>, value: Option<&Value>) -> Result<String> {
    match value {
        Some(Value::String(name)) => ctx.quote(name),
        Some(Value::Array(items)) if !items.is_empty() => {
            let quoted = items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| BuildError::TypeMismatch {
                            operator: String::from("$columns"),
                            expected: String::from("array of strings"),
                        })
                        .and_then(|name| ctx.quote(name))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(quoted.join(", "))
        }
        _ => Err(BuildError::TypeMismatch {
            operator: String::from("$columns"),
            expected: String::from("string, array of strings"),
        }),
    }
}

fn drop_def() -> OperatorDef {
    OperatorDef::new("$drop", "Drops a table.").with_type(
        TypeDef::new(
            Shape::String,
            "The table name.",
            Render::Template(String::from("DROP TABLE <ident>")),
        )
        .with_fixture(Fixture::new(
            DialectName::Ansi,
            r#"{"$drop":"people"}"#,
            "DROP TABLE `people`",
            "[]",
        )),
    )
}
