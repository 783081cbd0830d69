//! UPDATE and DELETE statements.

use serde_json::Value;

use crate::builder::SqlBuilder;
use crate::context::BuildCtx;
use crate::define::{Fixture, OperatorDef, Render, Shape, TypeDef};
use crate::dialect::DialectName;
use crate::error::{BuildError, Result};

const UPDATE_SYNTAX: &str = "(UPDATE <$table> { SET [$set]} { WHERE [$where]})";

pub(crate) fn register(builder: &mut SqlBuilder) -> Result<()> {
    builder.register_syntax("$update", UPDATE_SYNTAX)?;
    builder.register_operator("$update", op_update);
    builder.register_operator("$set", op_set);
    builder.register_def(delete_def())?;
    Ok(())
}

fn op_update(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    ctx.set_main_operator("$update");
    let syntax = ctx
        .syntax("$update")
        .ok_or_else(|| BuildError::UnknownSyntax(String::from("$update")))?;
    ctx.build(value, identifier, Some(syntax), " ")
}

/// Column assignments. Values bind as parameters; a `~~` prefix assigns
/// from another column instead.
fn op_set(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    let map = value
        .as_object()
        .filter(|map| !map.is_empty())
        .ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from("$set"),
            expected: String::from("non-empty object"),
        })?;
    let mut parts = Vec::with_capacity(map.len());
    for (column, item) in map {
        let quoted = ctx.quote(column)?;
        let rendered = ctx.add_value(item)?;
        parts.push(format!("{quoted} = {rendered}"));
    }
    Ok(parts.join(", "))
}

fn set_delete_main(ctx: &mut BuildCtx<'_>, value: &Value) -> Result<Value> {
    ctx.set_main_operator("$delete");
    Ok(value.clone())
}

fn delete_def() -> OperatorDef {
    OperatorDef::new("$delete", "Deletes rows from a table.")
        .with_before(set_delete_main)
        .with_type(
            TypeDef::new(
                Shape::Object,
                "The statement body: $from plus an optional $where.",
                Render::Template(String::from("(DELETE { FROM [$from]} { WHERE [$where]})")),
            )
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$delete":{"$from":"people","$where":{"id":7}}}"#,
                "DELETE FROM `people` WHERE `id` = ?",
                "[7]",
            ))
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$delete":{"$from":"people"}}"#,
                "DELETE FROM `people`",
                "[]",
            )),
        )
}
