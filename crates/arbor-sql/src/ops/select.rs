//! SELECT statements and their clause operators.

use serde_json::Value;

use crate::builder::SqlBuilder;
use crate::context::BuildCtx;
use crate::define::{Fixture, ItemDef, ItemKey, OperatorDef, Render, Shape, TypeDef};
use crate::dialect::DialectName;
use crate::error::{BuildError, Result};

/// The ANSI SELECT grammar. LIMIT/OFFSET are not ANSI SQL, so their slots
/// carry dialect annotations and disappear from the baseline grammar.
const SELECT_SYNTAX: &str = "(SELECT [$distinct] <$columns> \
    { FROM [$from]} \
    { WHERE [$where]} \
    { GROUP BY [$groupBy]} \
    { HAVING [$having]} \
    { ORDER BY [$sort]} \
    { LIMIT [$limit] -->(mysql,postgres,sqlite)} \
    { OFFSET [$offset] -->(mysql,postgres,sqlite)})";

pub(crate) fn register(builder: &mut SqlBuilder) -> Result<()> {
    builder.register_syntax("$select", SELECT_SYNTAX)?;
    builder.register_operator("$select", op_select);
    builder.register_operator("$columns", op_columns);
    builder.register_operator("$from", op_from);
    builder.register_operator("$where", op_where);
    builder.register_operator("$having", op_having);
    builder.register_def(distinct_def())?;
    builder.register_def(group_by_def())?;
    builder.register_def(sort_def())?;
    builder.register_def(limit_def())?;
    builder.register_def(offset_def())?;
    Ok(())
}

fn op_select(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    ctx.set_main_operator("$select");
    let syntax = ctx
        .syntax("$select")
        .ok_or_else(|| BuildError::UnknownSyntax(String::from("$select")))?;
    // $columns defaults to '*' so that the required slot is always satisfied.
    match value.as_object() {
        Some(map) if !map.contains_key("$columns") => {
            let mut with_columns = map.clone();
            with_columns.insert(String::from("$columns"), Value::String(String::from("*")));
            ctx.build(&Value::Object(with_columns), identifier, Some(syntax), " ")
        }
        _ => ctx.build(value, identifier, Some(syntax), " "),
    }
}

/// Renders a column/table entry, appending `AS alias` when requested.
/// Strings are quoted identifiers; objects are built recursively (keeping
/// the parentheses a nested SELECT renders with).
pub(crate) fn aliased(
    ctx: &mut BuildCtx<'_>,
    operator: &str,
    value: &Value,
    alias: Option<&str>,
) -> Result<String> {
    let rendered = match value {
        Value::String(name) => ctx.quote(name)?,
        Value::Object(_) => ctx.build(value, None, None, " ")?,
        _ => {
            return Err(BuildError::TypeMismatch {
                operator: String::from(operator),
                expected: String::from("string, object"),
            });
        }
    };
    match alias {
        Some(alias) => Ok(format!("{rendered} AS {}", ctx.quote(alias)?)),
        None => Ok(rendered),
    }
}

fn is_alias_map(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| !map.is_empty() && !map.keys().any(|k| k.starts_with('$')))
}

pub(crate) fn entry_list(ctx: &mut BuildCtx<'_>, operator: &str, value: &Value) -> Result<String> {
    let mut parts = Vec::new();
    match value {
        Value::String(_) => parts.push(aliased(ctx, operator, value, None)?),
        Value::Array(items) => {
            for item in items {
                if is_alias_map(item) {
                    for (alias, entry) in item.as_object().into_iter().flatten() {
                        parts.push(aliased(ctx, operator, entry, Some(alias.as_str()))?);
                    }
                } else {
                    parts.push(aliased(ctx, operator, item, None)?);
                }
            }
        }
        Value::Object(map) if is_alias_map(value) => {
            for (alias, entry) in map {
                parts.push(aliased(ctx, operator, entry, Some(alias.as_str()))?);
            }
        }
        _ => {
            return Err(BuildError::TypeMismatch {
                operator: String::from(operator),
                expected: String::from("string, array, object"),
            });
        }
    }
    Ok(parts.join(", "))
}

fn op_columns(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    let list = entry_list(ctx, "$columns", value)?;
    // Inside an INSERT the column list is parenthesized.
    if ctx.main_operator() == Some("$insert") {
        Ok(format!("({list})"))
    } else {
        Ok(list)
    }
}

fn op_from(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    entry_list(ctx, "$from", value)
}

/// A condition list: an object (keys joined with AND) or an array of
/// condition objects.
pub(crate) fn condition_list(
    ctx: &mut BuildCtx<'_>,
    operator: &str,
    value: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    match value {
        Value::Object(_) | Value::Array(_) => ctx.build(value, identifier, None, " AND "),
        _ => Err(BuildError::TypeMismatch {
            operator: String::from(operator),
            expected: String::from("object, array"),
        }),
    }
}

fn op_where(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    condition_list(ctx, "$where", value, identifier)
}

fn op_having(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    condition_list(ctx, "$having", value, identifier)
}

fn render_distinct(
    _ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    Ok(if value.as_bool() == Some(true) {
        String::from("DISTINCT")
    } else {
        String::new()
    })
}

fn distinct_def() -> OperatorDef {
    OperatorDef::new("$distinct", "Emits the DISTINCT row quantifier of a SELECT.").with_type(
        TypeDef::new(
            Shape::Boolean,
            "true emits DISTINCT; false emits nothing.",
            Render::Func(render_distinct),
        )
        .with_fixture(Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$distinct":true}}"#,
            "SELECT DISTINCT * FROM `people`",
            "[]",
        ))
        .with_fixture(Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$distinct":false}}"#,
            "SELECT * FROM `people`",
            "[]",
        )),
    )
}

fn group_by_def() -> OperatorDef {
    OperatorDef::new("$groupBy", "Lists the GROUP BY columns of a SELECT.")
        .with_type(
            TypeDef::new(
                Shape::String,
                "A single column name.",
                Render::Template(String::from("<ident>")),
            )
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$select":{"$from":"orders","$groupBy":"status"}}"#,
                "SELECT * FROM `orders` GROUP BY `status`",
                "[]",
            )),
        )
        .with_type(
            TypeDef::new(
                Shape::Array,
                "Several column names, emitted in order.",
                Render::EachItem {
                    join: ", ",
                    items: vec![ItemDef::new(ItemKey::Shape(Shape::String), "<ident>")],
                },
            )
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$select":{"$from":"orders","$groupBy":["status","region"]}}"#,
                "SELECT * FROM `orders` GROUP BY `status`, `region`",
                "[]",
            )),
        )
}

fn sort_def() -> OperatorDef {
    OperatorDef::new("$sort", "Lists the ORDER BY terms of a SELECT.")
        .with_type(
            TypeDef::new(
                Shape::String,
                "A single column name, ascending.",
                Render::Template(String::from("<ident>")),
            )
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$select":{"$from":"people","$sort":"last_name"}}"#,
                "SELECT * FROM `people` ORDER BY `last_name`",
                "[]",
            )),
        )
        .with_type(
            TypeDef::new(
                Shape::Array,
                "Several column names, ascending, emitted in order.",
                Render::EachItem {
                    join: ", ",
                    items: vec![ItemDef::new(ItemKey::Shape(Shape::String), "<ident>")],
                },
            )
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$select":{"$from":"people","$sort":["age","last_name"]}}"#,
                "SELECT * FROM `people` ORDER BY `age`, `last_name`",
                "[]",
            )),
        )
        .with_type(
            TypeDef::new(
                Shape::Object,
                "Column to direction: 1/-1, true/false, or 'ASC'/'DESC'.",
                Render::EachItem {
                    join: ", ",
                    items: vec![
                        ItemDef::new(ItemKey::Number(1), "<key> ASC"),
                        ItemDef::new(ItemKey::Number(-1), "<key> DESC"),
                        ItemDef::new(ItemKey::Bool(true), "<key> ASC"),
                        ItemDef::new(ItemKey::Bool(false), "<key> DESC"),
                        ItemDef::new(ItemKey::Str("ASC"), "<key> ASC"),
                        ItemDef::new(ItemKey::Str("DESC"), "<key> DESC"),
                    ],
                },
            )
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$select":{"$from":"people","$sort":{"age":-1,"last_name":1}}}"#,
                "SELECT * FROM `people` ORDER BY `age` DESC, `last_name` ASC",
                "[]",
            ))
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$select":{"$from":"people","$sort":{"age":"DESC"}}}"#,
                "SELECT * FROM `people` ORDER BY `age` DESC",
                "[]",
            )),
        )
}

fn limit_def() -> OperatorDef {
    OperatorDef::new("$limit", "Caps the number of rows a SELECT returns.").with_type(
        TypeDef::new(
            Shape::Number,
            "The row cap, bound as a parameter.",
            Render::Template(String::from("<value>")),
        )
        .with_fixture(Fixture::new(
            DialectName::Mysql,
            r#"{"$select":{"$from":"people","$limit":10}}"#,
            "SELECT * FROM `people` LIMIT ?",
            "[10]",
        )),
    )
}

fn offset_def() -> OperatorDef {
    OperatorDef::new("$offset", "Skips rows before the SELECT starts returning.").with_type(
        TypeDef::new(
            Shape::Number,
            "The number of rows to skip, bound as a parameter.",
            Render::Template(String::from("<value>")),
        )
        .with_fixture(Fixture::new(
            DialectName::Mysql,
            r#"{"$select":{"$from":"people","$limit":10,"$offset":20}}"#,
            "SELECT * FROM `people` LIMIT ? OFFSET ?",
            "[10,20]",
        )),
    )
}

#[cfg(test)]
mod tests {
    use crate::builder::SqlBuilder;
    use crate::dialect::DialectName;
    use crate::value::ParamValue;
    use serde_json::json;

    fn ansi() -> SqlBuilder {
        SqlBuilder::new(DialectName::Ansi).unwrap()
    }

    #[test]
    fn columns_default_to_star() {
        let query = ansi()
            .build(&json!({"$select": {"$from": "people"}}))
            .unwrap();
        assert_eq!(query.sql, "SELECT * FROM `people`");
        assert!(query.values.is_empty());
    }

    #[test]
    fn explicit_columns() {
        let query = ansi()
            .build(&json!({"$select": {"$from": "people", "$columns": ["id", "last_name"]}}))
            .unwrap();
        assert_eq!(query.sql, "SELECT `id`, `last_name` FROM `people`");
    }

    #[test]
    fn aliased_columns() {
        let query = ansi()
            .build(&json!({"$select": {
                "$from": "people",
                "$columns": {"person_id": "id"}
            }}))
            .unwrap();
        assert_eq!(query.sql, "SELECT `id` AS `person_id` FROM `people`");
    }

    #[test]
    fn aliased_from_subquery() {
        let query = ansi()
            .build(&json!({"$select": {
                "$from": {"adults": {"$select": {"$from": "people", "$where": {"age": 21}}}}
            }}))
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT * FROM (SELECT * FROM `people` WHERE `age` = ?) AS `adults`"
        );
        assert_eq!(query.values, vec![ParamValue::Int(21)]);
    }

    #[test]
    fn clause_order_follows_grammar_not_key_order() {
        // $sort written before $from; the grammar still emits FROM first.
        let query = ansi()
            .build(&json!({"$select": {
                "$sort": "last_name",
                "$where": {"age": 21},
                "$from": "people"
            }}))
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT * FROM `people` WHERE `age` = ? ORDER BY `last_name`"
        );
    }

    #[test]
    fn limit_is_not_ansi() {
        let err = ansi()
            .build(&json!({"$select": {"$from": "people", "$limit": 10}}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown expression '$limit'");
    }

    #[test]
    fn unknown_clause_is_rejected() {
        let err = ansi()
            .build(&json!({"$select": {"$from": "people", "$wher": {"age": 21}}}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown expression '$wher'");
    }
}
