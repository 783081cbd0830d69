//! Condition operators: comparisons, pattern matching, membership,
//! ranges and logical connectives.

use serde_json::Value;

use crate::builder::SqlBuilder;
use crate::context::BuildCtx;
use crate::define::{Fixture, OperatorDef, Render, Shape, TypeDef};
use crate::dialect::DialectName;
use crate::error::{BuildError, Result};

pub(crate) fn register(builder: &mut SqlBuilder) -> Result<()> {
    builder.register_def(eq_def())?;
    builder.register_def(ne_def())?;
    builder.register_def(ordering_def(
        "$gt",
        ">",
        "Greater-than comparison against the column in scope.",
        Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"age":{"$gt":21}}}}"#,
            "SELECT * FROM `people` WHERE `age` > ?",
            "[21]",
        ),
        Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"last_name":{"$gt":"M"}}}}"#,
            "SELECT * FROM `people` WHERE `last_name` > ?",
            r#"["M"]"#,
        ),
    ))?;
    builder.register_def(ordering_def(
        "$gte",
        ">=",
        "Greater-or-equal comparison against the column in scope.",
        Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"age":{"$gte":21}}}}"#,
            "SELECT * FROM `people` WHERE `age` >= ?",
            "[21]",
        ),
        Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"last_name":{"$gte":"M"}}}}"#,
            "SELECT * FROM `people` WHERE `last_name` >= ?",
            r#"["M"]"#,
        ),
    ))?;
    builder.register_def(ordering_def(
        "$lt",
        "<",
        "Less-than comparison against the column in scope.",
        Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"age":{"$lt":65}}}}"#,
            "SELECT * FROM `people` WHERE `age` < ?",
            "[65]",
        ),
        Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"last_name":{"$lt":"M"}}}}"#,
            "SELECT * FROM `people` WHERE `last_name` < ?",
            r#"["M"]"#,
        ),
    ))?;
    builder.register_def(ordering_def(
        "$lte",
        "<=",
        "Less-or-equal comparison against the column in scope.",
        Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"age":{"$lte":65}}}}"#,
            "SELECT * FROM `people` WHERE `age` <= ?",
            "[65]",
        ),
        Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"last_name":{"$lte":"M"}}}}"#,
            "SELECT * FROM `people` WHERE `last_name` <= ?",
            r#"["M"]"#,
        ),
    ))?;
    builder.register_def(like_def())?;
    builder.register_def(not_like_def())?;
    builder.register_def(starts_with_def())?;
    builder.register_def(ends_with_def())?;
    builder.register_def(contains_def())?;
    builder.register_def(null_def())?;
    builder.register_operator("$in", op_in);
    builder.register_operator("$nin", op_nin);
    builder.register_operator("$between", op_between);
    builder.register_operator("$notBetween", op_not_between);
    builder.register_operator("$and", op_and);
    builder.register_operator("$or", op_or);
    builder.register_operator("$not", op_not);
    Ok(())
}

/// Quotes the contextual column identifier, failing when the operator is
/// used outside a column context.
pub(crate) fn require_column(
    ctx: &BuildCtx<'_>,
    operator: &str,
    identifier: Option<&str>,
) -> Result<String> {
    let identifier = identifier.ok_or_else(|| BuildError::InvalidContext {
        operator: String::from(operator),
        message: String::from("no column identifier in scope"),
    })?;
    ctx.quote(identifier)
}

fn cmp_template(sql_op: &str) -> Render {
    Render::Template(format!("<identifier> {sql_op} <value>"))
}

fn eq_def() -> OperatorDef {
    OperatorDef::new("$eq", "Equality comparison against the column in scope.")
        .with_type(
            TypeDef::new(
                Shape::String,
                "Compare against a bound string; a `~~` prefix compares against \
                 another column instead.",
                cmp_template("="),
            )
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$select":{"$from":"people","$where":{"first_name":{"$eq":"John"}}}}"#,
                "SELECT * FROM `people` WHERE `first_name` = ?",
                r#"["John"]"#,
            ))
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$select":{"$from":"people","$where":{"first_name":{"$eq":"~~nick_name"}}}}"#,
                "SELECT * FROM `people` WHERE `first_name` = `nick_name`",
                "[]",
            )),
        )
        .with_type(
            TypeDef::new(Shape::Number, "Compare against a bound number.", cmp_template("="))
                .with_fixture(Fixture::new(
                    DialectName::Ansi,
                    r#"{"$select":{"$from":"people","$where":{"age":{"$eq":21}}}}"#,
                    "SELECT * FROM `people` WHERE `age` = ?",
                    "[21]",
                )),
        )
        .with_type(
            TypeDef::new(Shape::Boolean, "Compare against a bound boolean.", cmp_template("="))
                .with_fixture(Fixture::new(
                    DialectName::Ansi,
                    r#"{"$select":{"$from":"people","$where":{"active":{"$eq":true}}}}"#,
                    "SELECT * FROM `people` WHERE `active` = ?",
                    "[true]",
                )),
        )
        .with_type(
            TypeDef::new(
                Shape::Null,
                "null renders an IS NULL test.",
                Render::Template(String::from("<identifier> IS NULL")),
            )
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$select":{"$from":"people","$where":{"deleted_at":{"$eq":null}}}}"#,
                "SELECT * FROM `people` WHERE `deleted_at` IS NULL",
                "[]",
            )),
        )
}

fn ne_def() -> OperatorDef {
    OperatorDef::new("$ne", "Inequality comparison against the column in scope.")
        .with_type(
            TypeDef::new(Shape::String, "Compare against a bound string.", cmp_template("!="))
                .with_fixture(Fixture::new(
                    DialectName::Ansi,
                    r#"{"$select":{"$from":"people","$where":{"status":{"$ne":"archived"}}}}"#,
                    "SELECT * FROM `people` WHERE `status` != ?",
                    r#"["archived"]"#,
                )),
        )
        .with_type(
            TypeDef::new(Shape::Number, "Compare against a bound number.", cmp_template("!="))
                .with_fixture(Fixture::new(
                    DialectName::Ansi,
                    r#"{"$select":{"$from":"people","$where":{"age":{"$ne":21}}}}"#,
                    "SELECT * FROM `people` WHERE `age` != ?",
                    "[21]",
                )),
        )
        .with_type(
            TypeDef::new(Shape::Boolean, "Compare against a bound boolean.", cmp_template("!="))
                .with_fixture(Fixture::new(
                    DialectName::Ansi,
                    r#"{"$select":{"$from":"people","$where":{"active":{"$ne":false}}}}"#,
                    "SELECT * FROM `people` WHERE `active` != ?",
                    "[false]",
                )),
        )
        .with_type(
            TypeDef::new(
                Shape::Null,
                "null renders an IS NOT NULL test.",
                Render::Template(String::from("<identifier> IS NOT NULL")),
            )
            .with_fixture(Fixture::new(
                DialectName::Ansi,
                r#"{"$select":{"$from":"people","$where":{"deleted_at":{"$ne":null}}}}"#,
                "SELECT * FROM `people` WHERE `deleted_at` IS NOT NULL",
                "[]",
            )),
        )
}

fn ordering_def(
    name: &'static str,
    sql_op: &'static str,
    docs: &'static str,
    number_fixture: Fixture,
    string_fixture: Fixture,
) -> OperatorDef {
    OperatorDef::new(name, docs)
        .with_type(
            TypeDef::new(Shape::Number, "Compare against a bound number.", cmp_template(sql_op))
                .with_fixture(number_fixture),
        )
        .with_type(
            TypeDef::new(Shape::String, "Compare against a bound string.", cmp_template(sql_op))
                .with_fixture(string_fixture),
        )
}

fn like_def() -> OperatorDef {
    OperatorDef::new("$like", "Pattern match against the column in scope.").with_type(
        TypeDef::new(
            Shape::String,
            "The pattern, bound as a parameter; use the dialect wildcard.",
            Render::Template(String::from("<identifier> LIKE <value>")),
        )
        .with_fixture(Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"last_name":{"$like":"Do%"}}}}"#,
            "SELECT * FROM `people` WHERE `last_name` LIKE ?",
            r#"["Do%"]"#,
        )),
    )
}

fn not_like_def() -> OperatorDef {
    OperatorDef::new("$notLike", "Negated pattern match against the column in scope.").with_type(
        TypeDef::new(
            Shape::String,
            "The pattern, bound as a parameter.",
            Render::Template(String::from("<identifier> NOT LIKE <value>")),
        )
        .with_fixture(Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"last_name":{"$notLike":"Do%"}}}}"#,
            "SELECT * FROM `people` WHERE `last_name` NOT LIKE ?",
            r#"["Do%"]"#,
        )),
    )
}

/// LIKE with the dialect wildcard spliced around the bound text.
fn wildcard_like(
    ctx: &mut BuildCtx<'_>,
    operator: &str,
    value: &Value,
    identifier: Option<&str>,
    prefix: bool,
    suffix: bool,
) -> Result<String> {
    let column = require_column(ctx, operator, identifier)?;
    let needle = value.as_str().ok_or_else(|| BuildError::TypeMismatch {
        operator: String::from(operator),
        expected: String::from("string"),
    })?;
    let wildcard = ctx.dialect().wildcard;
    let mut pattern = String::new();
    if prefix {
        pattern.push(wildcard);
    }
    pattern.push_str(needle);
    if suffix {
        pattern.push(wildcard);
    }
    let bound = ctx.add_value(&Value::String(pattern))?;
    Ok(format!("{column} LIKE {bound}"))
}

fn render_starts_with(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    wildcard_like(ctx, "$startsWith", value, identifier, false, true)
}

fn render_ends_with(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    wildcard_like(ctx, "$endsWith", value, identifier, true, false)
}

fn render_contains(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    wildcard_like(ctx, "$contains", value, identifier, true, true)
}

fn starts_with_def() -> OperatorDef {
    OperatorDef::new("$startsWith", "Prefix match via LIKE and the dialect wildcard.").with_type(
        TypeDef::new(
            Shape::String,
            "The prefix; the wildcard is appended before binding.",
            Render::Func(render_starts_with),
        )
        .with_fixture(Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"last_name":{"$startsWith":"Do"}}}}"#,
            "SELECT * FROM `people` WHERE `last_name` LIKE ?",
            r#"["Do%"]"#,
        )),
    )
}

fn ends_with_def() -> OperatorDef {
    OperatorDef::new("$endsWith", "Suffix match via LIKE and the dialect wildcard.").with_type(
        TypeDef::new(
            Shape::String,
            "The suffix; the wildcard is prepended before binding.",
            Render::Func(render_ends_with),
        )
        .with_fixture(Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"last_name":{"$endsWith":"oe"}}}}"#,
            "SELECT * FROM `people` WHERE `last_name` LIKE ?",
            r#"["%oe"]"#,
        )),
    )
}

fn contains_def() -> OperatorDef {
    OperatorDef::new("$contains", "Substring match via LIKE and the dialect wildcard.").with_type(
        TypeDef::new(
            Shape::String,
            "The substring; wildcards are added on both sides before binding.",
            Render::Func(render_contains),
        )
        .with_fixture(Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"last_name":{"$contains":"oh"}}}}"#,
            "SELECT * FROM `people` WHERE `last_name` LIKE ?",
            r#"["%oh%"]"#,
        )),
    )
}

fn render_null(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    let column = require_column(ctx, "$null", identifier)?;
    Ok(if value.as_bool() == Some(true) {
        format!("{column} IS NULL")
    } else {
        format!("{column} IS NOT NULL")
    })
}

fn null_def() -> OperatorDef {
    OperatorDef::new("$null", "NULL test against the column in scope.").with_type(
        TypeDef::new(
            Shape::Boolean,
            "true renders IS NULL, false renders IS NOT NULL.",
            Render::Func(render_null),
        )
        .with_fixture(Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"deleted_at":{"$null":true}}}}"#,
            "SELECT * FROM `people` WHERE `deleted_at` IS NULL",
            "[]",
        ))
        .with_fixture(Fixture::new(
            DialectName::Ansi,
            r#"{"$select":{"$from":"people","$where":{"deleted_at":{"$null":false}}}}"#,
            "SELECT * FROM `people` WHERE `deleted_at` IS NOT NULL",
            "[]",
        )),
    )
}

fn render_membership(
    ctx: &mut BuildCtx<'_>,
    operator: &str,
    keyword: &str,
    value: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    let column = require_column(ctx, operator, identifier)?;
    let items = value
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from(operator),
            expected: String::from("non-empty array"),
        })?;
    let placeholders = items
        .iter()
        .map(|item| ctx.add_value(item))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("{column} {keyword} ({})", placeholders.join(", ")))
}

fn op_in(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    render_membership(ctx, "$in", "IN", value, identifier)
}

fn op_nin(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    render_membership(ctx, "$nin", "NOT IN", value, identifier)
}

fn render_range(
    ctx: &mut BuildCtx<'_>,
    operator: &str,
    keyword: &str,
    value: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    let column = require_column(ctx, operator, identifier)?;
    let bounds = value
        .as_array()
        .filter(|bounds| bounds.len() == 2)
        .ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from(operator),
            expected: String::from("array of two values"),
        })?;
    let low = ctx.add_value(&bounds[0])?;
    let high = ctx.add_value(&bounds[1])?;
    Ok(format!("{column} {keyword} {low} AND {high}"))
}

fn op_between(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    render_range(ctx, "$between", "BETWEEN", value, identifier)
}

fn op_not_between(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    render_range(ctx, "$notBetween", "NOT BETWEEN", value, identifier)
}

fn conjunction(
    ctx: &mut BuildCtx<'_>,
    operator: &str,
    join: &str,
    value: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => return ctx.build(value, identifier, None, join),
        _ => {
            return Err(BuildError::TypeMismatch {
                operator: String::from(operator),
                expected: String::from("object, array"),
            });
        }
    };
    let mut parts = Vec::new();
    for item in items {
        let rendered = ctx.build(item, identifier, None, " AND ")?;
        if rendered.is_empty() {
            continue;
        }
        // Inside an OR, a multi-key object is an implicit AND group and
        // keeps its own parentheses.
        let wrap = join == " OR " && item.as_object().is_some_and(|map| map.len() > 1);
        parts.push(if wrap { format!("({rendered})") } else { rendered });
    }
    Ok(parts.join(join))
}

fn op_and(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    conjunction(ctx, "$and", " AND ", value, identifier)
}

fn op_or(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    conjunction(ctx, "$or", " OR ", value, identifier)
}

fn op_not(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    match value {
        Value::Object(_) | Value::Array(_) => Ok(format!(
            "NOT ({})",
            ctx.build(value, identifier, None, " AND ")?
        )),
        _ => Err(BuildError::TypeMismatch {
            operator: String::from("$not"),
            expected: String::from("object, array"),
        }),
    }
}
