//! MySQL dialect.
//!
//! Backtick quoting and positional placeholders like the baseline, plus
//! `INSERT ... ON DUPLICATE KEY UPDATE` and the `VALUES(column)` reference
//! form inside that clause.

use serde_json::Value;

use crate::builder::SqlBuilder;
use crate::context::BuildCtx;
use crate::error::{BuildError, Result};

use super::{DialectConfig, DialectName, Placeholders};

const INSERT_SYNTAX: &str = "(INSERT { INTO [$table]} [$columns] \
    { [$documents] | [$values] | [$select]} \
    { ON DUPLICATE KEY UPDATE [$onDuplicateKeyUpdate]})";

pub(crate) fn load(builder: &mut SqlBuilder) -> Result<()> {
    builder.set_dialect(DialectConfig {
        name: DialectName::Mysql,
        quote: '`',
        wildcard: '%',
        placeholders: Placeholders::Positional,
        inline_value_mains: &["$create"],
    });
    builder.update_syntax("$insert", INSERT_SYNTAX)?;
    builder.register_operator("$onDuplicateKeyUpdate", op_on_duplicate_key_update);
    builder.register_operator("$values", op_values);
    builder.register_operator("$offset", super::offset_requires_limit);
    Ok(())
}

/// Column assignments of the ON DUPLICATE KEY UPDATE clause. An object
/// value dispatches normally, which is how `{"$values": "col"}` reaches
/// the reference form below.
fn op_on_duplicate_key_update(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    let map = value
        .as_object()
        .filter(|map| !map.is_empty())
        .ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from("$onDuplicateKeyUpdate"),
            expected: String::from("non-empty object"),
        })?;
    let mut parts = Vec::with_capacity(map.len());
    for (column, item) in map {
        let quoted = ctx.quote(column)?;
        let rendered = match item {
            Value::Object(_) => ctx.build(item, Some(column.as_str()), None, " ")?,
            _ => ctx.add_value(item)?,
        };
        parts.push(format!("{quoted} = {rendered}"));
    }
    Ok(parts.join(", "))
}

/// Inside ON DUPLICATE KEY UPDATE, `$values` renders a `VALUES(column)`
/// reference to the row that would have been inserted; everywhere else it
/// delegates to the row-group renderer underneath.
fn op_values(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    if ctx.is_current("$onDuplicateKeyUpdate") {
        let column = value.as_str().ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from("$values"),
            expected: String::from("string"),
        })?;
        let quoted = ctx.quote(column)?;
        Ok(format!("VALUES({quoted})"))
    } else {
        ctx.call_previous("$values", value, outer, identifier)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::SqlBuilder;
    use crate::dialect::DialectName;
    use crate::value::ParamValue;
    use serde_json::json;

    fn mysql() -> SqlBuilder {
        SqlBuilder::new(DialectName::Mysql).unwrap()
    }

    #[test]
    fn on_duplicate_key_update() {
        let query = mysql()
            .build(&json!({"$insert": {
                "$table": "people",
                "$documents": {"id": 7, "visits": 1},
                "$onDuplicateKeyUpdate": {"visits": 2}
            }}))
            .unwrap();
        assert_eq!(
            query.sql,
            "INSERT INTO `people` (`id`, `visits`) VALUES (?, ?) \
             ON DUPLICATE KEY UPDATE `visits` = ?"
        );
        assert_eq!(
            query.values,
            vec![ParamValue::Int(7), ParamValue::Int(1), ParamValue::Int(2)]
        );
    }

    #[test]
    fn values_reference_inside_upsert() {
        let query = mysql()
            .build(&json!({"$insert": {
                "$table": "people",
                "$documents": {"id": 7, "visits": 1},
                "$onDuplicateKeyUpdate": {"visits": {"$values": "visits"}}
            }}))
            .unwrap();
        assert_eq!(
            query.sql,
            "INSERT INTO `people` (`id`, `visits`) VALUES (?, ?) \
             ON DUPLICATE KEY UPDATE `visits` = VALUES(`visits`)"
        );
        assert_eq!(query.values, vec![ParamValue::Int(7), ParamValue::Int(1)]);
    }

    #[test]
    fn values_rows_still_work_outside_upsert() {
        let query = mysql()
            .build(&json!({"$insert": {
                "$table": "people",
                "$columns": ["a", "b"],
                "$values": [[1, 2]]
            }}))
            .unwrap();
        assert_eq!(query.sql, "INSERT INTO `people` (`a`, `b`) VALUES (?, ?)");
    }

    #[test]
    fn offset_without_limit_is_rejected() {
        let err = mysql()
            .build(&json!({"$select": {"$from": "people", "$offset": 20}}))
            .unwrap_err();
        assert!(err.to_string().contains("OFFSET requires a LIMIT"));
    }

    #[test]
    fn offset_with_limit_delegates() {
        let query = mysql()
            .build(&json!({"$select": {"$from": "people", "$limit": 10, "$offset": 20}}))
            .unwrap();
        assert_eq!(query.sql, "SELECT * FROM `people` LIMIT ? OFFSET ?");
        assert_eq!(query.values, vec![ParamValue::Int(10), ParamValue::Int(20)]);
    }
}
