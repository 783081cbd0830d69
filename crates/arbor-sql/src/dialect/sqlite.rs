//! SQLite dialect.
//!
//! Double-quote identifier quoting with positional placeholders, the
//! `INSERT OR <action>` conflict clause, and the shared OFFSET-needs-LIMIT
//! rule.

use serde_json::Value;

use crate::builder::SqlBuilder;
use crate::context::BuildCtx;
use crate::error::{BuildError, Result};

use super::{DialectConfig, DialectName, Placeholders};

const INSERT_SYNTAX: &str = "(INSERT [$conflict] { INTO [$table]} [$columns] \
    { [$documents] | [$values] | [$select]})";

const CONFLICT_ACTIONS: [&str; 5] = ["replace", "ignore", "abort", "rollback", "fail"];

pub(crate) fn load(builder: &mut SqlBuilder) -> Result<()> {
    builder.set_dialect(DialectConfig {
        name: DialectName::Sqlite,
        quote: '"',
        wildcard: '%',
        placeholders: Placeholders::Positional,
        inline_value_mains: &["$create"],
    });
    builder.update_syntax("$insert", INSERT_SYNTAX)?;
    builder.register_operator("$conflict", op_conflict);
    builder.register_operator("$offset", super::offset_requires_limit);
    Ok(())
}

/// The `INSERT OR <action>` conflict resolution keyword.
fn op_conflict(
    _ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    let action = value
        .as_str()
        .map(str::to_ascii_lowercase)
        .filter(|action| CONFLICT_ACTIONS.contains(&action.as_str()))
        .ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from("$conflict"),
            expected: String::from("'replace', 'ignore', 'abort', 'rollback' or 'fail'"),
        })?;
    Ok(format!("OR {}", action.to_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use crate::builder::SqlBuilder;
    use crate::dialect::DialectName;
    use serde_json::json;

    fn sqlite() -> SqlBuilder {
        SqlBuilder::new(DialectName::Sqlite).unwrap()
    }

    #[test]
    fn double_quotes_with_positional_placeholders() {
        let query = sqlite()
            .build(&json!({"$select": {"$from": "people", "$where": {"age": 21}}}))
            .unwrap();
        assert_eq!(query.sql, "SELECT * FROM \"people\" WHERE \"age\" = ?");
    }

    #[test]
    fn insert_or_replace() {
        let query = sqlite()
            .build(&json!({"$insert": {
                "$conflict": "replace",
                "$table": "people",
                "$documents": {"id": 7, "name": "John"}
            }}))
            .unwrap();
        assert_eq!(
            query.sql,
            "INSERT OR REPLACE INTO \"people\" (\"id\", \"name\") VALUES (?, ?)"
        );
    }

    #[test]
    fn unknown_conflict_action_is_rejected() {
        let err = sqlite()
            .build(&json!({"$insert": {
                "$conflict": "merge",
                "$table": "people",
                "$documents": {"id": 7}
            }}))
            .unwrap_err();
        assert!(err.to_string().contains("'$conflict' must be type of"));
    }

    #[test]
    fn offset_without_limit_is_rejected() {
        let err = sqlite()
            .build(&json!({"$select": {"$from": "people", "$offset": 20}}))
            .unwrap_err();
        assert!(err.to_string().contains("OFFSET requires a LIMIT"));
    }
}
