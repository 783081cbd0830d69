//! Cross-dialect behavior: presentation differences, layered overrides,
//! grammar extensions.

mod common;

use arbor_sql::{DialectName, ParamValue};
use common::*;
use serde_json::json;

#[test]
fn dialect_swap_changes_presentation_only() {
    let tree = json!({"$select": {
        "$from": "people",
        "$where": {"age": {"$gte": 21}},
        "$sort": {"age": -1}
    }});

    let ansi = build(DialectName::Ansi, &tree);
    let mysql = build(DialectName::Mysql, &tree);
    let postgres = build(DialectName::Postgres, &tree);
    let sqlite = build(DialectName::Sqlite, &tree);

    assert_eq!(
        ansi.sql,
        "SELECT * FROM `people` WHERE `age` >= ? ORDER BY `age` DESC"
    );
    // MySQL matches the baseline presentation exactly.
    assert_eq!(mysql.sql, ansi.sql);
    assert_eq!(
        postgres.sql,
        "SELECT * FROM \"people\" WHERE \"age\" >= $1 ORDER BY \"age\" DESC"
    );
    assert_eq!(
        sqlite.sql,
        "SELECT * FROM \"people\" WHERE \"age\" >= ? ORDER BY \"age\" DESC"
    );

    // Semantics are identical: same values in the same order everywhere.
    for query in [&ansi, &mysql, &postgres, &sqlite] {
        assert_eq!(query.values, vec![ParamValue::Int(21)]);
    }
}

#[test]
fn limit_and_offset_are_dialect_gated() {
    let tree = json!({"$select": {"$from": "people", "$limit": 10, "$offset": 20}});

    let err = build_err(DialectName::Ansi, &tree);
    assert_eq!(err.to_string(), "Unknown expression '$limit'");

    for dialect in [DialectName::Mysql, DialectName::Sqlite] {
        let query = build(dialect, &tree);
        assert!(query.sql.ends_with("LIMIT ? OFFSET ?"), "{}", query.sql);
        assert_eq!(query.values, vec![ParamValue::Int(10), ParamValue::Int(20)]);
    }

    let query = build(DialectName::Postgres, &tree);
    assert_eq!(query.sql, "SELECT * FROM \"people\" LIMIT $1 OFFSET $2");
}

#[test]
fn offset_without_limit_is_dialect_policy() {
    let tree = json!({"$select": {"$from": "people", "$offset": 20}});

    for dialect in [DialectName::Mysql, DialectName::Sqlite] {
        let err = build_err(dialect, &tree);
        assert!(
            err.to_string().contains("OFFSET requires a LIMIT"),
            "{dialect}: {err}"
        );
    }

    // PostgreSQL keeps the ANSI-registered rendering.
    let query = build(DialectName::Postgres, &tree);
    assert_eq!(query.sql, "SELECT * FROM \"people\" OFFSET $1");
}

#[test]
fn mysql_insert_grammar_extension_is_invisible_elsewhere() {
    let tree = json!({"$insert": {
        "$table": "people",
        "$documents": {"id": 7},
        "$onDuplicateKeyUpdate": {"id": 8}
    }});

    let query = build(DialectName::Mysql, &tree);
    assert_eq!(
        query.sql,
        "INSERT INTO `people` (`id`) VALUES (?) ON DUPLICATE KEY UPDATE `id` = ?"
    );

    // The ANSI insert grammar never learned that slot.
    let err = build_err(DialectName::Ansi, &tree);
    assert_eq!(err.to_string(), "Unknown expression '$onDuplicateKeyUpdate'");
}

#[test]
fn postgres_returning_is_a_grammar_extension() {
    let tree = json!({"$insert": {
        "$table": "people",
        "$documents": {"name": "John"},
        "$returning": "id"
    }});

    let query = build(DialectName::Postgres, &tree);
    assert_eq!(
        query.sql,
        "INSERT INTO \"people\" (\"name\") VALUES ($1) RETURNING \"id\""
    );

    let err = build_err(DialectName::Ansi, &tree);
    assert_eq!(err.to_string(), "Unknown expression '$returning'");
}

#[test]
fn sqlite_conflict_clause() {
    let query = build(
        DialectName::Sqlite,
        &json!({"$insert": {
            "$conflict": "ignore",
            "$table": "people",
            "$documents": {"id": 7}
        }}),
    );
    assert_eq!(
        query.sql,
        "INSERT OR IGNORE INTO \"people\" (\"id\") VALUES (?)"
    );
}

#[test]
fn ddl_inlines_values_per_dialect_configuration() {
    let tree = json!({"$create": {
        "$table": "people",
        "$define": {
            "status": {"$type": "TEXT", "$default": "it's fine"},
            "age": {"$type": "INTEGER", "$default": 0}
        }
    }});

    let query = build(DialectName::Postgres, &tree);
    assert_eq!(
        query.sql,
        "CREATE TABLE \"people\" (\"status\" TEXT DEFAULT 'it''s fine', \
         \"age\" INTEGER DEFAULT 0)"
    );
    assert!(query.values.is_empty());

    let query = build(DialectName::Mysql, &tree);
    assert_eq!(
        query.sql,
        "CREATE TABLE `people` (`status` TEXT DEFAULT 'it''s fine', \
         `age` INTEGER DEFAULT 0)"
    );
    assert!(query.values.is_empty());
}

#[test]
fn unknown_dialect_name_fails_construction() {
    assert!("tsql".parse::<DialectName>().is_err());
}
