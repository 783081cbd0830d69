//! End-to-end builds of whole statements.

mod common;

use arbor_sql::{DialectName, ParamValue};
use common::*;
use serde_json::json;

#[test]
fn select_with_implicit_and_conditions() {
    let query = build(
        DialectName::Ansi,
        &json!({"$select": {
            "$from": "people",
            "$where": {"first_name": "John", "last_name": "Doe"}
        }}),
    );
    assert_eq!(
        query.sql,
        "SELECT * FROM `people` WHERE `first_name` = ? AND `last_name` = ?"
    );
    assert_eq!(query.values, vec![text("John"), text("Doe")]);
}

#[test]
fn same_tree_under_postgres_changes_presentation_only() {
    let query = build(
        DialectName::Postgres,
        &json!({"$select": {
            "$from": "people",
            "$where": {"first_name": "John", "last_name": "Doe"}
        }}),
    );
    assert_eq!(
        query.sql,
        "SELECT * FROM \"people\" WHERE \"first_name\" = $1 AND \"last_name\" = $2"
    );
    assert_eq!(query.values, vec![text("John"), text("Doe")]);
}

#[test]
fn insert_documents_flatten_row_major() {
    let query = build(
        DialectName::Ansi,
        &json!({"$insert": {
            "$table": "people",
            "$documents": [{"a": 1, "b": 2}, {"a": 3, "b": 4}]
        }}),
    );
    assert_eq!(
        query.sql,
        "INSERT INTO `people` (`a`, `b`) VALUES (?, ?), (?, ?)"
    );
    // Columns come from the first document; length = rows x columns.
    assert_eq!(
        query.values,
        vec![
            ParamValue::Int(1),
            ParamValue::Int(2),
            ParamValue::Int(3),
            ParamValue::Int(4),
        ]
    );
}

#[test]
fn union_keeps_branch_parens_and_is_not_stripped() {
    let query = build(
        DialectName::Ansi,
        &json!({"$union": [
            {"$select": {"$from": "people"}},
            {"$select": {"$from": "people_archive"}}
        ]}),
    );
    assert_eq!(
        query.sql,
        "(SELECT * FROM `people`) UNION (SELECT * FROM `people_archive`)"
    );
}

#[test]
fn required_slot_failure_names_the_slot() {
    let err = build_err(DialectName::Ansi, &json!({"$update": {"$set": {"a": 1}}}));
    assert_eq!(err.to_string(), "Required expression '$table' is missing");
}

#[test]
fn full_select_clause_ordering() {
    let query = build(
        DialectName::Mysql,
        &json!({"$select": {
            // Written in a deliberately scrambled order; the grammar wins.
            "$limit": 25,
            "$where": {"age": {"$gte": 21}},
            "$sort": {"last_name": 1},
            "$columns": ["id", "last_name"],
            "$groupBy": "last_name",
            "$from": "people"
        }}),
    );
    assert_eq!(
        query.sql,
        "SELECT `id`, `last_name` FROM `people` WHERE `age` >= ? \
         GROUP BY `last_name` ORDER BY `last_name` ASC LIMIT ?"
    );
    assert_eq!(query.values, vec![ParamValue::Int(21), ParamValue::Int(25)]);
}

#[test]
fn nested_subquery_in_where() {
    let query = build(
        DialectName::Ansi,
        &json!({"$select": {
            "$from": "orders",
            "$where": {"person_id": {"$in": [7, 8]}, "status": "open"}
        }}),
    );
    assert_eq!(
        query.sql,
        "SELECT * FROM `orders` WHERE `person_id` IN (?, ?) AND `status` = ?"
    );
}

#[test]
fn delete_and_drop_round_out_the_statement_set() {
    let query = build(
        DialectName::Ansi,
        &json!({"$delete": {"$from": "people", "$where": {"status": "archived"}}}),
    );
    assert_eq!(query.sql, "DELETE FROM `people` WHERE `status` = ?");

    let query = build(DialectName::Ansi, &json!({"$drop": "people"}));
    assert_eq!(query.sql, "DROP TABLE `people`");
}

#[test]
fn create_table_then_standalone_index() {
    let query = build(
        DialectName::Ansi,
        &json!({"$create": {
            "$table": "people",
            "$define": {
                "id": {"$type": "INTEGER", "$primary": true},
                "email": {"$type": "TEXT", "$notNull": true, "$unique": true}
            }
        }}),
    );
    assert_eq!(
        query.sql,
        "CREATE TABLE `people` (`id` INTEGER PRIMARY KEY, \
         `email` TEXT NOT NULL UNIQUE)"
    );

    let query = build(
        DialectName::Ansi,
        &json!({"$index": {"$name": "idx_email", "$table": "people", "$columns": "email"}}),
    );
    assert_eq!(query.sql, "CREATE INDEX `idx_email` ON `people` (`email`)");
}
