//! # arbor-sql
//!
//! A dialect-aware SQL compiler: it turns a declarative, nested query tree
//! into a parameterized SQL string plus the ordered list of bound values,
//! for ANSI SQL, MySQL, PostgreSQL and SQLite.
//!
//! Queries are data. Keys starting with `$` are operators; any other key
//! is a column or table identifier:
//!
//! ```rust
//! use arbor_sql::{DialectName, SqlBuilder};
//! use serde_json::json;
//!
//! let builder = SqlBuilder::new(DialectName::Mysql)?;
//! let query = builder.build(&json!({
//!     "$select": {
//!         "$from": "people",
//!         "$where": { "first_name": "John", "last_name": "Doe" }
//!     }
//! }))?;
//!
//! assert_eq!(
//!     query.sql,
//!     "SELECT * FROM `people` WHERE `first_name` = ? AND `last_name` = ?"
//! );
//! assert_eq!(query.values.len(), 2);
//! # Ok::<(), arbor_sql::BuildError>(())
//! ```
//!
//! The same tree built for PostgreSQL changes presentation only (quote
//! character and placeholder style), never clause structure:
//!
//! ```rust
//! use arbor_sql::{DialectName, SqlBuilder};
//! use serde_json::json;
//!
//! let builder = SqlBuilder::new(DialectName::Postgres)?;
//! let query = builder.build(&json!({
//!     "$select": { "$from": "people", "$where": { "last_name": "Doe" } }
//! }))?;
//!
//! assert_eq!(query.sql, "SELECT * FROM \"people\" WHERE \"last_name\" = $1");
//! # Ok::<(), arbor_sql::BuildError>(())
//! ```
//!
//! ## SQL injection prevention
//!
//! Every value is bound, never interpolated. Identifiers are quoted with
//! the dialect quote character, with embedded quotes doubled. The only
//! inlining paths are explicit: the `~~` column-reference marker and the
//! dialect-configured DDL statement kinds, which escape through
//! [`ParamValue::to_sql_inline`].
//!
//! ## Extension surface
//!
//! Operator modules extend a builder through [`SqlBuilder::register_operator`]
//! (layered, with delegation to the previous implementation via
//! [`BuildCtx::call_previous`]), [`SqlBuilder::register_def`] (declarative
//! definitions with mandatory docs and fixtures), and
//! [`SqlBuilder::register_syntax`] / [`SqlBuilder::update_syntax`] for
//! statement grammars.

pub mod builder;
pub mod context;
pub mod define;
pub mod dialect;
pub mod error;
mod ops;
pub mod registry;
pub mod syntax;
pub mod value;

pub use builder::{Query, SqlBuilder};
pub use context::{BuildCtx, COLUMN_MARKER};
pub use define::{Fixture, ItemDef, ItemKey, OperatorDef, Render, Shape, TypeDef};
pub use dialect::{DialectConfig, DialectName, Placeholders};
pub use error::{BuildError, Result};
pub use registry::{OperatorFn, OperatorRegistry};
pub use syntax::Syntax;
pub use value::ParamValue;
