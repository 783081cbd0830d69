//! PostgreSQL dialect.
//!
//! Double-quote identifier quoting, numbered `$n` placeholders, and
//! RETURNING clauses on INSERT and UPDATE.

use serde_json::Value;

use crate::builder::SqlBuilder;
use crate::context::BuildCtx;
use crate::error::Result;
use crate::ops::select::entry_list;

use super::{DialectConfig, DialectName, Placeholders};

const INSERT_SYNTAX: &str = "(INSERT { INTO [$table]} [$columns] \
    { [$documents] | [$values] | [$select]} \
    { RETURNING [$returning]})";

const UPDATE_SYNTAX: &str =
    "(UPDATE <$table> { SET [$set]} { WHERE [$where]} { RETURNING [$returning]})";

pub(crate) fn load(builder: &mut SqlBuilder) -> Result<()> {
    builder.set_dialect(DialectConfig {
        name: DialectName::Postgres,
        quote: '"',
        wildcard: '%',
        placeholders: Placeholders::Numbered,
        inline_value_mains: &["$create"],
    });
    builder.update_syntax("$insert", INSERT_SYNTAX)?;
    builder.update_syntax("$update", UPDATE_SYNTAX)?;
    builder.register_operator("$returning", op_returning);
    Ok(())
}

/// The RETURNING column list: same shapes as `$columns`.
fn op_returning(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    _outer: &Value,
    _identifier: Option<&str>,
) -> Result<String> {
    entry_list(ctx, "$returning", value)
}
