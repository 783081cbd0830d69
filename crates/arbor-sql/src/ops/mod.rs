//! The ANSI operator baseline.
//!
//! Registered on every builder before any dialect module loads. Dialect
//! modules layer on top of these handlers and grammars.

pub(crate) mod ddl;
pub(crate) mod expr;
pub(crate) mod insert;
pub(crate) mod select;
pub(crate) mod union;
pub(crate) mod update;

use crate::builder::SqlBuilder;
use crate::error::Result;

pub(crate) fn register_ansi(builder: &mut SqlBuilder) -> Result<()> {
    select::register(builder)?;
    expr::register(builder)?;
    insert::register(builder)?;
    update::register(builder)?;
    ddl::register(builder)?;
    union::register(builder)?;
    Ok(())
}
