//! SQL dialect support.
//!
//! Every builder starts from the ANSI baseline; a dialect module then
//! adjusts the quoting/placeholder policy and layers its own operators and
//! grammar extensions on top.

pub(crate) mod mysql;
pub(crate) mod postgres;
pub(crate) mod sqlite;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::context::BuildCtx;
use crate::error::{BuildError, Result};

/// The SQL dialects the engine can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectName {
    /// ANSI baseline (backtick quoting, positional placeholders).
    Ansi,
    /// MySQL / MariaDB.
    Mysql,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
}

impl DialectName {
    /// Returns the lowercase dialect name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ansi => "ansi",
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DialectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectName {
    type Err = BuildError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ansi" => Ok(Self::Ansi),
            "mysql" => Ok(Self::Mysql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(BuildError::UnknownDialect(String::from(other))),
        }
    }
}

/// Placeholder generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholders {
    /// A constant `?` token regardless of position.
    Positional,
    /// Numbered `$1`..`$n` tokens.
    Numbered,
}

impl Placeholders {
    /// Renders the placeholder for the parameter at `position` (1-based,
    /// the length of the value list after the push).
    #[must_use]
    pub fn render(self, position: usize) -> String {
        match self {
            Self::Positional => String::from("?"),
            Self::Numbered => format!("${position}"),
        }
    }
}

/// Presentation and parameterization policy for one dialect.
#[derive(Debug, Clone)]
pub struct DialectConfig {
    /// The dialect this configuration belongs to.
    pub name: DialectName,
    /// Identifier quote character.
    pub quote: char,
    /// LIKE-pattern wildcard character.
    pub wildcard: char,
    /// Placeholder generation strategy.
    pub placeholders: Placeholders,
    /// Main operators whose statements must inline values instead of
    /// binding them (DDL). Consulted by `add_value`.
    pub inline_value_mains: &'static [&'static str],
}

impl DialectConfig {
    /// The ANSI baseline configuration loaded before any dialect module.
    #[must_use]
    pub const fn ansi() -> Self {
        Self {
            name: DialectName::Ansi,
            quote: '`',
            wildcard: '%',
            placeholders: Placeholders::Positional,
            inline_value_mains: &["$create"],
        }
    }
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self::ansi()
    }
}

/// `$offset` override shared by the dialects that reject OFFSET without a
/// LIMIT in the same statement. Delegates rendering to the layer below.
pub(crate) fn offset_requires_limit(
    ctx: &mut BuildCtx<'_>,
    value: &Value,
    outer: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    if !outer
        .as_object()
        .is_some_and(|map| map.contains_key("$limit"))
    {
        return Err(BuildError::InvalidContext {
            operator: String::from("$offset"),
            message: String::from("OFFSET requires a LIMIT in this dialect"),
        });
    }
    ctx.call_previous("$offset", value, outer, identifier)
}
