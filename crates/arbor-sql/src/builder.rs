//! The builder: construction, registration surface and top-level build.

use serde_json::Value;
use tracing::debug;

use crate::context::{strip_outer_parens, BuildCtx};
use crate::define::{self, OperatorDef};
use crate::dialect::{self, DialectConfig, DialectName};
use crate::error::{BuildError, Result};
use crate::ops;
use crate::registry::{OperatorFn, OperatorRegistry};
use crate::syntax::Syntax;
use crate::value::ParamValue;

use std::sync::Arc;

/// The result of a successful build: parameterized SQL plus the bound
/// values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The generated SQL text.
    pub sql: String,
    /// The bound values, in the order their placeholders appear.
    pub values: Vec<ParamValue>,
}

/// A dialect-bound SQL builder.
///
/// Construction loads the ANSI operator baseline and then the requested
/// dialect module. The builder itself is immutable during builds; all
/// per-build state lives in a [`BuildCtx`] created per call, so one
/// builder can serve any number of sequential builds.
#[derive(Debug)]
pub struct SqlBuilder {
    dialect: DialectConfig,
    registry: OperatorRegistry,
}

impl SqlBuilder {
    /// Creates a builder for the given dialect.
    ///
    /// # Errors
    ///
    /// Fails when a dialect module registers an invalid operator
    /// definition or grammar.
    pub fn new(dialect: DialectName) -> Result<Self> {
        // The target dialect name is set before the baseline loads so that
        // dialect-annotated slots in ANSI grammars are filtered correctly;
        // the rest of the configuration stays ANSI until the dialect module
        // replaces it.
        let mut config = DialectConfig::ansi();
        config.name = dialect;
        let mut builder = Self {
            dialect: config,
            registry: OperatorRegistry::default(),
        };
        debug!("loading ansi baseline");
        ops::register_ansi(&mut builder)?;
        match dialect {
            DialectName::Ansi => {}
            DialectName::Mysql => {
                debug!("loading dialect mysql");
                dialect::mysql::load(&mut builder)?;
            }
            DialectName::Postgres => {
                debug!("loading dialect postgres");
                dialect::postgres::load(&mut builder)?;
            }
            DialectName::Sqlite => {
                debug!("loading dialect sqlite");
                dialect::sqlite::load(&mut builder)?;
            }
        }
        Ok(builder)
    }

    /// Creates a builder from a dialect name, as accepted by
    /// [`DialectName::from_str`](std::str::FromStr).
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownDialect`] for unrecognized names.
    pub fn for_dialect(name: &str) -> Result<Self> {
        Self::new(name.parse()?)
    }

    /// The active dialect configuration.
    #[must_use]
    pub const fn dialect(&self) -> &DialectConfig {
        &self.dialect
    }

    pub(crate) fn set_dialect(&mut self, config: DialectConfig) {
        self.dialect = config;
    }

    pub(crate) const fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.registry
    }

    /// Registers an operator handler, layering over any existing one.
    pub fn register_operator<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&mut BuildCtx<'_>, &Value, &Value, Option<&str>) -> Result<String>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register(name, Arc::new(handler) as OperatorFn);
    }

    /// Registers a declarative operator definition.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidDefinition`] when the definition fails
    /// validation (missing docs or fixtures, duplicate shapes, broken
    /// fixture payloads) and compilation errors for bad sub-grammars.
    pub fn register_def(&mut self, def: OperatorDef) -> Result<()> {
        define::register(self, def)
    }

    /// Compiles and registers a syntax template under a new name.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MalformedSyntax`] for unparsable templates and
    /// [`BuildError::DuplicateSyntax`] when the name is taken.
    pub fn register_syntax(&mut self, name: &str, template: &str) -> Result<()> {
        let syntax = Syntax::compile(template, self.dialect.name)?;
        self.registry.register_syntax(name, syntax)
    }

    /// Compiles a template and replaces an existing syntax wholesale.
    /// Dialect modules use this to extend ANSI statement grammars.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MalformedSyntax`] for unparsable templates and
    /// [`BuildError::UnknownSyntax`] when nothing is registered under
    /// `name`.
    pub fn update_syntax(&mut self, name: &str, template: &str) -> Result<()> {
        let syntax = Syntax::compile(template, self.dialect.name)?;
        self.registry.update_syntax(name, syntax)
    }

    /// Looks up a registered syntax.
    #[must_use]
    pub fn get_syntax(&self, name: &str) -> Option<&Syntax> {
        self.registry.syntax(name)
    }

    /// All declarative operator definitions registered on this builder.
    #[must_use]
    pub fn definitions(&self) -> &[Arc<OperatorDef>] {
        self.registry.defs()
    }

    /// Quotes an identifier with the dialect quote character.
    ///
    /// Dotted identifiers are quoted per segment (`schema.table`); `*`,
    /// the `ALL` keyword and `@`-prefixed session variables pass through
    /// unquoted. Embedded quote characters are doubled.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidIdentifier`] for empty identifiers or
    /// empty segments.
    pub fn quote(&self, identifier: &str) -> Result<String> {
        if identifier.is_empty() {
            return Err(BuildError::InvalidIdentifier(String::from(identifier)));
        }
        let quote = self.dialect.quote;
        let doubled: String = [quote, quote].iter().collect();
        let segments = identifier
            .split('.')
            .map(|segment| {
                if segment.is_empty() {
                    return Err(BuildError::InvalidIdentifier(String::from(identifier)));
                }
                if segment == "*" || segment == "ALL" || segment.starts_with('@') {
                    return Ok(String::from(segment));
                }
                let escaped = segment.replace(quote, &doubled);
                Ok(format!("{quote}{escaped}{quote}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(segments.join("."))
    }

    /// Quotes an identifier under an optional table qualifier.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`SqlBuilder::quote`].
    pub fn quote_with_table(&self, identifier: &str, table: Option<&str>) -> Result<String> {
        match table {
            Some(table) => Ok(format!("{}.{}", self.quote(table)?, self.quote(identifier)?)),
            None => self.quote(identifier),
        }
    }

    /// Builds a query node into SQL and its ordered bound values.
    ///
    /// # Errors
    ///
    /// Any failure per the engine's error taxonomy; a failed build
    /// produces no partial output.
    pub fn build(&self, node: &Value) -> Result<Query> {
        let mut ctx = BuildCtx::new(self);
        let sql = ctx.build(node, None, None, " ")?;
        Ok(Query {
            sql: strip_outer_parens(&sql),
            values: ctx.into_values(),
        })
    }
}
