//! Operator registry.
//!
//! Maps operator names to handler chains and registered grammars. Handler
//! registration layers: registering a name that already has a handler pushes
//! the new one on top and keeps the previous implementation reachable, so a
//! dialect can narrow or extend the ANSI behavior and still delegate to it
//! through [`crate::BuildCtx::call_previous`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::context::BuildCtx;
use crate::define::OperatorDef;
use crate::error::{BuildError, Result};
use crate::syntax::Syntax;

/// An operator handler.
///
/// Receives the build context, the operator's value, the node the operator
/// appeared in, and the contextual column identifier (if any), and returns
/// the rendered SQL fragment.
pub type OperatorFn =
    Arc<dyn Fn(&mut BuildCtx<'_>, &Value, &Value, Option<&str>) -> Result<String> + Send + Sync>;

/// The per-builder operator and grammar store.
#[derive(Default)]
pub struct OperatorRegistry {
    handlers: HashMap<String, Vec<OperatorFn>>,
    syntaxes: HashMap<String, Syntax>,
    defs: Vec<Arc<OperatorDef>>,
}

impl OperatorRegistry {
    /// Registers a handler, layering it over any existing chain.
    pub fn register(&mut self, name: &str, handler: OperatorFn) {
        let chain = self.handlers.entry(String::from(name)).or_default();
        if chain.is_empty() {
            debug!("registering operator {}", name);
        } else {
            debug!("layering operator {} (chain depth {})", name, chain.len() + 1);
        }
        chain.push(handler);
    }

    /// The active (topmost) handler for `name`.
    #[must_use]
    pub fn active(&self, name: &str) -> Option<&OperatorFn> {
        self.handlers.get(name).and_then(|chain| chain.last())
    }

    /// The handler underneath the active one, if any.
    #[must_use]
    pub fn previous(&self, name: &str) -> Option<&OperatorFn> {
        self.handlers
            .get(name)
            .and_then(|chain| chain.len().checked_sub(2).and_then(|i| chain.get(i)))
    }

    /// Whether any handler is registered for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registers a compiled syntax under a new name.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicateSyntax`] when the name is taken.
    pub fn register_syntax(&mut self, name: &str, syntax: Syntax) -> Result<()> {
        if self.syntaxes.contains_key(name) {
            return Err(BuildError::DuplicateSyntax(String::from(name)));
        }
        debug!("registering syntax {}", name);
        self.syntaxes.insert(String::from(name), syntax);
        Ok(())
    }

    /// Replaces an existing syntax wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownSyntax`] when nothing is registered
    /// under `name`.
    pub fn update_syntax(&mut self, name: &str, syntax: Syntax) -> Result<()> {
        match self.syntaxes.get_mut(name) {
            Some(slot) => {
                debug!("updating syntax {}", name);
                *slot = syntax;
                Ok(())
            }
            None => Err(BuildError::UnknownSyntax(String::from(name))),
        }
    }

    /// Looks up a registered syntax.
    #[must_use]
    pub fn syntax(&self, name: &str) -> Option<&Syntax> {
        self.syntaxes.get(name)
    }

    /// Records a declarative definition for the fixture harness.
    pub fn push_def(&mut self, def: Arc<OperatorDef>) {
        self.defs.push(def);
    }

    /// All declarative definitions registered on this builder.
    #[must_use]
    pub fn defs(&self) -> &[Arc<OperatorDef>] {
        &self.defs
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operators: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        operators.sort_unstable();
        let mut syntaxes: Vec<&str> = self.syntaxes.keys().map(String::as_str).collect();
        syntaxes.sort_unstable();
        f.debug_struct("OperatorRegistry")
            .field("operators", &operators)
            .field("syntaxes", &syntaxes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectName;

    fn noop() -> OperatorFn {
        Arc::new(
            |_: &mut BuildCtx<'_>, _: &Value, _: &Value, _: Option<&str>| Ok(String::new()),
        )
    }

    #[test]
    fn layering_keeps_previous_handler() {
        let mut registry = OperatorRegistry::default();
        assert!(registry.previous("$x").is_none());

        registry.register("$x", noop());
        assert!(registry.active("$x").is_some());
        assert!(registry.previous("$x").is_none());

        registry.register("$x", noop());
        assert!(registry.previous("$x").is_some());
    }

    #[test]
    fn duplicate_syntax_is_rejected() {
        let mut registry = OperatorRegistry::default();
        let syntax = Syntax::compile("X [$a]", DialectName::Ansi).unwrap();
        registry.register_syntax("$x", syntax.clone()).unwrap();
        assert!(matches!(
            registry.register_syntax("$x", syntax),
            Err(BuildError::DuplicateSyntax(_))
        ));
    }

    #[test]
    fn update_requires_existing_syntax() {
        let mut registry = OperatorRegistry::default();
        let syntax = Syntax::compile("X [$a]", DialectName::Ansi).unwrap();
        assert!(matches!(
            registry.update_syntax("$x", syntax.clone()),
            Err(BuildError::UnknownSyntax(_))
        ));
        registry.register_syntax("$x", syntax.clone()).unwrap();
        registry.update_syntax("$x", syntax).unwrap();
    }
}
