//! Build context and recursive dispatcher.
//!
//! A [`BuildCtx`] is created per top-level build call and owns every piece
//! of mutable build state: the ordered value list, the operator call stack,
//! the main-operator marker and the recursion depth. Handlers receive the
//! context and call back into it for quoting, parameterization and
//! recursive sub-builds.

use serde_json::{Map, Value};
use tracing::trace;

use crate::builder::SqlBuilder;
use crate::dialect::DialectConfig;
use crate::error::{BuildError, Result};
use crate::syntax::{Syntax, SyntaxNode};
use crate::value::ParamValue;

/// Reserved prefix marking a string value as a column reference.
///
/// `{"$eq": "~~other_column"}` compares against the quoted column instead
/// of binding the string as a parameter.
pub const COLUMN_MARKER: &str = "~~";

/// The mutable state of one build invocation.
pub struct BuildCtx<'e> {
    engine: &'e SqlBuilder,
    values: Vec<ParamValue>,
    operator_stack: Vec<String>,
    main_operator: Option<String>,
    depth: usize,
}

impl<'e> BuildCtx<'e> {
    pub(crate) fn new(engine: &'e SqlBuilder) -> Self {
        Self {
            engine,
            values: Vec::new(),
            operator_stack: Vec::new(),
            main_operator: None,
            depth: 0,
        }
    }

    /// The active dialect configuration.
    #[must_use]
    pub fn dialect(&self) -> &DialectConfig {
        self.engine.dialect()
    }

    /// Quotes an identifier with the dialect quote character.
    ///
    /// # Errors
    ///
    /// See [`SqlBuilder::quote`].
    pub fn quote(&self, identifier: &str) -> Result<String> {
        self.engine.quote(identifier)
    }

    /// Looks up a registered syntax (live, so dialect updates apply).
    /// The reference borrows from the builder, not from this context, so
    /// handlers can hold it across further context calls.
    #[must_use]
    pub fn syntax(&self, name: &str) -> Option<&'e Syntax> {
        self.engine.get_syntax(name)
    }

    /// Whether `name` is anywhere on the operator call stack.
    #[must_use]
    pub fn is_current(&self, name: &str) -> bool {
        self.operator_stack.iter().any(|n| n == name)
    }

    /// The statement-level operator governing this build, if one has
    /// declared itself.
    #[must_use]
    pub fn main_operator(&self) -> Option<&str> {
        self.main_operator.as_deref()
    }

    /// Declares the statement-level operator. Called by top-level statement
    /// handlers before they recurse into their body.
    pub fn set_main_operator(&mut self, name: impl Into<String>) {
        self.main_operator = Some(name.into());
    }

    /// Current recursion depth (0 outside of [`BuildCtx::build`]).
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// The values bound so far.
    #[must_use]
    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    pub(crate) fn into_values(self) -> Vec<ParamValue> {
        self.values
    }

    /// Binds `value` and returns the text standing in for it.
    ///
    /// Normally this pushes onto the value list and returns the dialect
    /// placeholder. Two exceptions:
    ///
    /// - a string with the [`COLUMN_MARKER`] prefix is a column reference,
    ///   quoted and inlined;
    /// - when the main operator is in the dialect's inline list (DDL), the
    ///   value is escaped and inlined because the dialect rejects bound
    ///   parameters in that statement kind.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnsupportedValue`] for arrays and objects.
    pub fn add_value(&mut self, value: &Value) -> Result<String> {
        if let Some(column) = value.as_str().and_then(|s| s.strip_prefix(COLUMN_MARKER)) {
            return self.quote(column);
        }
        let param = ParamValue::try_from(value)?;
        if self.inline_values_active() {
            return Ok(param.to_sql_inline());
        }
        self.values.push(param);
        Ok(self.dialect().placeholders.render(self.values.len()))
    }

    fn inline_values_active(&self) -> bool {
        self.main_operator.as_ref().is_some_and(|main| {
            self.dialect()
                .inline_value_mains
                .contains(&main.as_str())
        })
    }

    /// Dispatches to the active handler for `name`, maintaining the
    /// operator call stack around the invocation.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownOperator`] when nothing is registered
    /// under `name`; otherwise whatever the handler returns.
    pub fn call_operator(
        &mut self,
        name: &str,
        value: &Value,
        outer: &Value,
        identifier: Option<&str>,
    ) -> Result<String> {
        let handler = self
            .engine
            .registry()
            .active(name)
            .cloned()
            .ok_or_else(|| BuildError::UnknownOperator(String::from(name)))?;
        trace!("dispatching {}", name);
        self.operator_stack.push(String::from(name));
        let result = handler(self, value, outer, identifier);
        self.operator_stack.pop();
        result
    }

    /// Invokes the implementation layered underneath the active handler for
    /// `name`. Used by dialect overrides to delegate to the ANSI behavior.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownOperator`] when there is no earlier
    /// layer to delegate to.
    pub fn call_previous(
        &mut self,
        name: &str,
        value: &Value,
        outer: &Value,
        identifier: Option<&str>,
    ) -> Result<String> {
        let handler = self
            .engine
            .registry()
            .previous(name)
            .cloned()
            .ok_or_else(|| BuildError::UnknownOperator(String::from(name)))?;
        handler(self, value, outer, identifier)
    }

    /// Recursively builds a query node.
    ///
    /// With a syntax, slots are walked in their declared order; without
    /// one, object keys are walked in insertion order and joined with
    /// `join`. Arrays build each element and join the results.
    ///
    /// # Errors
    ///
    /// Propagates dispatch errors per the engine's error taxonomy.
    pub fn build(
        &mut self,
        node: &Value,
        identifier: Option<&str>,
        syntax: Option<&Syntax>,
        join: &str,
    ) -> Result<String> {
        self.depth += 1;
        let result = match syntax {
            Some(syntax) => self.run_syntax(syntax, node, identifier),
            None => self.run_keys(node, identifier, join),
        };
        self.depth -= 1;
        result
    }

    /// Slot-by-slot evaluation under a registered grammar.
    fn run_syntax(
        &mut self,
        syntax: &Syntax,
        node: &Value,
        identifier: Option<&str>,
    ) -> Result<String> {
        let map = node
            .as_object()
            .ok_or_else(|| BuildError::UnknownExpression(node.to_string()))?;

        for key in map.keys() {
            if !syntax.declares(key) {
                return Err(BuildError::UnknownExpression(key.clone()));
            }
        }

        let (chunks, _) = self.eval_nodes(syntax.nodes(), node, map, identifier)?;
        Ok(join_chunks(&chunks))
    }

    fn eval_nodes(
        &mut self,
        nodes: &[SyntaxNode],
        outer: &Value,
        map: &Map<String, Value>,
        identifier: Option<&str>,
    ) -> Result<(Vec<String>, bool)> {
        let mut chunks = Vec::new();
        let mut emitted = false;

        for node in nodes {
            match node {
                SyntaxNode::Text(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        chunks.push(String::from(trimmed));
                    }
                }
                SyntaxNode::Slot(slot) => match map.get(&slot.name) {
                    Some(value) => {
                        let fragment = self.call_operator(&slot.name, value, outer, identifier)?;
                        if !fragment.is_empty() {
                            chunks.push(fragment);
                            emitted = true;
                        }
                    }
                    None if slot.required => {
                        return Err(BuildError::RequiredSlotMissing(slot.name.clone()));
                    }
                    None => {}
                },
                SyntaxNode::Group(alternatives) => {
                    if let Some(alt) = alternatives.iter().find(|alt| alt_present(alt, map)) {
                        let (sub, sub_emitted) =
                            self.eval_nodes(alt, outer, map, identifier)?;
                        if sub_emitted {
                            chunks.extend(sub);
                            emitted = true;
                        }
                    }
                }
            }
        }

        Ok((chunks, emitted))
    }

    /// Key-by-key evaluation without a grammar.
    fn run_keys(&mut self, node: &Value, identifier: Option<&str>, join: &str) -> Result<String> {
        match node {
            Value::Object(map) => {
                let mut chunks = Vec::new();
                for (key, value) in map {
                    let fragment = if key.starts_with('$') {
                        self.call_operator(key, value, node, identifier)?
                    } else {
                        self.identifier_pair(key, value, join)?
                    };
                    if !fragment.is_empty() {
                        chunks.push(fragment);
                    }
                }
                Ok(chunks.join(join))
            }
            Value::Array(items) => {
                let mut chunks = Vec::new();
                for item in items {
                    let fragment = self.build(item, identifier, None, join)?;
                    if !fragment.is_empty() {
                        chunks.push(fragment);
                    }
                }
                Ok(chunks.join(join))
            }
            other => Err(BuildError::UnknownExpression(other.to_string())),
        }
    }

    /// An identifier key paired with its value.
    fn identifier_pair(&mut self, key: &str, value: &Value, join: &str) -> Result<String> {
        match value {
            Value::Object(_) => self.build(value, Some(key), None, join),
            Value::Array(_) => Err(BuildError::UnknownExpression(String::from(key))),
            Value::Null => Ok(format!("{} IS NULL", self.quote(key)?)),
            _ => {
                let column = self.quote(key)?;
                let placeholder = self.add_value(value)?;
                Ok(format!("{column} = {placeholder}"))
            }
        }
    }
}

/// Whether any slot of an alternative has a matching key in the node.
fn alt_present(nodes: &[SyntaxNode], map: &Map<String, Value>) -> bool {
    nodes.iter().any(|node| match node {
        SyntaxNode::Text(_) => false,
        SyntaxNode::Slot(slot) => map.contains_key(&slot.name),
        SyntaxNode::Group(alternatives) => alternatives.iter().any(|alt| alt_present(alt, map)),
    })
}

/// Joins rendered chunks with single spaces, gluing parentheses and commas
/// to their neighbors.
fn join_chunks(chunks: &[String]) -> String {
    let mut sql = String::new();
    for chunk in chunks {
        if chunk.is_empty() {
            continue;
        }
        if !sql.is_empty()
            && !sql.ends_with('(')
            && !chunk.starts_with(')')
            && !chunk.starts_with(',')
        {
            sql.push(' ');
        }
        sql.push_str(chunk);
    }
    sql
}

/// Removes one pair of enclosing parentheses when the leading `(` is
/// matched by the final `)`. A text whose first paren closes earlier (for
/// example a union of parenthesized branches) is left untouched.
pub(crate) fn strip_outer_parens(sql: &str) -> String {
    let trimmed = sql.trim();
    if trimmed.starts_with('(') && trimmed.ends_with(')') {
        let mut depth = 0usize;
        for (i, c) in trimmed.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if i == trimmed.len() - 1 {
                            return String::from(trimmed[1..i].trim());
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    String::from(trimmed)
}
