//! Grammar translator.
//!
//! A syntax template is a human-authored string mixing literal SQL keywords
//! with slot markers:
//!
//! - `<$name>`: required slot
//! - `[$name]`: optional slot
//! - `{ ... }`: optional group, emitted only when at least one contained
//!   slot is present in the query node
//! - `A | B`: alternation inside a group; the first alternative with a
//!   present slot wins
//! - `-->(mysql,postgres)`: restricts the preceding slot to those dialects
//!
//! Compilation parses the template into an explicit tree and strips slots
//! excluded for the active dialect, so build-time evaluation never needs to
//! reconsider dialect applicability.

mod parse;

use std::fmt;

use crate::dialect::DialectName;
use crate::error::Result;

/// One operator slot in a compiled syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// The operator name, including the `$` sigil.
    pub name: String,
    /// Whether the slot must be satisfied by the query node.
    pub required: bool,
}

/// A node of the compiled template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    /// Literal text emitted verbatim (whitespace-normalized).
    Text(String),
    /// An operator slot.
    Slot(Slot),
    /// An optional group; each inner sequence is one alternative.
    Group(Vec<Vec<SyntaxNode>>),
}

/// A compiled syntax: the ordered template tree for one statement.
#[derive(Debug, Clone)]
pub struct Syntax {
    nodes: Vec<SyntaxNode>,
    declared: Vec<String>,
}

impl Syntax {
    /// Compiles a template for the given dialect.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BuildError::MalformedSyntax`] when the template
    /// cannot be parsed (unbalanced brackets, bad slot markers, unknown
    /// dialect annotations).
    pub fn compile(template: &str, dialect: DialectName) -> Result<Self> {
        let nodes = parse::parse(template, dialect)?;
        let mut declared = Vec::new();
        collect_declared(&nodes, &mut declared);
        Ok(Self { nodes, declared })
    }

    /// The template tree in declared order.
    #[must_use]
    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }

    /// Operator names this syntax declares (after dialect filtering).
    #[must_use]
    pub fn declared(&self) -> &[String] {
        &self.declared
    }

    /// Whether the syntax declares the given operator.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.declared.iter().any(|n| n == name)
    }
}

fn collect_declared(nodes: &[SyntaxNode], out: &mut Vec<String>) {
    for node in nodes {
        match node {
            SyntaxNode::Text(_) => {}
            SyntaxNode::Slot(slot) => {
                if !out.contains(&slot.name) {
                    out.push(slot.name.clone());
                }
            }
            SyntaxNode::Group(alternatives) => {
                for alt in alternatives {
                    collect_declared(alt, out);
                }
            }
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.nodes)
    }
}

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[SyntaxNode]) -> fmt::Result {
    for node in nodes {
        match node {
            SyntaxNode::Text(text) => f.write_str(text)?,
            SyntaxNode::Slot(slot) => {
                if slot.required {
                    write!(f, "<{}>", slot.name)?;
                } else {
                    write!(f, "[{}]", slot.name)?;
                }
            }
            SyntaxNode::Group(alternatives) => {
                f.write_str("{")?;
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write_nodes(f, alt)?;
                }
                f.write_str("}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_slots_in_order() {
        let syntax =
            Syntax::compile("SELECT [$distinct] <$columns>", DialectName::Ansi).unwrap();
        assert_eq!(syntax.declared(), ["$distinct", "$columns"]);
        assert!(syntax.declares("$columns"));
        assert!(!syntax.declares("$where"));
    }

    #[test]
    fn groups_nest() {
        let syntax =
            Syntax::compile("{ WHERE [$where]} { LIMIT [$limit]}", DialectName::Ansi).unwrap();
        assert_eq!(syntax.declared(), ["$where", "$limit"]);
        let groups = syntax
            .nodes()
            .iter()
            .filter(|n| matches!(n, SyntaxNode::Group(_)))
            .count();
        assert_eq!(groups, 2);
    }

    #[test]
    fn dialect_annotation_strips_slot() {
        let template = "{ LIMIT [$limit] -->(mysql,postgres)}";
        let ansi = Syntax::compile(template, DialectName::Ansi).unwrap();
        assert!(ansi.declared().is_empty());

        let mysql = Syntax::compile(template, DialectName::Mysql).unwrap();
        assert_eq!(mysql.declared(), ["$limit"]);
    }

    #[test]
    fn alternation_declares_all_branches() {
        let syntax =
            Syntax::compile("{ [$documents] | [$values]}", DialectName::Ansi).unwrap();
        assert_eq!(syntax.declared(), ["$documents", "$values"]);
    }

    #[test]
    fn display_is_normalized() {
        let syntax =
            Syntax::compile("SELECT    <$columns>   { FROM [$from]}", DialectName::Ansi)
                .unwrap();
        assert_eq!(syntax.to_string(), "SELECT <$columns> { FROM [$from]}");
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert!(Syntax::compile("SELECT <$columns", DialectName::Ansi).is_err());
        assert!(Syntax::compile("{ WHERE [$where]", DialectName::Ansi).is_err());
        assert!(Syntax::compile("[$]", DialectName::Ansi).is_err());
        assert!(Syntax::compile("[$x] -->(oracle)", DialectName::Ansi).is_err());
    }
}
