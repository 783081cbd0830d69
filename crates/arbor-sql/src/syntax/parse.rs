//! Template string parser.
//!
//! A small recursive-descent parser over the template character stream.
//! Dialect filtering happens here: a slot whose `-->(...)` annotation
//! excludes the active dialect is dropped from the tree before the syntax
//! is ever evaluated.

use crate::dialect::DialectName;
use crate::error::{BuildError, Result};

use super::{Slot, SyntaxNode};

/// Parses `template` into a node tree for the given dialect.
pub fn parse(template: &str, dialect: DialectName) -> Result<Vec<SyntaxNode>> {
    let mut parser = Parser {
        template,
        pos: 0,
        dialect,
    };
    let nodes = parser.sequence(false)?;
    match parser.peek() {
        None => Ok(nodes),
        Some(c) => Err(parser.error(format!("unbalanced '{c}'"))),
    }
}

struct Parser<'a> {
    template: &'a str,
    pos: usize,
    dialect: DialectName,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.template[self.pos..].chars().next()
    }

    fn rest(&self) -> &str {
        &self.template[self.pos..]
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> BuildError {
        BuildError::MalformedSyntax {
            template: String::from(self.template),
            message: message.into(),
        }
    }

    /// Parses a node sequence. Inside a group the sequence ends at `}` or
    /// `|` (left unconsumed for the group parser); at the top level it ends
    /// at end of input.
    fn sequence(&mut self, in_group: bool) -> Result<Vec<SyntaxNode>> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        while let Some(c) = self.peek() {
            match c {
                '}' | '|' if in_group => break,
                '}' | '|' => return Err(self.error(format!("unbalanced '{c}'"))),
                '{' => {
                    flush_text(&mut nodes, &mut text);
                    self.advance();
                    nodes.push(self.group()?);
                }
                '<' | '[' if self.second_char() == Some('$') => {
                    flush_text(&mut nodes, &mut text);
                    self.advance();
                    nodes.push(self.slot(c)?);
                }
                '-' if self.rest().starts_with("-->(") => {
                    flush_text(&mut nodes, &mut text);
                    let dialects = self.annotation()?;
                    self.attach_annotation(&mut nodes, &dialects)?;
                }
                _ => {
                    self.advance();
                    if c.is_whitespace() {
                        if !text.ends_with(' ') {
                            text.push(' ');
                        }
                    } else {
                        text.push(c);
                    }
                }
            }
        }

        flush_text(&mut nodes, &mut text);
        Ok(nodes)
    }

    fn second_char(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    /// Parses `{ alt | alt | ... }` after the opening brace was consumed.
    fn group(&mut self) -> Result<SyntaxNode> {
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.sequence(true)?);
            match self.advance() {
                Some('}') => break,
                Some('|') => {}
                _ => return Err(self.error("unbalanced '{'")),
            }
        }
        Ok(SyntaxNode::Group(alternatives))
    }

    /// Parses `<$name>` or `[$name]` after the opener was consumed.
    fn slot(&mut self, opener: char) -> Result<SyntaxNode> {
        let (required, closer) = if opener == '<' {
            (true, '>')
        } else {
            (false, ']')
        };

        let mut name = String::new();
        match self.advance() {
            Some('$') => name.push('$'),
            _ => return Err(self.error("slot name must start with '$'")),
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if name.len() == 1 {
            return Err(self.error("empty slot name"));
        }
        if self.advance() != Some(closer) {
            return Err(self.error(format!("slot '{name}' is missing its '{closer}'")));
        }

        Ok(SyntaxNode::Slot(Slot { name, required }))
    }

    /// Parses `-->(a,b)` after the marker was detected.
    fn annotation(&mut self) -> Result<Vec<DialectName>> {
        for _ in 0..4 {
            self.advance();
        }
        let mut names = String::new();
        loop {
            match self.advance() {
                Some(')') => break,
                Some(c) => names.push(c),
                None => return Err(self.error("dialect annotation is missing its ')'")),
            }
        }
        names
            .split(',')
            .map(|name| name.trim().parse::<DialectName>())
            .collect::<Result<Vec<_>>>()
            .map_err(|e| self.error(e.to_string()))
    }

    /// Applies an annotation to the slot it follows: the slot is kept only
    /// when the active dialect is listed.
    fn attach_annotation(
        &mut self,
        nodes: &mut Vec<SyntaxNode>,
        dialects: &[DialectName],
    ) -> Result<()> {
        let mut spacing = Vec::new();
        while matches!(nodes.last(), Some(SyntaxNode::Text(t)) if t.trim().is_empty()) {
            if let Some(node) = nodes.pop() {
                spacing.push(node);
            }
        }

        if matches!(nodes.last(), Some(SyntaxNode::Slot(_))) {
            if dialects.contains(&self.dialect) {
                nodes.extend(spacing.into_iter().rev());
            } else {
                nodes.pop();
            }
            Ok(())
        } else {
            Err(self.error("dialect annotation must follow a slot"))
        }
    }
}

fn flush_text(nodes: &mut Vec<SyntaxNode>, text: &mut String) {
    if !text.is_empty() {
        nodes.push(SyntaxNode::Text(std::mem::take(text)));
    }
}
