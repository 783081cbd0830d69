//! Declarative operator definitions.
//!
//! An [`OperatorDef`] describes an operator as data: the value shapes it
//! accepts, a sub-grammar (or iteration rule, or function) per shape,
//! optional lifecycle hooks, and embedded documentation with
//! example/expected-output fixtures. Registration compiles the definition
//! into a handler and validates it exhaustively first: a definition
//! without docs or fixtures never registers.
//!
//! Sub-grammar templates may use the substitution tokens `<value>` (bind
//! the value), `<ident>` (quote the value as an identifier), `<key>`
//! (quote the map key during object iteration) and `<identifier>` (quote
//! the contextual column identifier).

use std::sync::Arc;

use serde_json::Value;

use crate::builder::SqlBuilder;
use crate::context::BuildCtx;
use crate::error::{BuildError, Result};
use crate::syntax::Syntax;

pub use crate::dialect::DialectName;

/// Rewrites the query node before type resolution (desugaring).
pub type LinkFn = fn(Value) -> Value;
/// Inspects/transforms the node after type resolution.
pub type BeforeFn = fn(&mut BuildCtx<'_>, &Value) -> Result<Value>;
/// Post-processes the rendered text.
pub type AfterFn = fn(&mut BuildCtx<'_>, String) -> Result<String>;
/// A hand-written render function for one value shape.
pub type RenderFn = fn(&mut BuildCtx<'_>, &Value, &Value, Option<&str>) -> Result<String>;

/// The JSON-level shape of an operator value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// JSON null.
    Null,
}

impl Shape {
    /// The shape of a value.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::Null => Self::Null,
        }
    }

    /// The shape name used in "must be type of" messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
        }
    }
}

/// Selects the item template during an [`Render::EachItem`] iteration.
/// Value keys match before shape keys when listed first; items are tried
/// in declared order.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKey {
    /// Match any value of the given shape.
    Shape(Shape),
    /// Match exactly this boolean.
    Bool(bool),
    /// Match exactly this integer.
    Number(i64),
    /// Match exactly this string.
    Str(&'static str),
}

impl ItemKey {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Shape(shape) => *shape == Shape::of(value),
            Self::Bool(b) => value.as_bool() == Some(*b),
            Self::Number(n) => value.as_i64() == Some(*n),
            Self::Str(s) => value.as_str() == Some(*s),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Shape(shape) => String::from(shape.label()),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Str(s) => format!("'{s}'"),
        }
    }
}

/// One item rule of an [`Render::EachItem`] iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDef {
    /// What this rule matches.
    pub key: ItemKey,
    /// The sub-grammar template rendered per matching item.
    pub template: String,
}

impl ItemDef {
    /// Creates an item rule.
    #[must_use]
    pub fn new(key: ItemKey, template: impl Into<String>) -> Self {
        Self {
            key,
            template: template.into(),
        }
    }
}

/// How a value shape renders.
#[derive(Debug, Clone)]
pub enum Render {
    /// A literal sub-grammar template. For the object shape the template
    /// is compiled as a full slot grammar; for other shapes it is token
    /// substitution.
    Template(String),
    /// Iterate a collection, rendering each item by its matching rule.
    EachItem {
        /// Separator between rendered items.
        join: &'static str,
        /// Item rules, tried in declared order.
        items: Vec<ItemDef>,
    },
    /// A hand-written render function.
    Func(RenderFn),
}

/// An example with its expected output, embedded in the definition.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// The dialect the expected output is written for.
    pub dialect: DialectName,
    /// The query tree, as JSON text.
    pub query: &'static str,
    /// The expected SQL.
    pub sql: &'static str,
    /// The expected bound values, as a JSON array.
    pub values: &'static str,
}

impl Fixture {
    /// Creates a fixture.
    #[must_use]
    pub const fn new(
        dialect: DialectName,
        query: &'static str,
        sql: &'static str,
        values: &'static str,
    ) -> Self {
        Self {
            dialect,
            query,
            sql,
            values,
        }
    }
}

/// One accepted value shape of an operator definition.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// The accepted shape.
    pub shape: Shape,
    /// Shape-specific documentation.
    pub docs: &'static str,
    /// How values of this shape render.
    pub render: Render,
    /// Example/expected-output fixtures. At least one is mandatory.
    pub fixtures: Vec<Fixture>,
}

impl TypeDef {
    /// Creates a type rule with no fixtures yet.
    #[must_use]
    pub const fn new(shape: Shape, docs: &'static str, render: Render) -> Self {
        Self {
            shape,
            docs,
            render,
            fixtures: Vec::new(),
        }
    }

    /// Attaches a fixture.
    #[must_use]
    pub fn with_fixture(mut self, fixture: Fixture) -> Self {
        self.fixtures.push(fixture);
        self
    }
}

/// A declarative operator definition.
#[derive(Debug, Clone)]
pub struct OperatorDef {
    /// The operator name, including the `$` sigil.
    pub name: String,
    /// Operator-level documentation.
    pub docs: &'static str,
    /// The accepted shapes, one rule each.
    pub types: Vec<TypeDef>,
    /// Desugaring hook, applied before type resolution.
    pub link: Option<LinkFn>,
    /// Hook applied after type resolution, before rendering.
    pub before: Option<BeforeFn>,
    /// Hook applied to the rendered text.
    pub after: Option<AfterFn>,
}

impl OperatorDef {
    /// Creates a definition with no type rules yet.
    #[must_use]
    pub fn new(name: &str, docs: &'static str) -> Self {
        Self {
            name: String::from(name),
            docs,
            types: Vec::new(),
            link: None,
            before: None,
            after: None,
        }
    }

    /// Adds a type rule.
    #[must_use]
    pub fn with_type(mut self, type_def: TypeDef) -> Self {
        self.types.push(type_def);
        self
    }

    /// Sets the desugaring hook.
    #[must_use]
    pub fn with_link(mut self, link: LinkFn) -> Self {
        self.link = Some(link);
        self
    }

    /// Sets the pre-render hook.
    #[must_use]
    pub fn with_before(mut self, before: BeforeFn) -> Self {
        self.before = Some(before);
        self
    }

    /// Sets the post-render hook.
    #[must_use]
    pub fn with_after(mut self, after: AfterFn) -> Self {
        self.after = Some(after);
        self
    }

    fn expected_shapes(&self) -> String {
        self.types
            .iter()
            .map(|t| t.shape.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Validates and registers a definition on the builder.
pub(crate) fn register(builder: &mut SqlBuilder, def: OperatorDef) -> Result<()> {
    validate(&def)?;

    let mut object_syntaxes = Vec::with_capacity(def.types.len());
    for type_def in &def.types {
        let compiled = match (&type_def.shape, &type_def.render) {
            (Shape::Object, Render::Template(template)) => {
                Some(Syntax::compile(template, builder.dialect().name)?)
            }
            _ => None,
        };
        object_syntaxes.push(compiled);
    }

    let def = Arc::new(def);
    let compiled = CompiledDef {
        def: Arc::clone(&def),
        object_syntaxes,
    };
    let name = def.name.clone();
    builder.register_operator(&name, move |ctx, value, outer, identifier| {
        compiled.execute(ctx, value, outer, identifier)
    });
    builder.registry_mut().push_def(def);
    Ok(())
}

fn invalid(def: &OperatorDef, message: impl Into<String>) -> BuildError {
    BuildError::InvalidDefinition {
        operator: def.name.clone(),
        message: message.into(),
    }
}

fn validate(def: &OperatorDef) -> Result<()> {
    if !def.name.starts_with('$') || def.name.len() < 2 {
        return Err(invalid(def, "operator names start with '$'"));
    }
    if def.docs.trim().is_empty() {
        return Err(invalid(def, "documentation is mandatory"));
    }
    if def.types.is_empty() {
        return Err(invalid(def, "at least one value type must be declared"));
    }

    let mut seen = Vec::new();
    for type_def in &def.types {
        if seen.contains(&type_def.shape) {
            return Err(invalid(
                def,
                format!("duplicate declaration for type {}", type_def.shape.label()),
            ));
        }
        seen.push(type_def.shape);

        if type_def.docs.trim().is_empty() {
            return Err(invalid(
                def,
                format!("type {} is missing documentation", type_def.shape.label()),
            ));
        }
        if type_def.fixtures.is_empty() {
            return Err(invalid(
                def,
                format!("type {} has no example fixture", type_def.shape.label()),
            ));
        }
        for fixture in &type_def.fixtures {
            if serde_json::from_str::<Value>(fixture.query).is_err() {
                return Err(invalid(def, format!("broken fixture query: {}", fixture.query)));
            }
            match serde_json::from_str::<Value>(fixture.values) {
                Ok(Value::Array(_)) => {}
                _ => {
                    return Err(invalid(
                        def,
                        format!("fixture values must be a JSON array: {}", fixture.values),
                    ));
                }
            }
        }

        match &type_def.render {
            Render::Template(template) => {
                if template.trim().is_empty() {
                    return Err(invalid(def, "empty sub-grammar template"));
                }
            }
            Render::EachItem { items, .. } => {
                if !matches!(type_def.shape, Shape::Object | Shape::Array) {
                    return Err(invalid(
                        def,
                        "item iteration requires an object or array type",
                    ));
                }
                if items.is_empty() {
                    return Err(invalid(def, "item iteration declares no item rules"));
                }
            }
            Render::Func(_) => {}
        }
    }
    Ok(())
}

/// A definition compiled against one builder's dialect.
struct CompiledDef {
    def: Arc<OperatorDef>,
    /// Parallel to `def.types`: the compiled grammar for object templates.
    object_syntaxes: Vec<Option<Syntax>>,
}

impl CompiledDef {
    fn execute(
        &self,
        ctx: &mut BuildCtx<'_>,
        value: &Value,
        outer: &Value,
        identifier: Option<&str>,
    ) -> Result<String> {
        let linked;
        let mut current = value;
        if let Some(link) = self.def.link {
            linked = link(value.clone());
            current = &linked;
        }

        let shape = Shape::of(current);
        let index = self
            .def
            .types
            .iter()
            .position(|t| t.shape == shape)
            .ok_or_else(|| BuildError::TypeMismatch {
                operator: self.def.name.clone(),
                expected: self.def.expected_shapes(),
            })?;

        let prepared;
        if let Some(before) = self.def.before {
            prepared = before(ctx, current)?;
            current = &prepared;
        }

        let type_def = &self.def.types[index];
        let rendered = match &type_def.render {
            Render::Func(f) => f(ctx, current, outer, identifier)?,
            Render::Template(template) => match &self.object_syntaxes[index] {
                Some(syntax) => ctx.build(current, identifier, Some(syntax), " ")?,
                None => substitute(ctx, &self.def.name, template, None, current, identifier)?,
            },
            Render::EachItem { join, items } => {
                self.each_item(ctx, current, identifier, join, items)?
            }
        };

        match self.def.after {
            Some(after) => after(ctx, rendered),
            None => Ok(rendered),
        }
    }

    fn each_item(
        &self,
        ctx: &mut BuildCtx<'_>,
        value: &Value,
        identifier: Option<&str>,
        join: &str,
        items: &[ItemDef],
    ) -> Result<String> {
        let mut rendered = Vec::new();
        match value {
            Value::Object(map) => {
                for (key, item) in map {
                    rendered.push(self.render_item(ctx, items, Some(key.as_str()), item, identifier)?);
                }
            }
            Value::Array(list) => {
                for item in list {
                    rendered.push(self.render_item(ctx, items, None, item, identifier)?);
                }
            }
            other => {
                return Err(BuildError::TypeMismatch {
                    operator: self.def.name.clone(),
                    expected: format!("object, array (got {})", Shape::of(other).label()),
                });
            }
        }
        Ok(rendered
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(join))
    }

    fn render_item(
        &self,
        ctx: &mut BuildCtx<'_>,
        items: &[ItemDef],
        key: Option<&str>,
        value: &Value,
        identifier: Option<&str>,
    ) -> Result<String> {
        let item = items
            .iter()
            .find(|i| i.key.matches(value))
            .ok_or_else(|| BuildError::TypeMismatch {
                operator: self.def.name.clone(),
                expected: items
                    .iter()
                    .map(|i| i.key.label())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        substitute(ctx, &self.def.name, &item.template, key, value, identifier)
    }
}

/// Renders a primitive sub-grammar template by token substitution.
fn substitute(
    ctx: &mut BuildCtx<'_>,
    operator: &str,
    template: &str,
    key: Option<&str>,
    value: &Value,
    identifier: Option<&str>,
) -> Result<String> {
    let mut out = String::from(template);
    if out.contains("<identifier>") {
        let identifier = identifier.ok_or_else(|| BuildError::InvalidContext {
            operator: String::from(operator),
            message: String::from("no column identifier in scope"),
        })?;
        let quoted = ctx.quote(identifier)?;
        out = out.replace("<identifier>", &quoted);
    }
    if out.contains("<key>") {
        let key = key.ok_or_else(|| BuildError::InvalidContext {
            operator: String::from(operator),
            message: String::from("template uses <key> outside an object iteration"),
        })?;
        let quoted = ctx.quote(key)?;
        out = out.replace("<key>", &quoted);
    }
    if out.contains("<ident>") {
        let name = value.as_str().ok_or_else(|| BuildError::TypeMismatch {
            operator: String::from(operator),
            expected: String::from("string"),
        })?;
        let quoted = ctx.quote(name)?;
        out = out.replace("<ident>", &quoted);
    }
    if out.contains("<value>") {
        let bound = ctx.add_value(value)?;
        out = out.replace("<value>", &bound);
    }
    Ok(out)
}
