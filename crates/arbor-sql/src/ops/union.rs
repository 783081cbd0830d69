//! Set operations over whole statements.
//!
//! Every branch keeps the parentheses its own statement renders with; the
//! combined text is never paren-stripped because its leading parenthesis
//! closes before the set keyword.

use crate::builder::SqlBuilder;
use crate::error::{BuildError, Result};

pub(crate) fn register(builder: &mut SqlBuilder) -> Result<()> {
    register_set_op(builder, "$union", "UNION");
    register_set_op(builder, "$unionAll", "UNION ALL");
    register_set_op(builder, "$intersect", "INTERSECT");
    register_set_op(builder, "$except", "EXCEPT");
    Ok(())
}

fn register_set_op(builder: &mut SqlBuilder, name: &'static str, keyword: &'static str) {
    builder.register_operator(name, move |ctx, value, _outer, _identifier| {
        let branches = value
            .as_array()
            .filter(|branches| branches.len() >= 2)
            .ok_or_else(|| BuildError::TypeMismatch {
                operator: String::from(name),
                expected: String::from("array of at least two statements"),
            })?;
        let parts = branches
            .iter()
            .map(|branch| ctx.build(branch, None, None, " "))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(&format!(" {keyword} ")))
    });
}
