//! Lowering of filter trees into vector-set filter expressions
//!
//! | Node | Expression |
//! |------|------------|
//! | `Eq{name, "alice"}` | `.name=="alice"` |
//! | `Gt{age, 5}` | `.age>5` |
//! | `In{age, [1,2,3]}` | `.age in [1,2,3]` |
//! | `NotIn{age, [1,2]}` | `.age not (in [1,2])` |
//! | `And{l, r}` | `(l and r)` |
//! | `Or{l, r}` | `(l or r)` |
//! | `Not{e}` | `(not e)` |
//!
//! String literals are wrapped in double quotes verbatim; embedded quotes are
//! not escaped. NaN and infinite floats have no literal form, so a leaf
//! holding one does not compile.

use tracing::warn;

use crate::expr::{FilterExpr, Operand, Scalar};

/// Compile an optional filter tree.
///
/// Returns `None` when there is no tree, or when any node required for the
/// result has no rendering. A combinator only renders if every child does, so
/// an unsupported leaf anywhere under an `And` drops the whole `And`.
pub fn compile(expr: Option<&FilterExpr>) -> Option<String> {
    expr.and_then(lower)
}

impl FilterExpr {
    /// Compile this tree, see [`compile`]
    pub fn compile(&self) -> Option<String> {
        lower(self)
    }
}

fn lower(expr: &FilterExpr) -> Option<String> {
    match expr {
        FilterExpr::Eq { key, value } => Some(format!(".{key}=={}", render(value)?)),
        FilterExpr::Neq { key, value } => Some(format!(".{key}!={}", render(value)?)),
        FilterExpr::Gte { key, value } => Some(format!(".{key}>={}", render(value)?)),
        FilterExpr::Gt { key, value } => Some(format!(".{key}>{}", render(value)?)),
        FilterExpr::Lt { key, value } => Some(format!(".{key}<{}", render(value)?)),
        FilterExpr::Lte { key, value } => Some(format!(".{key}<={}", render(value)?)),
        FilterExpr::In { key, value } => Some(format!(".{key} in {}", render(value)?)),
        FilterExpr::NotIn { key, value } => Some(format!(".{key} not (in {})", render(value)?)),
        FilterExpr::And { left, right } => {
            let left = lower(left)?;
            let right = lower(right)?;
            Some(format!("({left} and {right})"))
        }
        FilterExpr::Or { left, right } => {
            let left = lower(left)?;
            let right = lower(right)?;
            Some(format!("({left} or {right})"))
        }
        FilterExpr::Not { expr } => lower(expr).map(|inner| format!("(not {inner})")),
        unsupported => {
            warn!(kind = unsupported.kind(), filter = ?unsupported, "Filter type not supported");
            None
        }
    }
}

fn literal(scalar: &Scalar) -> Option<String> {
    match scalar {
        Scalar::Float(x) if !x.is_finite() => {
            warn!(value = %x, "Non-finite number in filter");
            None
        }
        other => Some(other.to_string()),
    }
}

fn render(value: &Operand) -> Option<String> {
    match value {
        Operand::Scalar(scalar) => literal(scalar),
        Operand::Set(values) => {
            let rendered = values
                .iter()
                .filter(|v| !v.is_null())
                .map(literal)
                .collect::<Option<Vec<_>>>()?;
            Some(format!("[{}]", rendered.join(",")))
        }
    }
}
