use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expr;

/// Produces a single row from constant expressions; the plan of a SELECT
/// with no FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalResult {
    pub exprs: Vec<Expr>,
}

impl Explainable for LogicalResult {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Result").with_values("expressions", &self.exprs)
    }
}
