use super::operator::LogicalOperator;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalFilter {
    pub predicate: Expr,
    pub input: Box<LogicalOperator>,
}

impl Explainable for LogicalFilter {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Filter").with_value("predicate", &self.predicate)
    }
}
