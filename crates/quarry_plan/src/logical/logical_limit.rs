use super::operator::LogicalOperator;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLimit {
    pub limit: Expr,
    pub input: Box<LogicalOperator>,
}

impl Explainable for LogicalLimit {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Limit").with_value("limit", &self.limit)
    }
}
