use super::operator::LogicalOperator;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expr;

/// Grouped aggregation with an optional HAVING filter.
///
/// `aggregates` holds whole selection items containing aggregates, in
/// first-occurrence order with structural duplicates removed.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalAggregate {
    pub group_by: Vec<Expr>,
    pub aggregates: Vec<Expr>,
    pub having: Option<Expr>,
    pub input: Box<LogicalOperator>,
}

impl Explainable for LogicalAggregate {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("Aggregate")
            .with_values("group", &self.group_by)
            .with_values("aggs", &self.aggregates);
        if let Some(having) = &self.having {
            ent = ent.with_value("having", having);
        }
        ent
    }
}
