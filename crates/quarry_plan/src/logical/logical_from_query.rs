use super::operator::LogicalOperator;
use crate::binder::bind_context::TableId;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Wraps the plan of a FROM subquery or CTE occurrence, exporting its output
/// under the occurrence's alias.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalFromQuery {
    pub table: TableId,
    pub alias: String,
    pub input: Box<LogicalOperator>,
}

impl Explainable for LogicalFromQuery {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("FromQuery").with_value("alias", &self.alias)
    }
}
