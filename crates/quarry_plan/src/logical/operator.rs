use super::logical_aggregate::LogicalAggregate;
use super::logical_filter::LogicalFilter;
use super::logical_from_query::LogicalFromQuery;
use super::logical_join::LogicalJoin;
use super::logical_limit::LogicalLimit;
use super::logical_order::LogicalOrder;
use super::logical_result::LogicalResult;
use super::logical_scan::{LogicalScanFile, LogicalScanTable};
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::explain::formatter::format_plan;
use std::fmt;

/// A node in the logical plan algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    ScanTable(LogicalScanTable),
    ScanFile(LogicalScanFile),
    FromQuery(LogicalFromQuery),
    Join(LogicalJoin),
    Filter(LogicalFilter),
    Aggregate(LogicalAggregate),
    Order(LogicalOrder),
    Limit(LogicalLimit),
    Result(LogicalResult),
}

impl LogicalOperator {
    pub fn children(&self) -> Vec<&LogicalOperator> {
        match self {
            Self::ScanTable(_) | Self::ScanFile(_) | Self::Result(_) => Vec::new(),
            Self::FromQuery(n) => vec![&n.input],
            Self::Join(n) => vec![&n.left, &n.right],
            Self::Filter(n) => vec![&n.input],
            Self::Aggregate(n) => vec![&n.input],
            Self::Order(n) => vec![&n.input],
            Self::Limit(n) => vec![&n.input],
        }
    }

    /// Walk the plan depth first, pre-order.
    pub fn walk(&self, f: &mut dyn FnMut(&LogicalOperator)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}

impl Explainable for LogicalOperator {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        match self {
            Self::ScanTable(n) => n.explain_entry(conf),
            Self::ScanFile(n) => n.explain_entry(conf),
            Self::FromQuery(n) => n.explain_entry(conf),
            Self::Join(n) => n.explain_entry(conf),
            Self::Filter(n) => n.explain_entry(conf),
            Self::Aggregate(n) => n.explain_entry(conf),
            Self::Order(n) => n.explain_entry(conf),
            Self::Limit(n) => n.explain_entry(conf),
            Self::Result(n) => n.explain_entry(conf),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = format_plan(self).map_err(|_| fmt::Error)?;
        write!(f, "{rendered}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind_context::TableId;
    use crate::expr::Expr;

    #[test]
    fn walk_visits_pre_order() {
        let plan = LogicalOperator::Filter(LogicalFilter {
            predicate: Expr::integer(1),
            input: Box::new(LogicalOperator::Join(LogicalJoin {
                op: super::super::logical_join::JoinOp::Cross,
                left: Box::new(LogicalOperator::ScanTable(LogicalScanTable {
                    table: TableId(0),
                    name: "a".to_string(),
                    alias: "a".to_string(),
                })),
                right: Box::new(LogicalOperator::ScanTable(LogicalScanTable {
                    table: TableId(1),
                    name: "b".to_string(),
                    alias: "b".to_string(),
                })),
            })),
        });

        let mut names = Vec::new();
        plan.walk(&mut |node| {
            names.push(match node {
                LogicalOperator::Filter(_) => "filter",
                LogicalOperator::Join(_) => "join",
                LogicalOperator::ScanTable(n) => match n.name.as_str() {
                    "a" => "scan-a",
                    _ => "scan-b",
                },
                _ => "other",
            });
        });
        assert_eq!(vec!["filter", "join", "scan-a", "scan-b"], names);
    }
}
