use super::operator::LogicalOperator;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use quarry_error::{not_implemented, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOp {
    Cross,
    Inner,
    Left,
    Right,
    Full,
}

impl JoinOp {
    /// Map a lowercased join token from the parsed tree.
    pub fn from_token(token: &str) -> Result<JoinOp> {
        Ok(match token {
            "cross" => Self::Cross,
            "join" | "inner" => Self::Inner,
            "left" => Self::Left,
            "right" => Self::Right,
            "full" | "outer" => Self::Full,
            other => not_implemented!("join type {other}"),
        })
    }
}

impl fmt::Display for JoinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cross => write!(f, "CROSS"),
            Self::Inner => write!(f, "INNER"),
            Self::Left => write!(f, "LEFT"),
            Self::Right => write!(f, "RIGHT"),
            Self::Full => write!(f, "FULL"),
        }
    }
}

/// A binary join. N-ary joins and multi-item FROM lists are folded into
/// left-deep chains of these.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalJoin {
    pub op: JoinOp,
    pub left: Box<LogicalOperator>,
    pub right: Box<LogicalOperator>,
}

impl Explainable for LogicalJoin {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Join").with_value("type", self.op)
    }
}
