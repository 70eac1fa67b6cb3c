use super::Expr;
use crate::statement::SelectStmt;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum SubqueryKind {
    /// Scalar subquery producing a single value.
    Scalar,
    /// EXISTS / NOT EXISTS.
    Exists { negated: bool },
    /// `<expr> IN (<subquery>)` / `<expr> NOT IN (<subquery>)`.
    In { expr: Box<Expr>, negated: bool },
}

/// An expression wrapping an inner SELECT.
///
/// The inner statement is shared: the enclosing statement's `subqueries` list
/// holds the same handle once the subquery has been discovered during
/// planning.
#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryExpr {
    pub kind: SubqueryKind,
    pub query: Rc<RefCell<SelectStmt>>,
}

impl SubqueryExpr {
    pub fn new(kind: SubqueryKind, query: SelectStmt) -> Self {
        SubqueryExpr {
            kind,
            query: Rc::new(RefCell::new(query)),
        }
    }
}

impl fmt::Display for SubqueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The inner statement may be mid-mutation while a plan is formatted;
        // render a placeholder rather than borrowing it.
        match &self.kind {
            SubqueryKind::Scalar => write!(f, "(<subquery>)"),
            SubqueryKind::Exists { negated: false } => write!(f, "EXISTS (<subquery>)"),
            SubqueryKind::Exists { negated: true } => write!(f, "NOT EXISTS (<subquery>)"),
            SubqueryKind::In {
                expr,
                negated: false,
            } => write!(f, "{expr} IN (<subquery>)"),
            SubqueryKind::In {
                expr,
                negated: true,
            } => write!(f, "{expr} NOT IN (<subquery>)"),
        }
    }
}
