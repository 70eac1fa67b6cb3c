use crate::binder::bind_context::{ScopeId, TableId};
use crate::binder::table_ref::{BaseTableRef, TableRef};
use crate::expr::Expr;
use crate::logical::operator::LogicalOperator;
use std::cell::RefCell;
use std::rc::Rc;

/// Handle to a SELECT shared between the AST position that introduced it and
/// the statement-level bookkeeping lists (`subqueries`, `cte_from`).
///
/// Binding and planning are single-threaded, so plain `Rc<RefCell<_>>`
/// sharing is sound; shared statements are guarded by their `bound` flag so
/// they bind exactly once.
pub type SelectRef = Rc<RefCell<SelectStmt>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStmt),
    CreateTable(CreateTableStmt),
    CreateIndex(CreateIndexStmt),
    Insert(InsertStmt),
    Copy(CopyStmt),
    Analyze(AnalyzeStmt),
}

/// An ORDER BY term: the expression plus its direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub desc: bool,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        OrderByExpr { expr, desc: false }
    }

    pub fn desc(expr: Expr) -> Self {
        OrderByExpr { expr, desc: true }
    }
}

impl std::fmt::Display for OrderByExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.expr, if self.desc { "DESC" } else { "ASC" })
    }
}

/// A named SELECT from a WITH clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonTableExpr {
    pub name: String,
    pub col_names: Option<Vec<String>>,
    pub query: SelectRef,
}

impl CommonTableExpr {
    pub fn new(name: impl Into<String>, query: SelectStmt) -> Self {
        CommonTableExpr {
            name: name.into(),
            col_names: None,
            query: Rc::new(RefCell::new(query)),
        }
    }
}

/// A core SELECT statement.
///
/// Constructed by a parser frontend (or directly in tests), mutated in place
/// by `bind`, then planned once by `create_plan`. After planning the
/// statement is treated as immutable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectStmt {
    pub selection: Vec<Expr>,
    pub from: Vec<TableRef>,
    pub where_expr: Option<Expr>,
    /// Empty means no GROUP BY clause.
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<Expr>,
    pub ctes: Vec<CommonTableExpr>,
    /// UNION/INTERSECT-style composition; `self` is the main body.
    pub set_queries: Vec<SelectRef>,

    /// True once any selection item contains an aggregate. Set during
    /// binding.
    pub has_agg: bool,
    /// Set once binding completes.
    pub bound: bool,
    /// Scope this statement was bound in.
    pub scope: Option<ScopeId>,
    /// CTEs materialized as query table refs, in declaration order.
    pub cte_from: Vec<TableRef>,
    /// Sub-SELECTs discovered while planning expressions.
    pub subqueries: Vec<SelectRef>,
    /// FROM subqueries together with the bound table wrapping them; the
    /// `LogicalFromQuery` for an entry is found in `logic_plan` by table id.
    pub from_queries: Vec<(SelectRef, TableId)>,
    /// The finished plan, recorded by `create_plan`.
    pub logic_plan: Option<Box<LogicalOperator>>,
}

impl SelectStmt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap this statement for use as a shared sub-statement.
    pub fn into_shared(self) -> SelectRef {
        Rc::new(RefCell::new(self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    /// SQL spelling of the column type, validated during binding.
    pub type_name: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        ColumnSpec {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStmt {
    pub name: String,
    pub table: BaseTableRef,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table: BaseTableRef,
    /// Explicit target columns, empty for positional inserts.
    pub columns: Vec<String>,
    /// VALUES rows, when the source is not a SELECT.
    pub values: Vec<Vec<Expr>>,
    /// SELECT source; bound and planned under a fresh scope.
    pub source: Option<SelectRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopyStmt {
    pub table: BaseTableRef,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeStmt {
    pub table: BaseTableRef,
}
