pub mod aggregate_expr;
pub mod case_expr;
pub mod column_expr;
pub mod scalar;
pub mod subquery_expr;

use crate::database::datatype::DataType;
use crate::statement::SelectStmt;
use aggregate_expr::{AggregateExpr, AggregateFunction};
use case_expr::CaseExpr;
use column_expr::ColumnExpr;
use scalar::{BinaryOperator, ConjunctionOperator, LiteralValue, UnaryOperator};
use std::fmt;
use subquery_expr::{SubqueryExpr, SubqueryKind};

/// A scalar expression.
///
/// The kind carries the variant payload; the remaining fields are metadata
/// shared by every variant. `output_name` names the expression when it
/// appears as a SELECT item, `alias` is the name outer clauses (ORDER BY,
/// GROUP BY) of the same SELECT refer to it by, and `bound` flips once
/// binding completes.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub output_name: Option<String>,
    pub alias: Option<String>,
    pub bound: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(LiteralValue),
    Column(ColumnExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Conjunction(ConjunctionExpr),
    Cast(CastExpr),
    Case(CaseExpr),
    Function(FunctionExpr),
    Aggregate(AggregateExpr),
    Subquery(SubqueryExpr),
    InList(InListExpr),
    /// `*` or `t.*` in a selection list. Removed during binding.
    Star(StarExpr),
    /// Handle to an expression computed elsewhere in the plan, e.g. an
    /// aggregate output re-exported by a FROM subquery.
    ExprRef(ExprRefExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOperator,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinaryOperator,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConjunctionExpr {
    pub op: ConjunctionOperator,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub expr: Box<Expr>,
    pub to: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InListExpr {
    pub expr: Box<Expr>,
    pub list: Vec<Expr>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarExpr {
    pub table: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprRefExpr {
    pub expr: Box<Expr>,
    /// Position of the computed expression in the producing output list.
    pub ordinal: usize,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            output_name: None,
            alias: None,
            bound: false,
        }
    }

    pub fn literal(value: LiteralValue) -> Self {
        Self::new(ExprKind::Literal(value))
    }

    pub fn integer(value: i64) -> Self {
        Self::literal(LiteralValue::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::literal(LiteralValue::String(value.into()))
    }

    /// An unqualified column reference.
    ///
    /// The reference's alias defaults to the column name so ORDER BY and
    /// GROUP BY references to selection aliases can be substituted.
    pub fn column(col_name: impl Into<String>) -> Self {
        let col_name = col_name.into();
        let mut expr = Self::new(ExprKind::Column(ColumnExpr::new(col_name.clone())));
        expr.alias = Some(col_name);
        expr
    }

    pub fn qualified_column(tab_name: impl Into<String>, col_name: impl Into<String>) -> Self {
        Self::new(ExprKind::Column(ColumnExpr::with_table(tab_name, col_name)))
    }

    pub fn star() -> Self {
        Self::new(ExprKind::Star(StarExpr { table: None }))
    }

    pub fn qualified_star(table: impl Into<String>) -> Self {
        Self::new(ExprKind::Star(StarExpr {
            table: Some(table.into()),
        }))
    }

    pub fn unary(op: UnaryOperator, expr: Expr) -> Self {
        Self::new(ExprKind::Unary(UnaryExpr {
            op,
            expr: Box::new(expr),
        }))
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Self::new(ExprKind::Binary(BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Conjunction(ConjunctionExpr {
            op: ConjunctionOperator::And,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Conjunction(ConjunctionExpr {
            op: ConjunctionOperator::Or,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    /// ANDs all expressions, only returning None if the iterator contains no
    /// expressions.
    pub fn and_all(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
        let mut exprs = exprs.into_iter();
        let left = exprs.next()?;
        Some(exprs.fold(left, Expr::and))
    }

    /// Desugar `a BETWEEN b AND c` into `(a >= b) AND (a <= c)`.
    pub fn between(expr: Expr, low: Expr, high: Expr) -> Self {
        Self::and(
            Self::binary(expr.clone(), BinaryOperator::GtEq, low),
            Self::binary(expr, BinaryOperator::LtEq, high),
        )
    }

    pub fn cast(expr: Expr, to: DataType) -> Self {
        Self::new(ExprKind::Cast(CastExpr {
            expr: Box::new(expr),
            to,
        }))
    }

    pub fn case(case: CaseExpr) -> Self {
        Self::new(ExprKind::Case(case))
    }

    /// Build a function call, classifying known aggregate names.
    pub fn function_call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        let name = name.into();
        match AggregateFunction::from_name(&name) {
            Some(func) => Self::aggregate(func, args, false),
            None => Self::new(ExprKind::Function(FunctionExpr { name, args })),
        }
    }

    pub fn aggregate(func: AggregateFunction, args: Vec<Expr>, distinct: bool) -> Self {
        Self::new(ExprKind::Aggregate(AggregateExpr {
            func,
            args,
            distinct,
        }))
    }

    pub fn in_list(expr: Expr, list: Vec<Expr>, negated: bool) -> Self {
        Self::new(ExprKind::InList(InListExpr {
            expr: Box::new(expr),
            list,
            negated,
        }))
    }

    pub fn scalar_subquery(query: SelectStmt) -> Self {
        Self::new(ExprKind::Subquery(SubqueryExpr::new(
            SubqueryKind::Scalar,
            query,
        )))
    }

    pub fn exists(query: SelectStmt, negated: bool) -> Self {
        Self::new(ExprKind::Subquery(SubqueryExpr::new(
            SubqueryKind::Exists { negated },
            query,
        )))
    }

    pub fn in_subquery(expr: Expr, query: SelectStmt, negated: bool) -> Self {
        Self::new(ExprKind::Subquery(SubqueryExpr::new(
            SubqueryKind::In {
                expr: Box::new(expr),
                negated,
            },
            query,
        )))
    }

    pub fn expr_ref(expr: Expr, ordinal: usize) -> Self {
        Self::new(ExprKind::ExprRef(ExprRefExpr {
            expr: Box::new(expr),
            ordinal,
        }))
    }

    /// Set the `AS` name of this expression. The alias doubles as the output
    /// name.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        self.output_name = Some(alias.clone());
        self.alias = Some(alias);
        self
    }

    /// Invoke `f` on every direct child of this expression.
    ///
    /// Subquery bodies are not children; only the IN-subquery's left-hand
    /// side is.
    pub fn for_each_child<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Column(_) | ExprKind::Star(_) => (),
            ExprKind::Unary(u) => f(&u.expr),
            ExprKind::Binary(b) => {
                f(&b.left);
                f(&b.right);
            }
            ExprKind::Conjunction(c) => {
                f(&c.left);
                f(&c.right);
            }
            ExprKind::Cast(c) => f(&c.expr),
            ExprKind::Case(c) => {
                if let Some(eval) = &c.eval {
                    f(eval);
                }
                for case in &c.cases {
                    f(&case.when);
                    f(&case.then);
                }
                if let Some(else_expr) = &c.else_expr {
                    f(else_expr);
                }
            }
            ExprKind::Function(func) => {
                for arg in &func.args {
                    f(arg);
                }
            }
            ExprKind::Aggregate(agg) => {
                for arg in &agg.args {
                    f(arg);
                }
            }
            ExprKind::Subquery(sub) => {
                if let SubqueryKind::In { expr, .. } = &sub.kind {
                    f(expr);
                }
            }
            ExprKind::InList(in_list) => {
                f(&in_list.expr);
                for item in &in_list.list {
                    f(item);
                }
            }
            ExprKind::ExprRef(expr_ref) => f(&expr_ref.expr),
        }
    }

    pub fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut Expr)) {
        match &mut self.kind {
            ExprKind::Literal(_) | ExprKind::Column(_) | ExprKind::Star(_) => (),
            ExprKind::Unary(u) => f(&mut u.expr),
            ExprKind::Binary(b) => {
                f(&mut b.left);
                f(&mut b.right);
            }
            ExprKind::Conjunction(c) => {
                f(&mut c.left);
                f(&mut c.right);
            }
            ExprKind::Cast(c) => f(&mut c.expr),
            ExprKind::Case(c) => {
                if let Some(eval) = &mut c.eval {
                    f(eval);
                }
                for case in &mut c.cases {
                    f(&mut case.when);
                    f(&mut case.then);
                }
                if let Some(else_expr) = &mut c.else_expr {
                    f(else_expr);
                }
            }
            ExprKind::Function(func) => {
                for arg in &mut func.args {
                    f(arg);
                }
            }
            ExprKind::Aggregate(agg) => {
                for arg in &mut agg.args {
                    f(arg);
                }
            }
            ExprKind::Subquery(sub) => {
                if let SubqueryKind::In { expr, .. } = &mut sub.kind {
                    f(expr);
                }
            }
            ExprKind::InList(in_list) => {
                f(&mut in_list.expr);
                for item in &mut in_list.list {
                    f(item);
                }
            }
            ExprKind::ExprRef(expr_ref) => f(&mut expr_ref.expr),
        }
    }

    /// Fallible variant of [`Self::for_each_child_mut`], stopping at the
    /// first error.
    pub fn try_for_each_child_mut(
        &mut self,
        f: &mut dyn FnMut(&mut Expr) -> quarry_error::Result<()>,
    ) -> quarry_error::Result<()> {
        let mut result = Ok(());
        self.for_each_child_mut(&mut |child| {
            if result.is_ok() {
                result = f(child);
            }
        });
        result
    }

    /// Pre-order traversal invoking `f` on every sub-expression including
    /// `self`.
    pub fn visit_each<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        f(self);
        self.for_each_child(&mut |child| child.visit_each(f));
    }

    pub fn has_subquery(&self) -> bool {
        let mut found = false;
        self.visit_each(&mut |e| {
            if matches!(e.kind, ExprKind::Subquery(_)) {
                found = true;
            }
        });
        found
    }

    pub fn has_agg_func(&self) -> bool {
        let mut found = false;
        self.visit_each(&mut |e| {
            if matches!(e.kind, ExprKind::Aggregate(_)) {
                found = true;
            }
        });
        found
    }

    /// Return a copy of this tree with every sub-expression whose alias
    /// equals `alias` replaced by a copy of `replacement`.
    ///
    /// The replacement is not descended into, so substitution is idempotent
    /// even when the replacement itself carries the alias.
    pub fn search_replace(&self, alias: &str, replacement: &Expr) -> Expr {
        if self.alias.as_deref() == Some(alias) {
            return replacement.clone();
        }
        let mut out = self.clone();
        out.replace_children(alias, replacement);
        out
    }

    fn replace_children(&mut self, alias: &str, replacement: &Expr) {
        self.for_each_child_mut(&mut |child| {
            if child.alias.as_deref() == Some(alias) {
                *child = replacement.clone();
            } else {
                child.replace_children(alias, replacement);
            }
        });
    }

    /// The name this expression exports when used as a SELECT item and no
    /// explicit alias was given.
    pub fn default_output_name(&self) -> String {
        match &self.kind {
            ExprKind::Column(col) => col.col_name.clone(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(l) => write!(f, "{l}"),
            ExprKind::Column(c) => write!(f, "{c}"),
            ExprKind::Unary(u) => write!(f, "{}{}", u.op, u.expr),
            ExprKind::Binary(b) => write!(f, "{} {} {}", b.left, b.op, b.right),
            ExprKind::Conjunction(c) => write!(f, "{} {} {}", c.left, c.op, c.right),
            ExprKind::Cast(c) => write!(f, "CAST({} AS {})", c.expr, c.to),
            ExprKind::Case(c) => write!(f, "{c}"),
            ExprKind::Function(func) => {
                write!(f, "{}(", func.name)?;
                for (idx, arg) in func.args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            ExprKind::Aggregate(agg) => write!(f, "{agg}"),
            ExprKind::Subquery(sub) => write!(f, "{sub}"),
            ExprKind::InList(in_list) => {
                write!(f, "{}", in_list.expr)?;
                if in_list.negated {
                    write!(f, " NOT")?;
                }
                write!(f, " IN (")?;
                for (idx, item) in in_list.list.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            ExprKind::Star(star) => match &star.table {
                Some(table) => write!(f, "{table}.*"),
                None => write!(f, "*"),
            },
            ExprKind::ExprRef(expr_ref) => write!(f, "{}", expr_ref.expr),
        }
    }
}
