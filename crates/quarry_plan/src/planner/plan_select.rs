use crate::binder::bind_context::BindContext;
use crate::binder::table_ref::TableRef;
use crate::expr::{Expr, ExprKind};
use crate::logical::logical_aggregate::LogicalAggregate;
use crate::logical::logical_filter::LogicalFilter;
use crate::logical::logical_from_query::LogicalFromQuery;
use crate::logical::logical_join::{JoinOp, LogicalJoin};
use crate::logical::logical_limit::LogicalLimit;
use crate::logical::logical_order::LogicalOrder;
use crate::logical::logical_result::LogicalResult;
use crate::logical::logical_scan::{LogicalScanFile, LogicalScanTable};
use crate::logical::operator::LogicalOperator;
use crate::statement::{SelectRef, SelectStmt};
use quarry_error::{not_implemented, OptionExt, QuarryError, Result};
use std::rc::Rc;
use tracing::trace;

impl SelectStmt {
    /// Build the logical tree for this bound statement, applying the SQL
    /// evaluation order: FROM, WHERE, GROUP, HAVING, ORDER, SELECT.
    ///
    /// The finished tree is recorded in `logic_plan`; planning again returns
    /// the recorded tree.
    pub fn create_plan(&mut self, ctx: &mut BindContext) -> Result<LogicalOperator> {
        if !self.bound {
            return Err(QuarryError::new("statement must be bound before planning"));
        }
        if let Some(plan) = &self.logic_plan {
            return Ok((**plan).clone());
        }
        if !self.set_queries.is_empty() {
            not_implemented!("set operation planning");
        }
        trace!("creating logical plan");

        // FROM. Two or more items combine under cross joins, left-deep with
        // the first item at the leftmost leaf.
        let mut from = std::mem::take(&mut self.from);
        let mut root: Option<LogicalOperator> = None;
        for item in &mut from {
            let sub = self.transform_one_from(item, ctx)?;
            root = Some(match root {
                Some(left) => LogicalOperator::Join(LogicalJoin {
                    op: JoinOp::Cross,
                    left: Box::new(left),
                    right: Box::new(sub),
                }),
                None => sub,
            });
        }
        self.from = from;

        let mut root = match root {
            Some(root) => root,
            None => LogicalOperator::Result(LogicalResult {
                exprs: self.selection.clone(),
            }),
        };

        if let Some(where_expr) = self.where_expr.clone() {
            plan_expr_subqueries(&where_expr, ctx, &mut self.subqueries)?;
            root = LogicalOperator::Filter(LogicalFilter {
                predicate: where_expr,
                input: Box::new(root),
            });
        }

        if self.has_agg || !self.group_by.is_empty() {
            if let Some(having) = self.having.clone() {
                plan_expr_subqueries(&having, ctx, &mut self.subqueries)?;
            }
            root = LogicalOperator::Aggregate(LogicalAggregate {
                group_by: self.group_by.clone(),
                aggregates: self.get_aggregations(),
                having: self.having.clone(),
                input: Box::new(root),
            });
        }

        if !self.order_by.is_empty() {
            root = LogicalOperator::Order(LogicalOrder {
                exprs: self.order_by.clone(),
                input: Box::new(root),
            });
        }

        if let Some(limit) = self.limit.clone() {
            root = LogicalOperator::Limit(LogicalLimit {
                limit,
                input: Box::new(root),
            });
        }

        let selection = self.selection.clone();
        for expr in &selection {
            plan_expr_subqueries(expr, ctx, &mut self.subqueries)?;
        }

        self.logic_plan = Some(Box::new(root.clone()));
        Ok(root)
    }

    /// The expressions the aggregation node computes: every top-level
    /// selection item containing an aggregate, whole, in first-occurrence
    /// order with structural duplicates removed, plus any aggregate HAVING
    /// references that the selection doesn't already compute.
    pub fn get_aggregations(&self) -> Vec<Expr> {
        let mut out: Vec<Expr> = Vec::new();
        for item in &self.selection {
            if item.has_agg_func() {
                push_unique(&mut out, item);
            }
        }
        if let Some(having) = &self.having {
            having.visit_each(&mut |e| {
                if matches!(e.kind, ExprKind::Aggregate(_)) {
                    push_unique(&mut out, e);
                }
            });
        }
        out
    }

    fn transform_one_from(
        &mut self,
        item: &mut TableRef,
        ctx: &mut BindContext,
    ) -> Result<LogicalOperator> {
        Ok(match item {
            TableRef::Base(base) => {
                let table = base.table_id.required("unbound base table ref")?;
                LogicalOperator::ScanTable(LogicalScanTable {
                    table,
                    name: base.name.clone(),
                    alias: base.alias().to_string(),
                })
            }
            TableRef::External(external) => {
                let table = external.base.table_id.required("unbound external ref")?;
                LogicalOperator::ScanFile(LogicalScanFile {
                    table,
                    name: external.base.name.clone(),
                    path: external.path.clone(),
                })
            }
            TableRef::Query(query) => {
                let table = query.table_id.required("unbound query ref")?;
                let inner_plan = query.query.borrow_mut().create_plan(ctx)?;
                record_subquery(&mut self.subqueries, &query.query);
                self.from_queries.push((query.query.clone(), table));
                LogicalOperator::FromQuery(LogicalFromQuery {
                    table,
                    alias: query.alias.clone(),
                    input: Box::new(inner_plan),
                })
            }
            TableRef::Join(join) => {
                // Fold the flat child list into a left-deep chain, then AND
                // the constraints (in list order) into one filter on top.
                let mut ops = join.ops.iter();
                let mut root: Option<LogicalOperator> = None;
                for child in &mut join.tables {
                    let sub = self.transform_one_from(child, ctx)?;
                    root = Some(match root {
                        Some(left) => {
                            let token = ops.next().required("missing join operator")?;
                            LogicalOperator::Join(LogicalJoin {
                                op: JoinOp::from_token(token)?,
                                left: Box::new(left),
                                right: Box::new(sub),
                            })
                        }
                        None => sub,
                    });
                }
                let joined = root.required("join with no children")?;
                let predicate = Expr::and_all(join.constraints.iter().cloned())
                    .required("join with no constraints")?;
                LogicalOperator::Filter(LogicalFilter {
                    predicate,
                    input: Box::new(joined),
                })
            }
        })
    }
}

/// Create plans for every subquery embedded in `expr`, recording discovered
/// statements.
///
/// Subquery discovery is deliberately post-hoc: inner plans exist only once
/// the enclosing plan is being built, never at bind time.
fn plan_expr_subqueries(
    expr: &Expr,
    ctx: &mut BindContext,
    discovered: &mut Vec<SelectRef>,
) -> Result<()> {
    if let ExprKind::Subquery(sub) = &expr.kind {
        {
            let mut inner = sub.query.borrow_mut();
            if inner.logic_plan.is_none() {
                inner.create_plan(ctx)?;
            }
        }
        record_subquery(discovered, &sub.query);
    }

    let mut result = Ok(());
    expr.for_each_child(&mut |child| {
        if result.is_ok() {
            result = plan_expr_subqueries(child, ctx, discovered);
        }
    });
    result
}

/// Push `e` unless an expression of the same shape (naming metadata aside)
/// is already present.
fn push_unique(out: &mut Vec<Expr>, e: &Expr) {
    if !out.iter().any(|x| x.kind == e.kind) {
        out.push(e.clone());
    }
}

fn record_subquery(discovered: &mut Vec<SelectRef>, query: &SelectRef) {
    if !discovered.iter().any(|q| Rc::ptr_eq(q, query)) {
        discovered.push(query.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::table_ref::{BaseTableRef, JoinTableRef};
    use crate::database::catalog::{MemoryCatalog, TableDef};
    use crate::database::datatype::DataType;
    use crate::expr::aggregate_expr::AggregateFunction;
    use crate::expr::scalar::BinaryOperator;
    use pretty_assertions::assert_eq;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        for name in ["a", "b", "c"] {
            let mut table = TableDef::new(name);
            for idx in 1..=4 {
                table = table.with_column(format!("{name}{idx}"), DataType::Int);
            }
            catalog.create_table(table).unwrap();
        }
        catalog
    }

    fn bind_and_plan(stmt: &mut SelectStmt) -> LogicalOperator {
        let mut ctx = BindContext::new();
        stmt.bind(&mut ctx, &catalog(), None).unwrap();
        stmt.create_plan(&mut ctx).unwrap()
    }

    #[test]
    fn single_table_plan_is_scan() {
        let mut stmt = SelectStmt::new();
        stmt.selection = vec![Expr::qualified_column("b", "a1")];
        stmt.from = vec![TableRef::Base(BaseTableRef::aliased("a", "b"))];

        let plan = bind_and_plan(&mut stmt);
        match plan {
            LogicalOperator::ScanTable(scan) => {
                assert_eq!("a", scan.name);
                assert_eq!("b", scan.alias);
            }
            other => panic!("unexpected plan: {other:?}"),
        }
        assert!(stmt.logic_plan.is_some());
    }

    #[test]
    fn join_list_folds_left_deep_with_one_filter() {
        // from a join b on a1 = b1 join c on a2 = c2
        let join = JoinTableRef::new(
            vec![
                TableRef::Base(BaseTableRef::new("a")),
                TableRef::Base(BaseTableRef::new("b")),
                TableRef::Base(BaseTableRef::new("c")),
            ],
            vec!["inner".to_string(), "inner".to_string()],
            vec![
                Expr::binary(Expr::column("a1"), BinaryOperator::Eq, Expr::column("b1")),
                Expr::binary(Expr::column("a2"), BinaryOperator::Eq, Expr::column("c2")),
            ],
        )
        .unwrap();

        let mut stmt = SelectStmt::new();
        stmt.selection = vec![Expr::column("a1")];
        stmt.from = vec![TableRef::Join(join)];

        let plan = bind_and_plan(&mut stmt);

        // Filter((a1 = b1) AND (a2 = c2), Join(Join(a, b), c))
        let filter = match plan {
            LogicalOperator::Filter(filter) => filter,
            other => panic!("expected filter root, got {other:?}"),
        };
        assert_eq!("a1 = b1 AND a2 = c2", filter.predicate.to_string());

        let outer = match *filter.input {
            LogicalOperator::Join(join) => join,
            other => panic!("expected join, got {other:?}"),
        };
        let inner = match *outer.left {
            LogicalOperator::Join(join) => join,
            other => panic!("expected nested join, got {other:?}"),
        };
        assert!(
            matches!(&*inner.left, LogicalOperator::ScanTable(scan) if scan.name == "a"),
            "first child must be the leftmost leaf"
        );
        assert!(matches!(&*inner.right, LogicalOperator::ScanTable(scan) if scan.name == "b"));
        assert!(matches!(&*outer.right, LogicalOperator::ScanTable(scan) if scan.name == "c"));
    }

    #[test]
    fn multi_from_cross_joins() {
        let mut stmt = SelectStmt::new();
        stmt.selection = vec![Expr::column("a1")];
        stmt.from = vec![
            TableRef::Base(BaseTableRef::new("a")),
            TableRef::Base(BaseTableRef::new("b")),
            TableRef::Base(BaseTableRef::new("c")),
        ];

        let plan = bind_and_plan(&mut stmt);
        let outer = match plan {
            LogicalOperator::Join(join) => {
                assert_eq!(JoinOp::Cross, join.op);
                join
            }
            other => panic!("expected cross join, got {other:?}"),
        };
        assert!(matches!(&*outer.left, LogicalOperator::Join(_)));
        assert!(matches!(&*outer.right, LogicalOperator::ScanTable(scan) if scan.name == "c"));
    }

    #[test]
    fn from_less_select_is_result() {
        let mut stmt = SelectStmt::new();
        stmt.selection = vec![Expr::integer(1)];

        let plan = bind_and_plan(&mut stmt);
        assert!(matches!(plan, LogicalOperator::Result(_)));
    }

    #[test]
    fn aggregations_dedup_first_occurrence() {
        // select a1, min(a1 / 2), 2 + min(a1) + max(a1), min(a1 / 2) from a group by a1
        let min_half = Expr::aggregate(
            AggregateFunction::Min,
            vec![Expr::binary(
                Expr::column("a1"),
                BinaryOperator::Divide,
                Expr::integer(2),
            )],
            false,
        );
        let arith = Expr::binary(
            Expr::binary(
                Expr::integer(2),
                BinaryOperator::Plus,
                Expr::aggregate(AggregateFunction::Min, vec![Expr::column("a1")], false),
            ),
            BinaryOperator::Plus,
            Expr::aggregate(AggregateFunction::Max, vec![Expr::column("a1")], false),
        );

        let mut stmt = SelectStmt::new();
        stmt.selection = vec![
            Expr::column("a1"),
            min_half.clone(),
            arith.clone(),
            min_half.clone(),
        ];
        stmt.from = vec![TableRef::Base(BaseTableRef::new("a"))];
        stmt.group_by = vec![Expr::column("a1")];

        let plan = bind_and_plan(&mut stmt);
        assert!(stmt.has_agg);

        let agg = match plan {
            LogicalOperator::Aggregate(agg) => agg,
            other => panic!("expected aggregate, got {other:?}"),
        };
        assert_eq!(2, agg.aggregates.len());
        assert_eq!("min(a1 / 2)", agg.aggregates[0].to_string());
        assert_eq!("2 + min(a1) + max(a1)", agg.aggregates[1].to_string());
    }

    #[test]
    fn order_and_limit_wrap_root() {
        let mut stmt = SelectStmt::new();
        stmt.selection = vec![Expr::column("a1")];
        stmt.from = vec![TableRef::Base(BaseTableRef::new("a"))];
        stmt.order_by = vec![crate::statement::OrderByExpr::desc(Expr::column("a1"))];
        stmt.limit = Some(Expr::integer(10));

        let plan = bind_and_plan(&mut stmt);
        let limit = match plan {
            LogicalOperator::Limit(limit) => limit,
            other => panic!("expected limit root, got {other:?}"),
        };
        assert!(matches!(*limit.input, LogicalOperator::Order(_)));
    }

    #[test]
    fn external_table_plans_file_scan() {
        use crate::binder::table_ref::ExternalTableRef;

        let mut stmt = SelectStmt::new();
        stmt.selection = vec![Expr::column("a1")];
        stmt.from = vec![TableRef::External(ExternalTableRef {
            path: "data/a.tbl".to_string(),
            base: BaseTableRef::new("a"),
        })];

        let plan = bind_and_plan(&mut stmt);
        match plan {
            LogicalOperator::ScanFile(scan) => {
                assert_eq!("a", scan.name);
                assert_eq!("data/a.tbl", scan.path);
            }
            other => panic!("expected file scan, got {other:?}"),
        }
    }

    #[test]
    fn set_queries_are_not_planned() {
        let mut member = SelectStmt::new();
        member.selection = vec![Expr::column("b1")];
        member.from = vec![TableRef::Base(BaseTableRef::new("b"))];

        let mut stmt = SelectStmt::new();
        stmt.selection = vec![Expr::column("a1")];
        stmt.from = vec![TableRef::Base(BaseTableRef::new("a"))];
        stmt.set_queries = vec![member.into_shared()];

        let mut ctx = BindContext::new();
        stmt.bind(&mut ctx, &catalog(), None).unwrap();
        assert!(stmt.set_queries[0].borrow().bound);

        let err = stmt.create_plan(&mut ctx).unwrap_err();
        assert_eq!(quarry_error::ErrorKind::NotImplemented, err.kind);
    }

    #[test]
    fn planning_twice_returns_recorded_plan() {
        let mut stmt = SelectStmt::new();
        stmt.selection = vec![Expr::column("a1")];
        stmt.from = vec![TableRef::Base(BaseTableRef::new("a"))];

        let mut ctx = BindContext::new();
        stmt.bind(&mut ctx, &catalog(), None).unwrap();
        let first = stmt.create_plan(&mut ctx).unwrap();
        let second = stmt.create_plan(&mut ctx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unbound_statement_cannot_plan() {
        let mut stmt = SelectStmt::new();
        let mut ctx = BindContext::new();
        assert!(stmt.create_plan(&mut ctx).is_err());
    }
}
