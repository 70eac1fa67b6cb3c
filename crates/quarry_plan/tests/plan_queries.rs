use quarry_plan::binder::bind_context::BindContext;
use quarry_plan::binder::table_ref::{BaseTableRef, QueryTableRef, TableRef};
use quarry_plan::database::catalog::{MemoryCatalog, TableDef};
use quarry_plan::database::datatype::DataType;
use quarry_plan::expr::aggregate_expr::AggregateFunction;
use quarry_plan::expr::scalar::BinaryOperator;
use quarry_plan::expr::{Expr, ExprKind};
use quarry_plan::explain::formatter::format_plan;
use quarry_plan::logical::operator::LogicalOperator;
use quarry_plan::statement::{OrderByExpr, SelectStmt};
use similar_asserts::assert_eq;

fn tpch_catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog
        .create_table(
            TableDef::new("customer")
                .with_column("c_custkey", DataType::Int)
                .with_column("c_name", DataType::VarChar(25)),
        )
        .unwrap();
    catalog
        .create_table(
            TableDef::new("orders")
                .with_column("o_orderkey", DataType::Int)
                .with_column("o_custkey", DataType::Int)
                .with_column("o_orderdate", DataType::Date)
                .with_column("o_totalprice", DataType::Double),
        )
        .unwrap();
    catalog
        .create_table(
            TableDef::new("lineitem")
                .with_column("l_orderkey", DataType::Int)
                .with_column("l_quantity", DataType::Double),
        )
        .unwrap();
    catalog
}

/// Walk every expression reachable from a bound statement and check that
/// binding completed: everything is bound, every column reference resolved
/// to a table occurrence, and no stars survive in the selection.
fn assert_fully_bound(stmt: &SelectStmt) {
    fn check_expr(expr: &Expr) {
        expr.visit_each(&mut |e| {
            assert!(e.bound, "unbound expression: {e}");
            match &e.kind {
                ExprKind::Column(col) => {
                    assert!(col.table.is_some(), "column without table: {col}")
                }
                ExprKind::Subquery(sub) => check_stmt(&sub.query.borrow()),
                _ => (),
            }
        });
    }
    fn check_stmt(stmt: &SelectStmt) {
        assert!(stmt.bound);
        for e in &stmt.selection {
            assert!(!matches!(e.kind, ExprKind::Star(_)), "star in selection");
            check_expr(e);
        }
        if let Some(e) = &stmt.where_expr {
            check_expr(e);
        }
        for e in &stmt.group_by {
            check_expr(e);
        }
        if let Some(e) = &stmt.having {
            check_expr(e);
        }
        for o in &stmt.order_by {
            check_expr(&o.expr);
        }
    }
    check_stmt(stmt);
}

#[test]
fn tpch_q18_style_plan_shape() {
    // select c_name, c_custkey, o_orderkey, o_orderdate, o_totalprice,
    //        sum(l_quantity)
    // from customer, orders, lineitem
    // where o_orderkey in (select l_orderkey from lineitem
    //                      group by l_orderkey having sum(l_quantity) > 300)
    //   and c_custkey = o_custkey and o_orderkey = l_orderkey
    // group by c_name, c_custkey, o_orderkey, o_orderdate, o_totalprice
    // order by o_totalprice desc, o_orderdate
    // limit 100
    let mut inner = SelectStmt::new();
    inner.selection = vec![Expr::column("l_orderkey")];
    inner.from = vec![TableRef::Base(BaseTableRef::new("lineitem"))];
    inner.group_by = vec![Expr::column("l_orderkey")];
    inner.having = Some(Expr::binary(
        Expr::aggregate(AggregateFunction::Sum, vec![Expr::column("l_quantity")], false),
        BinaryOperator::Gt,
        Expr::integer(300),
    ));

    let mut stmt = SelectStmt::new();
    stmt.selection = vec![
        Expr::column("c_name"),
        Expr::column("c_custkey"),
        Expr::column("o_orderkey"),
        Expr::column("o_orderdate"),
        Expr::column("o_totalprice"),
        Expr::aggregate(AggregateFunction::Sum, vec![Expr::column("l_quantity")], false),
    ];
    stmt.from = vec![
        TableRef::Base(BaseTableRef::new("customer")),
        TableRef::Base(BaseTableRef::new("orders")),
        TableRef::Base(BaseTableRef::new("lineitem")),
    ];
    stmt.where_expr = Some(Expr::and(
        Expr::and(
            Expr::in_subquery(Expr::column("o_orderkey"), inner, false),
            Expr::binary(
                Expr::column("c_custkey"),
                BinaryOperator::Eq,
                Expr::column("o_custkey"),
            ),
        ),
        Expr::binary(
            Expr::column("o_orderkey"),
            BinaryOperator::Eq,
            Expr::column("l_orderkey"),
        ),
    ));
    stmt.group_by = vec![
        Expr::column("c_name"),
        Expr::column("c_custkey"),
        Expr::column("o_orderkey"),
        Expr::column("o_orderdate"),
        Expr::column("o_totalprice"),
    ];
    stmt.order_by = vec![
        OrderByExpr::desc(Expr::column("o_totalprice")),
        OrderByExpr::asc(Expr::column("o_orderdate")),
    ];
    stmt.limit = Some(Expr::integer(100));

    let catalog = tpch_catalog();
    let mut ctx = BindContext::new();
    stmt.bind(&mut ctx, &catalog, None).unwrap();
    assert!(stmt.has_agg);
    assert_fully_bound(&stmt);

    let plan = stmt.create_plan(&mut ctx).unwrap();

    let expected = "\
Limit (limit: 100)
  Order (expressions: [o_totalprice DESC, o_orderdate ASC])
    Aggregate (group: [c_name, c_custkey, o_orderkey, o_orderdate, o_totalprice], aggs: [sum(l_quantity)])
      Filter (predicate: o_orderkey IN (<subquery>) AND c_custkey = o_custkey AND o_orderkey = l_orderkey)
        Join (type: CROSS)
          Join (type: CROSS)
            Scan (table: customer)
            Scan (table: orders)
          Scan (table: lineitem)
";
    assert_eq!(expected, format_plan(&plan).unwrap());

    // The IN subquery was discovered and fully planned.
    assert_eq!(1, stmt.subqueries.len());
    let inner = stmt.subqueries[0].borrow();
    let inner_plan = inner.logic_plan.as_ref().expect("inner plan must be set");
    let expected_inner = "\
Aggregate (group: [l_orderkey], aggs: [sum(l_quantity)], having: sum(l_quantity) > 300)
  Scan (table: lineitem)
";
    assert_eq!(expected_inner, format_plan(inner_plan).unwrap());
}

#[test]
fn from_subquery_wraps_inner_plan() {
    // select x from (select c_custkey as x from customer) sub
    let mut inner = SelectStmt::new();
    inner.selection = vec![Expr::column("c_custkey").with_alias("x")];
    inner.from = vec![TableRef::Base(BaseTableRef::new("customer"))];

    let mut stmt = SelectStmt::new();
    stmt.selection = vec![Expr::column("x")];
    stmt.from = vec![TableRef::Query(QueryTableRef::from_query("sub", inner))];

    let catalog = tpch_catalog();
    let mut ctx = BindContext::new();
    stmt.bind(&mut ctx, &catalog, None).unwrap();
    assert_fully_bound(&stmt);

    let plan = stmt.create_plan(&mut ctx).unwrap();
    let expected = "\
FromQuery (alias: sub)
  Scan (table: customer)
";
    assert_eq!(expected, format_plan(&plan).unwrap());

    // Recorded both as a discovered subquery and a FROM query.
    assert_eq!(1, stmt.subqueries.len());
    assert_eq!(1, stmt.from_queries.len());
    assert!(stmt.from_queries[0].0.borrow().logic_plan.is_some());
}

#[test]
fn cte_reference_plans_body() {
    // with big as (select o_orderkey from orders) select o_orderkey from big
    let mut body = SelectStmt::new();
    body.selection = vec![Expr::column("o_orderkey")];
    body.from = vec![TableRef::Base(BaseTableRef::new("orders"))];

    let mut stmt = SelectStmt::new();
    stmt.ctes = vec![quarry_plan::statement::CommonTableExpr::new("big", body)];
    stmt.selection = vec![Expr::column("o_orderkey")];
    stmt.from = vec![TableRef::Base(BaseTableRef::new("big"))];

    let catalog = tpch_catalog();
    let mut ctx = BindContext::new();
    stmt.bind(&mut ctx, &catalog, None).unwrap();
    assert_fully_bound(&stmt);

    let plan = stmt.create_plan(&mut ctx).unwrap();
    let expected = "\
FromQuery (alias: big)
  Scan (table: orders)
";
    assert_eq!(expected, format_plan(&plan).unwrap());
}

#[test]
fn correlated_exists_projects_outer_value() {
    // select c_name from customer c
    // where exists (select o_orderkey from orders where o_custkey = c.c_custkey)
    let mut inner = SelectStmt::new();
    inner.selection = vec![Expr::column("o_orderkey")];
    inner.from = vec![TableRef::Base(BaseTableRef::new("orders"))];
    inner.where_expr = Some(Expr::binary(
        Expr::column("o_custkey"),
        BinaryOperator::Eq,
        Expr::qualified_column("c", "c_custkey"),
    ));

    let mut stmt = SelectStmt::new();
    stmt.selection = vec![Expr::column("c_name")];
    stmt.from = vec![TableRef::Base(BaseTableRef::aliased("customer", "c"))];
    stmt.where_expr = Some(Expr::exists(inner, false));

    let catalog = tpch_catalog();
    let mut ctx = BindContext::new();
    stmt.bind(&mut ctx, &catalog, None).unwrap();
    assert_fully_bound(&stmt);

    // Subquery discovery is post-hoc: nothing recorded until planning.
    assert!(stmt.subqueries.is_empty());

    stmt.create_plan(&mut ctx).unwrap();
    assert_eq!(1, stmt.subqueries.len());
    assert!(stmt.subqueries[0].borrow().logic_plan.is_some());

    // The correlated value is projected to the boundary as an invisible
    // output column.
    assert_eq!(2, stmt.selection.len());
    match &stmt.selection[1].kind {
        ExprKind::Column(col) => {
            assert_eq!("c_custkey", col.col_name);
            assert!(!col.is_visible);
            assert!(!col.is_parameter);
        }
        other => panic!("unexpected projected expr: {other:?}"),
    }

    // And inside the subquery the reference stayed a parameter.
    let inner = stmt.subqueries[0].borrow();
    let mut saw_parameter = false;
    inner
        .where_expr
        .as_ref()
        .unwrap()
        .visit_each(&mut |e| {
            if let ExprKind::Column(col) = &e.kind {
                if col.col_name == "c_custkey" {
                    assert!(col.is_parameter);
                    saw_parameter = true;
                }
            }
        });
    assert!(saw_parameter);
}

#[test]
fn scalar_subquery_in_selection_gets_plan() {
    // select c_name, (select max(o_totalprice) from orders) from customer
    let mut inner = SelectStmt::new();
    inner.selection = vec![Expr::aggregate(
        AggregateFunction::Max,
        vec![Expr::column("o_totalprice")],
        false,
    )];
    inner.from = vec![TableRef::Base(BaseTableRef::new("orders"))];

    let mut stmt = SelectStmt::new();
    stmt.selection = vec![Expr::column("c_name"), Expr::scalar_subquery(inner)];
    stmt.from = vec![TableRef::Base(BaseTableRef::new("customer"))];

    let catalog = tpch_catalog();
    let mut ctx = BindContext::new();
    stmt.bind(&mut ctx, &catalog, None).unwrap();
    let plan = stmt.create_plan(&mut ctx).unwrap();

    assert!(matches!(plan, LogicalOperator::ScanTable(_)));
    assert_eq!(1, stmt.subqueries.len());

    let inner = stmt.subqueries[0].borrow();
    let inner_plan = inner.logic_plan.as_ref().unwrap();
    let expected = "\
Aggregate (group: [], aggs: [max(o_totalprice)])
  Scan (table: orders)
";
    assert_eq!(expected, format_plan(inner_plan).unwrap());
}
