use super::bind_context::{BindContext, CteEntry, ScopeId};
use super::bind_expr::bind_expr;
use super::table_ref::{QueryRefKind, QueryTableRef, TableRef};
use crate::database::catalog::Catalog;
use crate::expr::{Expr, ExprKind};
use crate::statement::SelectStmt;
use quarry_error::{OptionExt, QuarryError, Result};
use tracing::trace;

impl SelectStmt {
    /// Bind this statement, creating a fresh scope chained to `parent`.
    ///
    /// Clause order is significant: selection aliases are substituted into
    /// GROUP BY and ORDER BY first, FROM introduces tables (materializing
    /// CTEs before anything can reference them), the selection list is bound
    /// and `*` expanded, and only then are WHERE, GROUP BY, HAVING and ORDER
    /// BY bound against the completed scope.
    pub fn bind(
        &mut self,
        ctx: &mut BindContext,
        catalog: &dyn Catalog,
        parent: Option<ScopeId>,
    ) -> Result<ScopeId> {
        if self.bound {
            return self.scope.required("bound statement has no scope");
        }
        trace!("binding select statement");

        let scope = ctx.new_scope(parent);
        self.scope = Some(scope);

        self.replace_output_name_to_expr();

        // WITH clause. Each body binds against the scope being built so later
        // CTEs and the main body can reference earlier ones.
        let ctes = self.ctes.clone();
        for cte in &ctes {
            {
                let mut inner = cte.query.borrow_mut();
                if !inner.bound {
                    inner.bind(ctx, catalog, Some(scope))?;
                }
            }
            ctx.register_cte(
                scope,
                CteEntry {
                    name: cte.name.clone(),
                    col_names: cte.col_names.clone(),
                    query: cte.query.clone(),
                },
            )?;
            self.cte_from.push(TableRef::Query(QueryTableRef {
                kind: QueryRefKind::Cte,
                alias: cte.name.clone(),
                col_names: cte.col_names.clone(),
                query: cte.query.clone(),
                table_id: None,
            }));
        }

        let mut from = std::mem::take(&mut self.from);
        for item in &mut from {
            bind_from_item(item, ctx, scope, catalog)?;
        }
        self.from = from;

        let selection = std::mem::take(&mut self.selection);
        let mut bound_selection = Vec::with_capacity(selection.len());
        for mut item in selection {
            match &item.kind {
                ExprKind::Star(star) => {
                    let table_ids = match &star.table {
                        Some(tab) => {
                            let (id, _) = ctx.resolve_table(scope, tab)?.ok_or_else(|| {
                                QuarryError::semantic(format!("table {tab} not exists"))
                            })?;
                            vec![id]
                        }
                        None => ctx.scope_table_ids(scope)?,
                    };
                    for id in table_ids {
                        // Invisible entries only carry correlated values
                        // outward; `*` never surfaces them.
                        bound_selection.extend(
                            ctx.table(id)?
                                .columns
                                .iter()
                                .filter(|col| match &col.kind {
                                    ExprKind::Column(c) => c.is_visible,
                                    _ => true,
                                })
                                .cloned(),
                        );
                    }
                }
                _ => {
                    bind_expr(&mut item, ctx, scope, catalog)?;
                    if item.has_agg_func() {
                        self.has_agg = true;
                    }
                    if item.output_name.is_none() {
                        item.output_name = Some(item.default_output_name());
                    }
                    bound_selection.push(item);
                }
            }
        }
        self.selection = bound_selection;

        if let Some(where_expr) = &mut self.where_expr {
            bind_expr(where_expr, ctx, scope, catalog)?;
        }
        for group in &mut self.group_by {
            bind_expr(group, ctx, scope, catalog)?;
        }
        if let Some(having) = &mut self.having {
            bind_expr(having, ctx, scope, catalog)?;
        }
        for order in &mut self.order_by {
            bind_expr(&mut order.expr, ctx, scope, catalog)?;
        }
        if let Some(limit) = &mut self.limit {
            bind_expr(limit, ctx, scope, catalog)?;
        }

        // Set-operation members are full SELECTs bound under the same parent.
        for query in &self.set_queries {
            let mut inner = query.borrow_mut();
            if !inner.bound {
                inner.bind(ctx, catalog, parent)?;
            }
        }

        // Project values referenced by correlated subqueries to this
        // statement's output boundary. Must happen before an enclosing FROM
        // item snapshots our exports, so it is part of binding, not planning.
        for id in ctx.scope_table_ids(scope)? {
            ctx.add_outer_refs_to_output(id, &mut self.selection)?;
        }

        self.bound = true;
        Ok(scope)
    }

    /// Substitute selection aliases into GROUP BY and ORDER BY expressions,
    /// letting `ORDER BY alias1 + b` refer to `a1 * 5 AS alias1`.
    fn replace_output_name_to_expr(&mut self) {
        let aliased: Vec<(String, Expr)> = self
            .selection
            .iter()
            .filter_map(|s| s.alias.clone().map(|alias| (alias, s.clone())))
            .collect();

        for (alias, item) in &aliased {
            for group in &mut self.group_by {
                *group = group.search_replace(alias, item);
            }
            for order in &mut self.order_by {
                order.expr = order.expr.search_replace(alias, item);
            }
        }
    }
}

/// Bind one FROM item: substitute CTE references, register the item in the
/// scope, bind nested queries recursively and join constraints in place.
fn bind_from_item(
    item: &mut TableRef,
    ctx: &mut BindContext,
    scope: ScopeId,
    catalog: &dyn Catalog,
) -> Result<()> {
    substitute_cte(item, ctx, scope, catalog)?;

    match item {
        TableRef::Base(base) => {
            base.register(ctx, scope, catalog)?;
        }
        TableRef::External(external) => {
            external.register(ctx, scope, catalog)?;
        }
        TableRef::Query(query) => {
            {
                let mut inner = query.query.borrow_mut();
                if !inner.bound {
                    inner.bind(ctx, catalog, Some(scope))?;
                }
            }
            query.register(ctx, scope)?;
        }
        TableRef::Join(join) => {
            for child in &mut join.tables {
                bind_from_item(child, ctx, scope, catalog)?;
            }
            for constraint in &mut join.constraints {
                bind_expr(constraint, ctx, scope, catalog)?;
            }
        }
    }
    Ok(())
}

/// Replace a base table whose name isn't in the catalog with the CTE it
/// refers to, or fail.
fn substitute_cte(
    item: &mut TableRef,
    ctx: &BindContext,
    scope: ScopeId,
    catalog: &dyn Catalog,
) -> Result<()> {
    if let TableRef::Base(base) = item {
        if catalog.try_table(&base.name).is_some() {
            return Ok(());
        }
        match ctx.resolve_cte(scope, base.alias())? {
            Some(cte) => {
                *item = TableRef::Query(QueryTableRef {
                    kind: QueryRefKind::Cte,
                    alias: base.alias().to_string(),
                    col_names: cte.col_names,
                    query: cte.query,
                    table_id: None,
                });
            }
            None => {
                return Err(QuarryError::semantic(format!(
                    "table {} not exists",
                    base.name
                )))
            }
        }
    }
    Ok(())
}
