use super::bind_context::{BindContext, ScopeId};
use crate::database::catalog::Catalog;
use crate::expr::column_expr::ColumnExpr;
use crate::expr::{Expr, ExprKind};
use quarry_error::{QuarryError, Result};

impl Expr {
    /// Bind this expression in a scope, resolving column references and
    /// binding subquery bodies.
    pub fn bind(
        &mut self,
        ctx: &mut BindContext,
        scope: ScopeId,
        catalog: &dyn Catalog,
    ) -> Result<()> {
        bind_expr(self, ctx, scope, catalog)
    }
}

pub(crate) fn bind_expr(
    expr: &mut Expr,
    ctx: &mut BindContext,
    scope: ScopeId,
    catalog: &dyn Catalog,
) -> Result<()> {
    match &mut expr.kind {
        ExprKind::Column(col) => bind_column(col, ctx, scope)?,
        ExprKind::Subquery(sub) => {
            let query = sub.query.clone();
            let mut inner = query.borrow_mut();
            if !inner.bound {
                inner.bind(ctx, catalog, Some(scope))?;
            }
        }
        _ => (),
    }

    expr.try_for_each_child_mut(&mut |child| bind_expr(child, ctx, scope, catalog))?;
    expr.bound = true;
    Ok(())
}

/// Resolve a column reference.
///
/// Qualified references look the table up by alias, walking the scope chain;
/// resolution through an ancestor marks the reference correlated and records
/// it on the resolving occurrence. Unqualified references must have a unique
/// exporter in the current scope.
fn bind_column(col: &mut ColumnExpr, ctx: &mut BindContext, scope: ScopeId) -> Result<()> {
    match col.tab_name.clone() {
        Some(tab_name) => {
            let (table, depth) = ctx.resolve_table(scope, &tab_name)?.ok_or_else(|| {
                QuarryError::semantic(format!("table {tab_name} not exists"))
            })?;

            if ctx.locate_column(table, &col.col_name)?.is_none() {
                return Err(QuarryError::semantic(format!(
                    "column {} not found",
                    col.col_name
                )));
            }

            col.table = Some(table);
            if depth > 0 {
                col.is_parameter = true;
                ctx.add_correlated(table, col)?;
            }
        }
        None => {
            let table = ctx
                .resolve_column_local(scope, &col.col_name)?
                .ok_or_else(|| {
                    QuarryError::semantic(format!("column {} not found", col.col_name))
                })?;
            col.table = Some(table);
        }
    }
    Ok(())
}
