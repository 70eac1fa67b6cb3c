use super::bind_context::{BindContext, ScopeId, TableId};
use crate::database::catalog::Catalog;
use crate::expr::column_expr::ColumnExpr;
use crate::expr::{Expr, ExprKind};
use crate::statement::{SelectRef, SelectStmt};
use quarry_error::{OptionExt, QuarryError, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// A FROM clause source.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    Base(BaseTableRef),
    External(ExternalTableRef),
    Query(QueryTableRef),
    Join(JoinTableRef),
}

impl TableRef {
    /// The first name this source is referable under.
    pub fn alias(&self) -> &str {
        match self {
            Self::Base(base) => base.alias(),
            Self::External(external) => external.base.alias(),
            Self::Query(query) => &query.alias,
            Self::Join(join) => join.tables[0].alias(),
        }
    }

    /// The columns this source exposes to the enclosing scope. Only
    /// available once the source has been registered by binding; a join
    /// exposes its children's exports in list order.
    pub fn all_columns_refs(&self, ctx: &BindContext) -> Result<Vec<Expr>> {
        match self {
            Self::Base(base) => {
                let id = base.table_id.required("unbound base table ref")?;
                Ok(ctx.table(id)?.columns.clone())
            }
            Self::External(external) => {
                let id = external.base.table_id.required("unbound external ref")?;
                Ok(ctx.table(id)?.columns.clone())
            }
            Self::Query(query) => {
                let id = query.table_id.required("unbound query ref")?;
                Ok(ctx.table(id)?.columns.clone())
            }
            Self::Join(join) => {
                let mut out = Vec::new();
                for child in &join.tables {
                    out.extend(child.all_columns_refs(ctx)?);
                }
                Ok(out)
            }
        }
    }
}

/// A named relation, optionally aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseTableRef {
    pub db_name: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    /// Bound table occurrence, set during binding.
    pub table_id: Option<TableId>,
}

impl BaseTableRef {
    pub fn new(name: impl Into<String>) -> Self {
        BaseTableRef {
            db_name: None,
            name: name.into(),
            alias: None,
            table_id: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        BaseTableRef {
            alias: Some(alias.into()),
            ..Self::new(name)
        }
    }

    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A file binding layered over a base relation, for bulk-loaded external
/// data. Exports the base relation's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalTableRef {
    pub path: String,
    pub base: BaseTableRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRefKind {
    /// A subquery in FROM.
    FromQuery,
    /// A reference to a CTE of an enclosing statement.
    Cte,
}

/// A nested SELECT in FROM, or a CTE occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTableRef {
    pub kind: QueryRefKind,
    pub alias: String,
    /// Outside names for the inner columns; `b(a4)` renames the first inner
    /// column to `a4` and hides the rest.
    pub col_names: Option<Vec<String>>,
    pub query: SelectRef,
    pub table_id: Option<TableId>,
}

impl QueryTableRef {
    pub fn from_query(alias: impl Into<String>, query: SelectStmt) -> Self {
        QueryTableRef {
            kind: QueryRefKind::FromQuery,
            alias: alias.into(),
            col_names: None,
            query: Rc::new(RefCell::new(query)),
            table_id: None,
        }
    }

    pub fn with_col_names(mut self, col_names: Vec<String>) -> Self {
        self.col_names = Some(col_names);
        self
    }
}

/// An n-ary join as parsed: a flat child list, one operator token and one
/// constraint per child after the first. The planner folds this into a
/// left-deep binary tree with a single filter on top.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTableRef {
    /// Children, never nested joins.
    pub tables: Vec<TableRef>,
    /// Join operator tokens, lowercased ("inner", "left", ...).
    pub ops: Vec<String>,
    pub constraints: Vec<Expr>,
}

impl JoinTableRef {
    pub fn new(tables: Vec<TableRef>, ops: Vec<String>, constraints: Vec<Expr>) -> Result<Self> {
        if tables.len() < 2 {
            return Err(QuarryError::parse("join requires at least two tables"));
        }
        if ops.len() != tables.len() - 1 || constraints.len() != tables.len() - 1 {
            return Err(QuarryError::parse(format!(
                "join with {} tables requires {} operators and constraints",
                tables.len(),
                tables.len() - 1
            )));
        }
        if tables.iter().any(|t| matches!(t, TableRef::Join(_))) {
            return Err(QuarryError::parse("join children cannot be joins"));
        }
        Ok(JoinTableRef {
            tables,
            ops: ops.into_iter().map(|op| op.to_ascii_lowercase()).collect(),
            constraints,
        })
    }
}

impl BaseTableRef {
    /// Register this relation in a scope, exporting one column reference per
    /// catalog column.
    pub(crate) fn register(
        &mut self,
        ctx: &mut BindContext,
        scope: ScopeId,
        catalog: &dyn Catalog,
    ) -> Result<TableId> {
        let cols = catalog.table_cols(&self.name)?;
        let names: Vec<String> = cols.keys().cloned().collect();

        let id = ctx.push_table(scope, self.alias())?;
        let alias = self.alias().to_string();

        let columns = names
            .into_iter()
            .map(|name| {
                let mut col = ColumnExpr::with_table(alias.clone(), name.clone());
                col.table = Some(id);
                let mut expr = Expr::new(ExprKind::Column(col));
                expr.output_name = Some(name);
                expr.bound = true;
                expr
            })
            .collect();
        ctx.set_table_columns(id, columns)?;

        self.table_id = Some(id);
        Ok(id)
    }
}

impl ExternalTableRef {
    pub(crate) fn register(
        &mut self,
        ctx: &mut BindContext,
        scope: ScopeId,
        catalog: &dyn Catalog,
    ) -> Result<TableId> {
        self.base.register(ctx, scope, catalog)
    }
}

impl QueryTableRef {
    /// Register this query ref, exporting the inner statement's selection
    /// retargeted to the new occurrence. The inner statement must already be
    /// bound.
    pub(crate) fn register(&mut self, ctx: &mut BindContext, scope: ScopeId) -> Result<TableId> {
        let inner = self.query.borrow();
        if !inner.bound {
            return Err(QuarryError::new(
                "inner query must be bound before registering",
            ));
        }
        // The snapshot includes invisible entries appended while binding the
        // inner statement; they keep carrying correlated values outward
        // through this boundary.
        let items: Vec<Expr> = inner.selection.clone();
        drop(inner);

        if let Some(renames) = &self.col_names {
            if renames.len() > items.len() {
                return Err(QuarryError::semantic(format!(
                    "Expected at most {} column aliases, received {}",
                    items.len(),
                    renames.len()
                )));
            }
        }

        let id = ctx.push_table(scope, self.alias.clone())?;

        let keep = match &self.col_names {
            Some(renames) => renames.len(),
            None => items.len(),
        };

        let mut columns = Vec::with_capacity(keep);
        for (ordinal, item) in items.into_iter().take(keep).enumerate() {
            // Aggregate results cross the subquery boundary as handles so the
            // aggregation is computed once, inside the subquery.
            let mut expr = if item.has_agg_func() {
                Expr::expr_ref(item.clone(), ordinal)
            } else {
                item.clone()
            };
            retarget_columns(&mut expr, id);

            expr.output_name = match &self.col_names {
                Some(renames) => Some(renames[ordinal].clone()),
                None => item
                    .output_name
                    .clone()
                    .or_else(|| Some(item.default_output_name())),
            };
            expr.bound = true;
            columns.push(expr);
        }
        ctx.set_table_columns(id, columns)?;

        self.table_id = Some(id);
        Ok(id)
    }
}

/// Point every column reference inside `expr` at `table`.
fn retarget_columns(expr: &mut Expr, table: TableId) {
    if let ExprKind::Column(col) = &mut expr.kind {
        col.table = Some(table);
        col.is_parameter = false;
    }
    expr.for_each_child_mut(&mut |child| retarget_columns(child, table));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::catalog::{MemoryCatalog, TableDef};
    use crate::database::datatype::DataType;
    use quarry_error::ErrorKind;

    #[test]
    fn query_ref_exports_match_inner_selection() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .create_table(
                TableDef::new("a")
                    .with_column("a1", DataType::Int)
                    .with_column("a2", DataType::Int),
            )
            .unwrap();

        let mut inner = SelectStmt::new();
        inner.selection = vec![Expr::column("a1"), Expr::column("a2")];
        inner.from = vec![TableRef::Base(BaseTableRef::new("a"))];

        let mut stmt = SelectStmt::new();
        stmt.selection = vec![Expr::star()];
        stmt.from = vec![TableRef::Query(QueryTableRef::from_query("sub", inner))];

        let mut ctx = BindContext::new();
        stmt.bind(&mut ctx, &catalog, None).unwrap();

        let exports = stmt.from[0].all_columns_refs(&ctx).unwrap();
        let inner_len = match &stmt.from[0] {
            TableRef::Query(q) => q.query.borrow().selection.len(),
            other => panic!("unexpected from: {other:?}"),
        };
        assert_eq!(inner_len, exports.len());
    }

    #[test]
    fn join_ref_rejects_bad_shapes() {
        let err = JoinTableRef::new(
            vec![TableRef::Base(BaseTableRef::new("a"))],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(ErrorKind::Parse, err.kind);

        let err = JoinTableRef::new(
            vec![
                TableRef::Base(BaseTableRef::new("a")),
                TableRef::Base(BaseTableRef::new("b")),
            ],
            vec!["inner".to_string()],
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(ErrorKind::Parse, err.kind);
    }
}
