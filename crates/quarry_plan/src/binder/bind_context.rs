use crate::expr::column_expr::ColumnExpr;
use crate::expr::{Expr, ExprKind};
use crate::statement::SelectRef;
use quarry_error::{QuarryError, Result};

/// Handle to a scope in the bind context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub usize);

/// Handle to a table occurrence registered in some scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub usize);

/// A lexical scope.
///
/// Scopes chain to their parent; the root scope of a statement batch has no
/// parent. Aliases are unique within a single scope.
#[derive(Debug)]
pub struct BindScope {
    parent: Option<ScopeId>,
    tables: Vec<TableId>,
    /// CTEs introduced by the statement bound in this scope, in declaration
    /// order. Lookup walks the parent chain.
    ctes: Vec<CteEntry>,
}

#[derive(Debug, Clone)]
pub struct CteEntry {
    pub name: String,
    pub col_names: Option<Vec<String>>,
    pub query: SelectRef,
}

/// Bound metadata for one table occurrence in a FROM clause.
#[derive(Debug)]
pub struct BoundTable {
    /// First name this occurrence is referable under.
    pub alias: String,
    /// Column expressions the occurrence exports to its scope. Output names
    /// are set on every entry.
    pub columns: Vec<Expr>,
    /// Columns of this occurrence referenced from strictly deeper scopes.
    pub correlated: Vec<ColumnExpr>,
}

/// Arena owning every scope and bound table of a statement batch.
///
/// Expressions and statements refer into the arena through `ScopeId` and
/// `TableId`, which keeps the scope chain and table back-references free of
/// ownership cycles.
#[derive(Debug, Default)]
pub struct BindContext {
    scopes: Vec<BindScope>,
    tables: Vec<BoundTable>,
}

impl BindContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let idx = self.scopes.len();
        self.scopes.push(BindScope {
            parent,
            tables: Vec::new(),
            ctes: Vec::new(),
        });
        ScopeId(idx)
    }

    pub fn parent_of(&self, scope: ScopeId) -> Result<Option<ScopeId>> {
        Ok(self.scope(scope)?.parent)
    }

    /// Register a table occurrence in a scope.
    ///
    /// Exported columns are typically filled in afterwards with
    /// `set_table_columns`, since building them requires the new id.
    pub fn push_table(&mut self, scope: ScopeId, alias: impl Into<String>) -> Result<TableId> {
        let alias = alias.into();
        let scope_ref = self.scope(scope)?;
        for id in &scope_ref.tables {
            if self.tables[id.0].alias == alias {
                return Err(QuarryError::semantic(format!(
                    "duplicate table alias {alias}"
                )));
            }
        }

        let id = TableId(self.tables.len());
        self.tables.push(BoundTable {
            alias,
            columns: Vec::new(),
            correlated: Vec::new(),
        });
        self.scope_mut(scope)?.tables.push(id);
        Ok(id)
    }

    pub fn set_table_columns(&mut self, id: TableId, columns: Vec<Expr>) -> Result<()> {
        self.table_mut(id)?.columns = columns;
        Ok(())
    }

    pub fn table(&self, TableId(idx): TableId) -> Result<&BoundTable> {
        self.tables
            .get(idx)
            .ok_or_else(|| QuarryError::new("missing bound table"))
    }

    fn table_mut(&mut self, TableId(idx): TableId) -> Result<&mut BoundTable> {
        self.tables
            .get_mut(idx)
            .ok_or_else(|| QuarryError::new("missing bound table"))
    }

    pub fn scope_table_ids(&self, scope: ScopeId) -> Result<Vec<TableId>> {
        Ok(self.scope(scope)?.tables.clone())
    }

    /// Find a table occurrence by alias, walking the scope chain.
    ///
    /// Returns the id together with the number of scopes walked; a non-zero
    /// depth means the reference is correlated.
    pub fn resolve_table(&self, scope: ScopeId, alias: &str) -> Result<Option<(TableId, usize)>> {
        let mut current = Some(scope);
        let mut depth = 0;
        while let Some(scope) = current {
            for id in &self.scope(scope)?.tables {
                if self.tables[id.0].alias == alias {
                    return Ok(Some((*id, depth)));
                }
            }
            current = self.scope(scope)?.parent;
            depth += 1;
        }
        Ok(None)
    }

    /// Find the unique table in `scope` (this scope only, no parents) that
    /// exports `col_name`.
    pub fn resolve_column_local(&self, scope: ScopeId, col_name: &str) -> Result<Option<TableId>> {
        let mut found = None;
        for id in &self.scope(scope)?.tables {
            for col in &self.tables[id.0].columns {
                if col.output_name.as_deref() == Some(col_name) {
                    if found.is_some() {
                        return Err(QuarryError::semantic(format!(
                            "ambiguous column name {col_name}"
                        )));
                    }
                    found = Some(*id);
                    break;
                }
            }
        }
        Ok(found)
    }

    /// Find the column a table occurrence exports under `name`.
    ///
    /// Matching is by output name only; a table qualifier on the original
    /// reference does not narrow it further. Two exports under the same name
    /// are ambiguous even when a qualifier could have disambiguated them --
    /// a known limitation kept for compatibility.
    pub fn locate_column(&self, table: TableId, name: &str) -> Result<Option<Expr>> {
        let mut found = None;
        for col in &self.table(table)?.columns {
            if col.output_name.as_deref() == Some(name) {
                if found.is_some() {
                    return Err(QuarryError::semantic(format!(
                        "ambiguous column name {name}"
                    )));
                }
                found = Some(col.clone());
            }
        }
        Ok(found)
    }

    /// Record a correlated reference resolved through `table` from a deeper
    /// scope. Duplicates (same column reaching the same occurrence) collapse.
    pub fn add_correlated(&mut self, table: TableId, col: &ColumnExpr) -> Result<()> {
        let bound = self.table_mut(table)?;
        if !bound.correlated.iter().any(|c| c == col) {
            bound.correlated.push(col.clone());
        }
        Ok(())
    }

    /// Append this table's correlated columns to `output` (invisible, no
    /// longer parameters) unless already present, projecting correlated
    /// values to the statement boundary so the outer scope can consume them
    /// without re-binding.
    pub fn add_outer_refs_to_output(&self, table: TableId, output: &mut Vec<Expr>) -> Result<()> {
        for col in &self.table(table)?.correlated {
            let present = output.iter().any(|e| match &e.kind {
                ExprKind::Column(c) => c.table == col.table && c.col_name == col.col_name,
                _ => false,
            });
            if present {
                continue;
            }

            let mut col = col.clone();
            col.is_visible = false;
            col.is_parameter = false;

            let mut expr = Expr::new(ExprKind::Column(col.clone()));
            expr.output_name = Some(col.col_name.clone());
            expr.bound = true;
            output.push(expr);
        }
        Ok(())
    }

    /// Register a CTE as visible from `scope`.
    pub fn register_cte(&mut self, scope: ScopeId, cte: CteEntry) -> Result<()> {
        self.scope_mut(scope)?.ctes.push(cte);
        Ok(())
    }

    /// Look up a CTE by name, walking the scope chain.
    pub fn resolve_cte(&self, scope: ScopeId, name: &str) -> Result<Option<CteEntry>> {
        let mut current = Some(scope);
        while let Some(scope) = current {
            let scope_ref = self.scope(scope)?;
            if let Some(cte) = scope_ref.ctes.iter().find(|c| c.name == name) {
                return Ok(Some(cte.clone()));
            }
            current = scope_ref.parent;
        }
        Ok(None)
    }

    fn scope(&self, ScopeId(idx): ScopeId) -> Result<&BindScope> {
        self.scopes
            .get(idx)
            .ok_or_else(|| QuarryError::new("missing bind scope"))
    }

    fn scope_mut(&mut self, ScopeId(idx): ScopeId) -> Result<&mut BindScope> {
        self.scopes
            .get_mut(idx)
            .ok_or_else(|| QuarryError::new("missing bind scope"))
    }
}
