use super::bind_context::BindContext;
use crate::database::catalog::Catalog;
use crate::database::datatype::DataType;
use crate::statement::Statement;
use quarry_error::{QuarryError, Result};
use tracing::trace;

impl Statement {
    /// Bind a statement against a catalog.
    ///
    /// Non-SELECT statements only validate their referenced names and bind
    /// their embedded SELECT, if any; their execution is out of scope here.
    pub fn bind(&mut self, ctx: &mut BindContext, catalog: &dyn Catalog) -> Result<()> {
        trace!("binding statement");
        match self {
            Statement::Select(stmt) => {
                stmt.bind(ctx, catalog, None)?;
            }
            Statement::CreateTable(create) => {
                let mut seen = Vec::with_capacity(create.columns.len());
                for col in &create.columns {
                    if seen.contains(&&col.name) {
                        return Err(QuarryError::semantic(format!(
                            "duplicate column name {}",
                            col.name
                        )));
                    }
                    seen.push(&col.name);
                    DataType::from_sql_name(&col.type_name)?;
                }
            }
            Statement::CreateIndex(create) => {
                let cols = catalog.table_cols(&create.table.name)?;
                for col in &create.columns {
                    if !cols.contains_key(col) {
                        return Err(QuarryError::semantic(format!("column {col} not found")));
                    }
                }
            }
            Statement::Insert(insert) => {
                let cols = catalog.table_cols(&insert.table.name)?;
                for col in &insert.columns {
                    if !cols.contains_key(col) {
                        return Err(QuarryError::semantic(format!("column {col} not found")));
                    }
                }
                if let Some(source) = &insert.source {
                    let mut inner = source.borrow_mut();
                    if !inner.bound {
                        inner.bind(ctx, catalog, None)?;
                    }
                }
            }
            Statement::Copy(copy) => {
                catalog.table(&copy.table.name)?;
            }
            Statement::Analyze(analyze) => {
                catalog.table(&analyze.table.name)?;
            }
        }
        Ok(())
    }
}
