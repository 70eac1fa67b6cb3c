use crate::binder::bind_context::BindContext;
use crate::logical::operator::LogicalOperator;
use crate::statement::Statement;
use quarry_error::Result;
use tracing::trace;

impl Statement {
    /// Plan a bound statement.
    ///
    /// Only SELECTs (and the embedded SELECT source of an INSERT) produce a
    /// logical tree; the remaining statements are handled outside the
    /// planner and return None.
    pub fn create_plan(&mut self, ctx: &mut BindContext) -> Result<Option<LogicalOperator>> {
        trace!("planning statement");
        match self {
            Statement::Select(stmt) => Ok(Some(stmt.create_plan(ctx)?)),
            Statement::Insert(insert) => match &insert.source {
                Some(source) => Ok(Some(source.borrow_mut().create_plan(ctx)?)),
                None => Ok(None),
            },
            Statement::CreateTable(_)
            | Statement::CreateIndex(_)
            | Statement::Copy(_)
            | Statement::Analyze(_) => Ok(None),
        }
    }
}
