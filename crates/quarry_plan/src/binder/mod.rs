pub mod bind_context;
pub mod bind_expr;
pub mod bind_select;
pub mod bind_statement;
pub mod table_ref;
