pub mod plan_select;
pub mod plan_statement;
