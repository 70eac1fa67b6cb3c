//! Logical query planning for SQL statements.
//!
//! The crate takes a parsed statement tree, binds names against a catalog
//! ([`database::catalog::Catalog`]) inside a per-batch
//! [`binder::bind_context::BindContext`], and lowers bound SELECTs into a
//! tree of [`logical::operator::LogicalOperator`] nodes. Rewrites,
//! optimization and execution consume that tree downstream.

pub mod binder;
pub mod database;
pub mod explain;
pub mod expr;
pub mod logical;
pub mod planner;
pub mod statement;
