pub mod operator;

pub mod logical_aggregate;
pub mod logical_filter;
pub mod logical_from_query;
pub mod logical_join;
pub mod logical_limit;
pub mod logical_order;
pub mod logical_result;
pub mod logical_scan;
