use super::explainable::{ExplainConfig, Explainable};
use crate::logical::operator::LogicalOperator;
use quarry_error::{Result, ResultExt};
use std::fmt::Write as _;

/// Render a logical plan as an indented text tree.
pub fn format_plan(plan: &LogicalOperator) -> Result<String> {
    let mut out = String::new();
    format_node(plan, 0, &mut out)?;
    Ok(out)
}

fn format_node(node: &LogicalOperator, depth: usize, out: &mut String) -> Result<()> {
    let entry = node.explain_entry(ExplainConfig::default());
    writeln!(out, "{:indent$}{entry}", "", indent = depth * 2)
        .context("failed to write to explain buffer")?;
    for child in node.children() {
        format_node(child, depth + 1, out)?;
    }
    Ok(())
}
