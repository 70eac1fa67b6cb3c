use crate::binder::bind_context::TableId;
use std::fmt;

/// Reference to a column in a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnExpr {
    pub db_name: Option<String>,
    pub tab_name: Option<String>,
    pub col_name: String,

    /// Bound table this column resolved through. Set by the binder.
    pub table: Option<TableId>,

    /// True iff the reference resolved in an enclosing scope, i.e. the column
    /// is correlated.
    pub is_parameter: bool,

    /// False means this is an output list entry injected only to carry a
    /// correlated value outward.
    pub is_visible: bool,
}

impl ColumnExpr {
    pub fn new(col_name: impl Into<String>) -> Self {
        ColumnExpr {
            db_name: None,
            tab_name: None,
            col_name: col_name.into(),
            table: None,
            is_parameter: false,
            is_visible: true,
        }
    }

    pub fn with_table(tab_name: impl Into<String>, col_name: impl Into<String>) -> Self {
        ColumnExpr {
            tab_name: Some(tab_name.into()),
            ..Self::new(col_name)
        }
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tab_name {
            Some(tab) => write!(f, "{tab}.{}", self.col_name),
            None => write!(f, "{}", self.col_name),
        }
    }
}
