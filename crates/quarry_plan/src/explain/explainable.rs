use std::fmt;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExplainConfig {
    pub verbose: bool,
}

/// A single rendered node in an explain tree: operator name plus key/value
/// items.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainEntry {
    pub name: String,
    pub items: Vec<(String, String)>,
}

impl ExplainEntry {
    pub fn new(name: impl Into<String>) -> Self {
        ExplainEntry {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.items.push((key.into(), value.to_string()));
        self
    }

    pub fn with_values<V: fmt::Display>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<_> = values.into_iter().map(|v| v.to_string()).collect();
        self.items.push((key.into(), format!("[{}]", values.join(", "))));
        self
    }
}

impl fmt::Display for ExplainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.items.is_empty() {
            write!(f, " (")?;
            for (idx, (key, value)) in self.items.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}: {value}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

pub trait Explainable {
    /// Create an explain entry for this node.
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_display() {
        let entry = ExplainEntry::new("Filter").with_value("predicate", "a1 = 3");
        assert_eq!("Filter (predicate: a1 = 3)", entry.to_string());

        let entry = ExplainEntry::new("Order").with_values("expressions", ["a DESC", "b ASC"]);
        assert_eq!("Order (expressions: [a DESC, b ASC])", entry.to_string());

        let entry = ExplainEntry::new("CrossJoin");
        assert_eq!("CrossJoin", entry.to_string());
    }
}
