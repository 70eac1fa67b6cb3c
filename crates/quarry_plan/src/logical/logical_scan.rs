use crate::binder::bind_context::TableId;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// A scan of a base relation.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalScanTable {
    /// Bound occurrence this scan produces rows for.
    pub table: TableId,
    pub name: String,
    pub alias: String,
}

impl Explainable for LogicalScanTable {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("Scan").with_value("table", &self.name);
        if self.alias != self.name {
            ent = ent.with_value("alias", &self.alias);
        }
        ent
    }
}

/// A scan of bulk-loaded external data, shaped like a base relation.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalScanFile {
    pub table: TableId,
    pub name: String,
    pub path: String,
}

impl Explainable for LogicalScanFile {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("ScanFile")
            .with_value("table", &self.name)
            .with_value("path", &self.path)
    }
}
