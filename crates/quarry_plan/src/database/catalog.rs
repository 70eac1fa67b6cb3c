use super::datatype::DataType;
use indexmap::IndexMap;
use quarry_error::{QuarryError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub datatype: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    /// Columns in declaration order, keyed by name.
    pub columns: IndexMap<String, ColumnDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        TableDef {
            name: name.into(),
            columns: IndexMap::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, datatype: DataType) -> Self {
        let name = name.into();
        self.columns.insert(
            name.clone(),
            ColumnDef {
                name,
                datatype,
            },
        );
        self
    }
}

/// Read-only lookup service the binder resolves relation names against.
///
/// Implementations are expected to be cheap to query; the binder performs a
/// fresh lookup per reference and never caches results across statements.
pub trait Catalog {
    /// Find a table by name, returning None if it doesn't exist.
    fn try_table(&self, name: &str) -> Option<&TableDef>;

    /// Find a table by name, erroring if it doesn't exist.
    fn table(&self, name: &str) -> Result<&TableDef> {
        self.try_table(name)
            .ok_or_else(|| QuarryError::semantic(format!("table {name} not exists")))
    }

    /// Get the ordered column map for a table.
    fn table_cols(&self, name: &str) -> Result<&IndexMap<String, ColumnDef>> {
        Ok(&self.table(name)?.columns)
    }
}

/// In-memory catalog.
///
/// The planner is a library; embedders that already have a catalog implement
/// `Catalog` directly. This one backs tests and small tools.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: IndexMap<String, TableDef>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, table: TableDef) -> Result<()> {
        if self.tables.contains_key(&table.name) {
            return Err(QuarryError::semantic(format!(
                "table {} already exists",
                table.name
            )));
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }
}

impl Catalog for MemoryCatalog {
    fn try_table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_error::ErrorKind;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .create_table(
                TableDef::new("a")
                    .with_column("a1", DataType::Int)
                    .with_column("a2", DataType::Int),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn lookup_existing() {
        let catalog = catalog();
        assert!(catalog.try_table("a").is_some());
        let cols = catalog.table_cols("a").unwrap();
        assert_eq!(vec!["a1", "a2"], cols.keys().collect::<Vec<_>>());
    }

    #[test]
    fn lookup_missing() {
        let catalog = catalog();
        assert!(catalog.try_table("b").is_none());
        let err = catalog.table("b").unwrap_err();
        assert_eq!(ErrorKind::Semantic, err.kind);
        assert!(err.msg.contains("table b not exists"));
    }

    #[test]
    fn duplicate_create() {
        let mut catalog = catalog();
        let err = catalog.create_table(TableDef::new("a")).unwrap_err();
        assert_eq!(ErrorKind::Semantic, err.kind);
    }
}
