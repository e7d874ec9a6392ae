use serde::{Deserialize, Serialize};

/// One row of the server's flat introspection listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaMetadataRow {
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
}

impl SchemaMetadataRow {
    #[must_use]
    pub fn new(
        table_schema: impl Into<String>,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
    ) -> Self {
        Self {
            table_schema: table_schema.into(),
            table_name: table_name.into(),
            column_name: column_name.into(),
        }
    }
}

/// Drops every element after its first occurrence, keeping input order.
#[must_use]
pub fn unique_filter<T, I>(values: I) -> Vec<T>
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    let mut unique: Vec<T> = Vec::new();
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

#[must_use]
pub fn schemas(rows: &[SchemaMetadataRow]) -> Vec<String> {
    unique_filter(rows.iter().map(|row| row.table_schema.clone()))
}

#[must_use]
pub fn tables(rows: &[SchemaMetadataRow], schema_name: &str) -> Vec<String> {
    unique_filter(
        rows.iter()
            .filter(|row| row.table_schema == schema_name)
            .map(|row| row.table_name.clone()),
    )
}

/// Every column of every row named `table_name`, in listing order.
///
/// Unlike [`schemas`] and [`tables`] this neither deduplicates nor scopes the
/// match to a schema, so same-named tables in different schemas contribute
/// their columns together.
#[must_use]
pub fn columns(rows: &[SchemaMetadataRow], table_name: &str) -> Vec<String> {
    rows.iter()
        .filter(|row| row.table_name == table_name)
        .map(|row| row.column_name.clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaTreeEntry {
    Schema(String),
    Table { schema: String, table: String },
}

impl SchemaTreeEntry {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Schema(name) => name,
            Self::Table { table, .. } => table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPanel {
    pub table: String,
    pub columns: Vec<String>,
}

/// Rendered schema -> table hierarchy for one fetched listing.
///
/// Entries hold the entity they stand for, so selecting one never has to
/// recover a name from display text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaTree {
    rows: Vec<SchemaMetadataRow>,
    entries: Vec<SchemaTreeEntry>,
    column_panel: Option<ColumnPanel>,
}

impl SchemaTree {
    #[must_use]
    pub fn from_rows(rows: Vec<SchemaMetadataRow>) -> Self {
        let mut entries = Vec::new();
        for schema in schemas(&rows) {
            let schema_tables = tables(&rows, &schema);
            entries.push(SchemaTreeEntry::Schema(schema.clone()));
            entries.extend(schema_tables.into_iter().map(|table| SchemaTreeEntry::Table {
                schema: schema.clone(),
                table,
            }));
        }

        Self {
            rows,
            entries,
            column_panel: None,
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[SchemaMetadataRow] {
        &self.rows
    }

    #[must_use]
    pub fn entries(&self) -> &[SchemaTreeEntry] {
        &self.entries
    }

    #[must_use]
    pub fn column_panel(&self) -> Option<&ColumnPanel> {
        self.column_panel.as_ref()
    }

    /// Renders the column panel for the table entry at `index`.
    ///
    /// Returns `false` (and leaves the panel alone) for schema headers and
    /// out-of-range indexes.
    pub fn select_entry(&mut self, index: usize) -> bool {
        let Some(SchemaTreeEntry::Table { table, .. }) = self.entries.get(index) else {
            return false;
        };

        self.column_panel = Some(ColumnPanel {
            table: table.clone(),
            columns: columns(&self.rows, table),
        });
        true
    }
}
