//! Target schema sources.
//!
//! A source supplies the tables a database should end up with. The
//! migration engine diffs them against the schema implied by applied
//! migrations.
//!
//! ```toml
//! [[tables]]
//! name = "Person"
//! table_name = "person"
//!
//! [[tables.fields]]
//! name = "id"
//! type = "auto"
//!
//! [[tables.fields]]
//! name = "email"
//! type = "char"
//! max_length = 255
//! unique = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::table::{Table, check_unique_tables};

/// Anything that can supply a deduplicated list of tables.
pub trait SchemaSource {
    /// Return the declared tables.
    fn tables(&self) -> SchemaResult<Vec<Table>>;
}

impl SchemaSource for Vec<Table> {
    fn tables(&self) -> SchemaResult<Vec<Table>> {
        check_unique_tables(self)?;
        Ok(self.clone())
    }
}

impl SchemaSource for [Table] {
    fn tables(&self) -> SchemaResult<Vec<Table>> {
        check_unique_tables(self)?;
        Ok(self.to_vec())
    }
}

/// Tables declared in a TOML document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlSchema {
    /// Declared tables.
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl TomlSchema {
    /// Parse and validate a TOML schema document.
    pub fn parse(content: &str) -> SchemaResult<Self> {
        let mut schema: TomlSchema = toml::from_str(content)?;
        for table in &mut schema.tables {
            table.normalize();
            table.validate()?;
        }
        check_unique_tables(&schema.tables)?;
        debug!(tables = schema.tables.len(), "Parsed schema");
        Ok(schema)
    }

    /// Read and parse a schema file.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Look up a table by model or table name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.table_name == name || t.name == name)
    }
}

impl SchemaSource for TomlSchema {
    fn tables(&self) -> SchemaResult<Vec<Table>> {
        Ok(self.tables.clone())
    }
}
