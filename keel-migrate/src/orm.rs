//! The table registry.
//!
//! [`Orm`] maps model names to the current table snapshot and physical table
//! names back to model names. Each mutation replaces whole snapshots, and
//! foreign key targets are re-resolved against the registry on every
//! replacement so that dialects can render referencing columns directly.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use indexmap::IndexMap;
use keel_schema::{ForeignTarget, Table};

use crate::error::{MigrateResult, MigrationError};

/// A reverse relation: `(table_name, field)` of a referencing field.
pub type Backref = (String, String);

/// Registry of current table snapshots.
#[derive(Debug, Clone, Default)]
pub struct Orm {
    models: IndexMap<String, Arc<Table>>,
    tables: IndexMap<String, String>,
    backrefs: BTreeMap<String, BTreeSet<Backref>>,
}

impl Orm {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Look up a table by table name, then by model name.
    pub fn get(&self, key: &str) -> Option<&Arc<Table>> {
        self.tables
            .get(key)
            .and_then(|model| self.models.get(model))
            .or_else(|| self.models.get(key))
    }

    /// Look up a table, failing with [`MigrationError::NotFound`].
    pub fn require(&self, key: &str) -> MigrateResult<Arc<Table>> {
        self.get(key)
            .cloned()
            .ok_or_else(|| MigrationError::not_found(key))
    }

    /// Check if a table is registered under either name.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Snapshots in registration order.
    pub fn tables(&self) -> Vec<Arc<Table>> {
        self.models.values().cloned().collect()
    }

    /// Fields of other tables that reference `table_name`.
    pub fn backrefs(&self, table_name: &str) -> Vec<Backref> {
        self.backrefs
            .get(table_name)
            .map(|refs| refs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Register or replace a table, keyed by its model name.
    ///
    /// Returns the stored snapshot with foreign key targets resolved.
    /// Tables referencing the new snapshot are re-resolved as well.
    pub fn insert(&mut self, table: Table) -> Arc<Table> {
        if let Some(previous) = self.models.get(&table.name) {
            if previous.table_name != table.table_name {
                self.tables.shift_remove(&previous.table_name);
            }
        }

        let table_name = table.table_name.clone();
        let model = table.name.clone();
        let snapshot = Arc::new(self.resolve(table));
        self.tables.insert(table_name.clone(), model.clone());
        self.models.insert(model, snapshot.clone());

        let referrers: Vec<String> = self
            .models
            .values()
            .filter(|t| t.table_name != table_name)
            .filter(|t| t.dependencies().contains(table_name.as_str()))
            .map(|t| t.name.clone())
            .collect();
        for model in referrers {
            if let Some(current) = self.models.get(&model) {
                let resolved = Arc::new(self.resolve((**current).clone()));
                self.models.insert(model, resolved);
            }
        }

        self.reindex();
        snapshot
    }

    /// Remove a table by either name.
    pub fn remove(&mut self, key: &str) -> Option<Arc<Table>> {
        let model = self.get(key)?.name.clone();
        let removed = self.models.shift_remove(&model)?;
        self.tables.shift_remove(&removed.table_name);
        self.reindex();
        Some(removed)
    }

    fn resolve(&self, mut table: Table) -> Table {
        let own = table.clone();
        for field in table.fields.iter_mut() {
            let Some(fk) = field.field_type.as_foreign_key_mut() else {
                continue;
            };
            let target_name = fk.target_table(&own.table_name).to_string();
            let target = if target_name == own.table_name || target_name == own.name {
                Some(&own)
            } else {
                self.get(&target_name).map(|t| t.as_ref())
            };
            fk.target = target.and_then(|t| {
                t.get_field(&fk.field).map(|f| ForeignTarget {
                    table: t.table_name.clone(),
                    column: f.column(),
                    field_type: Box::new(f.field_type.clone()),
                })
            });
        }
        table
    }

    fn reindex(&mut self) {
        let mut backrefs: BTreeMap<String, BTreeSet<Backref>> = BTreeMap::new();
        for table in self.models.values() {
            for field in table.foreign_keys() {
                let Some(fk) = field.foreign_key_ref() else {
                    continue;
                };
                let target = match &fk.target {
                    Some(target) => target.table.clone(),
                    None => fk.target_table(&table.table_name).to_string(),
                };
                backrefs
                    .entry(target)
                    .or_default()
                    .insert((table.table_name.clone(), field.name.clone()));
            }
        }
        self.backrefs = backrefs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_schema::{Field, FieldType, ForeignKey};

    fn person() -> Table {
        Table::new("Person", "person").field(Field::new("id", FieldType::BigAuto))
    }

    fn pet() -> Table {
        Table::new("Pet", "pet")
            .field(Field::new("id", FieldType::Auto))
            .field(Field::foreign_key("owner", ForeignKey::new("person")))
    }

    #[test]
    fn test_lookup_by_either_name() {
        let mut orm = Orm::new();
        orm.insert(person());
        assert!(orm.contains("person"));
        assert!(orm.contains("Person"));
        assert!(matches!(orm.require("nope"), Err(MigrationError::NotFound(_))));
    }

    #[test]
    fn test_foreign_keys_resolve_in_any_order() {
        let mut orm = Orm::new();
        orm.insert(pet());
        let unresolved = orm.require("pet").unwrap();
        let fk = unresolved.get_field("owner").unwrap().foreign_key_ref().unwrap();
        assert!(fk.target.is_none());

        orm.insert(person());
        let resolved = orm.require("pet").unwrap();
        let fk = resolved.get_field("owner").unwrap().foreign_key_ref().unwrap();
        let target = fk.target.as_ref().unwrap();
        assert_eq!(target.table, "person");
        assert_eq!(*target.field_type, FieldType::BigAuto);
    }

    #[test]
    fn test_backrefs() {
        let mut orm = Orm::new();
        orm.insert(person());
        orm.insert(pet());
        assert_eq!(
            orm.backrefs("person"),
            vec![("pet".to_string(), "owner".to_string())]
        );

        let mut bare = pet();
        bare.remove_field("owner");
        orm.insert(bare);
        assert!(orm.backrefs("person").is_empty());
    }

    #[test]
    fn test_renamed_table_leaves_no_stale_key() {
        let mut orm = Orm::new();
        orm.insert(person());
        let mut renamed = person();
        renamed.table_name = "people".into();
        orm.insert(renamed);
        assert!(orm.get("person").is_none());
        assert_eq!(orm.require("people").unwrap().name, "Person");
        assert_eq!(orm.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut orm = Orm::new();
        orm.insert(person());
        orm.insert(pet());
        assert!(orm.remove("Pet").is_some());
        assert!(!orm.contains("pet"));
        assert!(orm.backrefs("person").is_empty());
        assert!(orm.remove("pet").is_none());
    }
}
