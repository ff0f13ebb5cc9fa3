//! Migration sources.
//!
//! A [`MigrationSource`] lists migration names, reads them into
//! [`Migration`] records and persists newly created ones.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MigrateResult, MigrationError};
use crate::migration::Migration;
use crate::step::Step;

/// Supplier of migration records.
pub trait MigrationSource {
    /// Available migration names, in application order.
    fn names(&self) -> MigrateResult<Vec<String>>;

    /// Read a migration record.
    fn read(&self, name: &str) -> MigrateResult<Migration>;

    /// Persist a new migration numbered `number`, returning its full name.
    fn write(
        &mut self,
        number: usize,
        name: &str,
        upgrade: &[Step],
        downgrade: &[Step],
    ) -> MigrateResult<String>;

    /// Delete a migration record.
    fn remove(&mut self, name: &str) -> MigrateResult<()>;
}

/// Full migration name: `NNN_slug`.
pub fn migration_name(number: usize, name: &str) -> MigrateResult<String> {
    let slug = name.trim().replace([' ', '-'], "_");
    if slug.is_empty() || slug.contains(['.', '/', '\\']) {
        return Err(MigrationError::migration_file(format!(
            "invalid migration name '{}'",
            name
        )));
    }
    Ok(format!("{:03}_{}", number, slug))
}

fn number_of(name: &str) -> Option<usize> {
    name.split('_').next().and_then(|p| p.parse().ok())
}

/// Order migration names by numeric prefix, then by name.
pub fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| {
        let key = |n: &str| number_of(n).unwrap_or(usize::MAX);
        key(a).cmp(&key(b)).then_with(|| a.cmp(b))
    });
}

/// Number for the next migration: one past the highest existing prefix.
pub fn next_number<S: AsRef<str>>(names: &[S]) -> usize {
    names
        .iter()
        .filter_map(|n| number_of(n.as_ref()))
        .max()
        .unwrap_or(0)
        + 1
}

/// On-disk format of a migration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationFile {
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Upgrade steps.
    #[serde(default)]
    pub upgrade: Vec<Step>,
    /// Downgrade steps.
    #[serde(default)]
    pub downgrade: Vec<Step>,
}

/// Migrations stored as `NNN_slug.toml` files in a directory.
#[derive(Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    filemask: Regex,
}

impl DirectorySource {
    /// File extension of migration files.
    pub const EXTENSION: &'static str = "toml";

    /// Open a migrations directory, creating it when missing.
    pub fn new(dir: impl Into<PathBuf>) -> MigrateResult<Self> {
        let dir = dir.into();
        if !dir.exists() {
            warn!(path = %dir.display(), "Migration directory does not exist, creating it");
            std::fs::create_dir_all(&dir)?;
        }
        let filemask = Regex::new(r"^\d{3,}_[^.]+\.toml$")
            .map_err(|e| MigrationError::config(e.to_string()))?;
        Ok(Self { dir, filemask })
    }

    /// The migrations directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a migration file.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, Self::EXTENSION))
    }

    /// Read the raw file of a migration.
    pub fn read_file(&self, name: &str) -> MigrateResult<MigrationFile> {
        let path = self.path(name);
        if !path.exists() {
            return Err(MigrationError::not_found(name));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl MigrationSource for DirectorySource {
    fn names(&self) -> MigrateResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if !entry.path().is_file() || !self.filemask.is_match(file_name) {
                continue;
            }
            if let Some(stem) = file_name.strip_suffix(".toml") {
                names.push(stem.to_string());
            }
        }
        sort_names(&mut names);
        Ok(names)
    }

    fn read(&self, name: &str) -> MigrateResult<Migration> {
        let file = self.read_file(name)?;
        Ok(Migration::new(name).up(file.upgrade).down(file.downgrade))
    }

    fn write(
        &mut self,
        number: usize,
        name: &str,
        upgrade: &[Step],
        downgrade: &[Step],
    ) -> MigrateResult<String> {
        let name = migration_name(number, name)?;
        let file = MigrationFile {
            created_at: Some(Utc::now()),
            upgrade: upgrade.to_vec(),
            downgrade: downgrade.to_vec(),
        };
        let path = self.path(&name);
        if path.exists() {
            return Err(MigrationError::migration_file(format!(
                "migration '{}' already exists",
                name
            )));
        }
        let content = toml::to_string_pretty(&file)?;
        std::fs::write(&path, content)?;
        debug!(path = %path.display(), "Wrote migration file");
        Ok(name)
    }

    fn remove(&mut self, name: &str) -> MigrateResult<()> {
        let path = self.path(name);
        if !path.exists() {
            return Err(MigrationError::not_found(name));
        }
        std::fs::remove_file(&path)?;
        debug!(path = %path.display(), "Removed migration file");
        Ok(())
    }
}

/// Migrations registered in code.
#[derive(Debug, Default)]
pub struct MemorySource {
    migrations: IndexMap<String, Migration>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration.
    pub fn add(&mut self, migration: Migration) -> &mut Self {
        self.migrations.insert(migration.name.clone(), migration);
        self
    }

    /// Register a migration, builder style.
    pub fn with(mut self, migration: Migration) -> Self {
        self.add(migration);
        self
    }

    /// Number of registered migrations.
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Check if no migrations are registered.
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl MigrationSource for MemorySource {
    fn names(&self) -> MigrateResult<Vec<String>> {
        let mut names: Vec<String> = self.migrations.keys().cloned().collect();
        sort_names(&mut names);
        Ok(names)
    }

    fn read(&self, name: &str) -> MigrateResult<Migration> {
        self.migrations
            .get(name)
            .cloned()
            .ok_or_else(|| MigrationError::not_found(name))
    }

    fn write(
        &mut self,
        number: usize,
        name: &str,
        upgrade: &[Step],
        downgrade: &[Step],
    ) -> MigrateResult<String> {
        let name = migration_name(number, name)?;
        if self.migrations.contains_key(&name) {
            return Err(MigrationError::migration_file(format!(
                "migration '{}' already exists",
                name
            )));
        }
        self.add(
            Migration::new(&name)
                .up(upgrade.to_vec())
                .down(downgrade.to_vec()),
        );
        Ok(name)
    }

    fn remove(&mut self, name: &str) -> MigrateResult<()> {
        self.migrations
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| MigrationError::not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_schema::{Field, FieldType, Table};
    use tempfile::TempDir;

    fn steps() -> Vec<Step> {
        vec![Step::CreateTable {
            table: Table::new("Person", "person")
                .field(Field::new("id", FieldType::Auto))
                .field(Field::new("name", FieldType::char(100)).null(true)),
        }]
    }

    #[test]
    fn test_migration_name() {
        assert_eq!(migration_name(1, "initial").unwrap(), "001_initial");
        assert_eq!(migration_name(12, "add email").unwrap(), "012_add_email");
        assert!(migration_name(1, "").is_err());
        assert!(migration_name(1, "a.b").is_err());
        assert!(migration_name(1, "../x").is_err());
    }

    #[test]
    fn test_sort_names_numeric() {
        let mut names = vec![
            "010_c".to_string(),
            "002_b".to_string(),
            "001_a".to_string(),
            "1000_d".to_string(),
        ];
        sort_names(&mut names);
        assert_eq!(names, vec!["001_a", "002_b", "010_c", "1000_d"]);
    }

    #[test]
    fn test_directory_source_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut source = DirectorySource::new(dir.path().join("migrations")).unwrap();
        assert!(source.names().unwrap().is_empty());

        let name = source.write(1, "initial", &steps(), &[]).unwrap();
        assert_eq!(name, "001_initial");
        std::fs::write(source.dir().join("notes.txt"), "ignored").unwrap();
        std::fs::write(source.dir().join("002_draft.toml.bak"), "ignored").unwrap();
        assert_eq!(source.names().unwrap(), vec!["001_initial"]);

        let migration = source.read("001_initial").unwrap();
        assert_eq!(migration.upgrade.steps().unwrap(), steps().as_slice());
        assert!(migration.downgrade.is_empty());
        assert!(source.read_file("001_initial").unwrap().created_at.is_some());

        source.remove("001_initial").unwrap();
        assert!(source.names().unwrap().is_empty());
        assert!(matches!(
            source.read("001_initial"),
            Err(MigrationError::NotFound(_))
        ));
    }

    #[test]
    fn test_next_number_skips_gaps() {
        assert_eq!(next_number::<&str>(&[]), 1);
        assert_eq!(next_number(&["001_a", "003_b"]), 4);
        assert_eq!(next_number(&["999_a", "1000_b"]), 1001);
    }

    #[test]
    fn test_directory_source_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let mut source = DirectorySource::new(dir.path()).unwrap();
        source.write(3, "b", &steps(), &[]).unwrap();

        let err = source.write(3, "b", &[], &[]).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidMigration(_)));
        let migration = source.read("003_b").unwrap();
        assert_eq!(migration.upgrade.steps().unwrap(), steps().as_slice());
    }

    #[test]
    fn test_directory_source_lists_four_digit_numbers() {
        let dir = TempDir::new().unwrap();
        let mut source = DirectorySource::new(dir.path()).unwrap();
        source.write(999, "before", &[], &[]).unwrap();
        let name = source.write(1000, "after", &[], &[]).unwrap();
        assert_eq!(name, "1000_after");
        assert_eq!(source.names().unwrap(), vec!["999_before", "1000_after"]);
    }

    #[test]
    fn test_directory_source_reads_hand_written_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("001_initial.toml"),
            r#"
            [[upgrade]]
            op = "sql"
            sql = "CREATE TABLE person (id INTEGER PRIMARY KEY)"

            [[downgrade]]
            op = "remove_table"
            table = "person"
            "#,
        )
        .unwrap();
        let source = DirectorySource::new(dir.path()).unwrap();
        let migration = source.read("001_initial").unwrap();
        assert_eq!(migration.upgrade.steps().unwrap().len(), 1);
        assert_eq!(migration.downgrade.steps().unwrap()[0].name(), "remove_table");
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new()
            .with(Migration::new("002_second"))
            .with(Migration::new("001_first"));
        assert_eq!(source.names().unwrap(), vec!["001_first", "002_second"]);

        let name = source.write(3, "third", &steps(), &[]).unwrap();
        assert_eq!(name, "003_third");
        assert_eq!(source.len(), 3);
        assert!(source.write(3, "third", &[], &[]).is_err());
        source.remove("001_first").unwrap();
        assert!(source.remove("001_first").is_err());
    }
}
