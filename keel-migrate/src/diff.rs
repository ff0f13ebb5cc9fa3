//! Schema differ.
//!
//! [`diff_tables`] computes the steps that turn a source schema into a
//! target schema. Run with the arguments swapped it yields the reverse
//! steps.

use std::collections::{BTreeMap, BTreeSet};

use keel_schema::{Field, Index, PrimaryKey, Table, check_unique_tables, sort_tables};
use tracing::debug;

use crate::error::{MigrateResult, MigrationError};
use crate::step::Step;

/// Steps turning `source` into `target`.
///
/// Order: table renames, creates (referenced tables first), per-table
/// alters, drops (dependents first). Both sides are normalized first, so a
/// single-column entry in `indexes` compares equal to the field flag.
pub fn diff_tables(target: &[Table], source: &[Table]) -> MigrateResult<Vec<Step>> {
    check_unique_tables(target).map_err(|e| MigrationError::diff_inconsistency(e.to_string()))?;
    check_unique_tables(source).map_err(|e| MigrationError::diff_inconsistency(e.to_string()))?;

    let target = normalized(target);
    let source = normalized(source);
    let (target, source) = (target.as_slice(), source.as_slice());

    let target_names: BTreeSet<&str> = target.iter().map(|t| t.table_name.as_str()).collect();
    let source_names: BTreeSet<&str> = source.iter().map(|t| t.table_name.as_str()).collect();

    // Same model, different table name.
    let mut renames: BTreeMap<String, String> = BTreeMap::new();
    for t in target.iter().filter(|t| !source_names.contains(t.table_name.as_str())) {
        let renamed = source.iter().find(|s| {
            s.name == t.name
                && !target_names.contains(s.table_name.as_str())
                && !renames.contains_key(&s.table_name)
        });
        if let Some(s) = renamed {
            renames.insert(s.table_name.clone(), t.table_name.clone());
        }
    }

    let source: Vec<Table> = source.iter().map(|s| apply_renames(s, &renames)).collect();
    let by_name: BTreeMap<&str, &Table> =
        source.iter().map(|s| (s.table_name.as_str(), s)).collect();

    let mut steps: Vec<Step> = renames
        .iter()
        .map(|(old, new)| Step::RenameTable {
            table: old.clone(),
            new_name: new.clone(),
        })
        .collect();

    let ordered = sort_tables(target);
    for t in ordered
        .iter()
        .filter(|t| !by_name.contains_key(t.table_name.as_str()))
    {
        steps.push(Step::CreateTable {
            table: (*t).clone(),
        });
    }

    for t in &ordered {
        if let Some(s) = by_name.get(t.table_name.as_str()) {
            steps.extend(diff_normalized(t, s)?);
        }
    }

    let target_names: BTreeSet<&str> = target.iter().map(|t| t.table_name.as_str()).collect();
    let mut dropped = sort_tables(
        source
            .iter()
            .filter(|s| !target_names.contains(s.table_name.as_str())),
    );
    dropped.reverse();
    for s in dropped {
        steps.push(Step::RemoveTable {
            table: s.table_name.clone(),
            cascade: false,
        });
    }

    debug!(steps = steps.len(), "Computed schema diff");
    Ok(steps)
}

/// Steps turning table `source` into table `target`.
///
/// Primary keys are not migrated: a change of key is reported as a diff
/// inconsistency.
pub fn diff_table(target: &Table, source: &Table) -> MigrateResult<Vec<Step>> {
    let mut target = target.clone();
    let mut source = source.clone();
    target.normalize();
    source.normalize();
    diff_normalized(&target, &source)
}

fn normalized(tables: &[Table]) -> Vec<Table> {
    tables
        .iter()
        .map(|t| {
            let mut table = t.clone();
            table.normalize();
            table
        })
        .collect()
}

fn diff_normalized(target: &Table, source: &Table) -> MigrateResult<Vec<Step>> {
    if target.table_name != source.table_name {
        return Err(MigrationError::diff_inconsistency(format!(
            "cannot compare table '{}' with '{}'",
            target.table_name, source.table_name
        )));
    }
    let table = target.table_name.clone();
    let mut steps = Vec::new();

    let added: Vec<Field> = target
        .fields
        .iter()
        .filter(|f| !source.has_field(&f.name))
        .cloned()
        .collect();
    if !added.is_empty() {
        steps.push(Step::AddFields {
            table: table.clone(),
            fields: added,
        });
    }

    let removed: Vec<&Field> = source
        .fields
        .iter()
        .filter(|f| !target.has_field(&f.name))
        .collect();

    // The migrator only derives a key from an added auto field or drops
    // key fields that are removed; any other key change cannot be replayed.
    let mut primary_key = source.primary_key.clone();
    for field in target.fields.iter().filter(|f| !source.has_field(&f.name)) {
        if primary_key.is_none() && field.field_type.is_auto() {
            primary_key = PrimaryKey::Field(field.name.clone());
        }
    }
    for field in &removed {
        primary_key.remove(&field.name);
    }
    if primary_key != target.primary_key {
        return Err(MigrationError::diff_inconsistency(format!(
            "primary key of table '{}' changed from {:?} to {:?}",
            target.table_name, source.primary_key, target.primary_key
        )));
    }
    for field in removed.iter().filter(|f| f.indexed()) {
        steps.push(Step::DropIndex {
            table: table.clone(),
            columns: vec![field.name.clone()],
        });
    }
    if !removed.is_empty() {
        steps.push(Step::RemoveFields {
            table: table.clone(),
            fields: removed.iter().map(|f| f.name.clone()).collect(),
            cascade: false,
        });
    }

    let common: Vec<(&Field, &Field)> = target
        .fields
        .iter()
        .filter_map(|t| source.get_field(&t.name).map(|s| (t, s)))
        .collect();

    // Flags stay as in the source; the toggles below flip them.
    let changed: Vec<Field> = common
        .iter()
        .filter(|(t, s)| t.definition_differs(s))
        .map(|(t, s)| {
            let mut field = (*t).clone();
            field.null = s.null;
            field.unique = s.unique;
            field.index = s.index;
            field
        })
        .collect();
    if !changed.is_empty() {
        steps.push(Step::ChangeFields {
            table: table.clone(),
            fields: changed,
        });
    }

    let mut not_null = Vec::new();
    let mut nullable = Vec::new();
    for (t, s) in &common {
        if t.null != s.null {
            if t.null {
                nullable.push(t.name.clone());
            } else {
                not_null.push(t.name.clone());
            }
        }
    }
    if !not_null.is_empty() {
        steps.push(Step::AddNotNull {
            table: table.clone(),
            fields: not_null,
        });
    }
    if !nullable.is_empty() {
        steps.push(Step::DropNotNull {
            table: table.clone(),
            fields: nullable,
        });
    }

    for (t, s) in &common {
        if t.indexed() == s.indexed() && t.unique == s.unique {
            continue;
        }
        if s.indexed() {
            steps.push(Step::DropIndex {
                table: table.clone(),
                columns: vec![s.name.clone()],
            });
        }
        if t.indexed() {
            steps.push(Step::AddIndex {
                table: table.clone(),
                columns: vec![t.name.clone()],
                unique: t.unique,
            });
        }
    }

    // Removing a field already drops the composite indexes it was part of.
    let removed_names: BTreeSet<&str> = removed.iter().map(|f| f.name.as_str()).collect();
    let surviving: Vec<&Index> = source
        .indexes
        .iter()
        .filter(|idx| !idx.columns.iter().any(|c| removed_names.contains(c.as_str())))
        .collect();
    for index in surviving.iter().filter(|idx| !target.indexes.contains(idx)) {
        steps.push(Step::DropIndex {
            table: table.clone(),
            columns: index.columns.clone(),
        });
    }
    for index in target
        .indexes
        .iter()
        .filter(|idx| !surviving.contains(idx))
    {
        steps.push(Step::AddIndex {
            table: table.clone(),
            columns: index.columns.clone(),
            unique: index.unique,
        });
    }

    let dropped: Vec<String> = source
        .constraints
        .iter()
        .filter(|c| !target.constraints.contains(c))
        .map(|c| c.name.clone())
        .collect();
    if !dropped.is_empty() {
        steps.push(Step::DropConstraints {
            table: table.clone(),
            names: dropped,
        });
    }
    for constraint in target
        .constraints
        .iter()
        .filter(|c| !source.constraints.contains(c))
    {
        steps.push(Step::AddConstraint {
            table: table.clone(),
            name: constraint.name.clone(),
            definition: constraint.definition.clone(),
        });
    }

    Ok(steps)
}

fn apply_renames(table: &Table, renames: &BTreeMap<String, String>) -> Table {
    let mut table = table.clone();
    if let Some(new) = renames.get(&table.table_name) {
        table.table_name = new.clone();
    }
    for field in table.fields.iter_mut() {
        if let Some(fk) = field.field_type.as_foreign_key_mut() {
            if let Some(new) = renames.get(&fk.table) {
                fk.table = new.clone();
            }
        }
    }
    table
}
