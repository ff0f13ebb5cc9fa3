//! Dependency ordering of tables.

use std::collections::{BTreeMap, BTreeSet};

use crate::table::Table;

/// Order tables so that every table comes after the tables it references.
///
/// Self-references and references to tables outside the input are ignored.
/// Ties are broken by table name, so the result is deterministic. Cycles
/// are broken at the first revisited table.
pub fn sort_tables<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Vec<&'a Table> {
    let by_name: BTreeMap<&str, &Table> = tables
        .into_iter()
        .map(|t| (t.table_name.as_str(), t))
        .collect();

    let mut visited = BTreeSet::new();
    let mut ordered = Vec::with_capacity(by_name.len());

    for &name in by_name.keys() {
        visit(name, &by_name, &mut visited, &mut ordered);
    }

    ordered
}

fn visit<'a>(
    name: &'a str,
    by_name: &BTreeMap<&'a str, &'a Table>,
    visited: &mut BTreeSet<&'a str>,
    ordered: &mut Vec<&'a Table>,
) {
    if !visited.insert(name) {
        return;
    }
    let Some(&table) = by_name.get(name) else {
        return;
    };
    for dep in table.dependencies() {
        if by_name.contains_key(dep) {
            visit(dep, by_name, visited, ordered);
        }
    }
    ordered.push(table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::types::{FieldType, ForeignKey};

    fn table(name: &str, refs: &[&str]) -> Table {
        let mut table = Table::new(name, name).field(Field::new("id", FieldType::Auto));
        for r in refs {
            table = table.field(Field::foreign_key(*r, ForeignKey::new(*r)));
        }
        table
    }

    fn names(tables: &[&Table]) -> Vec<String> {
        tables.iter().map(|t| t.table_name.clone()).collect()
    }

    #[test]
    fn test_references_come_first() {
        let tables = vec![
            table("pet", &["person"]),
            table("toy", &["pet"]),
            table("person", &[]),
        ];
        assert_eq!(names(&sort_tables(&tables)), vec!["person", "pet", "toy"]);
    }

    #[test]
    fn test_ties_by_name() {
        let tables = vec![table("b", &[]), table("c", &[]), table("a", &[])];
        assert_eq!(names(&sort_tables(&tables)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_self_reference_and_cycles_terminate() {
        let category = Table::new("category", "category")
            .field(Field::new("id", FieldType::Auto))
            .field(Field::foreign_key("parent", ForeignKey::self_reference()));
        let tables = vec![category, table("x", &["y"]), table("y", &["x"])];

        let sorted = sort_tables(&tables);
        assert_eq!(sorted.len(), 3);
    }
}
