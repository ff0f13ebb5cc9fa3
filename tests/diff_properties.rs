//! Integration tests for the differ.
//!
//! These tests check that generated steps, replayed through the migrator,
//! move a registry between schema snapshots without drift.

use keel::migrate::step::apply_steps;
use keel::migrate::{MigrationError, Migrator, Step, diff_tables};
use keel::schema::{
    Constraint, DefaultValue, Field, FieldType, ForeignKey, Index, PrimaryKey, Table, sort_tables,
};
use pretty_assertions::assert_eq;

fn registry(tables: &[Table]) -> Migrator {
    let mut migrator = Migrator::default();
    for table in sort_tables(tables) {
        migrator.create_table(table.clone()).unwrap();
    }
    migrator.discard();
    migrator
}

fn snapshot(migrator: &Migrator) -> Vec<Table> {
    migrator.tables().iter().map(|t| (**t).clone()).collect()
}

fn assert_same(actual: &[Table], expected: &[Table]) {
    assert_eq!(actual.len(), expected.len());
    for table in expected {
        let found = actual
            .iter()
            .find(|t| t.table_name == table.table_name)
            .unwrap_or_else(|| panic!("missing table {}", table.table_name));
        assert_eq!(found, table);
    }
}

/// Apply diff(B, A) then diff(A, B) to a registry at A.
fn assert_round_trip(a: &[Table], b: &[Table]) {
    let up = diff_tables(b, a).unwrap();
    let down = diff_tables(a, b).unwrap();

    let mut migrator = registry(a);
    apply_steps(&up, &mut migrator).unwrap();
    assert_same(&snapshot(&migrator), b);
    assert!(diff_tables(b, &snapshot(&migrator)).unwrap().is_empty());

    apply_steps(&down, &mut migrator).unwrap();
    assert_same(&snapshot(&migrator), a);
    assert!(diff_tables(a, &snapshot(&migrator)).unwrap().is_empty());
}

fn person() -> Table {
    Table::new("Person", "person")
        .field(Field::new("id", FieldType::Auto))
        .field(Field::new("name", FieldType::char(100)))
}

fn pet(target: &str) -> Table {
    Table::new("Pet", "pet")
        .field(Field::new("id", FieldType::Auto))
        .field(Field::new("name", FieldType::char(50)))
        .field(Field::foreign_key("owner", ForeignKey::new(target)))
}

#[test]
fn test_add_and_drop_column() {
    let a = vec![person().field(Field::new("age", FieldType::Integer).null(true))];
    let b = vec![person().field(Field::new("email", FieldType::char(255)).null(true))];

    let steps = diff_tables(&b, &a).unwrap();
    let names: Vec<&str> = steps.iter().map(Step::name).collect();
    assert_eq!(names, vec!["add_fields", "remove_fields"]);
    assert_round_trip(&a, &b);
}

#[test]
fn test_unique_and_index_flags() {
    let plain = vec![person().field(Field::new("email", FieldType::char(255)))];
    let unique = vec![person().field(Field::new("email", FieldType::char(255)).unique(true))];
    let indexed = vec![person().field(Field::new("email", FieldType::char(255)).index(true))];

    assert_round_trip(&plain, &unique);
    assert_round_trip(&indexed, &unique);
    assert_round_trip(&plain, &indexed);
}

#[test]
fn test_type_null_and_default_changes() {
    let a = vec![
        person()
            .field(Field::new("age", FieldType::Integer).null(true))
            .field(Field::new("bio", FieldType::char(100))),
    ];
    let b = vec![
        person()
            .field(Field::new("age", FieldType::BigInteger).default(DefaultValue::value(0)))
            .field(Field::new("bio", FieldType::Text).null(true)),
    ];
    assert_round_trip(&a, &b);
}

#[test]
fn test_not_null_follows_column() {
    let a = vec![person()];
    let b = vec![
        person().field(Field::new("age", FieldType::Integer).default(DefaultValue::value(0))),
    ];

    let steps = diff_tables(&b, &a).unwrap();
    let mut migrator = registry(&a);
    apply_steps(&steps, &mut migrator).unwrap();

    let kinds: Vec<&str> = migrator.operations().iter().map(|op| op.kind()).collect();
    let add = kinds.iter().position(|k| *k == "add_column").unwrap();
    let not_null = kinds.iter().position(|k| *k == "add_not_null").unwrap();
    assert!(add < not_null);
}

#[test]
fn test_foreign_keys() {
    let a = vec![person()];
    let b = vec![person(), pet("person")];
    assert_round_trip(&a, &b);

    let cascading = vec![
        person(),
        Table::new("Pet", "pet")
            .field(Field::new("id", FieldType::Auto))
            .field(Field::new("name", FieldType::char(50)))
            .field(Field::foreign_key(
                "owner",
                ForeignKey::new("person").on_delete("CASCADE"),
            )),
    ];
    assert_round_trip(&b, &cascading);
}

#[test]
fn test_creates_referenced_tables_first() {
    let b = vec![pet("person"), person()];
    let steps = diff_tables(&b, &[]).unwrap();
    let tables: Vec<&str> = steps.iter().filter_map(Step::table).collect();
    assert_eq!(tables, vec!["person", "pet"]);

    let steps = diff_tables(&[], &b).unwrap();
    let tables: Vec<&str> = steps.iter().filter_map(Step::table).collect();
    assert_eq!(tables, vec!["pet", "person"]);
}

#[test]
fn test_composite_indexes() {
    let base = person().field(Field::new("email", FieldType::char(255)));
    let a = vec![base.clone()];
    let b = vec![base.clone().index(Index::new(["name", "email"]))];
    let c = vec![base.index(Index::unique(["name", "email"]))];

    assert_round_trip(&a, &b);
    assert_round_trip(&b, &c);
}

#[test]
fn test_constraints() {
    let a = vec![person().field(Field::new("age", FieldType::Integer))];
    let b = vec![
        person()
            .field(Field::new("age", FieldType::Integer))
            .constraint(Constraint::new("age_positive", "CHECK (age > 0)")),
    ];
    assert_round_trip(&a, &b);
}

#[test]
fn test_table_rename_keeps_references() {
    let people = Table::new("Person", "people")
        .field(Field::new("id", FieldType::Auto))
        .field(Field::new("name", FieldType::char(100)));
    let a = vec![person(), pet("person")];
    let b = vec![people, pet("people")];

    let steps = diff_tables(&b, &a).unwrap();
    assert_eq!(steps[0].name(), "rename_table");
    assert_eq!(steps.len(), 1);
    assert_round_trip(&a, &b);
}

#[test]
fn test_no_op_diff() {
    let node = Table::new("Node", "node")
        .field(Field::new("id", FieldType::Auto))
        .field(Field::foreign_key("parent", ForeignKey::self_reference()).null(true));
    let schema = vec![
        person()
            .field(Field::new("email", FieldType::char(255)))
            .index(Index::new(["name", "email"])),
        pet("person"),
        node,
    ];
    assert!(diff_tables(&schema, &schema).unwrap().is_empty());

    // Field order and index column order carry no meaning.
    let reordered = vec![
        Table::new("Person", "person")
            .field(Field::new("email", FieldType::char(255)))
            .field(Field::new("name", FieldType::char(100)))
            .field(Field::new("id", FieldType::Auto))
            .index(Index::new(["email", "name"])),
        schema[1].clone(),
        schema[2].clone(),
    ];
    assert!(diff_tables(&reordered, &schema).unwrap().is_empty());
}

#[test]
fn test_declared_single_column_index_converges() {
    let plain = vec![person().field(Field::new("email", FieldType::char(255)))];
    let declared = vec![
        person()
            .field(Field::new("email", FieldType::char(255)))
            .index(Index::unique(["email"])),
    ];

    let registered = snapshot(&registry(&declared));
    assert!(registered[0].indexes.is_empty());
    assert!(diff_tables(&declared, &registered).unwrap().is_empty());
    assert!(diff_tables(&registered, &declared).unwrap().is_empty());

    let steps = diff_tables(&declared, &plain).unwrap();
    let names: Vec<&str> = steps.iter().map(Step::name).collect();
    assert_eq!(names, vec!["add_index"]);
}

#[test]
fn test_primary_key_change_is_rejected() {
    let tag = Table::new("Tag", "tag")
        .field(Field::new("post", FieldType::Integer))
        .field(Field::new("name", FieldType::char(50)));
    let single = vec![tag.clone().primary_key(PrimaryKey::Field("post".into()))];
    let composite = vec![tag.primary_key(PrimaryKey::Composite(vec![
        "post".into(),
        "name".into(),
    ]))];

    assert!(matches!(
        diff_tables(&composite, &single),
        Err(MigrationError::DiffInconsistency(_))
    ));
    assert!(matches!(
        diff_tables(&single, &composite),
        Err(MigrationError::DiffInconsistency(_))
    ));
}

#[test]
fn test_duplicate_tables_are_rejected() {
    let schema = vec![person(), person()];
    assert!(diff_tables(&schema, &[]).is_err());
}
