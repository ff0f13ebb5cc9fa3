//! End-to-end migration lifecycle against SQLite.

use keel::prelude::*;
use keel::schema::TomlSchema;
use pretty_assertions::assert_eq;
use rusqlite::Connection;
use tempfile::TempDir;

const V1: &str = r#"
[[tables]]
name = "Author"
table_name = "author"

[[tables.fields]]
name = "id"
type = "auto"

[[tables.fields]]
name = "name"
type = "char"
max_length = 100

[[tables]]
name = "Book"
table_name = "book"

[[tables.fields]]
name = "id"
type = "auto"

[[tables.fields]]
name = "title"
type = "char"
max_length = 200

[[tables.fields]]
name = "author"
type = "foreign_key"
table = "author"
"#;

const V2: &str = r#"
[[tables]]
name = "Author"
table_name = "author"

[[tables.fields]]
name = "id"
type = "auto"

[[tables.fields]]
name = "name"
type = "char"
max_length = 100
unique = true

[[tables]]
name = "Book"
table_name = "book"

[[tables.fields]]
name = "id"
type = "auto"

[[tables.fields]]
name = "title"
type = "char"
max_length = 200

[[tables.fields]]
name = "pages"
type = "integer"
null = true

[[tables.fields]]
name = "author"
type = "foreign_key"
table = "author"
"#;

fn columns(conn: &Connection, table: &str) -> Vec<String> {
    let sql = format!("SELECT name FROM pragma_table_info('{}') ORDER BY cid", table);
    let mut stmt = conn.prepare(&sql).unwrap();
    stmt.query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn router(dir: &TempDir) -> Router<DirectorySource, SqliteContext> {
    let conn = Connection::open(dir.path().join("app.db")).unwrap();
    let source = DirectorySource::new(dir.path().join("migrations")).unwrap();
    let config = RouterConfig::new().dialect(DialectKind::Sqlite);
    Router::new(source, SqliteContext::from_connection(conn), config).unwrap()
}

#[test]
fn test_schema_file_lifecycle() {
    let dir = TempDir::new().unwrap();
    let v1 = TomlSchema::parse(V1).unwrap();
    let v2 = TomlSchema::parse(V2).unwrap();

    let mut r = router(&dir);
    assert_eq!(
        r.create("initial", Some(&v1 as &dyn SchemaSource)).unwrap().as_deref(),
        Some("001_initial")
    );
    r.run(None, false).unwrap();
    assert_eq!(
        columns(r.context().connection(), "book"),
        vec!["id", "title", "author_id"]
    );

    assert_eq!(
        r.create("pages", Some(&v2 as &dyn SchemaSource)).unwrap().as_deref(),
        Some("002_pages")
    );
    assert_eq!(r.create("again", Some(&v2 as &dyn SchemaSource)).unwrap(), None);

    // A fresh router sees the same state from disk.
    drop(r);
    let mut r = router(&dir);
    assert_eq!(r.diff().unwrap(), vec!["002_pages"]);
    assert_eq!(r.run(None, false).unwrap(), vec!["002_pages"]);
    assert!(columns(r.context().connection(), "book").contains(&"pages".to_string()));

    r.context()
        .connection()
        .execute("INSERT INTO author (name) VALUES ('Le Guin')", [])
        .unwrap();
    let duplicate = r
        .context()
        .connection()
        .execute("INSERT INTO author (name) VALUES ('Le Guin')", []);
    assert!(duplicate.is_err());

    assert_eq!(r.rollback(None).unwrap(), "002_pages");
    assert_eq!(
        columns(r.context().connection(), "book"),
        vec!["id", "title", "author_id"]
    );
    assert_eq!(r.done().unwrap(), vec!["001_initial"]);

    let migrator = r.migrator().unwrap();
    assert!(migrator.table("book").is_ok());
    let registry: Vec<Table> = migrator.tables().iter().map(|t| (**t).clone()).collect();
    assert!(diff_tables(&v1.tables().unwrap(), &registry).unwrap().is_empty());
}
