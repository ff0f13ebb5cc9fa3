//! Deterministic names for generated database objects.

use sha2::{Digest, Sha256};

/// Longest generated identifier before hashing kicks in.
pub const MAX_IDENTIFIER_LEN: usize = 64;

const TRUNCATED_PREFIX_LEN: usize = 56;
const HASH_SUFFIX_LEN: usize = 7;

/// Name of an index over `columns` of `table`.
///
/// ```
/// use keel_schema::naming::make_index_name;
///
/// assert_eq!(make_index_name("person", &["email"]), "person_email");
/// ```
pub fn make_index_name<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    let columns: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();
    shorten(format!("{}_{}", table, columns.join("_")))
}

/// Name of the foreign key constraint on `table.column` referencing `target`.
pub fn foreign_key_name(table: &str, column: &str, target: &str) -> String {
    shorten(format!("fk_{}_{}_refs_{}", table, column, target))
}

/// Name of the temporary table used while rebuilding `table`.
pub fn rebuild_table_name(table: &str) -> String {
    format!("{}__tmp__", table)
}

fn shorten(name: String) -> String {
    if name.len() <= MAX_IDENTIFIER_LEN {
        return name;
    }

    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    let prefix: String = name.chars().take(TRUNCATED_PREFIX_LEN).collect();
    format!("{}_{}", prefix, &digest[..HASH_SUFFIX_LEN])
}
