//! # keel-schema
//!
//! Schema model for the Keel migration engine.
//!
//! This crate provides:
//! - [`Table`], [`Field`] and [`Index`] value objects with semantic equality
//! - The closed set of logical column types in [`FieldType`]
//! - Deterministic naming of indexes and constraints ([`naming`])
//! - Dependency ordering of tables ([`sort_tables`])
//! - Target schema sources, including a TOML loader ([`TomlSchema`])
//!
//! ## Example
//!
//! ```rust
//! use keel_schema::{Field, FieldType, ForeignKey, Table};
//!
//! let person = Table::new("Person", "person")
//!     .field(Field::new("id", FieldType::Auto))
//!     .field(Field::new("email", FieldType::char(255)).unique(true));
//!
//! let pet = Table::new("Pet", "pet")
//!     .field(Field::new("id", FieldType::Auto))
//!     .field(Field::foreign_key("owner", ForeignKey::new("person")));
//!
//! assert_eq!(pet.get_field("owner").unwrap().column(), "owner_id");
//! assert_eq!(keel_schema::sort_tables([&pet, &person])[0].table_name, "person");
//! ```

pub mod error;
pub mod field;
pub mod index;
pub mod naming;
pub mod sort;
pub mod source;
pub mod table;
pub mod types;
pub mod value;

pub use error::{SchemaError, SchemaResult};
pub use field::Field;
pub use index::{Constraint, Index, PrimaryKey};
pub use sort::sort_tables;
pub use source::{SchemaSource, TomlSchema};
pub use table::{Table, check_unique_tables};
pub use types::{FieldType, ForeignKey, ForeignTarget, SELF_REFERENCE};
pub use value::{DefaultValue, Literal};
