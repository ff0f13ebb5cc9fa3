//! PostgreSQL dialect.

use keel_schema::FieldType;

use super::{Dialect, DialectKind, ansi_column_type, foreign_column_type};

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn column_type(&self, field_type: &FieldType) -> String {
        match field_type {
            FieldType::Auto => "SERIAL".to_string(),
            FieldType::BigAuto => "BIGSERIAL".to_string(),
            FieldType::Timestamp => "TIMESTAMPTZ".to_string(),
            FieldType::Binary => "BYTEA".to_string(),
            FieldType::Json => "JSONB".to_string(),
            FieldType::Uuid => "UUID".to_string(),
            FieldType::Array { inner, dimensions } => {
                let mut ty = self.column_type(inner);
                for _ in 0..*dimensions {
                    ty.push_str("[]");
                }
                ty
            }
            FieldType::ForeignKey(_) => self.column_type(&foreign_column_type(field_type)),
            other => ansi_column_type(self, other),
        }
    }

    fn alter_type_clause(&self, column: &str, column_type: &str) -> String {
        let quoted = self.quote(column);
        format!(
            "ALTER COLUMN {} TYPE {} USING {}::{}",
            quoted, column_type, quoted, column_type
        )
    }
}
