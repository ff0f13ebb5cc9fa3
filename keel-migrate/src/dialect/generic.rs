//! ANSI SQL dialect.

use super::{Dialect, DialectKind};

/// Dialect that emits standard SQL only.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Generic
    }
}
