//! Migration records.

use std::fmt;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::error::MigrateResult;
use crate::migrator::Migrator;
use crate::step::{Step, apply_steps};

/// Procedure written in code.
pub type ProcedureFn =
    dyn Fn(&mut Migrator, &mut dyn ExecutionContext) -> MigrateResult<()> + Send + Sync;

/// One direction of a migration.
#[derive(Clone)]
pub enum Procedure {
    /// Declarative steps.
    Steps(Vec<Step>),
    /// A closure with access to the migrator and the execution context.
    Code(Arc<ProcedureFn>),
}

impl Default for Procedure {
    fn default() -> Self {
        Self::Steps(Vec::new())
    }
}

impl Procedure {
    /// Wrap a closure.
    pub fn code<F>(func: F) -> Self
    where
        F: Fn(&mut Migrator, &mut dyn ExecutionContext) -> MigrateResult<()>
            + Send
            + Sync
            + 'static,
    {
        Self::Code(Arc::new(func))
    }

    /// Run against the migrator. Statements issued directly by code
    /// procedures go to `ctx`; everything else is queued.
    pub fn apply(
        &self,
        migrator: &mut Migrator,
        ctx: &mut dyn ExecutionContext,
    ) -> MigrateResult<()> {
        match self {
            Self::Steps(steps) => apply_steps(steps, migrator),
            Self::Code(func) => func(migrator, ctx),
        }
    }

    /// Declarative steps, if this procedure has them.
    pub fn steps(&self) -> Option<&[Step]> {
        match self {
            Self::Steps(steps) => Some(steps),
            Self::Code(_) => None,
        }
    }

    /// Check if the procedure does nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Steps(steps) if steps.is_empty())
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Steps(steps) => f.debug_tuple("Steps").field(steps).finish(),
            Self::Code(_) => f.write_str("Code(..)"),
        }
    }
}

impl From<Vec<Step>> for Procedure {
    fn from(steps: Vec<Step>) -> Self {
        Self::Steps(steps)
    }
}

/// A named pair of upgrade and downgrade procedures.
#[derive(Debug, Clone, Default)]
pub struct Migration {
    /// Migration name, e.g. `001_initial`.
    pub name: String,
    /// Applied by `run`.
    pub upgrade: Procedure,
    /// Applied by `rollback`.
    pub downgrade: Procedure,
}

impl Migration {
    /// A migration that does nothing in either direction.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the upgrade procedure.
    pub fn up(mut self, procedure: impl Into<Procedure>) -> Self {
        self.upgrade = procedure.into();
        self
    }

    /// Set the downgrade procedure.
    pub fn down(mut self, procedure: impl Into<Procedure>) -> Self {
        self.downgrade = procedure.into();
        self
    }
}
