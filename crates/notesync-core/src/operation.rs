//! Deferred operations and the plan that orders them

use std::fmt;

use notesync_fs::IdentityPath;
use tracing::debug;

/// The decision a diff made for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    NoOp,
    Create,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

/// A single deferred side effect.
///
/// Executing an operation never fails from the caller's point of view: any
/// error is caught and reported through the factory's event sink.
pub struct Operation {
    kind: OperationKind,
    path: IdentityPath,
    task: Box<dyn FnOnce() + Send>,
}

impl Operation {
    pub(crate) fn new(
        kind: OperationKind,
        path: IdentityPath,
        task: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            kind,
            path,
            task: Box::new(task),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Identity path of the item the operation was planned for.
    pub fn path(&self) -> &IdentityPath {
        &self.path
    }

    /// Run the side effect.
    pub fn execute(self) {
        (self.task)()
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path)
    }
}

/// Count of planned operations per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub no_op: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

impl PlanSummary {
    pub fn total(&self) -> usize {
        self.no_op + self.create + self.update + self.delete
    }

    fn record(&mut self, kind: OperationKind) {
        match kind {
            OperationKind::NoOp => self.no_op += 1,
            OperationKind::Create => self.create += 1,
            OperationKind::Update => self.update += 1,
            OperationKind::Delete => self.delete += 1,
        }
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} unchanged, {} to create, {} to update, {} to delete",
            self.no_op, self.create, self.update, self.delete
        )
    }
}

/// Ordered operations produced by one diff.
///
/// Creates, updates and no-ops come first in desired-state order, deletes
/// follow in current-state order. Execution is sequential in that order and
/// there is no rollback.
#[derive(Debug, Default)]
pub struct Plan {
    operations: Vec<Operation>,
}

impl Plan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Kinds in plan order.
    pub fn kinds(&self) -> Vec<OperationKind> {
        self.operations.iter().map(Operation::kind).collect()
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for operation in &self.operations {
            summary.record(operation.kind());
        }
        summary
    }

    /// Run every operation, one after another, on the calling thread.
    ///
    /// Returns the summary of what was executed.
    pub fn execute(self) -> PlanSummary {
        let summary = self.summary();
        for operation in self.operations {
            debug!(kind = %operation.kind(), path = %operation.path(), "Executing operation");
            operation.execute();
        }
        summary
    }
}

impl IntoIterator for Plan {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}
