use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::models::TaskSnapshot;
use crate::registry::ConnectionRegistry;

use super::classifier::classify;
use super::dispatcher::dispatch;

/// Post-commit hook for task writes.
///
/// The store calls [`on_task_committed`] exactly once per durable write,
/// synchronously on the request path. Whatever happens downstream —
/// classification, serialization, fan-out — stays contained here: a
/// notification failure never fails the write that triggered it.
///
/// [`on_task_committed`]: TaskObserver::on_task_committed
#[derive(Clone)]
pub struct TaskObserver {
    registry: Arc<ConnectionRegistry>,
}

impl TaskObserver {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// `changed_fields` is the set of field names the caller declares as
    /// modified; `None` means an unspecified/full update.
    pub fn on_task_committed(
        &self,
        snapshot: &TaskSnapshot,
        created: bool,
        changed_fields: Option<&HashSet<String>>,
    ) {
        let result = catch_unwind(AssertUnwindSafe(|| {
            if let Some(variant) = classify(created, changed_fields, snapshot.assigned_to.is_some())
            {
                dispatch(&self.registry, snapshot, variant);
            }
        }));
        if result.is_err() {
            tracing::error!(task_id = snapshot.id, "notification observer panicked; write unaffected");
        }
    }
}
