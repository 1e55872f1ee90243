use crate::models::{Notification, TaskSnapshot};
use crate::registry::ConnectionRegistry;

use super::classifier::MessageVariant;

/// Builds the push event for `variant` and fans it out to the assignee's
/// group. Returns silently when the task has no assignee or the assignee
/// has no live connections.
pub fn dispatch(registry: &ConnectionRegistry, snapshot: &TaskSnapshot, variant: MessageVariant) {
    let Some(user_id) = snapshot.assigned_to else {
        return;
    };

    let event = Notification {
        message: variant.text().to_string(),
        task_id: snapshot.id,
        task_title: snapshot.title.clone(),
        status: snapshot.status,
    };

    match serde_json::to_string(&event) {
        Ok(json) => {
            let delivered = registry.send(user_id, &json);
            tracing::debug!(user_id, task_id = snapshot.id, delivered, "notification dispatched");
        }
        Err(e) => {
            tracing::error!(task_id = snapshot.id, error = %e, "failed to serialize notification");
        }
    }
}
