use std::collections::HashSet;

/// Which push message a committed write warrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageVariant {
    AssignedNew,
    Reassigned,
    StatusChanged,
    GenericUpdate,
}

impl MessageVariant {
    pub fn text(&self) -> &'static str {
        match self {
            Self::AssignedNew => "You have been assigned a new task.",
            Self::Reassigned => "Task assignment has been changed.",
            Self::StatusChanged => "Task status has been updated.",
            Self::GenericUpdate => "Task has been updated.",
        }
    }
}

/// Decides whether a committed task write should notify the assignee, and
/// with which message. First matching rule wins:
///
/// 1. No assignee: nothing to notify.
/// 2. Newly created: `AssignedNew`, whatever the changed-field set says.
/// 3. Changed fields declared and include `assigned_to`: `Reassigned` —
///    takes priority over a simultaneous status change.
/// 4. Changed fields declared and include `status`: `StatusChanged`.
/// 5. Changed fields declared but name neither: no notification.
/// 6. Changed fields undeclared (full/unspecified update): `GenericUpdate`.
pub fn classify(
    created: bool,
    changed_fields: Option<&HashSet<String>>,
    assigned_present: bool,
) -> Option<MessageVariant> {
    if !assigned_present {
        return None;
    }
    if created {
        return Some(MessageVariant::AssignedNew);
    }
    match changed_fields {
        Some(fields) if fields.contains("assigned_to") => Some(MessageVariant::Reassigned),
        Some(fields) if fields.contains("status") => Some(MessageVariant::StatusChanged),
        Some(_) => None,
        None => Some(MessageVariant::GenericUpdate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_created_always_wins_when_assigned() {
        assert_eq!(classify(true, None, true), Some(MessageVariant::AssignedNew));
        assert_eq!(
            classify(true, Some(&fields(&["status"])), true),
            Some(MessageVariant::AssignedNew)
        );
        assert_eq!(
            classify(true, Some(&fields(&["assigned_to", "status"])), true),
            Some(MessageVariant::AssignedNew)
        );
    }

    #[test]
    fn test_no_assignee_means_no_notification() {
        assert_eq!(classify(true, None, false), None);
        assert_eq!(classify(false, None, false), None);
        assert_eq!(classify(false, Some(&fields(&["assigned_to"])), false), None);
        assert_eq!(classify(false, Some(&fields(&["status"])), false), None);
    }

    #[test]
    fn test_reassignment_detected() {
        assert_eq!(
            classify(false, Some(&fields(&["assigned_to"])), true),
            Some(MessageVariant::Reassigned)
        );
    }

    #[test]
    fn test_reassignment_takes_priority_over_status() {
        assert_eq!(
            classify(false, Some(&fields(&["assigned_to", "status"])), true),
            Some(MessageVariant::Reassigned)
        );
    }

    #[test]
    fn test_status_change_detected() {
        assert_eq!(
            classify(false, Some(&fields(&["status"])), true),
            Some(MessageVariant::StatusChanged)
        );
        assert_eq!(
            classify(false, Some(&fields(&["status", "title"])), true),
            Some(MessageVariant::StatusChanged)
        );
    }

    #[test]
    fn test_unrelated_fields_emit_nothing() {
        assert_eq!(classify(false, Some(&fields(&["title"])), true), None);
        assert_eq!(
            classify(false, Some(&fields(&["description", "due_date"])), true),
            None
        );
        assert_eq!(classify(false, Some(&fields(&[])), true), None);
    }

    #[test]
    fn test_undeclared_fields_emit_generic_update() {
        assert_eq!(classify(false, None, true), Some(MessageVariant::GenericUpdate));
    }

    #[test]
    fn test_variant_texts() {
        assert_eq!(
            MessageVariant::AssignedNew.text(),
            "You have been assigned a new task."
        );
        assert_eq!(
            MessageVariant::Reassigned.text(),
            "Task assignment has been changed."
        );
        assert_eq!(
            MessageVariant::StatusChanged.text(),
            "Task status has been updated."
        );
        assert_eq!(MessageVariant::GenericUpdate.text(), "Task has been updated.");
    }
}
