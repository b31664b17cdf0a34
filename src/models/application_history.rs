//! # Application History Model
//!
//! Append-only audit trail of status changes. Exactly one row is written per
//! successful transition, including the initial `SUBMITTED` row at creation.
//! Rows are never updated after insert and are read newest-first.

use super::role::UserRole;
use crate::state_machine::ApplicationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationHistory {
    pub id: Uuid,
    pub application_id: Uuid,
    /// `None` only on the creation record
    pub old_status: Option<ApplicationStatus>,
    pub new_status: ApplicationStatus,
    /// Role of the actor who performed the change
    pub changed_by: UserRole,
    pub changed_at: DateTime<Utc>,
}

impl ApplicationHistory {
    /// Creation record: nothing -> `status`
    pub fn initial(application_id: Uuid, status: ApplicationStatus, changed_by: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            application_id,
            old_status: None,
            new_status: status,
            changed_by,
            changed_at: crate::models::now(),
        }
    }

    pub fn transition(
        application_id: Uuid,
        old_status: ApplicationStatus,
        new_status: ApplicationStatus,
        changed_by: UserRole,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            application_id,
            old_status: Some(old_status),
            new_status,
            changed_by,
            changed_at: crate::models::now(),
        }
    }

    pub fn is_creation(&self) -> bool {
        self.old_status.is_none()
    }
}

/// Reorder entries given in insertion order to newest first.
///
/// Entries sharing a timestamp keep reverse insertion order.
pub fn newest_first(mut entries: Vec<ApplicationHistory>) -> Vec<ApplicationHistory> {
    entries.reverse();
    entries.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_initial_record_has_no_previous_status() {
        let entry = ApplicationHistory::initial(
            Uuid::new_v4(),
            ApplicationStatus::Submitted,
            UserRole::User,
        );
        assert!(entry.is_creation());
        assert_eq!(entry.new_status, ApplicationStatus::Submitted);
    }

    #[test]
    fn test_newest_first() {
        let app_id = Uuid::new_v4();
        let mut first =
            ApplicationHistory::initial(app_id, ApplicationStatus::Submitted, UserRole::User);
        first.changed_at -= Duration::seconds(10);
        let second = ApplicationHistory::transition(
            app_id,
            ApplicationStatus::Submitted,
            ApplicationStatus::Approved,
            UserRole::Admin,
        );

        let entries = newest_first(vec![first.clone(), second.clone()]);
        assert_eq!(entries[0].id, second.id);
        assert_eq!(entries[1].id, first.id);
    }

    #[test]
    fn test_equal_timestamps_keep_reverse_insertion_order() {
        let app_id = Uuid::new_v4();
        let first =
            ApplicationHistory::initial(app_id, ApplicationStatus::Submitted, UserRole::User);
        let mut second = ApplicationHistory::transition(
            app_id,
            ApplicationStatus::Submitted,
            ApplicationStatus::InReview,
            UserRole::Manager,
        );
        second.changed_at = first.changed_at;

        let entries = newest_first(vec![first.clone(), second.clone()]);
        assert_eq!(entries[0].id, second.id);
    }
}
