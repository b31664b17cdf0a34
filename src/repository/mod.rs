//! # Persistence Boundary
//!
//! Async store traits the services depend on. Every mutating method is one
//! atomic unit: either all of its writes become visible or none do.
//!
//! Two implementations ship with the crate:
//!
//! - [`InMemoryStore`] - lock-guarded tables, used by tests and embedders
//! - [`PgStore`] - PostgreSQL via SQLx, schema in `migrations/`

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use crate::config::HistoryRetention;
use crate::models::{
    Application, ApplicationHistory, AssignmentRole, Product, Tag, User, UserProductAssignment,
};
use crate::pagination::KeysetPosition;
use crate::state_machine::ApplicationStatus;
use async_trait::async_trait;
use std::future::Future;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// Short cause safe to show callers; the full error stays in the logs
    pub fn public_cause(&self) -> &'static str {
        match self {
            Self::UniqueViolation { .. } => "a unique value is already taken",
            Self::ForeignKeyViolation { .. } => "a referenced record is missing",
            Self::Database(_) => "storage failure",
        }
    }

    /// Constraint violations mean the request collided with existing data
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::UniqueViolation { .. } | Self::ForeignKeyViolation { .. }
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            match db.code().as_deref() {
                Some("23505") => return Self::UniqueViolation { constraint },
                Some("23503") => return Self::ForeignKeyViolation { constraint },
                _ => {}
            }
        }
        Self::Database(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a conditional status write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionWrite {
    Applied,
    /// The stored status moved since it was read; nothing was written
    Stale { current: ApplicationStatus },
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Insert, or replace the row with the same id
    async fn save_user(&self, user: &User) -> StoreResult<()>;

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>>;

    /// Fails with `UniqueViolation` when the name is taken
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;

    async fn update_product(&self, product: &Product) -> StoreResult<()>;

    async fn list_products(&self, offset: u64, limit: u32) -> StoreResult<(Vec<Product>, u64)>;

    /// Remove the product with its applications and assignments in one unit
    async fn delete_product_cascade(
        &self,
        id: Uuid,
        retention: HistoryRetention,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn find_application(&self, id: Uuid) -> StoreResult<Option<Application>>;

    /// Write the application, its documents, its tag links and the creation
    /// history record together
    async fn insert_application(
        &self,
        application: &Application,
        initial: &ApplicationHistory,
    ) -> StoreResult<()>;

    /// Write the status/updated_at change and its history record together,
    /// provided the stored status still equals `entry.old_status`
    async fn record_transition(
        &self,
        application: &Application,
        entry: &ApplicationHistory,
    ) -> StoreResult<TransitionWrite>;

    /// Link tags; links that already exist are kept as they are
    async fn add_tags(&self, application_id: Uuid, tags: &[Tag]) -> StoreResult<()>;

    /// Unlink tags by name; names not linked are ignored
    async fn remove_tags(&self, application_id: Uuid, names: &[String]) -> StoreResult<()>;

    async fn delete_application(
        &self,
        id: Uuid,
        retention: HistoryRetention,
    ) -> StoreResult<bool>;

    /// Ordered by created_at desc, id desc
    async fn list_applications(
        &self,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Application>, u64)>;

    async fn list_applications_by_tag(
        &self,
        tag_name: &str,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Application>, u64)>;

    /// Keyset scan: rows strictly after `position` in (created_at desc, id desc)
    /// order, or from the start when `position` is `None`
    async fn find_after(
        &self,
        position: Option<KeysetPosition>,
        limit: u32,
    ) -> StoreResult<Vec<Application>>;

    /// Newest first; includes retained rows of deleted applications
    async fn history_for(&self, application_id: Uuid) -> StoreResult<Vec<ApplicationHistory>>;

    async fn count_by_applicant(&self, user_id: Uuid) -> StoreResult<u64>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    /// Atomic insert-if-absent; concurrent callers for one name observe one row
    async fn find_or_insert_tag(&self, name: &str) -> StoreResult<Tag>;

    async fn find_tag(&self, name: &str) -> StoreResult<Option<Tag>>;

    async fn list_tags(&self, offset: u64, limit: u32) -> StoreResult<(Vec<Tag>, u64)>;
}

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Insert, or overwrite role and assigned_at of the existing (user, product) row.
    /// Returns the stored row, keeping the original id on overwrite.
    async fn upsert_assignment(
        &self,
        assignment: &UserProductAssignment,
    ) -> StoreResult<UserProductAssignment>;

    async fn has_assignment(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        role: AssignmentRole,
    ) -> StoreResult<bool>;

    async fn list_assignments(
        &self,
        user_id: Option<Uuid>,
        product_id: Option<Uuid>,
    ) -> StoreResult<Vec<UserProductAssignment>>;

    async fn delete_assignments(
        &self,
        user_id: Option<Uuid>,
        product_id: Option<Uuid>,
    ) -> StoreResult<u64>;

    async fn count_assignments_by_user(&self, user_id: Uuid) -> StoreResult<u64>;
}

/// Everything the services need from storage
pub trait TicketStore: UserStore + ProductStore + ApplicationStore + TagStore + AssignmentStore {}

impl<T> TicketStore for T where
    T: UserStore + ProductStore + ApplicationStore + TagStore + AssignmentStore
{
}

/// Re-run `op` while it loses a uniqueness race, up to `limit` attempts.
///
/// A concurrent insert of the same natural key is benign for idempotent
/// operations: the next attempt finds the winner's row.
pub async fn retry_on_unique_violation<T, F, Fut>(
    limit: u32,
    operation: &str,
    mut op: F,
) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(StoreError::UniqueViolation { constraint }) if attempt < limit => {
                tracing::warn!(
                    operation = %operation,
                    attempt = attempt,
                    constraint = %constraint,
                    "Uniqueness race detected, retrying"
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_recovers_from_transient_violation() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_on_unique_violation(3, "test", || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StoreError::UniqueViolation {
                    constraint: "uq_tag_name".into(),
                })
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_limit() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: StoreResult<()> = retry_on_unique_violation(2, "test", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::UniqueViolation {
                constraint: "uq".into(),
            })
        })
        .await;

        assert!(result.unwrap_err().is_unique_violation());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_does_not_retry_other_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: StoreResult<()> = retry_on_unique_violation(5, "test", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Database("down".into()))
        })
        .await;

        assert_eq!(result, Err(StoreError::Database("down".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
