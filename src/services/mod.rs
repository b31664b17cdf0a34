//! # Ticket Services
//!
//! The operations a request layer calls. Every service resolves the actor,
//! runs its authorization and existence checks, and only then writes.
//! Storage failures are translated here and never reach callers verbatim.

pub mod actor_directory;
pub mod admin_service;
pub mod application_service;
pub mod assignment_service;
pub mod product_service;
pub mod tag_registry;

pub use actor_directory::ActorDirectory;
pub use admin_service::AdminService;
pub use application_service::ApplicationService;
pub use assignment_service::AssignmentService;
pub use product_service::ProductService;
pub use tag_registry::TagRegistry;

use crate::config::TicketConfig;
use crate::error::TicketError;
use crate::repository::{StoreError, TicketStore};
use std::sync::Arc;

/// Every service wired over one shared store
#[derive(Clone)]
pub struct TicketServices {
    pub actors: ActorDirectory,
    pub tags: TagRegistry,
    pub applications: ApplicationService,
    pub assignments: AssignmentService,
    pub products: ProductService,
    pub admin: AdminService,
}

impl TicketServices {
    pub fn new(store: Arc<dyn TicketStore>, config: &TicketConfig) -> Self {
        let actors = ActorDirectory::new(store.clone());
        let tags = TagRegistry::new(store.clone(), config);
        let assignments = AssignmentService::new(store.clone(), actors.clone(), config);

        Self {
            applications: ApplicationService::new(
                store.clone(),
                actors.clone(),
                tags.clone(),
                config,
            ),
            products: ProductService::new(
                store.clone(),
                actors.clone(),
                assignments.clone(),
                config,
            ),
            admin: AdminService::new(store, actors.clone()),
            actors,
            tags,
            assignments,
        }
    }
}

/// A lookup failed; the cause is logged, not returned
pub(crate) fn read_failure(operation: &str, err: StoreError) -> TicketError {
    tracing::warn!(operation = %operation, error = %err, "Store read failed");
    TicketError::conflict("storage unavailable")
}

/// A write failed; the message names the operation and a short cause
pub(crate) fn write_failure(operation: &str, err: StoreError) -> TicketError {
    tracing::warn!(operation = %operation, error = %err, "Store write failed");
    TicketError::conflict(format!("Failed to {operation}: {}", err.public_cause()))
}

/// A compound write failed; the message names only the outer operation
pub(crate) fn operation_failure(operation: &str, err: StoreError) -> TicketError {
    tracing::warn!(operation = %operation, error = %err, "Store operation failed");
    TicketError::conflict(format!("Failed to {operation}"))
}
