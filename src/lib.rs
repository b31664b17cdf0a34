#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Bank Ticket Core
//!
//! Application lifecycle engine for a bank ticket system: applications
//! submitted by users against products, reviewed through a set of statuses,
//! with every status change recorded in an append-only history.
//!
//! ## Overview
//!
//! The core owns the rules with real invariants and leaves everything else
//! (HTTP routing, registration, credentials) to the embedding service:
//!
//! - **Lifecycle**: create, tag, change status, delete and read history of
//!   applications, each gated by role and ownership checks
//! - **Audit**: exactly one history row per genuine status change, written in
//!   the same unit as the change itself
//! - **Keyset stream**: a forward-only traversal in (createdAt desc, id desc)
//!   order that never skips or repeats rows under concurrent inserts
//! - **Elevated rights**: ADMIN, or PRODUCT_OWNER of the product, gate product
//!   mutations and role assignment
//!
//! ## Module Organization
//!
//! - [`services`] - Operations called by the request layer
//! - [`state_machine`] - Application statuses, guards and transitions
//! - [`models`] - Entities, requests and views
//! - [`pagination`] - Offset pages, cursors and stream batches
//! - [`repository`] - Store traits with in-memory and PostgreSQL backends
//! - [`config`] - Layered configuration
//! - [`error`] - Caller-facing error taxonomy
//! - [`logging`] - Structured logging bootstrap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bank_ticket_core::config::TicketConfig;
//! use bank_ticket_core::repository::PgStore;
//! use bank_ticket_core::services::TicketServices;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! bank_ticket_core::logging::init_structured_logging();
//!
//! let config = TicketConfig::from_env()?;
//! let store = PgStore::connect(&config).await?;
//! store.migrate().await?;
//!
//! let services = TicketServices::new(Arc::new(store), &config);
//! let first_batch = services.applications.stream(None, 20).await?;
//! println!("{} applications, next cursor {:?}", first_batch.items.len(), first_batch.next_cursor);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                       # Unit and in-memory integration tests
//! cargo test -- --ignored          # PostgreSQL tests (needs DATABASE_URL)
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod services;
pub mod state_machine;

pub use config::{ConfigError, HistoryRetention, TicketConfig};
pub use error::{Result, TicketError};
pub use models::{
    Actor, Application, ApplicationHistory, ApplicationView, AssignmentRole,
    CreateApplicationRequest, DocumentRequest, Product, Tag, User, UserProductAssignment,
    UserRole,
};
pub use pagination::{Cursor, KeysetPosition, Page, StreamPage};
pub use repository::{InMemoryStore, PgStore, StoreError, TicketStore};
pub use services::{
    ActorDirectory, AdminService, ApplicationService, AssignmentService, ProductService,
    TagRegistry, TicketServices,
};
pub use state_machine::ApplicationStatus;
