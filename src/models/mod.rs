//! # Data Models
//!
//! Entities and transfer values of the ticket core.
//!
//! - [`application`] - the `Application` aggregate, its documents and views
//! - [`application_history`] - append-only status audit trail
//! - [`tag`] - deduplicated labels shared across applications
//! - [`assignment`] - per-product roles (`PRODUCT_OWNER`, `RESELLER`)
//! - [`user`] / [`product`] - referenced entities owned by outer plumbing
//! - [`role`] - closed role enums driving authorization

pub mod application;
pub mod application_history;
pub mod assignment;
pub mod product;
pub mod role;
pub mod tag;
pub mod user;

pub use application::{
    Application, ApplicationView, CreateApplicationRequest, Document, DocumentRequest,
    DocumentView,
};
pub use application_history::ApplicationHistory;
pub use assignment::UserProductAssignment;
pub use product::{NewProduct, Product, ProductChanges};
pub use role::{AssignmentRole, UserRole};
pub use tag::{Tag, TagWithApplications};
pub use user::{Actor, User};

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the precision the database stores (microseconds), so that
/// values written and read back compare equal and cursors stay exact.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
