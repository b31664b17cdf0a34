//! # Error Taxonomy
//!
//! Caller-facing failures of the ticket core. Storage failures never cross this
//! boundary verbatim: services translate them into [`TicketError::Conflict`]
//! with a message naming the operation that failed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    /// Malformed or missing input (missing ids, oversized page, bad cursor).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The caller did not identify itself.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A referenced actor, application, product, user or tag does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller is identified but lacks the role or relationship required.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A valid request that violates a business rule or failed mid-write.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl TicketError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Stable machine-readable code for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
        }
    }

    /// HTTP status a request layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
        }
    }

    /// The human-readable message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::NotFound(m)
            | Self::Forbidden(m)
            | Self::Conflict(m) => m,
        }
    }

    /// True when the failure was raised before any write was attempted.
    ///
    /// Only `Conflict` may originate mid-operation; the transaction boundary
    /// guarantees nothing from that attempt survived either way.
    pub fn is_pre_write(&self) -> bool {
        !matches!(self, Self::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, TicketError>;
