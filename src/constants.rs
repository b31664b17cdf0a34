//! # System Constants
//!
//! Operational boundaries of the ticket core: page-size caps, cursor format
//! details and configuration names.

/// Largest page an offset listing will serve; larger requests are rejected.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Largest batch the keyset stream will serve; larger requests are clamped.
pub const STREAM_MAX_LIMIT: u32 = 50;

/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Separator between the timestamp and the id inside a decoded cursor.
pub const CURSOR_SEPARATOR: char = '|';

/// Maximum length of the free-text comment on an application.
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Attempts made when a benign uniqueness race is reported by the store.
pub const DEFAULT_UNIQUE_RETRY_LIMIT: u32 = 3;

/// Environment variable prefix for configuration overrides (`TICKET_*`).
pub const ENV_PREFIX: &str = "TICKET";

pub mod messages {
    pub const ACTOR_REQUIRED: &str = "You must specify the actorId to authorize in this request";
    pub const INVALID_CURSOR: &str = "invalid cursor";
}
