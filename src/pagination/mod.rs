//! # Pagination
//!
//! Two read protocols over applications:
//!
//! - **Offset pages** ([`PageRequest`], [`Page`]): page/size addressing with
//!   a hard upper bound; oversized requests are rejected.
//! - **Keyset stream** ([`Cursor`], [`StreamPage`]): forward-only traversal in
//!   (created_at desc, id desc) order that neither skips nor repeats rows when
//!   new applications are inserted between fetches. Oversized batch requests
//!   are clamped, not rejected.

pub mod cursor;
pub mod page;

pub use cursor::{Cursor, CursorError, KeysetPosition};
pub use page::{clamp_stream_limit, Page, PageRequest, StreamPage};
