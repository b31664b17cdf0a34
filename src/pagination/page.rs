use crate::error::{Result, TicketError};
use serde::{Deserialize, Serialize};

/// Validated offset page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Oversized (or empty) pages are rejected rather than clamped
    pub fn new(page: u32, size: u32, max_size: u32) -> Result<Self> {
        if size > max_size {
            return Err(TicketError::bad_request(format!(
                "size cannot be greater than {max_size}"
            )));
        }
        if size == 0 {
            return Err(TicketError::bad_request("size must be at least 1"));
        }
        Ok(Self { page, size })
    }

    /// A missing size falls back to `default_size`; a given one is validated
    pub fn with_default(
        page: u32,
        size: Option<u32>,
        default_size: u32,
        max_size: u32,
    ) -> Result<Self> {
        Self::new(page, size.unwrap_or(default_size), max_size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of an offset listing plus the total row count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            size: request.size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.size.max(1)))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

/// One batch of the keyset stream.
///
/// `next_cursor` is derived from the last item; an empty batch means the end
/// of the stream and carries no cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> StreamPage<T> {
    pub fn is_end(&self) -> bool {
        self.items.is_empty()
    }
}

/// Stream batches are silently capped at `max_limit` and never empty-by-request
pub fn clamp_stream_limit(limit: u32, max_limit: u32) -> u32 {
    limit.clamp(1, max_limit.max(1))
}
