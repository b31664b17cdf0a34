#![allow(dead_code)]

pub mod builders;

pub use builders::*;

use bank_ticket_core::config::TicketConfig;
use bank_ticket_core::repository::{InMemoryStore, TicketStore};
use bank_ticket_core::services::TicketServices;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique name with the given prefix, stable within one test binary
pub fn unique_name(prefix: &str) -> String {
    let n = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{n}")
}

/// Services wired over a fresh in-memory store
pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub services: TicketServices,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(TicketConfig::default())
    }

    pub fn with_config(config: TicketConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let shared: Arc<dyn TicketStore> = store.clone();
        let services = TicketServices::new(shared, &config);
        Self { store, services }
    }
}
