use super::{read_failure, write_failure};
use crate::config::TicketConfig;
use crate::error::{Result, TicketError};
use crate::models::{Tag, TagWithApplications};
use crate::pagination::{Page, PageRequest};
use crate::repository::{retry_on_unique_violation, TicketStore};
use std::sync::Arc;

/// Idempotent get-or-create of tags by name.
///
/// Concurrent calls for one name all observe the same stored tag: the store
/// performs an atomic insert-if-absent, and a lost uniqueness race is retried.
#[derive(Clone)]
pub struct TagRegistry {
    store: Arc<dyn TicketStore>,
    retry_limit: u32,
    default_page_size: u32,
    max_page_size: u32,
}

impl TagRegistry {
    pub fn new(store: Arc<dyn TicketStore>, config: &TicketConfig) -> Self {
        Self {
            store,
            retry_limit: config.unique_retry_limit,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    pub async fn create_if_not_exists(&self, name: &str) -> Result<Tag> {
        if name.trim().is_empty() {
            return Err(TicketError::bad_request("Tag name must not be blank"));
        }

        let store = &self.store;
        let tag = retry_on_unique_violation(self.retry_limit, "create tag", || async move {
            store.find_or_insert_tag(name).await
        })
        .await
        .map_err(|e| write_failure("create tag", e))?;

        tracing::debug!(tag_id = %tag.id, tag = %tag.name, "Tag resolved");
        Ok(tag)
    }

    /// Resolve every name, in order, skipping repeats
    pub async fn resolve_all(&self, names: &[String]) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = Vec::with_capacity(names.len());
        for name in names {
            if tags.iter().any(|t| &t.name == name) {
                continue;
            }
            tags.push(self.create_if_not_exists(name).await?);
        }
        Ok(tags)
    }

    pub async fn list(
        &self,
        page: u32,
        size: impl Into<Option<u32>>,
    ) -> Result<Page<Tag>> {
        let request = PageRequest::with_default(
            page,
            size.into(),
            self.default_page_size,
            self.max_page_size,
        )?;
        let (tags, total) = self
            .store
            .list_tags(request.offset(), request.size)
            .await
            .map_err(|e| read_failure("list tags", e))?;

        Ok(Page::new(tags, total, request))
    }

    pub async fn get_with_applications(&self, name: &str) -> Result<TagWithApplications> {
        let tag = self
            .store
            .find_tag(name)
            .await
            .map_err(|e| read_failure("find tag", e))?
            .ok_or_else(|| TicketError::not_found(format!("Tag not found: {name}")))?;

        let mut applications = Vec::new();
        let mut offset = 0u64;
        loop {
            let (batch, total) = self
                .store
                .list_applications_by_tag(&tag.name, offset, self.max_page_size)
                .await
                .map_err(|e| read_failure("list tagged applications", e))?;
            let fetched = batch.len() as u64;
            applications.extend(batch.iter().map(|app| app.view()));
            offset += fetched;
            if fetched == 0 || offset >= total {
                break;
            }
        }

        Ok(TagWithApplications {
            id: tag.id,
            name: tag.name,
            applications,
        })
    }
}
