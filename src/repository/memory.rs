//! # In-Memory Store
//!
//! All relational tables live behind one `RwLock`, so every mutating call is
//! a single critical section and therefore atomic. The tag index is a
//! `DashMap` whose entry API gives insert-if-absent without a table lock.
//!
//! `fail_next_write` lets tests make the next mutation fail before anything
//! is written, to exercise the services' error translation.

use super::{
    ApplicationStore, AssignmentStore, ProductStore, StoreError, StoreResult, TagStore,
    TransitionWrite, UserStore,
};
use crate::config::HistoryRetention;
use crate::models::application_history::newest_first;
use crate::models::{
    Application, ApplicationHistory, AssignmentRole, Product, Tag, User, UserProductAssignment,
};
use crate::pagination::KeysetPosition;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    applications: HashMap<Uuid, Application>,
    /// Insertion order; never reordered
    history: Vec<ApplicationHistory>,
    assignments: HashMap<(Uuid, Uuid), UserProductAssignment>,
}

impl Tables {
    fn sorted_applications<'a>(
        &'a self,
        filter: impl Fn(&Application) -> bool,
    ) -> Vec<&'a Application> {
        let mut apps: Vec<&Application> =
            self.applications.values().filter(|a| filter(a)).collect();
        apps.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        apps
    }

    fn remove_application(&mut self, id: Uuid, retention: HistoryRetention) -> bool {
        let removed = self.applications.remove(&id).is_some();
        if removed && retention == HistoryRetention::Cascade {
            self.history.retain(|h| h.application_id != id);
        }
        removed
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    tags: DashMap<String, Tag>,
    injected_failure: Mutex<Option<StoreError>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next mutating call fail with `error` without writing anything
    pub fn fail_next_write(&self, error: StoreError) {
        *self.injected_failure.lock() = Some(error);
    }

    fn check_injected_failure(&self) -> StoreResult<()> {
        match self.injected_failure.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Number of history rows, including retained rows of deleted applications
    pub fn history_len(&self) -> usize {
        self.tables.read().history.len()
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}

fn page<T: Clone>(items: &[&T], offset: u64, limit: u32) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let start = usize::try_from(offset).unwrap_or(usize::MAX);
    let rows = items
        .iter()
        .skip(start)
        .take(limit as usize)
        .map(|item| (*item).clone())
        .collect();
    (rows, total)
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        let clash = tables.users.values().any(|u| {
            u.id != user.id && (u.username == user.username || u.email == user.email)
        });
        if clash {
            return Err(StoreError::UniqueViolation {
                constraint: "app_user_username_email".into(),
            });
        }

        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        let referenced = tables.applications.values().any(|a| a.applicant_id == id)
            || tables.assignments.keys().any(|(user_id, _)| *user_id == id);
        if referenced {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "fk_application_applicant".into(),
            });
        }

        Ok(tables.users.remove(&id).is_some())
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.tables.read().products.get(&id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        if tables.products.values().any(|p| p.name == product.name) {
            return Err(StoreError::UniqueViolation {
                constraint: "product_name_key".into(),
            });
        }

        tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        if tables
            .products
            .values()
            .any(|p| p.id != product.id && p.name == product.name)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "product_name_key".into(),
            });
        }

        tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn list_products(&self, offset: u64, limit: u32) -> StoreResult<(Vec<Product>, u64)> {
        let tables = self.tables.read();
        let mut products: Vec<&Product> = tables.products.values().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page(&products, offset, limit))
    }

    async fn delete_product_cascade(
        &self,
        id: Uuid,
        retention: HistoryRetention,
    ) -> StoreResult<bool> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        if !tables.products.contains_key(&id) {
            return Ok(false);
        }

        let application_ids: Vec<Uuid> = tables
            .applications
            .values()
            .filter(|a| a.product_id == id)
            .map(|a| a.id)
            .collect();
        for application_id in application_ids {
            tables.remove_application(application_id, retention);
        }

        tables.assignments.retain(|(_, product_id), _| *product_id != id);
        tables.products.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl ApplicationStore for InMemoryStore {
    async fn find_application(&self, id: Uuid) -> StoreResult<Option<Application>> {
        Ok(self.tables.read().applications.get(&id).cloned())
    }

    async fn insert_application(
        &self,
        application: &Application,
        initial: &ApplicationHistory,
    ) -> StoreResult<()> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        if !tables.users.contains_key(&application.applicant_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "fk_application_applicant".into(),
            });
        }
        if !tables.products.contains_key(&application.product_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "fk_application_product".into(),
            });
        }
        if tables.applications.contains_key(&application.id) {
            return Err(StoreError::UniqueViolation {
                constraint: "application_pkey".into(),
            });
        }

        tables
            .applications
            .insert(application.id, application.clone());
        tables.history.push(initial.clone());
        Ok(())
    }

    async fn record_transition(
        &self,
        application: &Application,
        entry: &ApplicationHistory,
    ) -> StoreResult<TransitionWrite> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        let stored = tables
            .applications
            .get_mut(&application.id)
            .ok_or_else(|| StoreError::ForeignKeyViolation {
                constraint: "fk_history_application".into(),
            })?;
        if entry.old_status != Some(stored.status) {
            return Ok(TransitionWrite::Stale {
                current: stored.status,
            });
        }
        stored.status = application.status;
        stored.updated_at = application.updated_at;

        tables.history.push(entry.clone());
        Ok(TransitionWrite::Applied)
    }

    async fn add_tags(&self, application_id: Uuid, tags: &[Tag]) -> StoreResult<()> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        let stored = tables
            .applications
            .get_mut(&application_id)
            .ok_or_else(|| StoreError::ForeignKeyViolation {
                constraint: "fk_application_tag_application".into(),
            })?;
        stored.add_tags(tags.iter().cloned());
        Ok(())
    }

    async fn remove_tags(&self, application_id: Uuid, names: &[String]) -> StoreResult<()> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        if let Some(stored) = tables.applications.get_mut(&application_id) {
            stored.remove_tags(names);
        }
        Ok(())
    }

    async fn delete_application(
        &self,
        id: Uuid,
        retention: HistoryRetention,
    ) -> StoreResult<bool> {
        self.check_injected_failure()?;
        Ok(self.tables.write().remove_application(id, retention))
    }

    async fn list_applications(
        &self,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Application>, u64)> {
        let tables = self.tables.read();
        let apps = tables.sorted_applications(|_| true);
        Ok(page(&apps, offset, limit))
    }

    async fn list_applications_by_tag(
        &self,
        tag_name: &str,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Application>, u64)> {
        let tables = self.tables.read();
        let apps = tables.sorted_applications(|a| a.has_tag(tag_name));
        Ok(page(&apps, offset, limit))
    }

    async fn find_after(
        &self,
        position: Option<KeysetPosition>,
        limit: u32,
    ) -> StoreResult<Vec<Application>> {
        let tables = self.tables.read();
        let apps = tables.sorted_applications(|a| match &position {
            Some(pos) => pos.precedes(a.created_at, a.id),
            None => true,
        });
        Ok(apps
            .into_iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn history_for(&self, application_id: Uuid) -> StoreResult<Vec<ApplicationHistory>> {
        let tables = self.tables.read();
        let entries = tables
            .history
            .iter()
            .filter(|h| h.application_id == application_id)
            .cloned()
            .collect();
        Ok(newest_first(entries))
    }

    async fn count_by_applicant(&self, user_id: Uuid) -> StoreResult<u64> {
        let tables = self.tables.read();
        Ok(tables
            .applications
            .values()
            .filter(|a| a.applicant_id == user_id)
            .count() as u64)
    }
}

#[async_trait]
impl TagStore for InMemoryStore {
    async fn find_or_insert_tag(&self, name: &str) -> StoreResult<Tag> {
        self.check_injected_failure()?;
        let tag = self
            .tags
            .entry(name.to_string())
            .or_insert_with(|| Tag::new(name))
            .clone();
        Ok(tag)
    }

    async fn find_tag(&self, name: &str) -> StoreResult<Option<Tag>> {
        Ok(self.tags.get(name).map(|t| t.value().clone()))
    }

    async fn list_tags(&self, offset: u64, limit: u32) -> StoreResult<(Vec<Tag>, u64)> {
        let mut tags: Vec<Tag> = self.tags.iter().map(|t| t.value().clone()).collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        let refs: Vec<&Tag> = tags.iter().collect();
        Ok(page(&refs, offset, limit))
    }
}

#[async_trait]
impl AssignmentStore for InMemoryStore {
    async fn upsert_assignment(
        &self,
        assignment: &UserProductAssignment,
    ) -> StoreResult<UserProductAssignment> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        let stored = tables
            .assignments
            .entry((assignment.user_id, assignment.product_id))
            .and_modify(|existing| {
                existing.role = assignment.role;
                existing.assigned_at = assignment.assigned_at;
            })
            .or_insert_with(|| assignment.clone())
            .clone();
        Ok(stored)
    }

    async fn has_assignment(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        role: AssignmentRole,
    ) -> StoreResult<bool> {
        Ok(self
            .tables
            .read()
            .assignments
            .get(&(user_id, product_id))
            .is_some_and(|a| a.role == role))
    }

    async fn list_assignments(
        &self,
        user_id: Option<Uuid>,
        product_id: Option<Uuid>,
    ) -> StoreResult<Vec<UserProductAssignment>> {
        let tables = self.tables.read();
        let mut rows: Vec<UserProductAssignment> = tables
            .assignments
            .values()
            .filter(|a| user_id.map_or(true, |id| a.user_id == id))
            .filter(|a| product_id.map_or(true, |id| a.product_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        Ok(rows)
    }

    async fn delete_assignments(
        &self,
        user_id: Option<Uuid>,
        product_id: Option<Uuid>,
    ) -> StoreResult<u64> {
        self.check_injected_failure()?;
        let mut tables = self.tables.write();

        let before = tables.assignments.len();
        tables.assignments.retain(|(u, p), _| {
            let user_matches = user_id.map_or(true, |id| *u == id);
            let product_matches = product_id.map_or(true, |id| *p == id);
            !(user_matches && product_matches)
        });
        Ok((before - tables.assignments.len()) as u64)
    }

    async fn count_assignments_by_user(&self, user_id: Uuid) -> StoreResult<u64> {
        Ok(self
            .tables
            .read()
            .assignments
            .keys()
            .filter(|(u, _)| *u == user_id)
            .count() as u64)
    }
}
