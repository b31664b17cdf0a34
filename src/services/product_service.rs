use super::{operation_failure, read_failure, ActorDirectory, AssignmentService};
use crate::config::{HistoryRetention, TicketConfig};
use crate::error::{Result, TicketError};
use crate::models::{NewProduct, Product, ProductChanges};
use crate::pagination::{Page, PageRequest};
use crate::repository::{StoreError, TicketStore};
use std::sync::Arc;
use uuid::Uuid;

/// Product catalogue. Updates and deletes require elevated rights on the product.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn TicketStore>,
    actors: ActorDirectory,
    assignments: AssignmentService,
    default_page_size: u32,
    max_page_size: u32,
    history_retention: HistoryRetention,
}

impl ProductService {
    pub fn new(
        store: Arc<dyn TicketStore>,
        actors: ActorDirectory,
        assignments: AssignmentService,
        config: &TicketConfig,
    ) -> Self {
        Self {
            store,
            actors,
            assignments,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
            history_retention: config.history_retention,
        }
    }

    pub async fn create(&self, new_product: NewProduct) -> Result<Product> {
        if new_product.name.trim().is_empty() {
            return Err(TicketError::bad_request("Product name must not be blank"));
        }

        let product = Product {
            id: Uuid::new_v4(),
            name: new_product.name,
            description: new_product.description,
        };
        self.store
            .insert_product(&product)
            .await
            .map_err(|e| name_taken_or_failure(e, &product.name, "create product"))?;

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub async fn get(&self, product_id: Uuid) -> Result<Product> {
        self.store
            .find_product(product_id)
            .await
            .map_err(|e| read_failure("find product", e))?
            .ok_or_else(|| TicketError::not_found(format!("Product not found: {product_id}")))
    }

    pub async fn list(
        &self,
        page: u32,
        size: impl Into<Option<u32>>,
    ) -> Result<Page<Product>> {
        let request = PageRequest::with_default(
            page,
            size.into(),
            self.default_page_size,
            self.max_page_size,
        )?;
        let (products, total) = self
            .store
            .list_products(request.offset(), request.size)
            .await
            .map_err(|e| read_failure("list products", e))?;

        Ok(Page::new(products, total, request))
    }

    pub async fn update_product(
        &self,
        product_id: Uuid,
        changes: ProductChanges,
        actor_id: Option<Uuid>,
    ) -> Result<Product> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        let mut product = self.get(product_id).await?;
        self.assignments
            .ensure_elevated(actor, product_id, "update product")
            .await?;

        if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(TicketError::bad_request("Product name must not be blank"));
        }

        product.apply(changes);
        self.store
            .update_product(&product)
            .await
            .map_err(|e| name_taken_or_failure(e, &product.name, "update product"))?;

        tracing::info!(product_id = %product.id, actor_id = %actor.id, "Product updated");
        Ok(product)
    }

    /// Remove the product together with its applications and assignments
    pub async fn delete_product(&self, product_id: Uuid, actor_id: Option<Uuid>) -> Result<()> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        self.get(product_id).await?;
        self.assignments
            .ensure_elevated(actor, product_id, "delete product")
            .await?;

        let deleted = self
            .store
            .delete_product_cascade(product_id, self.history_retention)
            .await
            .map_err(|e| operation_failure("delete product and its applications", e))?;
        if !deleted {
            return Err(TicketError::not_found(format!(
                "Product not found: {product_id}"
            )));
        }

        tracing::info!(product_id = %product_id, actor_id = %actor.id, "Product deleted");
        Ok(())
    }
}

fn name_taken_or_failure(err: StoreError, name: &str, operation: &str) -> TicketError {
    if err.is_unique_violation() {
        TicketError::conflict(format!("Product name already exists: {name}"))
    } else {
        super::write_failure(operation, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, UserRole};
    use crate::repository::{InMemoryStore, UserStore};

    async fn setup() -> (ProductService, User, User) {
        let store = Arc::new(InMemoryStore::new());
        let admin = User::new("admin", "admin@example.com", UserRole::Admin);
        let manager = User::new("manager", "manager@example.com", UserRole::Manager);
        store.save_user(&admin).await.unwrap();
        store.save_user(&manager).await.unwrap();

        let config = TicketConfig::default();
        let shared: Arc<dyn TicketStore> = store;
        let actors = ActorDirectory::new(shared.clone());
        let assignments = AssignmentService::new(shared.clone(), actors.clone(), &config);
        let service = ProductService::new(shared, actors, assignments, &config);
        (service, admin, manager)
    }

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: Some("test".into()),
        }
    }

    #[tokio::test]
    async fn test_duplicate_name_is_conflict() {
        let (service, _, _) = setup().await;
        service.create(new_product("Savings")).await.unwrap();

        let err = service.create(new_product("Savings")).await.unwrap_err();
        assert!(matches!(err, TicketError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_manager_without_ownership_cannot_update() {
        let (service, admin, manager) = setup().await;
        let product = service.create(new_product("Savings")).await.unwrap();
        let changes = ProductChanges {
            name: Some("Savings Plus".into()),
            description: None,
        };

        let err = service
            .update_product(product.id, changes.clone(), Some(manager.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::Forbidden(_)));

        let updated = service
            .update_product(product.id, changes, Some(admin.id))
            .await
            .unwrap();
        assert_eq!(updated.name, "Savings Plus");
        assert_eq!(updated.description.as_deref(), Some("test"));
    }

    #[tokio::test]
    async fn test_list_rejects_oversized_page() {
        let (service, _, _) = setup().await;
        let err = service.list(0, 51).await.unwrap_err();
        assert!(matches!(err, TicketError::BadRequest(_)));
    }
}
