use super::{read_failure, write_failure, ActorDirectory};
use crate::config::TicketConfig;
use crate::error::{Result, TicketError};
use crate::models::{Actor, AssignmentRole, UserProductAssignment};
use crate::repository::{retry_on_unique_violation, TicketStore};
use crate::state_machine::is_elevated;
use std::sync::Arc;
use uuid::Uuid;

/// Per-product roles and the elevated-rights predicate built on them
#[derive(Clone)]
pub struct AssignmentService {
    store: Arc<dyn TicketStore>,
    actors: ActorDirectory,
    retry_limit: u32,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn TicketStore>, actors: ActorDirectory, config: &TicketConfig) -> Self {
        Self {
            store,
            actors,
            retry_limit: config.unique_retry_limit,
        }
    }

    /// ADMIN, or PRODUCT_OWNER of `product_id`
    pub async fn is_elevated(&self, actor_id: Option<Uuid>, product_id: Uuid) -> Result<bool> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        self.actor_is_elevated(actor, product_id).await
    }

    pub(crate) async fn actor_is_elevated(&self, actor: Actor, product_id: Uuid) -> Result<bool> {
        if actor.role.is_admin() {
            return Ok(true);
        }
        let owner = self
            .store
            .has_assignment(actor.id, product_id, AssignmentRole::ProductOwner)
            .await
            .map_err(|e| read_failure("check product ownership", e))?;
        Ok(is_elevated(actor.role, owner))
    }

    pub(crate) async fn ensure_elevated(
        &self,
        actor: Actor,
        product_id: Uuid,
        action: &str,
    ) -> Result<()> {
        if self.actor_is_elevated(actor, product_id).await? {
            return Ok(());
        }
        tracing::warn!(
            actor_id = %actor.id,
            product_id = %product_id,
            action = %action,
            "Refused: actor is neither admin nor product owner"
        );
        Err(TicketError::forbidden(format!(
            "Only ADMIN or PRODUCT_OWNER can {action}"
        )))
    }

    /// Give `user_id` a role on `product_id`, overwriting any existing role
    pub async fn assign(
        &self,
        actor_id: Option<Uuid>,
        user_id: Uuid,
        product_id: Uuid,
        role: AssignmentRole,
    ) -> Result<UserProductAssignment> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        self.actors.find_user(user_id).await?;
        self.store
            .find_product(product_id)
            .await
            .map_err(|e| read_failure("find product", e))?
            .ok_or_else(|| TicketError::not_found(format!("Product not found: {product_id}")))?;

        self.ensure_elevated(actor, product_id, "assign roles on this product")
            .await?;

        let store = &self.store;
        let stored = retry_on_unique_violation(self.retry_limit, "assign role", || async move {
            let assignment = UserProductAssignment::new(user_id, product_id, role);
            store.upsert_assignment(&assignment).await
        })
        .await
        .map_err(|e| write_failure("assign role", e))?;

        tracing::info!(
            assignment_id = %stored.id,
            user_id = %user_id,
            product_id = %product_id,
            role = %role,
            assigned_by = %actor.id,
            "Product role assigned"
        );
        Ok(stored)
    }

    pub async fn list(
        &self,
        user_id: Option<Uuid>,
        product_id: Option<Uuid>,
    ) -> Result<Vec<UserProductAssignment>> {
        self.store
            .list_assignments(user_id, product_id)
            .await
            .map_err(|e| read_failure("list assignments", e))
    }

    /// Remove matching assignments. With a product filter the actor must be
    /// elevated on that product; without one only an ADMIN may proceed.
    pub async fn delete_assignments(
        &self,
        actor_id: Option<Uuid>,
        user_id: Option<Uuid>,
        product_id: Option<Uuid>,
    ) -> Result<u64> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        match product_id {
            Some(product_id) => {
                self.ensure_elevated(actor, product_id, "remove roles on this product")
                    .await?
            }
            None if actor.role.is_admin() => {}
            None => {
                return Err(TicketError::forbidden(
                    "Only admins can remove assignments across products",
                ))
            }
        }

        let removed = self
            .store
            .delete_assignments(user_id, product_id)
            .await
            .map_err(|e| write_failure("remove assignments", e))?;

        tracing::info!(
            removed = removed,
            user_id = ?user_id,
            product_id = ?product_id,
            actor_id = %actor.id,
            "Assignments removed"
        );
        Ok(removed)
    }
}
