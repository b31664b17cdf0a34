use super::{read_failure, write_failure, ActorDirectory};
use crate::error::{Result, TicketError};
use crate::models::{User, UserRole};
use crate::repository::TicketStore;
use crate::state_machine::ensure_admin;
use std::sync::Arc;
use uuid::Uuid;

/// Account administration. Every operation requires an ADMIN actor.
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn TicketStore>,
    actors: ActorDirectory,
}

impl AdminService {
    pub fn new(store: Arc<dyn TicketStore>, actors: ActorDirectory) -> Self {
        Self { store, actors }
    }

    pub async fn promote_to_manager(&self, actor_id: Option<Uuid>, user_id: Uuid) -> Result<User> {
        self.set_role(actor_id, user_id, UserRole::Manager).await
    }

    pub async fn demote_to_user(&self, actor_id: Option<Uuid>, user_id: Uuid) -> Result<User> {
        self.set_role(actor_id, user_id, UserRole::User).await
    }

    /// Refused while the user still has applications or assignments
    pub async fn delete_user(&self, actor_id: Option<Uuid>, user_id: Uuid) -> Result<()> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        ensure_admin(actor, "delete users")?;
        self.actors.find_user(user_id).await?;

        let applications = self
            .store
            .count_by_applicant(user_id)
            .await
            .map_err(|e| read_failure("count applications", e))?;
        let assignments = self
            .store
            .count_assignments_by_user(user_id)
            .await
            .map_err(|e| read_failure("count assignments", e))?;
        if applications > 0 || assignments > 0 {
            return Err(TicketError::conflict(format!(
                "User has dependencies: applications={applications}, assignments={assignments}"
            )));
        }

        self.store
            .delete_user(user_id)
            .await
            .map_err(|e| write_failure("delete user", e))?;

        tracing::info!(user_id = %user_id, actor_id = %actor.id, "User deleted");
        Ok(())
    }

    /// Admin accounts are returned untouched
    async fn set_role(&self, actor_id: Option<Uuid>, user_id: Uuid, role: UserRole) -> Result<User> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        ensure_admin(actor, "change user roles")?;
        let mut user = self.actors.find_user(user_id).await?;

        if user.role.is_admin() || user.role == role {
            return Ok(user);
        }

        let previous = user.role;
        user.role = role;
        user.updated_at = Some(crate::models::now());
        self.store
            .save_user(&user)
            .await
            .map_err(|e| write_failure("change user role", e))?;

        tracing::info!(
            user_id = %user.id,
            from = %previous,
            to = %role,
            actor_id = %actor.id,
            "User role changed"
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryStore, UserStore};

    async fn setup() -> (AdminService, Arc<InMemoryStore>, User) {
        let store = Arc::new(InMemoryStore::new());
        let admin = User::new("root", "root@example.com", UserRole::Admin);
        store.save_user(&admin).await.unwrap();

        let shared: Arc<dyn TicketStore> = store.clone();
        let service = AdminService::new(shared.clone(), ActorDirectory::new(shared));
        (service, store, admin)
    }

    #[tokio::test]
    async fn test_promote_and_demote() {
        let (service, store, admin) = setup().await;
        let user = User::new("bob", "bob@example.com", UserRole::User);
        store.save_user(&user).await.unwrap();

        let promoted = service.promote_to_manager(Some(admin.id), user.id).await.unwrap();
        assert_eq!(promoted.role, UserRole::Manager);
        assert!(promoted.updated_at.is_some());

        let demoted = service.demote_to_user(Some(admin.id), user.id).await.unwrap();
        assert_eq!(demoted.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_admins_are_left_untouched() {
        let (service, store, admin) = setup().await;
        let other_admin = User::new("ops", "ops@example.com", UserRole::Admin);
        store.save_user(&other_admin).await.unwrap();

        let result = service
            .demote_to_user(Some(admin.id), other_admin.id)
            .await
            .unwrap();
        assert_eq!(result.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let (service, store, _) = setup().await;
        let manager = User::new("m", "m@example.com", UserRole::Manager);
        store.save_user(&manager).await.unwrap();

        let err = service
            .promote_to_manager(Some(manager.id), manager.id)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_user_without_dependents() {
        let (service, store, admin) = setup().await;
        let user = User::new("temp", "temp@example.com", UserRole::User);
        store.save_user(&user).await.unwrap();

        service.delete_user(Some(admin.id), user.id).await.unwrap();
        assert!(store.find_user(user.id).await.unwrap().is_none());
    }
}
