use super::read_failure;
use crate::constants::messages::ACTOR_REQUIRED;
use crate::error::{Result, TicketError};
use crate::models::{Actor, User};
use crate::repository::TicketStore;
use std::sync::Arc;
use uuid::Uuid;

/// Resolves actor ids to roles for authorization.
///
/// A missing id is `Unauthorized`; an id with no user behind it is `NotFound`.
#[derive(Clone)]
pub struct ActorDirectory {
    store: Arc<dyn TicketStore>,
}

impl ActorDirectory {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_actor(&self, actor_id: Option<Uuid>) -> Result<Actor> {
        let actor_id = actor_id.ok_or_else(|| TicketError::unauthorized(ACTOR_REQUIRED))?;

        let user = self
            .store
            .find_user(actor_id)
            .await
            .map_err(|e| read_failure("resolve actor", e))?
            .ok_or_else(|| TicketError::not_found(format!("Actor not found: {actor_id}")))?;

        Ok(user.actor())
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<User> {
        self.store
            .find_user(user_id)
            .await
            .map_err(|e| read_failure("find user", e))?
            .ok_or_else(|| TicketError::not_found(format!("User not found: {user_id}")))
    }
}
