//! # Application Lifecycle Engine
//!
//! Creation, tagging, status changes, deletion and history reads of
//! applications, plus the offset listings and the keyset stream.
//!
//! Authorization and existence checks always run before the first write.
//! Each write is a single store call, which the store commits atomically.

use super::{operation_failure, read_failure, write_failure, ActorDirectory, TagRegistry};
use crate::config::{HistoryRetention, TicketConfig};
use crate::constants::messages::INVALID_CURSOR;
use crate::constants::MAX_COMMENT_LENGTH;
use crate::error::{Result, TicketError};
use crate::logging::log_application_operation;
use crate::models::{
    Application, ApplicationHistory, ApplicationView, CreateApplicationRequest, UserRole,
};
use crate::pagination::{clamp_stream_limit, Cursor, Page, PageRequest, StreamPage};
use crate::repository::TicketStore;
use crate::state_machine::{
    ensure_admin, ensure_owner_or_reviewer, ensure_reviewer, ApplicationStateMachine,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn TicketStore>,
    actors: ActorDirectory,
    tags: TagRegistry,
    default_page_size: u32,
    max_page_size: u32,
    stream_max_limit: u32,
    history_retention: HistoryRetention,
}

impl ApplicationService {
    pub fn new(
        store: Arc<dyn TicketStore>,
        actors: ActorDirectory,
        tags: TagRegistry,
        config: &TicketConfig,
    ) -> Self {
        Self {
            store,
            actors,
            tags,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
            stream_max_limit: config.stream_max_limit,
            history_retention: config.history_retention,
        }
    }

    /// Submit a new application on behalf of its applicant
    pub async fn create(&self, request: CreateApplicationRequest) -> Result<ApplicationView> {
        if request.id.is_some() || request.created_at.is_some() || request.status.is_some() {
            return Err(TicketError::forbidden(
                "id, createdAt and status are assigned by the server",
            ));
        }

        let applicant_id = request
            .applicant_id
            .ok_or_else(|| TicketError::bad_request("applicantId is required"))?;
        let product_id = request
            .product_id
            .ok_or_else(|| TicketError::bad_request("productId is required"))?;

        if let Some(comment) = &request.comment {
            if comment.chars().count() > MAX_COMMENT_LENGTH {
                return Err(TicketError::bad_request(format!(
                    "comment must be at most {MAX_COMMENT_LENGTH} characters"
                )));
            }
        }
        if request.documents.iter().any(|d| d.file_name.trim().is_empty()) {
            return Err(TicketError::bad_request("document fileName is required"));
        }

        let applicant = self
            .store
            .find_user(applicant_id)
            .await
            .map_err(|e| read_failure("find applicant", e))?
            .ok_or_else(|| TicketError::not_found(format!("Applicant not found: {applicant_id}")))?;
        self.store
            .find_product(product_id)
            .await
            .map_err(|e| read_failure("find product", e))?
            .ok_or_else(|| TicketError::not_found(format!("Product not found: {product_id}")))?;

        let tags = self.tags.resolve_all(&request.tags).await?;

        let application = Application::submit(
            applicant.id,
            product_id,
            request.comment,
            request.documents,
            tags,
        );
        let initial =
            ApplicationHistory::initial(application.id, application.status, applicant.role);

        self.store
            .insert_application(&application, &initial)
            .await
            .map_err(|e| write_failure("create application", e))?;

        log_application_operation(
            "create",
            Some(application.id),
            Some(applicant.id),
            application.status.as_str(),
            None,
        );

        Ok(application.view())
    }

    pub async fn get(&self, application_id: Uuid) -> Result<ApplicationView> {
        Ok(self.load(application_id).await?.view())
    }

    pub async fn attach_tags(
        &self,
        application_id: Uuid,
        tag_names: &[String],
        actor_id: Option<Uuid>,
    ) -> Result<()> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        let application = self.load(application_id).await?;
        ensure_owner_or_reviewer(actor, &application)?;

        let tags = self.tags.resolve_all(tag_names).await?;
        self.store
            .add_tags(application.id, &tags)
            .await
            .map_err(|e| write_failure("attach tags", e))?;

        tracing::info!(
            application_id = %application.id,
            actor_id = %actor.id,
            tags = ?tag_names,
            "Tags attached"
        );
        Ok(())
    }

    pub async fn remove_tags(
        &self,
        application_id: Uuid,
        tag_names: &[String],
        actor_id: Option<Uuid>,
    ) -> Result<()> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        let application = self.load(application_id).await?;
        ensure_owner_or_reviewer(actor, &application)?;

        self.store
            .remove_tags(application.id, tag_names)
            .await
            .map_err(|e| write_failure("remove tags", e))?;

        tracing::info!(
            application_id = %application.id,
            actor_id = %actor.id,
            tags = ?tag_names,
            "Tags removed"
        );
        Ok(())
    }

    /// Move an application to `new_status`.
    ///
    /// Setting the current status again returns the unchanged view and
    /// writes nothing.
    pub async fn change_status(
        &self,
        application_id: Uuid,
        new_status: &str,
        actor_id: Option<Uuid>,
    ) -> Result<ApplicationView> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        if new_status.trim().is_empty() {
            return Err(TicketError::bad_request("Status must be provided"));
        }
        if let Err(err) = ensure_reviewer(actor) {
            tracing::warn!(
                application_id = %application_id,
                actor_id = %actor.id,
                role = %actor.role,
                "Status change refused"
            );
            return Err(err);
        }

        let application = self.load(application_id).await?;
        let target = ApplicationStateMachine::<dyn TicketStore>::parse_target(new_status)?;

        let machine = ApplicationStateMachine::new(application, &*self.store);
        let updated = machine.transition(target, actor).await?;

        log_application_operation(
            "change_status",
            Some(updated.id),
            Some(actor.id),
            updated.status.as_str(),
            None,
        );

        Ok(updated.view())
    }

    /// ADMIN only. History rows are kept or removed per the configured retention.
    pub async fn delete_application(
        &self,
        application_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<()> {
        let actor = self.actors.resolve_actor(actor_id).await?;
        ensure_admin(actor, "delete applications")?;
        let application = self.load(application_id).await?;

        let deleted = self
            .store
            .delete_application(application.id, self.history_retention)
            .await
            .map_err(|e| operation_failure("delete application", e))?;
        if !deleted {
            return Err(TicketError::not_found(format!(
                "Application not found: {application_id}"
            )));
        }

        log_application_operation(
            "delete",
            Some(application.id),
            Some(actor.id),
            application.status.as_str(),
            Some(match self.history_retention {
                HistoryRetention::Retain => "history retained",
                HistoryRetention::Cascade => "history removed",
            }),
        );
        Ok(())
    }

    /// Newest first. An ADMIN may still read the retained history of a
    /// deleted application.
    pub async fn list_history(
        &self,
        application_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<Vec<ApplicationHistory>> {
        let actor = self.actors.resolve_actor(actor_id).await?;

        let application = self
            .store
            .find_application(application_id)
            .await
            .map_err(|e| read_failure("find application", e))?;

        match &application {
            Some(application) => ensure_owner_or_reviewer(actor, application)?,
            None if actor.role == UserRole::Admin => {}
            None => return Err(application_not_found(application_id)),
        }

        let history = self
            .store
            .history_for(application_id)
            .await
            .map_err(|e| read_failure("list history", e))?;

        if application.is_none() && history.is_empty() {
            return Err(application_not_found(application_id));
        }
        Ok(history)
    }

    /// Offset listing; sizes above the configured maximum are rejected
    pub async fn list(
        &self,
        page: u32,
        size: impl Into<Option<u32>>,
    ) -> Result<Page<ApplicationView>> {
        let request = PageRequest::with_default(
            page,
            size.into(),
            self.default_page_size,
            self.max_page_size,
        )?;
        let (applications, total) = self
            .store
            .list_applications(request.offset(), request.size)
            .await
            .map_err(|e| read_failure("list applications", e))?;

        Ok(Page::new(applications, total, request).map(|app| app.view()))
    }

    pub async fn list_by_tag(
        &self,
        tag_name: &str,
        page: u32,
        size: impl Into<Option<u32>>,
    ) -> Result<Page<ApplicationView>> {
        let request = PageRequest::with_default(
            page,
            size.into(),
            self.default_page_size,
            self.max_page_size,
        )?;
        let (applications, total) = self
            .store
            .list_applications_by_tag(tag_name, request.offset(), request.size)
            .await
            .map_err(|e| read_failure("list applications by tag", e))?;

        Ok(Page::new(applications, total, request).map(|app| app.view()))
    }

    /// Keyset stream in (createdAt desc, id desc) order.
    ///
    /// An absent or blank cursor starts from the newest application; a cursor
    /// that does not decode is a `BadRequest`. `limit` is clamped, never
    /// rejected.
    pub async fn stream(
        &self,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<StreamPage<ApplicationView>> {
        let position = Cursor::decode_optional(cursor).map_err(|e| {
            tracing::debug!(error = %e, "Rejected stream cursor");
            TicketError::bad_request(INVALID_CURSOR)
        })?;
        let limit = clamp_stream_limit(limit, self.stream_max_limit);

        let applications = self
            .store
            .find_after(position, limit)
            .await
            .map_err(|e| read_failure("stream applications", e))?;

        let next_cursor = applications
            .last()
            .map(|app| Cursor::encode(&app.keyset_position()).into_string());

        tracing::debug!(
            returned = applications.len(),
            limit = limit,
            has_cursor = position.is_some(),
            "Streamed applications"
        );

        Ok(StreamPage {
            items: applications.iter().map(Application::view).collect(),
            next_cursor,
        })
    }

    async fn load(&self, application_id: Uuid) -> Result<Application> {
        self.store
            .find_application(application_id)
            .await
            .map_err(|e| read_failure("find application", e))?
            .ok_or_else(|| application_not_found(application_id))
    }
}

fn application_not_found(application_id: Uuid) -> TicketError {
    TicketError::not_found(format!("Application not found: {application_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentRequest, Product, User};
    use crate::repository::{InMemoryStore, ProductStore, UserStore};
    use crate::state_machine::ApplicationStatus;

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: ApplicationService,
        client: User,
        manager: User,
        product: Product,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let config = TicketConfig::default();
        let client = User::new("client", "client@example.com", UserRole::User);
        let manager = User::new("manager", "manager@example.com", UserRole::Manager);
        store.save_user(&client).await.unwrap();
        store.save_user(&manager).await.unwrap();
        let product = Product {
            id: Uuid::new_v4(),
            name: "Deposit".into(),
            description: None,
        };
        store.insert_product(&product).await.unwrap();

        let shared: Arc<dyn TicketStore> = store.clone();
        let actors = ActorDirectory::new(shared.clone());
        let tags = TagRegistry::new(shared.clone(), &config);
        let service = ApplicationService::new(shared, actors, tags, &config);

        Fixture {
            store,
            service,
            client,
            manager,
            product,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_server_assigned_fields_first() {
        let f = fixture().await;
        let mut request = CreateApplicationRequest::default();
        request.status = Some("APPROVED".into());

        let err = f.service.create(request).await.unwrap_err();
        assert!(matches!(err, TicketError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_validates_documents_and_comment() {
        let f = fixture().await;
        let blank_doc = CreateApplicationRequest::new(f.client.id, f.product.id)
            .with_documents(vec![DocumentRequest::default()]);
        assert!(matches!(
            f.service.create(blank_doc).await,
            Err(TicketError::BadRequest(_))
        ));

        let long_comment = CreateApplicationRequest::new(f.client.id, f.product.id)
            .with_comment("x".repeat(MAX_COMMENT_LENGTH + 1));
        assert!(matches!(
            f.service.create(long_comment).await,
            Err(TicketError::BadRequest(_))
        ));
        assert_eq!(f.store.history_len(), 0);
    }

    #[tokio::test]
    async fn test_blank_status_is_bad_request() {
        let f = fixture().await;
        let view = f
            .service
            .create(CreateApplicationRequest::new(f.client.id, f.product.id))
            .await
            .unwrap();

        let err = f
            .service
            .change_status(view.id, " ", Some(f.manager.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_unknown_status_is_conflict() {
        let f = fixture().await;
        let view = f
            .service
            .create(CreateApplicationRequest::new(f.client.id, f.product.id))
            .await
            .unwrap();

        let err = f
            .service
            .change_status(view.id, "approved", Some(f.manager.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::Conflict(_)));

        let stored = f.service.get(view.id).await.unwrap();
        assert_eq!(stored.status, ApplicationStatus::Submitted);
    }

    #[tokio::test]
    async fn test_stream_rejects_malformed_cursor() {
        let f = fixture().await;
        let err = f.service.stream(Some("not a cursor"), 10).await.unwrap_err();
        assert_eq!(err, TicketError::bad_request(INVALID_CURSOR));
    }
}
