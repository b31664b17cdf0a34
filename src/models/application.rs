//! # Application Model
//!
//! The central aggregate: a request submitted by a user against a product,
//! tracked through review states.
//!
//! An application exclusively owns its documents (their lifetime ends with
//! the application) and holds non-owning references to its applicant and its
//! product. Tags are shared with other applications.

use super::tag::Tag;
use crate::pagination::KeysetPosition;
use crate::state_machine::ApplicationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata of a document attached at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub application_id: Uuid,
    pub file_name: String,
    pub content_type: Option<String>,
    pub storage_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub product_id: Uuid,
    pub status: ApplicationStatus,
    pub comment: Option<String>,
    /// Set once, server-side, at creation
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub documents: Vec<Document>,
    pub tags: Vec<Tag>,
}

impl Application {
    /// Build a freshly submitted application with server-assigned identity
    pub fn submit(
        applicant_id: Uuid,
        product_id: Uuid,
        comment: Option<String>,
        documents: Vec<DocumentRequest>,
        tags: Vec<Tag>,
    ) -> Self {
        let id = Uuid::new_v4();
        let documents = documents
            .into_iter()
            .map(|doc| Document {
                id: Uuid::new_v4(),
                application_id: id,
                file_name: doc.file_name,
                content_type: doc.content_type,
                storage_path: doc.storage_path,
            })
            .collect();

        let mut application = Self {
            id,
            applicant_id,
            product_id,
            status: ApplicationStatus::Submitted,
            comment,
            created_at: crate::models::now(),
            updated_at: None,
            documents,
            tags: Vec::new(),
        };
        application.add_tags(tags);
        application
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    /// Set semantics: tags already present are skipped
    pub fn add_tags(&mut self, tags: impl IntoIterator<Item = Tag>) {
        for tag in tags {
            if !self.has_tag(&tag.name) {
                self.tags.push(tag);
            }
        }
    }

    /// Tags not present are ignored
    pub fn remove_tags(&mut self, names: &[String]) {
        self.tags.retain(|t| !names.contains(&t.name));
    }

    pub fn tag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tags.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }

    /// Position of this application in the (created_at desc, id desc) order
    pub fn keyset_position(&self) -> KeysetPosition {
        KeysetPosition::new(self.created_at, self.id)
    }

    pub fn view(&self) -> ApplicationView {
        ApplicationView::from(self)
    }
}

/// Client input for a document attached at creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub file_name: String,
    pub content_type: Option<String>,
    pub storage_path: Option<String>,
}

/// Client input for creating an application.
///
/// `id`, `created_at` and `status` are server-assigned; they exist here only so
/// that a request supplying them can be refused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    pub applicant_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentRequest>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateApplicationRequest {
    pub fn new(applicant_id: Uuid, product_id: Uuid) -> Self {
        Self {
            applicant_id: Some(applicant_id),
            product_id: Some(product_id),
            ..Default::default()
        }
    }

    pub fn with_documents(mut self, documents: Vec<DocumentRequest>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: Option<String>,
    pub storage_path: Option<String>,
}

/// Read-side shape of an application returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub product_id: Uuid,
    pub status: ApplicationStatus,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub documents: Vec<DocumentView>,
    pub tags: Vec<String>,
}

impl ApplicationView {
    pub fn keyset_position(&self) -> KeysetPosition {
        KeysetPosition::new(self.created_at, self.id)
    }
}

impl From<&Application> for ApplicationView {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id,
            applicant_id: app.applicant_id,
            product_id: app.product_id,
            status: app.status,
            comment: app.comment.clone(),
            created_at: app.created_at,
            updated_at: app.updated_at,
            documents: app
                .documents
                .iter()
                .map(|d| DocumentView {
                    id: d.id,
                    file_name: d.file_name.clone(),
                    content_type: d.content_type.clone(),
                    storage_path: d.storage_path.clone(),
                })
                .collect(),
            tags: app.tag_names(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_assigns_server_fields() {
        let docs = vec![DocumentRequest {
            file_name: "passport.pdf".into(),
            content_type: Some("application/pdf".into()),
            storage_path: None,
        }];
        let app = Application::submit(Uuid::new_v4(), Uuid::new_v4(), None, docs, vec![]);

        assert_eq!(app.status, ApplicationStatus::Submitted);
        assert!(app.updated_at.is_none());
        assert_eq!(app.documents.len(), 1);
        assert_eq!(app.documents[0].application_id, app.id);
    }

    #[test]
    fn test_tag_set_semantics() {
        let mut app = Application::submit(Uuid::new_v4(), Uuid::new_v4(), None, vec![], vec![]);
        let urgent = Tag::new("urgent");

        app.add_tags(vec![urgent.clone(), urgent.clone(), Tag::new("vip")]);
        assert_eq!(app.tag_names(), vec!["urgent", "vip"]);

        app.remove_tags(&["urgent".to_string(), "missing".to_string()]);
        assert_eq!(app.tag_names(), vec!["vip"]);
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let json = serde_json::json!({
            "applicantId": Uuid::nil(),
            "productId": Uuid::nil(),
            "documents": [{"fileName": "a.pdf"}]
        });
        let req: CreateApplicationRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.applicant_id, Some(Uuid::nil()));
        assert!(req.status.is_none());
        assert_eq!(req.documents[0].file_name, "a.pdf");
        assert!(req.tags.is_empty());
    }
}
