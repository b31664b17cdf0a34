//! # PostgreSQL Store
//!
//! SQLx-backed implementation of the store traits. Multi-row writes run in a
//! single transaction; natural-key races are settled by `ON CONFLICT`.
//!
//! Enum columns are stored as TEXT and parsed on read, so a row holding an
//! unknown value surfaces as [`StoreError::Database`] instead of a panic.

use super::{
    ApplicationStore, AssignmentStore, ProductStore, StoreError, StoreResult, TagStore,
    TransitionWrite, UserStore,
};
use crate::config::{HistoryRetention, TicketConfig};
use crate::models::{
    Application, ApplicationHistory, AssignmentRole, Document, Product, Tag, User, UserProductAssignment,
    UserRole,
};
use crate::pagination::KeysetPosition;
use crate::state_machine::ApplicationStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const APPLICATION_COLUMNS: &str =
    "id, applicant_id, product_id, status, comment, created_at, updated_at";

const HISTORY_COLUMNS: &str =
    "id, application_id, old_status, new_status, changed_by, changed_at";

fn parse_column<T>(column: &str, value: &str) -> StoreResult<T>
where
    T: FromStr<Err = String>,
{
    T::from_str(value)
        .map_err(|e| StoreError::Database(format!("corrupt {column} column: {e}")))
}

fn limit_param(limit: u32) -> i64 {
    i64::from(limit)
}

fn offset_param(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            username: row.username,
            email: row.email,
            role: parse_column::<UserRole>("role", &row.role)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    applicant_id: Uuid,
    product_id: Uuid,
    status: String,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    application_id: Uuid,
    file_name: String,
    content_type: Option<String>,
    storage_path: Option<String>,
}

#[derive(Debug, FromRow)]
struct ApplicationTagRow {
    application_id: Uuid,
    id: Uuid,
    name: String,
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: Uuid,
    application_id: Uuid,
    old_status: Option<String>,
    new_status: String,
    changed_by: String,
    changed_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for ApplicationHistory {
    type Error = StoreError;

    fn try_from(row: HistoryRow) -> StoreResult<Self> {
        let old_status = row
            .old_status
            .as_deref()
            .map(|s| parse_column::<ApplicationStatus>("old_status", s))
            .transpose()?;
        Ok(Self {
            id: row.id,
            application_id: row.application_id,
            old_status,
            new_status: parse_column("new_status", &row.new_status)?,
            changed_by: parse_column("changed_by", &row.changed_by)?,
            changed_at: row.changed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    role: String,
    assigned_at: DateTime<Utc>,
}

impl TryFrom<AssignmentRow> for UserProductAssignment {
    type Error = StoreError;

    fn try_from(row: AssignmentRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            role: parse_column::<AssignmentRole>("role", &row.role)?,
            assigned_at: row.assigned_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CountRow {
    count: i64,
}

fn count_to_u64(row: CountRow) -> u64 {
    u64::try_from(row.count).unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &TicketConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            "Connected ticket store to PostgreSQL"
        );

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Attach documents and tags to application rows, preserving row order
    async fn hydrate(&self, rows: Vec<ApplicationRow>) -> StoreResult<Vec<Application>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let documents = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, application_id, file_name, content_type, storage_path
            FROM document
            WHERE application_id = ANY($1)
            ORDER BY file_name, id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let tags = sqlx::query_as::<_, ApplicationTagRow>(
            r#"
            SELECT at.application_id, t.id, t.name
            FROM application_tag at
            JOIN tag t ON t.id = at.tag_id
            WHERE at.application_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut documents_by_app: HashMap<Uuid, Vec<Document>> = HashMap::new();
        for doc in documents {
            documents_by_app
                .entry(doc.application_id)
                .or_default()
                .push(Document {
                    id: doc.id,
                    application_id: doc.application_id,
                    file_name: doc.file_name,
                    content_type: doc.content_type,
                    storage_path: doc.storage_path,
                });
        }

        let mut tags_by_app: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in tags {
            tags_by_app.entry(row.application_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
            });
        }

        rows.into_iter()
            .map(|row| {
                Ok(Application {
                    id: row.id,
                    applicant_id: row.applicant_id,
                    product_id: row.product_id,
                    status: parse_column("status", &row.status)?,
                    comment: row.comment,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                    documents: documents_by_app.remove(&row.id).unwrap_or_default(),
                    tags: tags_by_app.remove(&row.id).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn delete_application_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        retention: HistoryRetention,
    ) -> StoreResult<bool> {
        if retention == HistoryRetention::Cascade {
            sqlx::query("DELETE FROM application_history WHERE application_id = $1")
                .bind(id)
                .execute(&mut **tx)
                .await?;
        }

        // documents and tag links cascade
        let result = sqlx::query("DELETE FROM application WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, role, created_at, updated_at FROM app_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO app_user (id, username, email, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET username = EXCLUDED.username,
                email = EXCLUDED.email,
                role = EXCLUDED.role,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM app_user WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, description FROM product WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query("INSERT INTO product (id, name, description) VALUES ($1, $2, $3)")
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.description)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query("UPDATE product SET name = $2, description = $3 WHERE id = $1")
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.description)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_products(&self, offset: u64, limit: u32) -> StoreResult<(Vec<Product>, u64)> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description FROM product ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(limit_param(limit))
        .bind(offset_param(offset))
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_as::<_, CountRow>("SELECT COUNT(*) AS count FROM product")
            .fetch_one(&self.pool)
            .await?;

        Ok((products, count_to_u64(total)))
    }

    async fn delete_product_cascade(
        &self,
        id: Uuid,
        retention: HistoryRetention,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let application_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM application WHERE product_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        for application_id in application_ids {
            Self::delete_application_in(&mut tx, application_id, retention).await?;
        }

        sqlx::query("DELETE FROM user_product_assignment WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn find_application(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM application WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn insert_application(
        &self,
        application: &Application,
        initial: &ApplicationHistory,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO application
                (id, applicant_id, product_id, status, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(application.id)
        .bind(application.applicant_id)
        .bind(application.product_id)
        .bind(application.status.as_str())
        .bind(&application.comment)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&mut *tx)
        .await?;

        for doc in &application.documents {
            sqlx::query(
                r#"
                INSERT INTO document (id, application_id, file_name, content_type, storage_path)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(doc.id)
            .bind(application.id)
            .bind(&doc.file_name)
            .bind(&doc.content_type)
            .bind(&doc.storage_path)
            .execute(&mut *tx)
            .await?;
        }

        for tag in &application.tags {
            sqlx::query(
                "INSERT INTO application_tag (application_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(application.id)
            .bind(tag.id)
            .execute(&mut *tx)
            .await?;
        }

        insert_history(&mut tx, initial).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn record_transition(
        &self,
        application: &Application,
        entry: &ApplicationHistory,
    ) -> StoreResult<TransitionWrite> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-set on the status read by the caller
        let result = sqlx::query(
            "UPDATE application SET status = $2, updated_at = $3 WHERE id = $1 AND status = $4",
        )
        .bind(application.id)
        .bind(application.status.as_str())
        .bind(application.updated_at)
        .bind(entry.old_status.map(|s| s.as_str()))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM application WHERE id = $1")
                    .bind(application.id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return match current {
                Some(status) => Ok(TransitionWrite::Stale {
                    current: parse_column("status", &status)?,
                }),
                None => Err(StoreError::ForeignKeyViolation {
                    constraint: "application_history_application".into(),
                }),
            };
        }

        insert_history(&mut tx, entry).await?;

        tx.commit().await?;
        Ok(TransitionWrite::Applied)
    }

    async fn add_tags(&self, application_id: Uuid, tags: &[Tag]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        for tag in tags {
            sqlx::query(
                "INSERT INTO application_tag (application_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(application_id)
            .bind(tag.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_tags(&self, application_id: Uuid, names: &[String]) -> StoreResult<()> {
        sqlx::query(
            r#"
            DELETE FROM application_tag at
            USING tag t
            WHERE at.tag_id = t.id
              AND at.application_id = $1
              AND t.name = ANY($2)
            "#,
        )
        .bind(application_id)
        .bind(names)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_application(
        &self,
        id: Uuid,
        retention: HistoryRetention,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let deleted = Self::delete_application_in(&mut tx, id, retention).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn list_applications(
        &self,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Application>, u64)> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM application \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit_param(limit))
        .bind(offset_param(offset))
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_as::<_, CountRow>("SELECT COUNT(*) AS count FROM application")
            .fetch_one(&self.pool)
            .await?;

        Ok((self.hydrate(rows).await?, count_to_u64(total)))
    }

    async fn list_applications_by_tag(
        &self,
        tag_name: &str,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Application>, u64)> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT a.id, a.applicant_id, a.product_id, a.status, a.comment, a.created_at, a.updated_at
            FROM application a
            JOIN application_tag at ON at.application_id = a.id
            JOIN tag t ON t.id = at.tag_id
            WHERE t.name = $1
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tag_name)
        .bind(limit_param(limit))
        .bind(offset_param(offset))
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_as::<_, CountRow>(
            r#"
            SELECT COUNT(*) AS count
            FROM application_tag at
            JOIN tag t ON t.id = at.tag_id
            WHERE t.name = $1
            "#,
        )
        .bind(tag_name)
        .fetch_one(&self.pool)
        .await?;

        Ok((self.hydrate(rows).await?, count_to_u64(total)))
    }

    async fn find_after(
        &self,
        position: Option<KeysetPosition>,
        limit: u32,
    ) -> StoreResult<Vec<Application>> {
        let rows = match position {
            Some(position) => {
                sqlx::query_as::<_, ApplicationRow>(&format!(
                    "SELECT {APPLICATION_COLUMNS} FROM application \
                     WHERE (created_at, id) < ($1, $2) \
                     ORDER BY created_at DESC, id DESC LIMIT $3"
                ))
                .bind(position.created_at)
                .bind(position.id)
                .bind(limit_param(limit))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ApplicationRow>(&format!(
                    "SELECT {APPLICATION_COLUMNS} FROM application \
                     ORDER BY created_at DESC, id DESC LIMIT $1"
                ))
                .bind(limit_param(limit))
                .fetch_all(&self.pool)
                .await?
            }
        };

        self.hydrate(rows).await
    }

    async fn history_for(&self, application_id: Uuid) -> StoreResult<Vec<ApplicationHistory>> {
        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM application_history \
             WHERE application_id = $1 \
             ORDER BY changed_at DESC, seq DESC"
        ))
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ApplicationHistory::try_from).collect()
    }

    async fn count_by_applicant(&self, user_id: Uuid) -> StoreResult<u64> {
        let row = sqlx::query_as::<_, CountRow>(
            "SELECT COUNT(*) AS count FROM application WHERE applicant_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count_to_u64(row))
    }
}

async fn insert_history(
    tx: &mut Transaction<'_, Postgres>,
    entry: &ApplicationHistory,
) -> StoreResult<()> {
    sqlx::query(&format!(
        "INSERT INTO application_history ({HISTORY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
    ))
    .bind(entry.id)
    .bind(entry.application_id)
    .bind(entry.old_status.map(|s| s.as_str()))
    .bind(entry.new_status.as_str())
    .bind(entry.changed_by.as_str())
    .bind(entry.changed_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl TagStore for PgStore {
    async fn find_or_insert_tag(&self, name: &str) -> StoreResult<Tag> {
        // A concurrent insert of the same name blocks here until it commits
        sqlx::query("INSERT INTO tag (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(Uuid::new_v4())
            .bind(name)
            .execute(&self.pool)
            .await?;

        let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tag WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(tag)
    }

    async fn find_tag(&self, name: &str) -> StoreResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tag WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    async fn list_tags(&self, offset: u64, limit: u32) -> StoreResult<(Vec<Tag>, u64)> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT id, name FROM tag ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(limit_param(limit))
        .bind(offset_param(offset))
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_as::<_, CountRow>("SELECT COUNT(*) AS count FROM tag")
            .fetch_one(&self.pool)
            .await?;

        Ok((tags, count_to_u64(total)))
    }
}

#[async_trait]
impl AssignmentStore for PgStore {
    async fn upsert_assignment(
        &self,
        assignment: &UserProductAssignment,
    ) -> StoreResult<UserProductAssignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO user_product_assignment (id, user_id, product_id, role, assigned_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT uq_assignment_user_product DO UPDATE
            SET role = EXCLUDED.role,
                assigned_at = EXCLUDED.assigned_at
            RETURNING id, user_id, product_id, role, assigned_at
            "#,
        )
        .bind(assignment.id)
        .bind(assignment.user_id)
        .bind(assignment.product_id)
        .bind(assignment.role.as_str())
        .bind(assignment.assigned_at)
        .fetch_one(&self.pool)
        .await?;

        UserProductAssignment::try_from(row)
    }

    async fn has_assignment(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        role: AssignmentRole,
    ) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_product_assignment
                WHERE user_id = $1 AND product_id = $2 AND role = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_assignments(
        &self,
        user_id: Option<Uuid>,
        product_id: Option<Uuid>,
    ) -> StoreResult<Vec<UserProductAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, user_id, product_id, role, assigned_at
            FROM user_product_assignment
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR product_id = $2)
            ORDER BY assigned_at DESC
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(UserProductAssignment::try_from)
            .collect()
    }

    async fn delete_assignments(
        &self,
        user_id: Option<Uuid>,
        product_id: Option<Uuid>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_product_assignment
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR product_id = $2)
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_assignments_by_user(&self, user_id: Uuid) -> StoreResult<u64> {
        let row = sqlx::query_as::<_, CountRow>(
            "SELECT COUNT(*) AS count FROM user_product_assignment WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count_to_u64(row))
    }
}
