use super::role::AssignmentRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a user over a product. At most one row exists per (user, product);
/// re-assigning overwrites `role` and `assigned_at` on that row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProductAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub role: AssignmentRole,
    pub assigned_at: DateTime<Utc>,
}

impl UserProductAssignment {
    pub fn new(user_id: Uuid, product_id: Uuid, role: AssignmentRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            role,
            assigned_at: crate::models::now(),
        }
    }
}
