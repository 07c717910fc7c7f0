use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A user account permitted to act on behalf of a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthorizedUser {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
}

/// Vendor (dealer) record. `has_orders` is a derived cache flag: true iff at
/// least one linked import request is still pending; the approval engine
/// keeps it consistent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Vendor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub has_orders: bool,
    #[serde(default)]
    pub authorized_users: Vec<AuthorizedUser>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
