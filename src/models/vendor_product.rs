use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-(vendor, product) stock ledger entry, keyed by
/// `"{vendor_id}_{product_id}"`. Created lazily on the first approval for
/// the pair and incremented by every later one; its lifecycle is owned
/// entirely by the approval engine.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VendorProduct {
    pub id: String,
    pub vendor_id: String,
    pub product_id: String,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VendorProduct {
    pub fn ledger_id(vendor_id: &str, product_id: &str) -> String {
        format!("{vendor_id}_{product_id}")
    }
}
