//! Import request intake and listing. Requests are created by dealer-side
//! clients and finalized by the approval engine; creating one flips the
//! vendor's `has_orders` flag in the same commit.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::{ImportRequest, Product, RequestStatus, Vendor};
use crate::store::{collections, DocumentStore, QueryOp, WriteBatch};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateImportRequestInput {
    #[validate(length(min = 1, message = "product_id is required"))]
    pub product_id: String,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i64,
}

#[derive(Clone)]
pub struct ImportRequestService {
    store: Arc<dyn DocumentStore>,
}

impl ImportRequestService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> Result<ImportRequest, ServiceError> {
        let doc = self
            .store
            .read_one(collections::IMPORT_REQUESTS, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Import request {id} not found")))?;
        Ok(doc.to()?)
    }

    pub async fn list_for_vendor(&self, vendor_id: &str) -> Result<Vec<ImportRequest>, ServiceError> {
        let docs = self
            .store
            .query(
                collections::IMPORT_REQUESTS,
                "vendor_id",
                QueryOp::Eq,
                &json!(vendor_id),
            )
            .await?;
        let mut requests = Vec::with_capacity(docs.len());
        for doc in docs {
            requests.push(doc.to()?);
        }
        Ok(requests)
    }

    #[instrument(skip(self, input), fields(vendor = %vendor_id, product = %input.product_id))]
    pub async fn create(
        &self,
        vendor_id: &str,
        input: CreateImportRequestInput,
    ) -> Result<ImportRequest, ServiceError> {
        input.validate()?;

        let vendor_doc = self
            .store
            .read_one(collections::VENDORS, vendor_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Vendor {vendor_id} not found")))?;
        let vendor: Vendor = vendor_doc.to()?;

        let product_doc = self
            .store
            .read_one(collections::PRODUCTS, &input.product_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;
        let product: Product = product_doc.to()?;

        let now = Utc::now();
        let request = ImportRequest {
            id: Uuid::new_v4().simple().to_string(),
            vendor_id: vendor_id.to_string(),
            product_id: input.product_id,
            product_name: product.name,
            quantity: input.quantity,
            request_date: now,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let mut batch = WriteBatch::new();
        batch.create(
            collections::IMPORT_REQUESTS,
            &request.id,
            serde_json::to_value(&request)?,
        );
        // A fresh pending request always means the flag is on.
        if !vendor.has_orders {
            batch.merge(
                collections::VENDORS,
                vendor_id,
                json!({"has_orders": true, "updated_at": now}),
                Some(vendor_doc.version),
            );
        }
        self.store.commit(batch).await?;

        Ok(request)
    }
}
