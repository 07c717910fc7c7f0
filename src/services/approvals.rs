//! Replenishment approval engine.
//!
//! Finalizes a dealer's import request: `approve` moves the requested
//! quantity from the shared product pool into the vendor's stock ledger and
//! marks the request approved; `reject` only marks it. Every mutation for an
//! approval lands in a single batch commit, preconditioned on the versions
//! the engine read while deciding, so two concurrent approvals of the same
//! request cannot both apply: the loser surfaces a Conflict and may be
//! retried by the operator.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::models::{ImportRequest, Product, RequestStatus, Vendor, VendorProduct};
use crate::store::{collections, Document, DocumentStore, QueryOp, WriteBatch};

#[derive(Clone)]
pub struct ApprovalService {
    store: Arc<dyn DocumentStore>,
}

impl ApprovalService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Approves a pending request, moving stock from the product pool into
    /// the vendor's ledger.
    ///
    /// Re-approving an already approved request is an idempotent no-op;
    /// approving a rejected one is an error. An insufficient pool leaves
    /// everything untouched.
    #[instrument(skip(self))]
    pub async fn approve(&self, request_id: &str) -> Result<ImportRequest, ServiceError> {
        let (request_doc, mut request) = self.load_request(request_id).await?;
        match request.status {
            RequestStatus::Approved => return Ok(request),
            RequestStatus::Rejected => {
                return Err(ServiceError::InvalidStatus(format!(
                    "request {request_id} was already rejected"
                )))
            }
            RequestStatus::Pending => {}
        }

        let product_doc = self
            .store
            .read_one(collections::PRODUCTS, &request.product_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "product \"{}\" no longer exists",
                    request.product_name
                ))
            })?;
        let product: Product = product_doc.to()?;

        if product.stock < request.quantity {
            return Err(ServiceError::InsufficientStock {
                product: product.name,
                requested: request.quantity,
                available: product.stock,
            });
        }

        let now = Utc::now();
        let mut batch = WriteBatch::new();

        let ledger_id = VendorProduct::ledger_id(&request.vendor_id, &request.product_id);
        match self
            .store
            .read_one(collections::VENDOR_PRODUCTS, &ledger_id)
            .await?
        {
            Some(ledger_doc) => {
                let ledger: VendorProduct = ledger_doc.to()?;
                batch.merge(
                    collections::VENDOR_PRODUCTS,
                    &ledger_id,
                    json!({"stock": ledger.stock + request.quantity, "updated_at": now}),
                    Some(ledger_doc.version),
                );
            }
            None => {
                let ledger = VendorProduct {
                    id: ledger_id.clone(),
                    vendor_id: request.vendor_id.clone(),
                    product_id: request.product_id.clone(),
                    stock: request.quantity,
                    created_at: now,
                    updated_at: now,
                };
                batch.create(
                    collections::VENDOR_PRODUCTS,
                    &ledger_id,
                    serde_json::to_value(&ledger)?,
                );
            }
        }

        batch.merge(
            collections::PRODUCTS,
            &request.product_id,
            json!({"stock": product.stock - request.quantity, "updated_at": now}),
            Some(product_doc.version),
        );
        batch.merge(
            collections::IMPORT_REQUESTS,
            request_id,
            json!({"status": RequestStatus::Approved, "updated_at": now}),
            Some(request_doc.version),
        );

        self.stage_has_orders(&mut batch, &request, RequestStatus::Approved, now)
            .await?;

        self.store.commit(batch).await.map_err(conflict_hint)?;

        info!(
            request = %request_id,
            product = %request.product_id,
            vendor = %request.vendor_id,
            quantity = request.quantity,
            "import request approved"
        );

        request.status = RequestStatus::Approved;
        request.updated_at = now;
        Ok(request)
    }

    /// Rejects a pending request. No stock is touched anywhere.
    #[instrument(skip(self))]
    pub async fn reject(&self, request_id: &str) -> Result<ImportRequest, ServiceError> {
        let (request_doc, mut request) = self.load_request(request_id).await?;
        match request.status {
            RequestStatus::Rejected => return Ok(request),
            RequestStatus::Approved => {
                return Err(ServiceError::InvalidStatus(format!(
                    "request {request_id} was already approved"
                )))
            }
            RequestStatus::Pending => {}
        }

        let now = Utc::now();
        let mut batch = WriteBatch::new();
        batch.merge(
            collections::IMPORT_REQUESTS,
            request_id,
            json!({"status": RequestStatus::Rejected, "updated_at": now}),
            Some(request_doc.version),
        );

        self.stage_has_orders(&mut batch, &request, RequestStatus::Rejected, now)
            .await?;

        self.store.commit(batch).await.map_err(conflict_hint)?;

        info!(request = %request_id, vendor = %request.vendor_id, "import request rejected");

        request.status = RequestStatus::Rejected;
        request.updated_at = now;
        Ok(request)
    }

    async fn load_request(
        &self,
        request_id: &str,
    ) -> Result<(Document, ImportRequest), ServiceError> {
        let doc = self
            .store
            .read_one(collections::IMPORT_REQUESTS, request_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Import request {request_id} not found"))
            })?;
        let request = doc.to()?;
        Ok((doc, request))
    }

    /// Recomputes `vendor.has_orders` as "any sibling request still pending"
    /// assuming this request transitions to `new_status`, and stages the
    /// vendor write only when the flag actually changes.
    async fn stage_has_orders(
        &self,
        batch: &mut WriteBatch,
        request: &ImportRequest,
        new_status: RequestStatus,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let vendor_doc = self
            .store
            .read_one(collections::VENDORS, &request.vendor_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Vendor {} not found", request.vendor_id))
            })?;
        let vendor: Vendor = vendor_doc.to()?;

        let siblings = self
            .store
            .query(
                collections::IMPORT_REQUESTS,
                "vendor_id",
                QueryOp::Eq,
                &json!(request.vendor_id),
            )
            .await?;

        let mut has_pending = false;
        for sibling in &siblings {
            let status = if sibling.id == request.id {
                new_status
            } else {
                sibling.to::<ImportRequest>()?.status
            };
            if status == RequestStatus::Pending {
                has_pending = true;
                break;
            }
        }

        if vendor.has_orders != has_pending {
            batch.merge(
                collections::VENDORS,
                &request.vendor_id,
                json!({"has_orders": has_pending, "updated_at": now}),
                Some(vendor_doc.version),
            );
        }
        Ok(())
    }
}

/// A lost precondition race is a retryable conflict, not a persistence
/// failure; surface it as such.
fn conflict_hint(err: crate::store::StoreError) -> ServiceError {
    match err {
        crate::store::StoreError::Conflict { collection, id } => ServiceError::Conflict(format!(
            "{collection}/{id} changed while the request was being processed; retry the operation"
        )),
        other => ServiceError::Persistence(other),
    }
}
