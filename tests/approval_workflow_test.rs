//! Engine-level tests for the replenishment approval workflow: stock
//! movement, the vendor ledger, terminal-state handling and the
//! `has_orders` flag.

use std::sync::Arc;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;

use dealerdesk_api::errors::ServiceError;
use dealerdesk_api::models::{ImportRequest, Product, RequestStatus, Vendor, VendorProduct};
use dealerdesk_api::services::import_requests::CreateImportRequestInput;
use dealerdesk_api::services::products::CreateProductInput;
use dealerdesk_api::services::users::UserService;
use dealerdesk_api::services::vendors::CreateVendorInput;
use dealerdesk_api::services::{
    ApprovalService, ImportRequestService, ProductService, VendorService,
};
use dealerdesk_api::store::{collections, DocumentStore, MemoryStore};

struct Workbench {
    store: Arc<dyn DocumentStore>,
    products: ProductService,
    vendors: VendorService,
    requests: ImportRequestService,
    approvals: ApprovalService,
    vendor_id: String,
}

impl Workbench {
    async fn new() -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let users = UserService::new(store.clone());
        let products = ProductService::new(store.clone());
        let vendors = VendorService::new(store.clone(), users);
        let requests = ImportRequestService::new(store.clone());
        let approvals = ApprovalService::new(store.clone());

        let vendor = vendors
            .create(CreateVendorInput {
                name: "Deco Đà Nẵng".to_string(),
                description: String::new(),
                address: String::new(),
                province: "Đà Nẵng".to_string(),
                phone: String::new(),
                logo: String::new(),
            })
            .await
            .unwrap();

        Self {
            store,
            products,
            vendors,
            requests,
            approvals,
            vendor_id: vendor.id,
        }
    }

    async fn product_with_stock(&self, name: &str, stock: i64) -> Product {
        self.products
            .create(CreateProductInput {
                name: name.to_string(),
                description: String::new(),
                price: dec!(19.90),
                stock,
                images: vec![],
                categories: vec![],
                status: None,
            })
            .await
            .unwrap()
    }

    async fn pending_request(&self, product_id: &str, quantity: i64) -> ImportRequest {
        self.requests
            .create(
                &self.vendor_id,
                CreateImportRequestInput {
                    product_id: product_id.to_string(),
                    quantity,
                },
            )
            .await
            .unwrap()
    }

    async fn product(&self, id: &str) -> Product {
        self.products.get(id).await.unwrap()
    }

    async fn vendor(&self) -> Vendor {
        self.vendors.get(&self.vendor_id).await.unwrap()
    }

    async fn ledger(&self, product_id: &str) -> Option<VendorProduct> {
        self.store
            .read_one(
                collections::VENDOR_PRODUCTS,
                &VendorProduct::ledger_id(&self.vendor_id, product_id),
            )
            .await
            .unwrap()
            .map(|doc| doc.to().unwrap())
    }
}

#[tokio::test]
async fn approving_moves_stock_into_the_vendor_ledger() {
    let bench = Workbench::new().await;
    let product = bench.product_with_stock("Kettle", 10).await;
    let request = bench.pending_request(&product.id, 5).await;

    let approved = bench.approvals.approve(&request.id).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);

    assert_eq!(bench.product(&product.id).await.stock, 5);
    let ledger = bench.ledger(&product.id).await.expect("ledger entry");
    assert_eq!(ledger.stock, 5);
    assert_eq!(ledger.vendor_id, bench.vendor_id);
    assert_eq!(ledger.product_id, product.id);
}

#[tokio::test]
async fn insufficient_stock_fails_without_side_effects() {
    let bench = Workbench::new().await;
    let product = bench.product_with_stock("Kettle", 3).await;
    let request = bench.pending_request(&product.id, 5).await;

    let err = bench.approvals.approve(&request.id).await.unwrap_err();
    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            ref product,
            requested: 5,
            available: 3,
        } if product == "Kettle"
    );

    // Read-only failure: nothing moved, the request is still pending.
    assert_eq!(bench.product(&product.id).await.stock, 3);
    assert!(bench.ledger(&product.id).await.is_none());
    let request = bench.requests.get(&request.id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(bench.vendor().await.has_orders);
}

#[tokio::test]
async fn rejecting_touches_no_stock() {
    let bench = Workbench::new().await;
    let product = bench.product_with_stock("Kettle", 10).await;
    let request = bench.pending_request(&product.id, 5).await;

    let rejected = bench.approvals.reject(&request.id).await.unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);

    assert_eq!(bench.product(&product.id).await.stock, 10);
    assert!(bench.ledger(&product.id).await.is_none());
}

#[tokio::test]
async fn successive_approvals_accumulate_in_the_ledger() {
    let bench = Workbench::new().await;
    let product = bench.product_with_stock("Kettle", 20).await;

    let first = bench.pending_request(&product.id, 5).await;
    let second = bench.pending_request(&product.id, 7).await;
    bench.approvals.approve(&first.id).await.unwrap();
    bench.approvals.approve(&second.id).await.unwrap();

    assert_eq!(bench.product(&product.id).await.stock, 8);
    assert_eq!(bench.ledger(&product.id).await.unwrap().stock, 12);
}

#[tokio::test]
async fn reapproving_an_approved_request_is_a_noop() {
    let bench = Workbench::new().await;
    let product = bench.product_with_stock("Kettle", 10).await;
    let request = bench.pending_request(&product.id, 5).await;

    bench.approvals.approve(&request.id).await.unwrap();
    let again = bench.approvals.approve(&request.id).await.unwrap();
    assert_eq!(again.status, RequestStatus::Approved);

    // No double-decrement, no double-accumulate.
    assert_eq!(bench.product(&product.id).await.stock, 5);
    assert_eq!(bench.ledger(&product.id).await.unwrap().stock, 5);
}

#[tokio::test]
async fn terminal_states_do_not_cross_over() {
    let bench = Workbench::new().await;
    let product = bench.product_with_stock("Kettle", 10).await;

    let rejected = bench.pending_request(&product.id, 2).await;
    bench.approvals.reject(&rejected.id).await.unwrap();
    let err = bench.approvals.approve(&rejected.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));

    let approved = bench.pending_request(&product.id, 2).await;
    bench.approvals.approve(&approved.id).await.unwrap();
    let err = bench.approvals.reject(&approved.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));
}

#[tokio::test]
async fn approving_a_missing_request_is_not_found() {
    let bench = Workbench::new().await;
    let err = bench.approvals.approve("missing").await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn vanished_product_surfaces_not_found_and_keeps_request_pending() {
    let bench = Workbench::new().await;
    let product = bench.product_with_stock("Kettle", 10).await;
    let request = bench.pending_request(&product.id, 5).await;

    bench.products.delete(&product.id).await.unwrap();

    let err = bench.approvals.approve(&request.id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
    let request = bench.requests.get(&request.id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
}

#[tokio::test]
async fn has_orders_tracks_pending_siblings() {
    let bench = Workbench::new().await;
    let product = bench.product_with_stock("Kettle", 20).await;

    assert!(!bench.vendor().await.has_orders);

    let first = bench.pending_request(&product.id, 3).await;
    let second = bench.pending_request(&product.id, 4).await;
    assert!(bench.vendor().await.has_orders);

    bench.approvals.approve(&first.id).await.unwrap();
    // One sibling is still pending.
    assert!(bench.vendor().await.has_orders);

    bench.approvals.reject(&second.id).await.unwrap();
    // All requests processed; the flag clears.
    assert!(!bench.vendor().await.has_orders);
}
