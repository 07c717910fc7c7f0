pub mod categories;
pub mod common;
pub mod products;
pub mod uploads;
pub mod users;
pub mod vendors;

use std::sync::Arc;

use crate::config::ImageHostConfig;
use crate::services::{
    ApprovalService, CategoryService, ImageService, ImportRequestService, ProductService,
    UserService, VendorService,
};
use crate::store::DocumentStore;

pub use crate::AppState;

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductService,
    pub categories: CategoryService,
    pub users: UserService,
    pub vendors: VendorService,
    pub import_requests: ImportRequestService,
    pub approvals: ApprovalService,
    pub images: ImageService,
}

impl AppServices {
    pub fn new(store: Arc<dyn DocumentStore>, image_host: ImageHostConfig) -> Self {
        let users = UserService::new(store.clone());
        Self {
            products: ProductService::new(store.clone()),
            categories: CategoryService::new(store.clone()),
            vendors: VendorService::new(store.clone(), users.clone()),
            users,
            import_requests: ImportRequestService::new(store.clone()),
            approvals: ApprovalService::new(store),
            images: ImageService::new(image_host),
        }
    }
}
