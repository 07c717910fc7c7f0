//! Business services. Each service owns one entity family and talks to the
//! backing document store through the gateway trait; handlers stay thin.

pub mod approvals;
pub mod authorization;
pub mod categories;
pub mod images;
pub mod import_requests;
pub mod products;
pub mod users;
pub mod vendors;

pub use approvals::ApprovalService;
pub use authorization::AuthorizationList;
pub use categories::CategoryService;
pub use images::ImageService;
pub use import_requests::ImportRequestService;
pub use products::ProductService;
pub use users::UserService;
pub use vendors::VendorService;
