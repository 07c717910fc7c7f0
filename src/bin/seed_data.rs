//! Seed data script - populates the document store with a demo console
//! data set.
//!
//! Run with: cargo run --bin seed-data -- --store-path dealerdesk.json
//!
//! This creates:
//! - an admin and a manager account, plus two dealer accounts
//! - a small category tree and product catalog
//! - one vendor with an authorized dealer and a pending import request

use std::sync::Arc;

use clap::Parser;
use rust_decimal_macros::dec;
use tracing::info;

use dealerdesk_api::handlers::AppServices;
use dealerdesk_api::models::{AuthorizedUser, Role};
use dealerdesk_api::services::categories::CreateCategoryInput;
use dealerdesk_api::services::import_requests::CreateImportRequestInput;
use dealerdesk_api::services::products::CreateProductInput;
use dealerdesk_api::services::users::CreateUserInput;
use dealerdesk_api::services::vendors::{CreateVendorInput, UpdateVendorInput};
use dealerdesk_api::store::{DocumentStore, MemoryStore};

#[derive(Parser, Debug)]
#[command(name = "seed-data", about = "Populate the store with demo data")]
struct Args {
    /// Path of the JSON store snapshot to create or extend
    #[arg(long, default_value = "dealerdesk.json")]
    store_path: String,

    /// Admin login email
    #[arg(long, default_value = "admin@dealerdesk.dev")]
    admin_email: String,

    /// Admin password
    #[arg(long, default_value = "ChangeMe123!")]
    admin_password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    info!("=== DealerDesk seed data ===");
    info!("Writing store snapshot to {}", args.store_path);

    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::open(&args.store_path)?);
    let services = AppServices::new(store, Default::default());

    // Accounts
    info!("Creating accounts...");
    services
        .users
        .create(CreateUserInput {
            username: args.admin_email.clone(),
            password: args.admin_password.clone(),
            full_name: "Console Admin".to_string(),
            phone: "0900000001".to_string(),
            address: String::new(),
            role: Role::Admin,
            avatar: String::new(),
        })
        .await?;
    services
        .users
        .create(CreateUserInput {
            username: "manager@dealerdesk.dev".to_string(),
            password: "ChangeMe123!".to_string(),
            full_name: "Trần Quản Lý".to_string(),
            phone: "0900000002".to_string(),
            address: String::new(),
            role: Role::Manager,
            avatar: String::new(),
        })
        .await?;
    let dealer = services
        .users
        .create(CreateUserInput {
            username: "dealer@dealerdesk.dev".to_string(),
            password: "ChangeMe123!".to_string(),
            full_name: "Nguyễn Văn Đại".to_string(),
            phone: "0900000003".to_string(),
            address: "12 Lê Lợi".to_string(),
            role: Role::Dealer,
            avatar: String::new(),
        })
        .await?;
    services
        .users
        .create(CreateUserInput {
            username: "dealer2@dealerdesk.dev".to_string(),
            password: "ChangeMe123!".to_string(),
            full_name: "Phạm Thị Hồng".to_string(),
            phone: "0900000004".to_string(),
            address: String::new(),
            role: Role::Dealer,
            avatar: String::new(),
        })
        .await?;

    // Categories
    info!("Creating categories...");
    let kitchen = services
        .categories
        .create(CreateCategoryInput {
            name: "Kitchen".to_string(),
            parent_id: None,
        })
        .await?;
    let cookware = services
        .categories
        .create(CreateCategoryInput {
            name: "Cookware".to_string(),
            parent_id: Some(kitchen.id.clone()),
        })
        .await?;
    services
        .categories
        .create(CreateCategoryInput {
            name: "Small Appliances".to_string(),
            parent_id: Some(kitchen.id.clone()),
        })
        .await?;

    // Products
    info!("Creating products...");
    let kettle = services
        .products
        .create(CreateProductInput {
            name: "Stove-top Kettle 2L".to_string(),
            description: "Stainless steel kettle with whistle".to_string(),
            price: dec!(24.90),
            stock: 120,
            images: vec![],
            categories: vec![cookware.id.clone()],
            status: None,
        })
        .await?;
    services
        .products
        .create(CreateProductInput {
            name: "Cast Iron Pan 28cm".to_string(),
            description: "Pre-seasoned cast iron skillet".to_string(),
            price: dec!(39.50),
            stock: 60,
            images: vec![],
            categories: vec![cookware.id],
            status: None,
        })
        .await?;

    // Vendor with an authorized dealer and one pending request
    info!("Creating vendor...");
    let vendor = services
        .vendors
        .create(CreateVendorInput {
            name: "Deco Đà Nẵng".to_string(),
            description: "Home goods reseller".to_string(),
            address: "45 Bạch Đằng".to_string(),
            province: "Đà Nẵng".to_string(),
            phone: "0236000000".to_string(),
            logo: String::new(),
        })
        .await?;
    services
        .vendors
        .update(
            &vendor.id,
            UpdateVendorInput {
                name: None,
                description: None,
                address: None,
                province: None,
                phone: None,
                logo: None,
                authorized_users: Some(vec![AuthorizedUser::from(&dealer)]),
            },
        )
        .await?;
    services
        .import_requests
        .create(
            &vendor.id,
            CreateImportRequestInput {
                product_id: kettle.id,
                quantity: 10,
            },
        )
        .await?;

    info!("Seed data complete.");
    info!("Login with {} / {}", args.admin_email, args.admin_password);
    Ok(())
}
