//! Vendor (dealer) service: CRUD plus the authorization-list save path and
//! candidate lookup for the editor.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::{province, AuthorizedUser, Role, User, Vendor};
use crate::services::authorization::{filter_candidates, AuthorizationList};
use crate::services::users::UserService;
use crate::store::{collections, DocumentStore, QueryOp, WriteBatch};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVendorInput {
    #[validate(length(min = 1, message = "name is required"))]
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
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVendorInput {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub province: Option<String>,
    pub phone: Option<String>,
    pub logo: Option<String>,
    /// Full replacement of the authorized-user list (the edit session's save).
    pub authorized_users: Option<Vec<AuthorizedUser>>,
}

#[derive(Clone)]
pub struct VendorService {
    store: Arc<dyn DocumentStore>,
    users: UserService,
}

impl VendorService {
    pub fn new(store: Arc<dyn DocumentStore>, users: UserService) -> Self {
        Self { store, users }
    }

    pub async fn list(&self) -> Result<Vec<Vendor>, ServiceError> {
        let docs = self.store.read_all(collections::VENDORS).await?;
        let mut vendors = Vec::with_capacity(docs.len());
        for doc in docs {
            vendors.push(doc.to()?);
        }
        Ok(vendors)
    }

    pub async fn get(&self, id: &str) -> Result<Vendor, ServiceError> {
        let doc = self
            .store
            .read_one(collections::VENDORS, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Vendor {id} not found")))?;
        Ok(doc.to()?)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateVendorInput) -> Result<Vendor, ServiceError> {
        input.validate()?;
        validate_province(&input.province)?;

        let now = Utc::now();
        let vendor = Vendor {
            id: Uuid::new_v4().simple().to_string(),
            name: input.name,
            description: input.description,
            address: input.address,
            province: input.province,
            phone: input.phone,
            logo: input.logo,
            has_orders: false,
            authorized_users: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.store
            .create(
                collections::VENDORS,
                serde_json::to_value(&vendor)?,
                Some(vendor.id.clone()),
            )
            .await?;
        Ok(vendor)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: UpdateVendorInput) -> Result<Vendor, ServiceError> {
        input.validate()?;
        let mut vendor = self.get(id).await?;

        if let Some(name) = input.name {
            vendor.name = name;
        }
        if let Some(description) = input.description {
            vendor.description = description;
        }
        if let Some(address) = input.address {
            vendor.address = address;
        }
        if let Some(province) = input.province {
            validate_province(&province)?;
            vendor.province = province;
        }
        if let Some(phone) = input.phone {
            vendor.phone = phone;
        }
        if let Some(logo) = input.logo {
            vendor.logo = logo;
        }
        if let Some(authorized_users) = input.authorized_users {
            // Route the saved list through the editor so duplicates collapse.
            vendor.authorized_users =
                AuthorizationList::from_entries(authorized_users).into_entries();
        }
        vendor.updated_at = Utc::now();

        self.store
            .update(collections::VENDORS, id, serde_json::to_value(&vendor)?)
            .await?;
        Ok(vendor)
    }

    /// Deletes the vendor together with its stock ledger entries and import
    /// requests in one atomic batch.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let vendor_doc = self
            .store
            .read_one(collections::VENDORS, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Vendor {id} not found")))?;

        let mut batch = WriteBatch::new();
        let ledgers = self
            .store
            .query(
                collections::VENDOR_PRODUCTS,
                "vendor_id",
                QueryOp::Eq,
                &serde_json::json!(id),
            )
            .await?;
        for doc in ledgers {
            batch.delete(collections::VENDOR_PRODUCTS, &doc.id, Some(doc.version));
        }
        let requests = self
            .store
            .query(
                collections::IMPORT_REQUESTS,
                "vendor_id",
                QueryOp::Eq,
                &serde_json::json!(id),
            )
            .await?;
        for doc in requests {
            batch.delete(collections::IMPORT_REQUESTS, &doc.id, Some(doc.version));
        }
        batch.delete(collections::VENDORS, id, Some(vendor_doc.version));
        self.store.commit(batch).await?;
        Ok(())
    }

    /// Dealer accounts that could still be authorized for this vendor,
    /// narrowed by an accent-insensitive search.
    pub async fn authorization_candidates(
        &self,
        vendor_id: &str,
        search: &str,
    ) -> Result<Vec<User>, ServiceError> {
        let vendor = self.get(vendor_id).await?;
        let authorized = AuthorizationList::from_entries(vendor.authorized_users);
        let dealers = self.users.list_by_role(Role::Dealer).await?;
        Ok(filter_candidates(&dealers, &authorized, search)
            .into_iter()
            .cloned()
            .collect())
    }
}

fn validate_province(name: &str) -> Result<(), ServiceError> {
    if name.is_empty() || province::is_known_province(name) {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(format!(
            "unknown province: {name}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::users::CreateUserInput;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;

    fn services() -> (VendorService, UserService) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let users = UserService::new(store.clone());
        (VendorService::new(store, users.clone()), users)
    }

    fn vendor_input(name: &str) -> CreateVendorInput {
        CreateVendorInput {
            name: name.to_string(),
            description: String::new(),
            address: String::new(),
            province: "Đà Nẵng".to_string(),
            phone: String::new(),
            logo: String::new(),
        }
    }

    #[tokio::test]
    async fn create_starts_without_pending_orders() {
        let (vendors, _) = services();
        let vendor = vendors.create(vendor_input("Deco Hanoi")).await.unwrap();
        assert!(!vendor.has_orders);
        assert!(vendor.authorized_users.is_empty());
    }

    #[tokio::test]
    async fn unknown_province_is_rejected() {
        let (vendors, _) = services();
        let mut bad = vendor_input("Deco Hanoi");
        bad.province = "Atlantis".to_string();
        let err = vendors.create(bad).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[tokio::test]
    async fn saving_the_authorized_list_dedupes() {
        let (vendors, _) = services();
        let vendor = vendors.create(vendor_input("Deco Hanoi")).await.unwrap();

        let entry = AuthorizedUser {
            user_id: "u1".to_string(),
            username: "u1@dealerdesk.dev".to_string(),
            full_name: "User One".to_string(),
        };
        let updated = vendors
            .update(
                &vendor.id,
                UpdateVendorInput {
                    name: None,
                    description: None,
                    address: None,
                    province: None,
                    phone: None,
                    logo: None,
                    authorized_users: Some(vec![entry.clone(), entry.clone()]),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.authorized_users.len(), 1);
    }

    #[tokio::test]
    async fn candidates_exclude_already_authorized_dealers() {
        let (vendors, users) = services();
        let vendor = vendors.create(vendor_input("Deco Hanoi")).await.unwrap();

        let dealer_a = users
            .create(CreateUserInput {
                username: "a@dealerdesk.dev".to_string(),
                password: "SecurePass123!".to_string(),
                full_name: "Nguyễn Văn A".to_string(),
                phone: String::new(),
                address: String::new(),
                role: Role::Dealer,
                avatar: String::new(),
            })
            .await
            .unwrap();
        users
            .create(CreateUserInput {
                username: "b@dealerdesk.dev".to_string(),
                password: "SecurePass123!".to_string(),
                full_name: "Trần Thị B".to_string(),
                phone: String::new(),
                address: String::new(),
                role: Role::Dealer,
                avatar: String::new(),
            })
            .await
            .unwrap();

        vendors
            .update(
                &vendor.id,
                UpdateVendorInput {
                    name: None,
                    description: None,
                    address: None,
                    province: None,
                    phone: None,
                    logo: None,
                    authorized_users: Some(vec![AuthorizedUser::from(&dealer_a)]),
                },
            )
            .await
            .unwrap();

        let candidates = vendors
            .authorization_candidates(&vendor.id, "")
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].username, "b@dealerdesk.dev");
    }
}
