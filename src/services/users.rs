//! User account service. Password hashing is shared with the auth module;
//! the hash never leaves the store boundary.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthService;
use crate::errors::ServiceError;
use crate::models::{Role, User};
use crate::store::{collections, DocumentStore, QueryOp};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserInput {
    #[validate(email(message = "username must be an email address"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub role: Role,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserInput {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub avatar: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        let docs = self.store.read_all(collections::USERS).await?;
        let mut users = Vec::with_capacity(docs.len());
        for doc in docs {
            users.push(doc.to()?);
        }
        Ok(users)
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>, ServiceError> {
        let docs = self
            .store
            .query(
                collections::USERS,
                "role",
                QueryOp::Eq,
                &json!(role),
            )
            .await?;
        let mut users = Vec::with_capacity(docs.len());
        for doc in docs {
            users.push(doc.to()?);
        }
        Ok(users)
    }

    pub async fn get(&self, id: &str) -> Result<User, ServiceError> {
        let doc = self
            .store
            .read_one(collections::USERS, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {id} not found")))?;
        Ok(doc.to()?)
    }

    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create(&self, input: CreateUserInput) -> Result<User, ServiceError> {
        input.validate()?;

        let existing = self
            .store
            .query(
                collections::USERS,
                "username",
                QueryOp::Eq,
                &json!(input.username),
            )
            .await?;
        if !existing.is_empty() {
            return Err(ServiceError::Conflict(format!(
                "an account for {} already exists",
                input.username
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().simple().to_string(),
            username: input.username,
            full_name: input.full_name,
            phone: input.phone,
            address: input.address,
            role: input.role,
            avatar: input.avatar,
            password_hash: AuthService::hash_password(&input.password)
                .map_err(|_| ServiceError::HashError("password hashing failed".to_string()))?,
            created_at: now,
            updated_at: now,
        };

        self.store
            .create(
                collections::USERS,
                serde_json::to_value(&user)?,
                Some(user.id.clone()),
            )
            .await?;
        Ok(user)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> Result<User, ServiceError> {
        input.validate()?;
        let mut user = self.get(id).await?;

        if let Some(full_name) = input.full_name {
            user.full_name = full_name;
        }
        if let Some(phone) = input.phone {
            user.phone = phone;
        }
        if let Some(address) = input.address {
            user.address = address;
        }
        if let Some(role) = input.role {
            user.role = role;
        }
        if let Some(avatar) = input.avatar {
            user.avatar = avatar;
        }
        user.updated_at = Utc::now();

        self.store
            .update(collections::USERS, id, serde_json::to_value(&user)?)
            .await?;
        Ok(user)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(collections::USERS, id).await?;
        Ok(())
    }
}
