//! Product catalog service.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::{Product, ProductStatus};
use crate::store::{collections, DocumentStore};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = String, example = "149.90")]
    pub price: Decimal,
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    /// Category ids the product belongs to
    #[serde(default)]
    pub categories: Vec<String>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub images: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub status: Option<ProductStatus>,
}

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn DocumentStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        let docs = self.store.read_all(collections::PRODUCTS).await?;
        let mut products = Vec::with_capacity(docs.len());
        for doc in docs {
            products.push(doc.to()?);
        }
        Ok(products)
    }

    pub async fn get(&self, id: &str) -> Result<Product, ServiceError> {
        let doc = self
            .store
            .read_one(collections::PRODUCTS, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))?;
        Ok(doc.to()?)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateProductInput) -> Result<Product, ServiceError> {
        input.validate()?;
        validate_price_and_stock(input.price, input.stock)?;
        self.validate_category_ids(&input.categories).await?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().simple().to_string(),
            name: input.name,
            description: input.description,
            price: input.price,
            stock: input.stock,
            images: input.images,
            categories: input.categories,
            status: input.status.unwrap_or(ProductStatus::Active),
            created_at: now,
            updated_at: now,
        };

        self.store
            .create(
                collections::PRODUCTS,
                serde_json::to_value(&product)?,
                Some(product.id.clone()),
            )
            .await?;
        Ok(product)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: UpdateProductInput) -> Result<Product, ServiceError> {
        input.validate()?;
        let mut product = self.get(id).await?;

        if let Some(name) = input.name {
            product.name = name;
        }
        if let Some(description) = input.description {
            product.description = description;
        }
        if let Some(price) = input.price {
            product.price = price;
        }
        if let Some(stock) = input.stock {
            product.stock = stock;
        }
        if let Some(images) = input.images {
            product.images = images;
        }
        if let Some(categories) = input.categories {
            self.validate_category_ids(&categories).await?;
            product.categories = categories;
        }
        if let Some(status) = input.status {
            product.status = status;
        }
        validate_price_and_stock(product.price, product.stock)?;
        product.updated_at = Utc::now();

        self.store
            .update(collections::PRODUCTS, id, serde_json::to_value(&product)?)
            .await?;
        Ok(product)
    }

    pub async fn set_status(&self, id: &str, status: ProductStatus) -> Result<Product, ServiceError> {
        let mut product = self.get(id).await?;
        product.status = status;
        product.updated_at = Utc::now();
        self.store
            .update(
                collections::PRODUCTS,
                id,
                json!({"status": status, "updated_at": product.updated_at}),
            )
            .await?;
        Ok(product)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(collections::PRODUCTS, id).await?;
        Ok(())
    }

    /// Products reference categories by id; every referenced id must resolve.
    async fn validate_category_ids(&self, category_ids: &[String]) -> Result<(), ServiceError> {
        for category_id in category_ids {
            if self
                .store
                .read_one(collections::CATEGORIES, category_id)
                .await?
                .is_none()
            {
                return Err(ServiceError::ValidationError(format!(
                    "category {category_id} does not exist"
                )));
            }
        }
        Ok(())
    }
}

fn validate_price_and_stock(price: Decimal, stock: i64) -> Result<(), ServiceError> {
    if price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "price must not be negative".to_string(),
        ));
    }
    if stock < 0 {
        return Err(ServiceError::ValidationError(
            "stock must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn service() -> ProductService {
        ProductService::new(Arc::new(MemoryStore::new()))
    }

    fn input(name: &str, stock: i64) -> CreateProductInput {
        CreateProductInput {
            name: name.to_string(),
            description: String::new(),
            price: dec!(10.00),
            stock,
            images: vec![],
            categories: vec![],
            status: None,
        }
    }

    #[tokio::test]
    async fn create_and_get_roundtrip() {
        let service = service();
        let created = service.create(input("Kettle", 12)).await.unwrap();
        let fetched = service.get(&created.id).await.unwrap();
        assert_eq!(fetched.name, "Kettle");
        assert_eq!(fetched.stock, 12);
        assert_eq!(fetched.status, ProductStatus::Active);
    }

    #[tokio::test]
    async fn negative_stock_is_rejected() {
        let service = service();
        let err = service.create(input("Kettle", -1)).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let service = service();
        let mut bad = input("Kettle", 1);
        bad.price = dec!(-0.01);
        let err = service.create(bad).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[tokio::test]
    async fn unknown_category_reference_is_rejected() {
        let service = service();
        let mut bad = input("Kettle", 1);
        bad.categories = vec!["nope".to_string()];
        let err = service.create(bad).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let service = service();
        let created = service.create(input("Kettle", 12)).await.unwrap();
        let updated = service
            .update(
                &created.id,
                UpdateProductInput {
                    name: None,
                    description: Some("Stove-top kettle".to_string()),
                    price: None,
                    stock: None,
                    images: None,
                    categories: None,
                    status: Some(ProductStatus::Inactive),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Kettle");
        assert_eq!(updated.description, "Stove-top kettle");
        assert_eq!(updated.status, ProductStatus::Inactive);
    }
}
