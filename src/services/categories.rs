//! Category service: CRUD over the `categories` collection and the pure
//! tree builder used by product forms and listings.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::{Category, CategoryNode};
use crate::store::{collections, DocumentStore};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    /// `Some(None)` clears the parent (promotes to root).
    #[serde(default, deserialize_with = "double_option::deserialize")]
    #[schema(value_type = Option<String>)]
    pub parent_id: Option<Option<String>>,
}

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn DocumentStore>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Category>, ServiceError> {
        let docs = self.store.read_all(collections::CATEGORIES).await?;
        let mut categories = Vec::with_capacity(docs.len());
        for doc in docs {
            categories.push(doc.to()?);
        }
        Ok(categories)
    }

    pub async fn get(&self, id: &str) -> Result<Category, ServiceError> {
        let doc = self
            .store
            .read_one(collections::CATEGORIES, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {id} not found")))?;
        Ok(doc.to()?)
    }

    /// Creates a category. A non-null parent must reference an existing
    /// category; unresolvable parents are rejected at write time.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, ServiceError> {
        input.validate()?;

        let parent_name = match input.parent_id.as_deref() {
            Some(parent_id) => Some(self.resolve_parent_name(parent_id).await?),
            None => None,
        };

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().simple().to_string(),
            name: input.name,
            parent_id: input.parent_id,
            parent_name,
            created_at: now,
            updated_at: now,
        };

        self.store
            .create(
                collections::CATEGORIES,
                serde_json::to_value(&category)?,
                Some(category.id.clone()),
            )
            .await?;
        Ok(category)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: &str,
        input: UpdateCategoryInput,
    ) -> Result<Category, ServiceError> {
        input.validate()?;
        let mut category = self.get(id).await?;

        if let Some(name) = input.name {
            category.name = name;
        }
        if let Some(parent_id) = input.parent_id {
            match parent_id.as_deref() {
                Some(parent) if parent == id => {
                    return Err(ServiceError::InvalidOperation(
                        "a category cannot be its own parent".to_string(),
                    ));
                }
                Some(parent) => {
                    category.parent_name = Some(self.resolve_parent_name(parent).await?);
                    category.parent_id = Some(parent.to_string());
                }
                None => {
                    category.parent_id = None;
                    category.parent_name = None;
                }
            }
        }
        category.updated_at = Utc::now();

        self.store
            .update(
                collections::CATEGORIES,
                id,
                serde_json::to_value(&category)?,
            )
            .await?;
        Ok(category)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(collections::CATEGORIES, id).await?;
        Ok(())
    }

    /// Loads all categories and assembles the forest.
    pub async fn tree(&self) -> Result<Vec<CategoryNode>, ServiceError> {
        let categories = self.list().await?;
        Ok(build_category_tree(&categories))
    }

    async fn resolve_parent_name(&self, parent_id: &str) -> Result<String, ServiceError> {
        let parent = self
            .store
            .read_one(collections::CATEGORIES, parent_id)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "parent category {parent_id} does not exist"
                ))
            })?;
        Ok(parent.str_field("name").unwrap_or_default().to_string())
    }

    /// True when any category references `id` as its parent.
    pub async fn has_children(&self, id: &str) -> Result<bool, ServiceError> {
        let children = self
            .store
            .query(
                collections::CATEGORIES,
                "parent_id",
                crate::store::QueryOp::Eq,
                &json!(id),
            )
            .await?;
        Ok(!children.is_empty())
    }
}

/// Builds the category forest from a flat record list in two passes.
///
/// Children with an unresolvable `parent_id` are promoted to roots (with a
/// warning) instead of being dropped, and a parent link that would close a
/// cycle is treated the same way.
pub fn build_category_tree(records: &[Category]) -> Vec<CategoryNode> {
    let ids: HashSet<&str> = records.iter().map(|c| c.id.as_str()).collect();
    let parent_of: HashMap<&str, &str> = records
        .iter()
        .filter_map(|c| c.parent_id.as_deref().map(|p| (c.id.as_str(), p)))
        .collect();

    let mut roots: Vec<&Category> = Vec::new();
    let mut children_of: HashMap<&str, Vec<&Category>> = HashMap::new();

    for category in records {
        match category.parent_id.as_deref() {
            None => roots.push(category),
            Some(parent) if !ids.contains(parent) => {
                warn!(
                    category = %category.id,
                    parent = %parent,
                    "category references a missing parent; promoting to root"
                );
                roots.push(category);
            }
            Some(parent) => {
                if closes_cycle(&category.id, parent, &parent_of) {
                    warn!(
                        category = %category.id,
                        parent = %parent,
                        "category parent chain is cyclic; promoting to root"
                    );
                    roots.push(category);
                } else {
                    children_of.entry(parent).or_default().push(category);
                }
            }
        }
    }

    roots
        .into_iter()
        .map(|root| build_node(root, &children_of))
        .collect()
}

/// Walks the parent chain starting at `parent`; the link `child -> parent`
/// closes a cycle when the chain reaches back to `child`.
fn closes_cycle(child: &str, parent: &str, parent_of: &HashMap<&str, &str>) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = parent;
    loop {
        if current == child {
            return true;
        }
        if !seen.insert(current) {
            // A cycle above us that does not involve `child`.
            return false;
        }
        match parent_of.get(current) {
            Some(next) => current = next,
            None => return false,
        }
    }
}

fn build_node(category: &Category, children_of: &HashMap<&str, Vec<&Category>>) -> CategoryNode {
    let mut node = CategoryNode::leaf(category);
    if let Some(children) = children_of.get(category.id.as_str()) {
        node.sub_categories = children
            .iter()
            .map(|child| build_node(child, children_of))
            .collect();
    }
    node
}

// Double-option deserialization for nullable patch fields: an absent key
// keeps the current value, an explicit null clears it.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
