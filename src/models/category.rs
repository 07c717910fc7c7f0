use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Flat category record as stored in the `categories` collection.
///
/// `parent_id` must reference an existing category or be absent (root);
/// the set of categories forms a forest, not necessarily a single tree.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: String,
    pub name: String,
    // Always serialized, null included: clearing the parent must reach the
    // stored document through a field merge.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Denormalized for display; `parent_id` is canonical.
    #[serde(default)]
    pub parent_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A node in the constructed category forest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub sub_categories: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn leaf(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            parent_id: category.parent_id.clone(),
            sub_categories: Vec::new(),
        }
    }

    /// Total number of nodes in this subtree, itself included.
    pub fn len(&self) -> usize {
        1 + self
            .sub_categories
            .iter()
            .map(CategoryNode::len)
            .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
