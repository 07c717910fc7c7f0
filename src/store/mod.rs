//! Document store gateway.
//!
//! The application persists everything as JSON documents in named
//! collections, behind the [`DocumentStore`] trait: the six generic
//! operations the console uses (create / read_all / read_one / update /
//! delete / query) plus an atomic multi-document [`WriteBatch`] commit with
//! per-document version preconditions. The batch commit is what lets the
//! approval workflow move stock without a check-then-act race: a document
//! that changed between read and commit fails its precondition and the whole
//! batch is rejected.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

mod memory;

pub use memory::MemoryStore;

/// Collection names used by the console.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";
    pub const USERS: &str = "users";
    pub const VENDORS: &str = "vendors";
    pub const VENDOR_PRODUCTS: &str = "vendor_products";
    pub const IMPORT_REQUESTS: &str = "importRequests";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("document {id} already exists in {collection}")]
    AlreadyExists { collection: String, id: String },

    #[error("write conflict on {collection}/{id}")]
    Conflict { collection: String, id: String },

    #[error("invalid document data: {0}")]
    InvalidData(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored document: string id, monotonically increasing version, JSON body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub version: u64,
    pub data: Value,
}

impl Document {
    /// Deserializes the document body into a typed model.
    pub fn to<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Reads a string field from the document body, if present.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// Query comparison operators, mirroring the document-database operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Array membership: matches documents whose array field contains the value.
    ArrayContains,
}

impl std::str::FromStr for QueryOp {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Gte),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Lte),
            "array-contains" => Ok(Self::ArrayContains),
            other => Err(StoreError::InvalidData(format!(
                "unknown query operator: {other}"
            ))),
        }
    }
}

impl QueryOp {
    pub fn matches(&self, field_value: Option<&Value>, target: &Value) -> bool {
        let Some(actual) = field_value else {
            // A missing field never matches, regardless of operator.
            return false;
        };
        match self {
            Self::Eq => actual == target,
            Self::Ne => actual != target,
            Self::Gt | Self::Gte | Self::Lt | Self::Lte => {
                match compare_values(actual, target) {
                    Some(ord) => match self {
                        Self::Gt => ord.is_gt(),
                        Self::Gte => ord.is_ge(),
                        Self::Lt => ord.is_lt(),
                        Self::Lte => ord.is_le(),
                        _ => unreachable!(),
                    },
                    None => false,
                }
            }
            Self::ArrayContains => actual
                .as_array()
                .map(|items| items.contains(target))
                .unwrap_or(false),
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Precondition a batched write must satisfy at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Exists,
    NotExists,
    /// The document's current version must equal the given value.
    Version(u64),
}

#[derive(Debug, Clone)]
pub enum WriteKind {
    /// Insert a new document; fails the batch if the id is taken.
    Create(Value),
    /// Merge top-level fields into an existing document.
    Merge(Value),
    Delete,
}

#[derive(Debug, Clone)]
pub struct WriteOp {
    pub collection: String,
    pub id: String,
    pub kind: WriteKind,
    pub precondition: Option<Precondition>,
}

/// An ordered set of writes applied atomically: either every operation's
/// precondition holds and all writes land, or nothing is changed.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn create(&mut self, collection: &str, id: &str, data: Value) -> &mut Self {
        self.ops.push(WriteOp {
            collection: collection.to_string(),
            id: id.to_string(),
            kind: WriteKind::Create(data),
            precondition: Some(Precondition::NotExists),
        });
        self
    }

    pub fn merge(
        &mut self,
        collection: &str,
        id: &str,
        patch: Value,
        expected_version: Option<u64>,
    ) -> &mut Self {
        self.ops.push(WriteOp {
            collection: collection.to_string(),
            id: id.to_string(),
            kind: WriteKind::Merge(patch),
            precondition: expected_version
                .map(Precondition::Version)
                .or(Some(Precondition::Exists)),
        });
        self
    }

    pub fn delete(
        &mut self,
        collection: &str,
        id: &str,
        expected_version: Option<u64>,
    ) -> &mut Self {
        self.ops.push(WriteOp {
            collection: collection.to_string(),
            id: id.to_string(),
            kind: WriteKind::Delete,
            precondition: expected_version
                .map(Precondition::Version)
                .or(Some(Precondition::Exists)),
        });
        self
    }
}

/// Generic gateway over the backing document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document, generating an id when none is supplied.
    /// Returns the document id.
    async fn create(
        &self,
        collection: &str,
        data: Value,
        id: Option<String>,
    ) -> Result<String, StoreError>;

    async fn read_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn read_one(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Merges the top-level fields of `patch` into an existing document.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn query(
        &self,
        collection: &str,
        field: &str,
        op: QueryOp,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError>;

    /// Applies a batch atomically, checking every precondition first.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Cheap liveness check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
