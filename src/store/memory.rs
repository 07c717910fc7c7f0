//! In-process document store.
//!
//! Collections live in a single `RwLock`-guarded map, which is what makes
//! the atomic batch commit possible: a commit takes the write lock once,
//! validates every precondition against current state, and only then applies
//! the writes. An optional JSON snapshot file gives dev deployments
//! continuity across restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use super::{Document, DocumentStore, Precondition, QueryOp, StoreError, WriteBatch, WriteKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stored {
    version: u64,
    data: Value,
}

type Collections = HashMap<String, HashMap<String, Stored>>;

pub struct MemoryStore {
    inner: RwLock<Collections>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            snapshot_path: None,
        }
    }

    /// Opens a store backed by a JSON snapshot file. The file is loaded if it
    /// exists and rewritten after every successful mutation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let collections = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let loaded: Collections = serde_json::from_str(&raw)?;
            info!(path = %path.display(), collections = loaded.len(), "loaded store snapshot");
            loaded
        } else {
            HashMap::new()
        };
        Ok(Self {
            inner: RwLock::new(collections),
            snapshot_path: Some(path),
        })
    }

    fn persist(&self, collections: &Collections) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        match serde_json::to_vec_pretty(collections) {
            Ok(bytes) => {
                if let Err(err) = std::fs::write(path, bytes) {
                    warn!(path = %path.display(), error = %err, "failed to write store snapshot");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize store snapshot"),
        }
    }

    fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn merge_fields(existing: &mut Value, patch: &Value) -> Result<(), StoreError> {
        let (Some(target), Some(fields)) = (existing.as_object_mut(), patch.as_object()) else {
            return Err(StoreError::InvalidData(
                "documents and patches must be JSON objects".to_string(),
            ));
        };
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn check_precondition(
        collection: &str,
        id: &str,
        current: Option<&Stored>,
        precondition: Option<&Precondition>,
    ) -> Result<(), StoreError> {
        match (precondition, current) {
            (None, _) => Ok(()),
            (Some(Precondition::Exists), Some(_)) => Ok(()),
            (Some(Precondition::Exists), None) => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            (Some(Precondition::NotExists), None) => Ok(()),
            (Some(Precondition::NotExists), Some(_)) => Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            (Some(Precondition::Version(expected)), Some(stored)) => {
                if stored.version == *expected {
                    Ok(())
                } else {
                    Err(StoreError::Conflict {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    })
                }
            }
            (Some(Precondition::Version(_)), None) => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(
        &self,
        collection: &str,
        data: Value,
        id: Option<String>,
    ) -> Result<String, StoreError> {
        if !data.is_object() {
            return Err(StoreError::InvalidData(
                "documents must be JSON objects".to_string(),
            ));
        }
        let id = id.unwrap_or_else(Self::generate_id);
        let mut collections = self.inner.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id,
            });
        }
        docs.insert(id.clone(), Stored { version: 1, data });
        self.persist(&collections);
        Ok(id)
    }

    async fn read_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.inner.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, stored)| Document {
                        id: id.clone(),
                        version: stored.version,
                        data: stored.data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    async fn read_one(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.inner.read().await;
        Ok(collections.get(collection).and_then(|docs| {
            docs.get(id).map(|stored| Document {
                id: id.to_string(),
                version: stored.version,
                data: stored.data.clone(),
            })
        }))
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let mut collections = self.inner.write().await;
        let stored = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        Self::merge_fields(&mut stored.data, &patch)?;
        stored.version += 1;
        self.persist(&collections);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.inner.write().await;
        let removed = collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        if removed.is_none() {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        self.persist(&collections);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        op: QueryOp,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.inner.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, stored)| op.matches(stored.data.get(field), value))
                    .map(|(id, stored)| Document {
                        id: id.clone(),
                        version: stored.version,
                        data: stored.data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut collections = self.inner.write().await;

        // Validate every precondition before touching anything.
        for op in batch.ops() {
            let current = collections
                .get(&op.collection)
                .and_then(|docs| docs.get(&op.id));
            Self::check_precondition(&op.collection, &op.id, current, op.precondition.as_ref())?;
            if let WriteKind::Create(data) | WriteKind::Merge(data) = &op.kind {
                if !data.is_object() {
                    return Err(StoreError::InvalidData(
                        "documents and patches must be JSON objects".to_string(),
                    ));
                }
            }
        }

        for op in batch.ops() {
            let docs = collections.entry(op.collection.clone()).or_default();
            match &op.kind {
                WriteKind::Create(data) => {
                    docs.insert(
                        op.id.clone(),
                        Stored {
                            version: 1,
                            data: data.clone(),
                        },
                    );
                }
                WriteKind::Merge(patch) => {
                    // Precondition::Exists was checked above.
                    if let Some(stored) = docs.get_mut(&op.id) {
                        Self::merge_fields(&mut stored.data, patch)?;
                        stored.version += 1;
                    }
                }
                WriteKind::Delete => {
                    docs.remove(&op.id);
                }
            }
        }

        self.persist(&collections);
        Ok(())
    }
}
