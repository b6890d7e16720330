//! Persistence collaborator.
//!
//! Contexts are stored as a mapping `id -> ProjectContext`. Every operation
//! is independently idempotent: saving the same context twice, deleting a
//! missing id, or clearing an empty store all succeed.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::session::ProjectContext;
use crate::ContextId;

/// All persisted contexts, keyed by id
pub type ContextMap = BTreeMap<ContextId, ProjectContext>;

#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Load every persisted context
    async fn get_all(&self) -> Result<ContextMap, StoreError>;

    /// Load one context
    async fn get(&self, id: &ContextId) -> Result<Option<ProjectContext>, StoreError> {
        Ok(self.get_all().await?.remove(id))
    }

    /// Insert or replace a context by id
    async fn save(&self, context: &ProjectContext) -> Result<(), StoreError>;

    /// Remove a context; a missing id is not an error
    async fn delete(&self, id: &ContextId) -> Result<(), StoreError>;

    /// Remove every context
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Type alias for a shared store.
pub type SharedStore = Arc<dyn ContextStore>;

/// Volatile store, for tests and for sessions that opt out of persistence
#[derive(Debug, Default)]
pub struct MemoryContextStore {
    contexts: Mutex<ContextMap>,
    /// When set, every write fails with this message
    fail_writes: Mutex<Option<String>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail, to exercise persistence fault paths
    pub async fn fail_writes_with(&self, message: impl Into<String>) {
        *self.fail_writes.lock().await = Some(message.into());
    }

    async fn check_writable(&self) -> Result<(), StoreError> {
        match self.fail_writes.lock().await.as_ref() {
            Some(msg) => Err(StoreError::IoError(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn get_all(&self) -> Result<ContextMap, StoreError> {
        Ok(self.contexts.lock().await.clone())
    }

    async fn save(&self, context: &ProjectContext) -> Result<(), StoreError> {
        self.check_writable().await?;
        self.contexts
            .lock()
            .await
            .insert(context.id.clone(), context.clone());
        Ok(())
    }

    async fn delete(&self, id: &ContextId) -> Result<(), StoreError> {
        self.check_writable().await?;
        self.contexts.lock().await.remove(id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check_writable().await?;
        self.contexts.lock().await.clear();
        Ok(())
    }
}
