//! Snapshot lifecycle.
//!
//! A [`ContextManager`] is one editing session: it owns the window host, the
//! persistence collaborator, the clock and the in-memory pointer to the
//! current context. Independent managers never share state.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::capture::{capture_current_layout, CaptureOptions};
use crate::clock::SharedClock;
use crate::error::ContextError;
use crate::host::SharedHost;
use crate::layout::WindowLayout;
use crate::restore::{restore_layout, RestoreOptions, RestoreReport};
use crate::store::SharedStore;
use crate::ContextId;

/// A named, persisted window snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    /// Assigned once at creation
    pub id: ContextId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Bumped on create, switch and override
    pub last_accessed: DateTime<Utc>,
    pub layout: WindowLayout,
}

pub struct ContextManager {
    host: SharedHost,
    store: SharedStore,
    clock: SharedClock,
    capture_options: CaptureOptions,
    restore_options: RestoreOptions,
    current: RwLock<Option<ProjectContext>>,
    /// Held for the whole of every operation that touches the window or the store
    op_lock: Mutex<()>,
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("capture_options", &self.capture_options)
            .field("restore_options", &self.restore_options)
            .finish_non_exhaustive()
    }
}

impl ContextManager {
    pub fn new(host: SharedHost, store: SharedStore, clock: SharedClock) -> Self {
        Self {
            host,
            store,
            clock,
            capture_options: CaptureOptions::default(),
            restore_options: RestoreOptions::default(),
            current: RwLock::new(None),
            op_lock: Mutex::new(()),
        }
    }

    pub fn with_capture_options(mut self, options: CaptureOptions) -> Self {
        self.capture_options = options;
        self
    }

    pub fn with_restore_options(mut self, options: RestoreOptions) -> Self {
        self.restore_options = options;
        self
    }

    /// Capture the window as a new context and make it current.
    pub async fn create(&self, name: &str) -> Result<ProjectContext, ContextError> {
        let name = valid_name(name)?;
        let _guard = self.op_lock.lock().await;

        let layout = capture_current_layout(self.host.as_ref(), &self.capture_options).await?;
        let now = self.clock.now();
        let context = ProjectContext {
            id: ContextId::generate(now),
            name,
            description: None,
            last_accessed: now,
            layout,
        };
        self.store.save(&context).await?;
        *self.current.write().await = Some(context.clone());

        tracing::info!(
            "Created context {:?} ({}) with {} pane(s)",
            context.name,
            context.id,
            context.layout.pane_count()
        );
        Ok(context)
    }

    /// Make a persisted context current and rebuild its layout.
    ///
    /// The access time is persisted and the context becomes current before
    /// the window is touched.
    pub async fn switch_to(
        &self,
        id: &ContextId,
    ) -> Result<(ProjectContext, RestoreReport), ContextError> {
        let _guard = self.op_lock.lock().await;

        let mut context = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ContextError::NotFound(id.to_string()))?;
        context.last_accessed = self.clock.now();
        self.store.save(&context).await?;
        *self.current.write().await = Some(context.clone());

        tracing::info!("Switching to context {:?} ({})", context.name, context.id);
        let report =
            restore_layout(self.host.as_ref(), &context.layout, &self.restore_options).await?;
        Ok((context, report))
    }

    /// Replace the current context's layout with the live window.
    ///
    /// Keeps id and name. The window is not touched.
    pub async fn override_current(&self) -> Result<ProjectContext, ContextError> {
        let _guard = self.op_lock.lock().await;

        let current = self
            .current
            .read()
            .await
            .clone()
            .ok_or(ContextError::NoCurrentContext)?;
        let layout = capture_current_layout(self.host.as_ref(), &self.capture_options).await?;
        let updated = ProjectContext {
            last_accessed: self.clock.now(),
            layout,
            ..current
        };
        self.store.save(&updated).await?;
        *self.current.write().await = Some(updated.clone());

        tracing::info!("Overrode context {:?} ({})", updated.name, updated.id);
        Ok(updated)
    }

    pub async fn current(&self) -> Option<ProjectContext> {
        self.current.read().await.clone()
    }

    /// Select a persisted context without restoring it
    pub async fn set_current(&self, id: &ContextId) -> Result<ProjectContext, ContextError> {
        let _guard = self.op_lock.lock().await;
        let context = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ContextError::NotFound(id.to_string()))?;
        *self.current.write().await = Some(context.clone());
        Ok(context)
    }

    /// All contexts, most recently accessed first
    pub async fn list(&self) -> Result<Vec<ProjectContext>, ContextError> {
        let mut contexts: Vec<ProjectContext> = self.store.get_all().await?.into_values().collect();
        contexts.sort_by(|a, b| {
            b.last_accessed
                .cmp(&a.last_accessed)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(contexts)
    }

    pub async fn get(&self, id: &ContextId) -> Result<Option<ProjectContext>, ContextError> {
        Ok(self.store.get(id).await?)
    }

    /// Look a context up by id, or else by name.
    ///
    /// Names are not unique; the most recently accessed match wins.
    pub async fn find(&self, name_or_id: &str) -> Result<ProjectContext, ContextError> {
        let contexts = self.list().await?;
        if let Some(context) = contexts.iter().find(|c| c.id.as_str() == name_or_id) {
            return Ok(context.clone());
        }
        contexts
            .into_iter()
            .find(|c| c.name == name_or_id)
            .ok_or_else(|| ContextError::NotFound(name_or_id.to_string()))
    }

    pub async fn rename(&self, id: &ContextId, name: &str) -> Result<ProjectContext, ContextError> {
        let name = valid_name(name)?;
        let _guard = self.op_lock.lock().await;

        let mut context = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ContextError::NotFound(id.to_string()))?;
        context.name = name;
        self.store.save(&context).await?;

        let mut current = self.current.write().await;
        if let Some(cur) = current.as_mut().filter(|c| c.id == *id) {
            cur.name = context.name.clone();
        }
        Ok(context)
    }

    /// Remove a context; the current pointer is cleared if it pointed there
    pub async fn delete(&self, id: &ContextId) -> Result<(), ContextError> {
        let _guard = self.op_lock.lock().await;
        self.store.delete(id).await?;

        let mut current = self.current.write().await;
        if current.as_ref().is_some_and(|c| c.id == *id) {
            *current = None;
        }
        tracing::info!("Deleted context {}", id);
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), ContextError> {
        let _guard = self.op_lock.lock().await;
        self.store.clear().await?;
        *self.current.write().await = None;
        tracing::info!("Cleared all contexts");
        Ok(())
    }
}

fn valid_name(name: &str) -> Result<String, ContextError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ContextError::EmptyName);
    }
    Ok(name.to_string())
}
