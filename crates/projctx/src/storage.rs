//! JSON file persistence for project contexts.
//!
//! The whole record lives in one file inside the workspace:
//!
//! ```json
//! { "contexts": { "<id>": { "id": "...", "name": "...", "layout": { ... } } } }
//! ```
//!
//! Every write rewrites the file through a temp file and a rename, so a
//! crash mid-write leaves the previous record intact.

use async_trait::async_trait;
use projctx_core::store::{ContextMap, ContextStore};
use projctx_core::{ContextId, ProjectContext, StoreError};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// On-disk shape of the context file
#[derive(Debug, Default, Serialize, Deserialize)]
struct ContextRecord {
    #[serde(default)]
    contexts: ContextMap,
}

/// [`ContextStore`] backed by a single JSON file
#[derive(Debug)]
pub struct FileContextStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> Result<ContextRecord, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No context file at {}", self.path.display());
                return Ok(ContextRecord::default());
            }
            Err(e) => {
                return Err(StoreError::IoError(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(ContextRecord::default());
        }

        serde_json::from_str(&content)
            .map_err(|e| StoreError::ParseError(format!("{}: {}", self.path.display(), e)))
    }

    async fn write_record(&self, record: &ContextRecord) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(record)
            .map_err(|e| StoreError::SerializeError(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::IoError(format!("{}: {}", parent.display(), e)))?;
        }

        self.atomic_write(content.as_bytes())
            .await
            .map_err(|e| StoreError::IoError(format!("{}: {}", self.path.display(), e)))?;

        tracing::debug!(
            "Wrote {} context(s) to {}",
            record.contexts.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Write via temp file and rename
    async fn atomic_write(&self, content: &[u8]) -> std::io::Result<()> {
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    async fn update<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut ContextMap) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_record().await?;
        apply(&mut record.contexts);
        self.write_record(&record).await
    }
}

#[async_trait]
impl ContextStore for FileContextStore {
    async fn get_all(&self) -> Result<ContextMap, StoreError> {
        Ok(self.read_record().await?.contexts)
    }

    async fn save(&self, context: &ProjectContext) -> Result<(), StoreError> {
        let context = context.clone();
        self.update(move |contexts| {
            contexts.insert(context.id.clone(), context);
        })
        .await
    }

    async fn delete(&self, id: &ContextId) -> Result<(), StoreError> {
        self.update(|contexts| {
            contexts.remove(id);
        })
        .await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_record(&ContextRecord::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use projctx_core::layout::{EditorGroup, GridPosition, OpenFile, WindowLayout};
    use projctx_core::PaneId;
    use tempfile::TempDir;

    fn create_test_store() -> (FileContextStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileContextStore::new(
            temp_dir
                .path()
                .join(".projctx")
                .join("project-contexts.json"),
        );
        (store, temp_dir)
    }

    fn context(id: &str, name: &str) -> ProjectContext {
        ProjectContext {
            id: ContextId::from(id),
            name: name.to_string(),
            description: None,
            last_accessed: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            layout: WindowLayout {
                editor_groups: vec![EditorGroup {
                    id: PaneId(1),
                    position: GridPosition::new(1, 1),
                    size: 1.0,
                    files: vec![OpenFile {
                        path: PathBuf::from("src/main.rs"),
                        view_column: 1,
                        scroll: None,
                    }],
                    active_file: Some(PathBuf::from("src/main.rs")),
                }],
                active_group: Some(PaneId(1)),
                terminals: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let (store, _temp) = create_test_store();
        assert!(store.get_all().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_round_trips() {
        let (store, _temp) = create_test_store();
        let ctx = context("1", "Frontend");
        store.save(&ctx).await.unwrap();

        assert!(store.path().exists());
        assert_eq!(store.get(&ctx.id).await.unwrap(), Some(ctx.clone()));

        // A fresh store over the same file sees the same record
        let reopened = FileContextStore::new(store.path());
        assert_eq!(reopened.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_is_an_upsert() {
        let (store, _temp) = create_test_store();
        store.save(&context("1", "Old")).await.unwrap();
        store.save(&context("1", "New")).await.unwrap();
        store.save(&context("2", "Other")).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&ContextId::from("1")].name, "New");
    }

    #[tokio::test]
    async fn test_delete_and_clear_are_idempotent() {
        let (store, _temp) = create_test_store();
        store.save(&context("1", "A")).await.unwrap();
        store.save(&context("2", "B")).await.unwrap();

        store.delete(&ContextId::from("1")).await.unwrap();
        store.delete(&ContextId::from("1")).await.unwrap();
        assert_eq!(store.get_all().await.unwrap().len(), 1);

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "contexts": {} }));
    }

    #[tokio::test]
    async fn test_record_uses_camel_case_keys() {
        let (store, _temp) = create_test_store();
        store.save(&context("1", "A")).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let saved = &value["contexts"]["1"];
        assert_eq!(saved["name"], "A");
        assert!(saved["lastAccessed"].is_string());
        assert_eq!(saved["layout"]["activeGroup"], 1);
        assert_eq!(
            saved["layout"]["editorGroups"][0]["files"][0]["viewColumn"],
            1
        );
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error_not_empty() {
        let (store, _temp) = create_test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ this is not json").unwrap();

        let err = store.get_all().await.unwrap_err();
        assert!(matches!(err, StoreError::ParseError(_)));

        // A failed read must not clobber the file
        assert!(store.save(&context("1", "A")).await.is_err());
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "{ this is not json");
    }

    #[tokio::test]
    async fn test_reads_legacy_record() {
        let (store, _temp) = create_test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"{
  "contexts": {
    "1700000000000": {
      "id": "1700000000000",
      "name": "Main",
      "lastAccessed": "2023-11-14T22:13:20.000Z",
      "layout": {
        "editorGroups": [
          {
            "id": 1,
            "position": { "column": 0, "row": 0 },
            "size": 1,
            "files": [{ "path": "src/a.ts", "viewColumn": 1 }],
            "activeFile": "src/a.ts"
          }
        ],
        "activeGroup": 0
      }
    }
  }
}"#,
        )
        .unwrap();

        let all = store.get_all().await.unwrap();
        let ctx = &all[&ContextId::from("1700000000000")];
        assert_eq!(ctx.name, "Main");
        assert_eq!(ctx.layout.active_group, None);
        assert!(ctx.layout.terminals.is_empty());
        assert_eq!(ctx.layout.editor_groups[0].position, GridPosition::new(0, 0));
    }
}
