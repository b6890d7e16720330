//! Wiring for the command-line front end.
//!
//! An [`App`] binds one workspace to a virtual window rebuilt from an
//! exported arrangement and to the workspace's context file.

use anyhow::{Context, Result as AnyhowResult};
use chrono::Local;
use projctx_core::clock::SharedClock;
use projctx_core::host::SharedHost;
use projctx_core::virtual_window::{HostOperation, VirtualWindow, WindowState};
use projctx_core::{ContextError, ContextManager, ProjectContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::storage::FileContextStore;

pub struct App {
    workspace: PathBuf,
    window: Arc<VirtualWindow>,
    manager: ContextManager,
}

impl App {
    pub fn new(workspace: PathBuf, config: &Config, state: WindowState, clock: SharedClock) -> Self {
        let window = Arc::new(VirtualWindow::from_state(Some(workspace.clone()), state));
        let store = Arc::new(FileContextStore::new(config.storage_path(&workspace)));
        let host: SharedHost = window.clone();
        let manager = ContextManager::new(host, store, clock)
            .with_capture_options(config.capture.into())
            .with_restore_options(config.restore.into());

        tracing::debug!(
            "Opened workspace {} with record {}",
            workspace.display(),
            config.storage_path(&workspace).display()
        );

        Self {
            workspace,
            window,
            manager,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn manager(&self) -> &ContextManager {
        &self.manager
    }

    pub fn window(&self) -> &VirtualWindow {
        &self.window
    }

    /// Look a context up by name or id and make it current without restoring
    pub async fn select(&self, name_or_id: &str) -> Result<ProjectContext, ContextError> {
        let found = self.manager.find(name_or_id).await?;
        self.manager.set_current(&found.id).await
    }
}

/// Read an exported window arrangement
pub fn load_window_state(path: &Path) -> AnyhowResult<WindowState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read window state {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse window state {}", path.display()))
}

/// Write a window arrangement as pretty JSON
pub fn write_window_state(path: &Path, state: &WindowState) -> AnyhowResult<()> {
    let content = serde_json::to_string_pretty(state).context("Failed to serialize window state")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write window state {}", path.display()))
}

/// One operation per line
pub fn render_plan(operations: &[HostOperation]) -> String {
    operations
        .iter()
        .map(|op| format!("{op}\n"))
        .collect()
}

/// Table of contexts for `list`, current one marked with `*`
pub fn render_list(contexts: &[ProjectContext], current: Option<&ProjectContext>) -> String {
    let width = contexts
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for context in contexts {
        let marker = if current.is_some_and(|c| c.id == context.id) {
            '*'
        } else {
            ' '
        };
        let accessed = context
            .last_accessed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S");
        out.push_str(&format!(
            "{marker} {:<width$}  {accessed}  {} pane(s)  {}\n",
            context.name,
            context.layout.pane_count(),
            context.id,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use projctx_core::clock::TestClock;
    use projctx_core::virtual_window::PaneState;
    use tempfile::TempDir;

    fn workspace_with(files: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for file in files {
            let path = temp.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "").unwrap();
        }
        temp
    }

    fn two_panes() -> WindowState {
        WindowState {
            panes: vec![PaneState::showing("src/a.rs"), PaneState::showing("src/b.rs")],
            focused: Some(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_contexts_persist_across_apps() {
        let temp = workspace_with(&["src/a.rs", "src/b.rs"]);
        let config = Config::default();

        let first = App::new(
            temp.path().to_path_buf(),
            &config,
            two_panes(),
            TestClock::shared(),
        );
        let created = first.manager().create("Review").await.unwrap();
        assert!(config.storage_path(temp.path()).exists());

        let second = App::new(
            temp.path().to_path_buf(),
            &config,
            WindowState::default(),
            TestClock::shared(),
        );
        let selected = second.select("Review").await.unwrap();
        assert_eq!(selected.id, created.id);
        assert_eq!(second.manager().current().await.unwrap().id, created.id);

        let (_, report) = second.manager().switch_to(&created.id).await.unwrap();
        assert_eq!(report.panes_created, 2);
        let state = second.window().state();
        assert_eq!(state.panes.len(), 2);
        assert_eq!(state.focused, Some(1));
        assert_eq!(state.panes[1].visible, Some(PathBuf::from("src/b.rs")));
    }

    #[test]
    fn test_render_plan() {
        let plan = render_plan(&[
            HostOperation::CloseAll,
            HostOperation::Split {
                direction: projctx_core::host::SplitDirection::Down,
                pane: projctx_core::host::PaneHandle(3),
            },
        ]);
        insta::assert_snapshot!(plan, @r"
        close all
        split down -> pane 3
        ");
    }

    #[test]
    fn test_window_state_file_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("window.json");
        write_window_state(&path, &two_panes()).unwrap();
        assert_eq!(load_window_state(&path).unwrap(), two_panes());

        std::fs::write(&path, "{ not json").unwrap();
        let err = load_window_state(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse window state"));
    }
}
