// Workspace fixtures

use chrono::Duration;
use projctx::app::App;
use projctx::config::Config;
use projctx::prompt::LinePrompter;
use projctx_core::clock::TestClock;
use projctx_core::virtual_window::{PaneState, WindowState};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary workspace with real files and a shared test clock
pub struct WorkspaceFixture {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub config: Config,
    pub clock: Arc<TestClock>,
}

impl WorkspaceFixture {
    /// Create a workspace containing empty files at the given relative paths
    pub fn new(files: &[&str]) -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path().join("project");
        fs::create_dir_all(&root)?;
        for file in files {
            let path = root.join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "")?;
        }

        Ok(Self {
            _temp_dir: temp_dir,
            root,
            config: Config::default(),
            clock: TestClock::shared(),
        })
    }

    /// An app whose window shows `state`
    pub fn app(&self, state: WindowState) -> App {
        App::new(self.root.clone(), &self.config, state, self.clock.clone())
    }

    /// Let a minute pass so access times differ
    pub fn tick(&self) {
        self.clock.advance(Duration::minutes(1));
    }

    pub fn storage_path(&self) -> PathBuf {
        self.config.storage_path(&self.root)
    }

    pub fn remove(&self, file: &str) -> anyhow::Result<()> {
        fs::remove_file(self.root.join(file))?;
        Ok(())
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// One pane per document, in order, with `focused` in front
pub fn panes(documents: &[&str], focused: usize) -> WindowState {
    WindowState {
        panes: documents.iter().map(|d| PaneState::showing(*d)).collect(),
        focused: Some(focused),
        ..Default::default()
    }
}

/// Prompter answering from `script`, one line per question
pub fn scripted(script: &'static str) -> LinePrompter<&'static [u8], Vec<u8>> {
    LinePrompter::new(script.as_bytes(), Vec::new(), false)
}

/// Everything a scripted prompter wrote
pub fn transcript(prompter: LinePrompter<&'static [u8], Vec<u8>>) -> String {
    String::from_utf8(prompter.into_output()).unwrap_or_default()
}
