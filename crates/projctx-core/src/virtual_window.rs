//! In-memory window host.
//!
//! `VirtualWindow` implements [`WindowHost`] over a plain model of panes,
//! documents, cursors and terminals. Every mutating call that succeeds is
//! appended to an operation log, so a restore against a virtual window
//! doubles as a replayable plan for a real editor.
//!
//! Split geometry follows the grid convention used by capture: a rightward
//! split lands in the next column of the same row, a downward split starts
//! the next row at column 1.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::HostError;
use crate::host::{
    ActiveEditor, LivePane, LiveTerminal, OpenTarget, PaneHandle, SplitDirection, TerminalHandle,
    WindowHost,
};
use crate::layout::{GridPosition, ScrollAnchor};

/// A mutating host call, as applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOperation {
    CloseAll,
    Split {
        direction: SplitDirection,
        pane: PaneHandle,
    },
    OpenDocument {
        path: PathBuf,
        pane: PaneHandle,
        focus: bool,
    },
    SetCursor {
        pane: PaneHandle,
        line: u32,
        character: u32,
    },
    CreateTerminal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<PathBuf>,
    },
    ShowTerminal {
        terminal: TerminalHandle,
    },
}

impl std::fmt::Display for HostOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostOperation::CloseAll => write!(f, "close all"),
            HostOperation::Split { direction, pane } => {
                let dir = match direction {
                    SplitDirection::Right => "right",
                    SplitDirection::Down => "down",
                };
                write!(f, "split {dir} -> pane {}", pane.0)
            }
            HostOperation::OpenDocument { path, pane, focus } => {
                write!(f, "open {} in pane {}", path.display(), pane.0)?;
                if *focus {
                    write!(f, " (focus)")?;
                }
                Ok(())
            }
            HostOperation::SetCursor {
                pane,
                line,
                character,
            } => write!(f, "cursor {line}:{character} in pane {}", pane.0),
            HostOperation::CreateTerminal { name, cwd } => {
                write!(f, "terminal {}", name.as_deref().unwrap_or("<unnamed>"))?;
                if let Some(cwd) = cwd {
                    write!(f, " in {}", cwd.display())?;
                }
                Ok(())
            }
            HostOperation::ShowTerminal { terminal } => write!(f, "show terminal {}", terminal.0),
        }
    }
}

/// Serializable window arrangement, as exported by an editor
///
/// Paths may be absolute or relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    /// Panes in enumeration order
    #[serde(default)]
    pub panes: Vec<PaneState>,
    /// Index into `panes` of the focused pane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused: Option<usize>,
    #[serde(default)]
    pub terminals: Vec<TerminalState>,
    /// Files that can be opened; when absent, the filesystem is checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<PathBuf>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaneState {
    /// Every document open in the pane
    #[serde(default)]
    pub documents: Vec<PathBuf>,
    /// The document in front; defaults to the first one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<PathBuf>,
    /// Cursor of the visible document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<ScrollAnchor>,
    /// True grid placement, when the editor reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPosition>,
}

impl PaneState {
    /// A pane showing a single document
    pub fn showing(path: impl Into<PathBuf>) -> Self {
        Self {
            documents: vec![path.into()],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug)]
enum FileAccess {
    /// Only these absolute paths can be opened
    Listed(HashSet<PathBuf>),
    /// Any existing regular file can be opened
    Filesystem,
}

#[derive(Debug)]
struct VirtualPane {
    handle: PaneHandle,
    documents: Vec<PathBuf>,
    visible: Option<PathBuf>,
    cursors: HashMap<PathBuf, ScrollAnchor>,
    position: Option<GridPosition>,
}

impl VirtualPane {
    fn empty(handle: PaneHandle, position: Option<GridPosition>) -> Self {
        Self {
            handle,
            documents: Vec::new(),
            visible: None,
            cursors: HashMap::new(),
            position,
        }
    }

    fn show(&mut self, path: &Path) {
        if !self.documents.iter().any(|d| d == path) {
            self.documents.push(path.to_path_buf());
        }
        self.visible = Some(path.to_path_buf());
    }
}

#[derive(Debug)]
struct VirtualTerminal {
    handle: TerminalHandle,
    name: Option<String>,
}

#[derive(Debug)]
struct WindowInner {
    /// Never empty
    panes: Vec<VirtualPane>,
    focused: PaneHandle,
    next_pane: u64,
    reports_geometry: bool,
    terminals: Vec<VirtualTerminal>,
    active_terminal: Option<TerminalHandle>,
    next_terminal: u64,
    files: FileAccess,
    failing_terminals: HashSet<String>,
    fail_splits: bool,
    fail_active_editor: bool,
    operations: Vec<HostOperation>,
}

impl WindowInner {
    fn new(files: FileAccess) -> Self {
        let first = PaneHandle(1);
        Self {
            panes: vec![VirtualPane::empty(first, None)],
            focused: first,
            next_pane: 2,
            reports_geometry: false,
            terminals: Vec::new(),
            active_terminal: None,
            next_terminal: 1,
            files,
            failing_terminals: HashSet::new(),
            fail_splits: false,
            fail_active_editor: false,
            operations: Vec::new(),
        }
    }

    fn allocate_pane(&mut self) -> PaneHandle {
        let handle = PaneHandle(self.next_pane);
        self.next_pane += 1;
        handle
    }

    fn index_of(&self, pane: PaneHandle) -> Option<usize> {
        self.panes.iter().position(|p| p.handle == pane)
    }

    fn pane_mut(&mut self, pane: PaneHandle) -> Result<&mut VirtualPane, HostError> {
        self.panes
            .iter_mut()
            .find(|p| p.handle == pane)
            .ok_or_else(|| HostError::Failed(format!("no pane with handle {}", pane.0)))
    }
}

/// In-memory [`WindowHost`]
#[derive(Debug)]
pub struct VirtualWindow {
    root: Option<PathBuf>,
    delay: Option<Duration>,
    inner: Mutex<WindowInner>,
}

impl VirtualWindow {
    /// A window on `root` with one empty pane and no openable files
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            delay: None,
            inner: Mutex::new(WindowInner::new(FileAccess::Listed(HashSet::new()))),
        }
    }

    /// A window with no workspace folder open
    pub fn without_workspace() -> Self {
        Self {
            root: None,
            delay: None,
            inner: Mutex::new(WindowInner::new(FileAccess::Listed(HashSet::new()))),
        }
    }

    /// A window with one pane per document, first pane focused.
    ///
    /// Every listed document is openable.
    pub fn with_panes(root: impl Into<PathBuf>, documents: &[&str]) -> Self {
        let window = Self::new(root);
        {
            let mut inner = window.lock();
            inner.panes.clear();
            for doc in documents {
                let path = window.resolve(Path::new(doc));
                let handle = inner.allocate_pane();
                let mut pane = VirtualPane::empty(handle, None);
                pane.show(&path);
                inner.panes.push(pane);
                if let FileAccess::Listed(files) = &mut inner.files {
                    files.insert(path);
                }
            }
            if inner.panes.is_empty() {
                let handle = inner.allocate_pane();
                inner.panes.push(VirtualPane::empty(handle, None));
            }
            inner.focused = inner.panes[0].handle;
        }
        window
    }

    /// Rebuild a window from an exported arrangement
    pub fn from_state(root: Option<PathBuf>, state: WindowState) -> Self {
        let window = Self {
            root,
            delay: None,
            inner: Mutex::new(WindowInner::new(FileAccess::Filesystem)),
        };
        {
            let mut inner = window.lock();
            if let Some(files) = &state.files {
                inner.files =
                    FileAccess::Listed(files.iter().map(|f| window.resolve(f)).collect());
            }
            if !state.panes.is_empty() {
                inner.panes.clear();
                inner.reports_geometry = state.panes.iter().all(|p| p.position.is_some());
            }
            for pane_state in &state.panes {
                let handle = inner.allocate_pane();
                let mut pane = VirtualPane::empty(handle, pane_state.position);
                pane.documents = pane_state
                    .documents
                    .iter()
                    .map(|d| window.resolve(d))
                    .collect();
                let visible = pane_state
                    .visible
                    .as_ref()
                    .map(|v| window.resolve(v))
                    .or_else(|| pane.documents.first().cloned());
                if let Some(visible) = visible {
                    pane.show(&visible);
                    if let Some(cursor) = pane_state.cursor {
                        pane.cursors.insert(visible, cursor);
                    }
                }
                inner.panes.push(pane);
            }
            let focused = state
                .focused
                .and_then(|i| inner.panes.get(i))
                .unwrap_or(&inner.panes[0])
                .handle;
            inner.focused = focused;
            for terminal in &state.terminals {
                let handle = TerminalHandle(inner.next_terminal);
                inner.next_terminal += 1;
                inner.terminals.push(VirtualTerminal {
                    handle,
                    name: terminal.name.clone(),
                });
                if terminal.is_active {
                    inner.active_terminal = Some(handle);
                }
            }
        }
        window
    }

    /// Sleep this long before answering any host call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report grid positions for panes created from now on
    pub fn with_reported_geometry(self) -> Self {
        {
            let mut inner = self.lock();
            inner.reports_geometry = true;
            let count = inner.panes.len();
            for (index, pane) in inner.panes.iter_mut().enumerate() {
                if pane.position.is_none() {
                    pane.position = Some(crate::layout::infer_grid_position(index, count));
                }
            }
        }
        self
    }

    /// Append a pane, optionally showing a document
    pub fn push_pane(&self, document: Option<&str>) -> PaneHandle {
        let path = document.map(|d| self.resolve(Path::new(d)));
        let mut inner = self.lock();
        let handle = inner.allocate_pane();
        let mut pane = VirtualPane::empty(handle, None);
        if let Some(path) = path {
            pane.show(&path);
            if let FileAccess::Listed(files) = &mut inner.files {
                files.insert(path);
            }
        }
        inner.panes.push(pane);
        handle
    }

    /// Handles of every pane, in enumeration order
    pub fn pane_handles(&self) -> Vec<PaneHandle> {
        self.lock().panes.iter().map(|p| p.handle).collect()
    }

    pub fn focus(&self, pane: PaneHandle) {
        let mut inner = self.lock();
        if inner.index_of(pane).is_some() {
            inner.focused = pane;
        }
    }

    /// Place the cursor of the document visible in `pane`
    pub fn set_anchor(&self, pane: PaneHandle, anchor: ScrollAnchor) {
        let mut inner = self.lock();
        if let Ok(pane) = inner.pane_mut(pane) {
            if let Some(visible) = pane.visible.clone() {
                pane.cursors.insert(visible, anchor);
            }
        }
    }

    pub fn add_terminal(&self, name: Option<&str>, is_active: bool) -> TerminalHandle {
        let mut inner = self.lock();
        let handle = TerminalHandle(inner.next_terminal);
        inner.next_terminal += 1;
        inner.terminals.push(VirtualTerminal {
            handle,
            name: name.map(str::to_string),
        });
        if is_active {
            inner.active_terminal = Some(handle);
        }
        handle
    }

    /// Make an extra file openable
    pub fn allow_file(&self, path: &str) {
        let path = self.resolve(Path::new(path));
        if let FileAccess::Listed(files) = &mut self.lock().files {
            files.insert(path);
        }
    }

    /// Make a file unopenable, as if it were deleted
    pub fn remove_file(&self, path: &str) {
        let path = self.resolve(Path::new(path));
        if let FileAccess::Listed(files) = &mut self.lock().files {
            files.remove(&path);
        }
    }

    /// Terminals with this name fail to start
    pub fn fail_terminal(&self, name: &str) {
        self.lock().failing_terminals.insert(name.to_string());
    }

    /// Every split request fails
    pub fn fail_splits(&self) {
        self.lock().fail_splits = true;
    }

    /// Reading the focused editor's visible range fails
    pub fn fail_active_editor(&self) {
        self.lock().fail_active_editor = true;
    }

    /// Mutating calls applied so far
    pub fn operations(&self) -> Vec<HostOperation> {
        self.lock().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Current arrangement; paths under the root are made relative
    pub fn state(&self) -> WindowState {
        let inner = self.lock();
        let panes = inner
            .panes
            .iter()
            .map(|pane| PaneState {
                documents: pane.documents.iter().map(|d| self.relative(d)).collect(),
                visible: pane.visible.as_deref().map(|v| self.relative(v)),
                cursor: pane
                    .visible
                    .as_ref()
                    .and_then(|v| pane.cursors.get(v).copied()),
                position: pane.position,
            })
            .collect();
        let terminals = inner
            .terminals
            .iter()
            .map(|t| TerminalState {
                name: t.name.clone(),
                is_active: inner.active_terminal == Some(t.handle),
            })
            .collect();
        WindowState {
            panes,
            focused: inner.index_of(inner.focused),
            terminals,
            files: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        }
    }

    fn relative(&self, path: &Path) -> PathBuf {
        self.root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.to_path_buf())
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    async fn is_openable(&self, path: &Path) -> bool {
        let listed = match &self.lock().files {
            FileAccess::Listed(files) => Some(files.contains(path)),
            FileAccess::Filesystem => None,
        };
        match listed {
            Some(found) => found,
            None => tokio::fs::metadata(path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
        }
    }
}

#[async_trait]
impl WindowHost for VirtualWindow {
    fn workspace_root(&self) -> Option<PathBuf> {
        self.root.clone()
    }

    async fn list_panes(&self) -> Result<Vec<LivePane>, HostError> {
        self.pause().await;
        let inner = self.lock();
        Ok(inner
            .panes
            .iter()
            .enumerate()
            .map(|(index, pane)| LivePane {
                handle: pane.handle,
                view_column: index as u32 + 1,
                is_active: pane.handle == inner.focused,
                document: pane.visible.clone(),
                position: pane.position,
            })
            .collect())
    }

    async fn active_editor(&self) -> Result<Option<ActiveEditor>, HostError> {
        self.pause().await;
        let inner = self.lock();
        if inner.fail_active_editor {
            return Err(HostError::Failed("visible range unavailable".to_string()));
        }
        let Some(index) = inner.index_of(inner.focused) else {
            return Ok(None);
        };
        let pane = &inner.panes[index];
        Ok(pane.visible.as_ref().map(|path| ActiveEditor {
            pane: pane.handle,
            path: path.clone(),
            anchor: pane.cursors.get(path).copied().unwrap_or_default(),
        }))
    }

    async fn focused_pane(&self) -> Result<PaneHandle, HostError> {
        self.pause().await;
        Ok(self.lock().focused)
    }

    async fn open_document(
        &self,
        path: &Path,
        target: OpenTarget,
        focus: bool,
    ) -> Result<PaneHandle, HostError> {
        self.pause().await;
        if !self.is_openable(path).await {
            return Err(HostError::NotFound(path.to_path_buf()));
        }
        let mut inner = self.lock();
        let pane = match target {
            OpenTarget::Focused => inner.focused,
            OpenTarget::Pane(pane) => pane,
        };
        inner.pane_mut(pane)?.show(path);
        if focus {
            inner.focused = pane;
        }
        inner.operations.push(HostOperation::OpenDocument {
            path: path.to_path_buf(),
            pane,
            focus,
        });
        Ok(pane)
    }

    async fn split(&self, direction: SplitDirection) -> Result<PaneHandle, HostError> {
        self.pause().await;
        let mut inner = self.lock();
        if inner.fail_splits {
            return Err(HostError::Failed("split rejected".to_string()));
        }
        let index = inner
            .index_of(inner.focused)
            .ok_or_else(|| HostError::Failed("no focused pane".to_string()))?;
        let position = inner.panes[index].position.map(|p| match direction {
            SplitDirection::Right => GridPosition::new(p.row, p.column + 1),
            SplitDirection::Down => GridPosition::new(p.row + 1, 1),
        });
        let handle = inner.allocate_pane();
        inner
            .panes
            .insert(index + 1, VirtualPane::empty(handle, position));
        inner.focused = handle;
        inner.operations.push(HostOperation::Split {
            direction,
            pane: handle,
        });
        Ok(handle)
    }

    async fn close_all(&self) -> Result<(), HostError> {
        self.pause().await;
        let mut inner = self.lock();
        let handle = inner.allocate_pane();
        let position = inner.reports_geometry.then(|| GridPosition::new(1, 1));
        inner.panes = vec![VirtualPane::empty(handle, position)];
        inner.focused = handle;
        inner.operations.push(HostOperation::CloseAll);
        Ok(())
    }

    async fn set_cursor(&self, pane: PaneHandle, anchor: ScrollAnchor) -> Result<(), HostError> {
        self.pause().await;
        let mut inner = self.lock();
        let target = inner.pane_mut(pane)?;
        let visible = target
            .visible
            .clone()
            .ok_or_else(|| HostError::Failed(format!("pane {} shows no document", pane.0)))?;
        target.cursors.insert(visible, anchor);
        inner.operations.push(HostOperation::SetCursor {
            pane,
            line: anchor.line,
            character: anchor.character,
        });
        Ok(())
    }

    async fn list_terminals(&self) -> Result<Vec<LiveTerminal>, HostError> {
        self.pause().await;
        let inner = self.lock();
        Ok(inner
            .terminals
            .iter()
            .map(|t| LiveTerminal {
                handle: t.handle,
                name: t.name.clone(),
                is_active: inner.active_terminal == Some(t.handle),
            })
            .collect())
    }

    async fn create_terminal(
        &self,
        name: Option<&str>,
        cwd: Option<&Path>,
    ) -> Result<TerminalHandle, HostError> {
        self.pause().await;
        let mut inner = self.lock();
        if let Some(name) = name {
            if inner.failing_terminals.contains(name) {
                return Err(HostError::Failed(format!("cannot start terminal {name}")));
            }
        }
        let handle = TerminalHandle(inner.next_terminal);
        inner.next_terminal += 1;
        inner.terminals.push(VirtualTerminal {
            handle,
            name: name.map(str::to_string),
        });
        inner.operations.push(HostOperation::CreateTerminal {
            name: name.map(str::to_string),
            cwd: cwd.map(Path::to_path_buf),
        });
        Ok(handle)
    }

    async fn show_terminal(&self, terminal: TerminalHandle) -> Result<(), HostError> {
        self.pause().await;
        let mut inner = self.lock();
        if !inner.terminals.iter().any(|t| t.handle == terminal) {
            return Err(HostError::Failed(format!(
                "no terminal with handle {}",
                terminal.0
            )));
        }
        inner.active_terminal = Some(terminal);
        inner
            .operations
            .push(HostOperation::ShowTerminal { terminal });
        Ok(())
    }
}
