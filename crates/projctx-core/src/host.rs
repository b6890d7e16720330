//! Window host abstraction.
//!
//! The host is the editor whose window is being captured and rebuilt. Its
//! API is deliberately narrow: it can enumerate panes by ordinality, open a
//! document, split the focused pane to the right or downward, and close
//! everything. There is no way to create a pane at an absolute position.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::HostError;
use crate::layout::{GridPosition, ScrollAnchor};

/// Handle to a live pane, valid until the pane is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaneHandle(pub u64);

/// Handle to a live terminal session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminalHandle(pub u64);

/// Direction of a relative split of the focused pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitDirection {
    /// New pane to the right, same row
    Right,
    /// New pane below, next row
    Down,
}

/// Where `open_document` places a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "pane")]
pub enum OpenTarget {
    /// Whichever pane currently has focus
    Focused,
    Pane(PaneHandle),
}

/// A pane as enumerated by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePane {
    pub handle: PaneHandle,
    /// Left-to-right ordinality, 1-based
    pub view_column: u32,
    /// Whether this pane holds global focus
    pub is_active: bool,
    /// Absolute path of the visible text document; `None` for non-file editors
    pub document: Option<PathBuf>,
    /// True grid placement, for hosts able to report it
    pub position: Option<GridPosition>,
}

/// The globally focused text editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEditor {
    pub pane: PaneHandle,
    /// Absolute path of the document
    pub path: PathBuf,
    /// Start of the visible range
    pub anchor: ScrollAnchor,
}

/// A terminal session as enumerated by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveTerminal {
    pub handle: TerminalHandle,
    pub name: Option<String>,
    /// Whether this is the foreground terminal
    pub is_active: bool,
}

/// Async window host trait
///
/// Every call is a suspension point: the host is an external window manager
/// and may answer slowly. Calls are issued strictly one after another.
#[async_trait]
pub trait WindowHost: Send + Sync {
    /// Root folder of the open workspace, if any
    fn workspace_root(&self) -> Option<PathBuf>;

    /// All panes, in host enumeration order
    async fn list_panes(&self) -> Result<Vec<LivePane>, HostError>;

    /// The globally focused text editor, if it shows a document
    async fn active_editor(&self) -> Result<Option<ActiveEditor>, HostError>;

    /// The pane that currently has focus
    async fn focused_pane(&self) -> Result<PaneHandle, HostError>;

    /// Open a document (absolute path) and return the pane showing it.
    ///
    /// With `focus` the target pane also receives focus; otherwise focus
    /// stays where it was.
    async fn open_document(
        &self,
        path: &Path,
        target: OpenTarget,
        focus: bool,
    ) -> Result<PaneHandle, HostError>;

    /// Split the focused pane. The new pane is focused and returned.
    async fn split(&self, direction: SplitDirection) -> Result<PaneHandle, HostError>;

    /// Close every pane, leaving a single empty focused pane
    async fn close_all(&self) -> Result<(), HostError>;

    /// Move the cursor of the document shown in `pane` and reveal it
    async fn set_cursor(&self, pane: PaneHandle, anchor: ScrollAnchor) -> Result<(), HostError>;

    /// All terminal sessions, in creation order
    async fn list_terminals(&self) -> Result<Vec<LiveTerminal>, HostError>;

    /// Start a new terminal session
    async fn create_terminal(
        &self,
        name: Option<&str>,
        cwd: Option<&Path>,
    ) -> Result<TerminalHandle, HostError>;

    /// Bring a terminal to the foreground
    async fn show_terminal(&self, terminal: TerminalHandle) -> Result<(), HostError>;
}

/// Type alias for a shared host.
pub type SharedHost = Arc<dyn WindowHost>;
