//! Grid model of a window arrangement.
//!
//! A `WindowLayout` is a flat collection of editor groups (panes), each
//! addressed by an absolute 1-based `(row, column)` position. Capture infers
//! those positions; restore consumes them as targets to reach through
//! relative splits. Field names serialize in camelCase so the persisted
//! record reads `editorGroups`, `activeGroup`, `viewColumn`, ...

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::PaneId;

/// Absolute 1-based grid coordinates of a pane
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct GridPosition {
    // Field order matters: the derived Ord is row-major.
    pub row: u32,
    pub column: u32,
}

impl GridPosition {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    pub fn is_valid(&self) -> bool {
        self.row >= 1 && self.column >= 1
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Cursor/viewport anchor of a document (0-based line and character)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ScrollAnchor {
    pub line: u32,
    pub character: u32,
}

impl ScrollAnchor {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A document open in a pane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenFile {
    /// Workspace-relative path
    pub path: PathBuf,
    /// Ordinality of the pane this file was open in at capture time
    pub view_column: u32,
    /// Only recorded for the globally focused document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll: Option<ScrollAnchor>,
}

/// One pane of the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditorGroup {
    /// Host handle at capture time; only meaningful within one capture
    pub id: PaneId,
    pub position: GridPosition,
    /// Fraction of the window, currently always `1 / pane count`
    pub size: f64,
    pub files: Vec<OpenFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_file: Option<PathBuf>,
}

impl EditorGroup {
    /// The document that should end up visible in this pane
    pub fn visible_path(&self) -> Option<&Path> {
        self.active_file
            .as_deref()
            .or_else(|| self.files.first().map(|f| f.path.as_path()))
    }

    /// The scroll anchor recorded for any document of this pane
    pub fn scroll_anchor(&self) -> Option<(&Path, ScrollAnchor)> {
        self.files
            .iter()
            .find_map(|f| f.scroll.map(|anchor| (f.path.as_path(), anchor)))
    }
}

/// A terminal session; output and running processes are not preserved
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Never populated by capture: hosts do not expose a terminal's working
    /// directory. Kept so records written by a richer host still restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    pub is_visible: bool,
}

/// The full arrangement of a window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindowLayout {
    pub editor_groups: Vec<EditorGroup>,
    /// Pane that held focus at capture time; may dangle after files vanish
    #[serde(
        default,
        deserialize_with = "deserialize_active_group",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<u32>")]
    pub active_group: Option<PaneId>,
    #[serde(default)]
    pub terminals: Vec<TerminalConfig>,
}

/// Older records store `0` for "no active group".
fn deserialize_active_group<'de, D>(deserializer: D) -> Result<Option<PaneId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<u32> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|id| *id != 0).map(PaneId))
}

/// Structural problem in a grid model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Row and column are 1-based; zero is never produced by capture
    InvalidPosition { pane: PaneId, position: GridPosition },
    /// Two panes claim the same cell
    DuplicatePosition { position: GridPosition },
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::InvalidPosition { pane, position } => {
                write!(f, "{pane} has invalid grid position {position}")
            }
            LayoutError::DuplicatePosition { position } => {
                write!(f, "More than one pane at grid position {position}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// Rows and columns of the square-ish grid used for `count` panes.
///
/// `columns = ceil(sqrt(count))`, `rows = ceil(count / columns)`.
pub fn grid_dimensions(count: usize) -> (u32, u32) {
    if count == 0 {
        return (0, 0);
    }
    let mut columns = 1usize;
    while columns * columns < count {
        columns += 1;
    }
    let rows = count.div_ceil(columns);
    (rows as u32, columns as u32)
}

/// Grid position of the pane at `index` (enumeration order) out of `count`.
///
/// The host only exposes left-to-right ordinality, so the arrangement is
/// approximated by filling the grid row-major. The result is a pure function
/// of `(index, count)`.
pub fn infer_grid_position(index: usize, count: usize) -> GridPosition {
    let (_, columns) = grid_dimensions(count.max(index + 1));
    let columns = columns as usize;
    GridPosition {
        row: (index / columns) as u32 + 1,
        column: (index % columns) as u32 + 1,
    }
}

impl WindowLayout {
    pub fn pane_count(&self) -> usize {
        self.editor_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editor_groups.is_empty()
    }

    pub fn find_group(&self, id: PaneId) -> Option<&EditorGroup> {
        self.editor_groups.iter().find(|g| g.id == id)
    }

    /// Check that every position is 1-based and unique.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut seen = HashSet::new();
        for group in &self.editor_groups {
            if !group.position.is_valid() {
                return Err(LayoutError::InvalidPosition {
                    pane: group.id,
                    position: group.position,
                });
            }
            if !seen.insert(group.position) {
                return Err(LayoutError::DuplicatePosition {
                    position: group.position,
                });
            }
        }
        Ok(())
    }

    /// Copy of this layout ready for the greedy restore pass.
    ///
    /// Panes come back sorted row-major. A layout that fails `validate()`
    /// (built by hand, or written by an older capture) has its positions
    /// re-inferred from the stored pane order first.
    pub fn normalized(&self) -> WindowLayout {
        let mut layout = self.clone();
        if let Err(e) = layout.validate() {
            tracing::warn!("Re-inferring grid positions: {}", e);
            let count = layout.editor_groups.len();
            for (index, group) in layout.editor_groups.iter_mut().enumerate() {
                group.position = infer_grid_position(index, count);
            }
        }
        sort_row_major(&mut layout.editor_groups);
        layout
    }
}

/// Stable sort by `(row, column)`.
pub fn sort_row_major(groups: &mut [EditorGroup]) {
    groups.sort_by_key(|g| g.position);
}
