//! Layout restore.
//!
//! The host can only split the focused pane to the right or downward, so an
//! absolute grid is rebuilt by a single greedy pass over the panes in
//! row-major order: a pane whose row is greater than the current row is
//! reached with a downward split, any other pane with a rightward split.
//! This only reaches the target when rows never decrease along the pass,
//! which is why the layout is normalized first.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{HostError, RestoreError};
use crate::host::{OpenTarget, PaneHandle, SplitDirection, WindowHost};
use crate::layout::{EditorGroup, WindowLayout};
use crate::terminal::restore_terminals;
use crate::PaneId;

/// Knobs for `restore_layout`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOptions {
    pub restore_terminals: bool,
    pub restore_scroll: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            restore_terminals: true,
            restore_scroll: true,
        }
    }
}

/// A document that could not be reopened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Workspace-relative path, as stored
    pub path: PathBuf,
    pub reason: String,
}

/// What a restore actually achieved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub panes_created: usize,
    pub files_opened: usize,
    pub skipped: Vec<SkippedFile>,
    pub focus_restored: bool,
    pub scroll_restored: bool,
    pub terminals_created: usize,
    pub terminals_failed: usize,
}

impl RestoreReport {
    /// True when nothing had to be skipped
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.terminals_failed == 0
    }

    /// One-line status message
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Restored {} pane(s) with {} file(s)",
            self.panes_created, self.files_opened
        );
        if self.terminals_created > 0 {
            summary.push_str(&format!(" and {} terminal(s)", self.terminals_created));
        }
        if !self.skipped.is_empty() {
            let names: Vec<String> = self
                .skipped
                .iter()
                .map(|s| s.path.display().to_string())
                .collect();
            summary.push_str(&format!(
                "; skipped {} file(s): {}",
                self.skipped.len(),
                names.join(", ")
            ));
        }
        if self.terminals_failed > 0 {
            summary.push_str(&format!(
                "; {} terminal(s) failed to start",
                self.terminals_failed
            ));
        }
        summary
    }
}

/// Relative splits needed to reach `layout`, one per pane after the first.
pub fn plan_splits(layout: &WindowLayout) -> Vec<SplitDirection> {
    split_sequence(&layout.normalized().editor_groups)
}

/// Greedy split sequence over panes already sorted row-major
fn split_sequence(groups: &[EditorGroup]) -> Vec<SplitDirection> {
    let Some(first) = groups.first() else {
        return Vec::new();
    };
    let mut current_row = first.position.row;
    groups[1..]
        .iter()
        .map(|group| {
            if group.position.row > current_row {
                current_row = group.position.row;
                SplitDirection::Down
            } else {
                SplitDirection::Right
            }
        })
        .collect()
}

/// Rebuild `layout` in the host window.
///
/// Existing panes are closed first. Documents that cannot be opened are
/// skipped and recorded in the report; the remaining panes and files are
/// still restored. A layout without panes leaves the editor area untouched.
/// Only a failure to shape the grid itself aborts.
pub async fn restore_layout(
    host: &dyn WindowHost,
    layout: &WindowLayout,
    options: &RestoreOptions,
) -> Result<RestoreReport, RestoreError> {
    let root = host.workspace_root().ok_or(RestoreError::NoWorkspace)?;
    let layout = layout.normalized();
    let mut report = RestoreReport::default();

    tracing::info!(
        "Restoring layout: {} pane(s), {} terminal(s)",
        layout.pane_count(),
        layout.terminals.len()
    );

    if layout.is_empty() {
        tracing::debug!("Layout has no panes, leaving editors as they are");
    } else {
        let mut restorer = PaneRestorer {
            host,
            root: &root,
            report: &mut report,
            handles: HashMap::new(),
            opened: HashSet::new(),
        };
        restorer.build_grid(&layout.editor_groups).await?;
        restorer.restore_focus(&layout).await;
        if options.restore_scroll {
            restorer.restore_scroll(&layout.editor_groups).await;
        }
    }

    if options.restore_terminals && !layout.terminals.is_empty() {
        let terminals = restore_terminals(host, &root, &layout.terminals).await;
        report.terminals_created = terminals.created;
        report.terminals_failed = terminals.failed.len();
    }

    tracing::debug!("{}", report.summary());
    Ok(report)
}

struct PaneRestorer<'a> {
    host: &'a dyn WindowHost,
    root: &'a Path,
    report: &'a mut RestoreReport,
    /// Live pane created for each stored group
    handles: HashMap<PaneId, PaneHandle>,
    /// Documents successfully shown, per pane
    opened: HashSet<(PaneHandle, PathBuf)>,
}

impl PaneRestorer<'_> {
    async fn build_grid(&mut self, groups: &[EditorGroup]) -> Result<(), RestoreError> {
        let directions = split_sequence(groups);

        self.host.close_all().await?;

        for (index, group) in groups.iter().enumerate() {
            let pane = if index == 0 {
                self.host.focused_pane().await?
            } else {
                let direction = directions[index - 1];
                tracing::trace!("Split {:?} for group at {}", direction, group.position);
                self.host.split(direction).await.map_err(|e| {
                    tracing::error!("Failed to create split during layout restore: {}", e);
                    RestoreError::Host(e)
                })?
            };
            self.report.panes_created += 1;
            self.handles.insert(group.id, pane);
            self.open_files(group, pane).await;
        }

        tracing::debug!(
            "Created {} pane(s), opened {} file(s)",
            self.report.panes_created,
            self.report.files_opened
        );
        Ok(())
    }

    /// Open every file of `group` in `pane`, leaving its active file in front
    async fn open_files(&mut self, group: &EditorGroup, pane: PaneHandle) {
        for file in &group.files {
            if self.open(&file.path, pane).await {
                self.report.files_opened += 1;
            }
        }

        if group.files.len() > 1 {
            if let Some(active) = group.active_file.as_deref() {
                if self.opened.contains(&(pane, active.to_path_buf())) {
                    if let Err(e) = self.show(active, pane, false).await {
                        tracing::warn!("Failed to re-show {:?}: {}", active, e);
                    }
                }
            }
        }
    }

    async fn open(&mut self, relative: &Path, pane: PaneHandle) -> bool {
        match self.show(relative, pane, false).await {
            Ok(()) => {
                tracing::trace!("Opened {:?} in pane {}", relative, pane.0);
                self.opened.insert((pane, relative.to_path_buf()));
                true
            }
            Err(e) => {
                match &e {
                    HostError::NotFound(path) => {
                        tracing::debug!("Skipping non-existent file: {:?}", path)
                    }
                    _ => tracing::warn!("Failed to open file {:?}: {}", relative, e),
                }
                self.report.skipped.push(SkippedFile {
                    path: relative.to_path_buf(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    async fn show(&self, relative: &Path, pane: PaneHandle, focus: bool) -> Result<(), HostError> {
        let absolute = self.root.join(relative);
        self.host
            .open_document(&absolute, OpenTarget::Pane(pane), focus)
            .await
            .map(|_| ())
    }

    /// Give focus back to the pane that had it at capture time
    async fn restore_focus(&mut self, layout: &WindowLayout) {
        let Some(active_id) = layout.active_group else {
            return;
        };
        let Some(group) = layout.find_group(active_id) else {
            tracing::debug!("Active group {} not in layout, skipping focus", active_id);
            return;
        };
        let (Some(&pane), Some(path)) = (self.handles.get(&group.id), group.visible_path()) else {
            return;
        };
        if !self.opened.contains(&(pane, path.to_path_buf())) {
            tracing::debug!("Active file {:?} was not restored, skipping focus", path);
            return;
        }
        match self.show(path, pane, true).await {
            Ok(()) => self.report.focus_restored = true,
            Err(e) => tracing::warn!("Failed to restore active file {:?}: {}", path, e),
        }
    }

    /// Move the cursor of each recorded anchor, if its document is in front
    async fn restore_scroll(&mut self, groups: &[EditorGroup]) {
        for group in groups {
            let Some((path, anchor)) = group.scroll_anchor() else {
                continue;
            };
            let Some(&pane) = self.handles.get(&group.id) else {
                continue;
            };
            if group.visible_path() != Some(path) || !self.opened.contains(&(pane, path.to_path_buf()))
            {
                tracing::debug!("Scroll target {:?} is not visible, skipping", path);
                continue;
            }
            match self.host.set_cursor(pane, anchor).await {
                Ok(()) => self.report.scroll_restored = true,
                Err(e) => tracing::warn!("Failed to restore cursor in {:?}: {}", path, e),
            }
        }
    }
}
