//! Layout capture.
//!
//! Reads the live window through [`WindowHost`] and produces a grid model.
//! The host only reports left-to-right ordinality, so grid coordinates are
//! inferred with [`infer_grid_position`] unless the host reports a complete
//! and consistent geometry of its own.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::CaptureError;
use crate::host::{LivePane, WindowHost};
use crate::layout::{infer_grid_position, EditorGroup, GridPosition, OpenFile, WindowLayout};
use crate::terminal::capture_terminals;
use crate::PaneId;

/// Knobs for `capture_current_layout`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub capture_terminals: bool,
    /// Use host-reported grid positions when every recorded pane has one
    pub prefer_reported_geometry: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            capture_terminals: true,
            prefer_reported_geometry: true,
        }
    }
}

/// Snapshot the live window into a grid model.
///
/// Panes without a text document, or whose document lies outside the
/// workspace, are not recorded. Fails only when no workspace is open or the
/// host cannot enumerate its panes; an unreadable scroll anchor or terminal
/// list is logged and left out.
pub async fn capture_current_layout(
    host: &dyn WindowHost,
    options: &CaptureOptions,
) -> Result<WindowLayout, CaptureError> {
    let root = host.workspace_root().ok_or(CaptureError::NoWorkspace)?;
    let panes = host.list_panes().await?;
    let active_editor = match host.active_editor().await {
        Ok(editor) => editor,
        Err(e) => {
            tracing::warn!("Failed to read the active editor, capturing without scroll: {}", e);
            None
        }
    };

    tracing::debug!("Capturing layout of {} pane(s)", panes.len());

    let recorded: Vec<(LivePane, PathBuf)> = panes
        .into_iter()
        .filter_map(|pane| {
            let Some(document) = pane.document.as_ref() else {
                tracing::trace!("Skipping pane {}: no text document", pane.view_column);
                return None;
            };
            match document.strip_prefix(&root) {
                Ok(relative) => {
                    let relative = relative.to_path_buf();
                    Some((pane, relative))
                }
                Err(_) => {
                    tracing::debug!(
                        "Skipping pane {}: {} is outside the workspace",
                        pane.view_column,
                        document.display()
                    );
                    None
                }
            }
        })
        .collect();

    let count = recorded.len();
    let reported = if options.prefer_reported_geometry {
        reported_geometry(&recorded)
    } else {
        None
    };
    if reported.is_some() {
        tracing::debug!("Using host-reported geometry");
    }
    let size = if count == 0 { 0.0 } else { 1.0 / count as f64 };

    let mut active_group = None;
    let mut editor_groups = Vec::with_capacity(count);
    for (index, (pane, relative)) in recorded.into_iter().enumerate() {
        let id = PaneId(pane.view_column);
        let position = match &reported {
            Some(positions) => positions[index],
            None => infer_grid_position(index, count),
        };
        if pane.is_active {
            active_group = Some(id);
        }
        let scroll = active_editor
            .as_ref()
            .filter(|editor| editor.pane == pane.handle && pane.document.as_ref() == Some(&editor.path))
            .map(|editor| editor.anchor);

        tracing::trace!(
            "Pane {} at {}: {}",
            pane.view_column,
            position,
            relative.display()
        );

        editor_groups.push(EditorGroup {
            id,
            position,
            size,
            files: vec![OpenFile {
                path: relative.clone(),
                view_column: pane.view_column,
                scroll,
            }],
            active_file: Some(relative),
        });
    }

    let terminals = if options.capture_terminals {
        match capture_terminals(host).await {
            Ok(terminals) => terminals,
            Err(e) => {
                tracing::warn!("Failed to capture terminals: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    tracing::debug!(
        "Captured {} editor group(s), {} terminal(s)",
        editor_groups.len(),
        terminals.len()
    );

    Ok(WindowLayout {
        editor_groups,
        active_group,
        terminals,
    })
}

/// Positions reported by the host, if every pane has a valid, distinct one
fn reported_geometry(recorded: &[(LivePane, PathBuf)]) -> Option<Vec<GridPosition>> {
    let positions: Vec<GridPosition> = recorded
        .iter()
        .map(|(pane, _)| pane.position.filter(GridPosition::is_valid))
        .collect::<Option<_>>()?;
    let distinct: HashSet<_> = positions.iter().collect();
    (distinct.len() == positions.len() && !positions.is_empty()).then_some(positions)
}
