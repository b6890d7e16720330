//! Terminal snapshot.
//!
//! Only the terminal set is preserved: names, order and which one was in the
//! foreground. Scrollback and running processes are lost. Hosts do not
//! expose a terminal's working directory, so capture never fills `cwd`.

use std::path::Path;

use crate::error::HostError;
use crate::host::WindowHost;
use crate::layout::TerminalConfig;

/// Outcome of recreating a terminal list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalRestore {
    pub created: usize,
    /// `(name, error)` of every terminal that could not be started
    pub failed: Vec<(Option<String>, String)>,
    pub shown: bool,
}

/// Record every live terminal in creation order.
pub async fn capture_terminals(host: &dyn WindowHost) -> Result<Vec<TerminalConfig>, HostError> {
    let terminals = host.list_terminals().await?;
    tracing::trace!("Capturing {} terminal(s)", terminals.len());
    Ok(terminals
        .into_iter()
        .map(|t| TerminalConfig {
            name: t.name,
            cwd: None,
            is_visible: t.is_active,
        })
        .collect())
}

/// Recreate `terminals` in order and bring the first visible one forward.
///
/// A terminal that fails to start is logged and skipped.
pub async fn restore_terminals(
    host: &dyn WindowHost,
    root: &Path,
    terminals: &[TerminalConfig],
) -> TerminalRestore {
    let mut result = TerminalRestore::default();
    let mut to_show = None;

    for config in terminals {
        let cwd = config.cwd.as_ref().map(|cwd| root.join(cwd));
        match host
            .create_terminal(config.name.as_deref(), cwd.as_deref())
            .await
        {
            Ok(handle) => {
                result.created += 1;
                if config.is_visible && to_show.is_none() {
                    to_show = Some(handle);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to recreate terminal {:?}: {}", config.name, e);
                result.failed.push((config.name.clone(), e.to_string()));
            }
        }
    }

    if let Some(handle) = to_show {
        match host.show_terminal(handle).await {
            Ok(()) => result.shown = true,
            Err(e) => tracing::warn!("Failed to show terminal: {}", e),
        }
    }

    result
}
