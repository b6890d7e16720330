//! Core of the project context manager.
//!
//! A project context is a named snapshot of an editor window: the split
//! panes, the document shown in each, the cursor anchor of the focused
//! document, and the open terminals. This crate captures that arrangement
//! into a position-addressed grid model and replays it against a host that
//! only offers relative split operations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

pub mod capture;
pub mod clock;
pub mod commands;
pub mod error;
pub mod host;
pub mod layout;
pub mod prompt;
pub mod restore;
pub mod session;
pub mod store;
pub mod terminal;
pub mod virtual_window;

pub use error::{CaptureError, ContextError, HostError, RestoreError, StoreError};
pub use layout::{EditorGroup, GridPosition, OpenFile, ScrollAnchor, TerminalConfig, WindowLayout};
pub use session::{ContextManager, ProjectContext};

/// Host-assigned ordinality of a pane (its view column at capture time)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct PaneId(pub u32);

impl std::fmt::Display for PaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pane-{}", self.0)
    }
}

/// Stable identifier of a persisted context, assigned once at creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ContextId(pub String);

/// Disambiguates ids generated within the same millisecond
static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

impl ContextId {
    /// Derive a fresh id from the creation time.
    ///
    /// The millisecond timestamp keeps ids roughly ordered by creation; the
    /// per-process sequence suffix keeps them unique.
    pub fn generate(now: chrono::DateTime<chrono::Utc>) -> Self {
        let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        ContextId(format!("{}-{:x}", now.timestamp_millis(), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextId {
    fn from(value: &str) -> Self {
        ContextId(value.to_string())
    }
}
