//! Error types for capture, restore, persistence and the context lifecycle.

use std::path::PathBuf;

/// Failure reported by the window host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The document does not exist (moved, deleted)
    NotFound(PathBuf),
    /// The document exists but could not be opened (permissions, binary, ...)
    OpenFailed { path: PathBuf, reason: String },
    /// Any other failure of the host window API
    Failed(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            HostError::OpenFailed { path, reason } => {
                write!(f, "Failed to open {}: {reason}", path.display())
            }
            HostError::Failed(msg) => write!(f, "Host error: {msg}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Failure of the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::IoError(msg) => write!(f, "IO error: {msg}"),
            StoreError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            StoreError::SerializeError(msg) => write!(f, "Serialize error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Failure of `capture_current_layout`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No workspace root is open, so paths cannot be made relative
    NoWorkspace,
    Host(HostError),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::NoWorkspace => write!(f, "No workspace folder found"),
            CaptureError::Host(e) => write!(f, "Failed to read window state: {e}"),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Host(e) => Some(e),
            CaptureError::NoWorkspace => None,
        }
    }
}

impl From<HostError> for CaptureError {
    fn from(e: HostError) -> Self {
        CaptureError::Host(e)
    }
}

/// Failure of `restore_layout`
///
/// Per-file and per-terminal failures are not errors; they are recorded in
/// the restore report. Only a host failure while shaping the grid aborts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    NoWorkspace,
    Host(HostError),
}

impl std::fmt::Display for RestoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreError::NoWorkspace => write!(f, "No workspace folder found"),
            RestoreError::Host(e) => write!(f, "Failed to rebuild layout: {e}"),
        }
    }
}

impl std::error::Error for RestoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RestoreError::Host(e) => Some(e),
            RestoreError::NoWorkspace => None,
        }
    }
}

impl From<HostError> for RestoreError {
    fn from(e: HostError) -> Self {
        RestoreError::Host(e)
    }
}

/// Failure of a snapshot lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// Override was requested while no context is current
    NoCurrentContext,
    /// No persisted context has this id
    NotFound(String),
    /// A context name must not be blank
    EmptyName,
    Capture(CaptureError),
    Restore(RestoreError),
    Store(StoreError),
}

impl ContextError {
    /// Precondition faults are reported as warnings rather than failures
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ContextError::NoCurrentContext
                | ContextError::EmptyName
                | ContextError::Capture(CaptureError::NoWorkspace)
                | ContextError::Restore(RestoreError::NoWorkspace)
        )
    }
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextError::NoCurrentContext => write!(
                f,
                "No layout is currently selected. Please switch to a layout first."
            ),
            ContextError::NotFound(id) => write!(f, "No saved context with id '{id}'"),
            ContextError::EmptyName => write!(f, "Context name cannot be empty"),
            ContextError::Capture(e) => write!(f, "{e}"),
            ContextError::Restore(e) => write!(f, "{e}"),
            ContextError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContextError::Capture(e) => Some(e),
            ContextError::Restore(e) => Some(e),
            ContextError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CaptureError> for ContextError {
    fn from(e: CaptureError) -> Self {
        ContextError::Capture(e)
    }
}

impl From<RestoreError> for ContextError {
    fn from(e: RestoreError) -> Self {
        ContextError::Restore(e)
    }
}

impl From<StoreError> for ContextError {
    fn from(e: StoreError) -> Self {
        ContextError::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(ContextError::NoCurrentContext.is_precondition());
        assert!(ContextError::Capture(CaptureError::NoWorkspace).is_precondition());
        assert!(!ContextError::Store(StoreError::IoError("disk full".into())).is_precondition());
        assert!(!ContextError::NotFound("1".into()).is_precondition());
    }

    #[test]
    fn test_display_includes_cause() {
        let err = ContextError::Store(StoreError::IoError("permission denied".into()));
        assert_eq!(err.to_string(), "IO error: permission denied");

        let err = RestoreError::Host(HostError::Failed("split rejected".into()));
        assert_eq!(
            err.to_string(),
            "Failed to rebuild layout: Host error: split rejected"
        );
    }
}
