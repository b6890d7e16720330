//! XDG-compliant log directory management
//!
//! Logs are stored in `$XDG_STATE_HOME/projctx/logs/` (typically
//! `~/.local/state/projctx/logs/`). Each run writes its own PID-based log
//! file; old files from earlier runs are removed on startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

/// Minimum age for log files to be cleaned up (7 days)
const CLEANUP_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Cached log directory path
static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the base log directory, creating it if necessary.
///
/// Falls back to the system temp directory when no state directory can be
/// determined or created.
pub fn log_dir() -> &'static PathBuf {
    LOG_DIR.get_or_init(|| {
        let dir = xdg_log_dir().unwrap_or_else(|| std::env::temp_dir().join("projctx-logs"));

        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Failed to create log directory {:?}: {}", dir, e);
            return std::env::temp_dir().join("projctx-logs");
        }

        dir
    })
}

fn xdg_log_dir() -> Option<PathBuf> {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(state_home);
        if path.is_absolute() {
            return Some(path.join("projctx").join("logs"));
        }
    }

    dirs::home_dir().map(|home| {
        home.join(".local")
            .join("state")
            .join("projctx")
            .join("logs")
    })
}

/// Get the path for the log file of this process.
///
/// Returns `{log_dir}/projctx-{PID}.log`
pub fn main_log_path() -> PathBuf {
    log_dir().join(format!("projctx-{}.log", std::process::id()))
}

/// Remove log files of other runs older than a week
pub fn cleanup_stale_logs() {
    cleanup_stale_logs_in_dir(log_dir(), std::process::id(), CLEANUP_AGE);
}

fn cleanup_stale_logs_in_dir(dir: &Path, current_pid: u32, max_age: Duration) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        let Some(pid) = extract_pid_from_filename(&name) else {
            continue;
        };
        if pid == current_pid {
            continue;
        }

        if entry.file_type().map(|t| t.is_file()).unwrap_or(false)
            && is_file_older_than(&entry.path(), max_age)
        {
            match fs::remove_file(entry.path()) {
                Ok(()) => tracing::debug!("Cleaned up stale log file: {:?}", entry.path()),
                Err(e) => tracing::debug!("Failed to clean up stale log {:?}: {}", entry.path(), e),
            }
        }
    }
}

/// PID of a `name-{PID}.log` file name
fn extract_pid_from_filename(name: &str) -> Option<u32> {
    let stem = name.strip_suffix(".log")?;
    let (_, pid) = stem.rsplit_once('-')?;
    pid.parse().ok()
}

fn is_file_older_than(path: &Path, age: Duration) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(|modified| {
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO)
        })
        .is_some_and(|elapsed| elapsed >= age)
}

/// Print all log and config paths (for `--show-paths`)
pub fn print_all_paths(config_dir: &Path, storage_path: &Path) {
    println!("Log directory:   {}", log_dir().display());
    println!("Current log:     {}", main_log_path().display());
    println!("User config:     {}", config_dir.display());
    println!("Context record:  {}", storage_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_pid_from_filename() {
        assert_eq!(extract_pid_from_filename("projctx-1234.log"), Some(1234));
        assert_eq!(extract_pid_from_filename("projctx-abc.log"), None);
        assert_eq!(extract_pid_from_filename("projctx-1234.txt"), None);
        assert_eq!(extract_pid_from_filename("notes.log"), None);
    }

    #[test]
    fn test_cleanup_keeps_own_and_unrelated_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        for name in ["projctx-1.log", "projctx-2.log", "notes.log", "projctx-3.txt"] {
            fs::write(dir.join(name), "x").unwrap();
        }

        cleanup_stale_logs_in_dir(dir, 2, Duration::ZERO);

        assert!(!dir.join("projctx-1.log").exists());
        assert!(dir.join("projctx-2.log").exists());
        assert!(dir.join("notes.log").exists());
        assert!(dir.join("projctx-3.txt").exists());
    }

    #[test]
    fn test_cleanup_respects_age() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("projctx-1.log"), "x").unwrap();

        cleanup_stale_logs_in_dir(temp.path(), 2, Duration::from_secs(3600));

        assert!(temp.path().join("projctx-1.log").exists());
    }
}
