//! Partial configuration layers.
//!
//! Every field is optional so a layer can set only what it cares about.
//! Layers are merged from highest to lowest precedence, then resolved
//! against the defaults of [`Config`].

use serde::{Deserialize, Serialize};

use crate::config::{CaptureConfig, Config, RestoreConfig, StorageConfig};

/// Fill values missing from `self` with the ones in `other`
pub trait Merge {
    fn merge_from(&mut self, other: &Self);
}

impl<T: Clone> Merge for Option<T> {
    fn merge_from(&mut self, other: &Self) {
        if self.is_none() {
            self.clone_from(other);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<PartialStorageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<PartialCaptureConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore: Option<PartialRestoreConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialStorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialCaptureConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_terminals: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_reported_geometry: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialRestoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_terminals: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_scroll: Option<bool>,
}

/// Merge nested sections field by field, not wholesale
fn merge_section<T: Merge + Clone>(mine: &mut Option<T>, theirs: &Option<T>) {
    match (mine.as_mut(), theirs) {
        (Some(mine), Some(theirs)) => mine.merge_from(theirs),
        (None, Some(theirs)) => *mine = Some(theirs.clone()),
        _ => {}
    }
}

impl Merge for PartialConfig {
    fn merge_from(&mut self, other: &Self) {
        merge_section(&mut self.storage, &other.storage);
        merge_section(&mut self.capture, &other.capture);
        merge_section(&mut self.restore, &other.restore);
    }
}

impl Merge for PartialStorageConfig {
    fn merge_from(&mut self, other: &Self) {
        self.dir_name.merge_from(&other.dir_name);
        self.file_name.merge_from(&other.file_name);
    }
}

impl Merge for PartialCaptureConfig {
    fn merge_from(&mut self, other: &Self) {
        self.capture_terminals.merge_from(&other.capture_terminals);
        self.prefer_reported_geometry
            .merge_from(&other.prefer_reported_geometry);
    }
}

impl Merge for PartialRestoreConfig {
    fn merge_from(&mut self, other: &Self) {
        self.restore_terminals.merge_from(&other.restore_terminals);
        self.restore_scroll.merge_from(&other.restore_scroll);
    }
}

impl PartialConfig {
    /// Apply defaults for anything no layer set
    pub fn resolve(self) -> Config {
        let storage = self.storage.unwrap_or_default();
        let capture = self.capture.unwrap_or_default();
        let restore = self.restore.unwrap_or_default();
        let defaults = Config::default();

        Config {
            storage: StorageConfig {
                dir_name: storage.dir_name.unwrap_or(defaults.storage.dir_name),
                file_name: storage.file_name.unwrap_or(defaults.storage.file_name),
            },
            capture: CaptureConfig {
                capture_terminals: capture
                    .capture_terminals
                    .unwrap_or(defaults.capture.capture_terminals),
                prefer_reported_geometry: capture
                    .prefer_reported_geometry
                    .unwrap_or(defaults.capture.prefer_reported_geometry),
            },
            restore: RestoreConfig {
                restore_terminals: restore
                    .restore_terminals
                    .unwrap_or(defaults.restore.restore_terminals),
                restore_scroll: restore
                    .restore_scroll
                    .unwrap_or(defaults.restore.restore_scroll),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_partial_resolves_to_defaults() {
        assert_eq!(PartialConfig::default().resolve(), Config::default());
    }

    #[test]
    fn test_higher_layer_wins_and_gaps_are_filled() {
        let mut project: PartialConfig =
            serde_json::from_str(r#"{"capture": {"capture_terminals": false}}"#).unwrap();
        let user: PartialConfig = serde_json::from_str(
            r#"{"capture": {"capture_terminals": true, "prefer_reported_geometry": false},
                "storage": {"file_name": "layouts.json"}}"#,
        )
        .unwrap();

        project.merge_from(&user);
        let config = project.resolve();

        assert!(!config.capture.capture_terminals);
        assert!(!config.capture.prefer_reported_geometry);
        assert_eq!(config.storage.file_name, "layouts.json");
        assert_eq!(config.storage.dir_name, ".projctx");
    }
}
