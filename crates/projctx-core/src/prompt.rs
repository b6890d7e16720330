//! User prompt collaborator.
//!
//! Cancellation is never an error: `confirm` answers `false`, `input` and
//! `pick` answer `None`, and callers abort silently.

use async_trait::async_trait;

/// One entry of a single-selection list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuickPickItem {
    pub label: String,
    pub description: Option<String>,
    pub detail: Option<String>,
}

impl QuickPickItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Modal yes/no question; `accept` is the label of the affirmative choice
    async fn confirm(&self, message: &str, accept: &str) -> bool;

    /// Single-line text entry
    async fn input(&self, prompt: &str, placeholder: Option<&str>) -> Option<String>;

    /// Single selection; answers the index into `items`
    async fn pick(&self, placeholder: &str, items: &[QuickPickItem]) -> Option<usize>;

    async fn show_info(&self, message: &str);

    async fn show_warning(&self, message: &str);

    async fn show_error(&self, message: &str);
}
