//! User-facing command flows.
//!
//! Each command drives a [`ContextManager`] through a [`Prompter`]. They
//! never return errors: failures become messages, cancellation ends the
//! command silently.

use chrono::Local;

use crate::error::ContextError;
use crate::prompt::{Prompter, QuickPickItem};
use crate::session::{ContextManager, ProjectContext};

/// How a command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    /// The user backed out of a prompt
    Cancelled,
    /// A precondition was not met, reported as a warning
    Declined,
    Failed,
}

const CURRENTLY_SELECTED: &str = "Currently Selected";

/// Ask for a name, capture the window and select the new context
pub async fn save_context(manager: &ContextManager, prompter: &dyn Prompter) -> CommandOutcome {
    let Some(name) = prompter
        .input(
            "Enter a name for this context",
            Some("e.g., Development Setup, Debug Layout"),
        )
        .await
    else {
        return CommandOutcome::Cancelled;
    };
    if name.trim().is_empty() {
        return CommandOutcome::Cancelled;
    }

    match manager.create(&name).await {
        Ok(context) => {
            prompter
                .show_info(&format!("Context \"{}\" saved and selected!", context.name))
                .await;
            CommandOutcome::Completed
        }
        Err(e) => report_error(prompter, "save context", &e).await,
    }
}

/// Pick a context and switch to it
pub async fn switch_context(manager: &ContextManager, prompter: &dyn Prompter) -> CommandOutcome {
    let contexts = match manager.list().await {
        Ok(contexts) => contexts,
        Err(e) => return report_error(prompter, "switch context", &e).await,
    };
    if contexts.is_empty() {
        prompter.show_info("No saved contexts found.").await;
        return CommandOutcome::Completed;
    }

    let Some(selected) = pick_context(
        manager,
        prompter,
        "Select a context to switch to",
        &contexts,
    )
    .await
    else {
        return CommandOutcome::Cancelled;
    };

    match manager.switch_to(&selected.id).await {
        Ok((context, report)) => {
            prompter
                .show_info(&format!("Switched to context \"{}\"", context.name))
                .await;
            if !report.is_complete() {
                prompter.show_warning(&report.summary()).await;
            }
            CommandOutcome::Completed
        }
        Err(e) => report_error(prompter, "switch context", &e).await,
    }
}

/// Re-capture the window into the current context, after confirmation
pub async fn override_context(
    manager: &ContextManager,
    prompter: &dyn Prompter,
) -> CommandOutcome {
    let Some(current) = manager.current().await else {
        prompter
            .show_warning(&ContextError::NoCurrentContext.to_string())
            .await;
        return CommandOutcome::Declined;
    };

    let confirmed = prompter
        .confirm(
            &format!("Are you sure you want to override \"{}\"?", current.name),
            "Yes, Override",
        )
        .await;
    if !confirmed {
        return CommandOutcome::Cancelled;
    }

    match manager.override_current().await {
        Ok(updated) => {
            prompter
                .show_info(&format!("Layout \"{}\" has been updated!", updated.name))
                .await;
            CommandOutcome::Completed
        }
        Err(e) => report_error(prompter, "override layout", &e).await,
    }
}

/// Pick a context and delete it, after confirmation
pub async fn delete_context(manager: &ContextManager, prompter: &dyn Prompter) -> CommandOutcome {
    let contexts = match manager.list().await {
        Ok(contexts) => contexts,
        Err(e) => return report_error(prompter, "delete context", &e).await,
    };
    if contexts.is_empty() {
        prompter.show_info("No saved contexts found.").await;
        return CommandOutcome::Completed;
    }

    let Some(selected) =
        pick_context(manager, prompter, "Select a context to delete", &contexts).await
    else {
        return CommandOutcome::Cancelled;
    };
    let confirmed = prompter
        .confirm(
            &format!("Are you sure you want to delete \"{}\"?", selected.name),
            "Delete",
        )
        .await;
    if !confirmed {
        return CommandOutcome::Cancelled;
    }

    match manager.delete(&selected.id).await {
        Ok(()) => {
            prompter
                .show_info(&format!("Context \"{}\" deleted.", selected.name))
                .await;
            CommandOutcome::Completed
        }
        Err(e) => report_error(prompter, "delete context", &e).await,
    }
}

/// Delete every context, after confirmation
pub async fn clear_contexts(manager: &ContextManager, prompter: &dyn Prompter) -> CommandOutcome {
    let confirmed = prompter
        .confirm(
            "Are you sure you want to delete all saved contexts?",
            "Delete All",
        )
        .await;
    if !confirmed {
        return CommandOutcome::Cancelled;
    }

    match manager.clear().await {
        Ok(()) => {
            prompter.show_info("All contexts cleared.").await;
            CommandOutcome::Completed
        }
        Err(e) => report_error(prompter, "clear contexts", &e).await,
    }
}

/// Quick-pick entries for `contexts`, in the given order
pub fn pick_items(
    contexts: &[ProjectContext],
    current: Option<&ProjectContext>,
) -> Vec<QuickPickItem> {
    contexts
        .iter()
        .map(|context| {
            let accessed = context
                .last_accessed
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();
            let item = QuickPickItem::new(context.name.clone()).with_description(accessed);
            if current.is_some_and(|c| c.id == context.id) {
                item.with_detail(CURRENTLY_SELECTED)
            } else {
                item
            }
        })
        .collect()
}

async fn pick_context<'a>(
    manager: &ContextManager,
    prompter: &dyn Prompter,
    placeholder: &str,
    contexts: &'a [ProjectContext],
) -> Option<&'a ProjectContext> {
    let current = manager.current().await;
    let items = pick_items(contexts, current.as_ref());
    let index = prompter.pick(placeholder, &items).await?;
    contexts.get(index)
}

async fn report_error(prompter: &dyn Prompter, action: &str, error: &ContextError) -> CommandOutcome {
    if error.is_precondition() {
        tracing::warn!("Cannot {}: {}", action, error);
        prompter.show_warning(&error.to_string()).await;
        CommandOutcome::Declined
    } else {
        tracing::error!("Failed to {}: {}", action, error);
        prompter
            .show_error(&format!("Failed to {action}: {error}"))
            .await;
        CommandOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use crate::store::{ContextStore, MemoryContextStore};
    use crate::virtual_window::{HostOperation, VirtualWindow};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Prompter answering from a script and recording every message
    #[derive(Default)]
    struct ScriptedPrompter {
        inputs: Mutex<VecDeque<Option<String>>>,
        picks: Mutex<VecDeque<Option<usize>>>,
        confirms: Mutex<VecDeque<bool>>,
        shown_items: Mutex<Vec<Vec<QuickPickItem>>>,
        messages: Mutex<Vec<(&'static str, String)>>,
    }

    impl ScriptedPrompter {
        fn answer_input(self, answer: Option<&str>) -> Self {
            self.inputs
                .lock()
                .unwrap()
                .push_back(answer.map(str::to_string));
            self
        }

        fn answer_pick(self, answer: Option<usize>) -> Self {
            self.picks.lock().unwrap().push_back(answer);
            self
        }

        fn answer_confirm(self, answer: bool) -> Self {
            self.confirms.lock().unwrap().push_back(answer);
            self
        }

        fn messages(&self) -> Vec<(&'static str, String)> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Prompter for ScriptedPrompter {
        async fn confirm(&self, _message: &str, _accept: &str) -> bool {
            self.confirms.lock().unwrap().pop_front().unwrap_or(false)
        }

        async fn input(&self, _prompt: &str, _placeholder: Option<&str>) -> Option<String> {
            self.inputs.lock().unwrap().pop_front().flatten()
        }

        async fn pick(&self, _placeholder: &str, items: &[QuickPickItem]) -> Option<usize> {
            self.shown_items.lock().unwrap().push(items.to_vec());
            self.picks.lock().unwrap().pop_front().flatten()
        }

        async fn show_info(&self, message: &str) {
            self.messages.lock().unwrap().push(("info", message.to_string()));
        }

        async fn show_warning(&self, message: &str) {
            self.messages.lock().unwrap().push(("warning", message.to_string()));
        }

        async fn show_error(&self, message: &str) {
            self.messages.lock().unwrap().push(("error", message.to_string()));
        }
    }

    struct Fixture {
        window: Arc<VirtualWindow>,
        store: Arc<MemoryContextStore>,
        clock: Arc<TestClock>,
        manager: ContextManager,
    }

    fn fixture() -> Fixture {
        let window = Arc::new(VirtualWindow::with_panes("/work", &["a.ts", "b.ts"]));
        let store = Arc::new(MemoryContextStore::new());
        let clock = TestClock::shared();
        let manager = ContextManager::new(window.clone(), store.clone(), clock.clone());
        Fixture {
            window,
            store,
            clock,
            manager,
        }
    }

    #[tokio::test]
    async fn test_save_reports_and_selects() {
        let f = fixture();
        let prompter = ScriptedPrompter::default().answer_input(Some("Debug"));

        assert_eq!(
            save_context(&f.manager, &prompter).await,
            CommandOutcome::Completed
        );
        assert_eq!(
            prompter.messages(),
            vec![("info", "Context \"Debug\" saved and selected!".to_string())]
        );
        assert_eq!(f.manager.current().await.unwrap().name, "Debug");
    }

    #[tokio::test]
    async fn test_save_cancel_and_empty_name_are_silent() {
        let f = fixture();
        let prompter = ScriptedPrompter::default().answer_input(None).answer_input(Some(""));

        assert_eq!(
            save_context(&f.manager, &prompter).await,
            CommandOutcome::Cancelled
        );
        assert_eq!(
            save_context(&f.manager, &prompter).await,
            CommandOutcome::Cancelled
        );
        assert!(prompter.messages().is_empty());
        assert!(f.store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let f = fixture();
        f.store.fail_writes_with("disk full").await;
        let prompter = ScriptedPrompter::default().answer_input(Some("x"));

        assert_eq!(
            save_context(&f.manager, &prompter).await,
            CommandOutcome::Failed
        );
        assert_eq!(
            prompter.messages(),
            vec![(
                "error",
                "Failed to save context: IO error: disk full".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_switch_with_nothing_saved() {
        let f = fixture();
        let prompter = ScriptedPrompter::default();
        switch_context(&f.manager, &prompter).await;
        assert_eq!(
            prompter.messages(),
            vec![("info", "No saved contexts found.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_switch_marks_current_and_restores_pick() {
        let f = fixture();
        let older = f.manager.create("older").await.unwrap();
        f.clock.advance(Duration::minutes(1));
        f.manager.create("newer").await.unwrap();
        f.window.clear_operations();

        // Most recent first, so index 1 is "older".
        let prompter = ScriptedPrompter::default().answer_pick(Some(1));
        assert_eq!(
            switch_context(&f.manager, &prompter).await,
            CommandOutcome::Completed
        );

        let shown = prompter.shown_items.lock().unwrap()[0].clone();
        assert_eq!(shown[0].label, "newer");
        assert_eq!(shown[0].detail.as_deref(), Some(CURRENTLY_SELECTED));
        assert_eq!(shown[1].label, "older");
        assert_eq!(shown[1].detail, None);

        assert_eq!(f.manager.current().await.unwrap().id, older.id);
        assert_eq!(f.window.operations()[0], HostOperation::CloseAll);
        assert_eq!(
            prompter.messages(),
            vec![("info", "Switched to context \"older\"".to_string())]
        );
    }

    #[tokio::test]
    async fn test_switch_warns_about_skipped_files() {
        let f = fixture();
        f.manager.create("ctx").await.unwrap();
        f.window.remove_file("b.ts");

        let prompter = ScriptedPrompter::default().answer_pick(Some(0));
        switch_context(&f.manager, &prompter).await;
        let messages = prompter.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].0, "warning");
        assert!(messages[1].1.contains("skipped 1 file(s): b.ts"));
    }

    #[tokio::test]
    async fn test_switch_cancelled_pick_changes_nothing() {
        let f = fixture();
        f.manager.create("ctx").await.unwrap();
        f.window.clear_operations();

        let prompter = ScriptedPrompter::default().answer_pick(None);
        assert_eq!(
            switch_context(&f.manager, &prompter).await,
            CommandOutcome::Cancelled
        );
        assert!(f.window.operations().is_empty());
        assert!(prompter.messages().is_empty());
    }

    #[tokio::test]
    async fn test_override_without_current_warns() {
        let f = fixture();
        let prompter = ScriptedPrompter::default().answer_confirm(true);
        assert_eq!(
            override_context(&f.manager, &prompter).await,
            CommandOutcome::Declined
        );
        assert_eq!(
            prompter.messages(),
            vec![(
                "warning",
                "No layout is currently selected. Please switch to a layout first.".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_override_confirmed() {
        let f = fixture();
        f.manager.create("main").await.unwrap();
        let prompter = ScriptedPrompter::default().answer_confirm(true);
        assert_eq!(
            override_context(&f.manager, &prompter).await,
            CommandOutcome::Completed
        );
        assert_eq!(
            prompter.messages(),
            vec![("info", "Layout \"main\" has been updated!".to_string())]
        );
    }

    #[tokio::test]
    async fn test_override_declined_keeps_record() {
        let f = fixture();
        let created = f.manager.create("main").await.unwrap();
        f.window.push_pane(Some("c.ts"));
        let prompter = ScriptedPrompter::default().answer_confirm(false);

        assert_eq!(
            override_context(&f.manager, &prompter).await,
            CommandOutcome::Cancelled
        );
        assert_eq!(f.store.get(&created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_delete_and_clear_require_confirmation() {
        let f = fixture();
        let a = f.manager.create("a").await.unwrap();
        f.manager.create("b").await.unwrap();

        let prompter = ScriptedPrompter::default().answer_pick(Some(1)).answer_confirm(false);
        assert_eq!(
            delete_context(&f.manager, &prompter).await,
            CommandOutcome::Cancelled
        );
        assert_eq!(f.manager.list().await.unwrap().len(), 2);

        // Same timestamp: ties are broken by name, so "a" is index 0.
        let prompter = ScriptedPrompter::default().answer_pick(Some(0)).answer_confirm(true);
        delete_context(&f.manager, &prompter).await;
        assert!(f.manager.get(&a.id).await.unwrap().is_none());
        assert_eq!(
            prompter.messages(),
            vec![("info", "Context \"a\" deleted.".to_string())]
        );

        let prompter = ScriptedPrompter::default().answer_confirm(true);
        assert_eq!(
            clear_contexts(&f.manager, &prompter).await,
            CommandOutcome::Completed
        );
        assert!(f.manager.list().await.unwrap().is_empty());
        assert!(f.manager.current().await.is_none());
    }
}
