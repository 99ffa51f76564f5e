//! Platform integration - Native prompts and process lifecycle

use std::sync::Arc;

use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::core::{Choice, ConfirmPrompt, ProcessLifecycle, PromptError, PromptRequest};

/// Whether a desktop session is available to show a dialog
pub fn has_display() -> bool {
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
    }
    #[cfg(not(target_os = "linux"))]
    {
        true
    }
}

/// Blocking OS message box
#[derive(Debug, Default)]
pub struct NativePrompt;

impl NativePrompt {
    pub fn new() -> Self {
        Self
    }

    fn choice_for(result: MessageDialogResult) -> Choice {
        match result {
            MessageDialogResult::Ok | MessageDialogResult::Yes => Choice::Terminate,
            MessageDialogResult::Custom(label) if label == Choice::Terminate.label() => {
                Choice::Terminate
            }
            _ => Choice::Continue,
        }
    }
}

impl ConfirmPrompt for NativePrompt {
    fn confirm(&self, request: &PromptRequest) -> Result<Choice, PromptError> {
        if !has_display() {
            return Err(PromptError::Unavailable);
        }

        let result = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title(&request.title)
            .set_description(format!("{}\n\n{}", request.message, request.detail))
            .set_buttons(MessageButtons::OkCancelCustom(
                Choice::Terminate.label().to_string(),
                Choice::Continue.label().to_string(),
            ))
            .show();

        Ok(Self::choice_for(result))
    }
}

/// Ends a headless run by waking whoever waits on the shared `Notify`
#[derive(Debug, Default)]
pub struct ShutdownLifecycle {
    notify: Arc<Notify>,
}

impl ShutdownLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notified(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }
}

impl ProcessLifecycle for ShutdownLifecycle {
    fn terminate(&self) {
        info!("Terminate requested, shutting down");
        self.notify.notify_one();
    }
}

/// Reveal the monitoring log with the system handler
pub fn open_path(path: &std::path::Path) {
    if let Err(e) = open::that(path) {
        warn!("Failed to open {:?}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_results_map_to_choices() {
        assert_eq!(NativePrompt::choice_for(MessageDialogResult::Ok), Choice::Terminate);
        assert_eq!(
            NativePrompt::choice_for(MessageDialogResult::Custom("Close Browser".into())),
            Choice::Terminate
        );
        assert_eq!(
            NativePrompt::choice_for(MessageDialogResult::Custom("Cancel".into())),
            Choice::Continue
        );
        assert_eq!(NativePrompt::choice_for(MessageDialogResult::Cancel), Choice::Continue);
    }

    #[tokio::test]
    async fn shutdown_lifecycle_wakes_waiter() {
        let lifecycle = ShutdownLifecycle::new();
        let notified = lifecycle.notified();

        lifecycle.terminate();
        tokio::time::timeout(std::time::Duration::from_secs(1), notified.notified())
            .await
            .unwrap();
    }
}
