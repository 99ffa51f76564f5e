//! Confirmation prompts - Asking the user what to do about an alert

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::sample::Sample;

/// What the user picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    /// Close the browser
    Terminate,
    /// Dismiss the alert and keep going
    Continue,
}

impl Choice {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Terminate => "Close Browser",
            Self::Continue => "Cancel",
        }
    }
}

/// Everything a prompt implementation needs to render the alert
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub title: String,
    pub message: String,
    pub detail: String,
    pub choices: [Choice; 2],
    /// Selected when the user just presses enter
    pub default_choice: Choice,
    /// Selected when the user escapes or closes the prompt
    pub cancel_choice: Choice,
}

impl PromptRequest {
    pub fn for_sample(sample: &Sample) -> Self {
        Self {
            title: "Resource Alert".to_string(),
            message: "The browser is not responding".to_string(),
            detail: sample.summary(),
            choices: [Choice::Terminate, Choice::Continue],
            default_choice: Choice::Terminate,
            cancel_choice: Choice::Continue,
        }
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no interactive surface available to show the prompt")]
    Unavailable,
    #[error("prompt failed: {0}")]
    Failed(String),
}

/// A blocking, synchronous confirmation prompt
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, request: &PromptRequest) -> Result<Choice, PromptError>;
}

struct PromptJob {
    request: PromptRequest,
    reply: oneshot::Sender<Result<Choice, PromptError>>,
}

/// Actor that owns the prompt and runs it off the async workers
pub struct PromptService;

impl PromptService {
    pub fn spawn(prompt: Arc<dyn ConfirmPrompt>) -> (PromptHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<PromptJob>(1);

        let task = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let prompt = Arc::clone(&prompt);
                let request = job.request;
                let result = tokio::task::spawn_blocking(move || prompt.confirm(&request))
                    .await
                    .unwrap_or_else(|e| Err(PromptError::Failed(e.to_string())));

                if job.reply.send(result).is_err() {
                    debug!("Prompt answered after the requester went away");
                }
            }
            debug!("Prompt service stopped");
        });

        (PromptHandle { tx }, task)
    }
}

/// Cheap handle used to ask the prompt actor for a decision
#[derive(Clone)]
pub struct PromptHandle {
    tx: mpsc::Sender<PromptJob>,
}

impl PromptHandle {
    pub async fn ask(&self, request: PromptRequest) -> Result<Choice, PromptError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PromptJob { request, reply })
            .await
            .map_err(|_| PromptError::Unavailable)?;
        rx.await.map_err(|_| PromptError::Unavailable)?
    }
}
