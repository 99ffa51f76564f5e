//! Dialog windows and the in-window prompt bridge

pub mod confirm;

use std::sync::{mpsc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::core::{Choice, ConfirmPrompt, ProcessLifecycle, PromptError, PromptRequest};

/// A prompt waiting to be drawn by the app
pub struct PendingPrompt {
    pub request: PromptRequest,
    reply: oneshot::Sender<Choice>,
}

impl PendingPrompt {
    pub fn answer(self, choice: Choice) {
        if self.reply.send(choice).is_err() {
            debug!("Prompt answered after the monitor stopped waiting");
        }
    }
}

/// The prompt on screen, fed by the `WindowPrompt` channel
pub struct PromptQueue {
    rx: mpsc::Receiver<PendingPrompt>,
    current: Option<PendingPrompt>,
}

impl PromptQueue {
    pub fn new(rx: mpsc::Receiver<PendingPrompt>) -> Self {
        Self { rx, current: None }
    }

    /// Take prompts sent since the last frame. A newer prompt replaces an
    /// unanswered one, which is answered with its cancel choice.
    pub fn poll(&mut self) {
        while let Ok(prompt) = self.rx.try_recv() {
            if let Some(stale) = self.current.replace(prompt) {
                warn!("Replacing an unanswered prompt");
                let cancel = stale.request.cancel_choice;
                stale.answer(cancel);
            }
        }
    }

    pub fn current(&self) -> Option<&PromptRequest> {
        self.current.as_ref().map(|p| &p.request)
    }

    /// Answer the prompt on screen. False if there is none.
    pub fn answer(&mut self, choice: Choice) -> bool {
        match self.current.take() {
            Some(pending) => {
                pending.answer(choice);
                true
            }
            None => false,
        }
    }

    /// Drop every prompt; their callers see the prompt as unavailable
    pub fn clear(&mut self) {
        self.current = None;
        while let Ok(queued) = self.rx.try_recv() {
            drop(queued);
        }
    }
}

/// Shows the confirmation as a modal inside the ShellGuard window.
///
/// `confirm` runs on a blocking thread and waits for the app to answer.
pub struct WindowPrompt {
    tx: Mutex<mpsc::Sender<PendingPrompt>>,
    ctx: egui::Context,
}

impl WindowPrompt {
    pub fn new(ctx: egui::Context) -> (Self, mpsc::Receiver<PendingPrompt>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                tx: Mutex::new(tx),
                ctx,
            },
            rx,
        )
    }
}

impl ConfirmPrompt for WindowPrompt {
    fn confirm(&self, request: &PromptRequest) -> Result<Choice, PromptError> {
        let (reply, answer) = oneshot::channel();
        let pending = PendingPrompt {
            request: request.clone(),
            reply,
        };

        self.tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .send(pending)
            .map_err(|_| PromptError::Unavailable)?;
        self.ctx.request_repaint();

        // the window dropping the pending prompt means nobody can answer
        answer.blocking_recv().map_err(|_| PromptError::Unavailable)
    }
}

/// Closes the ShellGuard window, which ends the browser session
pub struct WindowLifecycle {
    ctx: egui::Context,
}

impl WindowLifecycle {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx }
    }
}

impl ProcessLifecycle for WindowLifecycle {
    fn terminate(&self) {
        info!("Closing window");
        self.ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Reading, Sample};
    use chrono::Local;

    fn request() -> PromptRequest {
        PromptRequest::for_sample(&Sample::new(
            Local::now(),
            Reading::Value(97.0),
            Reading::Unavailable,
        ))
    }

    fn pending() -> (PendingPrompt, oneshot::Receiver<Choice>) {
        let (reply, answer) = oneshot::channel();
        (
            PendingPrompt {
                request: request(),
                reply,
            },
            answer,
        )
    }

    #[test]
    fn newer_prompt_cancels_the_unanswered_one() {
        let (tx, rx) = mpsc::channel();
        let mut queue = PromptQueue::new(rx);
        let (first, mut first_answer) = pending();
        let (second, mut second_answer) = pending();
        tx.send(first).unwrap();
        tx.send(second).unwrap();

        queue.poll();

        assert_eq!(first_answer.try_recv().unwrap(), Choice::Continue);
        assert!(queue.current().is_some());
        assert!(second_answer.try_recv().is_err());

        assert!(queue.answer(Choice::Terminate));
        assert_eq!(second_answer.try_recv().unwrap(), Choice::Terminate);
        assert!(queue.current().is_none());
        assert!(!queue.answer(Choice::Terminate));
    }

    #[test]
    fn stale_prompt_across_frames_is_cancelled() {
        let (tx, rx) = mpsc::channel();
        let mut queue = PromptQueue::new(rx);
        let (first, mut first_answer) = pending();
        let (second, _second_answer) = pending();

        tx.send(first).unwrap();
        queue.poll();
        tx.send(second).unwrap();
        queue.poll();

        assert_eq!(first_answer.try_recv().unwrap(), Choice::Continue);
    }

    #[test]
    fn cleared_queue_reports_unavailable() {
        let (tx, rx) = mpsc::channel();
        let mut queue = PromptQueue::new(rx);
        let (shown, mut shown_answer) = pending();
        let (queued, mut queued_answer) = pending();
        tx.send(shown).unwrap();
        queue.poll();
        tx.send(queued).unwrap();

        queue.clear();

        assert!(matches!(
            shown_answer.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
        assert!(matches!(
            queued_answer.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }

    #[test]
    fn window_prompt_waits_for_the_app() {
        let (prompt, rx) = WindowPrompt::new(egui::Context::default());

        let app = std::thread::spawn(move || {
            let pending = rx.recv().unwrap();
            assert_eq!(pending.request.detail, "CPU: 97.00% | RAM: N/A");
            pending.answer(Choice::Terminate);
        });

        assert_eq!(prompt.confirm(&request()).unwrap(), Choice::Terminate);
        app.join().unwrap();
    }

    #[test]
    fn dropped_prompt_is_unavailable() {
        let (prompt, rx) = WindowPrompt::new(egui::Context::default());

        let app = std::thread::spawn(move || drop(rx.recv().unwrap()));

        assert!(matches!(
            prompt.confirm(&request()),
            Err(PromptError::Unavailable)
        ));
        app.join().unwrap();
    }

    #[test]
    fn closed_window_is_unavailable() {
        let (prompt, rx) = WindowPrompt::new(egui::Context::default());
        drop(rx);

        assert!(matches!(
            prompt.confirm(&request()),
            Err(PromptError::Unavailable)
        ));
    }
}
