//! Alert controller - Threshold checks and the single-alert latch

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::notify::{MonitorEvent, NotificationSink};
use super::prompt::{Choice, PromptError, PromptHandle, PromptRequest};
use super::sample::{Reading, Sample};

/// Default CPU utilization that raises an alert
pub const DEFAULT_CPU_THRESHOLD: f64 = 90.0;

/// Default memory utilization that raises an alert
pub const DEFAULT_MEM_THRESHOLD: f64 = 80.0;

/// Utilization limits; a reading strictly above a limit is a breach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub cpu_percent: f64,
    pub mem_percent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_percent: DEFAULT_CPU_THRESHOLD,
            mem_percent: DEFAULT_MEM_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn breached_by(&self, sample: &Sample) -> bool {
        sample.cpu().exceeds(self.cpu_percent) || sample.mem().exceeds(self.mem_percent)
    }
}

/// State of the alert latch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatchState {
    /// A breach may raise a new alert
    #[default]
    Armed,
    /// A prompt is outstanding
    Prompting,
    /// The prompt could not be shown; waiting for an explicit re-arm
    Suspended,
    /// The user chose to close the browser
    Terminated,
}

impl LatchState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Armed => "Armed",
            Self::Prompting => "Prompting",
            Self::Suspended => "Suspended",
            Self::Terminated => "Terminated",
        }
    }
}

/// How an alert ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertOutcome {
    Continued,
    Terminated,
    PromptUnavailable,
    ForcedShutdown,
}

impl AlertOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Continued => "Continued",
            Self::Terminated => "Terminated",
            Self::PromptUnavailable => "Prompt unavailable",
            Self::ForcedShutdown => "Forced shutdown",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continued => "continued",
            Self::Terminated => "terminated",
            Self::PromptUnavailable => "prompt_unavailable",
            Self::ForcedShutdown => "forced_shutdown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "continued" => Some(Self::Continued),
            "terminated" => Some(Self::Terminated),
            "prompt_unavailable" => Some(Self::PromptUnavailable),
            "forced_shutdown" => Some(Self::ForcedShutdown),
            _ => None,
        }
    }
}

/// One raised alert, as kept in the alert history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub id: Uuid,
    pub raised_at: DateTime<Local>,
    pub cpu: Reading,
    pub mem: Reading,
    /// `None` while the prompt is outstanding
    pub outcome: Option<AlertOutcome>,
    pub resolved_at: Option<DateTime<Local>>,
}

impl AlertEntry {
    pub fn raised(sample: &Sample) -> Self {
        Self {
            id: Uuid::new_v4(),
            raised_at: sample.timestamp(),
            cpu: sample.cpu(),
            mem: sample.mem(),
            outcome: None,
            resolved_at: None,
        }
    }

    fn resolve(mut self, outcome: AlertOutcome) -> Self {
        self.outcome = Some(outcome);
        self.resolved_at = Some(Local::now());
        self
    }
}

/// Durable record of alerts
pub trait AlertJournal: Send + Sync {
    fn record(&self, entry: &AlertEntry) -> anyhow::Result<()>;
}

/// Terminates the host process
pub trait ProcessLifecycle: Send + Sync {
    fn terminate(&self);
}

#[derive(Debug, Default)]
struct Latch {
    state: LatchState,
    alert: Option<AlertEntry>,
}

/// The alert latch. Every read and transition goes through one mutex.
#[derive(Debug, Default)]
pub struct AlertState {
    inner: Mutex<Latch>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> LatchState {
        self.lock().state
    }

    fn lock(&self) -> MutexGuard<'_, Latch> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Armed -> Prompting. False if the latch was already closed.
    fn open_alert(&self, entry: AlertEntry) -> bool {
        let mut latch = self.lock();
        if latch.state != LatchState::Armed {
            return false;
        }
        latch.state = LatchState::Prompting;
        latch.alert = Some(entry);
        true
    }

    /// Move to `to` if currently in one of `from`, handing back the in-flight alert
    fn settle(&self, from: &[LatchState], to: LatchState) -> Result<Option<AlertEntry>, LatchState> {
        let mut latch = self.lock();
        if !from.contains(&latch.state) {
            return Err(latch.state);
        }
        latch.state = to;
        Ok(latch.alert.take())
    }
}

/// Outcome of an alert whose answer arrived after the latch had already moved
fn superseded(state: LatchState) -> AlertOutcome {
    match state {
        LatchState::Terminated => AlertOutcome::ForcedShutdown,
        LatchState::Suspended => AlertOutcome::PromptUnavailable,
        LatchState::Armed | LatchState::Prompting => AlertOutcome::Continued,
    }
}

/// Decides when to interrupt the user and resolves their answer
pub struct AlertController {
    state: Arc<AlertState>,
    thresholds: Thresholds,
    prompt: PromptHandle,
    notifier: Arc<dyn NotificationSink>,
    lifecycle: Arc<dyn ProcessLifecycle>,
    journal: Option<Arc<dyn AlertJournal>>,
    shutdown: watch::Sender<bool>,
}

impl AlertController {
    pub fn new(
        state: Arc<AlertState>,
        thresholds: Thresholds,
        prompt: PromptHandle,
        notifier: Arc<dyn NotificationSink>,
        lifecycle: Arc<dyn ProcessLifecycle>,
        shutdown: watch::Sender<bool>,
    ) -> Self {
        Self {
            state,
            thresholds,
            prompt,
            notifier,
            lifecycle,
            journal: None,
            shutdown,
        }
    }

    pub fn with_journal(mut self, journal: Arc<dyn AlertJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn state(&self) -> LatchState {
        self.state.current()
    }

    /// Evaluate one sample. Returns the resolution task if a new alert was raised.
    ///
    /// Never waits for the user; the prompt is awaited on a spawned task.
    pub fn observe(self: &Arc<Self>, sample: &Sample) -> Option<JoinHandle<AlertOutcome>> {
        if !self.thresholds.breached_by(sample) {
            return None;
        }

        let entry = AlertEntry::raised(sample);
        if !self.state.open_alert(entry.clone()) {
            debug!(state = self.state().label(), "Breach while latch closed");
            return None;
        }

        warn!(
            cpu = %sample.cpu(),
            mem = %sample.mem(),
            "Resource threshold breached, raising alert"
        );
        self.journal(&entry);
        self.notifier.publish(MonitorEvent::Latch(LatchState::Prompting));
        self.notifier.publish(MonitorEvent::Freeze {
            detail: sample.summary(),
        });

        let request = PromptRequest::for_sample(sample);
        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let answer = this.prompt.ask(request).await;
            this.resolve(answer)
        }))
    }

    /// Apply the user's answer (or the prompt failure) to the latch.
    ///
    /// Returns how the alert actually ended, which differs from the answer
    /// when the latch was moved while the prompt was up.
    pub fn resolve(&self, answer: Result<Choice, PromptError>) -> AlertOutcome {
        match answer {
            Ok(Choice::Terminate) => {
                if self.terminate_from(&[LatchState::Prompting], AlertOutcome::Terminated) {
                    AlertOutcome::Terminated
                } else {
                    superseded(self.state())
                }
            }
            Ok(Choice::Continue) => {
                match self.state.settle(&[LatchState::Prompting], LatchState::Armed) {
                    Ok(entry) => {
                        info!("Alert dismissed, re-arming");
                        self.finish(entry, AlertOutcome::Continued);
                        self.notifier.publish(MonitorEvent::Latch(LatchState::Armed));
                        self.notifier.publish(MonitorEvent::Resume);
                        AlertOutcome::Continued
                    }
                    Err(state) => {
                        debug!(state = state.label(), "Alert answered after latch moved");
                        superseded(state)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Alert prompt unavailable, latch stays closed until re-armed");
                match self
                    .state
                    .settle(&[LatchState::Prompting], LatchState::Suspended)
                {
                    Ok(entry) => {
                        self.finish(entry, AlertOutcome::PromptUnavailable);
                        self.notifier
                            .publish(MonitorEvent::Latch(LatchState::Suspended));
                        self.notifier.publish(MonitorEvent::Resume);
                        AlertOutcome::PromptUnavailable
                    }
                    Err(state) => superseded(state),
                }
            }
        }
    }

    /// Explicit external reset of a suspended latch
    pub fn rearm(&self) -> bool {
        match self.state.settle(&[LatchState::Suspended], LatchState::Armed) {
            Ok(_) => {
                info!("Alert latch re-armed");
                self.notifier.publish(MonitorEvent::Latch(LatchState::Armed));
                true
            }
            Err(state) => {
                debug!(state = state.label(), "Re-arm ignored");
                false
            }
        }
    }

    /// Force the terminate path for an alert that is still outstanding
    pub fn abandon(&self) -> bool {
        self.terminate_from(
            &[LatchState::Prompting, LatchState::Suspended],
            AlertOutcome::ForcedShutdown,
        )
    }

    /// Tell the sampler to stop without touching the latch
    pub fn signal_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    fn terminate_from(&self, from: &[LatchState], outcome: AlertOutcome) -> bool {
        match self.state.settle(from, LatchState::Terminated) {
            Ok(entry) => {
                info!(outcome = outcome.label(), "Terminating browser");
                self.finish(entry, outcome);
                self.notifier
                    .publish(MonitorEvent::Latch(LatchState::Terminated));
                self.shutdown.send_replace(true);
                self.lifecycle.terminate();
                true
            }
            Err(state) => {
                debug!(state = state.label(), "Terminate ignored");
                false
            }
        }
    }

    fn finish(&self, entry: Option<AlertEntry>, outcome: AlertOutcome) {
        if let Some(entry) = entry {
            self.journal(&entry.resolve(outcome));
        }
    }

    fn journal(&self, entry: &AlertEntry) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record(entry) {
                warn!(error = %e, alert = %entry.id, "Failed to record alert");
            }
        }
    }
}
