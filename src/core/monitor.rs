//! Monitor - Wiring and lifecycle of one running resource monitor

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::alert::{AlertController, AlertJournal, AlertState, LatchState, ProcessLifecycle, Thresholds};
use super::notify::NotificationSink;
use super::prompt::{ConfirmPrompt, PromptService};
use super::sampler::{Sampler, DEFAULT_INTERVAL};
use super::source::MetricSource;
use crate::persistence::RecordSink;

/// Collects the collaborators of a monitor
#[derive(Default)]
pub struct MonitorBuilder {
    source: Option<Arc<dyn MetricSource>>,
    sink: Option<Arc<dyn RecordSink>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    prompt: Option<Arc<dyn ConfirmPrompt>>,
    lifecycle: Option<Arc<dyn ProcessLifecycle>>,
    journal: Option<Arc<dyn AlertJournal>>,
    interval: Option<Duration>,
    thresholds: Thresholds,
}

impl MonitorBuilder {
    pub fn source(mut self, source: Arc<dyn MetricSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn prompt(mut self, prompt: Arc<dyn ConfirmPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn lifecycle(mut self, lifecycle: Arc<dyn ProcessLifecycle>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    pub fn journal(mut self, journal: Arc<dyn AlertJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn build(self) -> Result<Monitor> {
        let interval = self.interval.unwrap_or(DEFAULT_INTERVAL);
        if interval.is_zero() {
            return Err(anyhow!("Sampling interval must be greater than zero"));
        }

        Ok(Monitor {
            source: self.source.ok_or_else(|| missing("metric source"))?,
            sink: self.sink.ok_or_else(|| missing("record sink"))?,
            notifier: self.notifier.ok_or_else(|| missing("notification sink"))?,
            prompt: self.prompt.ok_or_else(|| missing("confirmation prompt"))?,
            lifecycle: self.lifecycle.ok_or_else(|| missing("process lifecycle"))?,
            journal: self.journal,
            interval,
            thresholds: self.thresholds,
        })
    }
}

fn missing(what: &str) -> anyhow::Error {
    anyhow!("Monitor is missing a {}", what)
}

/// A fully wired monitor that has not started yet
pub struct Monitor {
    source: Arc<dyn MetricSource>,
    sink: Arc<dyn RecordSink>,
    notifier: Arc<dyn NotificationSink>,
    prompt: Arc<dyn ConfirmPrompt>,
    lifecycle: Arc<dyn ProcessLifecycle>,
    journal: Option<Arc<dyn AlertJournal>>,
    interval: Duration,
    thresholds: Thresholds,
}

impl Monitor {
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::default()
    }

    /// Spawn the prompt actor and the sampler. Must be called inside a tokio runtime.
    pub fn start(self) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (prompt, prompt_task) = PromptService::spawn(self.prompt);

        let mut controller = AlertController::new(
            Arc::new(AlertState::new()),
            self.thresholds,
            prompt,
            Arc::clone(&self.notifier),
            self.lifecycle,
            shutdown_tx,
        );
        if let Some(journal) = self.journal {
            controller = controller.with_journal(journal);
        }
        let controller = Arc::new(controller);

        info!(
            cpu_threshold = self.thresholds.cpu_percent,
            mem_threshold = self.thresholds.mem_percent,
            "Monitor started"
        );

        let sampler = Sampler::new(
            self.source,
            self.sink,
            self.notifier,
            Arc::clone(&controller),
            self.interval,
        );
        let sampler_task = tokio::spawn(sampler.run(shutdown_rx.clone()));

        MonitorHandle {
            controller,
            shutdown: shutdown_rx,
            sampler_task,
            prompt_task,
        }
    }
}

/// Control surface of a running monitor
pub struct MonitorHandle {
    controller: Arc<AlertController>,
    shutdown: watch::Receiver<bool>,
    sampler_task: JoinHandle<()>,
    prompt_task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn state(&self) -> LatchState {
        self.controller.state()
    }

    /// Reopen a suspended latch
    pub fn rearm(&self) -> bool {
        self.controller.rearm()
    }

    /// Resolves once the monitor has been told to stop
    pub async fn finished(&self) {
        let mut shutdown = self.shutdown.clone();
        let _ = shutdown.wait_for(|stopped| *stopped).await;
    }

    /// Stop sampling. An outstanding alert is forced down the terminate path.
    pub async fn stop(self) {
        if self.controller.abandon() {
            warn!("Monitor stopped with an alert outstanding, browser terminated");
        }
        self.controller.signal_shutdown();

        if let Err(e) = self.sampler_task.await {
            warn!(error = %e, "Sampler task ended abnormally");
        }
        self.prompt_task.abort();
        info!("Monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alert::AlertOutcome;
    use crate::core::prompt::{Choice, PromptError};
    use crate::core::source::{CpuReading, MemoryReading};
    use crate::core::testing::{
        CountingLifecycle, GatedPrompt, MemoryJournal, MemorySink, RecordingNotifier,
        ScriptedPrompt, ScriptedSource,
    };

    struct Parts {
        sink: Arc<MemorySink>,
        notifier: Arc<RecordingNotifier>,
        lifecycle: Arc<CountingLifecycle>,
        journal: Arc<MemoryJournal>,
    }

    fn source(idle: f64, used: u64) -> ScriptedSource {
        ScriptedSource::new(vec![(
            Ok(CpuReading { idle_percent: idle }),
            Ok(MemoryReading { total: 100, used }),
        )])
    }

    fn wire(source: ScriptedSource, prompt: Arc<dyn ConfirmPrompt>) -> (MonitorBuilder, Parts) {
        let parts = Parts {
            sink: Arc::new(MemorySink::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            lifecycle: Arc::new(CountingLifecycle::default()),
            journal: Arc::new(MemoryJournal::default()),
        };
        let builder = Monitor::builder()
            .source(Arc::new(source))
            .sink(parts.sink.clone())
            .notifier(parts.notifier.clone())
            .prompt(prompt)
            .lifecycle(parts.lifecycle.clone())
            .journal(parts.journal.clone())
            .interval(Duration::from_millis(10));
        (builder, parts)
    }

    async fn wait_for_state(handle: &MonitorHandle, state: LatchState) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while handle.state() != state {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("latch never reached the expected state");
    }

    #[test]
    fn build_requires_every_collaborator() {
        let err = Monitor::builder()
            .sink(Arc::new(MemorySink::default()))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("metric source"));

        let (builder, _) = wire(source(50.0, 10), Arc::new(ScriptedPrompt::new(vec![])));
        assert!(builder.interval(Duration::ZERO).build().is_err());
    }

    #[tokio::test]
    async fn records_arrive_in_tick_order() {
        let (builder, parts) = wire(source(50.0, 10), Arc::new(ScriptedPrompt::new(vec![])));
        let handle = builder.build().unwrap().start();

        tokio::time::sleep(Duration::from_millis(80)).await;
        handle.stop().await;

        let records = parts.sink.records();
        assert!(records.len() >= 2);
        let stamps: Vec<String> = records
            .iter()
            .map(|r| format!("{} {}", r.date, r.hour))
            .collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
        assert_eq!(parts.notifier.samples().len(), records.len());

        // no more ticks once stopped
        let count = parts.sink.records().len();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(parts.sink.records().len(), count);
    }

    #[tokio::test]
    async fn terminate_finishes_the_monitor() {
        let prompt = Arc::new(ScriptedPrompt::new(vec![Ok(Choice::Terminate)]));
        let (builder, parts) = wire(source(2.0, 10), prompt.clone());
        let handle = builder.build().unwrap().start();

        tokio::time::timeout(Duration::from_secs(2), handle.finished())
            .await
            .expect("monitor should finish after terminate");
        assert_eq!(handle.state(), LatchState::Terminated);

        handle.stop().await;
        assert_eq!(parts.lifecycle.count(), 1);
        assert_eq!(prompt.calls(), 1);
        assert_eq!(
            parts.journal.entries().last().unwrap().outcome,
            Some(AlertOutcome::Terminated)
        );
    }

    #[tokio::test]
    async fn stop_during_prompt_forces_one_terminate() {
        let prompt = Arc::new(GatedPrompt::new());
        let (builder, parts) = wire(source(50.0, 95), prompt.clone());
        let handle = builder.build().unwrap().start();

        wait_for_state(&handle, LatchState::Prompting).await;
        handle.stop().await;

        assert_eq!(parts.lifecycle.count(), 1);
        assert_eq!(
            parts.journal.entries().last().unwrap().outcome,
            Some(AlertOutcome::ForcedShutdown)
        );
        assert_eq!(prompt.calls(), 1);

        prompt.answer(Ok(Choice::Continue));
    }

    #[tokio::test]
    async fn suspended_latch_reopens_through_handle() {
        let prompt = Arc::new(ScriptedPrompt::new(vec![Err(PromptError::Unavailable)]));
        let (builder, parts) = wire(source(1.0, 10), prompt.clone());
        let handle = builder.build().unwrap().start();

        wait_for_state(&handle, LatchState::Suspended).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(prompt.calls(), 1);

        assert!(handle.rearm());
        // the breach continues, so the next tick prompts again
        tokio::time::timeout(Duration::from_secs(2), async {
            while prompt.calls() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        handle.stop().await;
        assert_eq!(parts.lifecycle.count(), 1);
    }
}
