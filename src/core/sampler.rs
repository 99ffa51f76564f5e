//! Sampler - Periodic CPU/memory collection

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::alert::{AlertController, LatchState};
use super::notify::{MonitorEvent, NotificationSink, SampleUpdate};
use super::sample::{LogRecord, Reading, Sample};
use super::source::MetricSource;
use crate::persistence::RecordSink;

/// Default sampling period
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1500);

/// Collects one sample per tick and hands it downstream
pub struct Sampler {
    source: Arc<dyn MetricSource>,
    sink: Arc<dyn RecordSink>,
    notifier: Arc<dyn NotificationSink>,
    alerts: Arc<AlertController>,
    interval: Duration,
    /// Last timestamp handed out, keeps the log ordered if the clock steps back
    last_timestamp: Option<DateTime<Local>>,
}

impl Sampler {
    pub fn new(
        source: Arc<dyn MetricSource>,
        sink: Arc<dyn RecordSink>,
        notifier: Arc<dyn NotificationSink>,
        alerts: Arc<AlertController>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            sink,
            notifier,
            alerts,
            interval,
            last_timestamp: None,
        }
    }

    /// Collect and normalize one sample. Failures become `Unavailable`.
    pub async fn sample(&mut self) -> Sample {
        let (cpu, mem) = tokio::join!(self.source.collect_cpu(), self.source.collect_memory());

        let cpu = match cpu {
            Ok(reading) => reading.usage(),
            Err(e) => {
                warn!(error = %e, "CPU collection failed");
                Reading::Unavailable
            }
        };

        let mem = match mem {
            Ok(reading) => {
                let usage = reading.usage();
                if !usage.is_available() {
                    warn!(
                        total = reading.total,
                        used = reading.used,
                        "Memory reading unusable"
                    );
                }
                usage
            }
            Err(e) => {
                warn!(error = %e, "Memory collection failed");
                Reading::Unavailable
            }
        };

        let now = Local::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);

        Sample::new(timestamp, cpu, mem)
    }

    /// Persist, notify, then let the alert controller look at the sample.
    ///
    /// Returns false without writing anything once the latch has terminated.
    pub fn deliver(&self, sample: &Sample) -> bool {
        if self.alerts.state() == LatchState::Terminated {
            debug!("Latch terminated, dropping sample");
            return false;
        }
        if let Err(e) = self.sink.append(&LogRecord::from(sample)) {
            error!(error = %e, "Failed to append monitoring log");
        }
        self.notifier
            .publish(MonitorEvent::Sample(SampleUpdate::from(sample)));
        self.alerts.observe(sample);
        true
    }

    /// One complete tick
    pub async fn tick(&mut self) -> Sample {
        let sample = self.sample().await;
        self.deliver(&sample);
        sample
    }

    /// Run until `shutdown` flips to true or the alert latch terminates
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Starting resource sampler"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;

        loop {
            if *shutdown.borrow() || self.alerts.state() == LatchState::Terminated {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            // a stop during collection drops the tick before anything is written
            let sample = tokio::select! {
                sample = self.sample() => sample,
                _ = shutdown.changed() => break,
            };

            if !self.deliver(&sample) {
                break;
            }

            ticks += 1;
            if ticks % 40 == 0 {
                debug!(ticks, state = self.alerts.state().label(), "Sampler alive");
            }
        }

        info!(ticks, "Resource sampler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alert::{AlertState, Thresholds};
    use crate::core::prompt::{Choice, ConfirmPrompt, PromptService};
    use crate::core::source::{CollectionError, CpuReading, MemoryReading};
    use crate::core::testing::{
        CountingLifecycle, GatedPrompt, MemorySink, RecordingNotifier, ScriptedPrompt,
        ScriptedSource, StalledCpuSource,
    };

    struct Fixture {
        sampler: Sampler,
        sink: Arc<MemorySink>,
        notifier: Arc<RecordingNotifier>,
        controller: Arc<AlertController>,
    }

    fn fixture(source: ScriptedSource, prompt: Arc<dyn ConfirmPrompt>) -> Fixture {
        let (handle, _task) = PromptService::spawn(prompt);
        let sink = Arc::new(MemorySink::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let (shutdown, _) = watch::channel(false);
        let controller = Arc::new(AlertController::new(
            Arc::new(AlertState::new()),
            Thresholds::default(),
            handle,
            notifier.clone(),
            Arc::new(CountingLifecycle::default()),
            shutdown,
        ));

        Fixture {
            sampler: Sampler::new(
                Arc::new(source),
                sink.clone(),
                notifier.clone(),
                controller.clone(),
                Duration::from_millis(10),
            ),
            sink,
            notifier,
            controller,
        }
    }

    fn cpu(idle: f64) -> Result<CpuReading, CollectionError> {
        Ok(CpuReading { idle_percent: idle })
    }

    fn mem(used: u64, total: u64) -> Result<MemoryReading, CollectionError> {
        Ok(MemoryReading { total, used })
    }

    #[tokio::test]
    async fn quiet_tick_logs_and_notifies_once() {
        let source = ScriptedSource::new(vec![(cpu(15.0), mem(4000, 8000))]);
        let prompt = Arc::new(ScriptedPrompt::new(vec![]));
        let mut f = fixture(source, prompt.clone());

        let sample = f.sampler.tick().await;

        assert_eq!(sample.cpu().formatted(), "85.00");
        assert_eq!(sample.mem().formatted(), "50.00");
        assert_eq!(f.sink.records().len(), 1);
        assert_eq!(f.notifier.samples().len(), 1);
        assert_eq!(f.controller.state(), LatchState::Armed);
        assert_eq!(prompt.calls(), 0);
    }

    #[tokio::test]
    async fn zero_total_memory_logs_na() {
        let source = ScriptedSource::new(vec![(cpu(15.0), mem(0, 0))]);
        let mut f = fixture(source, Arc::new(ScriptedPrompt::new(vec![])));

        let sample = f.sampler.tick().await;

        assert_eq!(sample.mem(), Reading::Unavailable);
        let records = f.sink.records();
        assert_eq!(records[0].ram, "N/A");
        assert_eq!(records[0].cpu, "85.00");
        assert_eq!(f.notifier.samples()[0].mem_formatted, "N/A");
    }

    #[tokio::test]
    async fn failure_domains_are_independent() {
        let source = ScriptedSource::new(vec![
            (Err(CollectionError::MissingIdle), mem(4000, 8000)),
            (cpu(40.0), Err(CollectionError::MissingMemoryLine)),
        ]);
        let mut f = fixture(source, Arc::new(ScriptedPrompt::new(vec![])));

        let first = f.sampler.tick().await;
        let second = f.sampler.tick().await;

        assert_eq!(first.cpu(), Reading::Unavailable);
        assert_eq!(first.mem(), Reading::Value(50.0));
        assert_eq!(second.cpu(), Reading::Value(60.0));
        assert_eq!(second.mem(), Reading::Unavailable);

        let records = f.sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].cpu.as_str(), records[0].ram.as_str()), ("N/A", "50.00"));
        assert_eq!((records[1].cpu.as_str(), records[1].ram.as_str()), ("60.00", "N/A"));
    }

    #[tokio::test]
    async fn sink_failure_does_not_stop_notification() {
        let source = ScriptedSource::new(vec![(cpu(15.0), mem(4000, 8000))]);
        let mut f = fixture(source, Arc::new(ScriptedPrompt::new(vec![])));
        f.sink.fail_next();

        f.sampler.tick().await;
        f.sampler.tick().await;

        assert_eq!(f.sink.records().len(), 1);
        assert_eq!(f.notifier.samples().len(), 2);
    }

    #[tokio::test]
    async fn ticks_keep_flowing_while_prompt_is_open() {
        let source = ScriptedSource::new(vec![
            (cpu(5.0), mem(4000, 8000)),
            (cpu(1.0), mem(7900, 8000)),
            (cpu(2.0), mem(7900, 8000)),
        ]);
        let prompt = Arc::new(GatedPrompt::new());
        let mut f = fixture(source, prompt.clone());

        for _ in 0..3 {
            f.sampler.tick().await;
        }

        assert_eq!(f.controller.state(), LatchState::Prompting);
        assert_eq!(f.sink.records().len(), 3);
        assert_eq!(f.notifier.samples().len(), 3);
        assert_eq!(f.notifier.freezes(), 1);

        prompt.answer(Ok(Choice::Continue));
    }

    #[tokio::test]
    async fn stalled_cpu_source_yields_na_without_holding_the_tick() {
        let source = StalledCpuSource::new(Duration::from_millis(50), 4000, 8000);
        let (handle, _task) = PromptService::spawn(Arc::new(ScriptedPrompt::new(vec![])));
        let sink = Arc::new(MemorySink::default());
        let (shutdown, _) = watch::channel(false);
        let controller = Arc::new(AlertController::new(
            Arc::new(AlertState::new()),
            Thresholds::default(),
            handle,
            Arc::new(RecordingNotifier::default()),
            Arc::new(CountingLifecycle::default()),
            shutdown,
        ));
        let mut sampler = Sampler::new(
            Arc::new(source),
            sink.clone(),
            Arc::new(RecordingNotifier::default()),
            controller,
            Duration::from_millis(10),
        );

        let sample = tokio::time::timeout(Duration::from_secs(1), sampler.tick())
            .await
            .expect("a stalled source must not hold the tick");

        assert_eq!(sample.cpu(), Reading::Unavailable);
        assert_eq!(sample.mem(), Reading::Value(50.0));
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cpu, "N/A");
    }

    #[tokio::test]
    async fn nothing_is_written_after_terminate() {
        let source = ScriptedSource::new(vec![(cpu(2.0), mem(4000, 8000))]);
        let prompt = Arc::new(GatedPrompt::new());
        let mut f = fixture(source, prompt.clone());

        let sample = f.sampler.tick().await;
        assert_eq!(f.controller.state(), LatchState::Prompting);
        assert!(f.controller.abandon());

        // a sample collected before the terminate landed
        assert!(!f.sampler.deliver(&sample));
        assert_eq!(f.sink.records().len(), 1);
        assert_eq!(f.notifier.samples().len(), 1);

        prompt.answer(Ok(Choice::Continue));
    }

    #[tokio::test]
    async fn timestamps_never_go_backwards() {
        let source = ScriptedSource::new(vec![(cpu(50.0), mem(1, 2))]);
        let mut f = fixture(source, Arc::new(ScriptedPrompt::new(vec![])));

        let future = Local::now() + chrono::TimeDelta::seconds(60);
        f.sampler.last_timestamp = Some(future);

        let sample = f.sampler.sample().await;
        assert_eq!(sample.timestamp(), future);
    }
}
