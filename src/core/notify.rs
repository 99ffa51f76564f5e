//! Notification sinks - Pushing samples and alert state to the UI

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, trace};

use super::alert::LatchState;
use super::sample::Sample;

/// Per-tick payload delivered to the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleUpdate {
    pub cpu: Option<f64>,
    pub mem: Option<f64>,
    pub cpu_formatted: String,
    pub mem_formatted: String,
    pub timestamp: DateTime<Local>,
}

impl From<&Sample> for SampleUpdate {
    fn from(sample: &Sample) -> Self {
        Self {
            cpu: sample.cpu().value(),
            mem: sample.mem().value(),
            cpu_formatted: sample.cpu().formatted(),
            mem_formatted: sample.mem().formatted(),
            timestamp: sample.timestamp(),
        }
    }
}

/// Peak and mean utilization over a window of updates; `N/A` readings are skipped
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageSummary {
    pub max_cpu: Option<f64>,
    pub mean_cpu: Option<f64>,
    pub max_mem: Option<f64>,
    /// Samples with a CPU value
    pub cpu_samples: usize,
}

impl UsageSummary {
    pub fn over<'a>(updates: impl IntoIterator<Item = &'a SampleUpdate>) -> Self {
        let mut summary = Self::default();
        let mut cpu_total = 0.0;

        for update in updates {
            if let Some(cpu) = update.cpu {
                summary.max_cpu = Some(summary.max_cpu.map_or(cpu, |m| m.max(cpu)));
                cpu_total += cpu;
                summary.cpu_samples += 1;
            }
            if let Some(mem) = update.mem {
                summary.max_mem = Some(summary.max_mem.map_or(mem, |m| m.max(mem)));
            }
        }

        if summary.cpu_samples > 0 {
            summary.mean_cpu = Some(cpu_total / summary.cpu_samples as f64);
        }
        summary
    }
}

/// Events pushed from the monitor to whoever renders it
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// A tick completed
    Sample(SampleUpdate),
    /// An alert is about to prompt; the UI should look unresponsive
    Freeze { detail: String },
    /// The alert was resolved without terminating
    Resume,
    /// The alert latch changed state
    Latch(LatchState),
}

/// Fire-and-forget consumer of monitor events
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: MonitorEvent);
}

/// Forwards events to the egui app over a channel
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<MonitorEvent>,
    ctx: Option<egui::Context>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<MonitorEvent>) -> Self {
        Self { tx, ctx: None }
    }

    /// Request a repaint whenever something is published
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.ctx = Some(ctx);
        self
    }
}

impl NotificationSink for ChannelNotifier {
    fn publish(&self, event: MonitorEvent) {
        if self.tx.send(event).is_err() {
            trace!("UI event receiver dropped");
            return;
        }
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }
}

/// Writes events to the log; used when running without a window
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn publish(&self, event: MonitorEvent) {
        match event {
            MonitorEvent::Sample(update) => info!(
                "[Monitor] CPU: {}% | RAM: {}%",
                update.cpu_formatted, update.mem_formatted
            ),
            MonitorEvent::Freeze { detail } => info!(%detail, "[Monitor] Alert raised"),
            MonitorEvent::Resume => info!("[Monitor] Alert dismissed"),
            MonitorEvent::Latch(state) => trace!(state = state.label(), "Latch changed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::Reading;

    #[test]
    fn update_carries_numeric_and_formatted_fields() {
        let sample = Sample::new(Local::now(), Reading::Value(85.0), Reading::Unavailable);
        let update = SampleUpdate::from(&sample);

        assert_eq!(update.cpu, Some(85.0));
        assert_eq!(update.mem, None);
        assert_eq!(update.cpu_formatted, "85.00");
        assert_eq!(update.mem_formatted, "N/A");
    }

    fn update(cpu: Reading, mem: Reading) -> SampleUpdate {
        SampleUpdate::from(&Sample::new(Local::now(), cpu, mem))
    }

    #[test]
    fn summary_skips_unavailable_readings() {
        let updates = vec![
            update(Reading::Value(20.0), Reading::Value(40.0)),
            update(Reading::Unavailable, Reading::Value(75.5)),
            update(Reading::Value(60.0), Reading::Unavailable),
        ];
        let summary = UsageSummary::over(&updates);

        assert_eq!(summary.max_cpu, Some(60.0));
        assert_eq!(summary.mean_cpu, Some(40.0));
        assert_eq!(summary.max_mem, Some(75.5));
        assert_eq!(summary.cpu_samples, 2);
    }

    #[test]
    fn summary_of_nothing_is_empty() {
        let only_gaps = vec![update(Reading::Unavailable, Reading::Unavailable)];
        assert_eq!(UsageSummary::over(&only_gaps), UsageSummary::default());
        assert_eq!(UsageSummary::over(&Vec::new()), UsageSummary::default());
    }

    #[test]
    fn channel_notifier_ignores_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = ChannelNotifier::new(tx);
        drop(rx);
        notifier.publish(MonitorEvent::Resume);
    }
}
