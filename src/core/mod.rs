//! Core module - Sampling, alerting, and monitor lifecycle

pub mod alert;
mod monitor;
pub mod notify;
pub mod prompt;
mod sample;
mod sampler;
pub mod settings;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use alert::{AlertEntry, AlertJournal, AlertOutcome, LatchState, ProcessLifecycle, Thresholds};
pub use monitor::{Monitor, MonitorBuilder, MonitorHandle};
pub use notify::{ChannelNotifier, LogNotifier, MonitorEvent, SampleUpdate, UsageSummary};
pub use prompt::{Choice, ConfirmPrompt, PromptError, PromptRequest};
pub use sample::{LogRecord, Reading, Sample, UNAVAILABLE};
pub use settings::Settings;
pub use source::MetricBackend;
