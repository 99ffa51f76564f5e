//! Test doubles shared by the core unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;

use super::alert::{AlertEntry, AlertJournal, ProcessLifecycle};
use super::notify::{MonitorEvent, NotificationSink, SampleUpdate};
use super::prompt::{Choice, ConfirmPrompt, PromptError, PromptRequest};
use super::sample::{LogRecord, Reading, Sample};
use super::source::{CollectionError, CpuReading, MemoryReading, MetricSource};
use crate::persistence::{RecordSink, SinkError};

/// Build a sample from optional percentages
pub fn sample(cpu: Option<f64>, mem: Option<f64>) -> Sample {
    let reading = |v: Option<f64>| v.map(Reading::percent).unwrap_or(Reading::Unavailable);
    Sample::new(Local::now(), reading(cpu), reading(mem))
}

type CpuResult = Result<CpuReading, CollectionError>;
type MemResult = Result<MemoryReading, CollectionError>;

fn replay<T: Copy>(result: &Result<T, CollectionError>) -> Result<T, CollectionError> {
    match result {
        Ok(v) => Ok(*v),
        Err(e) => Err(CollectionError::Backend(e.to_string())),
    }
}

fn next<T: Copy>(queue: &Mutex<VecDeque<Result<T, CollectionError>>>) -> Result<T, CollectionError> {
    let mut queue = queue.lock().unwrap();
    if queue.len() > 1 {
        queue.pop_front().unwrap()
    } else {
        queue
            .front()
            .map(replay)
            .unwrap_or_else(|| Err(CollectionError::Backend("script exhausted".into())))
    }
}

/// Plays back scripted readings; the last pair repeats forever
pub struct ScriptedSource {
    cpu: Mutex<VecDeque<CpuResult>>,
    mem: Mutex<VecDeque<MemResult>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<(CpuResult, MemResult)>) -> Self {
        let (cpu, mem): (VecDeque<_>, VecDeque<_>) = script.into_iter().unzip();
        Self {
            cpu: Mutex::new(cpu),
            mem: Mutex::new(mem),
        }
    }
}

#[async_trait]
impl MetricSource for ScriptedSource {
    async fn collect_cpu(&self) -> Result<CpuReading, CollectionError> {
        next(&self.cpu)
    }

    async fn collect_memory(&self) -> Result<MemoryReading, CollectionError> {
        next(&self.mem)
    }
}

/// CPU collection hangs until its timeout expires; memory answers at once
pub struct StalledCpuSource {
    timeout: Duration,
    memory: MemoryReading,
}

impl StalledCpuSource {
    pub fn new(timeout: Duration, used: u64, total: u64) -> Self {
        Self {
            timeout,
            memory: MemoryReading { total, used },
        }
    }
}

#[async_trait]
impl MetricSource for StalledCpuSource {
    async fn collect_cpu(&self) -> Result<CpuReading, CollectionError> {
        tokio::time::timeout(self.timeout, std::future::pending::<CpuReading>())
            .await
            .map_err(|_| CollectionError::Timeout {
                command: "top -bn1".into(),
                timeout: self.timeout,
            })
    }

    async fn collect_memory(&self) -> Result<MemoryReading, CollectionError> {
        Ok(self.memory)
    }
}

/// Keeps records in memory; can be told to fail once
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
    fail_next: AtomicBool,
}

impl MemorySink {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl RecordSink for MemorySink {
    fn append(&self, record: &LogRecord) -> Result<(), SinkError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SinkError::Io {
                path: "memory".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<MonitorEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn samples(&self) -> Vec<SampleUpdate> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MonitorEvent::Sample(update) => Some(update),
                _ => None,
            })
            .collect()
    }

    pub fn freezes(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, MonitorEvent::Freeze { .. }))
            .count()
    }
}

impl NotificationSink for RecordingNotifier {
    fn publish(&self, event: MonitorEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Answers prompts from a fixed script
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Result<Choice, PromptError>>>,
    calls: AtomicUsize,
    last_detail: Mutex<Option<String>>,
}

impl ScriptedPrompt {
    pub fn new(answers: Vec<Result<Choice, PromptError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            calls: AtomicUsize::new(0),
            last_detail: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_detail(&self) -> Option<String> {
        self.last_detail.lock().unwrap().clone()
    }
}

impl ConfirmPrompt for ScriptedPrompt {
    fn confirm(&self, request: &PromptRequest) -> Result<Choice, PromptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_detail.lock().unwrap() = Some(request.detail.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(PromptError::Unavailable))
    }
}

/// Blocks inside `confirm` until the test calls `answer`
pub struct GatedPrompt {
    tx: Mutex<mpsc::Sender<Result<Choice, PromptError>>>,
    rx: Mutex<mpsc::Receiver<Result<Choice, PromptError>>>,
    calls: AtomicUsize,
}

impl GatedPrompt {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn answer(&self, answer: Result<Choice, PromptError>) {
        let _ = self.tx.lock().unwrap().send(answer);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ConfirmPrompt for GatedPrompt {
    fn confirm(&self, _request: &PromptRequest) -> Result<Choice, PromptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rx
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(5))
            .unwrap_or_else(|_| Err(PromptError::Failed("test never answered".into())))
    }
}

#[derive(Default)]
pub struct CountingLifecycle {
    count: AtomicUsize,
}

impl CountingLifecycle {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ProcessLifecycle for CountingLifecycle {
    fn terminate(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<AlertEntry>>,
}

impl MemoryJournal {
    pub fn entries(&self) -> Vec<AlertEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl AlertJournal for MemoryJournal {
    fn record(&self, entry: &AlertEntry) -> anyhow::Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
