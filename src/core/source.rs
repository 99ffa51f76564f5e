//! Metric sources - Where CPU and memory figures come from

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sysinfo::System;
use thiserror::Error;
use tokio::process::Command;
use tracing::trace;

use super::sample::Reading;

/// Errors raised while collecting a metric
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("`{command}` exited with {status}")]
    Failed { command: String, status: String },
    #[error("no idle percentage found in CPU output")]
    MissingIdle,
    #[error("no memory line found in output")]
    MissingMemoryLine,
    #[error("malformed memory line: {0:?}")]
    MalformedMemory(String),
    #[error("metric backend unavailable: {0}")]
    Backend(String),
}

/// Raw CPU figure as reported by the source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuReading {
    /// Idle time percentage
    pub idle_percent: f64,
}

impl CpuReading {
    /// Utilization is whatever is not idle
    pub fn usage(&self) -> Reading {
        Reading::percent(100.0 - self.idle_percent)
    }
}

/// Raw memory figures, `total` and `used` in the same unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryReading {
    pub total: u64,
    pub used: u64,
}

impl MemoryReading {
    pub fn usage(&self) -> Reading {
        Reading::ratio(self.used, self.total)
    }
}

/// Something that can report host CPU and memory utilization
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn collect_cpu(&self) -> Result<CpuReading, CollectionError>;
    async fn collect_memory(&self) -> Result<MemoryReading, CollectionError>;
}

/// Which metric source implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricBackend {
    /// `top` and `free` shell commands
    Command,
    /// The sysinfo crate
    Sysinfo,
}

impl MetricBackend {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Command => "top / free",
            Self::Sysinfo => "sysinfo",
        }
    }

    pub fn all() -> &'static [MetricBackend] {
        &[MetricBackend::Command, MetricBackend::Sysinfo]
    }

    /// Build the source for this backend
    pub fn build(self, command_timeout: Duration) -> Arc<dyn MetricSource> {
        match self {
            Self::Command => Arc::new(CommandSource::new(command_timeout)),
            Self::Sysinfo => Arc::new(SysinfoSource::new()),
        }
    }
}

impl Default for MetricBackend {
    fn default() -> Self {
        if cfg!(target_os = "linux") {
            Self::Command
        } else {
            Self::Sysinfo
        }
    }
}

/// Shells out to `top -bn1` and `free -m`
pub struct CommandSource {
    timeout: Duration,
}

impl CommandSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<String, CollectionError> {
        let command = format!("{} {}", program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args)
            .env("LANG", "C")
            .env("LC_ALL", "C")
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| CollectionError::Timeout {
                command: command.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| CollectionError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CollectionError::Failed {
                command,
                status: output.status.to_string(),
            });
        }

        trace!(%command, bytes = output.stdout.len(), "Command finished");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MetricSource for CommandSource {
    async fn collect_cpu(&self) -> Result<CpuReading, CollectionError> {
        let output = self.run("top", &["-bn1"]).await?;
        let idle_percent = parse_cpu_idle(&output)?;
        Ok(CpuReading { idle_percent })
    }

    async fn collect_memory(&self) -> Result<MemoryReading, CollectionError> {
        let output = self.run("free", &["-m"]).await?;
        parse_memory(&output)
    }
}

/// Extract the idle figure from the `%Cpu(s)` summary line of `top`.
///
/// Matches `<digits>.<digits>`, an optional `%`, whitespace, then `id`.
pub fn parse_cpu_idle(output: &str) -> Result<f64, CollectionError> {
    for line in output.lines().filter(|l| l.contains("Cpu(s)")) {
        for (idx, _) in line.match_indices("id") {
            let head = line[..idx].trim_end();
            let head = head.strip_suffix('%').unwrap_or(head);
            let len = head
                .chars()
                .rev()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .count();
            let number = &head[head.len() - len..];

            if number.contains('.') && !number.starts_with('.') && !number.ends_with('.') {
                if let Ok(idle) = number.parse::<f64>() {
                    return Ok(idle);
                }
            }
        }
    }
    Err(CollectionError::MissingIdle)
}

/// Read total and used memory from `free` output
pub fn parse_memory(output: &str) -> Result<MemoryReading, CollectionError> {
    let line = output
        .lines()
        .find(|l| l.to_lowercase().contains("mem"))
        .ok_or(CollectionError::MissingMemoryLine)?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    let parse = |idx: usize| -> Result<u64, CollectionError> {
        fields
            .get(idx)
            .and_then(|f| f.parse::<u64>().ok())
            .ok_or_else(|| CollectionError::MalformedMemory(line.trim().to_string()))
    };

    Ok(MemoryReading {
        total: parse(1)?,
        used: parse(2)?,
    })
}

/// Cross-platform source backed by sysinfo
pub struct SysinfoSource {
    system: Mutex<System>,
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut system = System::new();
        // CPU usage is a delta between refreshes, so prime it once
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricSource for SysinfoSource {
    async fn collect_cpu(&self) -> Result<CpuReading, CollectionError> {
        let mut system = self
            .system
            .lock()
            .map_err(|e| CollectionError::Backend(format!("system lock poisoned: {}", e)))?;
        system.refresh_cpu_usage();
        let usage = system.global_cpu_usage() as f64;
        Ok(CpuReading {
            idle_percent: 100.0 - usage,
        })
    }

    async fn collect_memory(&self) -> Result<MemoryReading, CollectionError> {
        let mut system = self
            .system
            .lock()
            .map_err(|e| CollectionError::Backend(format!("system lock poisoned: {}", e)))?;
        system.refresh_memory();
        Ok(MemoryReading {
            total: system.total_memory(),
            used: system.used_memory(),
        })
    }
}
