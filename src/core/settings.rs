//! Application settings management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::alert::{Thresholds, DEFAULT_CPU_THRESHOLD, DEFAULT_MEM_THRESHOLD};
use super::source::MetricBackend;

/// Application theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
    System,
}

impl Theme {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
            Self::System => "System",
        }
    }

    pub fn all() -> &'static [Theme] {
        &[Theme::Dark, Theme::Light, Theme::System]
    }
}

/// Where the alert confirmation is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromptStyle {
    /// Modal drawn inside the ShellGuard window
    #[default]
    InWindow,
    /// Native OS message box
    Native,
}

impl PromptStyle {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InWindow => "In-window dialog",
            Self::Native => "Native message box",
        }
    }

    pub fn all() -> &'static [PromptStyle] {
        &[PromptStyle::InWindow, PromptStyle::Native]
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // General
    /// Application theme
    pub theme: Theme,

    // Monitoring
    /// Time between samples in ms
    pub sample_interval_ms: u64,
    /// CPU utilization that raises an alert
    pub cpu_threshold: f64,
    /// Memory utilization that raises an alert
    pub memory_threshold: f64,
    /// How CPU and memory are collected
    pub metric_backend: MetricBackend,
    /// Deadline for one external collection command in ms
    pub command_timeout_ms: u64,

    // Alerts
    pub prompt_style: PromptStyle,
    /// Keep alert history for N days (0 = forever)
    pub history_retention_days: u32,

    // Advanced
    /// Custom monitoring log location
    pub log_file: Option<PathBuf>,
    /// Custom data directory
    pub data_directory: Option<PathBuf>,
    /// Enable debug logging
    pub debug_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,

            sample_interval_ms: 1500,
            cpu_threshold: DEFAULT_CPU_THRESHOLD,
            memory_threshold: DEFAULT_MEM_THRESHOLD,
            metric_backend: MetricBackend::default(),
            command_timeout_ms: 1000,

            prompt_style: PromptStyle::InWindow,
            history_retention_days: 30,

            log_file: None,
            data_directory: None,
            debug_logging: false,
        }
    }
}

impl Settings {
    /// Get the data directory, using default if not set
    pub fn get_data_directory(&self) -> PathBuf {
        self.data_directory.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("ShellGuard")
        })
    }

    /// Get the monitoring log path
    pub fn get_log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.get_data_directory().join("monitoring.csv"))
    }

    pub fn get_database_path(&self) -> PathBuf {
        self.get_data_directory().join("shellguard.db")
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            cpu_percent: self.cpu_threshold,
            mem_percent: self.memory_threshold,
        }
    }

    /// Validate settings and fix any invalid values
    pub fn validate(&mut self) {
        self.sample_interval_ms = self.sample_interval_ms.max(100);
        self.command_timeout_ms = self.command_timeout_ms.max(100);
        self.cpu_threshold = clamp_percent(self.cpu_threshold, DEFAULT_CPU_THRESHOLD);
        self.memory_threshold = clamp_percent(self.memory_threshold, DEFAULT_MEM_THRESHOLD);
    }
}

fn clamp_percent(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        fallback
    }
}
