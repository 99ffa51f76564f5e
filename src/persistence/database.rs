//! SQLite database implementation for persistent storage

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::core::{AlertEntry, AlertJournal, AlertOutcome, Reading, Settings};

/// Database wrapper for SQLite operations
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database in the default data directory
    pub fn new() -> Result<Self> {
        Self::open(Settings::default().get_database_path())
    }

    /// Open (or create) the database at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)
            .context(format!("Failed to open database at {:?}", db_path))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        info!("Database opened at {:?}", db_path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Database lock poisoned: {}", e))
    }

    /// Initialize database schema
    pub fn initialize(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r#"
            -- Settings table
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Raised alerts and how they ended
            CREATE TABLE IF NOT EXISTS alert_history (
                id TEXT PRIMARY KEY,
                raised_at TEXT NOT NULL,
                cpu REAL,
                mem REAL,
                outcome TEXT,
                resolved_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_alert_history_raised_at
                ON alert_history (raised_at);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }

    // === Settings ===

    /// Load settings from database
    pub fn load_settings(&self) -> Result<Option<Settings>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = 'app_settings'")?;
        let result: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;

        match result {
            Some(json) => {
                let mut settings: Settings =
                    serde_json::from_str(&json).context("Failed to deserialize settings")?;
                // Validate and fix any invalid values after deserialization
                settings.validate();
                Ok(Some(settings))
            }
            None => Ok(None),
        }
    }

    /// Save settings to database
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES ('app_settings', ?1)",
            params![json],
        )?;
        debug!("Settings saved");
        Ok(())
    }

    // === Alert history ===

    /// Insert or update an alert
    pub fn record_alert(&self, entry: &AlertEntry) -> Result<()> {
        self.conn()?.execute(
            r#"
            INSERT OR REPLACE INTO alert_history
            (id, raised_at, cpu, mem, outcome, resolved_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.id.to_string(),
                entry.raised_at.with_timezone(&Utc).to_rfc3339(),
                entry.cpu.value(),
                entry.mem.value(),
                entry.outcome.map(|o| o.as_str()),
                entry.resolved_at.map(|t| t.with_timezone(&Utc).to_rfc3339()),
            ],
        )?;
        debug!("Alert {} recorded", entry.id);
        Ok(())
    }

    /// Most recent alerts first
    pub fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, raised_at, cpu, mem, outcome, resolved_at FROM alert_history ORDER BY raised_at DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let id: String = row.get(0)?;
            let raised_at: String = row.get(1)?;
            let cpu: Option<f64> = row.get(2)?;
            let mem: Option<f64> = row.get(3)?;
            let outcome: Option<String> = row.get(4)?;
            let resolved_at: Option<String> = row.get(5)?;
            Ok((id, raised_at, cpu, mem, outcome, resolved_at))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id, raised_at, cpu, mem, outcome, resolved_at) = row?;

            let id = match Uuid::parse_str(&id) {
                Ok(id) => id,
                Err(e) => {
                    error!("Skipping alert with malformed id {}: {}", id, e);
                    continue;
                }
            };
            let Some(raised_at) = parse_time(&raised_at) else {
                error!("Skipping alert {} with malformed timestamp", id);
                continue;
            };

            result.push(AlertEntry {
                id,
                raised_at,
                cpu: reading(cpu),
                mem: reading(mem),
                outcome: outcome.as_deref().and_then(AlertOutcome::parse),
                resolved_at: resolved_at.as_deref().and_then(parse_time),
            });
        }

        Ok(result)
    }

    /// Clean up old history entries
    pub fn cleanup_history(&self, retention_days: u32) -> Result<usize> {
        if retention_days == 0 {
            return Ok(0); // Keep forever
        }

        let cutoff = Utc::now()
            - chrono::TimeDelta::try_days(retention_days as i64)
                .unwrap_or_else(|| chrono::TimeDelta::days(30));
        let count = self.conn()?.execute(
            "DELETE FROM alert_history WHERE raised_at < ?1",
            params![cutoff.to_rfc3339()],
        )?;

        debug!("Cleaned up {} old alert entries", count);
        Ok(count)
    }
}

impl AlertJournal for Database {
    fn record(&self, entry: &AlertEntry) -> Result<()> {
        self.record_alert(entry)
    }
}

fn parse_time(value: &str) -> Option<DateTime<Local>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Local))
}

fn reading(value: Option<f64>) -> Reading {
    value.map(Reading::Value).unwrap_or(Reading::Unavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::PromptStyle;

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("data").join("shellguard.db")).unwrap();
        db.initialize().unwrap();
        (dir, db)
    }

    fn entry(days_ago: i64, cpu: Option<f64>) -> AlertEntry {
        AlertEntry {
            id: Uuid::new_v4(),
            raised_at: Local::now() - chrono::TimeDelta::days(days_ago),
            cpu: reading(cpu),
            mem: Reading::Value(50.0),
            outcome: None,
            resolved_at: None,
        }
    }

    #[test]
    fn settings_round_trip_through_json() {
        let (_dir, db) = open();
        assert!(db.load_settings().unwrap().is_none());

        let settings = Settings {
            cpu_threshold: 75.0,
            prompt_style: PromptStyle::Native,
            ..Default::default()
        };
        db.save_settings(&settings).unwrap();

        let loaded = db.load_settings().unwrap().unwrap();
        assert_eq!(loaded.cpu_threshold, 75.0);
        assert_eq!(loaded.prompt_style, PromptStyle::Native);
    }

    #[test]
    fn stored_settings_are_validated_on_load() {
        let (_dir, db) = open();
        db.save_settings(&Settings {
            sample_interval_ms: 1,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(db.load_settings().unwrap().unwrap().sample_interval_ms, 100);
    }

    #[test]
    fn resolving_an_alert_updates_the_same_row() {
        let (_dir, db) = open();
        let mut alert = entry(0, None);
        db.record(&alert).unwrap();

        alert.outcome = Some(AlertOutcome::Continued);
        alert.resolved_at = Some(Local::now());
        db.record(&alert).unwrap();

        let alerts = db.recent_alerts(10).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, alert.id);
        assert_eq!(alerts[0].cpu, Reading::Unavailable);
        assert_eq!(alerts[0].mem, Reading::Value(50.0));
        assert_eq!(alerts[0].outcome, Some(AlertOutcome::Continued));
        assert!(alerts[0].resolved_at.is_some());
    }

    #[test]
    fn recent_alerts_are_newest_first_and_limited() {
        let (_dir, db) = open();
        for days in [3, 1, 2] {
            db.record_alert(&entry(days, Some(days as f64))).unwrap();
        }

        let alerts = db.recent_alerts(2).unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].cpu, Reading::Value(1.0));
        assert_eq!(alerts[1].cpu, Reading::Value(2.0));
    }

    #[test]
    fn cleanup_respects_retention() {
        let (_dir, db) = open();
        db.record_alert(&entry(40, Some(95.0))).unwrap();
        db.record_alert(&entry(1, Some(96.0))).unwrap();

        assert_eq!(db.cleanup_history(0).unwrap(), 0);
        assert_eq!(db.cleanup_history(30).unwrap(), 1);

        let alerts = db.recent_alerts(10).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].cpu, Reading::Value(96.0));
    }
}
