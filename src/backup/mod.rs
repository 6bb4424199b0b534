//! Postgres backups via `pg_dump`, plus retention cleanup and a daily scheduler.

use crate::config::{BackupConfig, DatabaseConfig};
use crate::formatting::dates::now_nairobi;
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

const BACKUP_PREFIX: &str = "backup-";
const BACKUP_EXTENSION: &str = "sql";
const SCHEDULER_TICK: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("pg_dump exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },
}

/// A backup file on disk
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BackupFile {
    pub file_name: String,
    #[schema(value_type = String)]
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BackupService {
    backup: BackupConfig,
    database: DatabaseConfig,
}

impl BackupService {
    pub fn new(backup: BackupConfig, database: DatabaseConfig) -> Self {
        Self { backup, database }
    }

    pub fn directory(&self) -> &Path {
        Path::new(&self.backup.directory)
    }

    /// File name for a backup taken at `at`
    pub fn backup_file_name(at: DateTime<Utc>) -> String {
        format!(
            "{}{}.{}",
            BACKUP_PREFIX,
            at.format("%Y-%m-%dT%H-%M-%S"),
            BACKUP_EXTENSION
        )
    }

    /// The `pg_dump` invocation writing a plain-format dump to `output`
    pub fn dump_command(&self, output: &Path) -> Command {
        let mut cmd = Command::new(&self.backup.pg_dump_path);
        cmd.arg("-h")
            .arg(&self.database.host)
            .arg("-p")
            .arg(self.database.port.to_string())
            .arg("-U")
            .arg(&self.database.user)
            .arg("-d")
            .arg(&self.database.name)
            .arg("-F")
            .arg("p")
            .arg("-f")
            .arg(output)
            .kill_on_drop(true);
        if !self.database.password.is_empty() {
            cmd.env("PGPASSWORD", &self.database.password);
        }
        cmd
    }

    /// Runs `pg_dump` into a new timestamped file
    #[instrument(skip(self))]
    pub async fn create_backup(&self) -> Result<BackupFile, BackupError> {
        tokio::fs::create_dir_all(self.directory()).await?;

        let path = self.directory().join(Self::backup_file_name(Utc::now()));
        info!(path = %path.display(), "Creating database backup");

        let output = self
            .dump_command(&path)
            .output()
            .await
            .map_err(|source| BackupError::Spawn {
                program: self.backup.pg_dump_path.clone(),
                source,
            })?;

        if !output.status.success() {
            // pg_dump may leave a partial file behind
            let _ = tokio::fs::remove_file(&path).await;
            return Err(BackupError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let file = describe(&path).await?;
        info!(file = %file.file_name, size = file.size_bytes, "Backup created");
        Ok(file)
    }

    /// Backups in the directory, newest first
    pub async fn list_backups(&self) -> Result<Vec<BackupFile>, BackupError> {
        let mut backups = Vec::new();
        let mut entries = match tokio::fs::read_dir(self.directory()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(backups),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_backup_file(&path) && entry.file_type().await?.is_file() {
                backups.push(describe(&path).await?);
            }
        }

        backups.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(backups)
    }

    /// Removes backups older than the configured retention
    pub async fn cleanup_old_backups(&self) -> Result<usize, BackupError> {
        let cutoff = Utc::now() - ChronoDuration::days(i64::from(self.backup.retention_days));
        self.remove_backups_older_than(cutoff).await
    }

    pub async fn remove_backups_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, BackupError> {
        let mut removed = 0;
        for backup in self.list_backups().await? {
            if backup.modified < cutoff {
                tokio::fs::remove_file(&backup.path).await?;
                info!(file = %backup.file_name, "Removed old backup");
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Whether the scheduler should back up during `hour` (Nairobi wall clock)
    pub fn should_run_at(&self, hour: u32) -> bool {
        hour == self.backup.hour
    }

    /// Backup followed by cleanup; failures are logged, never returned
    pub async fn run_once(&self) {
        if let Err(e) = self.create_backup().await {
            error!(error = %e, "Scheduled backup failed");
            return;
        }
        match self.cleanup_old_backups().await {
            Ok(removed) => info!(removed, "Backup cleanup finished"),
            Err(e) => warn!(error = %e, "Backup cleanup failed"),
        }
    }

    /// Ticks hourly and backs up when the Nairobi hour matches the configured hour.
    /// Runs until the task is dropped.
    pub async fn run_scheduler(self) {
        info!(
            hour = self.backup.hour,
            retention_days = self.backup.retention_days,
            "Backup scheduler started"
        );
        let mut ticker = tokio::time::interval(SCHEDULER_TICK);
        loop {
            ticker.tick().await;
            if self.should_run_at(now_nairobi().hour()) {
                self.run_once().await;
            }
        }
    }
}

fn is_backup_file(path: &Path) -> bool {
    let named = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(BACKUP_PREFIX));
    let sql = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(BACKUP_EXTENSION));
    named && sql
}

async fn describe(path: &Path) -> Result<BackupFile, BackupError> {
    let metadata = tokio::fs::metadata(path).await?;
    Ok(BackupFile {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        size_bytes: metadata.len(),
        modified: DateTime::<Utc>::from(metadata.modified()?),
    })
}
