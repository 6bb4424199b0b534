//! Database backup tool wrapping `pg_dump`.

use anyhow::Context;
use clap::{Parser, Subcommand};

use duka_api::{backup::BackupService, config, formatting::dates::format_date_time};

#[derive(Debug, Parser)]
#[command(name = "backup", about = "Create, list and prune database backups")]
struct Cli {
    /// Backup directory, overriding the configured one
    #[arg(long, global = true)]
    dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Take one backup now
    Run,
    /// List existing backups, newest first
    List,
    /// Remove backups older than the retention period
    Cleanup,
    /// Run backup and cleanup daily at the configured hour (Nairobi time)
    Schedule,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    if let Some(dir) = cli.dir {
        cfg.backup.directory = dir;
    }
    let service = BackupService::new(cfg.backup.clone(), cfg.database.clone());

    match cli.command {
        Command::Run => {
            let file = service.create_backup().await.context("backup failed")?;
            println!(
                "Backup written to {} ({} bytes)",
                file.path.display(),
                file.size_bytes
            );
        }
        Command::List => {
            let backups = service.list_backups().await?;
            if backups.is_empty() {
                println!("No backups in {}", service.directory().display());
            }
            for file in backups {
                println!(
                    "{}\t{}\t{} bytes",
                    file.file_name,
                    format_date_time(&file.modified.to_rfc3339()),
                    file.size_bytes
                );
            }
        }
        Command::Cleanup => {
            let removed = service.cleanup_old_backups().await?;
            println!(
                "Removed {} backup(s) older than {} days",
                removed, cfg.backup.retention_days
            );
        }
        Command::Schedule => {
            println!(
                "Backing up daily at {:02}:00 Africa/Nairobi into {}",
                cfg.backup.hour,
                service.directory().display()
            );
            service.run_scheduler().await;
        }
    }
    Ok(())
}
