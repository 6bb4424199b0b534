//! Creates the application database if it does not exist yet.
//!
//! Connects to the `postgres` maintenance database with the `DB_*` settings and
//! exits non-zero when the server cannot be reached.

use anyhow::Context;
use clap::Parser;

use duka_api::{config, db};

#[derive(Debug, Parser)]
#[command(name = "create-database", about = "Create the shop database if missing")]
struct Cli {
    /// Database name, overriding DB_NAME
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    if let Some(name) = cli.name {
        cfg.database.name = name;
    }

    let created = db::create_database_if_missing(&cfg.database)
        .await
        .with_context(|| {
            format!(
                "could not reach Postgres at {}:{}",
                cfg.database.host, cfg.database.port
            )
        })?;

    if created {
        println!("Created database {}", cfg.database.name);
    } else {
        println!("Database {} already exists", cfg.database.name);
    }
    Ok(())
}
