//! One-shot database setup: create the database, run migrations, and optionally
//! seed sample products and create the admin account.

use anyhow::{bail, Context};
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::{sync::Arc, time::Duration};

use duka_api::{
    auth::{AuthConfig, AuthError, AuthService},
    config, db,
    db::DbPool,
    entities::product,
};

#[derive(Debug, Parser)]
#[command(name = "setup-database", about = "Create, migrate and seed the shop database")]
struct Cli {
    /// Insert sample products
    #[arg(long)]
    seed: bool,

    /// Skip CREATE DATABASE, e.g. when DATABASE_URL points at a managed instance
    #[arg(long)]
    skip_create: bool,

    #[arg(long)]
    admin_username: Option<String>,

    #[arg(long)]
    admin_email: Option<String>,

    #[arg(long)]
    admin_password: Option<String>,
}

/// name, category, price, cost price, stock, minimum stock
const SAMPLE_PRODUCTS: &[(&str, &str, Decimal, Decimal, Decimal, Decimal)] = &[
    ("Unga wa Ugali 2kg", "Flour", dec!(190), dec!(165), dec!(40), dec!(10)),
    ("Sugar 1kg", "Sugar", dec!(160), dec!(140), dec!(35), dec!(10)),
    ("Milk 500ml", "Dairy", dec!(60), dec!(50), dec!(48), dec!(12)),
    ("Cooking Oil 1L", "Oils", dec!(320), dec!(285), dec!(20), dec!(5)),
    ("Rice 1kg", "Grains", dec!(180), dec!(150), dec!(30), dec!(8)),
    ("Sukuma Wiki (bunch)", "Vegetables", dec!(20), dec!(12), dec!(60), dec!(15)),
    ("Tomatoes (kg)", "Vegetables", dec!(120), dec!(90), dec!(12.5), dec!(5)),
    ("Bread 400g", "Bakery", dec!(65), dec!(55), dec!(25), dec!(6)),
    ("Eggs (tray)", "Dairy", dec!(450), dec!(400), dec!(8), dec!(3)),
    ("Tea Leaves 250g", "Beverages", dec!(140), dec!(115), dec!(18), dec!(5)),
];

async fn seed_products(db: &DbPool) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for &(name, category, price, cost, stock, min_stock) in SAMPLE_PRODUCTS {
        let existing = product::Entity::find()
            .filter(product::Column::Name.eq(name))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }
        product::ActiveModel {
            name: Set(name.to_string()),
            category: Set(Some(category.to_string())),
            price: Set(price),
            cost_price: Set(Some(cost)),
            stock_quantity: Set(stock),
            min_stock: Set(min_stock),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .with_context(|| format!("failed to insert {}", name))?;
        inserted += 1;
    }
    Ok(inserted)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    if !cli.skip_create {
        db::create_database_if_missing(&cfg.database)
            .await
            .context("failed to create database")?;
    }

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    println!("Migrations applied");

    if cli.seed {
        let inserted = seed_products(&pool).await?;
        println!("Seeded {} sample products", inserted);
    }

    let pool = Arc::new(pool);
    if let Some(username) = cli.admin_username {
        let (Some(email), Some(password)) = (cli.admin_email, cli.admin_password) else {
            bail!("--admin-email and --admin-password are required with --admin-username");
        };
        let auth = AuthService::new(
            AuthConfig::new(
                cfg.jwt_secret.clone(),
                Duration::from_secs(cfg.jwt_expiration_secs),
            ),
            pool.clone(),
        );
        match auth.create_admin(&username, &email, &password).await {
            Ok(user) => println!("Created admin user {} (id {})", user.username, user.id),
            Err(AuthError::UserExists(name)) => println!("Admin user {} already exists", name),
            Err(e) => return Err(e).context("failed to create admin user"),
        }
    }

    if let Ok(pool) = Arc::try_unwrap(pool) {
        db::close_pool(pool).await?;
    }
    Ok(())
}
