use clap::{Parser, Subcommand};
use sqlx::types::BigDecimal;
use sqlx::PgPool;
use std::path::Path;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{self, accounts};

#[derive(Parser)]
#[command(name = "bakery-core")]
#[command(about = "Bakery storefront backend: catalog, cart and checkout", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Account funding commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Print the effective configuration with secrets masked
    Config,
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Add funds to a user's balance
    Credit {
        /// User UUID
        #[arg(value_name = "USER_ID")]
        user_id: Uuid,

        /// Amount to add, e.g. 150.00
        #[arg(value_name = "AMOUNT")]
        amount: BigDecimal,
    },
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = db::create_pool(config).await?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&pool, Path::new(db::MIGRATIONS_DIR)).await?;

    println!("✓ Database migrations completed");
    Ok(())
}

pub async fn handle_account_credit(pool: &PgPool, user_id: Uuid, amount: &BigDecimal) -> anyhow::Result<()> {
    if amount <= &BigDecimal::from(0) {
        anyhow::bail!("Amount must be greater than zero");
    }

    let mut conn = pool.acquire().await?;
    match accounts::credit(&mut conn, user_id, amount).await? {
        Some(balance) => {
            tracing::info!(user_id = %user_id, amount = %amount, "Account credited");
            println!("✓ Credited {} to {}; new balance {}", amount, user_id, balance);
            Ok(())
        }
        None => {
            tracing::warn!("User {} not found", user_id);
            anyhow::bail!("User {} not found", user_id)
        }
    }
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Database URL: {}", mask_password(&config.database_url));
    println!("  Max DB Connections: {}", config.database_max_connections);
    println!("  JWT Secret: ****");
    println!("  JWT TTL: {}s", config.jwt_ttl_secs);
    println!("  Checkout Lock Timeout: {}ms", config.checkout_lock_timeout_ms);
    println!("  Cart Line Policy: {:?}", config.cart_line_policy);
    println!("  CORS Origins: {:?}", config.cors_allowed_origins);

    if config.jwt_secret.len() < 16 {
        tracing::warn!("JWT_SECRET is shorter than 16 characters");
    }

    println!("✓ Configuration is valid");
    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
