use bakery_core::cli::{self, AccountCommands, Cli, Commands, DbCommands};
use bakery_core::config::Config;
use bakery_core::{create_app, db, AppState};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(&config);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Account(AccountCommands::Credit { user_id, amount }) => {
            let pool = db::create_pool(&config).await?;
            cli::handle_account_credit(&pool, user_id, &amount).await
        }
        Commands::Config => cli::handle_config_validate(&config),
    }
}

fn init_tracing(config: &Config) {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool, Path::new(db::MIGRATIONS_DIR)).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!(
        cart_line_policy = ?config.cart_line_policy,
        lock_timeout_ms = config.checkout_lock_timeout_ms,
        "Starting bakery-core"
    );

    let app = create_app(AppState::new(pool, config));

    tracing::info!("listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
