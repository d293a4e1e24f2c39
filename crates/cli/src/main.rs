use std::sync::Arc;

use {
    clap::Parser,
    secrecy::Secret,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    crossfeed_store::{Store, store_sqlite::SqliteStore},
    crossfeed_telegram::BotConfig,
};

#[derive(Parser)]
#[command(name = "crossfeed", about = "Crossfeed — Telegram channel federation bot")]
struct Cli {
    /// Bot token from @BotFather.
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    token: String,

    /// SQLite database URL.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://crossfeed.db?mode=rwc")]
    database_url: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Album debounce window in milliseconds.
    #[arg(long)]
    album_window_ms: Option<u64>,

    /// Per-target delivery timeout in milliseconds.
    #[arg(long)]
    deliver_timeout_ms: Option<u64>,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "crossfeed starting");

    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(&cli.database_url).await?);
    info!(database_url = %cli.database_url, "store ready");

    let mut config = BotConfig {
        token: Secret::new(cli.token),
        ..Default::default()
    };
    if let Some(ms) = cli.album_window_ms {
        config.album_window_ms = ms;
    }
    if let Some(ms) = cli.deliver_timeout_ms {
        config.deliver_timeout_ms = ms;
    }

    let cancel = crossfeed_telegram::bot::start_polling(config, store).await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            cancel.cancel();
        },
        () = cancel.cancelled() => {
            // Polling loop bailed out on its own (e.g. token conflict).
        },
    }

    Ok(())
}
