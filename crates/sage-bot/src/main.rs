use std::sync::Arc;

use tracing::info;

use sage_discord::state::RuntimeState;
use sage_discord::{BotContext, DiscordAdapter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sage_bot=info,sage_agent=info,sage_discord=info".into()),
        )
        .init();

    // load config: explicit SAGE_CONFIG path > ./sage.toml
    let config_path = std::env::var("SAGE_CONFIG").ok();
    let config = sage_core::SageConfig::load(config_path.as_deref())?;

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let conn = rusqlite::Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    sage_users::db::init_db(&conn)?;
    info!("database migrations complete");

    let provider = sage_agent::OllamaProvider::new(Some(config.ollama.base_url.clone()));
    let backend_endpoint = provider.base_url().to_string();

    let app = Arc::new(BotContext {
        provider: Box::new(provider),
        store: sage_sessions::SessionStore::new(config.agent.model.clone()),
        users: sage_users::UserStore::new(conn),
        runtime: RuntimeState::new(),
        backend_endpoint,
    });

    info!(model = %config.agent.model, "starting Discord adapter");
    DiscordAdapter::new(&config.discord, app).run().await?;

    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
