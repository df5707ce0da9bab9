//! News Dashboard — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the row store client, session holder
//! and metrics exporter.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_sentiment_dashboard::api::{self, AppState};
use news_sentiment_dashboard::config;
use news_sentiment_dashboard::metrics::Metrics;
use news_sentiment_dashboard::session::{GotrueAuth, SessionHolder};
use news_sentiment_dashboard::store::postgrest::PostgrestStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load()?;
    let metrics = Metrics::init();

    let store = Arc::new(PostgrestStore::new(&cfg.supabase_url, &cfg.supabase_anon_key));
    let auth = Arc::new(GotrueAuth::new(&cfg.supabase_url, &cfg.supabase_anon_key));

    let sessions = Arc::new(SessionHolder::new());
    let session_log = sessions.subscribe(|s| {
        tracing::info!(signed_in = s.is_some(), "session changed");
    });

    let state = AppState {
        store,
        sessions: sessions.clone(),
        auth,
    };
    let app = api::create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "dashboard API listening");
    axum::serve(listener, app).await?;

    sessions.unsubscribe(session_log);
    Ok(())
}
