//! Hafalan Quiz backend entrypoint wiring REST, SSE, the data directory and the question source.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hafalan_quiz_back::{
    config::AppConfig,
    dao::slot_store::{FileSlotStore, MemorySlotStore, SlotStore, file::FileStoreConfig},
    routes,
    services::{question_source::QuestionSource, storage_supervisor},
    state::{AppState, SharedState, clock::SystemClock},
};

fn main() -> anyhow::Result<()> {
    init_tracing();
    // The local offset can only be read while the process is single-threaded.
    let clock = SystemClock::detect();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?
        .block_on(serve(clock))
}

async fn serve(clock: SystemClock) -> anyhow::Result<()> {
    let config = AppConfig::load();

    let (store, _watcher): (Arc<dyn SlotStore>, _) = if config.ephemeral() {
        info!("ephemeral mode; scores are kept in memory only");
        (Arc::new(MemorySlotStore::new()), None)
    } else {
        let store = FileSlotStore::open(
            FileStoreConfig::new(config.data_dir().clone())
                .with_poll_interval(config.poll_interval()),
        )
        .await
        .context("opening data directory")?;
        let watcher = store.spawn_watcher();
        (Arc::new(store), Some(watcher))
    };

    let questions = question_source(&config);
    let app_state = AppState::new(config, store, Arc::new(clock), questions).await;
    app_state.install_store_subscription();

    tokio::spawn(storage_supervisor::run(app_state.clone()));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the Gemini-backed question source, or a disabled one when it cannot be set up.
#[cfg(feature = "gemini-source")]
fn question_source(config: &AppConfig) -> Arc<dyn QuestionSource> {
    use hafalan_quiz_back::services::question_source::{GeminiConfig, GeminiQuestionSource};

    let gemini = GeminiConfig::new(config.gemini_base_url(), config.gemini_model())
        .with_env_api_key()
        .with_retry(config.retry_attempts(), config.retry_delay());
    if gemini.api_key.is_none() {
        warn!("no API key in the environment; rounds will ask for one");
    }
    match GeminiQuestionSource::new(gemini) {
        Ok(source) => Arc::new(source),
        Err(err) => {
            warn!(error = %err, "failed to build the Gemini client; question source disabled");
            Arc::new(hafalan_quiz_back::services::question_source::DisabledQuestionSource)
        }
    }
}

#[cfg(not(feature = "gemini-source"))]
fn question_source(_config: &AppConfig) -> Arc<dyn QuestionSource> {
    warn!("built without a question source; rounds cannot load questions");
    Arc::new(hafalan_quiz_back::services::question_source::DisabledQuestionSource)
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
