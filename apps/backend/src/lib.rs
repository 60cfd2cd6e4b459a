pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vocab_core::{ReviewSettings, Sm2, SpacedRepetitionAlgorithm};

use crate::config::Config;
use crate::db::{MemoryStore, ReviewSink};
use crate::services::review::ReviewService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub review: Arc<ReviewService>,
}

impl AppState {
    /// State backed entirely by `store`.
    pub fn new(store: Arc<MemoryStore>, settings: ReviewSettings) -> Self {
        let sink: Arc<dyn ReviewSink> = store.clone();
        Self::with_sink(store, sink, settings)
    }

    /// State that reads due items from `store` but sends reviews to `sink`.
    pub fn with_sink(
        store: Arc<MemoryStore>,
        sink: Arc<dyn ReviewSink>,
        settings: ReviewSettings,
    ) -> Self {
        Self::build(store, sink, settings, Arc::new(Sm2::default()))
    }

    /// State backed by `store` that schedules with `algorithm`.
    pub fn with_algorithm(
        store: Arc<MemoryStore>,
        settings: ReviewSettings,
        algorithm: Arc<dyn SpacedRepetitionAlgorithm>,
    ) -> Self {
        let sink: Arc<dyn ReviewSink> = store.clone();
        Self::build(store, sink, settings, algorithm)
    }

    fn build(
        store: Arc<MemoryStore>,
        sink: Arc<dyn ReviewSink>,
        settings: ReviewSettings,
        algorithm: Arc<dyn SpacedRepetitionAlgorithm>,
    ) -> Self {
        let review = ReviewService::new(store.clone(), sink, settings).with_algorithm(algorithm);
        Self {
            store,
            review: Arc::new(review),
        }
    }
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Word routes
        .route("/api/words", get(routes::words::list))
        .route("/api/words/:word_id", put(routes::words::upsert))
        .route("/api/words/:word_id/insight", get(routes::words::insight))
        // Review routes
        .route("/api/review/ratings", get(routes::review::ratings))
        .route("/api/review/due", get(routes::review::due))
        .route("/api/review/sessions", post(routes::review::start))
        .route(
            "/api/review/sessions/:id",
            get(routes::review::show).delete(routes::review::dismiss),
        )
        .route("/api/review/sessions/:id/flip", post(routes::review::flip))
        .route("/api/review/sessions/:id/select", post(routes::review::select))
        .route("/api/review/sessions/:id/rate", post(routes::review::rate))
        .route("/api/review/sessions/:id/restart", post(routes::review::restart))
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        batch_cap = config.review.batch_cap,
        algorithm = %config.algorithm,
        "Initializing word store..."
    );
    let state = AppState::with_algorithm(
        Arc::new(MemoryStore::new()),
        config.review,
        config.scheduler()?,
    );

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
