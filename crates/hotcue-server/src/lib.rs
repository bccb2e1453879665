pub mod decoder;
pub mod error;
pub mod listener;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use hotcue_core::{Shutdown, MAX_CONFIG_PAYLOAD_BYTES};
use tower_http::trace::TraceLayer;

pub use listener::{bind_events, serve_events, ListenerError};
pub use state::AppState;

/// Build the config-intake router. Used by `serve_config_on` and by the
/// integration tests.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/app-state",
            get(routes::app_state::get_app_state).post(routes::app_state::push_app_state),
        )
        .route("/health", get(routes::health::health))
        .layer(DefaultBodyLimit::max(MAX_CONFIG_PAYLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the config endpoint on a pre-bound listener until `shutdown` fires.
///
/// Taking a bound listener lets the caller read the actual port first, which
/// matters when binding port 0.
pub async fn serve_config_on(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: Shutdown,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let app = build_router(state);

    tracing::info!("config endpoint listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
