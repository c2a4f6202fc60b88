pub mod error;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/transcribe", post(routes::transcribe::transcribe_audio))
        .route("/api/triage", post(routes::triage::triage_call))
        .route("/api/calls", get(routes::calls::list_calls))
        .route("/api/calls/{id}", get(routes::calls::get_call))
        .route("/api/calls/{id}/events", get(routes::events::call_events))
        .route("/api/calendar", get(routes::agenda::list_calendar))
        .route("/api/reminders", get(routes::agenda::list_reminders))
        // Voicemail uploads run well past axum's 2 MB default.
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the triage backend on `bind:port`.
pub async fn serve(state: AppState, bind: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("centralita listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
