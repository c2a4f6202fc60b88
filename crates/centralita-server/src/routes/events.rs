use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /api/calls/:id/events — SSE stream of one call's lifecycle events.
///
/// Subscribing joins the call's topic from this point on: no replay of
/// earlier events, and a lagged receiver silently skips ahead. Client
/// disconnect drops the stream, which releases the topic.
pub async fn call_events(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> impl axum::response::IntoResponse {
    let stream = app.broadcaster.subscribe(&id).into_stream().filter_map(|msg| {
        let event = msg.ok()?;
        let sse = Event::default().event("event").json_data(&event).ok()?;
        Some(Ok::<Event, Infallible>(sse))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
