//! Server-sent events stream of activity log entries.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{self, Stream, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::info;

use crate::AppState;
use crate::middleware::Principal;
use crate::services::RealtimeEvent;

/// Creates the realtime routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/realtime/activity-logs", get(activity_log_stream))
}

fn to_sse_event(event: &RealtimeEvent) -> Event {
    Event::default()
        .event(event.event.clone())
        .data(event.data.to_string())
}

/// Items yielded after the initial connected event: the live feed, with
/// lag surfaced as a warning rather than silently dropped entries.
async fn next_event(
    mut rx: Receiver<RealtimeEvent>,
) -> Option<(Result<Event, Infallible>, Receiver<RealtimeEvent>)> {
    match rx.recv().await {
        Ok(event) => Some((Ok(to_sse_event(&event)), rx)),
        Err(RecvError::Lagged(missed)) => {
            let warning = Event::default()
                .event("warning")
                .data(json!({ "missed_events": missed }).to_string());
            Some((Ok(warning), rx))
        }
        Err(RecvError::Closed) => None,
    }
}

/// GET /realtime/activity-logs - SSE stream of audit entries as they
/// are recorded.
///
/// Authenticated like any other protected route. Opens with a
/// "connected" event so clients can distinguish an established stream
/// from a hung request.
async fn activity_log_stream(
    State(state): State<AppState>,
    principal: Principal,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(user_id = %principal.user_id, "Realtime subscriber connected");

    let connected = Event::default()
        .event("connected")
        .data(json!({ "user_id": principal.user_id }).to_string());
    let live = stream::unfold(state.events.subscribe(), next_event);
    let events = stream::iter([Ok(connected)]).chain(live);

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(state.realtime.heartbeat_secs))
            .text("heartbeat"),
    )
}
