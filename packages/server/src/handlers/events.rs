use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use tracing::instrument;

use crate::events::{ClientInfo, ServerEvent};
use crate::extractors::auth::MaybeAuthUser;
use crate::state::AppState;

fn to_sse(event: ServerEvent) -> Event {
    Event::default().event(event.name).data(event.data.to_string())
}

#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    operation_id = "subscribeEvents",
    summary = "Server-Sent Events stream",
    description = "Emits `connected` with the client id, then `challenge-updated`, `challenge-participant-joined` and `finalization-updated`. Keep-alive comments are sent periodically. Events are not replayed.",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream"),
    ),
)]
#[instrument(skip(state, auth))]
pub async fn subscribe(
    State(state): State<AppState>,
    MaybeAuthUser(auth): MaybeAuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let info = ClientInfo {
        user_id: auth.as_ref().map(|a| a.user_id),
        role: auth.as_ref().map(|a| a.role),
    };
    let (client_id, events) = state.events.subscribe(info);
    tracing::debug!(%client_id, "SSE client connected");

    let stream = events.map(|event| Ok(to_sse(event)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(state.config.events.keep_alive_secs))
            .text("keep-alive"),
    )
}

