use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::UnboundedReceiverStream};
use tracing::debug;

use crate::models::{PopupKind, PopupMessage, Trigger};
use crate::state::AppState;

// Starts one analysis and streams its popups as server-sent events, in order.
// The stream ends after the final response or error popup.
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(trigger): Json<Trigger>,
) -> Response {
    let Some((request, tab_id)) = trigger.into_request() else {
        debug!("trigger ignored");
        return StatusCode::NO_CONTENT.into_response();
    };

    let (popup_tx, popup_rx) = mpsc::unbounded_channel::<PopupMessage>();
    tokio::spawn(async move {
        let outcome = state.analyzer.run(&request, tab_id, &popup_tx).await;
        debug!(ok = outcome.is_ok(), "popups delivered");
    });

    let events = UnboundedReceiverStream::new(popup_rx).map(|message| {
        let name = match message.kind {
            PopupKind::Loading => "loading",
            PopupKind::Response => "response",
            PopupKind::Error => "error",
        };
        Event::default().event(name).json_data(&message)
    });
    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}
