use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use diagen_relay::RelayInput;
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    error::{ApiError, ApiResult},
    models::ChatStreamRequest,
    state::AppState,
};

/// Send a chat message and stream the reply using Server-Sent Events
///
/// Events: `connected`, then `content` deltas, then one of `done` or `error`.
/// Diagram markup is never part of the streamed text.
#[utoipa::path(
    post,
    path = "/chat/stream",
    request_body = ChatStreamRequest,
    responses(
        (status = 200, description = "Streaming response", content_type = "text/event-stream"),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Document not found")
    ),
    tag = "chat"
)]
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatStreamRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    if let Some(document_id) = &req.document_id {
        state.documents.get_document(document_id).await?;
    }

    let mut input = RelayInput::new(req.message, req.user_id);
    if let Some(session_id) = req.session_id {
        input = input.with_session(session_id);
    }
    if let Some(document_id) = req.document_id {
        input = input.with_document(document_id);
    }
    if let Some(markup) = req.artifact_context {
        input = input.with_artifact_context(markup);
    }

    // Dropping the response body drops the receiver, which cancels the run
    let events = ReceiverStream::new(state.relay.spawn_run(input));
    let sse_stream = events.map(|event| {
        Ok::<Event, Infallible>(
            Event::default()
                .event(event.name())
                .data(event.payload().to_string()),
        )
    });

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}
