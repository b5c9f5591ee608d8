//! WebSocket upgrade and per-connection loop.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use sessionhub_auth::AuthContext;
use sessionhub_core::error::AppError;
use sessionhub_core::result::AppResult;
use sessionhub_core::traits::Clock;
use sessionhub_core::types::id::ConnectionId;
use sessionhub_realtime::{ClientMessage, ServerEvent};

use crate::dto::request::WsQuery;
use crate::error::ApiResult;
use crate::state::AppState;

type WsSink = SplitSink<WebSocket, Message>;
type WsStream = SplitStream<WebSocket>;

/// GET /ws?token={jwt}
///
/// With `token` the connection is authenticated before the upgrade and a
/// bad token is answered with a plain HTTP error. Without it the client
/// must send an `authenticate` frame within the handshake timeout.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let preauth = match query.token.as_deref() {
        Some(token) => Some(state.realtime.authenticator.authenticate(token).await?),
        None => None,
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(state, preauth, socket)))
}

async fn handle_socket(state: AppState, preauth: Option<AuthContext>, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();

    let ctx = match preauth {
        Some(ctx) => ctx,
        None => match first_frame_auth(&state, &mut stream).await {
            Ok(ctx) => ctx,
            Err(err) => {
                debug!(error = %err, "WebSocket handshake rejected");
                let _ = send_event(&mut sink, &ServerEvent::error(err.code(), err.message)).await;
                let _ = sink.close().await;
                return;
            }
        },
    };

    let (handle, mut outbound) =
        state
            .realtime
            .registry
            .register(ctx.user_id, ctx.session_id, state.clock.now());
    let conn_id = handle.id;

    let greeting = ServerEvent::Authenticated {
        user_id: ctx.user_id,
        session_id: ctx.session_id,
    };
    if send_event(&mut sink, &greeting).await.is_ok() {
        loop {
            tokio::select! {
                _ = handle.closed() => break,
                event = outbound.recv() => match event {
                    Some(event) => {
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => on_client_text(conn_id, text.as_str()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                        break;
                    }
                },
            }
        }
    }

    state.realtime.registry.unregister(ctx.user_id, conn_id);
    let _ = sink.close().await;

    info!(
        conn_id = %conn_id,
        user_id = %ctx.user_id,
        "WebSocket connection closed"
    );
}

/// Waits for an `authenticate` frame, bounded by the handshake timeout.
async fn first_frame_auth(state: &AppState, stream: &mut WsStream) -> AppResult<AuthContext> {
    let deadline = state.realtime.handshake_timeout;

    let token = tokio::time::timeout(deadline, async {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    return match serde_json::from_str::<ClientMessage>(text.as_str()) {
                        Ok(ClientMessage::Authenticate { token }) => Ok(token),
                        _ => Err(AppError::no_token("First message must authenticate")),
                    };
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
        Err(AppError::no_token("Connection closed before authenticating"))
    })
    .await
    .map_err(|_| AppError::no_token("Authentication timed out"))??;

    state.realtime.authenticator.authenticate(&token).await
}

fn on_client_text(conn_id: ConnectionId, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Pong) => {}
        Ok(ClientMessage::Authenticate { .. }) => {
            debug!(conn_id = %conn_id, "Ignoring repeated authenticate frame");
        }
        Err(e) => debug!(conn_id = %conn_id, error = %e, "Unrecognized client frame"),
    }
}

async fn send_event(sink: &mut WsSink, event: &ServerEvent) -> Result<(), axum::Error> {
    let json = match event.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!(kind = event.kind(), error = %e, "Failed to serialize event");
            return Ok(());
        }
    };
    sink.send(Message::Text(json.into())).await
}
