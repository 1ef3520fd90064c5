/// Dashboard WebSocket endpoint
///
/// One task per viewer. The task registers a `ChannelTransport` with the
/// dashboard, then multiplexes three sources until either side hangs up:
/// frames queued by broadcasts, a server-side close, and client messages.
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::arguments::is_debug_webserver_enabled;
use crate::dashboard::message::{
    parse_topics, ClientMessage, ServerMessage, ERROR_INVALID_MESSAGE, ERROR_UNKNOWN_TOPIC,
};
use crate::dashboard::transport::Transport;
use crate::dashboard::{ChannelTransport, ConnectionId, DashboardService};
use crate::logger::{self, LogTag};
use crate::webserver::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_upgrade))
}

/// GET /ws
async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let dashboard = Arc::clone(&state.dashboard);
    let (transport, mut outbound) = ChannelTransport::new(state.client_buffer_size);
    let id = dashboard.connect(transport.clone()).await;

    let (mut ws_tx, mut ws_rx) = socket.split();

    'conn: loop {
        tokio::select! {
            biased;

            Some(frame) = outbound.recv() => {
                if let Err(e) = send_frame(&mut ws_tx, &frame).await {
                    logger::debug(
                        LogTag::Webserver,
                        &format!("Viewer {}: send failed: {}", id, e),
                    );
                    break;
                }
            }

            _ = transport.closed() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        for reply in handle_client_text(&dashboard, id, &text) {
                            if send_frame(&mut ws_tx, &reply).await.is_err() {
                                break 'conn;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        dashboard.heartbeat(id);
                    }
                    Some(Ok(Message::Binary(_))) => {
                        let reply = ServerMessage::error(
                            ERROR_INVALID_MESSAGE,
                            "binary frames are not supported",
                        );
                        if send_frame(&mut ws_tx, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        if is_debug_webserver_enabled() {
                            logger::debug(
                                LogTag::Webserver,
                                &format!("Viewer {}: client closed", id),
                            );
                        }
                        break;
                    }
                    Some(Err(e)) => {
                        logger::debug(
                            LogTag::Webserver,
                            &format!("Viewer {}: websocket error: {}", id, e),
                        );
                        break;
                    }
                }
            }
        }
    }

    transport.close().await;
    dashboard.disconnect(id);
}

async fn send_frame(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    frame: &ServerMessage,
) -> Result<(), axum::Error> {
    match frame.to_json() {
        Ok(json) => ws_tx.send(Message::Text(json)).await,
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!("Failed to serialize frame: {}", e),
            );
            Ok(())
        }
    }
}

/// Apply one client text message and return the replies to send back.
///
/// Any inbound message counts as liveness, including malformed ones.
pub(crate) fn handle_client_text(
    dashboard: &DashboardService,
    id: ConnectionId,
    text: &str,
) -> Vec<ServerMessage> {
    dashboard.heartbeat(id);

    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            return vec![ServerMessage::error(
                ERROR_INVALID_MESSAGE,
                format!("invalid client message: {}", e),
            )]
        }
    };

    match message {
        ClientMessage::Heartbeat => Vec::new(),
        ClientMessage::Subscribe { topics } => {
            let (known, unknown) = parse_topics(&topics);
            dashboard.subscribe(id, &known);
            let mut replies = vec![ServerMessage::Subscribed {
                topics: known.iter().map(|t| t.code().to_string()).collect(),
            }];
            if !unknown.is_empty() {
                replies.push(unknown_topics(&unknown));
            }
            replies
        }
        ClientMessage::Unsubscribe { topics } => {
            let (known, unknown) = parse_topics(&topics);
            dashboard.unsubscribe(id, &known);
            let mut replies = vec![ServerMessage::Unsubscribed {
                topics: known.iter().map(|t| t.code().to_string()).collect(),
            }];
            if !unknown.is_empty() {
                replies.push(unknown_topics(&unknown));
            }
            replies
        }
    }
}

fn unknown_topics(names: &[String]) -> ServerMessage {
    ServerMessage::error(
        ERROR_UNKNOWN_TOPIC,
        format!("unknown topic(s): {}", names.join(", ")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::message::Update;
    use crate::dashboard::payloads::HealthReport;
    use crate::dashboard::testing::RecordingTransport;
    use crate::dashboard::UpdateKind;
    use crate::webserver::routes::test_support;

    fn code_of(message: &ServerMessage) -> Option<&str> {
        match message {
            ServerMessage::Error { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_subscribe_acks_known_and_rejects_unknown() {
        let (state, _provider) = test_support::state();
        let transport = RecordingTransport::new();
        let id = state.dashboard.connect(transport.clone()).await;

        let replies = handle_client_text(
            &state.dashboard,
            id,
            r#"{"type":"subscribe","topics":["metrics","bogus"]}"#,
        );

        assert_eq!(replies.len(), 2);
        assert_eq!(
            replies[0],
            ServerMessage::Subscribed {
                topics: vec!["metrics".to_string()]
            }
        );
        assert_eq!(code_of(&replies[1]), Some(ERROR_UNKNOWN_TOPIC));
        let counts = state.dashboard.stats().topic_subscribers;
        assert_eq!(counts["metrics"], 1);
        assert!(!counts.contains_key("bogus"));
    }

    #[tokio::test]
    async fn test_switch_from_overview_to_health() {
        let (state, _provider) = test_support::state();
        let transport = RecordingTransport::new();
        let id = state.dashboard.connect(transport.clone()).await;

        handle_client_text(
            &state.dashboard,
            id,
            r#"{"type":"unsubscribe","topics":["overview"]}"#,
        );
        handle_client_text(
            &state.dashboard,
            id,
            r#"{"type":"subscribe","topics":["health"]}"#,
        );

        state.dashboard.refresh_now().await;
        state
            .dashboard
            .broadcast(&Update::health("refresh", HealthReport::healthy()));

        // initial metrics+health, then only the health broadcast
        assert_eq!(
            transport.kinds(),
            vec![UpdateKind::Metrics, UpdateKind::Health, UpdateKind::Health]
        );
    }

    #[tokio::test]
    async fn test_malformed_message_reports_invalid() {
        let (state, _provider) = test_support::state();
        let id = state.dashboard.connect(RecordingTransport::new()).await;

        let replies = handle_client_text(&state.dashboard, id, "{not json");
        assert_eq!(replies.len(), 1);
        assert_eq!(code_of(&replies[0]), Some(ERROR_INVALID_MESSAGE));

        let replies = handle_client_text(&state.dashboard, id, r#"{"type":"launch"}"#);
        assert_eq!(code_of(&replies[0]), Some(ERROR_INVALID_MESSAGE));

        // the connection is still there
        assert_eq!(state.dashboard.stats().total_connections, 1);
    }

    #[tokio::test]
    async fn test_heartbeat_has_no_reply() {
        let (state, _provider) = test_support::state();
        let id = state.dashboard.connect(RecordingTransport::new()).await;

        assert!(handle_client_text(&state.dashboard, id, r#"{"type":"heartbeat"}"#).is_empty());
    }
}
