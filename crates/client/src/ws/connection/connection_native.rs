//! Native WebSocket transport using tokio-tungstenite.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use notiflow_shared::{ServerFrame, CLOSE_NORMAL};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::{
    authenticated_url, CloseReason, ConnectionEvent, ConnectionId, ConnectionState, EventSink,
    Outbound, Transport, TransportEvent, WsHandle,
};
use crate::error::{Result, SyncError};
use crate::session::Credential;

/// Opens push connections over WebSocket. Each connection runs on its own tokio task.
#[derive(Debug)]
pub struct WsTransport {
    handshake_timeout: Duration,
    next_id: AtomicU64,
}

impl WsTransport {
    pub fn new(handshake_timeout: Duration) -> Self {
        Self {
            handshake_timeout,
            next_id: AtomicU64::new(1),
        }
    }
}

impl Transport for WsTransport {
    fn connect(
        &self,
        endpoint: &Url,
        credential: Option<&Credential>,
        events: EventSink,
    ) -> Result<WsHandle> {
        let credential = credential.ok_or(SyncError::Unauthenticated)?;
        let url = authenticated_url(endpoint, credential);
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let (sender, receiver) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let task = ConnectionTask {
            id,
            state: state_tx,
            events,
        };
        tokio::spawn(task.run(url, self.handshake_timeout, receiver));

        Ok(WsHandle::new(id, sender, state_rx))
    }
}

struct ConnectionTask {
    id: ConnectionId,
    state: watch::Sender<ConnectionState>,
    events: EventSink,
}

impl ConnectionTask {
    fn emit(&self, event: TransportEvent) {
        // The receiver going away just means nobody is listening any more.
        let _ = self.events.send(ConnectionEvent {
            connection: self.id,
            event,
        });
    }

    fn fail(&self, detail: String) {
        let err = SyncError::Transport(detail.clone());
        tracing::warn!(conn = %self.id, error = %err, "push channel failed");
        self.emit(TransportEvent::Error(detail.clone()));
        self.finish(CloseReason::failure(detail));
    }

    fn finish(&self, reason: CloseReason) {
        self.state.send_replace(ConnectionState::Closed(reason.clone()));
        self.emit(TransportEvent::Disconnected(reason));
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<ServerFrame>(text) {
            Ok(ServerFrame::Unknown) => {
                tracing::debug!(conn = %self.id, "ignoring unrecognised push frame");
            }
            Ok(frame) => self.emit(TransportEvent::Message(frame)),
            Err(e) => {
                let err = SyncError::MalformedMessage(e.to_string());
                tracing::warn!(conn = %self.id, error = %err, "discarding push frame");
            }
        }
    }

    async fn run(
        self,
        url: Url,
        handshake_timeout: Duration,
        mut outbound: mpsc::UnboundedReceiver<Outbound>,
    ) {
        self.state.send_replace(ConnectionState::Connecting);
        tracing::debug!(conn = %self.id, host = url.host_str().unwrap_or_default(), "opening push channel");

        // A close or a dropped handle during the handshake abandons it; the
        // connection never reports itself open.
        let handshake = tokio::time::timeout(handshake_timeout, connect_async(url.as_str()));
        tokio::pin!(handshake);
        let stream = loop {
            tokio::select! {
                biased;
                command = outbound.recv() => match command {
                    Some(Outbound::Close { code, reason }) => {
                        tracing::debug!(conn = %self.id, %reason, "push channel closed during handshake");
                        return self.finish(CloseReason::requested(code, reason));
                    }
                    None => {
                        tracing::debug!(conn = %self.id, "handles dropped during handshake");
                        return self.finish(CloseReason::requested(CLOSE_NORMAL, "client went away"));
                    }
                    Some(Outbound::Frame(_)) => {
                        tracing::debug!(conn = %self.id, "dropping frame sent before the channel opened");
                    }
                },
                result = &mut handshake => break match result {
                    Ok(Ok((stream, _response))) => stream,
                    Ok(Err(e)) => return self.fail(e.to_string()),
                    Err(_) => return self.fail(format!("handshake timed out after {handshake_timeout:?}")),
                },
            }
        };

        self.state.send_replace(ConnectionState::Open);
        tracing::info!(conn = %self.id, "push channel open");
        self.emit(TransportEvent::Connected);

        let (mut write, mut read) = stream.split();

        let reason = loop {
            tokio::select! {
                incoming = read.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(conn = %self.id, "push frame received");
                        self.dispatch(text.as_str());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break match frame {
                            Some(frame) => CloseReason::remote(
                                Some(u16::from(frame.code)),
                                frame.reason.as_str(),
                            ),
                            None => CloseReason::remote(None, "closed by server"),
                        };
                    }
                    // Ping/pong is answered by tungstenite; binary frames are not part of the protocol.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(conn = %self.id, error = %e, "push channel read error");
                        self.emit(TransportEvent::Error(e.to_string()));
                        break CloseReason::failure(e.to_string());
                    }
                    None => break CloseReason::failure("stream ended"),
                },
                command = outbound.recv() => match command {
                    Some(Outbound::Frame(frame)) => match serde_json::to_string(&frame) {
                        Ok(json) => {
                            if let Err(e) = write.send(Message::Text(json.into())).await {
                                tracing::warn!(conn = %self.id, error = %e, "push channel write error");
                                self.emit(TransportEvent::Error(e.to_string()));
                                break CloseReason::failure(e.to_string());
                            }
                        }
                        Err(e) => {
                            tracing::error!(conn = %self.id, error = %e, "failed to serialize frame");
                        }
                    },
                    Some(Outbound::Close { code, reason }) => {
                        self.close(&mut write, code, &reason).await;
                        break CloseReason::requested(code, reason);
                    }
                    None => {
                        // Every handle was dropped.
                        self.close(&mut write, CLOSE_NORMAL, "client went away").await;
                        break CloseReason::requested(CLOSE_NORMAL, "client went away");
                    }
                },
            }
        };

        tracing::info!(conn = %self.id, code = ?reason.code, reason = %reason.reason, "push channel closed");
        self.finish(reason);
    }

    async fn close<S>(&self, write: &mut S, code: u16, reason: &str)
    where
        S: futures_util::Sink<Message> + Unpin,
        S::Error: std::fmt::Display,
    {
        self.state.send_replace(ConnectionState::Closing);
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        if let Err(e) = write.send(Message::Close(Some(frame))).await {
            tracing::debug!(conn = %self.id, error = %e, "close frame not delivered");
        }
    }
}
