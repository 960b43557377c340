//! Push-channel connection: shared types and the transport seam.
//!
//! A connection is a background task owning the socket. Callers hold a
//! [`WsHandle`] to send frames or close, observe its [`ConnectionState`], and
//! receive [`ConnectionEvent`]s on the sink they passed to
//! [`Transport::connect`]. Every attempt emits at most one `Connected`, any
//! number of `Message`s, and exactly one terminal `Disconnected`.

use std::fmt;

use notiflow_shared::{ClientFrame, ServerFrame, CLOSE_NORMAL, TOKEN_QUERY_PARAM};
use tokio::sync::{mpsc, watch};
use url::Url;

use crate::error::Result;
use crate::session::Credential;

/// Identifies one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub(crate) u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    /// WebSocket close code, if the peer or caller supplied one.
    pub code: Option<u16>,
    pub reason: String,
    /// Whether the local side asked for the closure.
    pub requested: bool,
}

impl CloseReason {
    /// Closure asked for by the local caller.
    pub fn requested(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            reason: reason.into(),
            requested: true,
        }
    }

    /// Closure initiated by the remote peer.
    pub fn remote(code: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            requested: false,
        }
    }

    /// Handshake or stream failure with no close frame.
    pub fn failure(detail: impl Into<String>) -> Self {
        Self::remote(None, detail)
    }

    /// Anything but a locally requested normal closure is abnormal and
    /// warrants a reconnect.
    pub fn is_abnormal(&self) -> bool {
        !(self.requested && self.code == Some(CLOSE_NORMAL))
    }
}

/// Connection state for a push channel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closing,
    Closed(CloseReason),
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Connecting or open: a new connect would be redundant.
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Message(ServerFrame),
    /// A failure detail; always followed by `Disconnected`.
    Error(String),
    Disconnected(CloseReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionEvent {
    pub connection: ConnectionId,
    pub event: TransportEvent,
}

/// Where a connection delivers its events.
pub type EventSink = mpsc::UnboundedSender<ConnectionEvent>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outbound {
    Frame(ClientFrame),
    Close { code: u16, reason: String },
}

/// Handle for sending frames through a push connection
#[derive(Debug, Clone)]
pub struct WsHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<Outbound>,
    state: watch::Receiver<ConnectionState>,
}

impl WsHandle {
    pub(crate) fn new(
        id: ConnectionId,
        sender: mpsc::UnboundedSender<Outbound>,
        state: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self { id, sender, state }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open()
    }

    /// Send a frame. Silently dropped unless the connection is open.
    pub fn send(&self, frame: ClientFrame) {
        if !self.is_open() {
            tracing::debug!(conn = %self.id, ?frame, "push channel not open, dropping frame");
            return;
        }
        if self.sender.send(Outbound::Frame(frame)).is_err() {
            tracing::debug!(conn = %self.id, "connection task gone, dropping frame");
        }
    }

    /// Ask the connection to close with `code`. Closing with
    /// [`CLOSE_NORMAL`] is the only way to end a connection without it being
    /// classified as abnormal.
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        let _ = self.sender.send(Outbound::Close {
            code,
            reason: reason.into(),
        });
    }
}

/// Opens push connections.
pub trait Transport: Send + Sync {
    /// Start a connection to `endpoint` authenticated by `credential`.
    ///
    /// Fails immediately with [`SyncError::Unauthenticated`](crate::SyncError::Unauthenticated)
    /// when no credential is given; otherwise the outcome of the handshake is
    /// reported through `events`.
    fn connect(
        &self,
        endpoint: &Url,
        credential: Option<&Credential>,
        events: EventSink,
    ) -> Result<WsHandle>;
}

/// Endpoint URL with the credential attached as a query parameter.
pub fn authenticated_url(endpoint: &Url, credential: &Credential) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair(TOKEN_QUERY_PARAM, credential.expose());
    url
}

mod connection_native;
pub use connection_native::WsTransport;
