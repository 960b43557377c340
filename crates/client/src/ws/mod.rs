//! Push-channel plumbing: one WebSocket connection per signed-in user plus
//! the controller that decides when to reconnect it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                SyncEngine                    │
//! │  (owns the handle and the reconnect timer)   │
//! └──────────────────────────────────────────────┘
//!        │ connect / send / close     ▲ ConnectionEvent
//!        ▼                            │
//! ┌──────────────────┐        ┌──────────────────┐
//! │ Transport        │ spawns │ connection task  │
//! │ (WsTransport)    │──────▶ │ (owns the socket │
//! └──────────────────┘        │  and its state)  │
//!                             └──────────────────┘
//! ```
//!
//! Events from a connection are tagged with its [`ConnectionId`]; the engine
//! ignores anything from a connection it has already replaced.

mod connection;
mod reconnect;

pub use connection::{
    authenticated_url, CloseReason, ConnectionEvent, ConnectionId, ConnectionState, EventSink,
    Transport, TransportEvent, WsHandle, WsTransport,
};
pub(crate) use connection::Outbound;
pub use reconnect::{
    ArmOutcome, BackoffPolicy, ReconnectConfig, ReconnectController, ReconnectTicket,
    DEFAULT_RECONNECT_DELAY,
};
