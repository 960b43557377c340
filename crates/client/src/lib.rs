//! Notiflow client: keeps a signed-in user's notification list in sync with
//! the backend.
//!
//! The list is bulk-loaded over REST, then kept current through a WebSocket
//! push channel that reconnects on abnormal closure. Reads are applied
//! optimistically and rolled back on failure; deletes wait for the backend.
//! Everything is driven by [`SyncEngine`], which publishes [`SyncSnapshot`]s
//! to any number of observers.

pub mod alerts;
pub mod api_client;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod stores;
pub mod sync;
pub mod ws;

#[cfg(feature = "dioxus")]
pub mod ui;

#[cfg(test)]
mod test_support;

pub use alerts::{AlertPermission, AlertSink, NoopAlerts};
pub use api_client::{ApiClient, FetchGateway};
pub use config::{ClientConfig, ListFetchFailurePolicy};
pub use error::{Result, SyncError};
pub use session::{Credential, FileSessionStore, IdentityKey, MemorySessionStore, SessionStore};
pub use stores::{NotificationRecord, NotificationStore, PendingMutation};
pub use sync::{Collaborators, Phase, SyncEngine, SyncHandle, SyncSnapshot};
pub use ws::{ConnectionState, ReconnectConfig, WsTransport};
