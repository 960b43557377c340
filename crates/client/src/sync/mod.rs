//! Synchronization coordinator: bootstrap, live push, and mutation reconciliation.

mod coordinator;

pub use coordinator::{Collaborators, Phase, SyncEngine, SyncHandle, SyncSnapshot};
