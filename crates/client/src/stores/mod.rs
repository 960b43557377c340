//! In-memory application state owned by the sync engine.

pub mod notifications;

pub use notifications::{
    DeleteOutcome, MergeOutcome, Mutation, NotificationRecord, NotificationStore,
    PendingMutation, ReadOutcome,
};
