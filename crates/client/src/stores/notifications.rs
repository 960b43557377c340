//! Notification store: the ordered, deduplicated set of notifications.
//!
//! Records are unique by id and kept newest-first. The bulk fetch seeds the
//! store in the order the backend returned; pushed records are prepended.
//! Reads are applied optimistically and rolled back on failure; deletes are
//! only marked pending and the record stays visible until the backend
//! confirms.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use notiflow_shared::{RemoteNotification, DEFAULT_CATEGORY};

static FALLBACK_SEQ: AtomicU64 = AtomicU64::new(0);

/// Local change not yet confirmed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingMutation {
    #[default]
    None,
    PendingRead,
    PendingDelete,
}

/// A notification held in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub id: String,
    pub title: String,
    pub body: String,
    pub category: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub pending: PendingMutation,
}

impl NotificationRecord {
    /// Convert a wire record. Records without an id get a fallback derived
    /// from the arrival time; uniqueness is best-effort only.
    pub fn from_remote(remote: RemoteNotification, received_at: DateTime<Utc>) -> Self {
        let id = remote.id.unwrap_or_else(|| {
            format!(
                "local-{}-{}",
                received_at.timestamp_millis(),
                FALLBACK_SEQ.fetch_add(1, Ordering::Relaxed)
            )
        });

        Self {
            id,
            title: remote.title,
            body: remote.body,
            category: remote
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            payload: remote.payload,
            created_at: remote.created_at.unwrap_or(received_at),
            read: remote.read,
            pending: PendingMutation::None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending != PendingMutation::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    /// A record with this id already exists; the incoming one was dropped.
    Duplicate,
    /// The store has not been seeded yet; the record was queued.
    Buffered,
}

impl MergeOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, MergeOutcome::Inserted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The record was unread and is now read pending confirmation.
    Applied { prior: bool },
    AlreadyRead,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Marked,
    AlreadyPending,
    NotFound,
}

/// A mutation whose remote confirmation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Restore the read flag to `prior`.
    Read { prior: bool },
    /// Nothing was applied locally; only the pending marker is cleared.
    Delete,
}

#[derive(Debug, Default, Clone)]
pub struct NotificationStore {
    records: Vec<NotificationRecord>,
    seeded: bool,
    buffered: Vec<NotificationRecord>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with the bulk-fetched `records`, keeping their
    /// order and the first occurrence of any repeated id. Pushes buffered
    /// before seeding are then merged in arrival order.
    ///
    /// A record that was already held keeps its local read flag and pending
    /// marker, so a re-seed never turns a read record unread.
    ///
    /// Returns the number of records in the store afterwards.
    pub fn seed(&mut self, records: Vec<NotificationRecord>) -> usize {
        let local: HashMap<String, (bool, PendingMutation)> = self
            .records
            .drain(..)
            .map(|r| (r.id, (r.read, r.pending)))
            .collect();

        let mut seen = HashSet::with_capacity(records.len());
        self.records = records
            .into_iter()
            .filter(|r| seen.insert(r.id.clone()))
            .map(|mut r| {
                if let Some(&(read, pending)) = local.get(&r.id) {
                    r.read |= read;
                    r.pending = pending;
                }
                r
            })
            .collect();
        self.seeded = true;

        for record in std::mem::take(&mut self.buffered) {
            self.merge_push(record);
        }
        self.records.len()
    }

    /// Insert a pushed record at the front unless its id is already present.
    pub fn merge_push(&mut self, record: NotificationRecord) -> MergeOutcome {
        if !self.seeded {
            if self.buffered.iter().any(|r| r.id == record.id) {
                return MergeOutcome::Duplicate;
            }
            self.buffered.push(record);
            return MergeOutcome::Buffered;
        }
        if self.contains(&record.id) {
            return MergeOutcome::Duplicate;
        }
        self.records.insert(0, record);
        MergeOutcome::Inserted
    }

    /// Optimistically mark `id` read.
    pub fn apply_read(&mut self, id: &str) -> ReadOutcome {
        let Some(record) = self.get_mut(id) else {
            return ReadOutcome::NotFound;
        };
        if record.read {
            return ReadOutcome::AlreadyRead;
        }
        record.read = true;
        // A pending delete keeps precedence over the read marker.
        if record.pending == PendingMutation::None {
            record.pending = PendingMutation::PendingRead;
        }
        ReadOutcome::Applied { prior: false }
    }

    /// Optimistically mark every unread record read. Returns each affected id
    /// with its prior read state, newest first.
    pub fn apply_read_all(&mut self) -> Vec<(String, bool)> {
        let unread: Vec<String> = self
            .records
            .iter()
            .filter(|r| !r.read)
            .map(|r| r.id.clone())
            .collect();

        unread
            .into_iter()
            .filter_map(|id| match self.apply_read(&id) {
                ReadOutcome::Applied { prior } => Some((id, prior)),
                ReadOutcome::AlreadyRead | ReadOutcome::NotFound => None,
            })
            .collect()
    }

    /// The backend acknowledged a read.
    pub fn confirm_read(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(record) if record.pending == PendingMutation::PendingRead => {
                record.pending = PendingMutation::None;
                true
            }
            _ => false,
        }
    }

    /// Mark `id` as awaiting a remote delete. The record stays in place.
    pub fn apply_delete(&mut self, id: &str) -> DeleteOutcome {
        let Some(record) = self.get_mut(id) else {
            return DeleteOutcome::NotFound;
        };
        if record.pending == PendingMutation::PendingDelete {
            return DeleteOutcome::AlreadyPending;
        }
        record.pending = PendingMutation::PendingDelete;
        DeleteOutcome::Marked
    }

    /// The backend acknowledged a delete; remove the record.
    pub fn confirm_delete(&mut self, id: &str) -> Option<NotificationRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    /// Undo a mutation whose confirmation failed.
    ///
    /// Returns whether anything changed.
    pub fn rollback(&mut self, id: &str, mutation: Mutation) -> bool {
        let Some(record) = self.get_mut(id) else {
            return false;
        };
        match (mutation, record.pending) {
            (Mutation::Read { prior }, PendingMutation::PendingRead) => {
                record.read = prior;
                record.pending = PendingMutation::None;
                true
            }
            (Mutation::Read { prior }, PendingMutation::PendingDelete) => {
                record.read = prior;
                true
            }
            (Mutation::Read { .. }, PendingMutation::None) => false,
            (Mutation::Delete, PendingMutation::PendingDelete) => {
                record.pending = PendingMutation::None;
                true
            }
            (Mutation::Delete, PendingMutation::None | PendingMutation::PendingRead) => false,
        }
    }

    /// Forget everything, including whether the store was seeded.
    pub fn reset(&mut self) {
        self.records.clear();
        self.buffered.clear();
        self.seeded = false;
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.read).count()
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut NotificationRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }
}
