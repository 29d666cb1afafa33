//! Recorded changes and the transactions that group them.
//!
//! [`Change`] is a closed sum type: every variant carries both directions of
//! the edit, so undo and redo need nothing but the change itself plus the
//! live world. A [`Transaction`] is an ordered list of changes that is undone
//! in reverse and redone in order.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::identity::ObjectId;
use crate::snapshot::Snapshot;
use crate::world::{PropertyValue, Transform};

/// The smallest recorded mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    /// An object came into existence.
    Create { id: ObjectId, snapshot: Snapshot },
    /// An object was removed; `snapshot` is its last state.
    Delete { id: ObjectId, snapshot: Snapshot },
    /// Position/rotation/scale changed.
    Transform {
        id: ObjectId,
        prev: Transform,
        next: Transform,
    },
    /// A single named property changed.
    Property {
        id: ObjectId,
        key: String,
        prev: PropertyValue,
        next: PropertyValue,
    },
}

impl Change {
    /// The object this change refers to.
    pub fn id(&self) -> ObjectId {
        match self {
            Self::Create { id, .. }
            | Self::Delete { id, .. }
            | Self::Transform { id, .. }
            | Self::Property { id, .. } => *id,
        }
    }

    /// Short name of the change kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
            Self::Transform { .. } => "transform",
            Self::Property { .. } => "property",
        }
    }

    /// Tries to fold `other` into `self`.
    ///
    /// Consecutive transforms of one object, or consecutive edits of one
    /// property, collapse into a single change that keeps the first `prev`
    /// and the latest `next`. Returns `None` when `other` was absorbed and
    /// `Some(other)` when the two changes must stay separate.
    pub fn merge(&mut self, other: Change) -> Option<Change> {
        match (self, other) {
            (
                Self::Transform { id, next, .. },
                Self::Transform {
                    id: other_id,
                    next: other_next,
                    ..
                },
            ) if *id == other_id => {
                *next = other_next;
                None
            }
            (
                Self::Property { id, key, next, .. },
                Self::Property {
                    id: other_id,
                    key: other_key,
                    next: other_next,
                    ..
                },
            ) if *id == other_id && *key == other_key => {
                *next = other_next;
                None
            }
            (_, other) => Some(other),
        }
    }

    /// Every object id referenced by the change, including embedded snapshots.
    pub(crate) fn referenced_ids(&self) -> impl Iterator<Item = ObjectId> {
        let snapshot_id = match self {
            Self::Create { snapshot, .. } | Self::Delete { snapshot, .. } => Some(snapshot.id),
            _ => None,
        };
        std::iter::once(self.id()).chain(snapshot_id)
    }

    /// Returns `true` if every number in the change is finite.
    pub(crate) fn is_finite(&self) -> bool {
        match self {
            Self::Create { snapshot, .. } | Self::Delete { snapshot, .. } => snapshot.is_finite(),
            Self::Transform { prev, next, .. } => prev.is_finite() && next.is_finite(),
            Self::Property { prev, next, .. } => prev.is_finite() && next.is_finite(),
        }
    }
}

/// An atomic, named group of changes undone and redone as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub label: String,
    /// Milliseconds since the Unix epoch when the transaction was opened.
    pub timestamp: u64,
    pub changes: Vec<Change>,
}

impl Transaction {
    /// Opens an empty transaction stamped with the current wall-clock time.
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            timestamp: now_millis(),
            changes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Appends a change, folding it into the last one when `merge` is set and
    /// the two are compatible.
    pub(crate) fn push(&mut self, change: Change, merge: bool) {
        if merge && let Some(last) = self.changes.last_mut() {
            match last.merge(change) {
                None => return,
                Some(returned) => self.changes.push(returned),
            }
        } else {
            self.changes.push(change);
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
