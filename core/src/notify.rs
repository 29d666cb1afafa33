//! Mutation notification channel.
//!
//! Creation and deletion call sites push [`ObjectEvent`]s into a shared
//! [`NotificationQueue`]. The [`ChangeLog`](crate::ChangeLog) drains the queue
//! in [`process_notifications`](crate::ChangeLog::process_notifications) and
//! turns each event into a recorded change. Events raised while an undo or
//! redo walk is running are drained and dropped by the walk itself.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::snapshot::Snapshot;
use crate::world::ObjectHandle;

/// "Object created" / "object deleted" notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEvent {
    Created(ObjectHandle),
    /// Emitted before the object is destroyed, or with a snapshot taken
    /// beforehand if the object is already gone.
    Deleted {
        handle: ObjectHandle,
        snapshot: Option<Snapshot>,
    },
}

/// A shareable queue of [`ObjectEvent`]s.
///
/// [`push()`](Self::push) only requires `&self`, so factories and scene code
/// can hold an `Arc<NotificationQueue>` and report mutations without access
/// to the engine.
pub struct NotificationQueue {
    queue: Mutex<Vec<ObjectEvent>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Creates a queue already wrapped for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn push(&self, event: ObjectEvent) {
        self.queue.lock().push(event);
    }

    /// Drains all queued events, returning them in submission order.
    pub fn drain(&self) -> Vec<ObjectEvent> {
        std::mem::take(&mut *self.queue.lock())
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("pending", &self.len())
            .finish()
    }
}
