//! Stable object identity across delete/recreate cycles.
//!
//! Every object that appears in a recorded change carries an [`ObjectId`]
//! embedded into it. When undo/redo destroys and rebuilds an object, the new
//! instance gets the same id, and [`IdentityRegistry`] is re-pointed to it.
//!
//! The registry is an index (`id -> handle`), not an owner: it never keeps
//! objects alive, and a handle whose object was destroyed externally simply
//! fails to resolve.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::world::{ObjectHandle, SceneWorld};

/// A stable, process-unique logical object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// First id handed out by a fresh registry.
pub const FIRST_OBJECT_ID: u64 = 1;

/// Maps object ids to whichever live object currently represents them.
#[derive(Debug)]
pub struct IdentityRegistry {
    next_id: u64,
    tracked: HashMap<ObjectId, ObjectHandle>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            next_id: FIRST_OBJECT_ID,
            tracked: HashMap::new(),
        }
    }

    /// Returns the object's id, minting and embedding a new one if absent.
    ///
    /// Also records the object as the current holder of that id. Returns
    /// `None` if the handle is stale.
    pub fn id_of<W: SceneWorld>(&mut self, world: &mut W, handle: ObjectHandle) -> Option<ObjectId> {
        let state = world.read_object(handle)?;
        let id = match state.id {
            Some(id) => {
                self.observe(id);
                id
            }
            None => {
                let id = ObjectId(self.next_id);
                self.next_id = self.next_id.saturating_add(1);
                if !world.embed_id(handle, id) {
                    return None;
                }
                log::debug!("Assigned {id} to object {handle}");
                id
            }
        };
        self.tracked.insert(id, handle);
        Some(id)
    }

    /// Returns the live object currently tracked for `id`.
    ///
    /// A stale entry (object destroyed behind the registry's back) is pruned
    /// and reported as a miss.
    pub fn resolve<W: SceneWorld>(&mut self, world: &W, id: ObjectId) -> Option<ObjectHandle> {
        let handle = *self.tracked.get(&id)?;
        if world.contains(handle) {
            Some(handle)
        } else {
            self.tracked.remove(&id);
            None
        }
    }

    /// Points `id` at `handle`, replacing any previous holder.
    pub fn register(&mut self, id: ObjectId, handle: ObjectHandle) {
        self.observe(id);
        self.tracked.insert(id, handle);
    }

    /// Forgets the holder of `id`, returning the handle it pointed to.
    pub fn unregister(&mut self, id: ObjectId) -> Option<ObjectHandle> {
        self.tracked.remove(&id)
    }

    /// Rebuilds the tracked map from the ids embedded in live objects.
    ///
    /// Returns the number of objects that were re-linked.
    pub fn rebuild<W: SceneWorld>(&mut self, world: &W) -> usize {
        self.tracked.clear();
        for handle in world.live_objects() {
            if let Some(id) = world.read_object(handle).and_then(|s| s.id) {
                if let Some(previous) = self.tracked.insert(id, handle) {
                    log::warn!("Objects {previous} and {handle} both carry {id}; keeping {handle}");
                }
                self.observe(id);
            }
        }
        self.tracked.len()
    }

    /// Number of ids currently tracked (live or not yet pruned).
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// The id that will be minted next.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Restores the id counter, clamped to [`FIRST_OBJECT_ID`].
    pub fn set_next_id(&mut self, next_id: u64) {
        self.next_id = next_id.max(FIRST_OBJECT_ID);
    }

    /// Clears all tracking and restarts id minting.
    pub fn reset(&mut self) {
        self.tracked.clear();
        self.next_id = FIRST_OBJECT_ID;
    }

    fn observe(&mut self, id: ObjectId) {
        if id.0 >= self.next_id {
            self.next_id = id.0.saturating_add(1);
        }
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
