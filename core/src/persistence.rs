//! History persistence bridge.
//!
//! [`ChangeLog::serialize`] dumps both stacks and the id counters into a
//! [`HistoryData`] record that the caller embeds in its own save document.
//! [`ChangeLog::deserialize`] validates such a record and re-links it to a
//! world whose objects were already restored by the caller. It never creates
//! objects itself.

use serde::{Deserialize, Serialize};

use crate::change::Transaction;
use crate::error::PersistenceError;
use crate::history::{ChangeLog, State};
use crate::identity::FIRST_OBJECT_ID;
use crate::world::SceneWorld;

/// Current [`HistoryData`] format version.
pub const HISTORY_FORMAT_VERSION: u32 = 1;

fn current_version() -> u32 {
    HISTORY_FORMAT_VERSION
}

/// Serializable dump of a [`ChangeLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryData {
    #[serde(default = "current_version")]
    pub version: u32,
    /// Oldest first.
    #[serde(default)]
    pub undo_stack: Vec<Transaction>,
    /// Oldest first; the last entry is the next redo.
    #[serde(default)]
    pub redo_stack: Vec<Transaction>,
    pub next_object_id: u64,
    /// Zero when absent; the loader then derives it from the stored ids.
    #[serde(default)]
    pub next_transaction_id: u64,
}

impl HistoryData {
    /// Checks the record structurally without touching any engine state.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        if self.version != HISTORY_FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: self.version,
                expected: HISTORY_FORMAT_VERSION,
            });
        }
        if self.next_object_id < FIRST_OBJECT_ID {
            return Err(PersistenceError::Malformed(format!(
                "next_object_id must be at least {FIRST_OBJECT_ID}"
            )));
        }
        // Both counters must leave room for one more id.
        if self.next_object_id == u64::MAX {
            return Err(PersistenceError::Malformed(
                "next_object_id is exhausted".into(),
            ));
        }
        if self.next_transaction_id == u64::MAX {
            return Err(PersistenceError::Malformed(
                "next_transaction_id is exhausted".into(),
            ));
        }

        let stacks = [("undo", &self.undo_stack), ("redo", &self.redo_stack)];
        for (stack, transactions) in stacks {
            for (index, transaction) in transactions.iter().enumerate() {
                let at = || format!("{stack} stack entry {index} ('{}')", transaction.label);
                if transaction.id == u64::MAX {
                    return Err(PersistenceError::Malformed(format!(
                        "{} has an exhausted transaction id",
                        at()
                    )));
                }
                if transaction.is_empty() {
                    return Err(PersistenceError::Malformed(format!(
                        "{} has no changes",
                        at()
                    )));
                }
                for change in &transaction.changes {
                    if !change.is_finite() {
                        return Err(PersistenceError::Malformed(format!(
                            "{} has a non-finite {} change",
                            at(),
                            change.kind()
                        )));
                    }
                    if let Some(id) = change
                        .referenced_ids()
                        .find(|id| id.raw() < FIRST_OBJECT_ID || id.raw() >= self.next_object_id)
                    {
                        return Err(PersistenceError::Malformed(format!(
                            "{} references {id}, outside the issued range below #{}",
                            at(),
                            self.next_object_id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value, PersistenceError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_string(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a record.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, PersistenceError> {
        let data: Self = serde_json::from_value(value)?;
        data.validate()?;
        Ok(data)
    }

    /// Parses and validates a record.
    pub fn from_json_str(json: &str) -> Result<Self, PersistenceError> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }
}

impl<W: SceneWorld> ChangeLog<W> {
    /// Dumps both stacks and the id counters.
    ///
    /// An open transaction is not part of the dump.
    pub fn serialize(&self) -> HistoryData {
        if let State::Recording { transaction, .. } = &self.state {
            log::debug!(
                "Open transaction '{}' is not included in the serialized history",
                transaction.label
            );
        }
        HistoryData {
            version: HISTORY_FORMAT_VERSION,
            undo_stack: self.undo_stack.iter().cloned().collect(),
            redo_stack: self.redo_stack.clone(),
            next_object_id: self.registry.next_id(),
            next_transaction_id: self.next_transaction_id,
        }
    }

    /// Replaces the history with `data` and re-links it to `world`.
    ///
    /// `world` must already contain the restored objects with their embedded
    /// ids. Validation happens before anything changes, so a rejected record
    /// leaves the log untouched. On success the loaded state counts as saved.
    pub fn deserialize(&mut self, world: &W, data: HistoryData) -> Result<(), PersistenceError> {
        data.validate()?;

        let HistoryData {
            mut undo_stack,
            redo_stack,
            next_object_id,
            next_transaction_id,
            ..
        } = data;

        if undo_stack.len() > self.config.max_history_size {
            let excess = undo_stack.len() - self.config.max_history_size;
            log::warn!(
                "Loaded history has {} undo entries; dropping the oldest {excess}",
                undo_stack.len()
            );
            undo_stack.drain(..excess);
        }

        if let State::Recording { transaction, .. } = &self.state {
            log::warn!(
                "Discarding open transaction '{}' on history load",
                transaction.label
            );
        }
        self.state = State::Idle;

        let highest_transaction = undo_stack
            .iter()
            .chain(redo_stack.iter())
            .map(|t| t.id)
            .max()
            .unwrap_or(0);
        self.next_transaction_id = next_transaction_id
            .max(highest_transaction.saturating_add(1))
            .max(1);

        self.registry.reset();
        let linked = self.registry.rebuild(world);
        let next_id = self.registry.next_id().max(next_object_id);
        self.registry.set_next_id(next_id);

        self.undo_stack = undo_stack.into();
        self.redo_stack = redo_stack;
        self.save_distance = Some(0);

        log::info!(
            "Loaded history: {} undo, {} redo, {linked} objects linked, next id #{next_id}",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        Ok(())
    }
}
