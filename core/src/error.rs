//! Error types for the transaction engine.
//!
//! Per-change failures during undo/redo ([`ReplayError`]) are soft: they are
//! collected into a report and the diagnostics buffer, never returned as the
//! result of a walk. Everything else is returned to the caller.

use thiserror::Error;

use crate::history::Phase;
use crate::identity::ObjectId;

/// The object factory could not build an object for a reconstruction descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconstructionError {
    /// The factory has no asset of this kind.
    #[error("unknown asset kind '{0}'")]
    UnknownAsset(String),
    /// The factory could not interpret a free-text description.
    #[error("cannot build an object from description '{0}'")]
    UnsupportedDescription(String),
    /// The factory returned nothing for a descriptor it should support.
    #[error("factory rejected descriptor: {0}")]
    FactoryRejected(String),
}

/// A world refused a single-property edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// The property key is not known to the world.
    #[error("unknown property '{0}'")]
    UnknownKey(String),
    /// The value has the wrong type for the key.
    #[error("property '{key}' expects {expected}")]
    TypeMismatch { key: String, expected: &'static str },
    /// The target object is not alive.
    #[error("object is not alive")]
    NotAlive,
}

/// A single change could not be replayed during undo or redo.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    /// The id no longer resolves to a live object.
    #[error("object {0} is not tracked by any live object")]
    MissingObject(ObjectId),
    /// The object could not be rebuilt from its snapshot.
    #[error("failed to reconstruct object {id}: {source}")]
    Reconstruction {
        id: ObjectId,
        #[source]
        source: ReconstructionError,
    },
    /// The world refused a property edit.
    #[error("failed to set '{key}' on object {id}: {source}")]
    Property {
        id: ObjectId,
        key: String,
        #[source]
        source: PropertyError,
    },
    /// The world refused a structural operation on a live handle.
    #[error("world rejected {operation} on object {id}")]
    WorldRejected { id: ObjectId, operation: &'static str },
}

/// Caller-facing failures of the [`ChangeLog`](crate::ChangeLog) API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    /// Called while an undo or redo walk is in progress.
    #[error("history is busy ({0:?})")]
    Busy(Phase),
    /// Strict mode refuses to abandon an uncommitted transaction.
    #[error("transaction '{label}' is still open")]
    TransactionAlreadyOpen { label: String },
}

/// Errors raised while loading persisted history.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The data failed structural validation (`MalformedHistoryData`).
    #[error("malformed history data: {0}")]
    Malformed(String),
    #[error("unsupported history format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("history json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid [`HistoryConfig`](crate::HistoryConfig) values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_error_display() {
        assert_eq!(
            ReplayError::MissingObject(ObjectId::new(7)).to_string(),
            "object #7 is not tracked by any live object"
        );
        let err = ReplayError::Reconstruction {
            id: ObjectId::new(3),
            source: ReconstructionError::UnknownAsset("dragon".into()),
        };
        assert_eq!(
            err.to_string(),
            "failed to reconstruct object #3: unknown asset kind 'dragon'"
        );
    }

    #[test]
    fn history_error_display() {
        assert_eq!(HistoryError::NothingToUndo.to_string(), "nothing to undo");
        assert_eq!(
            HistoryError::TransactionAlreadyOpen {
                label: "Drag".into()
            }
            .to_string(),
            "transaction 'Drag' is still open"
        );
    }

    #[test]
    fn persistence_error_display() {
        assert_eq!(
            PersistenceError::UnsupportedVersion {
                found: 9,
                expected: 1
            }
            .to_string(),
            "unsupported history format version 9 (expected 1)"
        );
    }
}
