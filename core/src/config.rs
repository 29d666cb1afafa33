//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Default size of the replay diagnostics ring buffer.
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 256;

/// Tunables for a [`ChangeLog`](crate::ChangeLog).
///
/// Every field has a default, so a partial `[history]` table in a project
/// file is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo depth; the oldest transaction is dropped beyond it.
    pub max_history_size: usize,
    /// Fold consecutive transform/property edits of one target while coalescing.
    pub merge_coalesced_changes: bool,
    /// Refuse `start_transaction` while another transaction is open.
    pub strict_transactions: bool,
    /// How many replay issues the diagnostics buffer keeps.
    pub diagnostics_capacity: usize,
}

impl HistoryConfig {
    /// Checks that all sizes are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history_size == 0 {
            return Err(ConfigError::Zero {
                field: "max_history_size",
            });
        }
        if self.diagnostics_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "diagnostics_capacity",
            });
        }
        Ok(())
    }

    /// Returns this config with a different undo depth.
    #[must_use]
    pub fn with_max_history_size(mut self, max_history_size: usize) -> Self {
        self.max_history_size = max_history_size;
        self
    }

    /// Returns this config with strict transaction nesting.
    #[must_use]
    pub fn with_strict_transactions(mut self, strict: bool) -> Self {
        self.strict_transactions = strict;
        self
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_size: DEFAULT_MAX_UNDO,
            merge_coalesced_changes: true,
            strict_transactions: false,
            diagnostics_capacity: DEFAULT_DIAGNOSTICS_CAPACITY,
        }
    }
}
