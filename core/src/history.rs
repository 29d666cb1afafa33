//! The change log: transaction recording and undo/redo replay.
//!
//! [`ChangeLog`] accumulates [`Change`]s into an open [`Transaction`], pushes
//! committed transactions onto a bounded undo stack, and replays them
//! backward (undo) or forward (redo) against a [`SceneWorld`].
//!
//! # Phases
//!
//! The engine is always in exactly one [`Phase`]:
//!
//! - `Idle`: no transaction open
//! - `Recording`: a transaction (possibly a coalescing window) is open
//! - `ExecutingUndo` / `ExecutingRedo`: a replay walk is running
//!
//! Every recording entry point is a no-op while executing, so the side
//! effects of a walk (objects rebuilt by the factory, notifications fired by
//! the scene layer) are never recorded as new history.
//!
//! # Failure tolerance
//!
//! A change that cannot be replayed (its object is gone, the factory cannot
//! rebuild it, the world rejects a property) is logged, stored in
//! [`Diagnostics`], and skipped. The rest of the transaction still runs and
//! the transaction still moves to the opposite stack.
//!
//! # Example
//!
//! ```
//! use sceneforge_core::memory::{MemoryFactory, MemoryWorld};
//! use sceneforge_core::{ChangeLog, ObjectFactory, ShapeKind};
//!
//! let mut world = MemoryWorld::new();
//! let mut log = ChangeLog::new(MemoryFactory::new());
//!
//! let mut factory = MemoryFactory::new();
//! let cube = factory.create_by_shape(&mut world, ShapeKind::Cube).unwrap();
//! log.start_transaction("Add cube").unwrap();
//! log.record_creation(&mut world, cube);
//! log.commit_transaction();
//!
//! log.undo(&mut world).unwrap();
//! assert!(world.is_empty());
//! log.redo(&mut world).unwrap();
//! assert_eq!(world.len(), 1);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::change::{Change, Transaction};
use crate::config::HistoryConfig;
use crate::error::{ConfigError, HistoryError, ReplayError};
use crate::identity::{IdentityRegistry, ObjectId};
use crate::notify::{NotificationQueue, ObjectEvent};
use crate::snapshot::{self, Snapshot};
use crate::world::{ObjectFactory, ObjectHandle, PropertyValue, SceneWorld, Transform};

/// Label of the transaction opened when a change arrives with none open.
pub const UNKNOWN_ACTION_LABEL: &str = "Unknown Action";

/// Observable engine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Recording,
    ExecutingUndo,
    ExecutingRedo,
}

/// Direction of a replay walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

pub(crate) enum State {
    Idle,
    Recording {
        transaction: Transaction,
        coalescing: bool,
    },
    Executing(Direction),
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Recording { .. } => Phase::Recording,
            Self::Executing(Direction::Undo) => Phase::ExecutingUndo,
            Self::Executing(Direction::Redo) => Phase::ExecutingRedo,
        }
    }
}

/// One change that failed during a replay walk.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEntry {
    pub transaction_id: u64,
    pub transaction_label: String,
    pub direction: Direction,
    pub error: ReplayError,
}

/// Ring buffer of replay failures.
///
/// Keeps the most recent `capacity` entries; [`total_issues`](Self::total_issues)
/// keeps counting past evictions.
#[derive(Debug)]
pub struct Diagnostics {
    entries: VecDeque<DiagnosticEntry>,
    capacity: usize,
    total: u64,
}

impl Diagnostics {
    fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            total: 0,
        }
    }

    fn push(&mut self, entry: DiagnosticEntry) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.total += 1;
    }

    pub fn entries(&self) -> &VecDeque<DiagnosticEntry> {
        &self.entries
    }

    /// Number of issues ever recorded, including evicted ones.
    pub fn total_issues(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Outcome of one undo or redo.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub transaction_id: u64,
    pub label: String,
    pub direction: Direction,
    /// Changes replayed successfully.
    pub applied: usize,
    /// Changes skipped, in walk order.
    pub issues: Vec<ReplayError>,
}

impl ReplayReport {
    /// `true` if every change in the transaction replayed.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Records world mutations as transactions and replays them.
///
/// Holds the undo/redo stacks, the identity registry and the object factory
/// for one world session. The world itself is passed into each call.
pub struct ChangeLog<W: SceneWorld> {
    pub(crate) config: HistoryConfig,
    pub(crate) state: State,
    pub(crate) undo_stack: VecDeque<Transaction>,
    pub(crate) redo_stack: Vec<Transaction>,
    pub(crate) registry: IdentityRegistry,
    factory: Box<dyn ObjectFactory<W>>,
    notifications: Arc<NotificationQueue>,
    recording_enabled: bool,
    pub(crate) next_transaction_id: u64,
    /// Signed number of undos (positive) or redos (negative) between the
    /// current state and the last save. `None` once the save point was
    /// evicted or sat on a discarded redo branch.
    pub(crate) save_distance: Option<i64>,
    diagnostics: Diagnostics,
}

impl<W: SceneWorld> ChangeLog<W> {
    /// Creates an empty change log with the default configuration.
    pub fn new(factory: impl ObjectFactory<W> + 'static) -> Self {
        Self::build(HistoryConfig::default(), Box::new(factory))
    }

    /// Creates an empty change log with a validated configuration.
    pub fn with_config(
        config: HistoryConfig,
        factory: impl ObjectFactory<W> + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, Box::new(factory)))
    }

    fn build(config: HistoryConfig, factory: Box<dyn ObjectFactory<W>>) -> Self {
        let diagnostics = Diagnostics::new(config.diagnostics_capacity);
        Self {
            config,
            state: State::Idle,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            registry: IdentityRegistry::new(),
            factory,
            notifications: NotificationQueue::shared(),
            recording_enabled: true,
            next_transaction_id: 1,
            save_distance: Some(0),
            diagnostics,
        }
    }

    /// Uses `queue` as the notification channel instead of a private one.
    ///
    /// Pass the same queue to the scene layer and factory so their
    /// creation/deletion events reach this log.
    #[must_use]
    pub fn with_notifications(mut self, queue: Arc<NotificationQueue>) -> Self {
        self.notifications = queue;
        self
    }

    /// The notification channel this log drains.
    pub fn notifications(&self) -> Arc<NotificationQueue> {
        Arc::clone(&self.notifications)
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// `true` while a coalescing window is open.
    pub fn is_coalescing(&self) -> bool {
        matches!(
            self.state,
            State::Recording {
                coalescing: true,
                ..
            }
        )
    }

    /// Label of the open transaction, if any.
    pub fn open_label(&self) -> Option<&str> {
        match &self.state {
            State::Recording { transaction, .. } => Some(&transaction.label),
            _ => None,
        }
    }

    /// Number of changes in the open transaction.
    pub fn open_change_count(&self) -> usize {
        match &self.state {
            State::Recording { transaction, .. } => transaction.len(),
            _ => 0,
        }
    }

    /// Globally enables or disables recording. Disabled recording turns
    /// every `record_*` call into a no-op.
    pub fn set_recording_enabled(&mut self, enabled: bool) {
        self.recording_enabled = enabled;
    }

    pub fn is_recording_enabled(&self) -> bool {
        self.recording_enabled
    }

    // ===== Transaction lifecycle =====

    /// Opens a new empty transaction.
    ///
    /// An already-open transaction is abandoned without being committed,
    /// unless [`HistoryConfig::strict_transactions`] is set, in which case
    /// this fails with [`HistoryError::TransactionAlreadyOpen`].
    pub fn start_transaction(&mut self, label: impl Into<String>) -> Result<(), HistoryError> {
        self.open(label.into(), false)
    }

    fn open(&mut self, label: String, coalescing: bool) -> Result<(), HistoryError> {
        match &self.state {
            State::Executing(_) => return Err(HistoryError::Busy(self.phase())),
            State::Recording { transaction, .. } => {
                if self.config.strict_transactions {
                    return Err(HistoryError::TransactionAlreadyOpen {
                        label: transaction.label.clone(),
                    });
                }
                log::warn!(
                    "Abandoning uncommitted transaction '{}' ({} changes) for '{}'",
                    transaction.label,
                    transaction.len(),
                    label
                );
            }
            State::Idle => {}
        }
        let id = self.next_transaction_id;
        self.next_transaction_id = self.next_transaction_id.saturating_add(1);
        self.state = State::Recording {
            transaction: Transaction::new(id, label),
            coalescing,
        };
        Ok(())
    }

    /// Closes the open transaction.
    ///
    /// A non-empty transaction is pushed onto the undo stack and the redo
    /// stack is cleared; an empty one is discarded. Returns `true` if a
    /// transaction was pushed.
    pub fn commit_transaction(&mut self) -> bool {
        if matches!(self.state, State::Executing(_)) {
            log::debug!("Commit ignored during replay");
            return false;
        }
        let State::Recording { transaction, .. } = std::mem::replace(&mut self.state, State::Idle)
        else {
            return false;
        };
        if transaction.is_empty() {
            log::debug!("Discarding empty transaction '{}'", transaction.label);
            return false;
        }

        // Clearing the redo stack invalidates a save point that was in redo.
        self.redo_stack.clear();
        if let Some(d) = self.save_distance
            && d < 0
        {
            self.save_distance = None;
        }
        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }

        log::info!(
            "Committed '{}' ({} changes)",
            transaction.label,
            transaction.len()
        );
        self.push_undo(transaction);
        true
    }

    /// Opens a coalescing window for a continuous interactive edit.
    ///
    /// Any open transaction is committed first. Everything recorded until
    /// [`stop_coalescing`](Self::stop_coalescing) lands in one transaction.
    pub fn start_coalescing(&mut self, label: impl Into<String>) -> Result<(), HistoryError> {
        if let State::Executing(_) = self.state {
            return Err(HistoryError::Busy(self.phase()));
        }
        self.commit_transaction();
        self.open(label.into(), true)
    }

    /// Commits the coalescing window. Returns `true` if a transaction was pushed.
    pub fn stop_coalescing(&mut self) -> bool {
        if !self.is_coalescing() {
            log::debug!("stop_coalescing without an open window");
            return false;
        }
        self.commit_transaction()
    }

    /// Runs `action` inside one transaction labelled `label`.
    ///
    /// Mutations inside `action` record their changes through the normal
    /// API. If a transaction is already open, `action` joins it and nothing
    /// is committed here.
    pub fn execute_grouped_action<R>(
        &mut self,
        label: impl Into<String>,
        world: &mut W,
        action: impl FnOnce(&mut Self, &mut W) -> R,
    ) -> Result<R, HistoryError> {
        match self.state {
            State::Executing(_) => Err(HistoryError::Busy(self.phase())),
            State::Recording { .. } => Ok(action(self, world)),
            State::Idle => {
                self.start_transaction(label)?;
                let result = action(self, world);
                self.commit_transaction();
                Ok(result)
            }
        }
    }

    // ===== Recording =====

    /// Records that `handle` was created.
    pub fn record_creation(&mut self, world: &mut W, handle: ObjectHandle) -> bool {
        if !self.recording_allowed("creation") {
            return false;
        }
        let Some(snapshot) = snapshot::capture(world, &mut self.registry, handle) else {
            log::warn!("Cannot record creation of stale object {handle}");
            return false;
        };
        self.record(Change::Create {
            id: snapshot.id,
            snapshot,
        });
        true
    }

    /// Records that `handle` is being deleted.
    ///
    /// Call before destroying the object, or pass a snapshot taken earlier.
    pub fn record_deletion(
        &mut self,
        world: &mut W,
        handle: ObjectHandle,
        snapshot_override: Option<Snapshot>,
    ) -> bool {
        if !self.recording_allowed("deletion") {
            return false;
        }
        let snapshot = match snapshot_override {
            Some(snapshot) => snapshot,
            None => match snapshot::capture(world, &mut self.registry, handle) {
                Some(snapshot) => snapshot,
                None => {
                    log::warn!("Cannot record deletion of stale object {handle} without a snapshot");
                    return false;
                }
            },
        };
        self.record(Change::Delete {
            id: snapshot.id,
            snapshot,
        });
        true
    }

    /// Records a transform change of `handle` from `prev` to `next`.
    pub fn record_transform(
        &mut self,
        world: &mut W,
        handle: ObjectHandle,
        prev: Transform,
        next: Transform,
    ) -> bool {
        if !self.recording_allowed("transform") {
            return false;
        }
        let Some(id) = self.registry.id_of(world, handle) else {
            log::warn!("Cannot record transform of stale object {handle}");
            return false;
        };
        self.record(Change::Transform { id, prev, next });
        true
    }

    /// Records a change of the property `key` of `handle`.
    pub fn record_property(
        &mut self,
        world: &mut W,
        handle: ObjectHandle,
        key: impl Into<String>,
        prev: PropertyValue,
        next: PropertyValue,
    ) -> bool {
        if !self.recording_allowed("property") {
            return false;
        }
        let Some(id) = self.registry.id_of(world, handle) else {
            log::warn!("Cannot record property change of stale object {handle}");
            return false;
        };
        self.record(Change::Property {
            id,
            key: key.into(),
            prev,
            next,
        });
        true
    }

    fn recording_allowed(&self, what: &str) -> bool {
        if let State::Executing(direction) = self.state {
            log::debug!("Suppressed {what} recording during {direction:?}");
            return false;
        }
        if !self.recording_enabled {
            log::debug!("Suppressed {what} recording: recording disabled");
            return false;
        }
        true
    }

    fn record(&mut self, change: Change) {
        if let State::Idle = self.state {
            log::debug!("No open transaction; opening '{UNKNOWN_ACTION_LABEL}'");
            let id = self.next_transaction_id;
            self.next_transaction_id = self.next_transaction_id.saturating_add(1);
            self.state = State::Recording {
                transaction: Transaction::new(id, UNKNOWN_ACTION_LABEL),
                coalescing: false,
            };
        }
        let merge_enabled = self.config.merge_coalesced_changes;
        if let State::Recording {
            transaction,
            coalescing,
        } = &mut self.state
        {
            log::debug!(
                "Recorded {} of {} in '{}'",
                change.kind(),
                change.id(),
                transaction.label
            );
            transaction.push(change, *coalescing && merge_enabled);
        }
    }

    /// Drains the notification queue into recorded changes.
    ///
    /// Returns the number of changes recorded.
    pub fn process_notifications(&mut self, world: &mut W) -> usize {
        let mut recorded = 0;
        for event in self.notifications.drain() {
            let ok = match event {
                ObjectEvent::Created(handle) => self.record_creation(world, handle),
                ObjectEvent::Deleted { handle, snapshot } => {
                    self.record_deletion(world, handle, snapshot)
                }
            };
            if ok {
                recorded += 1;
            }
        }
        recorded
    }

    // ===== Undo / redo =====

    /// Reverts the most recent transaction.
    ///
    /// Queued notifications are recorded and an open transaction is
    /// committed first. Changes are reverted in reverse order; per-change
    /// failures are reported in the returned [`ReplayReport`] and do not
    /// stop the walk.
    pub fn undo(&mut self, world: &mut W) -> Result<ReplayReport, HistoryError> {
        self.settle_before_replay(world)?;
        let transaction = self
            .undo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToUndo)?;
        let report = self.walk(world, &transaction, Direction::Undo);
        self.redo_stack.push(transaction);
        if let Some(d) = &mut self.save_distance {
            *d -= 1;
        }
        Ok(report)
    }

    /// Re-applies the most recently undone transaction, in original order.
    pub fn redo(&mut self, world: &mut W) -> Result<ReplayReport, HistoryError> {
        self.settle_before_replay(world)?;
        let transaction = self.redo_stack.pop().ok_or(HistoryError::NothingToRedo)?;
        let report = self.walk(world, &transaction, Direction::Redo);
        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.push_undo(transaction);
        Ok(report)
    }

    /// Brings pending edits into history so the walk only ever sees its own
    /// notifications in the queue.
    fn settle_before_replay(&mut self, world: &mut W) -> Result<(), HistoryError> {
        if let State::Executing(_) = self.state {
            return Err(HistoryError::Busy(self.phase()));
        }
        let pending = self.process_notifications(world);
        if pending > 0 {
            log::debug!("Recorded {pending} pending notifications before replay");
        }
        if let State::Recording { .. } = self.state {
            log::debug!("Committing open transaction before replay");
            self.commit_transaction();
        }
        Ok(())
    }

    fn walk(&mut self, world: &mut W, transaction: &Transaction, direction: Direction) -> ReplayReport {
        self.state = State::Executing(direction);
        let mut report = ReplayReport {
            transaction_id: transaction.id,
            label: transaction.label.clone(),
            direction,
            applied: 0,
            issues: Vec::new(),
        };

        let changes: Box<dyn Iterator<Item = &Change>> = match direction {
            Direction::Undo => Box::new(transaction.changes.iter().rev()),
            Direction::Redo => Box::new(transaction.changes.iter()),
        };
        for change in changes {
            let result = match direction {
                Direction::Undo => self.revert_change(world, change),
                Direction::Redo => self.apply_change(world, change),
            };
            match result {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    log::warn!(
                        "{direction:?} of '{}': skipped {} change: {error}",
                        transaction.label,
                        change.kind()
                    );
                    self.diagnostics.push(DiagnosticEntry {
                        transaction_id: transaction.id,
                        transaction_label: transaction.label.clone(),
                        direction,
                        error: error.clone(),
                    });
                    report.issues.push(error);
                }
            }
        }

        // Notifications fired by the walk's own side effects are not history.
        let echoed = self.notifications.drain();
        if !echoed.is_empty() {
            log::debug!(
                "Dropped {} notifications raised during {direction:?}",
                echoed.len()
            );
        }
        self.state = State::Idle;

        log::info!(
            "{direction:?} '{}' ({}/{} changes)",
            transaction.label,
            report.applied,
            transaction.len()
        );
        report
    }

    /// Reverse handler: returns the world to the state before `change`.
    fn revert_change(&mut self, world: &mut W, change: &Change) -> Result<(), ReplayError> {
        match change {
            Change::Create { id, .. } => self.remove_object(world, *id),
            Change::Delete { snapshot, .. } => self.restore_object(world, snapshot),
            Change::Transform { id, prev, .. } => self.apply_transform(world, *id, prev),
            Change::Property { id, key, prev, .. } => self.apply_property(world, *id, key, prev),
        }
    }

    /// Forward handler: re-applies `change`.
    fn apply_change(&mut self, world: &mut W, change: &Change) -> Result<(), ReplayError> {
        match change {
            Change::Create { snapshot, .. } => self.restore_object(world, snapshot),
            Change::Delete { id, .. } => self.remove_object(world, *id),
            Change::Transform { id, next, .. } => self.apply_transform(world, *id, next),
            Change::Property { id, key, next, .. } => self.apply_property(world, *id, key, next),
        }
    }

    fn remove_object(&mut self, world: &mut W, id: ObjectId) -> Result<(), ReplayError> {
        let handle = self
            .registry
            .resolve(world, id)
            .ok_or(ReplayError::MissingObject(id))?;
        if !world.destroy(handle) {
            return Err(ReplayError::WorldRejected {
                id,
                operation: "destroy",
            });
        }
        self.registry.unregister(id);
        Ok(())
    }

    fn restore_object(&mut self, world: &mut W, snapshot: &Snapshot) -> Result<(), ReplayError> {
        snapshot::reconstruct(world, self.factory.as_mut(), &mut self.registry, snapshot)
            .map(|_| ())
            .map_err(|source| ReplayError::Reconstruction {
                id: snapshot.id,
                source,
            })
    }

    fn apply_transform(
        &mut self,
        world: &mut W,
        id: ObjectId,
        transform: &Transform,
    ) -> Result<(), ReplayError> {
        let handle = self
            .registry
            .resolve(world, id)
            .ok_or(ReplayError::MissingObject(id))?;
        if !world.set_transform(handle, transform) {
            return Err(ReplayError::WorldRejected {
                id,
                operation: "set_transform",
            });
        }
        Ok(())
    }

    fn apply_property(
        &mut self,
        world: &mut W,
        id: ObjectId,
        key: &str,
        value: &PropertyValue,
    ) -> Result<(), ReplayError> {
        let handle = self
            .registry
            .resolve(world, id)
            .ok_or(ReplayError::MissingObject(id))?;
        world
            .set_property(handle, key, value)
            .map_err(|source| ReplayError::Property {
                id,
                key: key.to_owned(),
                source,
            })
    }

    fn push_undo(&mut self, transaction: Transaction) {
        self.undo_stack.push_back(transaction);
        if self.undo_stack.len() > self.config.max_history_size {
            if let Some(evicted) = self.undo_stack.pop_front() {
                log::debug!("History full; dropped oldest transaction '{}'", evicted.label);
            }
            // If the save point was beyond the oldest surviving entry, it's gone.
            if let Some(d) = self.save_distance
                && d > self.undo_stack.len() as i64
            {
                self.save_distance = None;
            }
        }
    }

    // ===== History management =====

    /// Clears both stacks and drops any open transaction.
    ///
    /// The object id counter is kept, so ids are never reused in a session.
    pub fn clear_history(&mut self) {
        if let State::Executing(_) = self.state {
            log::warn!("clear_history ignored during replay");
            return;
        }
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.state = State::Idle;
        // Still at the save point if we were there; otherwise it is unreachable.
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
        log::info!("History cleared");
    }

    /// Records the current state as the saved state.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// Returns `true` if the world differs from the last saved state.
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    // ===== Identity helpers for call sites =====

    /// Captures a snapshot of a live object (assigning an id if needed).
    pub fn capture(&mut self, world: &mut W, handle: ObjectHandle) -> Option<Snapshot> {
        snapshot::capture(world, &mut self.registry, handle)
    }

    /// Returns the stable id of a live object, assigning one if needed.
    pub fn id_of(&mut self, world: &mut W, handle: ObjectHandle) -> Option<ObjectId> {
        self.registry.id_of(world, handle)
    }

    /// Returns the live object currently representing `id`.
    pub fn resolve(&mut self, world: &W, id: ObjectId) -> Option<ObjectHandle> {
        self.registry.resolve(world, id)
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    // ===== Read-only accessors =====

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo labels, most recent first.
    pub fn undo_labels(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(|t| t.label.as_str())
    }

    /// Redo labels, most recent first.
    pub fn redo_labels(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|t| t.label.as_str())
    }

    /// The transaction the next undo would revert.
    pub fn peek_undo(&self) -> Option<&Transaction> {
        self.undo_stack.back()
    }

    /// The transaction the next redo would re-apply.
    pub fn peek_redo(&self) -> Option<&Transaction> {
        self.redo_stack.last()
    }

    pub fn max_history_size(&self) -> usize {
        self.config.max_history_size
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl<W: SceneWorld> fmt::Debug for ChangeLog<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeLog")
            .field("phase", &self.phase())
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_history_size", &self.config.max_history_size)
            .field("save_distance", &self.save_distance)
            .field("next_object_id", &self.registry.next_id())
            .finish()
    }
}
