//! # SceneForge Core
//!
//! Undo/redo transaction engine for interactive 3D scene editing.
//!
//! Every world mutation (object created, object deleted, transform changed,
//! property changed) is recorded as a reversible [`Change`] inside a named
//! [`Transaction`]. The [`ChangeLog`] replays transactions backward or
//! forward, rebuilds deleted objects from [`Snapshot`]s through an
//! [`ObjectFactory`], and keeps object identity stable across delete and
//! recreate cycles with an [`IdentityRegistry`].
//!
//! The engine does not own the scene. It talks to it through the
//! [`SceneWorld`] trait; [`memory::MemoryWorld`] is an in-process
//! implementation for tests and headless tools.

pub mod change;
pub mod config;
pub mod error;
pub mod history;
pub mod identity;
pub mod math;
pub mod memory;
pub mod notify;
pub mod persistence;
pub mod snapshot;
pub mod world;

pub use change::{Change, Transaction};
pub use config::HistoryConfig;
pub use error::{
    ConfigError, HistoryError, PersistenceError, PropertyError, ReconstructionError, ReplayError,
};
pub use history::{
    ChangeLog, DiagnosticEntry, Diagnostics, Direction, Phase, ReplayReport, UNKNOWN_ACTION_LABEL,
};
pub use identity::{IdentityRegistry, ObjectId};
pub use math::Vec3;
pub use notify::{NotificationQueue, ObjectEvent};
pub use persistence::{HISTORY_FORMAT_VERSION, HistoryData};
pub use snapshot::{Reconstruction, ShapeKind, Snapshot};
pub use world::{
    MaterialSnapshot, ObjectFactory, ObjectHandle, ObjectState, PropertyValue, SceneWorld,
    Transform,
};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
