//! An editing session: one in-memory world, its change log, and the script
//! commands that drive them.
//!
//! Creations and deletions reach the change log through the notification
//! queue, the way a scene layer reports them. Every standalone edit runs as
//! a grouped action, so `begin`/`commit` blocks fold several edits into one
//! undo step.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sceneforge_core::memory::{MemoryFactory, MemoryWorld};
use sceneforge_core::{
    ChangeLog, ConfigError, Direction, HistoryConfig, HistoryData, HistoryError, NotificationQueue,
    ObjectEvent, ObjectFactory, ObjectHandle, ObjectId, ObjectState, PersistenceError,
    PropertyError, PropertyValue, Reconstruction, ReplayReport, SceneWorld, Snapshot, Vec3,
};
use serde::{Deserialize, Serialize};

use crate::script::{Channel, Command, ScriptLine};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0} does not name a live object")]
    UnknownObject(ObjectId),
    #[error("cannot build an object from {0}")]
    Unbuildable(Reconstruction),
    #[error("property '{key}' of {id}: {source}")]
    Property {
        id: ObjectId,
        key: String,
        #[source]
        source: PropertyError,
    },
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<SessionError>,
    },
}

/// The on-disk save format: live objects plus the change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub world: Vec<Snapshot>,
    pub history: HistoryData,
}

pub struct Session {
    world: MemoryWorld,
    log: ChangeLog<MemoryWorld>,
    factory: MemoryFactory,
    queue: Arc<NotificationQueue>,
}

impl Session {
    pub fn new(config: HistoryConfig) -> Result<Self, ConfigError> {
        let queue = NotificationQueue::shared();
        let log = ChangeLog::with_config(
            config,
            MemoryFactory::new().with_notifications(Arc::clone(&queue)),
        )?
        .with_notifications(Arc::clone(&queue));
        Ok(Self {
            world: MemoryWorld::new(),
            log,
            factory: MemoryFactory::new().with_notifications(Arc::clone(&queue)),
            queue,
        })
    }

    pub fn world(&self) -> &MemoryWorld {
        &self.world
    }

    pub fn log(&self) -> &ChangeLog<MemoryWorld> {
        &self.log
    }

    /// Runs a parsed script, passing each line of output to `out`.
    ///
    /// Stops at the first failing command. A transaction left open by a
    /// missing `commit` is committed at the end.
    pub fn run(
        &mut self,
        script: &[ScriptLine],
        mut out: impl FnMut(String),
    ) -> Result<(), SessionError> {
        for line in script {
            let output = self
                .execute(&line.command)
                .map_err(|source| SessionError::AtLine {
                    line: line.line,
                    source: Box::new(source),
                })?;
            out(output);
        }
        if let Some(label) = self.log.open_label().map(str::to_owned) {
            log::warn!("Script ended inside '{label}'; committing it");
            self.log.commit_transaction();
        }
        Ok(())
    }

    /// Executes one command, returning its output.
    pub fn execute(&mut self, command: &Command) -> Result<String, SessionError> {
        log::debug!("Executing {command:?}");
        let output = match command {
            Command::Create(reconstruction) => self.create(reconstruction)?,
            Command::Delete(id) => self.delete(*id)?,
            Command::Transform { id, channel, value } => self.transform(*id, *channel, *value)?,
            Command::Set { id, key, value } => self.set_property(*id, key, value)?,
            Command::Drag { id, to, steps } => self.drag(*id, *to, *steps)?,
            Command::Begin(label) => {
                self.log.start_transaction(label.as_str())?;
                format!("begin '{label}'")
            }
            Command::Commit => {
                if self.log.commit_transaction() {
                    "committed".to_owned()
                } else {
                    "nothing to commit".to_owned()
                }
            }
            Command::Undo => match self.log.undo(&mut self.world) {
                Ok(report) => describe_report(&report),
                Err(HistoryError::NothingToUndo) => "nothing to undo".to_owned(),
                Err(e) => return Err(e.into()),
            },
            Command::Redo => match self.log.redo(&mut self.world) {
                Ok(report) => describe_report(&report),
                Err(HistoryError::NothingToRedo) => "nothing to redo".to_owned(),
                Err(e) => return Err(e.into()),
            },
            Command::Clear => {
                self.log.clear_history();
                "history cleared".to_owned()
            }
            Command::Save(path) => {
                self.save(path)?;
                format!("saved {}", path.display())
            }
            Command::Load(path) => {
                self.load(path)?;
                format!("loaded {}", path.display())
            }
            Command::Print => self.describe(),
        };
        Ok(output)
    }

    fn handle(&mut self, id: ObjectId) -> Result<ObjectHandle, SessionError> {
        self.log
            .resolve(&self.world, id)
            .ok_or(SessionError::UnknownObject(id))
    }

    fn create(&mut self, reconstruction: &Reconstruction) -> Result<String, SessionError> {
        let factory = &mut self.factory;
        let handle = self
            .log
            .execute_grouped_action(
                format!("Create {reconstruction}"),
                &mut self.world,
                |log, world| {
                    let handle = match reconstruction {
                        Reconstruction::Shape(kind) => factory.create_by_shape(world, *kind),
                        Reconstruction::Asset(kind) => factory.create_by_asset(world, kind),
                        Reconstruction::Description(text) => {
                            factory.create_from_description(world, text)
                        }
                    };
                    log.process_notifications(world);
                    handle
                },
            )?
            .ok_or_else(|| SessionError::Unbuildable(reconstruction.clone()))?;

        Ok(match self.log.id_of(&mut self.world, handle) {
            Some(id) => format!("created {id} ({reconstruction})"),
            None => format!("created ({reconstruction})"),
        })
    }

    fn delete(&mut self, id: ObjectId) -> Result<String, SessionError> {
        let handle = self.handle(id)?;
        let queue = Arc::clone(&self.queue);
        self.log
            .execute_grouped_action(format!("Delete {id}"), &mut self.world, |log, world| {
                let snapshot = log.capture(world, handle);
                world.destroy(handle);
                queue.push(ObjectEvent::Deleted { handle, snapshot });
                log.process_notifications(world);
            })?;
        Ok(format!("deleted {id}"))
    }

    fn transform(
        &mut self,
        id: ObjectId,
        channel: Channel,
        value: Vec3,
    ) -> Result<String, SessionError> {
        let handle = self.handle(id)?;
        let verb = match channel {
            Channel::Position => "Move",
            Channel::Rotation => "Rotate",
            Channel::Scale => "Scale",
        };
        self.log
            .execute_grouped_action(format!("{verb} {id}"), &mut self.world, |log, world| {
                retransform(log, world, handle, channel, value)
            })?;
        Ok(format!("{} {id} to {}", verb.to_lowercase(), fmt_vec3(&value)))
    }

    fn set_property(
        &mut self,
        id: ObjectId,
        key: &str,
        value: &PropertyValue,
    ) -> Result<String, SessionError> {
        let handle = self.handle(id)?;
        self.log
            .execute_grouped_action(
                format!("Set {key} of {id}"),
                &mut self.world,
                |log, world| -> Result<(), PropertyError> {
                    let prev = world
                        .get(handle)
                        .and_then(|state| state.property(key))
                        .ok_or_else(|| PropertyError::UnknownKey(key.to_owned()))?;
                    world.set_property(handle, key, value)?;
                    log.record_property(world, handle, key, prev, value.clone());
                    Ok(())
                },
            )?
            .map_err(|source| SessionError::Property {
                id,
                key: key.to_owned(),
                source,
            })?;
        Ok(format!("set {key} of {id}"))
    }

    /// Simulates an interactive drag: `steps` small moves in one
    /// coalescing window. Any open transaction is committed first.
    fn drag(&mut self, id: ObjectId, to: Vec3, steps: u32) -> Result<String, SessionError> {
        let handle = self.handle(id)?;
        let from = self
            .world
            .get(handle)
            .map(|state| state.transform.position)
            .ok_or(SessionError::UnknownObject(id))?;

        self.log.start_coalescing(format!("Drag {id}"))?;
        for step in 1..=steps {
            let position = if step == steps {
                to
            } else {
                from.lerp(&to, step as f32 / steps as f32)
            };
            retransform(&mut self.log, &mut self.world, handle, Channel::Position, position);
        }
        self.log.stop_coalescing();
        Ok(format!("dragged {id} to {} in {steps} steps", fmt_vec3(&to)))
    }

    /// Captures the live world and the change log.
    pub fn document(&mut self) -> SceneDocument {
        // Capture first so untracked objects get ids before the counter is saved.
        let world = self
            .world
            .live_objects()
            .into_iter()
            .filter_map(|handle| self.log.capture(&mut self.world, handle))
            .collect();
        SceneDocument {
            world,
            history: self.log.serialize(),
        }
    }

    /// Replaces the world and history with a saved document.
    ///
    /// The document is validated before anything changes.
    pub fn restore(&mut self, document: SceneDocument) -> Result<(), SessionError> {
        document.history.validate()?;
        if let Some(bad) = document.world.iter().find(|s| !s.is_finite()) {
            return Err(PersistenceError::Malformed(format!(
                "world snapshot {} has non-finite values",
                bad.id
            ))
            .into());
        }

        let mut world = MemoryWorld::new();
        for snapshot in &document.world {
            world.insert(ObjectState {
                id: Some(snapshot.id),
                transform: snapshot.transform(),
                visible: snapshot.visible,
                material: snapshot.material.clone(),
                reconstruction: snapshot.reconstruction.clone(),
            });
        }
        self.queue.drain();
        self.world = world;
        self.log.deserialize(&self.world, document.history)?;
        Ok(())
    }

    pub fn save(&mut self, path: &Path) -> Result<(), SessionError> {
        let document = self.document();
        let json = serde_json::to_string_pretty(&document).map_err(PersistenceError::from)?;
        std::fs::write(path, json).map_err(|source| SessionError::Io {
            path: path.to_owned(),
            source,
        })?;
        self.log.mark_saved();
        log::info!(
            "Saved {} objects and {} undo steps to {}",
            document.world.len(),
            document.history.undo_stack.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load(&mut self, path: &Path) -> Result<(), SessionError> {
        let content = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_owned(),
            source,
        })?;
        let document: SceneDocument =
            serde_json::from_str(&content).map_err(PersistenceError::from)?;
        self.restore(document)
    }

    /// Human-readable listing of the world and both stacks.
    pub fn describe(&self) -> String {
        let mut text = String::new();
        let objects = self.world.fingerprint();
        let _ = writeln!(text, "{} object(s)", objects.len());
        for state in &objects {
            let id = state.id.map_or_else(|| "#?".to_owned(), |id| id.to_string());
            let _ = write!(
                text,
                "  {id} {} at {} rot {} scale {}",
                state.reconstruction,
                fmt_vec3(&state.transform.position),
                fmt_vec3(&state.transform.rotation),
                fmt_vec3(&state.transform.scale),
            );
            if !state.visible {
                text.push_str(" hidden");
            }
            if let Some(color) = state.material.as_ref().and_then(|m| m.color) {
                let _ = write!(text, " color #{color:06x}");
            }
            text.push('\n');
        }
        let undo: Vec<&str> = self.log.undo_labels().collect();
        let redo: Vec<&str> = self.log.redo_labels().collect();
        let _ = write!(
            text,
            "undo [{}] redo [{}]",
            undo.join(", "),
            redo.join(", ")
        );
        if self.log.has_unsaved_changes() {
            text.push_str(" (unsaved)");
        }
        text
    }
}

fn retransform(
    log: &mut ChangeLog<MemoryWorld>,
    world: &mut MemoryWorld,
    handle: ObjectHandle,
    channel: Channel,
    value: Vec3,
) -> bool {
    let Some(prev) = world.get(handle).map(|state| state.transform) else {
        return false;
    };
    let next = match channel {
        Channel::Position => prev.with_position(value),
        Channel::Rotation => prev.with_rotation(value),
        Channel::Scale => prev.with_scale(value),
    };
    world.set_transform(handle, &next) && log.record_transform(world, handle, prev, next)
}

fn describe_report(report: &ReplayReport) -> String {
    let verb = match report.direction {
        Direction::Undo => "undo",
        Direction::Redo => "redo",
    };
    if report.is_clean() {
        format!("{verb} '{}'", report.label)
    } else {
        format!(
            "{verb} '{}' ({} applied, {} skipped)",
            report.label,
            report.applied,
            report.issues.len()
        )
    }
}

fn fmt_vec3(v: &Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_script;
    use sceneforge_core::math::vec3;

    fn run(session: &mut Session, script: &str) -> Vec<String> {
        let commands = parse_script(script).unwrap();
        let mut output = Vec::new();
        session.run(&commands, |line| output.push(line)).unwrap();
        output
    }

    fn session() -> Session {
        Session::new(HistoryConfig::default()).unwrap()
    }

    fn position(session: &Session, id: u64) -> Vec3 {
        let handle = session.world().find(ObjectId::new(id)).unwrap();
        session.world().get(handle).unwrap().transform.position
    }

    #[test]
    fn create_move_undo() {
        let mut s = session();
        let out = run(&mut s, "create shape cube\nmove 1 1 2 3\nundo\n");
        assert_eq!(out[0], "created #1 (shape:cube)");
        assert_eq!(out[2], "undo 'Move #1'");
        assert_eq!(position(&s, 1), vec3(0.0, 0.0, 0.0));
        assert_eq!(s.log().undo_count(), 1);
        assert_eq!(s.log().redo_count(), 1);
    }

    #[test]
    fn delete_and_restore() {
        let mut s = session();
        run(&mut s, "create asset tree\nscale 1 2 2 2\ndelete 1\n");
        assert!(s.world().is_empty());
        run(&mut s, "undo\n");
        assert_eq!(s.world().len(), 1);
        let handle = s.world().find(ObjectId::new(1)).unwrap();
        assert_eq!(
            s.world().get(handle).unwrap().transform.scale,
            vec3(2.0, 2.0, 2.0)
        );
    }

    #[test]
    fn begin_commit_groups_edits() {
        let mut s = session();
        run(
            &mut s,
            "begin Build pair\ncreate shape cube\ncreate shape sphere\nmove 2 3 0 0\ncommit\n",
        );
        assert_eq!(s.log().undo_labels().collect::<Vec<_>>(), vec!["Build pair"]);
        run(&mut s, "undo\n");
        assert!(s.world().is_empty());
    }

    #[test]
    fn unterminated_begin_is_committed() {
        let mut s = session();
        run(&mut s, "begin Forgot\ncreate shape cone\n");
        assert_eq!(s.log().undo_labels().collect::<Vec<_>>(), vec!["Forgot"]);
    }

    #[test]
    fn drag_is_one_undo_step() {
        let mut s = session();
        run(&mut s, "create shape sphere\ndrag 1 5 0 5 50\n");
        assert_eq!(position(&s, 1), vec3(5.0, 0.0, 5.0));
        assert_eq!(s.log().undo_count(), 2);
        assert_eq!(s.log().peek_undo().unwrap().len(), 1);
        run(&mut s, "undo\n");
        assert_eq!(position(&s, 1), vec3(0.0, 0.0, 0.0));
    }

    #[test]
    fn set_property_and_errors() {
        let mut s = session();
        run(&mut s, "create shape cube\nset 1 color #123456\nset 1 visible false\n");
        let handle = s.world().find(ObjectId::new(1)).unwrap();
        let state = s.world().get(handle).unwrap();
        assert!(!state.visible);
        assert_eq!(state.material.as_ref().unwrap().color, Some(0x123456));

        let commands = parse_script("set 1 mass 3").unwrap();
        let err = s.run(&commands, |_| {}).unwrap_err();
        assert!(err.to_string().contains("line 1"));
        assert!(matches!(
            err,
            SessionError::AtLine { ref source, .. }
                if matches!(**source, SessionError::Property { .. })
        ));
        // The failed edit left no history behind.
        assert_eq!(s.log().undo_count(), 3);
    }

    #[test]
    fn unknown_object_fails_the_script() {
        let mut s = session();
        let commands = parse_script("create shape cube\ndelete 9\nundo\n").unwrap();
        let err = s.run(&commands, |_| {}).unwrap_err();
        match err {
            SessionError::AtLine { line, source } => {
                assert_eq!(line, 2);
                assert!(matches!(*source, SessionError::UnknownObject(_)));
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(s.world().len(), 1);
    }

    #[test]
    fn unbuildable_asset() {
        let mut s = session();
        let commands = parse_script("create asset dragon\n").unwrap();
        assert!(s.run(&commands, |_| {}).is_err());
        assert_eq!(s.log().undo_count(), 0);
    }

    #[test]
    fn empty_history_messages() {
        let mut s = session();
        let out = run(&mut s, "undo\nredo\ncommit\n");
        assert_eq!(out, vec!["nothing to undo", "nothing to redo", "nothing to commit"]);
    }

    #[test]
    fn document_round_trip() {
        let mut s = session();
        run(
            &mut s,
            "create shape cube\ncreate describe a red lamp\nmove 2 1 1 1\ndelete 1\nrotate 2 0 1 0\n",
        );
        let document = s.document();
        assert_eq!(document.world.len(), 1);
        let expected = s.world().fingerprint();

        let mut restored = session();
        restored.restore(document.clone()).unwrap();
        assert_eq!(restored.world().fingerprint(), expected);
        assert_eq!(restored.log().undo_count(), 5);
        assert!(!restored.log().has_unsaved_changes());

        // Both sessions undo to the same states.
        for _ in 0..5 {
            run(&mut s, "undo\n");
            run(&mut restored, "undo\n");
            assert_eq!(restored.world().fingerprint(), s.world().fingerprint());
        }
        assert!(restored.world().is_empty());

        // The restored session keeps issuing fresh ids.
        let out = run(&mut restored, "create shape plane\n");
        assert_eq!(out[0], "created #3 (shape:plane)");
    }

    #[test]
    fn bad_document_leaves_session_untouched() {
        let mut s = session();
        run(&mut s, "create shape cube\n");
        let mut document = s.document();
        document.history.version = 9;
        assert!(matches!(
            s.restore(document),
            Err(SessionError::Persistence(PersistenceError::UnsupportedVersion { .. }))
        ));
        assert_eq!(s.world().len(), 1);
        assert_eq!(s.log().undo_count(), 1);
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join("sceneforge_session_save_test.json");
        let mut s = session();
        let script = format!(
            "create shape torus\nmove 1 0 4 0\nsave {}\n",
            path.display()
        );
        run(&mut s, &script);
        assert!(!s.log().has_unsaved_changes());

        let mut other = session();
        other.load(&path).unwrap();
        assert_eq!(position(&other, 1), vec3(0.0, 4.0, 0.0));
        run(&mut other, "undo\nundo\n");
        assert!(other.world().is_empty());
        let _ = std::fs::remove_file(&path);

        let missing = std::env::temp_dir().join("sceneforge_session_missing.json");
        assert!(matches!(other.load(&missing), Err(SessionError::Io { .. })));
    }

    #[test]
    fn describe_lists_objects_and_stacks() {
        let mut s = session();
        let out = run(&mut s, "create shape cube\nset 1 visible false\nprint\n");
        let listing = &out[2];
        assert!(listing.starts_with("1 object(s)"));
        assert!(listing.contains("#1 shape:cube"));
        assert!(listing.contains("hidden"));
        assert!(listing.contains("undo [Set visible of #1, Create shape:cube]"));
        assert!(listing.ends_with("(unsaved)"));
    }
}
