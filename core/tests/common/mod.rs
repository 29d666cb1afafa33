//! Shared fixture for the history integration tests.
//!
//! [`Scene`] wires a [`MemoryWorld`], a [`ChangeLog`] and a notifying
//! [`MemoryFactory`] together the way an editor would: creations reach the
//! log through the notification queue, transforms and properties are
//! recorded directly.

#![allow(dead_code)]

use std::sync::Arc;

use sceneforge_core::math::vec3;
use sceneforge_core::memory::{MemoryFactory, MemoryWorld};
use sceneforge_core::{
    ChangeLog, HistoryConfig, NotificationQueue, ObjectEvent, ObjectFactory, ObjectHandle,
    ObjectState, PropertyValue, SceneWorld, ShapeKind, Vec3,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Scene {
    pub world: MemoryWorld,
    pub log: ChangeLog<MemoryWorld>,
    pub queue: Arc<NotificationQueue>,
    factory: MemoryFactory,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        init_logging();
        let queue = NotificationQueue::shared();
        let log = ChangeLog::with_config(
            config,
            MemoryFactory::new().with_notifications(Arc::clone(&queue)),
        )
        .expect("valid config")
        .with_notifications(Arc::clone(&queue));
        Self {
            world: MemoryWorld::new(),
            log,
            factory: MemoryFactory::new().with_notifications(Arc::clone(&queue)),
            queue,
        }
    }

    /// Creates a shape inside whatever transaction is open.
    pub fn spawn(&mut self, kind: ShapeKind) -> ObjectHandle {
        let handle = self
            .factory
            .create_by_shape(&mut self.world, kind)
            .expect("memory factory builds every shape");
        self.log.process_notifications(&mut self.world);
        handle
    }

    /// Creates a shape without pumping the notification queue.
    pub fn spawn_unrecorded(&mut self, kind: ShapeKind) -> ObjectHandle {
        self.factory
            .create_by_shape(&mut self.world, kind)
            .expect("memory factory builds every shape")
    }

    /// Creates a shape in its own transaction.
    pub fn create(&mut self, label: &str, kind: ShapeKind) -> ObjectHandle {
        self.log.start_transaction(label).unwrap();
        let handle = self.spawn(kind);
        assert!(self.log.commit_transaction());
        handle
    }

    /// Deletes an object in its own transaction, the way a scene layer
    /// reports a removal after the fact.
    pub fn delete(&mut self, label: &str, handle: ObjectHandle) {
        self.log.start_transaction(label).unwrap();
        let snapshot = self.log.capture(&mut self.world, handle);
        assert!(self.world.destroy(handle));
        self.queue.push(ObjectEvent::Deleted { handle, snapshot });
        self.log.process_notifications(&mut self.world);
        assert!(self.log.commit_transaction());
    }

    /// Moves an object inside whatever transaction is open.
    pub fn move_to(&mut self, handle: ObjectHandle, position: Vec3) {
        let prev = self.world.get(handle).expect("live object").transform;
        let next = prev.with_position(position);
        assert!(self.world.set_transform(handle, &next));
        self.log.record_transform(&mut self.world, handle, prev, next);
    }

    /// Moves an object in its own transaction.
    pub fn translate(&mut self, label: &str, handle: ObjectHandle, x: f32, y: f32, z: f32) {
        self.log.start_transaction(label).unwrap();
        self.move_to(handle, vec3(x, y, z));
        assert!(self.log.commit_transaction());
    }

    /// Sets a property inside whatever transaction is open.
    pub fn set(&mut self, handle: ObjectHandle, key: &str, value: PropertyValue) {
        let prev = self
            .world
            .get(handle)
            .and_then(|state| state.property(key))
            .expect("live object with a known property");
        self.world
            .set_property(handle, key, &value)
            .expect("supported property");
        self.log
            .record_property(&mut self.world, handle, key, prev, value);
    }

    pub fn position(&self, handle: ObjectHandle) -> Vec3 {
        self.world.get(handle).expect("live object").transform.position
    }

    pub fn state(&self) -> Vec<ObjectState> {
        self.world.fingerprint()
    }
}
