//! In-memory scene world and object factory.
//!
//! [`MemoryWorld`] is a generational arena of plain object records. It
//! implements [`SceneWorld`] for tests, benchmarks and headless tools.
//! [`MemoryFactory`] builds objects into it from reconstruction descriptors
//! and can report every creation to a [`NotificationQueue`], the same way a
//! real scene layer would.
//!
//! # Example
//!
//! ```
//! use sceneforge_core::memory::{MemoryFactory, MemoryWorld};
//! use sceneforge_core::{ObjectFactory, SceneWorld, ShapeKind};
//!
//! let mut world = MemoryWorld::new();
//! let mut factory = MemoryFactory::new();
//! let cube = factory.create_by_shape(&mut world, ShapeKind::Cube).unwrap();
//! assert!(world.contains(cube));
//! ```

use std::sync::Arc;

use crate::error::PropertyError;
use crate::identity::ObjectId;
use crate::notify::{NotificationQueue, ObjectEvent};
use crate::snapshot::{Reconstruction, ShapeKind};
use crate::world::{
    MaterialSnapshot, ObjectFactory, ObjectHandle, ObjectState, PropertyValue, SceneWorld,
    Transform,
};

/// Asset kinds the in-memory factory knows how to build.
pub const KNOWN_ASSETS: [&str; 5] = ["tree", "car", "house", "lamp", "chair"];

#[derive(Clone)]
struct Slot {
    generation: u32,
    object: Option<ObjectState>,
}

/// A generational arena of scene objects.
#[derive(Clone, Default)]
pub struct MemoryWorld {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new object with identity transform. Primitives get their
    /// default color; assets and described objects carry no material.
    pub fn spawn(&mut self, reconstruction: Reconstruction) -> ObjectHandle {
        let material = match &reconstruction {
            Reconstruction::Shape(kind) => Some(MaterialSnapshot {
                color: Some(default_shape_color(*kind)),
                ..Default::default()
            }),
            Reconstruction::Asset(_) | Reconstruction::Description(_) => None,
        };
        self.insert(ObjectState {
            id: None,
            transform: Transform::identity(),
            visible: true,
            material,
            reconstruction,
        })
    }

    /// Inserts an object with fully specified state.
    pub fn insert(&mut self, state: ObjectState) -> ObjectHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.object = Some(state);
            return ObjectHandle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(state),
        });
        ObjectHandle::new(index, 0)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Finds the live object carrying `id`.
    pub fn find(&self, id: ObjectId) -> Option<ObjectHandle> {
        self.live_objects()
            .into_iter()
            .find(|h| self.get(*h).is_some_and(|o| o.id == Some(id)))
    }

    /// Borrow the state of a live object.
    pub fn get(&self, handle: ObjectHandle) -> Option<&ObjectState> {
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.object.as_ref()
    }

    fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut ObjectState> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.object.as_mut()
    }

    /// All live object states, ordered by id (objects without an id last).
    ///
    /// Two worlds with equal fingerprints are observably identical.
    pub fn fingerprint(&self) -> Vec<ObjectState> {
        let mut states: Vec<ObjectState> = self
            .slots
            .iter()
            .filter_map(|s| s.object.clone())
            .collect();
        states.sort_by_key(|s| s.id.map_or(u64::MAX, |id| id.raw()));
        states
    }
}

impl SceneWorld for MemoryWorld {
    fn contains(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some()
    }

    fn live_objects(&self) -> Vec<ObjectHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.object.is_some())
            .map(|(i, s)| ObjectHandle::new(i as u32, s.generation))
            .collect()
    }

    fn read_object(&self, handle: ObjectHandle) -> Option<ObjectState> {
        self.get(handle).cloned()
    }

    fn embed_id(&mut self, handle: ObjectHandle, id: ObjectId) -> bool {
        self.get_mut(handle).map(|o| o.id = Some(id)).is_some()
    }

    fn set_transform(&mut self, handle: ObjectHandle, transform: &Transform) -> bool {
        self.get_mut(handle).map(|o| o.transform = *transform).is_some()
    }

    fn set_visible(&mut self, handle: ObjectHandle, visible: bool) -> bool {
        self.get_mut(handle).map(|o| o.visible = visible).is_some()
    }

    fn set_material(&mut self, handle: ObjectHandle, material: Option<&MaterialSnapshot>) -> bool {
        self.get_mut(handle)
            .map(|o| o.material = material.copied())
            .is_some()
    }

    fn set_property(
        &mut self,
        handle: ObjectHandle,
        key: &str,
        value: &PropertyValue,
    ) -> Result<(), PropertyError> {
        let object = self.get_mut(handle).ok_or(PropertyError::NotAlive)?;
        let mismatch = |expected| PropertyError::TypeMismatch {
            key: key.to_owned(),
            expected,
        };
        match (key, value) {
            ("visible", PropertyValue::Bool(v)) => object.visible = *v,
            ("visible", _) => return Err(mismatch("bool")),
            ("position", PropertyValue::Vec3(v)) => object.transform.position = *v,
            ("rotation", PropertyValue::Vec3(v)) => object.transform.rotation = *v,
            ("scale", PropertyValue::Vec3(v)) => object.transform.scale = *v,
            ("position" | "rotation" | "scale", _) => return Err(mismatch("vec3")),
            ("color", PropertyValue::Color(c)) => {
                object.material.get_or_insert_with(Default::default).color = Some(*c);
            }
            ("color", PropertyValue::Null) => {
                if let Some(material) = object.material.as_mut() {
                    material.color = None;
                }
            }
            ("color", _) => return Err(mismatch("color or null")),
            ("opacity", PropertyValue::Number(n)) => {
                object.material.get_or_insert_with(Default::default).opacity = *n as f32;
            }
            ("opacity", _) => return Err(mismatch("number")),
            ("transparent", PropertyValue::Bool(v)) => {
                object.material.get_or_insert_with(Default::default).transparent = *v;
            }
            ("transparent", _) => return Err(mismatch("bool")),
            _ => return Err(PropertyError::UnknownKey(key.to_owned())),
        }
        // An all-default material reads the same as none; keep one spelling.
        if object.material == Some(MaterialSnapshot::default()) {
            object.material = None;
        }
        Ok(())
    }

    fn destroy(&mut self, handle: ObjectHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index() as usize) else {
            return false;
        };
        if slot.generation != handle.generation() || slot.object.take().is_none() {
            return false;
        }
        self.free.push(handle.index());
        self.live -= 1;
        true
    }
}

/// Default color of a freshly built primitive.
pub fn default_shape_color(kind: ShapeKind) -> u32 {
    match kind {
        ShapeKind::Cube => 0x4a90d9,
        ShapeKind::Sphere => 0xd94a4a,
        ShapeKind::Cylinder => 0x4ad97a,
        ShapeKind::Cone => 0xd9c84a,
        ShapeKind::Torus => 0x9a4ad9,
        ShapeKind::Plane => 0xcccccc,
    }
}

/// Builds objects into a [`MemoryWorld`].
#[derive(Default)]
pub struct MemoryFactory {
    notifications: Option<Arc<NotificationQueue>>,
}

impl MemoryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports every created object to `queue`.
    #[must_use]
    pub fn with_notifications(mut self, queue: Arc<NotificationQueue>) -> Self {
        self.notifications = Some(queue);
        self
    }

    fn spawn(&self, world: &mut MemoryWorld, reconstruction: Reconstruction) -> ObjectHandle {
        let handle = world.spawn(reconstruction);
        if let Some(queue) = &self.notifications {
            queue.push(ObjectEvent::Created(handle));
        }
        handle
    }
}

impl ObjectFactory<MemoryWorld> for MemoryFactory {
    fn create_by_shape(&mut self, world: &mut MemoryWorld, kind: ShapeKind) -> Option<ObjectHandle> {
        Some(self.spawn(world, Reconstruction::Shape(kind)))
    }

    fn create_by_asset(&mut self, world: &mut MemoryWorld, kind: &str) -> Option<ObjectHandle> {
        let known = KNOWN_ASSETS.iter().find(|k| k.eq_ignore_ascii_case(kind))?;
        Some(self.spawn(world, Reconstruction::Asset((*known).to_owned())))
    }

    fn create_from_description(
        &mut self,
        world: &mut MemoryWorld,
        text: &str,
    ) -> Option<ObjectHandle> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(self.spawn(world, Reconstruction::Description(text.to_owned())))
    }
}
