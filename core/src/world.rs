//! Collaborator interfaces: the live scene and the object factory.
//!
//! The engine never owns scene objects. It reads and mutates them through a
//! [`SceneWorld`] using [`ObjectHandle`]s, and asks an [`ObjectFactory`] to
//! build new ones when a deleted object has to come back.
//!
//! - [`SceneWorld`]: access to live objects (read state, apply transforms,
//!   set properties, destroy)
//! - [`ObjectFactory`]: builds objects from a shape kind, asset kind or
//!   free-text description
//! - [`ObjectState`]: everything the engine reads from one live object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PropertyError;
use crate::identity::ObjectId;
use crate::math::{Vec3, is_finite_vec3};
use crate::snapshot::{Reconstruction, ShapeKind};

/// A handle to a live object inside a [`SceneWorld`].
///
/// Handles are arena slots with a generation counter. A handle whose object
/// was destroyed stays stale forever, even if the slot is reused, so the
/// engine can hold handles without keeping objects alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    index: u32,
    generation: u32,
}

impl ObjectHandle {
    /// Creates a handle from a slot index and generation.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the slot generation.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Position, Euler rotation (radians) and scale of an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Origin, no rotation, unit scale.
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    /// Returns this transform with a different position.
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Returns this transform with a different rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns this transform with a different scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Returns `true` if no component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        is_finite_vec3(&self.position) && is_finite_vec3(&self.rotation) && is_finite_vec3(&self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Material state captured in a snapshot.
///
/// `color` is a packed `0xRRGGBB` value; `None` means the material has no
/// explicit color (e.g. textured assets).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialSnapshot {
    pub color: Option<u32>,
    pub transparent: bool,
    pub opacity: f32,
}

impl Default for MaterialSnapshot {
    fn default() -> Self {
        Self {
            color: None,
            transparent: false,
            opacity: 1.0,
        }
    }
}

/// Value of a single recorded property edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Vec3(Vec3),
    /// Packed `0xRRGGBB`.
    Color(u32),
}

impl PropertyValue {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Vec3(_) => "vec3",
            Self::Color(_) => "color",
        }
    }

    /// Returns `true` if the value holds no NaN or infinity.
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Number(n) => n.is_finite(),
            Self::Vec3(v) => is_finite_vec3(v),
            _ => true,
        }
    }
}

/// Everything the engine reads from one live object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectState {
    /// The stable id embedded in the object, if one was ever assigned.
    pub id: Option<ObjectId>,
    pub transform: Transform,
    pub visible: bool,
    pub material: Option<MaterialSnapshot>,
    /// How the object was built, so it can be rebuilt.
    pub reconstruction: Reconstruction,
}

impl ObjectState {
    /// Reads a named property, using the same keys as
    /// [`SceneWorld::set_property`]. Returns `None` for unknown keys.
    pub fn property(&self, key: &str) -> Option<PropertyValue> {
        let material = self.material.clone().unwrap_or_default();
        let value = match key {
            "visible" => PropertyValue::Bool(self.visible),
            "position" => PropertyValue::Vec3(self.transform.position),
            "rotation" => PropertyValue::Vec3(self.transform.rotation),
            "scale" => PropertyValue::Vec3(self.transform.scale),
            "color" => material.color.map_or(PropertyValue::Null, PropertyValue::Color),
            "opacity" => PropertyValue::Number(material.opacity as f64),
            "transparent" => PropertyValue::Bool(material.transparent),
            _ => return None,
        };
        Some(value)
    }
}

/// Access to the live set of scene objects.
///
/// Implemented by the rendering/scene-graph layer. Mutating methods return
/// `false` when the handle is stale.
pub trait SceneWorld: 'static {
    /// Returns `true` if the handle refers to a live object.
    fn contains(&self, handle: ObjectHandle) -> bool;

    /// Handles of all live objects, in a stable order.
    fn live_objects(&self) -> Vec<ObjectHandle>;

    /// Reads the state of a live object.
    fn read_object(&self, handle: ObjectHandle) -> Option<ObjectState>;

    /// Embeds a stable id into the object.
    fn embed_id(&mut self, handle: ObjectHandle, id: ObjectId) -> bool;

    fn set_transform(&mut self, handle: ObjectHandle, transform: &Transform) -> bool;

    fn set_visible(&mut self, handle: ObjectHandle, visible: bool) -> bool;

    fn set_material(&mut self, handle: ObjectHandle, material: Option<&MaterialSnapshot>) -> bool;

    /// Sets a single named property.
    fn set_property(
        &mut self,
        handle: ObjectHandle,
        key: &str,
        value: &PropertyValue,
    ) -> Result<(), PropertyError>;

    /// Removes the object from the scene.
    fn destroy(&mut self, handle: ObjectHandle) -> bool;
}

/// Builds new scene objects from a reconstruction descriptor.
///
/// Repeated calls with the same descriptor must yield objects of the same
/// visual kind and default appearance.
pub trait ObjectFactory<W: SceneWorld> {
    fn create_by_shape(&mut self, world: &mut W, kind: ShapeKind) -> Option<ObjectHandle>;

    fn create_by_asset(&mut self, world: &mut W, kind: &str) -> Option<ObjectHandle>;

    fn create_from_description(&mut self, world: &mut W, text: &str) -> Option<ObjectHandle>;
}
