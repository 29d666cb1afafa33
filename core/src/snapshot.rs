//! Snapshot codec: live object <-> plain serializable record.
//!
//! A [`Snapshot`] holds enough state for an [`ObjectFactory`] to rebuild a
//! behaviorally-equivalent object: transform, visibility, material, and a
//! [`Reconstruction`] descriptor naming the visual kind. Values are stored
//! exactly as read; rotations are not normalized.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReconstructionError;
use crate::identity::{IdentityRegistry, ObjectId};
use crate::math::Vec3;
use crate::world::{MaterialSnapshot, ObjectFactory, ObjectHandle, SceneWorld, Transform};

/// Primitive shapes the factory can always build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Cube,
    Sphere,
    Cylinder,
    Cone,
    Torus,
    Plane,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Cube,
        ShapeKind::Sphere,
        ShapeKind::Cylinder,
        ShapeKind::Cone,
        ShapeKind::Torus,
        ShapeKind::Plane,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Cone => "cone",
            Self::Torus => "torus",
            Self::Plane => "plane",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown shape '{s}'"))
    }
}

/// The minimal tag the factory needs to rebuild an object's visual kind.
///
/// Exactly one of the three descriptor kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reconstruction {
    Shape(ShapeKind),
    Asset(String),
    Description(String),
}

impl fmt::Display for Reconstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(kind) => write!(f, "shape:{kind}"),
            Self::Asset(kind) => write!(f, "asset:{kind}"),
            Self::Description(text) => write!(f, "description:\"{text}\""),
        }
    }
}

/// Immutable record of one object's reconstructible state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: ObjectId,
    pub position: Vec3,
    /// Euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub visible: bool,
    pub material: Option<MaterialSnapshot>,
    pub reconstruction: Reconstruction,
}

impl Snapshot {
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Returns `true` if no number in the snapshot is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.transform().is_finite()
            && self
                .material
                .as_ref()
                .is_none_or(|m| m.opacity.is_finite())
    }
}

/// Reads the current state of a live object.
///
/// Assigns an id through the registry if the object has none yet. Returns
/// `None` if the handle is stale.
pub fn capture<W: SceneWorld>(
    world: &mut W,
    registry: &mut IdentityRegistry,
    handle: ObjectHandle,
) -> Option<Snapshot> {
    let id = registry.id_of(world, handle)?;
    let state = world.read_object(handle)?;
    Some(Snapshot {
        id,
        position: state.transform.position,
        rotation: state.transform.rotation,
        scale: state.transform.scale,
        visible: state.visible,
        material: state.material,
        reconstruction: state.reconstruction,
    })
}

/// Rebuilds an object from a snapshot and registers it under the snapshot's id.
///
/// If the id already resolves to a live object, the snapshot state is
/// applied onto that object instead of building a second one.
pub fn reconstruct<W: SceneWorld>(
    world: &mut W,
    factory: &mut dyn ObjectFactory<W>,
    registry: &mut IdentityRegistry,
    snapshot: &Snapshot,
) -> Result<ObjectHandle, ReconstructionError> {
    if let Some(existing) = registry.resolve(world, snapshot.id) {
        log::debug!(
            "{} is already live as {existing}; restoring state in place",
            snapshot.id
        );
        apply_state(world, existing, snapshot);
        return Ok(existing);
    }

    let handle = match &snapshot.reconstruction {
        Reconstruction::Shape(kind) => factory
            .create_by_shape(world, *kind)
            .ok_or_else(|| ReconstructionError::FactoryRejected(kind.to_string()))?,
        Reconstruction::Asset(kind) => factory
            .create_by_asset(world, kind)
            .ok_or_else(|| ReconstructionError::UnknownAsset(kind.clone()))?,
        Reconstruction::Description(text) => factory
            .create_from_description(world, text)
            .ok_or_else(|| ReconstructionError::UnsupportedDescription(text.clone()))?,
    };

    apply_state(world, handle, snapshot);
    world.embed_id(handle, snapshot.id);
    registry.register(snapshot.id, handle);
    log::debug!(
        "Reconstructed {} ({}) as {handle}",
        snapshot.id,
        snapshot.reconstruction
    );
    Ok(handle)
}

fn apply_state<W: SceneWorld>(world: &mut W, handle: ObjectHandle, snapshot: &Snapshot) {
    world.set_transform(handle, &snapshot.transform());
    world.set_visible(handle, snapshot.visible);
    world.set_material(handle, snapshot.material.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec3;
    use crate::memory::{MemoryFactory, MemoryWorld};

    #[test]
    fn shape_kind_parse() {
        assert_eq!("cube".parse::<ShapeKind>(), Ok(ShapeKind::Cube));
        assert_eq!("Torus".parse::<ShapeKind>(), Ok(ShapeKind::Torus));
        assert!("blob".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn capture_reads_state_and_assigns_id() {
        let mut world = MemoryWorld::new();
        let mut registry = IdentityRegistry::new();
        let handle = world.spawn(Reconstruction::Shape(ShapeKind::Sphere));
        let t = Transform::identity().with_position(vec3(1.0, 2.0, 3.0));
        world.set_transform(handle, &t);
        world.set_visible(handle, false);

        let snap = capture(&mut world, &mut registry, handle).unwrap();
        assert_eq!(snap.id, ObjectId::new(1));
        assert_eq!(snap.position, vec3(1.0, 2.0, 3.0));
        assert!(!snap.visible);
        assert_eq!(snap.reconstruction, Reconstruction::Shape(ShapeKind::Sphere));
        assert_eq!(world.read_object(handle).unwrap().id, Some(snap.id));
    }

    #[test]
    fn reconstruct_rebuilds_verbatim() {
        let mut world = MemoryWorld::new();
        let mut factory = MemoryFactory::new();
        let mut registry = IdentityRegistry::new();
        let snap = Snapshot {
            id: ObjectId::new(9),
            position: vec3(4.0, 5.0, 6.0),
            rotation: vec3(7.0, 0.0, -7.0),
            scale: vec3(0.5, 0.5, 0.5),
            visible: true,
            material: Some(MaterialSnapshot {
                color: Some(0x00ff00),
                transparent: true,
                opacity: 0.25,
            }),
            reconstruction: Reconstruction::Shape(ShapeKind::Cone),
        };

        let handle = reconstruct(&mut world, &mut factory, &mut registry, &snap).unwrap();
        let again = capture(&mut world, &mut registry, handle).unwrap();
        assert_eq!(again, snap);
        assert_eq!(registry.resolve(&world, snap.id), Some(handle));
        assert_eq!(registry.next_id(), 10);
    }

    #[test]
    fn reconstruct_unknown_asset_fails() {
        let mut world = MemoryWorld::new();
        let mut factory = MemoryFactory::new();
        let mut registry = IdentityRegistry::new();
        let snap = Snapshot {
            id: ObjectId::new(1),
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: vec3(1.0, 1.0, 1.0),
            visible: true,
            material: None,
            reconstruction: Reconstruction::Asset("dragon".into()),
        };

        let err = reconstruct(&mut world, &mut factory, &mut registry, &snap).unwrap_err();
        assert_eq!(err, ReconstructionError::UnknownAsset("dragon".into()));
        assert_eq!(world.len(), 0);
    }

    #[test]
    fn reconstruct_onto_live_id_does_not_duplicate() {
        let mut world = MemoryWorld::new();
        let mut factory = MemoryFactory::new();
        let mut registry = IdentityRegistry::new();
        let handle = world.spawn(Reconstruction::Shape(ShapeKind::Cube));
        let mut snap = capture(&mut world, &mut registry, handle).unwrap();
        snap.position = vec3(9.0, 9.0, 9.0);

        let restored = reconstruct(&mut world, &mut factory, &mut registry, &snap).unwrap();
        assert_eq!(restored, handle);
        assert_eq!(world.len(), 1);
        assert_eq!(
            world.read_object(handle).unwrap().transform.position,
            vec3(9.0, 9.0, 9.0)
        );
    }

    #[test]
    fn snapshot_json_shape() {
        let snap = Snapshot {
            id: ObjectId::new(2),
            position: vec3(1.0, 0.0, 0.0),
            rotation: Vec3::zeros(),
            scale: vec3(1.0, 1.0, 1.0),
            visible: true,
            material: None,
            reconstruction: Reconstruction::Description("a red lamp".into()),
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["position"], serde_json::json!([1.0, 0.0, 0.0]));
        assert_eq!(json["reconstruction"]["kind"], "description");
        assert_eq!(json["reconstruction"]["value"], "a red lamp");
    }
}
