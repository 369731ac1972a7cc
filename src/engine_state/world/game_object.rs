//! Game objects: the nodes of the world graph.

use cgmath::{Point3, Vector3};

use super::{
    transform::{Collider, Transform},
    ObjectHandle,
};
use crate::engine_state::{
    rendering::meshing::MeshHandle, spatial::BoundingBox, voxels::chunk::Chunk,
};

/// A rigid object with a mesh and a collider.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalObject {
    pub mesh: Option<MeshHandle>,
    pub collider: Collider,
    /// Objects overlapping this one at the last spatial update
    pub contacts: Vec<ObjectHandle>,
}

impl PhysicalObject {
    pub fn new(mesh: Option<MeshHandle>, collider: Collider) -> Self {
        PhysicalObject {
            mesh,
            collider,
            contacts: Vec::new(),
        }
    }
}

/// The player: a collider moved by a velocity every update.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerController {
    pub collider: Collider,
    /// World units per second
    pub velocity: Vector3<f32>,
    /// Objects overlapping the player at the last spatial update
    pub contacts: Vec<ObjectHandle>,
}

impl PlayerController {
    pub fn new(collider: Collider) -> Self {
        PlayerController {
            collider,
            velocity: Vector3::new(0.0, 0.0, 0.0),
            contacts: Vec::new(),
        }
    }
}

/// What a game object is, beyond its place in the hierarchy.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    /// A grouping node with no geometry and no volume.
    Empty,
    Physical(PhysicalObject),
    Player(PlayerController),
    /// A terrain chunk. Its placement comes from the transform alone; the
    /// chunk's own origin only records where its voxels were sampled.
    Chunk(Chunk),
}

/// A node of the world graph.
#[derive(Debug, Clone)]
pub struct GameObject {
    pub name: String,
    /// Transform relative to the parent
    pub transform: Transform,
    pub kind: ObjectKind,
    pub(super) parent: Option<ObjectHandle>,
    pub(super) children: Vec<ObjectHandle>,
}

impl GameObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind, transform: Transform) -> Self {
        GameObject {
            name: name.into(),
            transform,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<ObjectHandle> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectHandle] {
        &self.children
    }

    /// The mesh drawn for this object, if any.
    pub fn mesh(&self) -> Option<MeshHandle> {
        match &self.kind {
            ObjectKind::Physical(physical) => physical.mesh,
            ObjectKind::Chunk(chunk) => chunk.mesh(),
            ObjectKind::Empty | ObjectKind::Player(_) => None,
        }
    }

    /// Bounds of this object in its own local space, before any transform.
    ///
    /// `None` for objects without volume, which the octree does not track.
    pub fn local_bounds(&self) -> Option<BoundingBox> {
        match &self.kind {
            ObjectKind::Physical(physical) => Some(physical.collider.local_bounds()),
            ObjectKind::Player(player) => Some(player.collider.local_bounds()),
            ObjectKind::Chunk(chunk) => Some(BoundingBox::from_position_dimension(
                Point3::new(0.0, 0.0, 0.0),
                chunk.size(),
            )),
            ObjectKind::Empty => None,
        }
    }

    /// Objects overlapping this one at the last spatial update.
    pub fn contacts(&self) -> &[ObjectHandle] {
        match &self.kind {
            ObjectKind::Physical(physical) => &physical.contacts,
            ObjectKind::Player(player) => &player.contacts,
            ObjectKind::Chunk(_) | ObjectKind::Empty => &[],
        }
    }

    /// Replaces the contact list. Chunks and empty objects ignore contacts.
    pub fn set_contacts(&mut self, contacts: &[ObjectHandle]) {
        let list = match &mut self.kind {
            ObjectKind::Physical(physical) => &mut physical.contacts,
            ObjectKind::Player(player) => &mut player.contacts,
            ObjectKind::Chunk(_) | ObjectKind::Empty => return,
        };
        list.clear();
        list.extend_from_slice(contacts);
    }
}
