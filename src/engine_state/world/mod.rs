//! # World Module
//!
//! The world graph: a hierarchy of game objects owned by one arena.
//!
//! ## Ownership
//!
//! The [`World`] is the only owner of its objects. Parents refer to children and
//! children to parents by [`ObjectHandle`], and so do the octree and everything
//! else outside the graph. Destroying an object removes its whole subtree and
//! leaves every outstanding handle to it resolving to `None`.
//!
//! ## Transforms
//!
//! An object's transform is relative to its parent. The world transform is
//! composed up the parent chain on demand; nothing is cached, so moving a parent
//! moves its children on the next query.

use cgmath::{EuclideanSpace, Matrix4, Point3, SquareMatrix, Transform as _};
use log::{debug, info, warn};

use crate::{
    core::{Arena, Handle},
    engine_state::{
        rendering::{DrawCall, Renderer},
        spatial::{BoundingBox, SpatialHooks, SpatialObjects},
    },
    error::{EngineError, Result},
};

mod game_object;
mod transform;

pub use game_object::{GameObject, ObjectKind, PhysicalObject, PlayerController};
pub use transform::{Collider, Transform};

/// Handle to a game object owned by a [`World`].
pub type ObjectHandle = Handle<GameObject>;

/// The root of the object graph and owner of every game object.
pub struct World {
    objects: Arena<GameObject>,
    root: ObjectHandle,
    initialized: bool,
}

impl World {
    /// Creates a world holding only its root object, named `name`.
    pub fn new(name: &str) -> Self {
        let mut objects = Arena::new();
        let root = objects.insert(GameObject::new(name, ObjectKind::Empty, Transform::default()));
        World {
            objects,
            root,
            initialized: false,
        }
    }

    pub fn name(&self) -> &str {
        self.objects
            .get(self.root)
            .map(|root| root.name.as_str())
            .unwrap_or_default()
    }

    pub fn rename(&mut self, name: &str) {
        if let Some(root) = self.objects.get_mut(self.root) {
            root.name = name.to_string();
        }
    }

    /// The root object every other object descends from.
    pub fn root(&self) -> ObjectHandle {
        self.root
    }

    /// Number of objects, root excluded.
    pub fn len(&self) -> usize {
        self.objects.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&GameObject> {
        self.objects.get(handle)
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut GameObject> {
        self.objects.get_mut(handle)
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.objects.contains(handle)
    }

    /// Handles of every object except the root, in slot order.
    pub fn handles(&self) -> Vec<ObjectHandle> {
        self.objects
            .iter()
            .map(|(handle, _)| handle)
            .filter(|handle| *handle != self.root)
            .collect()
    }

    /// Finds the first object called `name`.
    pub fn find(&self, name: &str) -> Option<ObjectHandle> {
        self.objects
            .iter()
            .find(|(handle, object)| *handle != self.root && object.name == name)
            .map(|(handle, _)| handle)
    }

    /// Adds a new object directly under the root.
    pub fn spawn(&mut self, name: &str, kind: ObjectKind, transform: Transform) -> ObjectHandle {
        let mut object = GameObject::new(name, kind, transform);
        object.parent = Some(self.root);
        let handle = self.objects.insert(object);
        if let Some(root) = self.objects.get_mut(self.root) {
            root.children.push(handle);
        }
        handle
    }

    /// Re-parents `child` under `parent`, keeping its local transform.
    ///
    /// # Errors
    /// - `UnknownObject` if either handle is stale
    /// - `InvalidParent` if `child` is the root or an ancestor of `parent`
    pub fn attach_to(&mut self, child: ObjectHandle, parent: ObjectHandle) -> Result<()> {
        if !self.objects.contains(child) {
            return Err(EngineError::UnknownObject(child));
        }
        if !self.objects.contains(parent) {
            return Err(EngineError::UnknownObject(parent));
        }
        if child == self.root || self.is_ancestor_or_self(child, parent) {
            return Err(EngineError::InvalidParent { child, parent });
        }

        let old_parent = self.objects.get(child).and_then(GameObject::parent);
        if let Some(old) = old_parent.and_then(|old| self.objects.get_mut(old)) {
            old.children.retain(|handle| *handle != child);
        }
        if let Some(new) = self.objects.get_mut(parent) {
            new.children.push(child);
        }
        if let Some(object) = self.objects.get_mut(child) {
            object.parent = Some(parent);
        }
        Ok(())
    }

    /// Copies `source` into a new object under the same parent.
    ///
    /// The copy shares the source's mesh handle. Contacts and children are not
    /// copied.
    ///
    /// # Errors
    /// `UnknownObject` if `source` is stale.
    pub fn instantiate(&mut self, source: ObjectHandle) -> Result<ObjectHandle> {
        let original = self
            .objects
            .get(source)
            .ok_or(EngineError::UnknownObject(source))?;

        let mut copy = original.clone();
        copy.children.clear();
        copy.set_contacts(&[]);
        let parent = copy.parent.unwrap_or(self.root);
        copy.parent = Some(parent);

        let handle = self.objects.insert(copy);
        if let Some(parent) = self.objects.get_mut(parent) {
            parent.children.push(handle);
        }
        Ok(handle)
    }

    /// Destroys `handle` and its whole subtree.
    ///
    /// The root cannot be destroyed; asking to is logged and ignored.
    ///
    /// # Returns
    /// The number of objects removed
    ///
    /// # Errors
    /// `UnknownObject` if `handle` is stale.
    pub fn destroy(&mut self, handle: ObjectHandle) -> Result<usize> {
        if handle == self.root {
            warn!("Ignoring request to destroy the root of world '{}'", self.name());
            return Ok(0);
        }
        let parent = self
            .objects
            .get(handle)
            .ok_or(EngineError::UnknownObject(handle))?
            .parent;
        if let Some(parent) = parent.and_then(|parent| self.objects.get_mut(parent)) {
            parent.children.retain(|child| *child != handle);
        }

        let mut removed = 0;
        let mut stack = vec![handle];
        while let Some(next) = stack.pop() {
            if let Some(object) = self.objects.remove(next) {
                stack.extend(object.children);
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn is_ancestor_or_self(&self, ancestor: ObjectHandle, mut handle: ObjectHandle) -> bool {
        loop {
            if handle == ancestor {
                return true;
            }
            match self.objects.get(handle).and_then(GameObject::parent) {
                Some(parent) => handle = parent,
                None => return false,
            }
        }
    }

    /// Local-to-world matrix, composed up the parent chain.
    pub fn world_matrix(&self, handle: ObjectHandle) -> Option<Matrix4<f32>> {
        let mut object = self.objects.get(handle)?;
        let mut matrix = object.transform.matrix();
        while let Some(parent) = object.parent.and_then(|parent| self.objects.get(parent)) {
            matrix = parent.transform.matrix() * matrix;
            object = parent;
        }
        Some(matrix)
    }

    /// World-space position of the object's origin.
    pub fn world_position(&self, handle: ObjectHandle) -> Option<Point3<f32>> {
        self.world_matrix(handle)
            .map(|matrix| matrix.transform_point(Point3::origin()))
    }

    /// World-space bounds of the object, if it has volume.
    ///
    /// The local box is carried through the full world matrix, so inherited
    /// scale and rotation are reflected in the result.
    pub fn bounds(&self, handle: ObjectHandle) -> Option<BoundingBox> {
        let local = self.objects.get(handle)?.local_bounds()?;
        Some(local.transformed(&self.world_matrix(handle)?))
    }

    /// Prepares every object for the first frame.
    ///
    /// Clears stale contact lists. Returns the number of objects in the world.
    pub fn init(&mut self) -> usize {
        for (_, object) in self.objects.iter_mut() {
            object.set_contacts(&[]);
        }
        self.initialized = true;
        info!("World '{}' initialized with {} objects", self.name(), self.len());
        self.len()
    }

    /// Advances every object by `dt` seconds.
    ///
    /// Players move by their velocity. Returns the number of objects that moved.
    pub fn update(&mut self, dt: f32) -> usize {
        let mut moved = 0;
        for (_, object) in self.objects.iter_mut() {
            if let ObjectKind::Player(player) = &object.kind {
                if player.velocity != cgmath::Vector3::new(0.0, 0.0, 0.0) {
                    object.transform.position += player.velocity * dt;
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Builds the draw call for an object with a mesh.
    pub fn draw_call(&self, handle: ObjectHandle) -> Option<DrawCall> {
        let mesh = self.objects.get(handle)?.mesh()?;
        let transform = self.world_matrix(handle).unwrap_or_else(Matrix4::identity);
        let bounds = self.bounds(handle).unwrap_or_else(|| {
            let position = Point3::from_vec(transform.w.truncate());
            BoundingBox::new(position, position)
        });
        Some(DrawCall {
            mesh,
            transform,
            bounds,
        })
    }

    /// Submits every visible object with a mesh, except those `skip` selects.
    ///
    /// The engine skips objects the octree already drew this frame.
    ///
    /// # Returns
    /// The number of draw calls submitted
    pub fn draw(&self, renderer: &mut dyn Renderer, skip: impl Fn(ObjectHandle) -> bool) -> usize {
        let mut submitted = 0;
        for (handle, _) in self.objects.iter() {
            if skip(handle) {
                continue;
            }
            let Some(call) = self.draw_call(handle) else {
                continue;
            };
            if renderer.is_visible(&call.bounds) {
                renderer.submit(call);
                submitted += 1;
            }
        }
        submitted
    }
}

impl SpatialObjects<ObjectHandle> for World {
    fn spatial_bounds(&self, key: ObjectHandle) -> Option<BoundingBox> {
        self.bounds(key)
    }

    fn draw_call(&self, key: ObjectHandle) -> Option<DrawCall> {
        World::draw_call(self, key)
    }
}

impl SpatialHooks<ObjectHandle> for World {
    fn on_spatial_update(&mut self, key: ObjectHandle, contacts: &[ObjectHandle]) {
        if let Some(object) = self.objects.get_mut(key) {
            object.set_contacts(contacts);
        }
    }
}

impl Drop for World {
    fn drop(&mut self) {
        debug!("Destroying world '{}' ({} objects)", self.name(), self.len());
    }
}
