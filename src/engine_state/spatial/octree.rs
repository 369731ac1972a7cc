//! # Octree
//!
//! A dynamic octree over axis-aligned bounding boxes.
//!
//! ## Placement Policy
//!
//! Every object is stored exactly once, in the deepest node whose region fully
//! contains its bounding box. An object that straddles a split plane therefore
//! lives in the lowest common ancestor of the octants it touches, and traversals
//! never see the same object twice.
//!
//! ## Subdivision
//!
//! A leaf splits into eight octants once it holds more than
//! [`OctreeSettings::split_threshold`] objects (unless it already sits at
//! [`OctreeSettings::max_depth`]). After every [`Octree::update_tree`] pass, any
//! subtree whose total object count fell back to the threshold is collapsed into
//! its root, so the tree stays sparse as objects move away.
//!
//! ## Out-of-Bounds Objects
//!
//! Objects whose bounds do not overlap the bounding area are handled by
//! [`OutOfBoundsPolicy`]: either kept in the root node and logged (`Clamp`) or
//! refused with [`EngineError::OutOfBoundsInsertion`] (`Reject`). Objects that
//! wander out of the area after insertion are always clamped.

use std::{collections::HashMap, fmt::Debug, hash::Hash};

use cgmath::Point3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{BoundingBox, SpatialHooks, SpatialObjects};
use crate::{
    engine_state::rendering::Renderer,
    error::{EngineError, Result},
};

/// What to do with an object whose bounds miss the octree's bounding area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfBoundsPolicy {
    /// Keep the object in the root node and log a warning.
    #[default]
    Clamp,
    /// Refuse the insertion with `EngineError::OutOfBoundsInsertion`.
    Reject,
}

/// Tuning knobs for an [`Octree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeSettings {
    /// A leaf holding more objects than this splits into octants.
    pub split_threshold: usize,
    /// Nodes at this depth never split.
    pub max_depth: u32,
    /// Handling of insertions outside the bounding area.
    pub out_of_bounds: OutOfBoundsPolicy,
}

impl Default for OctreeSettings {
    fn default() -> Self {
        Self {
            split_threshold: 8,
            max_depth: 6,
            out_of_bounds: OutOfBoundsPolicy::Clamp,
        }
    }
}

/// Identifies a node inside one octree.
///
/// Node ids are recycled, and [`Octree::set_bounding_area`] rebuilds the whole
/// tree, so an id is only meaningful until the next structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node, which always exists.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Outcome of a successful [`Octree::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Stored in `node`, at `depth` below the root.
    Placed { node: NodeId, depth: u32 },
    /// Outside the bounding area; kept in the root node.
    Clamped,
}

/// Statistics from one [`Octree::update_tree`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeUpdate {
    /// Objects moved to a different node because their bounds changed.
    pub reassigned: usize,
    /// Keys dropped because their object no longer exists.
    pub removed: usize,
    /// Objects that left the bounding area during this pass.
    pub clamped: usize,
    /// Nodes split during this pass.
    pub split_nodes: usize,
    /// Nodes freed by collapsing sparse subtrees.
    pub merged_nodes: usize,
}

/// Statistics from one [`Octree::draw`] traversal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    /// Nodes whose objects were considered.
    pub nodes_visited: usize,
    /// Subtrees skipped because the renderer reported them invisible.
    pub nodes_culled: usize,
    /// Draw calls submitted.
    pub objects_submitted: usize,
}

#[derive(Debug)]
struct Node<K> {
    region: BoundingBox,
    depth: u32,
    parent: Option<NodeId>,
    children: Option<[NodeId; 8]>,
    objects: Vec<K>,
    live: bool,
}

impl<K> Node<K> {
    fn new(region: BoundingBox, depth: u32, parent: Option<NodeId>) -> Self {
        Node {
            region,
            depth,
            parent,
            children: None,
            objects: Vec::new(),
            live: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    node: NodeId,
    bounds: BoundingBox,
    clamped: bool,
}

/// A dynamic octree indexing keys of type `K` by their bounding boxes.
///
/// The tree holds no ownership over what the keys refer to: it remembers the
/// bounds it last read for each key and asks a [`SpatialObjects`] source for
/// fresh ones during [`Octree::update_tree`].
///
/// # Examples
/// ```
/// use cgmath::Point3;
/// use voxel_world::engine_state::spatial::{BoundingBox, Octree, OctreeSettings};
///
/// let mut octree: Octree<u32> = Octree::new(OctreeSettings::default());
/// octree
///     .set_bounding_area(BoundingBox::cube(Point3::new(0.0, 0.0, 0.0), 256.0))
///     .unwrap();
/// octree
///     .add(7, BoundingBox::new(Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0)))
///     .unwrap();
/// assert_eq!(octree.query_point(Point3::new(1.5, 1.5, 1.5)), vec![7]);
/// ```
pub struct Octree<K> {
    settings: OctreeSettings,
    bounding_area: Option<BoundingBox>,
    nodes: Vec<Node<K>>,
    free_nodes: Vec<usize>,
    entries: HashMap<K, Entry>,
}

impl<K: Copy + Eq + Hash + Debug> Octree<K> {
    /// Creates an empty octree with no bounding area.
    ///
    /// Objects added before [`Octree::set_bounding_area`] are parked in the root
    /// node and distributed once the area is known.
    pub fn new(settings: OctreeSettings) -> Self {
        let origin = Point3::new(0.0, 0.0, 0.0);
        Self {
            settings,
            bounding_area: None,
            nodes: vec![Node::new(BoundingBox::new(origin, origin), 0, None)],
            free_nodes: Vec::new(),
            entries: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &OctreeSettings {
        &self.settings
    }

    pub fn bounding_area(&self) -> Option<BoundingBox> {
        self.bounding_area
    }

    /// Fixes the root region and rebuilds the tree around it.
    ///
    /// Every tracked object is re-inserted, so node ids handed out before this
    /// call are meaningless afterwards. Tracked objects that miss the new area are
    /// clamped into the root regardless of policy.
    ///
    /// # Errors
    /// `InvalidBoundingArea` if `area` is not finite or has zero extent on any axis.
    pub fn set_bounding_area(&mut self, area: BoundingBox) -> Result<()> {
        if !area.is_finite() || !area.has_volume() {
            return Err(EngineError::InvalidBoundingArea(area));
        }

        let tracked: Vec<(K, BoundingBox)> = self
            .traversal_keys()
            .into_iter()
            .filter_map(|key| self.entries.get(&key).map(|entry| (key, entry.bounds)))
            .collect();

        self.nodes.clear();
        self.free_nodes.clear();
        self.entries.clear();
        self.nodes.push(Node::new(area, 0, None));
        self.bounding_area = Some(area);

        for (key, bounds) in tracked {
            if area.overlaps(&bounds) {
                self.place(key, bounds);
            } else {
                warn!(
                    "Object {:?} at {:?} lies outside the new octree region; clamping into the root node",
                    key, bounds
                );
                self.attach(NodeId::ROOT, key, bounds, true);
            }
        }

        debug!(
            "Octree bounding area set to {:?} ({} objects, {} nodes)",
            area,
            self.len(),
            self.node_count()
        );
        Ok(())
    }

    /// Starts tracking `key` with the given bounds.
    ///
    /// # Errors
    /// - `AlreadyTracked` if `key` is already in the tree
    /// - `OutOfBoundsInsertion` if the bounds miss the bounding area and the
    ///   policy is [`OutOfBoundsPolicy::Reject`]
    pub fn add(&mut self, key: K, bounds: BoundingBox) -> Result<Insertion> {
        if self.entries.contains_key(&key) {
            return Err(EngineError::AlreadyTracked(format!("{:?}", key)));
        }

        let Some(area) = self.bounding_area else {
            self.attach(NodeId::ROOT, key, bounds, false);
            return Ok(Insertion::Placed {
                node: NodeId::ROOT,
                depth: 0,
            });
        };

        if !area.overlaps(&bounds) {
            return match self.settings.out_of_bounds {
                OutOfBoundsPolicy::Reject => Err(EngineError::OutOfBoundsInsertion {
                    bounds,
                    region: area,
                }),
                OutOfBoundsPolicy::Clamp => {
                    warn!(
                        "Object {:?} at {:?} lies outside the octree region {:?}; clamping into the root node",
                        key, bounds, area
                    );
                    self.attach(NodeId::ROOT, key, bounds, true);
                    Ok(Insertion::Clamped)
                }
            };
        }

        let node = self.place(key, bounds);
        Ok(Insertion::Placed {
            node,
            depth: self.nodes[node.0].depth,
        })
    }

    /// Stops tracking `key`. Returns `false` if it was not tracked.
    pub fn remove(&mut self, key: K) -> bool {
        self.detach(key).is_some()
    }

    /// Re-reads every tracked object's bounds and restructures the tree.
    ///
    /// Objects that left their node's region, or that now fit a deeper octant,
    /// are moved; keys whose object no longer exists are dropped; sparse
    /// subtrees are collapsed afterwards. Running it twice without movement in
    /// between reports no reassignments the second time.
    pub fn update_tree<S: SpatialObjects<K> + ?Sized>(&mut self, objects: &S) -> TreeUpdate {
        let mut stats = TreeUpdate::default();

        for key in self.traversal_keys() {
            let Some(bounds) = objects.spatial_bounds(key) else {
                self.detach(key);
                stats.removed += 1;
                continue;
            };
            let Some(entry) = self.entries.get(&key).copied() else {
                continue;
            };

            let Some(area) = self.bounding_area else {
                self.set_cached_bounds(key, bounds, false);
                continue;
            };

            if !area.overlaps(&bounds) {
                if entry.clamped {
                    self.set_cached_bounds(key, bounds, true);
                } else {
                    warn!(
                        "Object {:?} moved outside the octree region to {:?}; clamping into the root node",
                        key, bounds
                    );
                    self.detach(key);
                    self.attach(NodeId::ROOT, key, bounds, true);
                    stats.reassigned += 1;
                    stats.clamped += 1;
                }
                continue;
            }

            let target = self.target_node(entry.node, &bounds);
            if target == entry.node {
                self.set_cached_bounds(key, bounds, false);
                continue;
            }

            self.detach(key);
            self.attach(target, key, bounds, false);
            stats.reassigned += 1;
            stats.split_nodes += self.split_if_needed(target);
        }

        stats.merged_nodes = self.merge_sparse_subtrees();

        if stats != TreeUpdate::default() {
            debug!("Octree restructured: {:?}", stats);
        }
        stats
    }

    /// Runs the per-frame spatial hooks.
    ///
    /// Every tracked object, in traversal order, receives the list of other
    /// tracked objects whose bounds overlap its own. The tree itself is not
    /// modified. Returns the number of objects visited.
    pub fn update<S: SpatialHooks<K> + ?Sized>(&self, objects: &mut S) -> usize {
        let keys = self.traversal_keys();
        for key in &keys {
            let Some(entry) = self.entries.get(key) else {
                continue;
            };
            let contacts: Vec<K> = self
                .query_overlaps(&entry.bounds)
                .into_iter()
                .filter(|other| other != key)
                .collect();
            objects.on_spatial_update(*key, &contacts);
        }
        keys.len()
    }

    /// Submits every visible object's geometry to `renderer`.
    ///
    /// Subtrees whose region the renderer reports invisible are skipped whole.
    /// The root is never culled, because clamped objects may lie outside it.
    pub fn draw<S: SpatialObjects<K> + ?Sized>(
        &self,
        objects: &S,
        renderer: &mut dyn Renderer,
    ) -> DrawStats {
        let mut stats = DrawStats::default();
        let mut stack = vec![NodeId::ROOT];

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if id != NodeId::ROOT && !renderer.is_visible(&node.region) {
                stats.nodes_culled += 1;
                continue;
            }
            stats.nodes_visited += 1;

            for key in &node.objects {
                let Some(entry) = self.entries.get(key) else {
                    continue;
                };
                if !renderer.is_visible(&entry.bounds) {
                    continue;
                }
                if let Some(call) = objects.draw_call(*key) {
                    renderer.submit(call);
                    stats.objects_submitted += 1;
                }
            }

            if let Some(children) = node.children {
                stack.extend(children.iter().rev().copied());
            }
        }

        stats
    }

    /// Submits every live node's region as a wireframe box when `enabled`.
    ///
    /// Returns the number of boxes submitted.
    pub fn draw_debug(&self, renderer: &mut dyn Renderer, enabled: bool) -> usize {
        if !enabled || self.bounding_area.is_none() {
            return 0;
        }

        let mut submitted = 0;
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            renderer.submit_debug_box(&node.region, node.depth);
            submitted += 1;
            if let Some(children) = node.children {
                stack.extend(children.iter().rev().copied());
            }
        }
        submitted
    }

    /// Returns every tracked key whose cached bounds overlap `region`.
    pub fn query_overlaps(&self, region: &BoundingBox) -> Vec<K> {
        let mut found = Vec::new();
        let mut stack = vec![NodeId::ROOT];

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if id != NodeId::ROOT && !node.region.overlaps(region) {
                continue;
            }
            found.extend(node.objects.iter().copied().filter(|key| {
                self.entries
                    .get(key)
                    .is_some_and(|entry| entry.bounds.overlaps(region))
            }));
            if let Some(children) = node.children {
                stack.extend(children.iter().rev().copied());
            }
        }

        found
    }

    /// Returns every tracked key whose cached bounds contain `point`.
    pub fn query_point(&self, point: Point3<f32>) -> Vec<K> {
        self.query_overlaps(&BoundingBox::new(point, point))
    }

    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// The node `key` is currently assigned to.
    pub fn node_of(&self, key: K) -> Option<NodeId> {
        self.entries.get(&key).map(|entry| entry.node)
    }

    /// The bounds cached for `key` at its last insertion or update.
    pub fn bounds_of(&self, key: K) -> Option<BoundingBox> {
        self.entries.get(&key).map(|entry| entry.bounds)
    }

    /// Returns `true` if `key` is held in the root because it lies outside the area.
    pub fn is_clamped(&self, key: K) -> bool {
        self.entries.get(&key).is_some_and(|entry| entry.clamped)
    }

    /// The region of a live node.
    pub fn node_region(&self, id: NodeId) -> Option<BoundingBox> {
        self.nodes
            .get(id.0)
            .filter(|node| node.live)
            .map(|node| node.region)
    }

    /// The keys stored directly in a live node.
    pub fn objects_in(&self, id: NodeId) -> &[K] {
        self.nodes
            .get(id.0)
            .filter(|node| node.live)
            .map(|node| node.objects.as_slice())
            .unwrap_or(&[])
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_nodes.len()
    }

    /// Depth of the deepest live node (the root is depth 0).
    pub fn depth(&self) -> u32 {
        self.nodes
            .iter()
            .filter(|node| node.live)
            .map(|node| node.depth)
            .max()
            .unwrap_or(0)
    }

    /// All tracked keys in depth-first order: a node's own objects, then its
    /// children in octant order.
    fn traversal_keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.entries.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            keys.extend(node.objects.iter().copied());
            if let Some(children) = node.children {
                stack.extend(children.iter().rev().copied());
            }
        }
        keys
    }

    /// Inserts into the deepest node that fully contains `bounds`, splitting if needed.
    fn place(&mut self, key: K, bounds: BoundingBox) -> NodeId {
        let target = self.descend(NodeId::ROOT, &bounds);
        self.attach(target, key, bounds, false);
        self.split_if_needed(target);
        self.entries
            .get(&key)
            .map(|entry| entry.node)
            .unwrap_or(target)
    }

    fn attach(&mut self, id: NodeId, key: K, bounds: BoundingBox, clamped: bool) {
        self.nodes[id.0].objects.push(key);
        self.entries.insert(
            key,
            Entry {
                node: id,
                bounds,
                clamped,
            },
        );
    }

    fn detach(&mut self, key: K) -> Option<Entry> {
        let entry = self.entries.remove(&key)?;
        let objects = &mut self.nodes[entry.node.0].objects;
        if let Some(position) = objects.iter().position(|other| *other == key) {
            objects.swap_remove(position);
        }
        Some(entry)
    }

    fn set_cached_bounds(&mut self, key: K, bounds: BoundingBox, clamped: bool) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.bounds = bounds;
            entry.clamped = clamped;
        }
    }

    /// The child of `id` that fully contains `bounds`, if `id` is split and one does.
    fn child_for(&self, id: NodeId, bounds: &BoundingBox) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        let children = node.children?;
        let child = children[node.region.octant_of(bounds)?];
        self.nodes[child.0].region.contains(bounds).then_some(child)
    }

    fn descend(&self, from: NodeId, bounds: &BoundingBox) -> NodeId {
        let mut id = from;
        while let Some(child) = self.child_for(id, bounds) {
            id = child;
        }
        id
    }

    /// Climbs from `current` to the first ancestor containing `bounds`, then
    /// descends as deep as the bounds fit.
    fn target_node(&self, current: NodeId, bounds: &BoundingBox) -> NodeId {
        let mut id = current;
        while id != NodeId::ROOT && !self.nodes[id.0].region.contains(bounds) {
            match self.nodes[id.0].parent {
                Some(parent) => id = parent,
                None => break,
            }
        }
        self.descend(id, bounds)
    }

    fn alloc_node(&mut self, region: BoundingBox, depth: u32, parent: NodeId) -> NodeId {
        let node = Node::new(region, depth, Some(parent));
        if let Some(index) = self.free_nodes.pop() {
            self.nodes[index] = node;
            NodeId(index)
        } else {
            self.nodes.push(node);
            NodeId(self.nodes.len() - 1)
        }
    }

    fn free_node(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        node.live = false;
        node.children = None;
        node.objects.clear();
        self.free_nodes.push(id.0);
    }

    /// Splits `id` if it is an over-full leaf. Returns the number of nodes split,
    /// counting splits cascaded into the new children.
    fn split_if_needed(&mut self, id: NodeId) -> usize {
        let node = &self.nodes[id.0];
        if self.bounding_area.is_none()
            || node.children.is_some()
            || node.objects.len() <= self.settings.split_threshold
            || node.depth >= self.settings.max_depth
            || !node.region.has_volume()
        {
            return 0;
        }

        let region = node.region;
        let depth = node.depth;
        let children: [NodeId; 8] =
            std::array::from_fn(|octant| self.alloc_node(region.octant(octant), depth + 1, id));
        self.nodes[id.0].children = Some(children);

        let objects = std::mem::take(&mut self.nodes[id.0].objects);
        for key in objects {
            let target = match self.entries.get(&key) {
                Some(entry) if !entry.clamped => self.child_for(id, &entry.bounds).unwrap_or(id),
                _ => id,
            };
            self.nodes[target.0].objects.push(key);
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.node = target;
            }
        }

        1 + children
            .iter()
            .map(|child| self.split_if_needed(*child))
            .sum::<usize>()
    }

    fn subtree_count(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            count += node.objects.len();
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        count
    }

    /// Collapses, top-down, every split node whose subtree holds no more than
    /// the split threshold. Returns the number of nodes freed.
    fn merge_sparse_subtrees(&mut self) -> usize {
        let mut freed = 0;
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let Some(children) = self.nodes[id.0].children else {
                continue;
            };
            if self.subtree_count(id) <= self.settings.split_threshold {
                freed += self.collapse(id);
            } else {
                stack.extend(children);
            }
        }
        freed
    }

    /// Pulls every object below `id` up into `id` and frees its descendants.
    fn collapse(&mut self, id: NodeId) -> usize {
        let Some(children) = self.nodes[id.0].children.take() else {
            return 0;
        };

        let mut freed = 0;
        let mut stack: Vec<NodeId> = children.to_vec();
        while let Some(child) = stack.pop() {
            if let Some(grandchildren) = self.nodes[child.0].children {
                stack.extend(grandchildren);
            }
            let objects = std::mem::take(&mut self.nodes[child.0].objects);
            for key in objects {
                self.nodes[id.0].objects.push(key);
                if let Some(entry) = self.entries.get_mut(&key) {
                    entry.node = id;
                }
            }
            self.free_node(child);
            freed += 1;
        }
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::{DrawCall, RecordingRenderer};

    type Bounds = HashMap<u32, BoundingBox>;

    impl SpatialObjects<u32> for Bounds {
        fn spatial_bounds(&self, key: u32) -> Option<BoundingBox> {
            self.get(&key).copied()
        }
    }

    fn unit_at(x: f32, y: f32, z: f32) -> BoundingBox {
        BoundingBox::new(Point3::new(x, y, z), Point3::new(x + 1.0, y + 1.0, z + 1.0))
    }

    fn world_area() -> BoundingBox {
        BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(256.0, 256.0, 256.0))
    }

    fn small_tree() -> Octree<u32> {
        let mut octree = Octree::new(OctreeSettings {
            split_threshold: 2,
            max_depth: 5,
            out_of_bounds: OutOfBoundsPolicy::Clamp,
        });
        octree.set_bounding_area(world_area()).unwrap();
        octree
    }

    fn assert_containment(octree: &Octree<u32>, objects: &Bounds) {
        for (key, bounds) in objects {
            let node = octree.node_of(*key).expect("tracked");
            let region = octree.node_region(node).expect("live node");
            if octree.is_clamped(*key) {
                assert_eq!(node, NodeId::ROOT);
            } else {
                assert!(region.overlaps(bounds), "{key} at {bounds:?} not in {region:?}");
            }
        }
    }

    #[test]
    fn rejects_degenerate_bounding_area() {
        let mut octree: Octree<u32> = Octree::new(OctreeSettings::default());
        let flat = BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 10.0));
        assert!(matches!(
            octree.set_bounding_area(flat),
            Err(EngineError::InvalidBoundingArea(_))
        ));
        let infinite = BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(f32::INFINITY, 1.0, 1.0));
        assert!(octree.set_bounding_area(infinite).is_err());
    }

    #[test]
    fn splits_when_threshold_is_exceeded() {
        let mut octree = small_tree();
        octree.add(1, unit_at(1.0, 1.0, 1.0)).unwrap();
        octree.add(2, unit_at(200.0, 1.0, 1.0)).unwrap();
        assert_eq!(octree.node_count(), 1);

        let insertion = octree.add(3, unit_at(1.0, 200.0, 1.0)).unwrap();
        assert_eq!(octree.node_count(), 9);
        assert!(matches!(insertion, Insertion::Placed { depth: 1, .. }));
        assert!(octree.objects_in(NodeId::ROOT).is_empty());
    }

    #[test]
    fn straddling_objects_stay_in_the_common_ancestor() {
        let mut octree = small_tree();
        let straddler = BoundingBox::new(Point3::new(120.0, 1.0, 1.0), Point3::new(136.0, 2.0, 2.0));
        octree.add(1, straddler).unwrap();
        octree.add(2, unit_at(1.0, 1.0, 1.0)).unwrap();
        octree.add(3, unit_at(200.0, 200.0, 200.0)).unwrap();

        assert_eq!(octree.node_of(1), Some(NodeId::ROOT));
        assert_ne!(octree.node_of(2), Some(NodeId::ROOT));
        assert_eq!(octree.query_overlaps(&straddler), vec![1]);
    }

    #[test]
    fn out_of_bounds_insertion_is_clamped_and_still_reachable() {
        let mut octree = small_tree();
        let far = BoundingBox::new(Point3::new(300.0, 300.0, 300.0), Point3::new(310.0, 310.0, 310.0));

        assert_eq!(octree.add(9, far).unwrap(), Insertion::Clamped);
        assert!(octree.is_clamped(9));
        assert_eq!(octree.node_of(9), Some(NodeId::ROOT));
        assert_eq!(octree.query_point(Point3::new(305.0, 305.0, 305.0)), vec![9]);
    }

    #[test]
    fn out_of_bounds_insertion_can_be_rejected() {
        let mut octree: Octree<u32> = Octree::new(OctreeSettings {
            out_of_bounds: OutOfBoundsPolicy::Reject,
            ..OctreeSettings::default()
        });
        octree.set_bounding_area(world_area()).unwrap();
        let far = BoundingBox::new(Point3::new(300.0, 300.0, 300.0), Point3::new(310.0, 310.0, 310.0));

        let result = octree.add(9, far);
        assert!(matches!(result, Err(EngineError::OutOfBoundsInsertion { .. })));
        assert!(!octree.contains(9));
    }

    #[test]
    fn duplicate_add_is_an_error() {
        let mut octree = small_tree();
        octree.add(1, unit_at(1.0, 1.0, 1.0)).unwrap();
        assert!(matches!(
            octree.add(1, unit_at(5.0, 5.0, 5.0)),
            Err(EngineError::AlreadyTracked(_))
        ));
    }

    #[test]
    fn update_tree_follows_moving_objects() {
        let mut octree = small_tree();
        let mut objects = Bounds::new();
        for (key, x) in [(1, 1.0), (2, 10.0), (3, 20.0), (4, 200.0)] {
            objects.insert(key, unit_at(x, 1.0, 1.0));
            octree.add(key, objects[&key]).unwrap();
        }

        objects.insert(1, unit_at(250.0, 250.0, 250.0));
        let stats = octree.update_tree(&objects);
        assert!(stats.reassigned >= 1);
        assert_containment(&octree, &objects);
        assert_eq!(octree.query_point(Point3::new(250.5, 250.5, 250.5)), vec![1]);
        assert!(octree.query_point(Point3::new(1.5, 1.5, 1.5)).is_empty());
    }

    #[test]
    fn update_tree_is_idempotent() {
        let mut octree = small_tree();
        let mut objects = Bounds::new();
        for key in 0..20u32 {
            let offset = key as f32 * 11.0;
            objects.insert(key, unit_at(offset, offset, 255.0 - offset));
            octree.add(key, objects[&key]).unwrap();
        }
        for key in 0..10u32 {
            objects.insert(key, unit_at(3.0 + key as f32, 100.0, 7.0));
        }

        let first = octree.update_tree(&objects);
        assert!(first.reassigned > 0);
        let second = octree.update_tree(&objects);
        assert_eq!(second, TreeUpdate::default());
        assert_containment(&octree, &objects);
    }

    #[test]
    fn vanished_objects_are_dropped_and_sparse_subtrees_merge() {
        let mut octree = small_tree();
        let mut objects = Bounds::new();
        for key in 0..6u32 {
            objects.insert(key, unit_at(key as f32 * 40.0, 1.0, 1.0));
            octree.add(key, objects[&key]).unwrap();
        }
        assert!(octree.node_count() > 1);

        for key in 0..5u32 {
            objects.remove(&key);
        }
        let stats = octree.update_tree(&objects);
        assert_eq!(stats.removed, 5);
        assert!(stats.merged_nodes > 0);
        assert_eq!(octree.node_count(), 1);
        assert_eq!(octree.len(), 1);
        assert_eq!(octree.node_of(5), Some(NodeId::ROOT));
    }

    #[test]
    fn objects_leaving_the_area_are_clamped_once() {
        let mut octree = small_tree();
        let mut objects = Bounds::new();
        objects.insert(1, unit_at(10.0, 10.0, 10.0));
        octree.add(1, objects[&1]).unwrap();

        objects.insert(1, unit_at(-50.0, 10.0, 10.0));
        assert_eq!(octree.update_tree(&objects).clamped, 1);
        assert_eq!(octree.update_tree(&objects), TreeUpdate::default());
        assert!(octree.is_clamped(1));

        objects.insert(1, unit_at(10.0, 10.0, 10.0));
        octree.update_tree(&objects);
        assert!(!octree.is_clamped(1));
    }

    #[test]
    fn objects_added_before_the_area_are_redistributed() {
        let mut octree: Octree<u32> = Octree::new(OctreeSettings {
            split_threshold: 1,
            ..OctreeSettings::default()
        });
        octree.add(1, unit_at(1.0, 1.0, 1.0)).unwrap();
        octree.add(2, unit_at(200.0, 200.0, 200.0)).unwrap();
        assert_eq!(octree.node_count(), 1);

        octree.set_bounding_area(world_area()).unwrap();
        assert!(octree.node_count() > 1);
        assert_ne!(octree.node_of(1), octree.node_of(2));
    }

    struct Contacts {
        bounds: Bounds,
        seen: HashMap<u32, Vec<u32>>,
    }

    impl SpatialObjects<u32> for Contacts {
        fn spatial_bounds(&self, key: u32) -> Option<BoundingBox> {
            self.bounds.get(&key).copied()
        }
    }

    impl SpatialHooks<u32> for Contacts {
        fn on_spatial_update(&mut self, key: u32, contacts: &[u32]) {
            self.seen.insert(key, contacts.to_vec());
        }
    }

    #[test]
    fn update_reports_overlapping_neighbours() {
        let mut octree = small_tree();
        let mut hooks = Contacts {
            bounds: Bounds::new(),
            seen: HashMap::new(),
        };
        hooks.bounds.insert(1, unit_at(10.0, 10.0, 10.0));
        hooks.bounds.insert(2, BoundingBox::new(Point3::new(10.5, 10.5, 10.5), Point3::new(12.0, 12.0, 12.0)));
        hooks.bounds.insert(3, unit_at(11.0, 10.0, 10.0));
        for (key, bounds) in &hooks.bounds {
            octree.add(*key, *bounds).unwrap();
        }

        assert_eq!(octree.update(&mut hooks), 3);
        assert_eq!(hooks.seen[&1], vec![2]);
        let mut around_two = hooks.seen[&2].clone();
        around_two.sort();
        assert_eq!(around_two, vec![1, 3]);
    }

    #[test]
    fn debug_draw_is_gated_by_the_flag() {
        let mut octree = small_tree();
        for key in 0..4u32 {
            octree.add(key, unit_at(key as f32 * 60.0, 1.0, 1.0)).unwrap();
        }
        let mut renderer = RecordingRenderer::new();

        assert_eq!(octree.draw_debug(&mut renderer, false), 0);
        assert!(renderer.debug_boxes.is_empty());

        let submitted = octree.draw_debug(&mut renderer, true);
        assert_eq!(submitted, octree.node_count());
        assert_eq!(renderer.debug_boxes[0], (world_area(), 0));
    }

    #[test]
    fn draw_skips_objects_without_geometry() {
        let mut octree = small_tree();
        octree.add(1, unit_at(1.0, 1.0, 1.0)).unwrap();
        let objects = Bounds::new();
        let mut renderer = RecordingRenderer::new();

        let stats = octree.draw(&objects, &mut renderer);
        assert_eq!(stats.nodes_visited, 1);
        assert_eq!(stats.objects_submitted, 0);
        assert!(renderer.draw_calls.iter().all(|call: &DrawCall| call.bounds.has_volume()));
    }
}
