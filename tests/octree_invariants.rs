use std::collections::HashMap;

use cgmath::Point3;
use voxel_world::{
    engine_state::spatial::{
        BoundingBox, Insertion, Octree, OctreeSettings, OutOfBoundsPolicy, SpatialObjects,
    },
    EngineError,
};

/// Boxes keyed by id, standing in for the world graph.
#[derive(Default)]
struct Boxes(HashMap<u32, BoundingBox>);

impl SpatialObjects<u32> for Boxes {
    fn spatial_bounds(&self, key: u32) -> Option<BoundingBox> {
        self.0.get(&key).copied()
    }
}

fn unit_box(x: f32, y: f32, z: f32) -> BoundingBox {
    BoundingBox::new(Point3::new(x, y, z), Point3::new(x + 1.0, y + 1.0, z + 1.0))
}

fn area() -> BoundingBox {
    BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(256.0, 256.0, 256.0))
}

fn populated(settings: OctreeSettings) -> (Octree<u32>, Boxes) {
    let mut octree = Octree::new(settings);
    octree.set_bounding_area(area()).unwrap();
    let mut boxes = Boxes::default();
    let mut rng = fastrand::Rng::with_seed(1299);
    for key in 0..200 {
        let bounds = unit_box(
            rng.u32(0..250) as f32,
            rng.u32(0..250) as f32,
            rng.u32(0..250) as f32,
        );
        boxes.0.insert(key, bounds);
        octree.add(key, bounds).unwrap();
    }
    (octree, boxes)
}

fn assert_contained(octree: &Octree<u32>, boxes: &Boxes) {
    for (key, bounds) in &boxes.0 {
        if octree.is_clamped(*key) {
            continue;
        }
        let node = octree.node_of(*key).unwrap();
        assert!(
            octree.node_region(node).unwrap().contains(bounds),
            "object {} escaped its node",
            key
        );
    }
}

#[test]
fn every_object_is_reachable_by_its_own_bounds() {
    let (octree, boxes) = populated(OctreeSettings::default());
    assert!(octree.node_count() > 1);
    for (key, bounds) in &boxes.0 {
        let found = octree.query_overlaps(bounds);
        assert_eq!(found.iter().filter(|k| *k == key).count(), 1);
    }
    assert_contained(&octree, &boxes);
}

#[test]
fn moved_objects_stay_contained_and_updates_settle() {
    let (mut octree, mut boxes) = populated(OctreeSettings::default());
    let mut rng = fastrand::Rng::with_seed(58230947);
    for bounds in boxes.0.values_mut() {
        *bounds = unit_box(
            rng.u32(0..250) as f32,
            rng.u32(0..250) as f32,
            rng.u32(0..250) as f32,
        );
    }

    let first = octree.update_tree(&boxes);
    assert!(first.reassigned > 0);
    assert_contained(&octree, &boxes);

    let nodes = octree.node_count();
    let second = octree.update_tree(&boxes);
    assert_eq!(second.reassigned, 0);
    assert_eq!(second.split_nodes, 0);
    assert_eq!(second.merged_nodes, 0);
    assert_eq!(octree.node_count(), nodes);
}

#[test]
fn vanished_objects_are_dropped_and_the_tree_shrinks() {
    let (mut octree, mut boxes) = populated(OctreeSettings::default());
    let grown = octree.node_count();
    boxes.0.retain(|key, _| *key < 3);

    let update = octree.update_tree(&boxes);
    assert_eq!(update.removed, 197);
    assert_eq!(octree.len(), 3);
    assert!(octree.node_count() < grown);
    assert!(update.merged_nodes > 0);
}

#[test]
fn out_of_area_insertion_follows_the_policy() {
    let far = BoundingBox::new(
        Point3::new(300.0, 300.0, 300.0),
        Point3::new(310.0, 310.0, 310.0),
    );

    let mut clamping = Octree::new(OctreeSettings::default());
    clamping.set_bounding_area(area()).unwrap();
    assert_eq!(clamping.add(1, far).unwrap(), Insertion::Clamped);
    assert!(clamping.is_clamped(1));
    assert_eq!(clamping.query_overlaps(&far), vec![1]);

    let mut rejecting = Octree::new(OctreeSettings {
        out_of_bounds: OutOfBoundsPolicy::Reject,
        ..OctreeSettings::default()
    });
    rejecting.set_bounding_area(area()).unwrap();
    assert!(matches!(
        rejecting.add(1, far),
        Err(EngineError::OutOfBoundsInsertion { .. })
    ));
    assert!(rejecting.is_empty());
}

#[test]
fn objects_on_split_planes_are_stored_once() {
    let mut octree = Octree::new(OctreeSettings {
        split_threshold: 1,
        ..OctreeSettings::default()
    });
    octree.set_bounding_area(area()).unwrap();

    // max on the plane: lower octant; min on the plane: upper octant
    let lower = BoundingBox::new(Point3::new(120.0, 120.0, 120.0), Point3::new(128.0, 128.0, 128.0));
    let upper = BoundingBox::new(Point3::new(128.0, 128.0, 128.0), Point3::new(136.0, 136.0, 136.0));
    let straddling = BoundingBox::new(Point3::new(127.0, 10.0, 10.0), Point3::new(129.0, 11.0, 11.0));
    octree.add(1, lower).unwrap();
    octree.add(2, upper).unwrap();
    octree.add(3, straddling).unwrap();

    let lower_region = octree.node_region(octree.node_of(1).unwrap()).unwrap();
    let upper_region = octree.node_region(octree.node_of(2).unwrap()).unwrap();
    assert!(lower_region.max.x <= 128.0);
    assert!(upper_region.min.x >= 128.0);

    let straddling_region = octree.node_region(octree.node_of(3).unwrap()).unwrap();
    assert!(straddling_region.min.x < 128.0 && straddling_region.max.x > 128.0);

    let everything = octree.query_overlaps(&area());
    assert_eq!(everything.len(), 3);
}
