use super::collide::*;
use super::error::{Error, Result};
use super::math::*;

/// Child slot of a QBVH node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PackedIdx {
    value: i32
}

impl PackedIdx {
    fn new_joint(idx: u32) -> PackedIdx {
        PackedIdx {
            value: (idx as i32) & !i32::MIN
        }
    }

    fn joint_get_idx(&self) -> u32 {
        debug_assert!(!self.is_leaf());
        self.value as u32
    }

    fn new_empty_leaf() -> PackedIdx {
        PackedIdx {
            value: i32::MIN
        }
    }

    const MAX_IDX: u32 = 8388607;
    const MAX_COUNT: u32 = 255;

    /// Encodes bits as: IsLeaf:[1] Number of primitives:[8] start idx[23]:
    fn new_leaf(idx: u32, count: u32) -> PackedIdx {
        debug_assert!(idx <= PackedIdx::MAX_IDX, "Val: {}, Max: {}", idx, PackedIdx::MAX_IDX);
        debug_assert!(count <= PackedIdx::MAX_COUNT, "Val: {}, Max: {}", count, PackedIdx::MAX_COUNT);

        let packed_idx = ((!0u32 >> 9) & idx) as i32;
        let packed_count = (count << 23) as i32;

        PackedIdx {
            value: i32::MIN | packed_count | packed_idx
        }
    }

    fn is_leaf(&self) -> bool {
        (self.value & i32::MIN) == i32::MIN
    }

    fn is_empty_leaf(&self) -> bool {
        self.value == i32::MIN
    }

    fn leaf_get_idx_count(&self) -> (u32, u32) {
        debug_assert!(self.is_leaf());

        let idx = self.value as u32 & (!0u32 >> 9);
        let count = (self.value & !i32::MIN) >> 23;

        (idx, count as u32)
    }
}

#[cfg(test)]
mod packed_idx_tests {
    use super::*;

    #[test]
    fn test_is_leaf()
    {
        let a = PackedIdx::new_leaf(4023, 15);
        assert!(a.is_leaf());

        let b = PackedIdx::new_empty_leaf();
        assert!(b.is_leaf());

        let c = PackedIdx::new_joint(u32::MAX);
        assert!(!c.is_leaf());

        let d = PackedIdx::new_joint(239);
        assert!(!d.is_leaf());
        assert_eq!(d.joint_get_idx(), 239);
    }

    #[test]
    fn test_get_leaf_data() {
        {
            let x = PackedIdx::new_leaf(4023, 15);
            assert_eq!(x.leaf_get_idx_count(), (4023, 15));
            assert!(!x.is_empty_leaf());
        }
        {
            let x = PackedIdx::new_empty_leaf();
            assert_eq!(x.leaf_get_idx_count(), (0, 0));
        }
        {
            let x = PackedIdx::new_leaf(PackedIdx::MAX_IDX, PackedIdx::MAX_COUNT);
            assert_eq!(x.leaf_get_idx_count(), (PackedIdx::MAX_IDX, PackedIdx::MAX_COUNT));
        }
    }
}

/// A QBVHNode has up to four children that it stores the bounds of, so all four
/// slab tests run over the same arrays.
#[derive(Clone, Debug)]
struct QBVHNode {
    bb_min_x: [f32; 4],
    bb_min_y: [f32; 4],
    bb_min_z: [f32; 4],
    bb_max_x: [f32; 4],
    bb_max_y: [f32; 4],
    bb_max_z: [f32; 4],
    children: [PackedIdx; 4],
}

impl QBVHNode {
    fn new() -> QBVHNode {
        QBVHNode {
            bb_min_x: [0.0; 4],
            bb_min_y: [0.0; 4],
            bb_min_z: [0.0; 4],
            bb_max_x: [0.0; 4],
            bb_max_y: [0.0; 4],
            bb_max_z: [0.0; 4],
            children: [PackedIdx::new_empty_leaf(); 4],
        }
    }

    fn set_child_joint_node(&mut self, child: usize, index: usize) {
        self.children[child] = PackedIdx::new_joint(index as u32)
    }

    fn set_child_leaf_node(&mut self, child: usize, size: usize, index: usize) {
        if size != 0 {
            self.children[child] = PackedIdx::new_leaf(index as u32, size as u32)
        }
        else {
            self.children[child] = PackedIdx::new_empty_leaf()
        }
    }

    fn set_bounds(&mut self, child: usize, bounds: &AABB) {
        self.bb_min_x[child] = bounds.min.x;
        self.bb_min_y[child] = bounds.min.y;
        self.bb_min_z[child] = bounds.min.z;

        self.bb_max_x[child] = bounds.max.x;
        self.bb_max_y[child] = bounds.max.y;
        self.bb_max_z[child] = bounds.max.z;
    }

    /// Slab test against all four children. Empty slots never report a hit.
    fn hit_children(&self, r: Ray, inv_rd: Vec3, t_min: f32, t_max: f32) -> [bool; 4] {
        let mins = [&self.bb_min_x, &self.bb_min_y, &self.bb_min_z];
        let maxs = [&self.bb_max_x, &self.bb_max_y, &self.bb_max_z];

        let mut t_min_4 = [t_min; 4];
        let mut t_max_4 = [t_max; 4];
        for axis in 0..3 {
            let ro = r.origin.at(axis);
            let inv = inv_rd.at(axis);
            for lane in 0..4 {
                let mut t0 = (mins[axis][lane] - ro) * inv;
                let mut t1 = (maxs[axis][lane] - ro) * inv;
                if inv < 0.0 { std::mem::swap(&mut t0, &mut t1); }
                t_min_4[lane] = f32::max(t_min_4[lane], t0);
                t_max_4[lane] = f32::min(t_max_4[lane], t1);
            }
        }

        let mut mask = [false; 4];
        for lane in 0..4 {
            mask[lane] = !self.children[lane].is_empty_leaf() && t_max_4[lane] >= t_min_4[lane];
        }
        mask
    }
}

/// Primitives per leaf at most.
pub const MAX_LEAF_SIZE: usize = 4;

/// Four-wide bounding volume hierarchy over a list of boxes. Leaves refer to
/// positions in the input list, so the same structure serves spheres (bottom
/// level) and instances (top level).
#[derive(Clone, Debug)]
pub struct QBVH {
    tree: Vec<QBVHNode>,
    prim_ids: Vec<u32>,
    bounds: AABB,
}

impl Default for QBVH {
    fn default() -> QBVH {
        QBVH { tree: Vec::new(), prim_ids: Vec::new(), bounds: AABB::EMPTY }
    }
}

fn range_bounds(aabbs: &[AABB], ids: &[u32]) -> AABB {
    ids.iter().fold(AABB::EMPTY, |acc, &id| AABB::merge(&acc, &aabbs[id as usize]))
}

fn pick_split_axis(centers: &[Vec3], ids: &[u32]) -> (Axis, f32) {
    let mut bounds = AABB::EMPTY;
    for &id in ids {
        let c = centers[id as usize];
        bounds = AABB::merge(&bounds, &AABB { min: c, max: c });
    }

    let split_axis = bounds.longest_axis();
    let split_point = (bounds.max_at_axis(split_axis) + bounds.min_at_axis(split_axis)) * 0.5;

    (split_axis, split_point)
}

fn partition(centers: &[Vec3], ids: &mut [u32], axis: Axis, position: f32) -> usize {
    let mut split_idx = 0;
    for i in 0..ids.len() {
        if centers[ids[i] as usize].at(axis as usize) <= position {
            ids.swap(i, split_idx);
            split_idx += 1;
        }
    }

    split_idx
}

impl QBVH {
    pub fn new() -> QBVH {
        QBVH::default()
    }

    /// Builds the hierarchy over `aabbs`. Every box must be valid (`min <= max`).
    pub fn build(aabbs: &[AABB]) -> Result<QBVH> {
        let count = aabbs.len();
        if count > PackedIdx::MAX_IDX as usize + 1 {
            return Err(Error::TooManyPrimitives { count, max: PackedIdx::MAX_IDX as usize + 1 });
        }

        let mut bvh = QBVH::new();
        if count == 0 {
            return Ok(bvh);
        }

        let centers: Vec<Vec3> = aabbs.iter().map(|b| b.get_center()).collect();
        let mut ids: Vec<u32> = (0..count as u32).collect();
        bvh.bounds = range_bounds(aabbs, &ids);
        bvh.build_range(aabbs, &centers, &mut ids, 0, count, -1, 0, 0);
        bvh.prim_ids = ids;

        Ok(bvh)
    }

    fn create_leaf_node(&mut self, start: usize, end: usize, mut parent: i32, child: i32, bounds: &AABB) {
        if parent < 0 { // root is a leaf node
            self.tree.push(QBVHNode::new());
            parent = 0;
        }

        self.tree[parent as usize].set_bounds(child as usize, bounds);
        self.tree[parent as usize].set_child_leaf_node(child as usize, end - start, start);
    }

    fn create_joint_node(&mut self, parent: i32, child: i32, bounds: &AABB) -> i32 {
        let new_node_idx = self.tree.len();
        self.tree.push(QBVHNode::new());

        if parent >= 0 {
            self.tree[parent as usize].set_child_joint_node(child as usize, new_node_idx);
            self.tree[parent as usize].set_bounds(child as usize, bounds);
        }

        new_node_idx as i32
    }

    /// Binary split per level; every second level is folded into the parent so
    /// that a node ends up with four children.
    #[allow(clippy::too_many_arguments)]
    fn build_range(&mut self, aabbs: &[AABB], centers: &[Vec3], ids: &mut [u32], start: usize, end: usize, parent: i32, child: i32, depth: u32) {
        let bounds = range_bounds(aabbs, &ids[start..end]);

        if (end - start) <= MAX_LEAF_SIZE {
            self.create_leaf_node(start, end, parent, child, &bounds);
            return;
        }

        let (split_axis, split_point) = pick_split_axis(centers, &ids[start..end]);
        let mut split_idx = start + partition(centers, &mut ids[start..end], split_axis, split_point);
        if split_idx == start || split_idx == end {
            // All centers coincide on the split axis.
            split_idx = start + (end - start) / 2;
        }

        let current; let left; let right;
        if depth % 2 == 1 {
            current = parent;
            left = child;
            right = child + 1;
        }
        else {
            current = self.create_joint_node(parent, child, &bounds);
            left = 0;
            right = 2;
        }

        self.build_range(aabbs, centers, ids, start, split_idx, current, left, depth + 1);
        self.build_range(aabbs, centers, ids, split_idx, end, current, right, depth + 1);
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    pub fn prim_count(&self) -> usize {
        self.prim_ids.len()
    }

    /// Union of all primitive boxes; `AABB::EMPTY` when there are none.
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    /// Finds the closest primitive hit in `[t_min, t_max]`.
    ///
    /// `hit_prim(prim, t_min, closest_t)` tests one primitive and returns its hit
    /// distance and payload. Primitives are visited in a fixed order and a hit
    /// only replaces the current one when strictly closer, so equal distances
    /// resolve the same way on every call.
    pub fn traverse<H, F>(&self, r: Ray, t_min: f32, t_max: f32, mut hit_prim: F) -> Option<H>
    where
        F: FnMut(u32, f32, f32) -> Option<(f32, H)>,
    {
        if self.tree.is_empty() {
            return None;
        }

        let inv_rd = 1.0 / r.direction;
        let mut best: Option<(f32, H)> = None;
        self.hit_world(0, r, inv_rd, t_min, t_max, &mut hit_prim, &mut best);
        best.map(|(_, h)| h)
    }

    #[allow(clippy::too_many_arguments)]
    fn hit_world<H, F>(&self, node_idx: usize, r: Ray, inv_rd: Vec3, t_min: f32, t_max: f32, hit_prim: &mut F, best: &mut Option<(f32, H)>)
    where
        F: FnMut(u32, f32, f32) -> Option<(f32, H)>,
    {
        let node = &self.tree[node_idx];
        let closest = |best: &Option<(f32, H)>| best.as_ref().map_or(t_max, |(t, _)| *t);

        let hit_mask = node.hit_children(r, inv_rd, t_min, closest(best));
        for (child, &was_hit) in hit_mask.iter().enumerate() {
            if !was_hit {
                continue;
            }

            let slot = node.children[child];
            if slot.is_leaf() {
                let (first, count) = slot.leaf_get_idx_count();
                let (first, count) = (first as usize, count as usize);
                for &prim in &self.prim_ids[first..first + count] {
                    if let Some((t, payload)) = hit_prim(prim, t_min, closest(best)) {
                        let closer = best.as_ref().map_or(true, |(best_t, _)| t < *best_t);
                        if closer {
                            *best = Some((t, payload));
                        }
                    }
                }
            }
            else {
                self.hit_world(slot.joint_get_idx() as usize, r, inv_rd, t_min, t_max, hit_prim, best);
            }
        }
    }

    /// Primitive ids in leaf order, for checking that every primitive is reachable.
    #[cfg(test)]
    fn leaf_prims(&self) -> Vec<u32> {
        let mut out = Vec::new();
        for node in &self.tree {
            for slot in node.children.iter() {
                if slot.is_leaf() && !slot.is_empty_leaf() {
                    let (first, count) = slot.leaf_get_idx_count();
                    out.extend_from_slice(&self.prim_ids[first as usize..(first + count) as usize]);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vec3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_spheres(rng: &mut StdRng, n: usize) -> Vec<Sphere> {
        (0..n)
            .map(|_| Sphere::new(
                vec3![rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0)],
                rng.gen_range(0.1..2.0),
            ))
            .collect()
    }

    fn brute_force(spheres: &[Sphere], r: Ray, t_min: f32, t_max: f32) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, s) in spheres.iter().enumerate() {
            if let Some(hit) = hit_sphere(r, s.center, s.radius, t_min, t_max) {
                if best.map_or(true, |(_, t)| hit.t < t) {
                    best = Some((i, hit.t));
                }
            }
        }
        best
    }

    fn trace(bvh: &QBVH, spheres: &[Sphere], r: Ray, t_min: f32, t_max: f32) -> Option<(usize, f32)> {
        bvh.traverse(r, t_min, t_max, |prim, lo, hi| {
            let s = spheres[prim as usize];
            hit_sphere(r, s.center, s.radius, lo, hi).map(|hit| (hit.t, (prim as usize, hit.t)))
        })
    }

    #[test]
    fn test_empty_build_never_hits() {
        let bvh = QBVH::build(&[]).unwrap();
        assert!(bvh.is_empty());
        assert_eq!(bvh.bounds(), AABB::EMPTY);
        let r = Ray::new(vec3![0.0], vec3![0.0, 0.0, -1.0]);
        assert!(bvh.traverse(r, 0.0, f32::MAX, |_, _, _| Some((1.0, ()))).is_none());
    }

    #[test]
    fn test_small_build_is_single_leaf() {
        let spheres = [Sphere::new(vec3![0.0, 0.0, -1.0], 0.5)];
        let aabbs: Vec<AABB> = spheres.iter().map(|s| s.calc_aabb()).collect();
        let bvh = QBVH::build(&aabbs).unwrap();
        assert_eq!(bvh.node_count(), 1);
        assert_eq!(bvh.bounds(), aabbs[0]);

        let r = Ray::new(vec3![0.0], vec3![0.0, 0.0, -1.0]);
        let (prim, t) = trace(&bvh, &spheres, r, 0.0, f32::MAX).unwrap();
        assert_eq!(prim, 0);
        assert!((t - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_every_primitive_is_in_exactly_one_leaf() {
        let mut rng = StdRng::seed_from_u64(1);
        for &n in [5usize, 17, 64, 333].iter() {
            let spheres = random_spheres(&mut rng, n);
            let aabbs: Vec<AABB> = spheres.iter().map(|s| s.calc_aabb()).collect();
            let bvh = QBVH::build(&aabbs).unwrap();
            let mut prims = bvh.leaf_prims();
            prims.sort_unstable();
            assert_eq!(prims, (0..n as u32).collect::<Vec<_>>());
            assert_eq!(bvh.prim_count(), n);
        }
    }

    #[test]
    fn test_coincident_centers_still_split() {
        let aabbs = vec![AABB { min: vec3![-1.0], max: vec3![1.0] }; 40];
        let bvh = QBVH::build(&aabbs).unwrap();
        let mut prims = bvh.leaf_prims();
        prims.sort_unstable();
        assert_eq!(prims.len(), 40);
        assert!(bvh.node_count() > 1);
    }

    #[test]
    fn test_traversal_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(99);
        let spheres = random_spheres(&mut rng, 200);
        let aabbs: Vec<AABB> = spheres.iter().map(|s| s.calc_aabb()).collect();
        let bvh = QBVH::build(&aabbs).unwrap();

        for _ in 0..2_000 {
            let origin = vec3![rng.gen_range(-30.0..30.0), rng.gen_range(-30.0..30.0), rng.gen_range(-30.0..30.0)];
            let target = vec3![rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0)];
            let r = Ray::new(origin, target - origin);

            let expected = brute_force(&spheres, r, 0.001, f32::MAX);
            let actual = trace(&bvh, &spheres, r, 0.001, f32::MAX);
            match (expected, actual) {
                (None, None) => {}
                (Some((_, te)), Some((_, ta))) => assert!((te - ta).abs() < 1e-5, "{} vs {}", te, ta),
                other => panic!("mismatch: {:?}", other),
            }
        }
    }

    #[test]
    fn test_equal_distance_ties_are_deterministic() {
        let spheres = vec![Sphere::new(vec3![0.0, 0.0, -3.0], 1.0); 12];
        let aabbs: Vec<AABB> = spheres.iter().map(|s| s.calc_aabb()).collect();
        let bvh = QBVH::build(&aabbs).unwrap();
        let r = Ray::new(vec3![0.0], vec3![0.0, 0.0, -1.0]);

        let first = trace(&bvh, &spheres, r, 0.0, f32::MAX).unwrap();
        for _ in 0..10 {
            assert_eq!(trace(&bvh, &spheres, r, 0.0, f32::MAX).unwrap(), first);
        }
        let rebuilt = QBVH::build(&aabbs).unwrap();
        assert_eq!(trace(&rebuilt, &spheres, r, 0.0, f32::MAX).unwrap(), first);
    }
}
