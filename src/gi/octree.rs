//! Octree of irradiance samples. Each sample is valid within a radius proportional to the
//! harmonic mean distance of the surfaces it saw; lookups blend every valid sample near a point.

use cgmath::{InnerSpace, MetricSpace};

use crate::{clamp, Bounds3f, Float, Point3f, Vec3f};
use crate::id_arena::{Id, IdArena};
use crate::spectrum::Spectrum;

/// Root side length relative to the largest scene extent, so points on the bounds are inside.
const ROOT_SCALE: Float = 1.0001;

/// Upper bound on a single sample's interpolation weight.
const MAX_WEIGHT: Float = 1.0e10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IrradianceSample {
    pub p: Point3f,
    pub n: Vec3f,
    pub inv_r0: Float,
    pub irr: Spectrum,
}

impl IrradianceSample {
    pub fn new(p: Point3f, n: Vec3f, r0: Float, irr: Spectrum) -> Self {
        Self {
            p,
            n: n.normalize(),
            inv_r0: 1.0 / r0,
            irr,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OctreeNode {
    center: Point3f,
    side_length: Float,
    half_side_length: Float,
    quad_side_length: Float,
    children: [Option<Id<OctreeNode>>; 8],
    samples: Vec<IrradianceSample>,
}

impl OctreeNode {
    fn new(center: Point3f, side_length: Float) -> Self {
        Self {
            center,
            side_length,
            half_side_length: 0.5 * side_length,
            quad_side_length: 0.25 * side_length,
            children: [None; 8],
            samples: Vec::new(),
        }
    }

    pub fn center(&self) -> Point3f {
        self.center
    }

    pub fn side_length(&self) -> Float {
        self.side_length
    }

    pub fn samples(&self) -> &[IrradianceSample] {
        &self.samples
    }

    fn is_inside(&self, p: Point3f) -> bool {
        (p.x - self.center.x).abs() < self.half_side_length
            && (p.y - self.center.y).abs() < self.half_side_length
            && (p.z - self.center.z).abs() < self.half_side_length
    }

    /// Whether a lookup at `p` may find samples in this node.
    fn overlaps(&self, p: Point3f, parent_half_side: Float) -> bool {
        (self.center.x - p.x).abs() <= parent_half_side
            && (self.center.y - p.y).abs() <= parent_half_side
            && (self.center.z - p.z).abs() <= parent_half_side
    }

    fn octant(&self, p: Point3f) -> usize {
        let mut k = 0;
        if p.x > self.center.x { k |= 1; }
        if p.y > self.center.y { k |= 2; }
        if p.z > self.center.z { k |= 4; }
        k
    }

    fn child(&self, k: usize) -> OctreeNode {
        let offset = |bit: usize| if k & bit == 0 { -self.quad_side_length } else { self.quad_side_length };
        let c = Point3f::new(
            self.center.x + offset(1),
            self.center.y + offset(2),
            self.center.z + offset(4),
        );
        OctreeNode::new(c, self.half_side_length)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheSettings {
    pub tolerance: Float,
    pub min_spacing: Float,
    pub max_spacing: Float,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            tolerance: 0.05,
            min_spacing: 0.05,
            max_spacing: 5.0,
        }
    }
}

pub struct Octree {
    nodes: IdArena<OctreeNode>,
    root: Id<OctreeNode>,
    settings: CacheSettings,
    num_samples: usize,
}

impl Octree {
    pub fn new(bounds: Bounds3f, settings: CacheSettings) -> Self {
        let mut nodes = IdArena::new();
        let root = nodes.insert(OctreeNode::new(bounds.center(), ROOT_SCALE * bounds.max_extent()));
        Self {
            nodes,
            root,
            settings,
            num_samples: 0,
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn root(&self) -> &OctreeNode {
        &self.nodes[self.root]
    }

    pub fn len(&self) -> usize {
        self.num_samples
    }

    pub fn is_empty(&self) -> bool {
        self.num_samples == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &OctreeNode> {
        self.nodes.iter()
    }

    /// The validity radius a sample with harmonic mean distance `r0` is stored with: scaled by
    /// the tolerance, clamped to the spacing limits, then unscaled.
    pub fn clamp_radius(&self, r0: Float) -> Float {
        let CacheSettings { tolerance, min_spacing, max_spacing } = self.settings;
        clamp(r0 * tolerance, min_spacing, max_spacing) / tolerance
    }

    /// Store a sample. Points outside the root are kept in the root's own list. Does nothing when
    /// caching is disabled by a non-positive tolerance.
    pub fn insert(&mut self, p: Point3f, n: Vec3f, r0: Float, irr: Spectrum) {
        let tolerance = self.settings.tolerance;
        if !(tolerance > 0.0) {
            return;
        }
        let r0 = self.clamp_radius(r0);

        let mut id = self.root;
        if self.nodes[id].is_inside(p) {
            while self.nodes[id].side_length >= 4.0 * r0 * tolerance {
                let node = &self.nodes[id];
                let k = node.octant(p);
                id = match node.children[k] {
                    Some(child) => child,
                    None => {
                        let child = node.child(k);
                        let child_id = self.nodes.insert(child);
                        self.nodes[id].children[k] = Some(child_id);
                        child_id
                    }
                };
            }
        }
        self.nodes[id].samples.push(IrradianceSample::new(p, n, r0, irr));
        self.num_samples += 1;
    }

    /// Weighted average of the samples valid at `(p, n)`, or `None` if there are none.
    pub fn lookup(&self, p: Point3f, n: Vec3f) -> Option<Spectrum> {
        if !(self.settings.tolerance > 0.0) {
            return None;
        }
        let mut irr = Spectrum::black();
        let weight = self.find(self.root, p, n, &mut irr);
        if weight > 0.0 {
            Some(irr / weight)
        } else {
            None
        }
    }

    /// Accumulate weighted irradiance from `id` and its overlapping children into `irr`,
    /// returning the total weight added.
    fn find(&self, id: Id<OctreeNode>, p: Point3f, n: Vec3f, irr: &mut Spectrum) -> Float {
        let CacheSettings { tolerance, min_spacing, max_spacing } = self.settings;
        let node = &self.nodes[id];
        let mut weight = 0.0;
        for s in &node.samples {
            let c2 = 1.0 - n.dot(s.n);
            let d2 = p.distance2(s.p);
            if c2 > tolerance * tolerance || d2 > max_spacing * max_spacing {
                continue;
            }
            let inv_wi = d2.sqrt() * s.inv_r0 + c2.max(0.0).sqrt();
            if inv_wi < tolerance || d2 < min_spacing * min_spacing {
                let wi = MAX_WEIGHT.min(1.0 / inv_wi);
                *irr += s.irr * wi;
                weight += wi;
            }
        }
        for child in node.children.iter().flatten() {
            if self.nodes[*child].overlaps(p, node.half_side_length) {
                weight += self.find(*child, p, n, irr);
            }
        }
        weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn unit_tree(settings: CacheSettings) -> Octree {
        Octree::new(bounds3f!((-1, -1, -1), (1, 1, 1)), settings)
    }

    #[test]
    fn test_root_covers_bounds() {
        let tree = unit_tree(CacheSettings::default());
        assert_eq!(tree.root().center(), point3f!(0, 0, 0));
        assert_relative_eq!(tree.root().side_length(), 2.0002);
        assert!(tree.root().is_inside(point3f!(1, -1, 1)));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_insert_then_lookup() {
        let mut tree = unit_tree(CacheSettings::default());
        let irr = Spectrum::from([0.1, 0.2, 0.3]);
        tree.insert(point3f!(0.3, 0.3, -1), vec3f!(0, 0, 1), 1.0, irr);
        assert_eq!(tree.len(), 1);

        let mut acc = Spectrum::black();
        let weight = tree.find(tree.root, point3f!(0.3, 0.3, -1), vec3f!(0, 0, 1), &mut acc);
        assert!(weight > 0.0);
        assert_eq!(weight, MAX_WEIGHT);
        let found = tree.lookup(point3f!(0.3, 0.3, -1), vec3f!(0, 0, 1)).unwrap();
        assert_relative_eq!(found[2], 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_miss_on_empty_and_far() {
        let mut tree = unit_tree(CacheSettings::default());
        assert!(tree.lookup(point3f!(0, 0, 0), vec3f!(0, 0, 1)).is_none());

        tree.insert(point3f!(0, 0, -1), vec3f!(0, 0, 1), 1.0, Spectrum::white());
        // wrong orientation
        assert!(tree.lookup(point3f!(0, 0, -1), vec3f!(1, 0, 0)).is_none());
        // outside the validity radius: r0 = 1, tolerance 0.05
        assert!(tree.lookup(point3f!(0.5, 0, -1), vec3f!(0, 0, 1)).is_none());
        // inside the minimum spacing always interpolates
        assert!(tree.lookup(point3f!(0.04, 0, -1), vec3f!(0, 0, 1)).is_some());
    }

    #[test]
    fn test_blends_neighbours() {
        let mut tree = unit_tree(CacheSettings::default());
        tree.insert(point3f!(-0.02, 0, -1), vec3f!(0, 0, 1), 1.0, Spectrum::uniform(1.0));
        tree.insert(point3f!(0.02, 0, -1), vec3f!(0, 0, 1), 1.0, Spectrum::uniform(3.0));
        // equidistant from both samples
        let v = tree.lookup(point3f!(0, 0, -1), vec3f!(0, 0, 1)).unwrap();
        assert_relative_eq!(v[0], 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_small_radius_descends() {
        let settings = CacheSettings { tolerance: 0.5, min_spacing: 0.01, max_spacing: 5.0 };
        let mut tree = unit_tree(settings);
        // r0 = 0 clamps to min_spacing / tolerance = 0.02, descent stops below a side of 0.04
        tree.insert(point3f!(0.9, 0.9, 0.9), vec3f!(0, 0, 1), 0.0, Spectrum::white());
        assert!(tree.node_count() > 1);
        let leaf = tree.nodes().find(|n| !n.samples().is_empty()).unwrap();
        assert!(leaf.side_length() < 4.0 * 0.02 * 0.5);
        assert!(leaf.side_length() * 2.0 >= 4.0 * 0.02 * 0.5);
        assert!(leaf.is_inside(point3f!(0.9, 0.9, 0.9)));
        assert!(tree.root().samples().is_empty());

        // the lookup reaches it through the child links
        assert!(tree.lookup(point3f!(0.9, 0.9, 0.9), vec3f!(0, 0, 1)).is_some());
    }

    #[test]
    fn test_outside_root_stays_at_root() {
        let mut tree = unit_tree(CacheSettings::default());
        tree.insert(point3f!(3, 0, 0), vec3f!(0, 0, 1), 0.0, Spectrum::white());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root().samples().len(), 1);
        assert!(tree.lookup(point3f!(3, 0, 0), vec3f!(0, 0, 1)).is_some());
    }

    #[test]
    fn test_disabled_cache() {
        let settings = CacheSettings { tolerance: 0.0, ..CacheSettings::default() };
        let mut tree = unit_tree(settings);
        tree.insert(point3f!(0, 0, 0), vec3f!(0, 0, 1), 1.0, Spectrum::white());
        assert!(tree.is_empty());
        assert!(tree.lookup(point3f!(0, 0, 0), vec3f!(0, 0, 1)).is_none());
    }

    #[test]
    fn test_clamp_extremes() {
        let tree = unit_tree(CacheSettings::default());
        assert_relative_eq!(tree.clamp_radius(0.0) * 0.05, 0.05);
        assert_relative_eq!(tree.clamp_radius(Float::INFINITY) * 0.05, 5.0);
    }

    proptest! {
        #[test]
        fn test_clamped_radius_within_spacing(
            r0 in prop_oneof![Just(0.0f32), Just(Float::INFINITY), 0.0f32..1.0e6],
            tolerance in 0.001f32..1.0,
            min_spacing in 0.001f32..1.0,
            extra in 0.0f32..10.0,
        ) {
            let settings = CacheSettings { tolerance, min_spacing, max_spacing: min_spacing + extra };
            let tree = unit_tree(settings);
            let r = tree.clamp_radius(r0) * tolerance;
            let slack = 1e-4 * settings.max_spacing;
            prop_assert!(r >= settings.min_spacing - slack && r <= settings.max_spacing + slack,
                         "{} outside [{}, {}]", r, settings.min_spacing, settings.max_spacing);
        }
    }
}
