//! 2D k-d tree over projected samples
//!
//! Nearest and radius queries used by IDW and blanking.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use super::PlanarPoint;

/// A 2D k-d tree for spatial queries on planar points.
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<PlanarPoint>,
}

#[derive(Debug)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split axis: 0 = x, 1 = y
    axis: u8,
    left: Option<usize>,
    right: Option<usize>,
}

/// Result of a nearest-neighbor query
#[derive(Debug, Clone, Copy)]
pub struct NearestResult {
    pub point: PlanarPoint,
    pub distance_sq: f64,
    /// Index into the slice the tree was built from
    pub index: usize,
}

/// Best match so far during a query
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance_sq: f64,
    index: usize,
}

impl KdTree {
    /// Build a tree from points. O(n log n) with median splits.
    pub fn build(points: &[PlanarPoint]) -> Self {
        let mut nodes = Vec::with_capacity(points.len());
        if !points.is_empty() {
            let mut indices: Vec<usize> = (0..points.len()).collect();
            build_recursive(points, &mut indices, 0, &mut nodes);
        }
        Self {
            nodes,
            points: points.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closest point to (qx, qy), `None` for an empty tree.
    pub fn nearest(&self, qx: f64, qy: f64) -> Option<NearestResult> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best = Candidate {
            distance_sq: f64::INFINITY,
            index: 0,
        };
        self.nearest_recursive(0, qx, qy, &mut best);
        Some(self.result(best))
    }

    /// All points within `radius` of (qx, qy), in no particular order.
    pub fn within_radius(&self, qx: f64, qy: f64, radius: f64) -> Vec<NearestResult> {
        let mut out = Vec::new();
        if !self.nodes.is_empty() && radius > 0.0 {
            self.radius_recursive(0, qx, qy, radius * radius, &mut out);
        }
        out
    }

    fn result(&self, c: Candidate) -> NearestResult {
        NearestResult {
            point: self.points[c.index],
            distance_sq: c.distance_sq,
            index: c.index,
        }
    }

    /// Signed distance from the query to the node's split plane, and the
    /// squared distance to the node's point.
    #[inline]
    fn split_distance(&self, node: &KdNode, qx: f64, qy: f64) -> (f64, f64) {
        let p = &self.points[node.point_idx];
        let diff = if node.axis == 0 { qx - p.x } else { qy - p.y };
        (diff, p.dist_sq(qx, qy))
    }

    /// Children ordered near side first
    #[inline]
    fn sides(node: &KdNode, diff: f64) -> (Option<usize>, Option<usize>) {
        if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        }
    }

    fn nearest_recursive(&self, node_idx: usize, qx: f64, qy: f64, best: &mut Candidate) {
        let node = &self.nodes[node_idx];
        let (diff, dist_sq) = self.split_distance(node, qx, qy);
        if dist_sq < best.distance_sq {
            *best = Candidate {
                distance_sq: dist_sq,
                index: node.point_idx,
            };
        }

        let (near, far) = Self::sides(node, diff);
        if let Some(child) = near {
            self.nearest_recursive(child, qx, qy, best);
        }
        if diff * diff < best.distance_sq {
            if let Some(child) = far {
                self.nearest_recursive(child, qx, qy, best);
            }
        }
    }

    fn radius_recursive(
        &self,
        node_idx: usize,
        qx: f64,
        qy: f64,
        radius_sq: f64,
        out: &mut Vec<NearestResult>,
    ) {
        let node = &self.nodes[node_idx];
        let (diff, dist_sq) = self.split_distance(node, qx, qy);
        if dist_sq <= radius_sq {
            out.push(self.result(Candidate {
                distance_sq: dist_sq,
                index: node.point_idx,
            }));
        }

        let (near, far) = Self::sides(node, diff);
        if let Some(child) = near {
            self.radius_recursive(child, qx, qy, radius_sq, out);
        }
        if diff * diff <= radius_sq {
            if let Some(child) = far {
                self.radius_recursive(child, qx, qy, radius_sq, out);
            }
        }
    }
}

fn build_recursive(
    points: &[PlanarPoint],
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let axis = (depth % 2) as u8;
    let coord = |i: usize| if axis == 0 { points[i].x } else { points[i].y };

    let median = indices.len() / 2;
    indices.select_nth_unstable_by(median, |&a, &b| coord(a).total_cmp(&coord(b)));

    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx: indices[median],
        axis,
        left: None,
        right: None,
    });

    let (lower, rest) = indices.split_at_mut(median);
    let upper = &mut rest[1..];
    if !lower.is_empty() {
        let left = build_recursive(points, lower, depth + 1, nodes);
        nodes[node_idx].left = Some(left);
    }
    if !upper.is_empty() {
        let right = build_recursive(points, upper, depth + 1, nodes);
        nodes[node_idx].right = Some(right);
    }

    node_idx
}
