use itertools::Itertools;
use nalgebra::{Point3, Vector3};

const LEAF_TRIANGLES: usize = 50;
const SPLIT_MARGIN: f64 = 0.005;
const MAX_DEPTH: u32 = 24;

#[derive(Copy, Clone, Debug)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for point in points {
            bounds.min.x = bounds.min.x.min(point.x);
            bounds.min.y = bounds.min.y.min(point.y);
            bounds.min.z = bounds.min.z.min(point.z);

            bounds.max.x = bounds.max.x.max(point.x);
            bounds.max.y = bounds.max.y.max(point.y);
            bounds.max.z = bounds.max.z.max(point.z);
        }
        Some(bounds)
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        self.min.x <= point.x
            && point.x <= self.max.x
            && self.min.y <= point.y
            && point.y <= self.max.y
            && self.min.z <= point.z
            && point.z <= self.max.z
    }

    // Midpoint split along one axis. Both halves are widened slightly so
    // triangles sitting exactly on the split plane land in a child.
    fn half_split(&self, axis: usize) -> (Self, Self) {
        let mid = (self.min[axis] + self.max[axis]) / 2.0;
        let margin = (self.max[axis] - self.min[axis]) * SPLIT_MARGIN;

        let mut left = *self;
        left.max[axis] = mid + margin;
        let mut right = *self;
        right.min[axis] = mid - margin;

        (left, right)
    }

    pub fn intersects_ray(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> bool {
        let translated_center = nalgebra::center(&self.min, &self.max) - origin;
        let half = (self.max - self.min) / 2.0;
        let half = half.component_mul(&direction.map(f64::signum));

        let d_near = (translated_center.x - half.x) / direction.x;
        let d_far = (translated_center.x + half.x) / direction.x;
        let dy_near = (translated_center.y - half.y) / direction.y;
        let dy_far = (translated_center.y + half.y) / direction.y;

        if dy_far < d_near || d_far < dy_near {
            return false;
        }

        let d_near = if dy_near > d_near { dy_near } else { d_near };
        let d_far = if d_far > dy_far { dy_far } else { d_far };

        let dz_near = (translated_center.z - half.z) / direction.z;
        let dz_far = (translated_center.z + half.z) / direction.z;

        if dz_far < d_near || d_far < dz_near {
            return false;
        }

        let d_near = if dz_near > d_near { dz_near } else { d_near };
        let d_far = if d_far > dz_far { dz_far } else { d_far };

        if d_near < 0.0 && d_far < 0.0 {
            return false;
        }

        true
    }
}

#[derive(Debug)]
enum NodeKind {
    Branch { left: usize, right: usize },
    Leaf(Vec<u32>),
}

#[derive(Debug)]
struct TreeNode {
    bounds: BoundingBox,
    kind: NodeKind,
}

/// Spatial index over a mesh's triangles.
///
/// Nodes live in a flat arena and refer to their children by index; leaves
/// hold triangle indices. Built once at mesh load time, read-only during
/// traversal, so concurrent ray queries need no synchronization.
#[derive(Debug)]
pub struct BoundingTree {
    nodes: Vec<TreeNode>,
}

impl BoundingTree {
    pub fn build(positions: &[Point3<f64>], triangles: &[[u32; 3]]) -> Option<Self> {
        if triangles.is_empty() {
            return None;
        }
        let bounds = BoundingBox::from_points(positions.iter().copied())?;

        let indices: Vec<u32> = (0..triangles.len() as u32).collect();
        let mut nodes = Vec::new();
        build_node(&mut nodes, positions, triangles, bounds, indices, 0, 0);

        Some(Self { nodes })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Triangle indices of every leaf whose box the ray passes through,
    /// merged in ascending order without duplicates.
    pub fn candidates(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Vec<u32> {
        let mut stack = vec![0usize];
        let mut leaves: Vec<&[u32]> = Vec::new();

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bounds.intersects_ray(origin, direction) {
                continue;
            }
            match &node.kind {
                NodeKind::Branch { left, right } => {
                    stack.push(*left);
                    stack.push(*right);
                }
                NodeKind::Leaf(triangles) => leaves.push(triangles),
            }
        }

        // Triangles straddling a split plane are stored in both children;
        // the leaf lists are sorted, so a k-way merge plus dedup gives the
        // candidate set.
        leaves
            .into_iter()
            .map(|leaf| leaf.iter().copied())
            .kmerge()
            .dedup()
            .collect()
    }

    #[cfg(test)]
    fn leaves(&self) -> Vec<(BoundingBox, &[u32])> {
        self.nodes
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Leaf(triangles) => Some((node.bounds, triangles.as_slice())),
                NodeKind::Branch { .. } => None,
            })
            .collect()
    }
}

fn build_node(
    nodes: &mut Vec<TreeNode>,
    positions: &[Point3<f64>],
    triangles: &[[u32; 3]],
    bounds: BoundingBox,
    indices: Vec<u32>,
    axis: usize,
    depth: u32,
) -> usize {
    if indices.len() <= LEAF_TRIANGLES || depth >= MAX_DEPTH {
        nodes.push(TreeNode {
            bounds,
            kind: NodeKind::Leaf(indices),
        });
        return nodes.len() - 1;
    }

    // A triangle belongs to a child when any of its vertices falls inside
    // the child's widened bounds, so it may be duplicated into both.
    let assign = |child: &BoundingBox| -> Vec<u32> {
        indices
            .iter()
            .filter(|&&triangle| {
                triangles[triangle as usize]
                    .iter()
                    .any(|&vertex| child.contains(&positions[vertex as usize]))
            })
            .copied()
            .collect()
    };

    // Splitting cycles X -> Y -> Z. An axis that separates nothing (flat
    // meshes have a zero-extent axis) falls through to the next one.
    let mut split = None;
    for attempt in 0..3 {
        let split_axis = (axis + attempt) % 3;
        let (left_bounds, right_bounds) = bounds.half_split(split_axis);
        let left = assign(&left_bounds);
        let right = assign(&right_bounds);

        if left.len() < indices.len() || right.len() < indices.len() {
            split = Some((split_axis, left_bounds, right_bounds, left, right));
            break;
        }
    }

    let (split_axis, left_bounds, right_bounds, left, right) = match split {
        Some(split) => split,
        None => {
            nodes.push(TreeNode {
                bounds,
                kind: NodeKind::Leaf(indices),
            });
            return nodes.len() - 1;
        }
    };

    let node_index = nodes.len();
    nodes.push(TreeNode {
        bounds,
        kind: NodeKind::Leaf(Vec::new()),
    });

    let next_axis = (split_axis + 1) % 3;
    let left = build_node(nodes, positions, triangles, left_bounds, left, next_axis, depth + 1);
    let right = build_node(
        nodes,
        positions,
        triangles,
        right_bounds,
        right,
        next_axis,
        depth + 1,
    );

    nodes[node_index].kind = NodeKind::Branch { left, right };
    node_index
}
