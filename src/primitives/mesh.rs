use crate::core::{BoundingTree, Material, Transform};
use crate::ray_intersection::Intersection;
use log::error;
use nalgebra::{Point3, Unit, Vector2, Vector3};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tobj::{load_obj, LoadOptions};

// Near-parallel rays make the barycentric solve explode.
const DETERMINANT_EPSILON: f64 = 1e-5;
// Slightly permissive so shared edges do not open into seams.
const BARYCENTRIC_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mesh {
    file: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub material: Arc<Material>,

    #[serde(skip)]
    positions: Vec<Point3<f64>>,
    #[serde(skip)]
    normals: Vec<Vector3<f64>>,
    #[serde(skip)]
    texcoords: Vec<Vector2<f64>>,
    #[serde(skip)]
    triangles: Vec<[u32; 3]>,
    #[serde(skip)]
    tree: Option<BoundingTree>,
}

#[derive(Copy, Clone)]
struct TriangleHit {
    t: f64,
    u: f64,
    v: f64,
    index: usize,
}

impl Mesh {
    pub fn from_buffers(
        positions: Vec<Point3<f64>>,
        normals: Vec<Vector3<f64>>,
        texcoords: Vec<Vector2<f64>>,
        triangles: Vec<[u32; 3]>,
        transform: Transform,
        material: Arc<Material>,
    ) -> Self {
        let mut mesh = Self {
            file: String::new(),
            transform,
            material,
            positions,
            normals,
            texcoords,
            triangles,
            tree: None,
        };
        mesh.finish_load();
        mesh
    }

    pub fn load_assets(&mut self, asset_base: &Path) {
        let options = LoadOptions {
            triangulate: true,
            single_index: true,
            ..LoadOptions::default()
        };

        let models = match load_obj(asset_base.join(&self.file), &options) {
            Ok((models, _)) => models,
            Err(err) => {
                // A mesh that fails to load stays empty and never intersects.
                error!("failed to load mesh {}: {}", self.file, err);
                return;
            }
        };

        for model in &models {
            let mesh = &model.mesh;
            let base = self.positions.len() as u32;

            self.positions.extend(
                mesh.positions
                    .chunks_exact(3)
                    .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64)),
            );
            self.normals.extend(
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64)),
            );
            self.texcoords.extend(
                mesh.texcoords
                    .chunks_exact(2)
                    .map(|uv| Vector2::new(uv[0] as f64, uv[1] as f64)),
            );
            self.triangles.extend(
                mesh.indices
                    .chunks_exact(3)
                    .map(|face| [base + face[0], base + face[1], base + face[2]]),
            );
        }

        self.finish_load();
    }

    fn finish_load(&mut self) {
        if self.normals.len() != self.positions.len() {
            self.compute_vertex_normals();
        }
        if self.texcoords.len() != self.positions.len() {
            self.texcoords = vec![Vector2::zeros(); self.positions.len()];
        }
        self.tree = BoundingTree::build(&self.positions, &self.triangles);
    }

    // Area-weighted vertex normals from face geometry, for meshes without
    // authored normals.
    fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3::zeros(); self.positions.len()];
        for &[i0, i1, i2] in &self.triangles {
            let a = self.positions[i0 as usize];
            let edge1 = self.positions[i1 as usize] - a;
            let edge2 = self.positions[i2 as usize] - a;
            let face_normal = edge1.cross(&edge2);

            normals[i0 as usize] += face_normal;
            normals[i1 as usize] += face_normal;
            normals[i2 as usize] += face_normal;
        }

        self.normals = normals
            .into_iter()
            .map(|normal| {
                if normal.magnitude_squared() > 0.0 {
                    normal.normalize()
                } else {
                    Vector3::y()
                }
            })
            .collect();
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn tree(&self) -> Option<&BoundingTree> {
        self.tree.as_ref()
    }

    /// Intersect with a ray already mapped into object space. Returns the
    /// nearest world-space intersection.
    pub fn intersect(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
        transform: &Transform,
    ) -> Option<Intersection> {
        let mut nearest: Option<TriangleHit> = None;
        let mut consider = |index: usize| {
            if let Some(hit) = self.hit_triangle(index, &origin, &direction) {
                if nearest.map_or(true, |nearest| hit.t < nearest.t) {
                    nearest = Some(hit);
                }
            }
        };

        match &self.tree {
            Some(tree) => {
                for index in tree.candidates(&origin, &direction) {
                    consider(index as usize);
                }
            }
            None => {
                for index in 0..self.triangles.len() {
                    consider(index);
                }
            }
        }

        let TriangleHit { t, u, v, index } = nearest?;
        let [i0, i1, i2] = self.triangles[index];
        let w = 1.0 - u - v;

        let hit = origin + direction * t;
        let normal = self.normals[i0 as usize] * w
            + self.normals[i1 as usize] * u
            + self.normals[i2 as usize] * v;
        let normal = Unit::new_normalize(transform.normal_to_world(normal));
        let uv = self.texcoords[i0 as usize] * w
            + self.texcoords[i1 as usize] * u
            + self.texcoords[i2 as usize] * v;

        Some(Intersection {
            position: transform.to_world_point(hit),
            normal,
            uv,
        })
    }

    fn hit_triangle(
        &self,
        index: usize,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
    ) -> Option<TriangleHit> {
        let [i0, i1, i2] = self.triangles[index];
        let a = self.positions[i0 as usize];
        let edge1 = self.positions[i1 as usize] - a;
        let edge2 = self.positions[i2 as usize] - a;

        let p_vec = direction.cross(&edge2);
        let det = p_vec.dot(&edge1);
        if det.abs() < DETERMINANT_EPSILON {
            return None;
        }

        let t_vec = origin - a;
        let u = p_vec.dot(&t_vec) / det;
        if u < -BARYCENTRIC_TOLERANCE || u > 1.0 + BARYCENTRIC_TOLERANCE {
            return None;
        }

        let q_vec = t_vec.cross(&edge1);
        let v = q_vec.dot(direction) / det;
        if v < -BARYCENTRIC_TOLERANCE
            || v > 1.0 + BARYCENTRIC_TOLERANCE
            || u + v > 1.0 + BARYCENTRIC_TOLERANCE
        {
            return None;
        }

        let t = q_vec.dot(&edge2) / det;
        if t < 0.0 {
            return None;
        }

        Some(TriangleHit { t, u, v, index })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use more_asserts::assert_lt;

    fn single_triangle() -> Mesh {
        Mesh::from_buffers(
            vec![
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![Vector3::z(); 3],
            vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(0.5, 1.0),
            ],
            vec![[0, 1, 2]],
            Transform::default(),
            Arc::new(Material::default()),
        )
    }

    #[test]
    fn it_hits_a_triangle_face_on() {
        let mesh = single_triangle();
        let transform = Transform::default();

        let origin = Point3::new(0.0, 0.0, 2.0);
        let direction = Vector3::new(0.0, 0.0, -1.0);

        let intersection = mesh.intersect(origin, direction, &transform).unwrap();
        assert_lt!((intersection.position - Point3::origin()).magnitude(), 1e-12);
        assert_lt!(
            (intersection.normal.into_inner() - Vector3::z()).magnitude(),
            1e-12
        );
        // Barycentric blend of the corner texcoords at the centroid edge.
        assert_lt!((intersection.uv - Vector2::new(0.5, 0.5)).magnitude(), 1e-9);
    }

    #[test]
    fn it_rejects_hits_outside_and_behind() {
        let mesh = single_triangle();
        let transform = Transform::default();

        let direction = Vector3::new(0.0, 0.0, -1.0);
        assert!(mesh
            .intersect(Point3::new(2.0, 2.0, 2.0), direction, &transform)
            .is_none());
        assert!(mesh
            .intersect(Point3::new(0.0, 0.0, -2.0), direction, &transform)
            .is_none());
    }

    #[test]
    fn it_interpolates_vertex_normals() {
        let mut normals = vec![Vector3::z(); 3];
        normals[2] = Vector3::new(0.0, 1.0, 1.0).normalize();
        let mesh = Mesh::from_buffers(
            vec![
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            normals,
            Vec::new(),
            vec![[0, 1, 2]],
            Transform::default(),
            Arc::new(Material::default()),
        );
        let transform = Transform::default();

        // Aim just below the apex; the blended normal tilts toward +y.
        let origin = Point3::new(0.0, 0.8, 2.0);
        let direction = Vector3::new(0.0, 0.0, -1.0);

        let intersection = mesh.intersect(origin, direction, &transform).unwrap();
        let normal = intersection.normal.into_inner();
        assert!(normal.y > 0.0);
        assert!(normal.z > 0.0);
    }

    #[test]
    fn it_computes_normals_when_none_are_given() {
        let mesh = Mesh::from_buffers(
            vec![
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            Vec::new(),
            Vec::new(),
            vec![[0, 1, 2]],
            Transform::default(),
            Arc::new(Material::default()),
        );
        let transform = Transform::default();

        let intersection = mesh
            .intersect(Point3::new(0.0, 0.0, 2.0), Vector3::new(0.0, 0.0, -1.0), &transform)
            .unwrap();
        assert_lt!(
            (intersection.normal.into_inner() - Vector3::z()).magnitude(),
            1e-12
        );
    }

    #[test]
    fn it_finds_the_nearest_of_stacked_triangles() {
        let mesh = Mesh::from_buffers(
            vec![
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(-1.0, -1.0, 1.0),
                Point3::new(1.0, -1.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
            ],
            Vec::new(),
            Vec::new(),
            vec![[0, 1, 2], [3, 4, 5]],
            Transform::default(),
            Arc::new(Material::default()),
        );
        let transform = Transform::default();

        let intersection = mesh
            .intersect(Point3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 0.0, -1.0), &transform)
            .unwrap();
        assert_lt!(
            (intersection.position - Point3::new(0.0, 0.0, 1.0)).magnitude(),
            1e-12
        );
    }

    #[test]
    fn it_never_intersects_when_empty() {
        let mesh = Mesh::from_buffers(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Transform::default(),
            Arc::new(Material::default()),
        );
        let transform = Transform::default();

        assert!(mesh.tree().is_none());
        assert!(mesh
            .intersect(Point3::new(0.0, 0.0, 2.0), Vector3::new(0.0, 0.0, -1.0), &transform)
            .is_none());
    }
}
