use crate::core::{Material, Transform};
use crate::ray_intersection::Intersection;
use nalgebra::{Point3, Unit, Vector2, Vector3};
use serde::Deserialize;
use std::f64::consts::PI;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Sphere {
    pub radius: f64,
    pub transform: Transform,
    pub material: Arc<Material>,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            radius: 1.0,
            transform: Transform::default(),
            material: Arc::new(Material::default()),
        }
    }
}

impl Sphere {
    pub fn new(radius: f64, transform: Transform, material: Arc<Material>) -> Self {
        Self {
            radius,
            transform,
            material,
        }
    }

    /// Intersect with a ray already mapped into object space. Returns the
    /// world-space intersection.
    pub fn intersect(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
        transform: &Transform,
    ) -> Option<Intersection> {
        let pos = origin.coords;
        let dot = pos.dot(&direction);
        let dir_len = direction.magnitude_squared();
        let pos_len = pos.magnitude_squared();

        let discriminant = dot * dot - dir_len * (pos_len - self.radius * self.radius);
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let t1 = (-dot - root) / dir_len;
        let t2 = (-dot + root) / dir_len;

        if t1 < 0.0 && t2 < 0.0 {
            return None;
        }
        let t = if t1 >= 0.0 && t2 >= 0.0 {
            t1.min(t2)
        } else {
            t1.max(t2)
        };

        let hit = Point3::from(pos + direction * t);
        let normal = Unit::new_normalize(transform.normal_to_world(hit.coords));

        // atan, not atan2: the mapping mirrors for x < 0 and leaves a seam
        // on textured spheres.
        let theta = (hit.y / hit.x).atan();
        let phi = (hit.z / self.radius).atan();
        let uv = Vector2::new(theta / (2.0 * PI), (PI - phi) / PI);

        Some(Intersection {
            position: transform.to_world_point(hit),
            normal,
            uv,
        })
    }
}
