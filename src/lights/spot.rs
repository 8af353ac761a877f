use crate::core::{Color, Material};
use crate::ray_intersection::Intersection;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Deserializer};

/// Cone light with a smooth falloff between the inner and outer angles.
/// Scene files give the angles in degrees; only their cosines are kept.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpotLight {
    pub color: Color,
    pub position: Point3<f64>,
    #[serde(deserialize_with = "super::normalized")]
    pub direction: Vector3<f64>,
    #[serde(deserialize_with = "cos_degrees")]
    pub inner: f64,
    #[serde(deserialize_with = "cos_degrees")]
    pub outer: f64,
    #[serde(default = "super::default_on")]
    pub on: bool,
}

fn cos_degrees<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let degrees = f64::deserialize(deserializer)?;
    Ok(degrees.to_radians().cos())
}

impl SpotLight {
    pub fn new(
        color: Color,
        position: Point3<f64>,
        direction: Vector3<f64>,
        inner_degrees: f64,
        outer_degrees: f64,
    ) -> Self {
        Self {
            color,
            position,
            direction: direction.normalize(),
            inner: inner_degrees.to_radians().cos(),
            outer: outer_degrees.to_radians().cos(),
            on: true,
        }
    }

    pub fn shade(
        &self,
        intersection: &Intersection,
        viewer: &Point3<f64>,
        material: &Material,
    ) -> Color {
        let to_light = (self.position - intersection.position).normalize();
        let shaded = super::phong_shade(self.color, to_light, intersection, viewer, material);

        // Hermite falloff between the cone cosines.
        let alignment = self.direction.dot(&-to_light);
        let k = ((alignment - self.outer) / (self.inner - self.outer)).clamp(0.0, 1.0);

        shaded * (k * k * (3.0 - 2.0 * k))
    }

    pub fn direction_and_distance(&self, point: &Point3<f64>) -> (Vector3<f64>, f64) {
        let offset = self.position - point;
        let distance = offset.magnitude();

        (offset / distance, distance)
    }
}
