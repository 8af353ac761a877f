use crate::core::{Color, Material};
use crate::ray_intersection::Intersection;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;

/// Light at infinity; every point sees the same direction.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallelLight {
    pub color: Color,
    #[serde(deserialize_with = "super::normalized")]
    pub direction: Vector3<f64>,
    #[serde(default = "super::default_on")]
    pub on: bool,
}

impl ParallelLight {
    pub fn new(color: Color, direction: Vector3<f64>) -> Self {
        Self {
            color,
            direction: direction.normalize(),
            on: true,
        }
    }

    pub fn shade(
        &self,
        intersection: &Intersection,
        viewer: &Point3<f64>,
        material: &Material,
    ) -> Color {
        super::phong_shade(self.color, -self.direction, intersection, viewer, material)
    }

    pub fn direction_and_distance(&self) -> (Vector3<f64>, f64) {
        (-self.direction, f64::INFINITY)
    }
}
