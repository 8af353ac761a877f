use crate::core::{Color, Material};
use crate::ray_intersection::Intersection;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointLight {
    pub color: Color,
    pub position: Point3<f64>,
    #[serde(default = "super::default_on")]
    pub on: bool,
}

impl PointLight {
    pub fn new(color: Color, position: Point3<f64>) -> Self {
        Self {
            color,
            position,
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
        super::phong_shade(self.color, to_light, intersection, viewer, material)
    }

    pub fn direction_and_distance(&self, point: &Point3<f64>) -> (Vector3<f64>, f64) {
        let offset = self.position - point;
        let distance = offset.magnitude();

        (offset / distance, distance)
    }
}
