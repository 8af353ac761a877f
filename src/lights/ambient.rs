use crate::core::{Color, Material};
use crate::ray_intersection::Intersection;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmbientLight {
    pub color: Color,
    pub on: bool,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Color::black(),
            on: super::default_on(),
        }
    }
}

impl AmbientLight {
    pub fn new(color: Color) -> Self {
        Self { color, on: true }
    }

    pub fn shade(&self, intersection: &Intersection, material: &Material) -> Color {
        material.color_at(intersection.uv) * self.color * material.phong().ambient
    }
}
