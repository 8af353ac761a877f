mod ambient;
mod parallel;
mod point;
mod spot;

use crate::core::{Color, Material};
use crate::ray_intersection::Intersection;
use crate::utils;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Deserializer};

pub use ambient::AmbientLight;
pub use parallel::ParallelLight;
pub use point::PointLight;
pub use spot::SpotLight;

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Light {
    Ambient(AmbientLight),
    Parallel(ParallelLight),
    Point(Box<PointLight>),
    Spot(Box<SpotLight>),
}

impl Light {
    /// Ambient light has no direction; everything else casts shadows.
    pub fn is_directional(&self) -> bool {
        !matches!(self, Light::Ambient(_))
    }

    pub fn is_on(&self) -> bool {
        match self {
            Light::Ambient(light) => light.on,
            Light::Parallel(light) => light.on,
            Light::Point(light) => light.on,
            Light::Spot(light) => light.on,
        }
    }

    pub fn set_on(&mut self, on: bool) {
        match self {
            Light::Ambient(light) => light.on = on,
            Light::Parallel(light) => light.on = on,
            Light::Point(light) => light.on = on,
            Light::Spot(light) => light.on = on,
        }
    }

    /// Contribution of this light at an intersection, viewed from `viewer`.
    pub fn shade(
        &self,
        intersection: &Intersection,
        viewer: &Point3<f64>,
        material: &Material,
    ) -> Color {
        match self {
            Light::Ambient(light) => light.shade(intersection, material),
            Light::Parallel(light) => light.shade(intersection, viewer, material),
            Light::Point(light) => light.shade(intersection, viewer, material),
            Light::Spot(light) => light.shade(intersection, viewer, material),
        }
    }

    /// Unit direction toward the light and the distance to it, for shadow
    /// rays. Ambient returns zeroes and is never queried.
    pub fn direction_and_distance(&self, point: &Point3<f64>) -> (Vector3<f64>, f64) {
        match self {
            Light::Ambient(_) => (Vector3::zeros(), 0.0),
            Light::Parallel(light) => light.direction_and_distance(),
            Light::Point(light) => light.direction_and_distance(point),
            Light::Spot(light) => light.direction_and_distance(point),
        }
    }
}

// Lambert diffuse plus Phong specular for a unit vector toward the light.
fn phong_shade(
    light_color: Color,
    to_light: Vector3<f64>,
    intersection: &Intersection,
    viewer: &Point3<f64>,
    material: &Material,
) -> Color {
    let to_viewer = (viewer - intersection.position).normalize();
    let material_color = material.color_at(intersection.uv);
    let phong = material.phong();

    let diffuse =
        material_color * light_color * (intersection.normal.dot(&to_light).max(0.0) * phong.diffuse);

    let reflected = utils::reflect(&-to_light, &intersection.normal).normalize();
    let specular = light_color
        * (reflected.dot(&to_viewer).max(0.0).powf(phong.exponent) * phong.specular);

    diffuse + specular
}

fn normalized<'de, D>(deserializer: D) -> Result<Vector3<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let direction = Vector3::deserialize(deserializer)?;
    Ok(direction.normalize())
}

const fn default_on() -> bool {
    true
}
