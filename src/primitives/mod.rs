mod mesh;
mod sphere;

use crate::core::{Material, Transform};
use crate::ray_intersection::{Intersection, Ray};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

pub use mesh::*;
pub use sphere::*;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, tag = "type", rename_all = "lowercase")]
pub enum Object {
    Sphere(Box<Sphere>),
    Mesh(Box<Mesh>),
}

impl Object {
    pub fn material(&self) -> &Arc<Material> {
        match self {
            Object::Sphere(sphere) => &sphere.material,
            Object::Mesh(mesh) => &mesh.material,
        }
    }

    pub fn material_mut(&mut self) -> &mut Arc<Material> {
        match self {
            Object::Sphere(sphere) => &mut sphere.material,
            Object::Mesh(mesh) => &mut mesh.material,
        }
    }

    pub fn transform(&self) -> &Transform {
        match self {
            Object::Sphere(sphere) => &sphere.transform,
            Object::Mesh(mesh) => &mesh.transform,
        }
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        match self {
            Object::Sphere(sphere) => &mut sphere.transform,
            Object::Mesh(mesh) => &mut mesh.transform,
        }
    }

    pub fn load_assets(&mut self, asset_base: &Path) {
        if let Object::Mesh(mesh) = self {
            mesh.load_assets(asset_base);
        }
        Arc::make_mut(self.material_mut()).load_assets(asset_base);
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let transform = self.transform();
        let origin = transform.to_object_point(ray.origin);
        let direction = transform.to_object_vector(ray.direction);

        match self {
            Object::Sphere(sphere) => sphere.intersect(origin, direction, transform),
            Object::Mesh(mesh) => mesh.intersect(origin, direction, transform),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use more_asserts::assert_lt;
    use nalgebra::{Point3, Vector3};
    use serde_json::json;

    #[test]
    fn it_deserializes_tagged_objects() {
        let object: Object = serde_json::from_value(json!({
            "type": "sphere",
            "radius": 2.0,
            "transform": [{ "translate": [0.0, 1.0, 0.0] }],
            "material": { "type": "solid", "color": [1, 0, 0] }
        }))
        .unwrap();

        match object {
            Object::Sphere(ref sphere) => assert_eq!(sphere.radius, 2.0),
            Object::Mesh(_) => panic!("expected a sphere"),
        }
    }

    #[test]
    fn it_intersects_through_the_object_transform() {
        let mut object: Object = serde_json::from_value(json!({
            "type": "sphere",
            "radius": 1.0,
            "transform": [{ "translate": [0.0, 0.0, -3.0] }]
        }))
        .unwrap();
        object.transform_mut().commit().unwrap();

        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, -1.0));
        let intersection = object.intersect(&ray).unwrap();
        assert_lt!(
            (intersection.position - Point3::new(0.0, 0.0, -2.0)).magnitude(),
            1e-12
        );
    }
}
