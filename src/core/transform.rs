use crate::error::Error;
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};
use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::default::Default;
use std::fmt;

#[derive(Copy, Clone, Debug)]
pub struct Transform {
    matrix: Matrix4<f64>,
    inverse: Matrix4<f64>,
    inverse_transpose: Matrix4<f64>,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
            inverse_transpose: Matrix4::identity(),
            dirty: false,
        }
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn matrix(&self) -> Matrix4<f64> {
        self.matrix
    }

    pub fn set_matrix(&mut self, matrix: Matrix4<f64>) {
        self.matrix = matrix;
        self.dirty = true;
    }

    /// Recompute the cached inverse matrices if the transform changed.
    ///
    /// Render passes run this once, single-threaded, before any worker reads
    /// the transform.
    pub fn commit(&mut self) -> Result<(), Error> {
        if !self.dirty {
            return Ok(());
        }

        let inverse = self
            .matrix
            .try_inverse()
            .ok_or(Error::SingularTransform)?;
        self.inverse = inverse;
        self.inverse_transpose = inverse.transpose();
        self.dirty = false;

        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn translate(mut self, translation: Vector3<f64>) -> Self {
        self.set_matrix(Matrix4::new_translation(&translation) * self.matrix);
        self
    }

    pub fn rotate(mut self, axis: Unit<Vector3<f64>>, angle: f64) -> Self {
        self.set_matrix(
            Rotation3::from_axis_angle(&axis, angle.to_radians()).to_homogeneous() * self.matrix,
        );
        self
    }

    pub fn scale(mut self, scale: Vector3<f64>) -> Self {
        self.set_matrix(Matrix4::new_nonuniform_scaling(&scale) * self.matrix);
        self
    }

    pub fn to_world_point(&self, point: Point3<f64>) -> Point3<f64> {
        self.matrix.transform_point(&point)
    }

    pub fn to_object_point(&self, point: Point3<f64>) -> Point3<f64> {
        debug_assert!(!self.dirty, "transform read before commit");
        self.inverse.transform_point(&point)
    }

    // Directions use the linear part only; translation must not leak into
    // them.
    pub fn to_object_vector(&self, vector: Vector3<f64>) -> Vector3<f64> {
        debug_assert!(!self.dirty, "transform read before commit");
        self.inverse.transform_vector(&vector)
    }

    pub fn normal_to_world(&self, normal: Vector3<f64>) -> Vector3<f64> {
        debug_assert!(!self.dirty, "transform read before commit");
        self.inverse_transpose.transform_vector(&normal)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all(deserialize = "snake_case"))]
enum SubTransform {
    Translate(Vector3<f64>),
    RotateX(f64),
    RotateY(f64),
    RotateZ(f64),
    Scale(Vector3<f64>),
}

struct TransformVisitor;

impl<'de> Visitor<'de> for TransformVisitor {
    type Value = Transform;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence of sub-transforms")
    }

    fn visit_seq<V>(self, mut seq: V) -> Result<Transform, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let mut transform = Transform::default();
        loop {
            let next: Option<SubTransform> = seq.next_element()?;
            match next {
                Some(SubTransform::Translate(translation)) => {
                    transform = transform.translate(translation);
                }
                Some(SubTransform::RotateX(angle)) => {
                    transform = transform.rotate(Vector3::x_axis(), angle);
                }
                Some(SubTransform::RotateY(angle)) => {
                    transform = transform.rotate(Vector3::y_axis(), angle);
                }
                Some(SubTransform::RotateZ(angle)) => {
                    transform = transform.rotate(Vector3::z_axis(), angle);
                }
                Some(SubTransform::Scale(scale)) => {
                    transform = transform.scale(scale);
                }
                None => break,
            }
        }

        // Degenerate transforms (zero scale) are scene file errors, caught
        // here rather than mid-render.
        transform.commit().map_err(serde::de::Error::custom)?;

        Ok(transform)
    }
}

impl<'de> Deserialize<'de> for Transform {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(TransformVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use more_asserts::assert_lt;
    use rand::Rng;
    use serde_json::json;

    fn max_abs_difference(a: &Matrix4<f64>, b: &Matrix4<f64>) -> f64 {
        (a - b).abs().max()
    }

    #[test]
    fn it_constructs_matrices() {
        let translation = Transform::identity().translate(Vector3::from([1.0, 2.0, 3.0]));
        let rotation = Transform::identity().rotate(Vector3::y_axis(), 50.0);
        let scale = Transform::identity().scale(Vector3::from([1.0, 2.0, 3.0]));

        assert_eq!(Transform::identity().matrix(), Matrix4::identity());
        assert_eq!(
            translation.matrix(),
            Matrix4::new_translation(&Vector3::from([1.0, 2.0, 3.0]))
        );
        assert_eq!(
            rotation.matrix(),
            Rotation3::from_axis_angle(&Vector3::y_axis(), 50.0f64.to_radians()).to_homogeneous()
        );
        assert_eq!(
            scale.matrix(),
            Matrix4::new_nonuniform_scaling(&Vector3::from([1.0, 2.0, 3.0]))
        );
    }

    #[test]
    fn it_commits_inverses_lazily() {
        let mut transform = Transform::identity().translate(Vector3::from([4.0, 0.0, -2.0]));
        assert!(transform.is_dirty());

        transform.commit().unwrap();
        assert!(!transform.is_dirty());

        let point = Point3::from([1.0, 1.0, 1.0]);
        let roundtrip = transform.to_world_point(transform.to_object_point(point));
        assert_lt!((roundtrip - point).magnitude(), 1e-12);

        // Translation must not affect direction vectors.
        let direction = Vector3::from([0.0, 0.0, -1.0]);
        assert_eq!(transform.to_object_vector(direction), direction);
    }

    #[test]
    fn it_inverts_random_compositions() {
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let mut transform = Transform::identity()
                .translate(Vector3::from([
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                ]))
                .rotate(Vector3::x_axis(), rng.gen_range(-180.0..180.0))
                .rotate(Vector3::y_axis(), rng.gen_range(-180.0..180.0))
                .rotate(Vector3::z_axis(), rng.gen_range(-180.0..180.0))
                .scale(Vector3::from([
                    rng.gen_range(0.1..4.0),
                    rng.gen_range(0.1..4.0),
                    rng.gen_range(0.1..4.0),
                ]));
            transform.commit().unwrap();

            let product = transform.matrix()
                * transform.matrix().try_inverse().expect("invertible by construction");
            assert_lt!(max_abs_difference(&product, &Matrix4::identity()), 1e-9);
        }
    }

    #[test]
    fn it_rejects_singular_transforms() {
        let mut transform = Transform::identity().scale(Vector3::from([0.0, 1.0, 1.0]));
        assert!(transform.commit().is_err());
    }

    #[test]
    fn it_deserializes_sub_transform_sequences() {
        let transform: Transform = serde_json::from_value(json!([
            { "rotate_y": 90.0 },
            { "scale": [2.0, 2.0, 2.0] },
            { "translate": [1.0, 0.0, 0.0] }
        ]))
        .unwrap();

        assert!(!transform.is_dirty());

        // +z rotates onto +x, doubles, then shifts by one.
        let mapped = transform.to_world_point(Point3::from([0.0, 0.0, 1.0]));
        assert_lt!((mapped - Point3::from([3.0, 0.0, 0.0])).magnitude(), 1e-12);
    }

    #[test]
    fn it_rejects_singular_scene_transforms() {
        let result: Result<Transform, _> =
            serde_json::from_value(json!([{ "scale": [0.0, 0.0, 0.0] }]));
        assert!(result.is_err());
    }
}
