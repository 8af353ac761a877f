mod scene;

use nalgebra::{Matrix4, Point3, Unit, Vector3};
use serde::Deserialize;

pub use scene::Scene;

// Offset applied to secondary-ray origins so they cannot re-hit the
// surface they left.
const BIAS: f64 = 1e-4;

/// Camera parameters as scene files provide them. The field of view is
/// given in degrees.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSettings {
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    pub up: Vector3<f64>,
    pub fov: f64,
    pub width: u32,
    pub height: u32,
    pub max_bounces: u32,
    pub aperture: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Point3::from([0.0, 0.0, 1.0]),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: 65.0,
            width: 100,
            height: 100,
            max_bounces: 4,
            aperture: 0.0,
        }
    }
}

/// Viewpoint of a render. The camera-to-world rotation and the focal
/// length are derived from position/target/up in every setter, so they
/// are always in step with the fields they depend on.
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "CameraSettings")]
pub struct Camera {
    position: Point3<f64>,
    target: Point3<f64>,
    up: Unit<Vector3<f64>>,
    fov: f64,
    width: u32,
    height: u32,
    max_bounces: u32,
    aperture: f64,

    view: Matrix4<f64>,
    focal_length: f64,
}

impl From<CameraSettings> for Camera {
    fn from(settings: CameraSettings) -> Self {
        let mut camera = Self {
            position: settings.position,
            target: settings.target,
            up: Unit::new_normalize(settings.up),
            fov: settings.fov.to_radians(),
            width: settings.width,
            height: settings.height,
            max_bounces: settings.max_bounces,
            aperture: settings.aperture,
            view: Matrix4::identity(),
            focal_length: 0.0,
        };
        camera.update_view();
        camera
    }
}

impl Default for Camera {
    fn default() -> Self {
        CameraSettings::default().into()
    }
}

impl Camera {
    fn update_view(&mut self) {
        // The rotation part of the inverted look-at matrix; rays get the
        // translation through their origin instead.
        self.view = Matrix4::look_at_rh(&self.position, &self.target, &self.up).transpose();
        self.focal_length = (self.target - self.position).magnitude();
    }

    pub fn look_at(&mut self, position: Point3<f64>, target: Point3<f64>, up: Vector3<f64>) {
        self.position = position;
        self.target = target;
        self.up = Unit::new_normalize(up);
        self.update_view();
    }

    pub fn set_position(&mut self, position: Point3<f64>) {
        self.position = position;
        self.update_view();
    }

    pub fn set_target(&mut self, target: Point3<f64>) {
        self.target = target;
        self.update_view();
    }

    pub fn set_up(&mut self, up: Vector3<f64>) {
        self.up = Unit::new_normalize(up);
        self.update_view();
    }

    pub fn set_fov(&mut self, degrees: f64) {
        self.fov = degrees.to_radians();
    }

    pub fn set_aperture(&mut self, aperture: f64) {
        self.aperture = aperture;
    }

    pub fn position(&self) -> Point3<f64> {
        self.position
    }

    pub fn fov(&self) -> f64 {
        self.fov
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn max_bounces(&self) -> u32 {
        self.max_bounces
    }

    pub fn aperture(&self) -> f64 {
        self.aperture
    }

    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }

    /// Map a camera-space direction (or lens offset) into world space.
    pub fn to_world(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        (self.view * direction.to_homogeneous()).xyz()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    Single,
    Grid,
    Jitter,
}

#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Supersampling {
    pub mode: SamplingMode,
    pub subdivisions: u32,
}

impl Default for Supersampling {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Single,
            subdivisions: 1,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    pub supersampling: Supersampling,
    pub dof_rays: u32,
}

#[cfg(test)]
mod test {
    use super::*;
    use more_asserts::assert_lt;
    use serde_json::json;

    #[test]
    fn it_derives_the_view_from_the_settings() {
        let camera = Camera::from(CameraSettings {
            position: Point3::from([0.0, 0.0, 5.0]),
            target: Point3::origin(),
            ..CameraSettings::default()
        });

        // Default orientation: camera space -z is straight ahead.
        let ahead = camera.to_world(&Vector3::new(0.0, 0.0, -1.0));
        assert_lt!((ahead - Vector3::new(0.0, 0.0, -1.0)).magnitude(), 1e-12);
        assert_lt!((camera.focal_length() - 5.0).abs(), 1e-12);
    }

    #[test]
    fn it_recomputes_on_every_setter() {
        let mut camera = Camera::default();
        camera.set_position(Point3::from([0.0, 0.0, 3.0]));
        assert_lt!((camera.focal_length() - 3.0).abs(), 1e-12);

        camera.look_at(
            Point3::from([4.0, 0.0, 0.0]),
            Point3::origin(),
            Vector3::y(),
        );
        assert_lt!((camera.focal_length() - 4.0).abs(), 1e-12);

        // Looking down -x now, so camera-space forward maps to -x.
        let ahead = camera.to_world(&Vector3::new(0.0, 0.0, -1.0));
        assert_lt!((ahead - Vector3::new(-1.0, 0.0, 0.0)).magnitude(), 1e-12);
    }

    #[test]
    fn it_deserializes_degrees_and_options() {
        let camera: Camera = serde_json::from_value(json!({
            "position": [0, 1, 10],
            "fov": 90.0,
            "width": 640,
            "height": 480,
            "max_bounces": 8
        }))
        .unwrap();
        assert_lt!((camera.fov() - std::f64::consts::FRAC_PI_2).abs(), 1e-12);
        assert_eq!((camera.width(), camera.height()), (640, 480));
        assert_eq!(camera.max_bounces(), 8);

        let options: RenderOptions = serde_json::from_value(json!({
            "supersampling": { "mode": "jitter", "subdivisions": 3 },
            "dof_rays": 16
        }))
        .unwrap();
        assert_eq!(options.supersampling.mode, SamplingMode::Jitter);
        assert_eq!(options.supersampling.subdivisions, 3);
        assert_eq!(options.dof_rays, 16);
    }
}
