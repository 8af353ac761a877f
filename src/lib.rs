#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::too_many_lines,
    clippy::wildcard_imports
)]

mod core;
mod error;
mod lights;
mod output;
mod primitives;
mod ray_intersection;
mod render;
mod scripting;
mod utils;

pub use crate::core::{
    BoundingBox, BoundingTree, Color, Material, Phong, SolidMaterial, Texture, TexturedMaterial,
    Transform,
};
pub use crate::error::Error;
pub use crate::lights::{AmbientLight, Light, ParallelLight, PointLight, SpotLight};
pub use crate::output::{to_image, write_image, AsyncWriter, VideoPipe, WriteJob};
pub use crate::primitives::{Mesh, Object, Sphere};
pub use crate::ray_intersection::{Intersection, Ray};
pub use crate::render::{Camera, CameraSettings, RenderOptions, SamplingMode, Scene, Supersampling};
pub use crate::scripting::{Animator, SceneHandle, ScriptAnimator};
