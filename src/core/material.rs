use super::{Color, Texture};
use log::warn;
use nalgebra::Vector2;
use serde::Deserialize;
use std::path::Path;

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Phong {
    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub exponent: f64,
}

impl Default for Phong {
    fn default() -> Self {
        Self {
            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.0,
            exponent: 30.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolidMaterial {
    pub color: Color,
    pub phong: Phong,
    pub reflectance: f64,
    pub transmittance: f64,
    pub refraction: f64,
}

impl Default for SolidMaterial {
    fn default() -> Self {
        Self {
            color: Color::white(),
            phong: Phong::default(),
            reflectance: 0.0,
            transmittance: 0.0,
            refraction: 1.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TexturedMaterial {
    pub file: String,
    #[serde(default)]
    pub phong: Phong,
    #[serde(default)]
    pub reflectance: f64,
    #[serde(default)]
    pub transmittance: f64,
    #[serde(default = "default_refraction")]
    pub refraction: f64,

    #[serde(skip)]
    pub texture: Texture,
}

fn default_refraction() -> f64 {
    1.0
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Material {
    Solid(SolidMaterial),
    Textured(TexturedMaterial),
}

impl Default for Material {
    fn default() -> Self {
        Material::Solid(SolidMaterial::default())
    }
}

impl Material {
    pub fn phong(&self) -> &Phong {
        match self {
            Material::Solid(material) => &material.phong,
            Material::Textured(material) => &material.phong,
        }
    }

    pub fn reflectance(&self) -> f64 {
        match self {
            Material::Solid(material) => material.reflectance,
            Material::Textured(material) => material.reflectance,
        }
    }

    pub fn transmittance(&self) -> f64 {
        match self {
            Material::Solid(material) => material.transmittance,
            Material::Textured(material) => material.transmittance,
        }
    }

    pub fn refraction(&self) -> f64 {
        match self {
            Material::Solid(material) => material.refraction,
            Material::Textured(material) => material.refraction,
        }
    }

    pub fn color_at(&self, uv: Vector2<f64>) -> Color {
        match self {
            Material::Solid(material) => material.color,
            Material::Textured(material) => material.texture.get_color(uv),
        }
    }

    pub fn load_assets(&mut self, asset_base: &Path) {
        if let Material::Textured(material) = self {
            let mut texture = Texture::new(&material.file);
            if let Err(err) = texture.load(asset_base) {
                // A broken texture degrades to the fallback lookup color.
                warn!("failed to load texture {}: {}", material.file, err);
            }
            material.texture = texture;
        }
    }
}
