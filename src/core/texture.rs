use super::Color;
use image::{Pixel, RgbImage};
use nalgebra::{clamp, Vector2};
use std::fmt;
use std::path::Path;

// Lookups on a texture that failed to decode return this instead of
// garbage, so broken assets are visible in the output.
const FALLBACK_COLOR: Color = Color::new(1.0, 0.0, 1.0);

#[derive(Clone, Default)]
pub struct Texture {
    texture_path: String,
    width: u32,
    height: u32,
    texture: Option<RgbImage>,
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Texture {{ width: {}, height: {}, texture_path: {} }}",
            self.width, self.height, self.texture_path
        )
    }
}

impl Texture {
    pub fn new(texture_path: &str) -> Self {
        Self {
            texture_path: texture_path.to_string(),
            width: 0,
            height: 0,
            texture: None,
        }
    }

    pub fn load(&mut self, asset_base: &Path) -> Result<(), image::ImageError> {
        let texture = image::open(asset_base.join(self.texture_path.clone()))?.to_rgb8();
        self.width = texture.width();
        self.height = texture.height();
        self.texture = Some(texture);

        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.texture.is_some()
    }

    pub fn get_color(&self, uv: Vector2<f64>) -> Color {
        let texture = match self.texture.as_ref() {
            Some(texture) => texture,
            None => return FALLBACK_COLOR,
        };

        let (w, h) = (self.width - 1, self.height - 1);

        let (x, y) = (uv.x % 1.0, uv.y % 1.0);
        let x = if x < 0.0 { x + 1.0 } else { x };
        let y = if y < 0.0 { y + 1.0 } else { y };

        let (x, y) = (x * f64::from(w), (1.0 - y) * f64::from(h));
        let (x, y) = (clamp(x as u32, 0, w), clamp(y as u32, 0, h));

        let pixel = texture.get_pixel(x, y);
        let channels = pixel.channels();

        let norm = f64::from(std::u8::MAX);
        Color::new(
            f64::from(channels[0]) / norm,
            f64::from(channels[1]) / norm,
            f64::from(channels[2]) / norm,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_falls_back_when_not_loaded() {
        let texture = Texture::new("missing.png");
        assert!(!texture.is_loaded());
        assert_eq!(texture.get_color(Vector2::new(0.5, 0.5)), FALLBACK_COLOR);
    }

    #[test]
    fn it_reports_missing_files_as_errors() {
        let mut texture = Texture::new("does-not-exist.png");
        assert!(texture.load(Path::new("")).is_err());
        assert!(!texture.is_loaded());
    }
}
