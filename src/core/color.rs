use auto_ops::{impl_op_ex, impl_op_ex_commutative};
use serde::Deserialize;

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "[f64; 3]")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let clamped = self.clamped();
        [
            (clamped.r * 255.0) as u8,
            (clamped.g * 255.0) as u8,
            (clamped.b * 255.0) as u8,
        ]
    }
}

impl From<[f64; 3]> for Color {
    fn from(components: [f64; 3]) -> Self {
        Self::new(components[0], components[1], components[2])
    }
}

impl_op_ex!(+|a: &Color, b: &Color| -> Color { Color::new(a.r + b.r, a.g + b.g, a.b + b.b) });
impl_op_ex!(+=|a: &mut Color, b: &Color| { a.r += b.r; a.g += b.g; a.b += b.b; });
impl_op_ex!(*|a: &Color, b: &Color| -> Color { Color::new(a.r * b.r, a.g * b.g, a.b * b.b) });
impl_op_ex!(*=|a: &mut Color, b: &Color| { a.r *= b.r; a.g *= b.g; a.b *= b.b; });
impl_op_ex_commutative!(*|a: &Color, s: &f64| -> Color { Color::new(a.r * s, a.g * s, a.b * s) });
impl_op_ex!(*=|a: &mut Color, s: &f64| { a.r *= s; a.g *= s; a.b *= s; });
impl_op_ex!(/|a: &Color, s: &f64| -> Color { Color::new(a.r / s, a.g / s, a.b / s) });
impl_op_ex!(/=|a: &mut Color, s: &f64| { a.r /= s; a.g /= s; a.b /= s; });

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_combines_colors() {
        let a = Color::new(0.25, 0.5, 1.0);
        let b = Color::new(0.5, 0.5, 0.5);

        assert_eq!(a + b, Color::new(0.75, 1.0, 1.5));
        assert_eq!(a * b, Color::new(0.125, 0.25, 0.5));
        assert_eq!(a * 2.0, Color::new(0.5, 1.0, 2.0));
        assert_eq!(2.0 * a, a * 2.0);
        assert_eq!(a / 2.0, Color::new(0.125, 0.25, 0.5));

        let mut c = a;
        c += b;
        c *= 0.5;
        assert_eq!(c, (a + b) * 0.5);
    }

    #[test]
    fn it_clamps_and_quantizes() {
        assert_eq!(Color::new(2.0, -1.0, 0.5).clamped(), Color::new(1.0, 0.0, 0.5));
        assert_eq!(Color::new(1.0, 0.0, 1.0).to_rgb8(), [255, 0, 255]);
        assert_eq!(Color::black().to_rgb8(), [0, 0, 0]);
    }

    #[test]
    fn it_deserializes_from_arrays() {
        let color: Color = serde_json::from_value(serde_json::json!([0.1, 0.2, 0.3])).unwrap();
        assert_eq!(color, Color::new(0.1, 0.2, 0.3));
    }
}
