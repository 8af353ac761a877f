mod bounds;
mod color;
mod material;
mod texture;
mod transform;

pub use bounds::*;
pub use color::*;
pub use material::*;
pub use texture::*;
pub use transform::*;
