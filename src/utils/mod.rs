mod rays;
mod sampling;

pub use rays::{reflect, refract, Refraction};
pub use sampling::sample_in_disk;
