use nalgebra::Vector2;
use rand::Rng;
use std::f64::consts::TAU;

// Uniform sample over a disk of the given radius.
pub fn sample_in_disk<R: Rng>(rng: &mut R, radius: f64) -> Vector2<f64> {
    let r = radius * rng.gen::<f64>().sqrt();
    let theta = rng.gen::<f64>() * TAU;

    Vector2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod test {
    use super::*;
    use more_asserts::assert_le;

    #[test]
    fn it_samples_within_the_radius() {
        let mut rng = rand::thread_rng();

        for _ in 0..10_000 {
            let sample = sample_in_disk(&mut rng, 2.5);
            assert_le!(sample.magnitude(), 2.5 + 1e-12);
        }
    }

    #[test]
    fn it_collapses_with_a_zero_radius() {
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let sample = sample_in_disk(&mut rng, 0.0);
            assert_eq!(sample, Vector2::new(0.0, 0.0));
        }
    }
}
