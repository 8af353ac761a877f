use crate::utils::{self, Refraction};
use nalgebra::{Point3, Unit, Vector2, Vector3};

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// Spawn the mirror bounce of this ray at a surface point, offset along
    /// the normal so it cannot immediately re-hit the surface.
    pub fn reflect(&self, hit_point: Point3<f64>, normal: Vector3<f64>, offset: f64) -> Ray {
        Ray::new(
            hit_point + normal * offset,
            utils::reflect(&self.direction, &normal),
        )
    }

    /// Spawn the refracted continuation of this ray. The origin offset goes
    /// to whichever side of the surface the new ray travels: through it on
    /// true refraction, back off it when total internal reflection bounced
    /// instead.
    pub fn refract(
        &self,
        hit_point: Point3<f64>,
        normal: Vector3<f64>,
        iof_outer: f64,
        iof_inner: f64,
        offset: f64,
    ) -> (Ray, Refraction) {
        let refraction = utils::refract(&self.direction, &normal, iof_outer, iof_inner);

        let origin = if refraction.flipped {
            hit_point + normal * (if refraction.refracted { offset } else { -offset })
        } else {
            hit_point + normal * (if refraction.refracted { -offset } else { offset })
        };

        (Ray::new(origin, refraction.direction), refraction)
    }
}

/// Transient result of a ray/object query, already mapped back to world
/// space. Recomputed for every query; nothing holds onto one.
#[derive(Copy, Clone, Debug)]
pub struct Intersection {
    pub position: Point3<f64>,
    pub normal: Unit<Vector3<f64>>,
    pub uv: Vector2<f64>,
}

#[cfg(test)]
mod test {
    use super::*;
    use more_asserts::{assert_gt, assert_lt};

    #[test]
    fn it_spawns_reflected_rays_off_the_surface() {
        let ray = Ray::new(Point3::new(0.0, 1.0, 0.0), Vector3::new(0.0, -1.0, 0.0));
        let normal = Vector3::new(0.0, 1.0, 0.0);

        let reflected = ray.reflect(Point3::origin(), normal, 1e-4);
        assert_gt!(reflected.origin.y, 0.0);
        assert_lt!(
            (reflected.direction - Vector3::new(0.0, 1.0, 0.0)).magnitude(),
            1e-12
        );
    }

    #[test]
    fn it_offsets_refracted_rays_into_the_medium() {
        let ray = Ray::new(Point3::new(0.0, 1.0, 0.0), Vector3::new(0.0, -1.0, 0.0));
        let normal = Vector3::new(0.0, 1.0, 0.0);

        let (refracted, refraction) = ray.refract(Point3::origin(), normal, 1.0, 1.5, 1e-4);
        assert!(refraction.refracted);
        assert!(!refraction.flipped);
        // Entering the medium, so the new origin sits just below the surface.
        assert_lt!(refracted.origin.y, 0.0);
    }
}
