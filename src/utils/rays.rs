use nalgebra::Vector3;

pub fn reflect(incident: &Vector3<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    incident - 2.0 * incident.dot(normal) * normal
}

#[derive(Copy, Clone, Debug)]
pub struct Refraction {
    pub direction: Vector3<f64>,
    /// False when total internal reflection fell back to a mirror bounce.
    pub refracted: bool,
    /// The normal was negated because the ray started inside the medium.
    pub flipped: bool,
}

pub fn refract(
    incident: &Vector3<f64>,
    normal: &Vector3<f64>,
    iof_outer: f64,
    iof_inner: f64,
) -> Refraction {
    let mut normal = *normal;
    let mut dot = normal.dot(incident);
    let (mut iof1, mut iof2) = (iof_outer, iof_inner);

    let mut flipped = false;
    if dot > 0.0 {
        flipped = true;
        dot = -dot;
        normal = -normal;
        std::mem::swap(&mut iof1, &mut iof2);
    }

    let eta = iof1 / iof2;
    let discriminant = 1.0 - eta * eta * (1.0 - dot * dot);

    if discriminant < 0.0 {
        return Refraction {
            direction: reflect(incident, &normal),
            refracted: false,
            flipped,
        };
    }

    Refraction {
        direction: incident * eta + normal * (eta * (-dot) - discriminant.sqrt()),
        refracted: true,
        flipped,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use more_asserts::assert_lt;
    use rand::Rng;

    #[test]
    fn it_normalizes_to_unit_length() {
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let vector: Vector3<f64> = Vector3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            if vector.magnitude_squared() == 0.0 {
                continue;
            }
            assert_lt!((vector.normalize().magnitude() - 1.0).abs(), 1e-12);
        }
    }

    #[test]
    fn it_reflects_involutively() {
        let vectors = [
            Vector3::new(1.0, -1.0, 0.5),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(-2.0, 0.25, 3.0),
        ];
        let normal = Vector3::new(0.3, 0.9, -0.1).normalize();

        for vector in &vectors {
            let twice = reflect(&reflect(vector, &normal), &normal);
            assert_lt!((twice - vector).magnitude(), 1e-12);
        }
    }

    #[test]
    fn it_passes_straight_through_at_normal_incidence() {
        let normal = Vector3::new(0.0, 1.0, 0.0);
        let incident = Vector3::new(0.0, -1.0, 0.0);

        let refraction = refract(&incident, &normal, 1.0, 1.0);
        assert!(refraction.refracted);
        assert!(!refraction.flipped);
        assert_lt!((refraction.direction - incident).magnitude(), 1e-12);
    }

    #[test]
    fn it_flips_the_normal_when_leaving_a_medium() {
        let normal = Vector3::new(0.0, 1.0, 0.0);
        let incident = Vector3::new(0.0, 1.0, 0.0);

        let refraction = refract(&incident, &normal, 1.0, 1.5);
        assert!(refraction.flipped);
        assert!(refraction.refracted);
        assert_lt!((refraction.direction - incident).magnitude(), 1e-12);
    }

    #[test]
    fn it_reflects_past_the_critical_angle() {
        let normal = Vector3::new(0.0, 1.0, 0.0);
        // Grazing exit from glass into air, well past the critical angle.
        let incident = Vector3::new(0.9, 0.1, 0.0).normalize();

        let refraction = refract(&incident, &normal, 1.0, 1.5);
        assert!(!refraction.refracted);
        assert!(refraction.flipped);
        // Total internal reflection bounces back below the surface.
        assert_lt!(refraction.direction.y, 0.0);
    }
}
