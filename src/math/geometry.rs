use nalgebra::{Point3, Unit, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Unit<Vector3<f64>>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Unit<Vector3<f64>>) -> Self {
        Self { origin, direction }
    }

    /// Builds a ray from `origin` through `target`. Returns None if the two
    /// points coincide.
    pub fn through(origin: Point3<f64>, target: Point3<f64>) -> Option<Self> {
        let direction = Unit::try_new(target - origin, f64::EPSILON)?;
        Some(Self { origin, direction })
    }

    /// Returns the smallest non-negative ray parameter at which this ray meets
    /// the sphere, or None if it misses (or the sphere is entirely behind the
    /// origin). Since the direction is a unit vector, the parameter is also
    /// the distance from the origin.
    pub fn intersect_sphere(&self, center: &Point3<f64>, radius: f64) -> Option<f64> {
        let offset = self.origin - center;
        let b = self.direction.dot(&offset);
        let c = offset.norm_squared() - radius * radius;

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let near = -b - sqrt_disc;
        let far = -b + sqrt_disc;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            // We're inside the sphere
            Some(far)
        } else {
            None
        }
    }
}
