use nalgebra::{Point3, Vector3};

use crate::consts::{
    DEFAULT_GLOBE_RADIUS, EARTH_RADIUS_KM, WGS72_EQUATORIAL_RADIUS_KM, WGS72_FLATTENING,
};

const LATITUDE_TOLERANCE: f64 = 1e-12;
const MAX_LATITUDE_ITERATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

impl Geodetic {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_km,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude_deg.is_finite()
            && self.longitude_deg.is_finite()
            && self.altitude_km.is_finite()
    }
}

/// Places geodetic coordinates on (or above) the render-space globe.
///
/// The globe is centred on the origin with +y through the north pole. Longitude
/// is measured as `theta = -lon`, so the prime meridian on the equator lands on
/// +x and 90°E lands on -z. Every placement in the crate goes through `project`,
/// so this convention can't drift between the initial layout and animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticProjector {
    globe_radius: f64,
}

impl GeodeticProjector {
    pub fn new(globe_radius: f64) -> Self {
        Self { globe_radius }
    }

    pub fn globe_radius(&self) -> f64 {
        self.globe_radius
    }

    /// Render units per kilometre.
    pub fn scale_factor(&self) -> f64 {
        self.globe_radius / EARTH_RADIUS_KM
    }

    pub fn project(&self, latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> Point3<f64> {
        let radius = self.globe_radius + altitude_km * self.scale_factor();
        let phi = (90.0 - latitude_deg).to_radians();
        let theta = (-longitude_deg).to_radians();

        Point3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.cos(),
            radius * phi.sin() * theta.sin(),
        )
    }

    pub fn project_geodetic(&self, geodetic: &Geodetic) -> Point3<f64> {
        self.project(
            geodetic.latitude_deg,
            geodetic.longitude_deg,
            geodetic.altitude_km,
        )
    }
}

impl Default for GeodeticProjector {
    fn default() -> Self {
        Self::new(DEFAULT_GLOBE_RADIUS)
    }
}

/// Wraps an angle in degrees into [-180, 180).
pub fn wrap_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

fn eccentricity_squared() -> f64 {
    WGS72_FLATTENING * (2.0 - WGS72_FLATTENING)
}

/// Converts an inertial (TEME) position in km into geodetic coordinates on the
/// WGS-72 ellipsoid. `gmst` is the Greenwich sidereal angle in radians.
pub fn eci_to_geodetic(position: &Vector3<f64>, gmst: f64) -> Geodetic {
    let a = WGS72_EQUATORIAL_RADIUS_KM;
    let e2 = eccentricity_squared();

    let r = position.x.hypot(position.y);
    let longitude = position.y.atan2(position.x) - gmst;

    // Fixed-point iteration on geodetic latitude; converges in a handful of
    // steps for anything near the Earth.
    let mut latitude = position.z.atan2(r);
    for _ in 0..MAX_LATITUDE_ITERATIONS {
        let sin_lat = latitude.sin();
        let c = 1.0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (position.z + a * c * e2 * sin_lat).atan2(r);
        let converged = (next - latitude).abs() < LATITUDE_TOLERANCE;
        latitude = next;
        if converged {
            break;
        }
    }

    // This form of the height stays well-conditioned at the poles
    let sin_lat = latitude.sin();
    let altitude =
        r * latitude.cos() + position.z * sin_lat - a * (1.0 - e2 * sin_lat * sin_lat).sqrt();

    Geodetic {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: wrap_degrees(longitude.to_degrees()),
        altitude_km: altitude,
    }
}

/// Inverse of `eci_to_geodetic`.
pub fn geodetic_to_eci(geodetic: &Geodetic, gmst: f64) -> Vector3<f64> {
    let a = WGS72_EQUATORIAL_RADIUS_KM;
    let e2 = eccentricity_squared();

    let latitude = geodetic.latitude_deg.to_radians();
    let longitude = geodetic.longitude_deg.to_radians() + gmst;
    let sin_lat = latitude.sin();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let h = geodetic.altitude_km;

    Vector3::new(
        (n + h) * latitude.cos() * longitude.cos(),
        (n + h) * latitude.cos() * longitude.sin(),
        (n * (1.0 - e2) + h) * sin_lat,
    )
}
