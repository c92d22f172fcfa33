use std::fmt;

use chrono::{DateTime, Utc};
use nalgebra::Vector3;

use crate::consts::{MILLIS_PER_MINUTE, SECONDS_PER_DAY};
use crate::error::RecordError;
use crate::math::geodetic::{eci_to_geodetic, geodetic_to_eci, Geodetic};
use crate::math::sidereal::greenwich_mean_sidereal_time;

/// Inertial (TEME) position, in km.
pub type EciPosition = Vector3<f64>;

/// Where an orbiting object is at a given simulated instant.
///
/// Failure is reported as `None`, never by panicking: callers treat an invalid
/// result as "no update this frame".
pub trait EphemerisSource {
    fn propagate(&self, state: &OrbitalState, instant: DateTime<Utc>) -> Option<EciPosition>;

    fn to_geodetic(&self, position: &EciPosition, instant: DateTime<Utc>) -> Geodetic {
        eci_to_geodetic(position, greenwich_mean_sidereal_time(instant))
    }
}

/// Opaque per-object input to an `EphemerisSource`.
#[derive(Debug)]
pub enum OrbitalState {
    ElementSet(Box<ElementSet>),
    Circular(CircularOrbit),
}

/// A parsed two-line element set, ready for SGP4.
pub struct ElementSet {
    constants: sgp4::Constants,
    epoch: DateTime<Utc>,
    catalog_number: u64,
    inclination_deg: f64,
    mean_motion: f64,
}

impl ElementSet {
    pub fn from_lines(name: Option<&str>, line1: &str, line2: &str) -> Result<Self, RecordError> {
        let elements = sgp4::Elements::from_tle(
            name.map(|n| n.trim().to_owned()),
            line1.trim().as_bytes(),
            line2.trim().as_bytes(),
        )
        .map_err(|e| RecordError::ElementSet(e.to_string()))?;

        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| RecordError::ElementSet(e.to_string()))?;

        Ok(Self {
            constants,
            epoch: elements.datetime.and_utc(),
            catalog_number: elements.norad_id,
            inclination_deg: elements.inclination,
            mean_motion: elements.mean_motion,
        })
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn catalog_number(&self) -> u64 {
        self.catalog_number
    }

    pub fn inclination_deg(&self) -> f64 {
        self.inclination_deg
    }

    /// Revolutions per day.
    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }

    pub fn minutes_since_epoch(&self, instant: DateTime<Utc>) -> f64 {
        (instant - self.epoch).num_milliseconds() as f64 / MILLIS_PER_MINUTE
    }

    pub fn position_at(&self, instant: DateTime<Utc>) -> Option<EciPosition> {
        let minutes = sgp4::MinutesSinceEpoch(self.minutes_since_epoch(instant));
        match self.constants.propagate(minutes) {
            Ok(prediction) => Some(Vector3::from(prediction.position)),
            Err(e) => {
                log::trace!("SGP4 failed for {}: {}", self.catalog_number, e);
                None
            }
        }
    }
}

impl fmt::Debug for ElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementSet")
            .field("catalog_number", &self.catalog_number)
            .field("epoch", &self.epoch)
            .field("inclination_deg", &self.inclination_deg)
            .field("mean_motion", &self.mean_motion)
            .finish()
    }
}

/// Circular orbit through a known position, for records that only carry
/// lat/lon/alt plus mean motion and inclination.
///
/// The orbital plane is the one with the given inclination that passes through
/// the starting point on an ascending pass. If the starting latitude is beyond
/// what the inclination can reach, the point is pulled onto the highest
/// latitude of the orbit instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularOrbit {
    epoch: DateTime<Utc>,
    radius_km: f64,
    inclination: f64,
    raan: f64,
    arg_latitude_at_epoch: f64,
    // rad/s
    angular_rate: f64,
}

impl CircularOrbit {
    pub fn through(
        start: &Geodetic,
        mean_motion_rev_per_day: f64,
        inclination_deg: f64,
        epoch: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        let checks = [
            ("latitude", start.latitude_deg),
            ("longitude", start.longitude_deg),
            ("altitude", start.altitude_km),
            ("mean_motion", mean_motion_rev_per_day),
            ("inclination", inclination_deg),
        ];
        if let Some((name, _)) = checks.iter().find(|(_, value)| !value.is_finite()) {
            return Err(RecordError::NonFinite(name));
        }

        let r0 = geodetic_to_eci(start, greenwich_mean_sidereal_time(epoch));
        let radius_km = r0.norm();
        let inclination = inclination_deg.to_radians();
        let (sin_i, cos_i) = inclination.sin_cos();

        let sin_declination = if radius_km > 0.0 { r0.z / radius_km } else { 0.0 };
        let right_ascension = r0.y.atan2(r0.x);

        let arg_latitude_at_epoch = if sin_i.abs() < 1e-12 {
            0.0
        } else {
            (sin_declination / sin_i).clamp(-1.0, 1.0).asin()
        };
        let in_plane_angle = (cos_i * arg_latitude_at_epoch.sin()).atan2(arg_latitude_at_epoch.cos());
        let raan = right_ascension - in_plane_angle;

        Ok(Self {
            epoch,
            radius_km,
            inclination,
            raan,
            arg_latitude_at_epoch,
            angular_rate: mean_motion_rev_per_day * std::f64::consts::TAU / SECONDS_PER_DAY,
        })
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn position_at(&self, instant: DateTime<Utc>) -> Option<EciPosition> {
        let elapsed_seconds = (instant - self.epoch).num_microseconds()? as f64 / 1e6;
        let u = self.arg_latitude_at_epoch + self.angular_rate * elapsed_seconds;

        let (sin_u, cos_u) = u.sin_cos();
        let (sin_i, cos_i) = self.inclination.sin_cos();
        let (sin_o, cos_o) = self.raan.sin_cos();
        let r = self.radius_km;

        Some(Vector3::new(
            r * (cos_o * cos_u - sin_o * sin_u * cos_i),
            r * (sin_o * cos_u + cos_o * sin_u * cos_i),
            r * sin_u * sin_i,
        ))
    }
}

/// SGP4 for element sets, the circular model for simplified records.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardEphemeris;

impl EphemerisSource for StandardEphemeris {
    fn propagate(&self, state: &OrbitalState, instant: DateTime<Utc>) -> Option<EciPosition> {
        let position = match state {
            OrbitalState::ElementSet(set) => set.position_at(instant),
            OrbitalState::Circular(orbit) => orbit.position_at(instant),
        }?;

        if position.iter().all(|c| c.is_finite()) {
            Some(position)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::{Duration, TimeZone};

    const ISS_LINE1: &str =
        "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
    const ISS_LINE2: &str =
        "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_circular_starts_where_asked() {
        let start = Geodetic::new(0.0, 0.0, 0.0);
        let orbit = CircularOrbit::through(&start, 0.0, 0.0, epoch()).unwrap();
        let geodetic = StandardEphemeris.to_geodetic(
            &orbit.position_at(epoch()).unwrap(),
            epoch(),
        );
        assert_abs_diff_eq!(geodetic.latitude_deg, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(geodetic.longitude_deg, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(geodetic.altitude_km, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(
            orbit.radius_km(),
            crate::consts::WGS72_EQUATORIAL_RADIUS_KM,
            epsilon = 1e-6
        );

        let start = Geodetic::new(35.0, -120.0, 550.0);
        let orbit = CircularOrbit::through(&start, 15.1, 53.0, epoch()).unwrap();
        let geodetic = StandardEphemeris.to_geodetic(
            &orbit.position_at(epoch()).unwrap(),
            epoch(),
        );
        assert_abs_diff_eq!(geodetic.latitude_deg, 35.0, epsilon = 1e-6);
        assert_abs_diff_eq!(geodetic.longitude_deg, -120.0, epsilon = 1e-6);
    }

    #[test]
    fn test_circular_moves_in_plane() {
        let start = Geodetic::new(10.0, 40.0, 420.0);
        let orbit = CircularOrbit::through(&start, 15.5, 51.6, epoch()).unwrap();

        let quarter_period = SECONDS_PER_DAY / 15.5 / 4.0;
        let later = epoch() + Duration::microseconds((quarter_period * 1e6) as i64);

        let p0 = orbit.position_at(epoch()).unwrap();
        let p1 = orbit.position_at(later).unwrap();
        assert_relative_eq!(p0.norm(), p1.norm(), max_relative = 1e-12);
        assert_abs_diff_eq!(p0.angle(&p1), std::f64::consts::FRAC_PI_2, epsilon = 1e-6);

        // Never climbs above the inclination
        for minutes in (0..200).step_by(7) {
            let p = orbit
                .position_at(epoch() + Duration::minutes(minutes))
                .unwrap();
            assert!((p.z / p.norm()).asin().to_degrees() <= 51.6 + 1e-9);
        }
    }

    #[test]
    fn test_circular_unreachable_latitude_is_clamped() {
        let start = Geodetic::new(70.0, 0.0, 500.0);
        let orbit = CircularOrbit::through(&start, 15.0, 30.0, epoch()).unwrap();
        let p = orbit.position_at(epoch()).unwrap();
        assert_abs_diff_eq!((p.z / p.norm()).asin().to_degrees(), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_circular_rejects_nan() {
        let start = Geodetic::new(f64::NAN, 0.0, 0.0);
        assert_eq!(
            CircularOrbit::through(&start, 15.0, 30.0, epoch()).unwrap_err(),
            RecordError::NonFinite("latitude")
        );
        let start = Geodetic::new(0.0, 0.0, 0.0);
        assert_eq!(
            CircularOrbit::through(&start, f64::INFINITY, 30.0, epoch()).unwrap_err(),
            RecordError::NonFinite("mean_motion")
        );
    }

    #[test]
    fn test_sgp4_element_set() {
        let set = ElementSet::from_lines(Some("ISS (ZARYA)"), ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(set.catalog_number(), 25544);
        assert_abs_diff_eq!(set.inclination_deg(), 51.6461, epsilon = 1e-9);
        assert_abs_diff_eq!(set.mean_motion(), 15.49507896, epsilon = 1e-8);
        assert_abs_diff_eq!(set.minutes_since_epoch(set.epoch()), 0.0);

        let state = OrbitalState::ElementSet(Box::new(set));
        let epoch = match &state {
            OrbitalState::ElementSet(set) => set.epoch(),
            OrbitalState::Circular(_) => unreachable!(),
        };

        for minutes in [0, 30, 90] {
            let instant = epoch + Duration::minutes(minutes);
            let position = StandardEphemeris.propagate(&state, instant).unwrap();
            let geodetic = StandardEphemeris.to_geodetic(&position, instant);
            assert!(
                (300.0..500.0).contains(&geodetic.altitude_km),
                "ISS altitude was {}",
                geodetic.altitude_km
            );
            assert!(geodetic.latitude_deg.abs() <= 52.0);
        }
    }

    #[test]
    fn test_bad_element_set() {
        assert!(matches!(
            ElementSet::from_lines(None, "1 garbage", "2 garbage"),
            Err(RecordError::ElementSet(_))
        ));
    }
}
