use chrono::{DateTime, Utc};

const UNIX_EPOCH_JULIAN_DATE: f64 = 2_440_587.5;
const J2000_JULIAN_DATE: f64 = 2_451_545.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;
const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

const GMST_BASE_DEG: f64 = 280.460_618_37;
const GMST_ROTATION_PER_DAY: f64 = 360.985_647_366_29;
const GMST_CORRECTION: f64 = 0.000_387_933;
const GMST_CUBIC_DIVISOR: f64 = 38_710_000.0;

pub fn julian_date(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64 / MILLIS_PER_DAY + UNIX_EPOCH_JULIAN_DATE
}

/// Greenwich mean sidereal time, in radians in [0, 2pi).
pub fn greenwich_mean_sidereal_time(instant: DateTime<Utc>) -> f64 {
    let days_since_j2000 = julian_date(instant) - J2000_JULIAN_DATE;
    let centuries = days_since_j2000 / DAYS_PER_JULIAN_CENTURY;

    let degrees = GMST_BASE_DEG + GMST_ROTATION_PER_DAY * days_since_j2000
        + GMST_CORRECTION * centuries * centuries
        - centuries * centuries * centuries / GMST_CUBIC_DIVISOR;

    degrees.rem_euclid(360.0).to_radians()
}
