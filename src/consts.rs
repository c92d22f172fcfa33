// Mean Earth radius used to scale altitudes into render space, in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// WGS-72, which is what SGP4 element sets are fitted against
pub const WGS72_EQUATORIAL_RADIUS_KM: f64 = 6378.135;
pub const WGS72_FLATTENING: f64 = 1.0 / 298.26;

pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const MILLIS_PER_MINUTE: f64 = 60_000.0;

// Render-space defaults
pub const DEFAULT_GLOBE_RADIUS: f64 = 1.0;
pub const DEFAULT_MARKER_RADIUS: f64 = 0.01;

// Simulated-time defaults
pub const DEFAULT_TIME_MULTIPLIER: f64 = 5.0;
pub const DEFAULT_FIXED_STEP_MS: f64 = 100.0;
