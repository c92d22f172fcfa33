pub mod geodetic;
pub mod geometry;
pub mod sidereal;
