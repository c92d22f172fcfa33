use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use nalgebra::Point3;

use crate::error::RecordError;
use crate::math::geodetic::{Geodetic, GeodeticProjector};

use super::ephemeris::{EphemerisSource, OrbitalState};
use super::record::RawRecord;
use super::risk::RiskLevel;

/// Stable identity of a tracked object: its catalog number when known,
/// otherwise its display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for ObjectId {
    fn from(catalog_number: u64) -> Self {
        Self(catalog_number.to_string())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Display-only metadata carried alongside each object.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxAttributes {
    pub catalog_number: Option<u64>,
    pub priority: Option<RiskLevel>,
    /// Where the object was when the registry was loaded.
    pub initial_geodetic: Geodetic,
}

#[derive(Debug)]
pub struct TrackedObject {
    id: ObjectId,
    display_name: String,
    orbital_state: OrbitalState,
    last_position: Point3<f64>,
    aux: AuxAttributes,
}

impl TrackedObject {
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn orbital_state(&self) -> &OrbitalState {
        &self.orbital_state
    }

    /// Render-space position from the most recent successful propagation.
    pub fn last_position(&self) -> Point3<f64> {
        self.last_position
    }

    pub fn aux(&self) -> &AuxAttributes {
        &self.aux
    }

    pub(crate) fn set_last_position(&mut self, position: Point3<f64>) {
        self.last_position = position;
    }
}

/// Strips the `0 ` line marker that three-line element sets put in front of
/// names, plus surrounding whitespace.
pub fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_marker = match trimmed.strip_prefix('0') {
        // A bare marker is a line with no name at all
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest,
        _ => trimmed,
    };
    without_marker.trim().to_owned()
}

/// All objects tracked during one session. Populated once, then only the
/// positions change.
#[derive(Debug, Default)]
pub struct TrackedObjectRegistry {
    objects: Vec<TrackedObject>,
    index: HashMap<ObjectId, usize>,
}

impl TrackedObjectRegistry {
    /// Builds a tracked object for each usable record. Records whose state
    /// can't be built, whose first propagation fails, or whose id is already
    /// taken are logged and left out.
    pub fn load<I>(
        records: I,
        ephemeris: &dyn EphemerisSource,
        projector: &GeodeticProjector,
        instant: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut registry = Self::default();
        let mut total = 0;

        for (position, record) in records.into_iter().enumerate() {
            total += 1;
            let object = match build_object(position, &record, ephemeris, projector, instant) {
                Ok(object) => object,
                Err(e) => {
                    log::warn!(
                        "Skipping record {} ({}): {}",
                        position,
                        record.name().unwrap_or("unnamed"),
                        e
                    );
                    continue;
                }
            };

            if registry.index.contains_key(&object.id) {
                log::warn!(
                    "Skipping record {}: id {} is already tracked",
                    position,
                    object.id
                );
                continue;
            }

            registry
                .index
                .insert(object.id.clone(), registry.objects.len());
            registry.objects.push(object);
        }

        log::info!("Tracking {} of {} records", registry.len(), total);
        registry
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackedObject> {
        self.objects.iter_mut()
    }

    pub fn get(&self, id: &ObjectId) -> Option<&TrackedObject> {
        self.index.get(id).map(|&i| &self.objects[i])
    }
}

fn build_object(
    position_in_payload: usize,
    record: &RawRecord,
    ephemeris: &dyn EphemerisSource,
    projector: &GeodeticProjector,
    instant: DateTime<Utc>,
) -> Result<TrackedObject, RecordError> {
    let orbital_state = record.orbital_state(instant)?;

    let catalog_number = record.catalog_number().or(match &orbital_state {
        OrbitalState::ElementSet(set) => Some(set.catalog_number()),
        OrbitalState::Circular(_) => None,
    });
    let name = record
        .name()
        .map(normalize_name)
        .filter(|name| !name.is_empty());

    let id = match (catalog_number, &name) {
        (Some(number), _) => ObjectId::from(number),
        (None, Some(name)) => ObjectId::new(name.as_str()),
        (None, None) => ObjectId::new(format!("object-{}", position_in_payload)),
    };
    let display_name = name.unwrap_or_else(|| id.to_string());

    let eci = ephemeris
        .propagate(&orbital_state, instant)
        .ok_or(RecordError::InitialPropagation)?;
    let geodetic = ephemeris.to_geodetic(&eci, instant);
    if !geodetic.is_finite() {
        return Err(RecordError::InitialPropagation);
    }

    Ok(TrackedObject {
        id,
        display_name,
        orbital_state,
        last_position: projector.project_geodetic(&geodetic),
        aux: AuxAttributes {
            catalog_number,
            priority: record.priority(),
            initial_geodetic: geodetic,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use crate::model::ephemeris::{EciPosition, StandardEphemeris};
    use crate::model::record::parse_payload;

    /// Reads positions back as (lat, lon, alt) and never fails.
    struct Passthrough;

    impl EphemerisSource for Passthrough {
        fn propagate(&self, _: &OrbitalState, _: DateTime<Utc>) -> Option<EciPosition> {
            Some(EciPosition::new(10.0, 20.0, 30.0))
        }

        fn to_geodetic(&self, position: &EciPosition, _: DateTime<Utc>) -> Geodetic {
            Geodetic::new(position.x, position.y, position.z)
        }
    }

    struct AlwaysFails;

    impl EphemerisSource for AlwaysFails {
        fn propagate(&self, _: &OrbitalState, _: DateTime<Utc>) -> Option<EciPosition> {
            None
        }
    }

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn records(json: &str) -> Vec<RawRecord> {
        parse_payload(json).unwrap()
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("0 TESTSAT"), "TESTSAT");
        assert_eq!(normalize_name("  0\tISS (ZARYA)  "), "ISS (ZARYA)");
        assert_eq!(normalize_name("007 SAT"), "007 SAT");
        assert_eq!(normalize_name("0 "), "");
        assert_eq!(normalize_name("0"), "");
        assert_eq!(normalize_name("0"), normalize_name(" 0\t"));
        assert_eq!(normalize_name("STARLINK-1007"), "STARLINK-1007");
    }

    #[test]
    fn test_load_assigns_ids_and_names() {
        let registry = TrackedObjectRegistry::load(
            records(
                r#"[
                    {"name": "0 ALPHA", "lat": 0, "lon": 0, "alt": 0, "NORAD_CAT_ID": 1001},
                    {"name": "BETA", "lat": 0, "lon": 0, "alt": 0},
                    {"name": "   ", "lat": 0, "lon": 0, "alt": 0, "NORAD_CAT_ID": "7"},
                    {"lat": 0, "lon": 0, "alt": 0}
                ]"#,
            ),
            &Passthrough,
            &GeodeticProjector::default(),
            instant(),
        );
        assert_eq!(registry.len(), 4);

        let alpha = registry.get(&ObjectId::from(1001)).unwrap();
        assert_eq!(alpha.display_name(), "ALPHA");
        assert_eq!(alpha.aux().catalog_number, Some(1001));

        let beta = registry.get(&ObjectId::new("BETA")).unwrap();
        assert_eq!(beta.aux().catalog_number, None);

        assert_eq!(registry.get(&ObjectId::new("7")).unwrap().display_name(), "7");
        assert_eq!(
            registry.get(&ObjectId::new("object-3")).unwrap().display_name(),
            "object-3"
        );
    }

    #[test]
    fn test_load_projects_initial_position() {
        let projector = GeodeticProjector::new(2.0);
        let registry = TrackedObjectRegistry::load(
            records(r#"[{"name": "A", "lat": 1, "lon": 2, "alt": 3}]"#),
            &Passthrough,
            &projector,
            instant(),
        );
        let object = registry.iter().next().unwrap();
        assert_abs_diff_eq!(
            object.last_position(),
            projector.project(10.0, 20.0, 30.0),
            epsilon = 1e-12
        );
        assert_eq!(object.aux().initial_geodetic, Geodetic::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn test_bare_marker_names_fall_back_to_position() {
        let registry = TrackedObjectRegistry::load(
            records(
                r#"[
                    {"name": "0 ", "lat": 0, "lon": 0, "alt": 0},
                    {"name": "0", "lat": 10, "lon": 0, "alt": 0}
                ]"#,
            ),
            &Passthrough,
            &GeodeticProjector::default(),
            instant(),
        );
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(&ObjectId::new("object-0")).unwrap().display_name(),
            "object-0"
        );
        assert!(registry.get(&ObjectId::new("object-1")).is_some());
        assert!(registry.get(&ObjectId::new("0")).is_none());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let registry = TrackedObjectRegistry::load(
            records(
                r#"[
                    {"name": "FIRST", "lat": 0, "lon": 0, "alt": 0, "NORAD_CAT_ID": 5},
                    {"name": "SECOND", "lat": 0, "lon": 0, "alt": 0, "NORAD_CAT_ID": 5},
                    {"name": "SAME", "lat": 0, "lon": 0, "alt": 0},
                    {"name": "0 SAME", "lat": 0, "lon": 0, "alt": 0}
                ]"#,
            ),
            &Passthrough,
            &GeodeticProjector::default(),
            instant(),
        );
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&ObjectId::from(5)).unwrap().display_name(), "FIRST");
    }

    #[test]
    fn test_invalid_records_are_excluded() {
        let payload = r#"[
            {"name": "NAN", "lat": "nan", "lon": 0, "alt": 0},
            {"name": "BAD TLE", "tle1": "1 nope", "tle2": "2 nope"},
            {"name": "GOOD", "lat": 0, "lon": 0, "alt": 0}
        ]"#;

        let registry = TrackedObjectRegistry::load(
            records(payload),
            &StandardEphemeris,
            &GeodeticProjector::default(),
            instant(),
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&ObjectId::new("GOOD")).is_some());

        let registry = TrackedObjectRegistry::load(
            records(payload),
            &AlwaysFails,
            &GeodeticProjector::default(),
            instant(),
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_geodetic_record_starts_at_its_fix() {
        let registry = TrackedObjectRegistry::load(
            records(r#"[{"name": "HIGH", "lat": -45, "lon": 120, "alt": 800}]"#),
            &StandardEphemeris,
            &GeodeticProjector::default(),
            instant(),
        );
        let start = registry.get(&ObjectId::new("HIGH")).unwrap().aux().initial_geodetic;
        assert_abs_diff_eq!(start.latitude_deg, -45.0, epsilon = 1e-6);
        assert_abs_diff_eq!(start.longitude_deg, 120.0, epsilon = 1e-6);
        assert_abs_diff_eq!(start.altitude_km, 800.0, epsilon = 1e-3);
    }

    #[test]
    fn test_element_set_id_from_lines() {
        let text = "0 ISS (ZARYA)\n\
            1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992\n\
            2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";
        let registry = TrackedObjectRegistry::load(
            records(text),
            &Passthrough,
            &GeodeticProjector::default(),
            instant(),
        );
        let iss = registry.get(&ObjectId::from(25544)).unwrap();
        assert_eq!(iss.display_name(), "ISS (ZARYA)");
        assert_eq!(iss.aux().catalog_number, Some(25544));
    }
}
