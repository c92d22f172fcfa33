//! Raw tracked-object records, as they arrive from a payload.
//!
//! Two record shapes are understood: element sets (TLE lines, optionally with
//! the Space-Track catalog fields) and simplified records carrying a position
//! plus mean motion and inclination. Payloads may be a JSON array of either,
//! the same array wrapped as `{"data": ...}`, or plain two/three-line text.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{DataError, RecordError};
use crate::math::geodetic::Geodetic;

use super::ephemeris::{CircularOrbit, ElementSet, OrbitalState};
use super::risk::{self, RiskFactors, RiskLevel};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawRecord {
    ElementSet(ElementSetRecord),
    Geodetic(GeodeticRecord),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElementSetRecord {
    #[serde(default, alias = "tle0", alias = "OBJECT_NAME")]
    pub name: Option<String>,
    #[serde(alias = "tle1", alias = "TLE_LINE1")]
    pub line1: String,
    #[serde(alias = "tle2", alias = "TLE_LINE2")]
    pub line2: String,
    #[serde(
        default,
        rename = "NORAD_CAT_ID",
        alias = "norad_cat_id",
        deserialize_with = "lenient::catalog_number"
    )]
    pub catalog_number: Option<u64>,
    #[serde(default, rename = "Priority", alias = "priority")]
    pub priority: Option<String>,
    #[serde(default, rename = "BSTAR", deserialize_with = "lenient::number")]
    pub bstar: Option<f64>,
    #[serde(default, rename = "PERIAPSIS", deserialize_with = "lenient::number")]
    pub periapsis: Option<f64>,
    #[serde(default, rename = "MEAN_MOTION", deserialize_with = "lenient::number")]
    pub mean_motion: Option<f64>,
    #[serde(default, rename = "RCS_SIZE")]
    pub rcs_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeodeticRecord {
    #[serde(default, alias = "OBJECT_NAME")]
    pub name: Option<String>,
    #[serde(alias = "lat", deserialize_with = "lenient::required_number")]
    pub latitude: f64,
    #[serde(alias = "lon", deserialize_with = "lenient::required_number")]
    pub longitude: f64,
    #[serde(alias = "alt", deserialize_with = "lenient::required_number")]
    pub altitude: f64,
    /// rev/day
    #[serde(default, alias = "MEAN_MOTION", deserialize_with = "lenient::number")]
    pub mean_motion: Option<f64>,
    /// degrees
    #[serde(default, alias = "INCLINATION", deserialize_with = "lenient::number")]
    pub inclination: Option<f64>,
    #[serde(
        default,
        rename = "NORAD_CAT_ID",
        alias = "norad_cat_id",
        deserialize_with = "lenient::catalog_number"
    )]
    pub catalog_number: Option<u64>,
    #[serde(default, rename = "Priority", alias = "priority")]
    pub priority: Option<String>,
}

impl RawRecord {
    pub fn name(&self) -> Option<&str> {
        match self {
            RawRecord::ElementSet(r) => r.name.as_deref(),
            RawRecord::Geodetic(r) => r.name.as_deref(),
        }
    }

    pub fn catalog_number(&self) -> Option<u64> {
        match self {
            RawRecord::ElementSet(r) => r.catalog_number,
            RawRecord::Geodetic(r) => r.catalog_number,
        }
    }

    /// An explicit priority label wins; otherwise element sets are scored
    /// from their catalog figures.
    pub fn priority(&self) -> Option<RiskLevel> {
        let (label, factors) = match self {
            RawRecord::ElementSet(r) => (
                r.priority.as_deref(),
                Some(RiskFactors {
                    bstar: r.bstar,
                    periapsis: r.periapsis,
                    mean_motion: r.mean_motion,
                    rcs_size: r.rcs_size.clone(),
                }),
            ),
            RawRecord::Geodetic(r) => (r.priority.as_deref(), None),
        };

        label
            .and_then(RiskLevel::from_label)
            .or_else(|| factors.as_ref().and_then(risk::assess))
    }

    /// Builds the propagation input. `epoch` anchors the circular model; element
    /// sets carry their own epoch.
    pub fn orbital_state(&self, epoch: DateTime<Utc>) -> Result<OrbitalState, RecordError> {
        match self {
            RawRecord::ElementSet(r) => {
                let set = ElementSet::from_lines(r.name.as_deref(), &r.line1, &r.line2)?;
                Ok(OrbitalState::ElementSet(Box::new(set)))
            }
            RawRecord::Geodetic(r) => {
                let start = Geodetic::new(r.latitude, r.longitude, r.altitude);
                let orbit = CircularOrbit::through(
                    &start,
                    r.mean_motion.unwrap_or(0.0),
                    // Lowest inclination that still reaches the starting latitude
                    r.inclination.unwrap_or(r.latitude.abs()),
                    epoch,
                )?;
                Ok(OrbitalState::Circular(orbit))
            }
        }
    }
}

/// Parses any supported payload shape into records. Individual records that
/// don't match either shape are logged and skipped.
pub fn parse_payload(text: &str) -> Result<Vec<RawRecord>, DataError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DataError::EmptyPayload);
    }

    if text.starts_with('[') || text.starts_with('{') {
        let value: Value = serde_json::from_str(text)?;
        records_from_json(value)
    } else {
        let records = parse_element_text(text);
        if records.is_empty() {
            Err(DataError::NoRecords)
        } else {
            Ok(records)
        }
    }
}

fn records_from_json(value: Value) -> Result<Vec<RawRecord>, DataError> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping record {}: {}", index, e);
                    None
                }
            })
            .collect()),
        Value::Object(mut map) => {
            if let Some(error) = map.remove("error") {
                let message = match error {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                return Err(DataError::Upstream(message));
            }

            match map.remove("data") {
                // Some servers double-encode the array
                Some(Value::String(inner)) => parse_payload(&inner),
                Some(inner) => records_from_json(inner),
                None => {
                    let record = serde_json::from_value(Value::Object(map))
                        .map_err(|_| DataError::NoRecords)?;
                    Ok(vec![record])
                }
            }
        }
        _ => Err(DataError::NoRecords),
    }
}

/// Reads CelesTrak-style text: optional name line, then lines `1 ...` and
/// `2 ...`. Lines that don't fit the pattern are skipped.
pub fn parse_element_text(text: &str) -> Vec<RawRecord> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut records = Vec::new();
    let mut name: Option<&str> = None;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let line2 = lines.get(i + 1).filter(|next| next.starts_with("2 "));

        match line2 {
            Some(line2) if line.starts_with("1 ") => {
                records.push(RawRecord::ElementSet(ElementSetRecord {
                    name: name.take().map(str::to_owned),
                    line1: line.to_owned(),
                    line2: (*line2).to_owned(),
                    catalog_number: None,
                    priority: None,
                    bstar: None,
                    periapsis: None,
                    mean_motion: None,
                    rcs_size: None,
                }));
                i += 2;
            }
            _ => {
                if let Some(orphan) = name.replace(line) {
                    log::warn!("Ignoring line without element set: {:?}", orphan);
                }
                i += 1;
            }
        }
    }

    if let Some(orphan) = name {
        log::warn!("Ignoring line without element set: {:?}", orphan);
    }

    records
}

mod lenient {
    //! Catalog feeds are inconsistent about quoting numbers.

    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    fn parse<E: Error>(value: NumberOrText) -> Result<Option<f64>, E> {
        match value {
            NumberOrText::Number(n) => Ok(Some(n)),
            NumberOrText::Text(s) if s.trim().is_empty() => Ok(None),
            NumberOrText::Text(s) => s.trim().parse().map(Some).map_err(E::custom),
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<NumberOrText>::deserialize(deserializer)? {
            Some(value) => parse(value),
            None => Ok(None),
        }
    }

    pub fn required_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        parse::<D::Error>(NumberOrText::deserialize(deserializer)?)?
            .ok_or_else(|| D::Error::custom("expected a number, got an empty string"))
    }

    pub fn catalog_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        match number(deserializer)? {
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 => Ok(Some(n as u64)),
            Some(n) => Err(D::Error::custom(format!("{} is not a catalog number", n))),
            None => Ok(None),
        }
    }
}
