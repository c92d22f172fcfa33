use std::convert::Infallible;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::DataError;
use crate::model::record::{parse_payload, RawRecord};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the tracked-object payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl FromStr for DataSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(DataSource::Url(s.to_owned()))
        } else {
            Ok(DataSource::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => f.write_str(url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl DataSource {
    /// Raw payload text.
    pub fn fetch(&self) -> Result<String, DataError> {
        match self {
            DataSource::Url(url) => {
                let client = reqwest::blocking::Client::builder()
                    .timeout(FETCH_TIMEOUT)
                    .build()?;
                let response = client.get(url).send()?.error_for_status()?;
                Ok(response.text()?)
            }
            DataSource::File(path) => Ok(fs::read_to_string(path)?),
        }
    }

    pub fn fetch_records(&self) -> Result<Vec<RawRecord>, DataError> {
        parse_payload(&self.fetch()?)
    }
}

/// Fetches and parses records. Any failure is logged and gives no records, so
/// the session still starts with an empty globe.
pub fn load_records(source: &DataSource) -> Vec<RawRecord> {
    match source.fetch_records() {
        Ok(records) => {
            log::info!("Read {} records from {}", records.len(), source);
            records
        }
        Err(e) => {
            log::warn!("Could not load records from {}: {}", source, e);
            Vec::new()
        }
    }
}
