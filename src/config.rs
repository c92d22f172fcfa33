use clap::{Parser, ValueEnum};

use crate::consts::{
    DEFAULT_FIXED_STEP_MS, DEFAULT_GLOBE_RADIUS, DEFAULT_MARKER_RADIUS, DEFAULT_TIME_MULTIPLIER,
};
use crate::data::DataSource;
use crate::error::ConfigError;
use crate::model::clock::ClockMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClockModeArg {
    /// Real elapsed time, scaled by --multiplier
    WallClock,
    /// Constant --step-ms of simulated time per frame
    FixedStep,
}

/// Command-line options shared by the viewer and the headless tracker.
#[derive(Debug, Clone, Parser)]
pub struct Args {
    /// URL or file path of the tracked-object payload
    #[arg(short, long)]
    pub source: String,

    #[arg(long, value_enum, default_value_t = ClockModeArg::WallClock)]
    pub clock: ClockModeArg,

    /// Simulated seconds per real second (wall-clock mode)
    #[arg(long, default_value_t = DEFAULT_TIME_MULTIPLIER)]
    pub multiplier: f64,

    /// Simulated milliseconds per frame (fixed-step mode)
    #[arg(long, default_value_t = DEFAULT_FIXED_STEP_MS)]
    pub step_ms: f64,

    /// Globe radius in render units
    #[arg(long, default_value_t = DEFAULT_GLOBE_RADIUS)]
    pub globe_radius: f64,

    /// Marker (and pick) radius in render units
    #[arg(long, default_value_t = DEFAULT_MARKER_RADIUS)]
    pub marker_radius: f64,

    /// Frame rate limit
    #[arg(long, default_value_t = 60)]
    pub fps: u64,
}

/// Validated settings for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source: DataSource,
    pub clock_mode: ClockMode,
    pub globe_radius: f64,
    pub marker_radius: f64,
    pub fps: u64,
}

fn positive_length(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidRadius { name, value })
    }
}

impl Args {
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let clock_mode = match self.clock {
            ClockModeArg::WallClock => ClockMode::WallClockScaled {
                multiplier: self.multiplier,
            },
            ClockModeArg::FixedStep => ClockMode::FixedStep {
                step_ms: self.step_ms,
            },
        }
        .validate()?;

        if self.fps == 0 {
            return Err(ConfigError::InvalidFramerate);
        }

        let source = match self.source.parse() {
            Ok(source) => source,
            Err(never) => match never {},
        };

        Ok(Config {
            source,
            clock_mode,
            globe_radius: positive_length("globe radius", self.globe_radius)?,
            marker_radius: positive_length("marker radius", self.marker_radius)?,
            fps: self.fps,
        })
    }
}
