use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::error::ClockError;

// Smallest step the clock will ever take, so consecutive frames always see
// distinct instants.
const MIN_STEP_MICROS: i64 = 1;
/// Largest simulated step per frame, about 31.7 years.
pub const MAX_STEP_MS: f64 = 1e12;
/// Largest time multiplier, so one real second still fits in `MAX_STEP_MS`.
pub const MAX_MULTIPLIER: f64 = 1e9;

/// How much simulated time passes per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockMode {
    /// Constant step regardless of frame timing. Deterministic, but drifts
    /// from wall time when the frame rate varies.
    FixedStep { step_ms: f64 },
    /// Real elapsed time scaled by `multiplier`.
    WallClockScaled { multiplier: f64 },
}

impl ClockMode {
    /// Both parameters must be positive and no larger than `MAX_STEP_MS` and
    /// `MAX_MULTIPLIER` respectively. NaN fails both checks.
    pub fn validate(self) -> Result<Self, ClockError> {
        match self {
            ClockMode::FixedStep { step_ms } if !(step_ms > 0.0 && step_ms <= MAX_STEP_MS) => {
                Err(ClockError::InvalidStep(step_ms))
            }
            ClockMode::WallClockScaled { multiplier }
                if !(multiplier > 0.0 && multiplier <= MAX_MULTIPLIER) =>
            {
                Err(ClockError::InvalidMultiplier(multiplier))
            }
            mode => Ok(mode),
        }
    }
}

impl fmt::Display for ClockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockMode::FixedStep { step_ms } => write!(f, "fixed {} ms/frame", step_ms),
            ClockMode::WallClockScaled { multiplier } => write!(f, "{}x real time", multiplier),
        }
    }
}

/// Virtual timestamp that drives propagation.
///
/// The mode is chosen at construction and can't be changed afterwards, so a
/// session never mixes the two advancement policies.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    current: DateTime<Utc>,
    mode: ClockMode,
}

impl SimulatedClock {
    pub fn new(start: DateTime<Utc>, mode: ClockMode) -> Result<Self, ClockError> {
        Ok(Self {
            current: start,
            mode: mode.validate()?,
        })
    }

    pub fn current_instant(&self) -> DateTime<Utc> {
        self.current
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// The simulated step that `advance` would take for this real delta.
    pub fn step_for(&self, real_delta_ms: f64) -> Duration {
        let step_ms = match self.mode {
            ClockMode::FixedStep { step_ms } => step_ms,
            ClockMode::WallClockScaled { multiplier } => {
                // Negative or NaN deltas (clock hiccups) count as no time passing
                let real_delta_ms = if real_delta_ms.is_finite() {
                    real_delta_ms.max(0.0)
                } else {
                    0.0
                };
                real_delta_ms * multiplier
            }
        };

        // A long stall in wall-clock mode is capped like any other step
        let micros = (step_ms.min(MAX_STEP_MS) * 1000.0).round() as i64;
        Duration::microseconds(micros.max(MIN_STEP_MICROS))
    }

    /// Moves the clock forward by `step_for(real_delta_ms)`. Only the end of
    /// chrono's calendar, hundreds of thousands of years out, can stop it.
    pub fn advance(&mut self, real_delta_ms: f64) -> DateTime<Utc> {
        let step = self.step_for(real_delta_ms);
        // On overflow we stay put rather than wrap around
        if let Some(next) = self.current.checked_add_signed(step) {
            self.current = next;
        }
        self.current
    }
}
