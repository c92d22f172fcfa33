use std::fmt;

/// Collision-risk priority shown alongside a tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }

    /// Accepts the full label ("High Risk") or just the level ("high").
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        let level = label.strip_suffix("risk").unwrap_or(&label).trim();
        match level {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }

    fn from_score(score: u32) -> Self {
        if score >= 15 {
            RiskLevel::High
        } else if score >= 10 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Orbit and size figures used to score a debris object.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RiskFactors {
    pub bstar: Option<f64>,
    /// km
    pub periapsis: Option<f64>,
    /// rev/day
    pub mean_motion: Option<f64>,
    pub rcs_size: Option<String>,
}

impl RiskFactors {
    fn is_empty(&self) -> bool {
        self.bstar.is_none()
            && self.periapsis.is_none()
            && self.mean_motion.is_none()
            && self.rcs_size.is_none()
    }
}

/// Scores the factors into a level. Missing figures count as zero (and an
/// unknown size as small); with nothing to go on at all, there's no level.
pub fn assess(factors: &RiskFactors) -> Option<RiskLevel> {
    if factors.is_empty() {
        return None;
    }

    let bstar = match factors.bstar.unwrap_or(0.0) {
        b if b > 1e-3 => 3,
        b if b > 1e-4 => 2,
        _ => 1,
    };

    let periapsis_km = factors.periapsis.unwrap_or(0.0);
    let periapsis = if periapsis_km < 200.0 {
        3
    } else if periapsis_km <= 300.0 {
        2
    } else {
        1
    };

    let mean_motion = match factors.mean_motion.unwrap_or(0.0) {
        m if m > 15.5 => 3,
        m if m >= 15.0 => 2,
        _ => 1,
    };

    let size = match factors.rcs_size.as_deref() {
        Some(s) if s.trim().eq_ignore_ascii_case("medium") => 2,
        _ => 1,
    };

    // 600-800 km is the most congested band
    let crowded = if (600.0..=800.0).contains(&periapsis_km) {
        2
    } else {
        0
    };

    let score = 3 * bstar + 2 * periapsis + 2 * mean_motion + size + 2 * crowded;
    Some(RiskLevel::from_score(score))
}
