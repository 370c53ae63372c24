//! Risk classification value objects

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of weather hazard detected in the forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    Rain,
    HeavyRain,
    Thunderstorm,
    HighWind,
    Overcast,
    HeatWave,
}

impl RiskKind {
    /// Short German label used in compact report texts
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rain => "Regen",
            Self::HeavyRain => "Starkregen",
            Self::Thunderstorm => "Gewitter",
            Self::HighWind => "Wind",
            Self::Overcast => "Bewölkung",
            Self::HeatWave => "Hitze",
        }
    }
}

impl fmt::Display for RiskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Severity tier of a single detected risk
///
/// Ordered so that `Low < Moderate < High < VeryHigh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Classify a value against an ascending three-step tier table
    ///
    /// Values at or above `tiers[2]` are `VeryHigh`, at or above `tiers[1]`
    /// are `High`, at or above `tiers[0]` are `Moderate`, otherwise `Low`.
    #[must_use]
    pub fn from_tiers(value: f64, tiers: [f64; 3]) -> Self {
        if value >= tiers[2] {
            Self::VeryHigh
        } else if value >= tiers[1] {
            Self::High
        } else if value >= tiers[0] {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vigilance colour scale used by the French national weather service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl AlertLevel {
    /// Parse a colour name, case-insensitive
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "orange" => Some(Self::Orange),
            "red" => Some(Self::Red),
            _ => None,
        }
    }

    /// Numeric priority, green is 1 and red is 4
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Green => 1,
            Self::Yellow => 2,
            Self::Orange => 3,
            Self::Red => 4,
        }
    }

    /// Whether the level is worth surfacing to the hiker (yellow or worse)
    #[must_use]
    pub const fn is_notable(self) -> bool {
        self.priority() >= 2
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
