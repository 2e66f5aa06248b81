use std::fmt;

use serde::{Deserialize, Serialize};

/// Average damage level at or above which a division is high severity.
pub const HIGH_AVG_LEVEL: f64 = 7.0;
/// Total damage at or above which a division is high severity.
pub const HIGH_TOTAL_DAMAGE: f64 = 5_000_000.0;
/// Average damage level at or above which a division is at least medium severity.
pub const MEDIUM_AVG_LEVEL: f64 = 4.0;
/// Total damage at or above which a division is at least medium severity.
pub const MEDIUM_TOTAL_DAMAGE: f64 = 2_000_000.0;

/// Three-tier severity of a division, ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Classify from a bucket's average damage level and total damage. High is checked first.
    pub fn classify(avg_damage_level: f64, total_damage: f64) -> Self {
        if avg_damage_level >= HIGH_AVG_LEVEL || total_damage >= HIGH_TOTAL_DAMAGE {
            Severity::High
        } else if avg_damage_level >= MEDIUM_AVG_LEVEL || total_damage >= MEDIUM_TOTAL_DAMAGE {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
