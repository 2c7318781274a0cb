//! Enumeration types for the Lifegrid simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Family a catalog pattern belongs to.
///
/// Categories group the pattern picker in the web client and the
/// `GET /api/patterns` listing. Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PatternCategory {
    /// Patterns that do not change from one generation to the next.
    StillLife,
    /// Patterns that return to their initial state after a fixed period.
    Oscillator,
    /// Patterns that translate themselves across the grid.
    Spaceship,
    /// Patterns that emit spaceships indefinitely.
    Generator,
}

impl PatternCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 4] = [
        Self::StillLife,
        Self::Oscillator,
        Self::Spaceship,
        Self::Generator,
    ];

    /// Wire name of the category (matches the serde representation).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StillLife => "still_life",
            Self::Oscillator => "oscillator",
            Self::Spaceship => "spaceship",
            Self::Generator => "generator",
        }
    }
}

impl core::fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_name_matches_as_str() {
        for category in PatternCategory::ALL {
            let json = serde_json::to_string(&category).ok();
            assert_eq!(json, Some(format!("\"{}\"", category.as_str())));
        }
    }

    #[test]
    fn parses_snake_case() {
        let parsed: Result<PatternCategory, _> = serde_json::from_str("\"still_life\"");
        assert_eq!(parsed.ok(), Some(PatternCategory::StillLife));
    }
}
