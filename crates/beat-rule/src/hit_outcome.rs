use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of judging one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HitOutcome {
    Perfect,
    Good,
    Miss,
}

impl HitOutcome {
    /// Points before the combo multiplier.
    pub fn base_points(self) -> u64 {
        match self {
            Self::Perfect => 300,
            Self::Good => 200,
            Self::Miss => 0,
        }
    }

    pub fn breaks_combo(self) -> bool {
        self == Self::Miss
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Perfect => "PERFECT",
            Self::Good => "GOOD",
            Self::Miss => "MISS",
        }
    }
}

impl fmt::Display for HitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_points() {
        assert_eq!(HitOutcome::Perfect.base_points(), 300);
        assert_eq!(HitOutcome::Good.base_points(), 200);
        assert_eq!(HitOutcome::Miss.base_points(), 0);
    }

    #[test]
    fn only_miss_breaks_combo() {
        assert!(!HitOutcome::Perfect.breaks_combo());
        assert!(!HitOutcome::Good.breaks_combo());
        assert!(HitOutcome::Miss.breaks_combo());
    }

    #[test]
    fn serde_uppercase() {
        assert_eq!(
            serde_json::to_string(&HitOutcome::Perfect).unwrap(),
            "\"PERFECT\""
        );
        let o: HitOutcome = serde_json::from_str("\"GOOD\"").unwrap();
        assert_eq!(o, HitOutcome::Good);
        assert_eq!(HitOutcome::Miss.to_string(), "MISS");
    }
}
