// Roster slot designations and position-string parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Football roster slots used for pick assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Kicker,
    Defense,
    Bench,
}

impl Slot {
    /// Every slot in display order.
    pub const ALL: [Slot; 7] = [
        Slot::Quarterback,
        Slot::RunningBack,
        Slot::WideReceiver,
        Slot::TightEnd,
        Slot::Kicker,
        Slot::Defense,
        Slot::Bench,
    ];

    /// Parse a position or slot string into a Slot.
    ///
    /// Provider CSVs disagree on spelling, so common variants are accepted:
    /// - "K" / "PK" / "Kicker" -> Kicker
    /// - "DST" / "D/ST" / "DEF" / "Defense" -> Defense
    /// - "BE" / "BN" / "Bench" -> Bench
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Slot::Quarterback),
            "RB" => Some(Slot::RunningBack),
            "WR" => Some(Slot::WideReceiver),
            "TE" => Some(Slot::TightEnd),
            "K" | "PK" | "KICKER" => Some(Slot::Kicker),
            "DST" | "D/ST" | "DEF" | "DEFENSE" => Some(Slot::Defense),
            "BE" | "BN" | "BENCH" => Some(Slot::Bench),
            _ => None,
        }
    }

    /// Return the display string for this slot.
    pub fn display_str(&self) -> &'static str {
        match self {
            Slot::Quarterback => "QB",
            Slot::RunningBack => "RB",
            Slot::WideReceiver => "WR",
            Slot::TightEnd => "TE",
            Slot::Kicker => "Kicker",
            Slot::Defense => "Defense",
            Slot::Bench => "Bench",
        }
    }

    /// Whether this is a starting slot (anything but Bench).
    pub fn is_primary(&self) -> bool {
        !matches!(self, Slot::Bench)
    }

    /// Deterministic ordering index for roster display.
    pub fn sort_order(&self) -> u8 {
        match self {
            Slot::Quarterback => 0,
            Slot::RunningBack => 1,
            Slot::WideReceiver => 2,
            Slot::TightEnd => 3,
            Slot::Kicker => 4,
            Slot::Defense => 5,
            Slot::Bench => 6,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}
