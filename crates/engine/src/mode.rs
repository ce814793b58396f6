//! Split modes and the seeding strategies behind them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AssignmentStore, EngineError};

/// Which splitting strategy drives the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    #[default]
    BySeat,
    Custom,
    Even,
    /// Behaviour pending product clarification; seeded by a pluggable
    /// strategy that defaults to [`KeepAssignments`].
    ByPrice,
}

impl SplitMode {
    pub const ALL: [SplitMode; 4] = [Self::BySeat, Self::Custom, Self::Even, Self::ByPrice];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BySeat => "by_seat",
            Self::Custom => "custom",
            Self::Even => "even",
            Self::ByPrice => "by_price",
        }
    }

    /// Whether item-level assignment matters in this mode.
    pub fn uses_items(self) -> bool {
        !matches!(self, Self::Even)
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SplitMode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "by_seat" | "seat" => Ok(Self::BySeat),
            "custom" => Ok(Self::Custom),
            "even" => Ok(Self::Even),
            "by_price" | "price" => Ok(Self::ByPrice),
            other => Err(EngineError::InvalidOrder(format!(
                "unknown split mode: {other}"
            ))),
        }
    }
}

/// Decides what the store looks like when a mode is entered.
pub trait SeedStrategy: fmt::Debug + Send + Sync {
    fn seed(&self, store: &mut AssignmentStore);
}

/// Regroup whole items into one check per seat.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeatSeeding;

impl SeedStrategy for SeatSeeding {
    fn seed(&self, store: &mut AssignmentStore) {
        *store = AssignmentStore::by_seat(store.items());
    }
}

/// Keep the user's working set as it is.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeepAssignments;

impl SeedStrategy for KeepAssignments {
    fn seed(&self, store: &mut AssignmentStore) {
        store.clear_selection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_spellings() {
        assert_eq!(SplitMode::try_from("by-seat").unwrap(), SplitMode::BySeat);
        assert_eq!(SplitMode::try_from("BY_PRICE").unwrap(), SplitMode::ByPrice);
        assert_eq!(SplitMode::try_from(" even ").unwrap(), SplitMode::Even);
        assert!(SplitMode::try_from("random").is_err());
    }

    #[test]
    fn display_round_trips_through_try_from() {
        for mode in SplitMode::ALL {
            assert_eq!(SplitMode::try_from(mode.as_str()).unwrap(), mode);
        }
    }
}
