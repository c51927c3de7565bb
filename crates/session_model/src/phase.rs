use std::fmt;

use serde::{Deserialize, Serialize};

/// One stage of the session lifecycle.
///
/// Variants are declared in lifecycle order so the derived `Ord` matches
/// [`PHASES`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Interview,
    LiveCoding,
    Final,
}

/// All phases in lifecycle order.
pub const PHASES: [Phase; 3] = [Phase::Interview, Phase::LiveCoding, Phase::Final];

impl Phase {
    /// Parses a wire name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "interview" => Some(Self::Interview),
            "live_coding" => Some(Self::LiveCoding),
            "final" => Some(Self::Final),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interview => "interview",
            Self::LiveCoding => "live_coding",
            Self::Final => "final",
        }
    }

    /// `final` admits no further transition.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Final)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of `phase` in [`PHASES`].
#[must_use]
pub fn phase_index(phase: Phase) -> i32 {
    match phase {
        Phase::Interview => 0,
        Phase::LiveCoding => 1,
        Phase::Final => 2,
    }
}

/// Position of a wire phase name, or `-1` when the name is unknown.
#[must_use]
pub fn phase_index_of(value: &str) -> i32 {
    Phase::parse(value).map_or(-1, phase_index)
}

/// A phase's affordance is enabled once the session has reached or passed it.
#[must_use]
pub fn is_available(current: Phase, target: Phase) -> bool {
    phase_index(current) >= phase_index(target)
}
