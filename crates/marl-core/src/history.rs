//! Generation markers for time-dependent property histories.

use std::fmt;

/// Which generation of a property's value history to address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Generation {
    /// The value being computed this step.
    Current,
    /// The value from the previous step.
    Old,
    /// The value from two steps prior.
    Older,
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Old => write!(f, "old"),
            Self::Older => write!(f, "older"),
        }
    }
}

/// How much history a property retains.
///
/// Decided by the superset of generations ever declared or requested
/// for the property; promotion only ever moves upward. `Current` means
/// no retained history (the property is stateless).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HistoryDepth {
    /// Current generation only; nothing survives rotation.
    Current,
    /// Current plus the previous step.
    Old,
    /// Current plus the previous and second-previous steps.
    Older,
}

impl HistoryDepth {
    /// The depth required to serve a request for `generation`.
    pub fn for_generation(generation: Generation) -> Self {
        match generation {
            Generation::Current => Self::Current,
            Generation::Old => Self::Old,
            Generation::Older => Self::Older,
        }
    }

    /// Whether this depth retains the given generation.
    pub fn retains(&self, generation: Generation) -> bool {
        *self >= Self::for_generation(generation)
    }

    /// Promote to at least `other`; never downgrades.
    pub fn promote(&mut self, other: Self) {
        if other > *self {
            *self = other;
        }
    }

    /// Whether any history beyond the current generation is retained.
    pub fn is_stateful(&self) -> bool {
        *self > Self::Current
    }
}

impl fmt::Display for HistoryDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Old => write!(f, "current+old"),
            Self::Older => write!(f, "current+old+older"),
        }
    }
}
