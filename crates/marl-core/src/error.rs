//! Shared error types for property evaluation.

use std::error::Error;
use std::fmt;

use crate::history::Generation;
use crate::id::PropertyId;

/// Errors raised while evaluating producers at quadrature points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalError {
    /// A producer's per-point evaluation failed.
    ProducerFailed {
        /// Name of the failing producer.
        producer: String,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A property slot does not exist in the store.
    PropertyUnavailable {
        /// The missing property.
        id: PropertyId,
    },
    /// A property was accessed with a value type other than the one it
    /// was declared with.
    TypeMismatch {
        /// The property.
        id: PropertyId,
        /// Type the storage holds.
        expected: &'static str,
        /// Type the access asked for.
        found: &'static str,
    },
    /// A generation was read that the property does not retain.
    GenerationUnavailable {
        /// The property.
        id: PropertyId,
        /// The generation asked for.
        generation: Generation,
    },
    /// A quadrature-point index beyond the sized point count.
    PointOutOfRange {
        /// The property.
        id: PropertyId,
        /// The index asked for.
        point: usize,
        /// Number of points the storage is sized for.
        n_points: usize,
    },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProducerFailed { producer, reason } => {
                write!(f, "producer '{producer}' failed: {reason}")
            }
            Self::PropertyUnavailable { id } => {
                write!(f, "property {id} has no storage slot")
            }
            Self::TypeMismatch {
                id,
                expected,
                found,
            } => {
                write!(
                    f,
                    "property {id} holds values of type {expected}, accessed as {found}"
                )
            }
            Self::GenerationUnavailable { id, generation } => {
                write!(f, "property {id} does not retain the {generation} generation")
            }
            Self::PointOutOfRange {
                id,
                point,
                n_points,
            } => {
                write!(
                    f,
                    "point {point} out of range for property {id} sized to {n_points} points"
                )
            }
        }
    }
}

impl Error for EvalError {}
