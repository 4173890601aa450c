//! Error types for registry and storage operations.

use std::error::Error;
use std::fmt;

use marl_core::{PropertyId, QualifiedName};

/// Errors from property registration and generational storage.
///
/// All of these are configuration-time failures: they abort setup
/// rather than degrade into a partial simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// A known name was redeclared or requested with a different value
    /// type.
    TypeMismatch {
        /// The property, including its form.
        name: QualifiedName,
        /// Type recorded at first declaration.
        expected: &'static str,
        /// Type of the conflicting call.
        found: &'static str,
    },
    /// A declare or request call arrived after setup was sealed.
    StageViolation {
        /// The property the call addressed.
        name: QualifiedName,
    },
    /// An ID with no registry record.
    UnknownProperty {
        /// The unknown ID.
        id: PropertyId,
    },
    /// Generation rotation hit storage whose erased type disagrees with
    /// the registry record.
    HistoryCopyFailed {
        /// The property being rotated.
        id: PropertyId,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "property '{name}' was declared with type {expected}, redeclared/requested as {found}"
                )
            }
            Self::StageViolation { name } => {
                write!(
                    f,
                    "property '{name}' declared or requested after setup; declarations are only \
                     legal during the construction phase"
                )
            }
            Self::UnknownProperty { id } => {
                write!(f, "property ID {id} has no registry record")
            }
            Self::HistoryCopyFailed { id } => {
                write!(f, "generation rotation failed for property {id}: storage type disagrees")
            }
        }
    }
}

impl Error for StoreError {}
