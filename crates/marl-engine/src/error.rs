//! Setup-time error types.

use std::error::Error;
use std::fmt;

use marl_core::QualifiedName;
use marl_producer::ResolveError;
use marl_store::StoreError;

/// Stateful sanity failures detected at setup end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SanityError {
    /// A producer declares stateful properties but exposes no seeding
    /// step, leaving their initial history undefined.
    MissingStatefulSeed {
        /// The offending producer.
        producer: String,
        /// Its stateful properties.
        properties: Vec<QualifiedName>,
    },
}

impl fmt::Display for SanityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStatefulSeed {
                producer,
                properties,
            } => {
                write!(
                    f,
                    "producer '{producer}' declares stateful properties but provides no \
                     seeding step: "
                )?;
                for (i, p) in properties.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{p}'")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for SanityError {}

/// Errors from [`SimulationConfig::build`](crate::SimulationConfig::build).
///
/// All of these abort configuration; none are recoverable into a
/// partial simulation.
#[derive(Debug)]
pub enum ConfigError {
    /// No producers were registered.
    NoProducers,
    /// A declaration pass failed (type mismatch, stage violation).
    Store(StoreError),
    /// Dependency resolution failed (duplicate or missing supplier,
    /// cycle).
    Resolve(ResolveError),
    /// The stateful sanity check failed.
    Sanity(SanityError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProducers => write!(f, "no producers registered"),
            Self::Store(e) => write!(f, "declaration failed: {e}"),
            Self::Resolve(e) => write!(f, "dependency resolution failed: {e}"),
            Self::Sanity(e) => write!(f, "stateful sanity check failed: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoProducers => None,
            Self::Store(e) => Some(e),
            Self::Resolve(e) => Some(e),
            Self::Sanity(e) => Some(e),
        }
    }
}

impl From<StoreError> for ConfigError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<ResolveError> for ConfigError {
    fn from(e: ResolveError) -> Self {
        Self::Resolve(e)
    }
}

impl From<SanityError> for ConfigError {
    fn from(e: SanityError) -> Self {
        Self::Sanity(e)
    }
}
