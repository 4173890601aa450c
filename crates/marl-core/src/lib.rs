//! Core types and traits for the marl property system.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the marl workspace:
//! property and region identifiers, the [`PropSet`] bitset, the value
//! traits behind plain and derivative-carrying properties, the
//! forward-mode [`Dual`] number, generation markers, and shared error
//! types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dual;
pub mod error;
pub mod history;
pub mod id;
pub mod propset;
pub mod value;

pub use dual::Dual;
pub use error::EvalError;
pub use history::{Generation, HistoryDepth};
pub use id::{BoundaryId, PropertyId, Region, SubdomainId};
pub use propset::PropSet;
pub use value::{AdCarrier, FormOf, PropForm, PropValue, QualifiedName};
