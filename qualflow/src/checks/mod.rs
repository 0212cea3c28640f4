//! Client checks built on the dataflow engine.
//!
//! - `constants`: closed-constant-set validation and qualifier usage
//! - `purity`: routine purity classification
//!
//! The checks share no state. Each owns its aggregation tables and is driven
//! by a [`CheckSession`](crate::session::CheckSession).

pub mod constants;
pub mod purity;

pub use constants::{ConstantOutcome, ConstantReport, ConstantSetValidator, QualifierUsageCheck};
pub use purity::{PurityClassifier, PurityLabel, PurityReport};
