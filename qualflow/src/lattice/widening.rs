//! Constants bounding fixed-point iteration.

/// Plain joins allowed at a loop head before widening takes over.
///
/// Zero means every revisit of a loop head widens.
pub const DEFAULT_WIDEN_DELAY: usize = 0;

/// Upper bound on block visits for one analysis.
///
/// Reaching it means the lattice broke its finite-height or widening
/// contract; the engine stops and marks the result as not converged.
pub const DEFAULT_MAX_BLOCK_VISITS: usize = 10_000;
