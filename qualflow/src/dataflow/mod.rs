//! Lattice-based dataflow analysis.
//!
//! # Module structure
//!
//! - `store`: [`Store`], the abstract state at one program point
//! - `transfer`: the [`TransferFunction`] trait and its input/output types
//! - `engine`: [`FixpointEngine`], the worklist solver
//! - `result`: [`AnalysisResult`], per-point results handed to clients
//!
//! An analysis supplies a lattice `V` and a transfer function; the engine is
//! the same for every client.

pub mod engine;
pub mod result;
pub mod store;
pub mod transfer;

pub use engine::{EngineConfig, FixpointEngine};
pub use result::{AnalysisResult, AnalysisStats, BlockExit};
pub use store::Store;
pub use transfer::{NodeOutput, TransferFunction, TransferInput, TransferResult};
