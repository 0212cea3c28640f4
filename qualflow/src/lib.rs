// Library code reports through `log` and diagnostics, never to the terminal.
#![deny(clippy::print_stderr)]

//! qualflow
//!
//! A lattice-based dataflow engine and two checks built on it:
//!
//! - a closed-constant-set validator for groups of symbolic constants
//!   (`@Fenum` groups), with a qualifier usage analysis over routine bodies
//! - a purity classifier labelling routines `pure`, `side-effect-free`,
//!   `deterministic` or `impure`
//!
//! Programs arrive as declarations whose routine bodies are already lowered
//! to control-flow graphs (see `qualflow_cfg`).

// Core engine
pub mod dataflow;
pub mod lattice;

// Program model and results
pub mod diagnostics;
pub mod program;
pub mod report;

// Checks
pub mod checks;

// Runs
pub mod api;
pub mod config;
pub mod error;
pub mod session;

pub use api::{check_program, run_json_file, run_json_str};
pub use config::QualflowConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, DiagnosticsCollector};
pub use error::{QualflowError, Result};
pub use program::Program;
pub use session::{CheckSession, SessionOutcome};

pub use qualflow_cfg as cfg;
