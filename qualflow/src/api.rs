//! Rust API for running the checks in one call.

use crate::config::QualflowConfig;
use crate::error::{QualflowError, Result};
use crate::program::Program;
use crate::session::{CheckSession, SessionOutcome};
use std::path::Path;

/// Runs every check over an already loaded program.
pub fn check_program(program: &Program, config: QualflowConfig) -> SessionOutcome {
    let mut session = CheckSession::new(config);
    session.check_program(program);
    session.finish()
}

/// Runs every check over a program given as JSON.
///
/// # Example
///
/// ```
/// use qualflow::{run_json_str, QualflowConfig};
///
/// let json = r#"{ "declarations": [{
///     "name": "Mode",
///     "fields": [
///         { "name": "A", "underlying": "int", "qualifier": "M", "pattern": "consecutive",
///           "initializer": { "int": 1 },
///           "modifiers": { "public": true, "static": true, "final": true } },
///         { "name": "B", "underlying": "int", "qualifier": "M", "pattern": "consecutive",
///           "initializer": { "int": 3 },
///           "modifiers": { "public": true, "static": true, "final": true } }
///     ]
/// }] }"#;
///
/// let outcome = run_json_str(json, QualflowConfig::default()).unwrap();
/// assert_eq!(outcome.diagnostics.len(), 1);
/// assert_eq!(outcome.diagnostics[0].kind.key(), "nonconsecutive.constant.values");
/// ```
pub fn run_json_str(json: &str, config: QualflowConfig) -> Result<SessionOutcome> {
    let program = Program::from_json_str(json)?;
    Ok(check_program(&program, config))
}

/// Runs every check over a JSON program file.
pub fn run_json_file(path: impl AsRef<Path>, config: QualflowConfig) -> Result<SessionOutcome> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| QualflowError::io(path, e))?;
    run_json_str(&json, config)
}
