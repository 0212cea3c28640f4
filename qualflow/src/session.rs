//! One run of the checks.
//!
//! A [`CheckSession`] owns every table the checks accumulate: constant
//! groups, known field qualifiers, declared callee purity and both reports.
//! Independent sessions never share state, so several runs can coexist in
//! one process.
//!
//! ```
//! use qualflow::{CheckSession, Program, QualflowConfig};
//!
//! let program = Program::from_json_str(r#"{ "declarations": [{
//!     "name": "Color",
//!     "fields": [
//!         { "name": "RED", "underlying": "int", "qualifier": "Color",
//!           "initializer": { "int": 0 },
//!           "modifiers": { "public": true, "static": true, "final": true } }
//!     ],
//!     "routines": [{ "name": "native" }]
//! }] }"#).unwrap();
//!
//! let mut session = CheckSession::new(QualflowConfig::default());
//! session.check_program(&program);
//! let outcome = session.finish();
//!
//! assert!(outcome.diagnostics.is_empty());
//! assert_eq!(outcome.constant_report.get("Color", "RED").unwrap().to_string(), "accepted");
//! assert_eq!(outcome.purity_report.get("Color", "native()").unwrap().to_string(), "impure");
//! ```

use crate::checks::constants::{ConstantReport, ConstantSetValidator, QualifierUsageCheck};
use crate::checks::purity::{PurityClassifier, PurityReport};
use crate::config::QualflowConfig;
use crate::diagnostics::{Diagnostic, DiagnosticsCollector};
use crate::error::Result;
use crate::program::{Declaration, Program};
use log::{debug, info};
use serde::Serialize;
use std::path::Path;

/// Drives both checks over the declarations of one run.
#[derive(Debug)]
pub struct CheckSession {
    config: QualflowConfig,
    validator: ConstantSetValidator,
    usage: QualifierUsageCheck,
    purity: PurityClassifier,
    diagnostics: DiagnosticsCollector,
}

impl CheckSession {
    pub fn new(config: QualflowConfig) -> Self {
        Self {
            validator: ConstantSetValidator::new(),
            usage: QualifierUsageCheck::new(config.engine),
            purity: PurityClassifier::new(&config.purity, config.engine),
            diagnostics: DiagnosticsCollector::new(),
            config,
        }
    }

    pub fn config(&self) -> &QualflowConfig {
        &self.config
    }

    /// Makes field qualifiers and declared routine purity of `program`
    /// known without checking anything yet.
    pub fn register_program(&mut self, program: &Program) {
        for declaration in &program.declarations {
            self.usage.register_declaration(declaration);
            self.purity.register_declaration(declaration);
        }
    }

    /// Runs every check on one declaration.
    ///
    /// Constants are validated first, then routine bodies are checked for
    /// qualifier usage and classified for purity.
    pub fn check_declaration(&mut self, declaration: &Declaration) {
        debug!("checking declaration {}", declaration.name);
        self.validator
            .validate_declaration(declaration, &mut self.diagnostics);
        for routine in &declaration.routines {
            self.usage
                .check_routine(&declaration.name, routine, &mut self.diagnostics);
        }
        self.purity
            .check_declaration(declaration, &mut self.diagnostics);
    }

    /// Registers and checks a whole program.
    pub fn check_program(&mut self, program: &Program) {
        self.register_program(program);
        for declaration in &program.declarations {
            self.check_declaration(declaration);
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.diagnostics()
    }

    /// Runs the end-of-run post-pass and hands over the reports.
    pub fn finish(mut self) -> SessionOutcome {
        let constant_report = self.validator.finish(&mut self.diagnostics);
        let purity_report = self.purity.finish();
        let diagnostics = self.diagnostics.take();
        info!(
            "run finished: {} diagnostics, {} constants, {} routines",
            diagnostics.len(),
            constant_report.len(),
            purity_report.len()
        );
        SessionOutcome {
            diagnostics,
            constant_report,
            purity_report,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub constant_report: ConstantReport,
    pub purity_report: PurityReport,
}

impl SessionOutcome {
    /// Writes both reports into `dir`, under the file names of `config`.
    ///
    /// Existing reports are overwritten.
    pub fn write_reports(&self, dir: impl AsRef<Path>, config: &QualflowConfig) -> Result<()> {
        let dir = dir.as_ref();
        self.constant_report
            .write_json(dir.join(&config.constants.report))?;
        self.purity_report.write_json(dir.join(&config.purity.report))?;
        Ok(())
    }
}
