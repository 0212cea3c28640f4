//! Whole-routine purity verdicts and the purity report.

use super::{classify, Impurity, PurityKinds, PurityLabel, PurityTransfer};
use crate::config::PurityOptions;
use crate::dataflow::{AnalysisResult, EngineConfig, FixpointEngine, Store};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::program::{Declaration, Routine};
use crate::report::ReportTable;
use log::debug;
use qualflow_cfg::ControlFlowGraph;
use std::collections::BTreeMap;

/// `declaration -> (routine signature -> label)`.
pub type PurityReport = ReportTable<PurityLabel>;

/// Classifies routines and accumulates the purity report of one run.
///
/// # Example
/// ```
/// use qualflow::checks::purity::{PurityClassifier, PurityLabel};
/// use qualflow::config::PurityOptions;
/// use qualflow::dataflow::EngineConfig;
/// use qualflow::diagnostics::Diagnostic;
/// use qualflow::program::Routine;
///
/// let options = PurityOptions { assume_pure: true, ..PurityOptions::default() };
/// let mut classifier = PurityClassifier::new(&options, EngineConfig::default());
/// let mut diagnostics: Vec<Diagnostic> = Vec::new();
///
/// let label = classifier.classify_routine("Shape", &Routine::new("area"), &mut diagnostics);
/// assert_eq!(label, PurityLabel::Pure);
/// assert_eq!(classifier.report().get("Shape", "area()"), Some(&PurityLabel::Pure));
/// ```
#[derive(Debug)]
pub struct PurityClassifier {
    engine: FixpointEngine,
    /// Granted to routines and callees that cannot be analysed
    assumed: PurityKinds,
    callees: BTreeMap<String, PurityLabel>,
    report: PurityReport,
}

impl PurityClassifier {
    pub fn new(options: &PurityOptions, engine: EngineConfig) -> Self {
        Self {
            engine: FixpointEngine::new(engine),
            assumed: options.assumed_kinds(),
            callees: options.callees.clone(),
            report: PurityReport::new(),
        }
    }

    /// Records the purity of a routine called by name.
    pub fn declare_callee(&mut self, callee: impl Into<String>, label: PurityLabel) {
        self.callees.insert(callee.into(), label);
    }

    /// Makes the declared purity of `declaration`'s routines available to
    /// callers, under `Declaration.signature`.
    pub fn register_declaration(&mut self, declaration: &Declaration) {
        for routine in &declaration.routines {
            if let Some(label) = routine.declared_purity {
                self.declare_callee(format!("{}.{}", declaration.name, routine.signature()), label);
            }
        }
    }

    /// Runs the purity analysis over a routine body.
    pub fn analyze(&self, routine: &Routine) -> Option<AnalysisResult<PurityKinds, Impurity>> {
        let body = routine.body.as_ref()?;
        let mut transfer = PurityTransfer::new(&self.callees, self.assumed);
        Some(self.engine.analyze(body, Store::new(), &mut transfer))
    }

    /// Classifies `routine`, records the label and reports every node that
    /// breaks the routine's declared purity.
    pub fn classify_routine(
        &mut self,
        declaration: &str,
        routine: &Routine,
        sink: &mut dyn DiagnosticSink,
    ) -> PurityLabel {
        let signature = routine.signature();
        let kinds = match (&routine.body, self.analyze(routine)) {
            (Some(body), Some(result)) => {
                if let Some(declared) = routine.declared_purity {
                    let context = format!("{}.{}", declaration, signature);
                    report_contract(body, &result, declared.kinds(), &context, sink);
                }
                classify(body, &result)
            }
            _ => self.assumed,
        };
        let label = PurityLabel::from_kinds(kinds);
        debug!("{}.{} is {}", declaration, signature, label);
        self.report.record(declaration, &signature, label);
        label
    }

    /// Classifies every routine of `declaration`.
    pub fn check_declaration(&mut self, declaration: &Declaration, sink: &mut dyn DiagnosticSink) {
        for routine in &declaration.routines {
            self.classify_routine(&declaration.name, routine, sink);
        }
    }

    pub fn report(&self) -> &PurityReport {
        &self.report
    }

    pub fn finish(self) -> PurityReport {
        self.report
    }
}

fn report_contract(
    body: &ControlFlowGraph,
    result: &AnalysisResult<PurityKinds, Impurity>,
    required: PurityKinds,
    context: &str,
    sink: &mut dyn DiagnosticSink,
) {
    for (node, impurity) in result.all_facts() {
        let span = body.node(node).span;
        if required.deterministic && !impurity.effect.deterministic {
            sink.report(
                Diagnostic::new(DiagnosticKind::PurityNotDeterministic(impurity.cause), span)
                    .with_context(context),
            );
        }
        if required.side_effect_free && !impurity.effect.side_effect_free {
            sink.report(
                Diagnostic::new(DiagnosticKind::PurityNotSideEffectFree(impurity.cause), span)
                    .with_context(context),
            );
        }
    }
}
