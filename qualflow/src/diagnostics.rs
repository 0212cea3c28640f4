//! Diagnostics reported by the checks.
//!
//! A diagnostic is structured data: a location, a kind with a stable
//! dotted key (`duplicated.constant.value`, `purity.not.deterministic.call`,
//! ...) and positional arguments. Rendering them as prose is left to the
//! caller.
//!
//! # Usage
//!
//! Checks report into any [`DiagnosticSink`]. [`DiagnosticsCollector`] keeps
//! everything in emission order; a plain `Vec<Diagnostic>` works as well.

use crate::checks::purity::ImpurityCause;
use qualflow_cfg::Span;
use serde::{Serialize, Serializer};
use std::fmt;

/// What went wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A grouped constant whose type is neither integer nor text.
    UnsupportedConstantType,
    /// A constant whose type differs from its group's.
    ConstantTypeConflict,
    /// A constant whose pattern policy differs from its group's.
    FenumPatternConflict,
    /// A text constant declared with a numeric pattern policy.
    FenumPatternNotApplicable,
    /// A value already taken by another member of the group.
    DuplicatedConstantValue,
    /// A bit-flag member that is not a positive power of two.
    NotPowerOfTwo,
    /// A consecutive group whose values leave a gap.
    NonconsecutiveConstantValues,
    /// A grouped constant without a literal initializer of its type.
    ConstantValueMissing,
    /// Binary operation on operands from incompatible groups.
    BinaryTypeIncompatible,
    /// Switch case label outside the scrutinee's group.
    SwitchTypeIncompatible,
    /// Field assignment with a value outside the field's group.
    AssignmentTypeIncompatible,
    /// A node breaking a declared determinism contract.
    PurityNotDeterministic(ImpurityCause),
    /// A node breaking a declared side-effect-freedom contract.
    PurityNotSideEffectFree(ImpurityCause),
}

impl DiagnosticKind {
    /// Every kind without a payload, for exhaustive listings.
    pub const CONSTANT_KINDS: [DiagnosticKind; 8] = [
        DiagnosticKind::UnsupportedConstantType,
        DiagnosticKind::ConstantTypeConflict,
        DiagnosticKind::FenumPatternConflict,
        DiagnosticKind::FenumPatternNotApplicable,
        DiagnosticKind::DuplicatedConstantValue,
        DiagnosticKind::NotPowerOfTwo,
        DiagnosticKind::NonconsecutiveConstantValues,
        DiagnosticKind::ConstantValueMissing,
    ];

    /// The stable key identifying this kind.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Returns true for kinds raised by the constant-set validator.
    pub fn is_constant_rejection(&self) -> bool {
        Self::CONSTANT_KINDS.contains(self)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UnsupportedConstantType => write!(f, "unsupported.constant.type"),
            DiagnosticKind::ConstantTypeConflict => write!(f, "constant.type.conflict"),
            DiagnosticKind::FenumPatternConflict => write!(f, "fenum.pattern.conflict"),
            DiagnosticKind::FenumPatternNotApplicable => write!(f, "fenum.pattern.not.applicable"),
            DiagnosticKind::DuplicatedConstantValue => write!(f, "duplicated.constant.value"),
            DiagnosticKind::NotPowerOfTwo => write!(f, "not.powerof.two"),
            DiagnosticKind::NonconsecutiveConstantValues => {
                write!(f, "nonconsecutive.constant.values")
            }
            DiagnosticKind::ConstantValueMissing => write!(f, "constant.value.missing"),
            DiagnosticKind::BinaryTypeIncompatible => write!(f, "binary.type.incompatible"),
            DiagnosticKind::SwitchTypeIncompatible => write!(f, "switch.type.incompatible"),
            DiagnosticKind::AssignmentTypeIncompatible => {
                write!(f, "assignment.type.incompatible")
            }
            DiagnosticKind::PurityNotDeterministic(cause) => {
                write!(f, "purity.not.deterministic.{}", cause)
            }
            DiagnosticKind::PurityNotSideEffectFree(cause) => {
                write!(f, "purity.not.sideeffectfree.{}", cause)
            }
        }
    }
}

impl Serialize for DiagnosticKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub span: Span,
    pub kind: DiagnosticKind,
    /// Positional arguments, in the order a message template expects them.
    pub args: Vec<String>,
    /// Declaration or routine the diagnostic was raised in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            span,
            kind,
            args: Vec::new(),
            context: None,
        }
    }

    /// Append a positional argument.
    pub fn with_arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Name the enclosing declaration or routine.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.kind)?;
        if !self.args.is_empty() {
            write!(f, " [{}]", self.args.join(", "))?;
        }
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Collects diagnostics in emission order.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticsCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Retrieve and clear the collected diagnostics.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics of one kind, in emission order.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

impl DiagnosticSink for DiagnosticsCollector {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::debug!("diagnostic: {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}
