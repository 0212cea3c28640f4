//! Closed-constant-set ("fenum") checks.
//!
//! Public static final fields qualified with a group name form a closed set
//! of symbolic constants. Two checks run over them:
//!
//! - [`ConstantSetValidator`] validates the declarations themselves: one
//!   type per group, one pattern policy per group, distinct values, powers of
//!   two for bit flags, and (after the whole run) gap-free values for
//!   consecutive groups.
//! - [`QualifierUsageCheck`] runs the dataflow engine over routine bodies and
//!   reports operations mixing constants of different groups.
//!
//! # Group lifecycle
//!
//! ```text
//! unseen --first valid constant--> open --finish()--> validated
//!                                   ^  |
//!                                   +--+ further constants
//! ```
//!
//! A rejected constant is excluded from its group; its siblings and other
//! groups are unaffected.

pub mod qualifier;
pub mod usage;

pub use qualifier::{FenumQualifier, FenumTag, FenumValue};
pub use usage::{FenumTransfer, QualifierUsageCheck, UsageViolation};

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::lattice::UnderlyingType;
use crate::program::{Declaration, FieldDecl, PatternPolicy};
use crate::report::ReportTable;
use log::debug;
use qualflow_cfg::{Literal, Span};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Result of validating one constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantOutcome {
    Accepted,
    Rejected(DiagnosticKind),
}

impl ConstantOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ConstantOutcome::Accepted)
    }
}

impl fmt::Display for ConstantOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantOutcome::Accepted => write!(f, "accepted"),
            ConstantOutcome::Rejected(kind) => write!(f, "{}", kind),
        }
    }
}

impl Serialize for ConstantOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `declaration -> (constant -> outcome)`.
pub type ConstantReport = ReportTable<ConstantOutcome>;

/// Where a group is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStatus {
    Unseen,
    Open,
    Validated,
}

/// Accepted values of a group. Integer and text values never compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupValues {
    Integer(BTreeSet<i64>),
    Text(BTreeSet<String>),
}

impl GroupValues {
    fn contains(&self, value: &Literal) -> bool {
        match (self, value) {
            (GroupValues::Integer(set), Literal::Int(v)) => set.contains(v),
            (GroupValues::Text(set), Literal::Text(s)) => set.contains(s),
            _ => false,
        }
    }

    fn insert(&mut self, value: &Literal) {
        match (self, value) {
            (GroupValues::Integer(set), Literal::Int(v)) => {
                set.insert(*v);
            }
            (GroupValues::Text(set), Literal::Text(s)) => {
                set.insert(s.clone());
            }
            _ => {}
        }
    }

    pub fn len(&self) -> usize {
        match self {
            GroupValues::Integer(set) => set.len(),
            GroupValues::Text(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the integer values form a run without gaps.
    ///
    /// Text values are never checked for consecutiveness.
    pub fn is_consecutive(&self) -> bool {
        match self {
            GroupValues::Integer(set) => match (set.first(), set.last()) {
                (Some(&min), Some(&max)) => {
                    i128::from(max) - i128::from(min) + 1 == set.len() as i128
                }
                _ => true,
            },
            GroupValues::Text(_) => true,
        }
    }
}

/// A group of constants sharing one qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantGroup {
    pub name: String,
    pub underlying: UnderlyingType,
    pub pattern: PatternPolicy,
    pub values: GroupValues,
    pub status: GroupStatus,
    /// Location of the group's first constant
    pub start: Span,
    /// Accepted members as `(declaration, constant)`
    pub members: Vec<(String, String)>,
}

/// Validates grouped constants declaration by declaration.
///
/// # Example
/// ```
/// use qualflow::checks::constants::{ConstantOutcome, ConstantSetValidator};
/// use qualflow::diagnostics::{Diagnostic, DiagnosticKind};
/// use qualflow::program::{FieldDecl, PatternPolicy};
/// use qualflow_cfg::Literal;
///
/// let mut validator = ConstantSetValidator::new();
/// let mut diagnostics: Vec<Diagnostic> = Vec::new();
/// let flag = |name: &str, v: i64| {
///     FieldDecl::constant(name, "Mode", PatternPolicy::Flags, Literal::Int(v))
/// };
///
/// validator.validate_constant("Modes", &flag("READ", 1), &mut diagnostics);
/// validator.validate_constant("Modes", &flag("WRITE", 2), &mut diagnostics);
/// let outcome = validator.validate_constant("Modes", &flag("BOTH", 3), &mut diagnostics);
///
/// assert_eq!(outcome, Some(ConstantOutcome::Rejected(DiagnosticKind::NotPowerOfTwo)));
/// assert_eq!(diagnostics.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ConstantSetValidator {
    groups: BTreeMap<String, ConstantGroup>,
    report: ConstantReport,
}

impl ConstantSetValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self, name: &str) -> Option<&ConstantGroup> {
        self.groups.get(name)
    }

    /// Status of a group; groups without an accepted constant are unseen.
    pub fn status(&self, name: &str) -> GroupStatus {
        self.groups
            .get(name)
            .map_or(GroupStatus::Unseen, |group| group.status)
    }

    pub fn groups(&self) -> impl Iterator<Item = &ConstantGroup> + '_ {
        self.groups.values()
    }

    /// Validates every grouped constant of `declaration`, in order.
    pub fn validate_declaration(
        &mut self,
        declaration: &Declaration,
        sink: &mut dyn DiagnosticSink,
    ) {
        for field in &declaration.fields {
            self.validate_constant(&declaration.name, field, sink);
        }
    }

    /// Validates one field.
    ///
    /// Returns `None` for fields that are not grouped constants; they are
    /// ignored. Otherwise the outcome is recorded in the report and every
    /// rejection is also reported to `sink`.
    pub fn validate_constant(
        &mut self,
        declaration: &str,
        field: &FieldDecl,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<ConstantOutcome> {
        if !field.is_grouped_constant() {
            return None;
        }
        let group = field.qualifier.as_deref()?;

        let outcome = match self.check(group, field) {
            Ok(value) => {
                self.accept(group, declaration, field, &value);
                ConstantOutcome::Accepted
            }
            Err(diagnostic) => {
                let kind = diagnostic.kind;
                debug!("rejected {}.{}: {}", declaration, field.name, kind);
                sink.report(diagnostic.with_context(declaration));
                ConstantOutcome::Rejected(kind)
            }
        };
        self.report.record(declaration, &field.name, outcome);
        Some(outcome)
    }

    /// Runs every per-constant rule; the first failure wins.
    fn check(&self, group_name: &str, field: &FieldDecl) -> Result<Literal, Diagnostic> {
        let reject = |kind| Diagnostic::new(kind, field.span);

        if !matches!(field.underlying, UnderlyingType::Int | UnderlyingType::Text) {
            return Err(
                reject(DiagnosticKind::UnsupportedConstantType).with_arg(&field.underlying)
            );
        }

        match self.groups.get(group_name) {
            Some(group) => {
                if field.underlying != group.underlying {
                    return Err(
                        reject(DiagnosticKind::ConstantTypeConflict).with_arg(&field.underlying)
                    );
                }
                if field.pattern != group.pattern {
                    return Err(reject(DiagnosticKind::FenumPatternConflict)
                        .with_arg(group.pattern)
                        .with_arg(field.pattern));
                }
            }
            None => {
                if field.underlying == UnderlyingType::Text && field.pattern.is_numeric() {
                    return Err(
                        reject(DiagnosticKind::FenumPatternNotApplicable).with_arg(field.pattern)
                    );
                }
            }
        }

        let value = match (&field.underlying, &field.initializer) {
            (UnderlyingType::Int, Some(value @ Literal::Int(_)))
            | (UnderlyingType::Text, Some(value @ Literal::Text(_))) => value.clone(),
            _ => return Err(reject(DiagnosticKind::ConstantValueMissing).with_arg(&field.name)),
        };

        if let Some(group) = self.groups.get(group_name) {
            if group.values.contains(&value) {
                return Err(reject(DiagnosticKind::DuplicatedConstantValue)
                    .with_arg(&value)
                    .with_arg(group_name));
            }
        }

        if field.pattern == PatternPolicy::Flags {
            if let Literal::Int(v) = value {
                if v <= 0 || v & (v - 1) != 0 {
                    return Err(reject(DiagnosticKind::NotPowerOfTwo).with_arg(v));
                }
            }
        }

        Ok(value)
    }

    fn accept(&mut self, group_name: &str, declaration: &str, field: &FieldDecl, value: &Literal) {
        let group = self
            .groups
            .entry(group_name.to_string())
            .or_insert_with(|| ConstantGroup {
                name: group_name.to_string(),
                underlying: field.underlying.clone(),
                pattern: field.pattern,
                values: match field.underlying {
                    UnderlyingType::Text => GroupValues::Text(BTreeSet::new()),
                    _ => GroupValues::Integer(BTreeSet::new()),
                },
                status: GroupStatus::Open,
                start: field.span,
                members: Vec::new(),
            });
        group.values.insert(value);
        group
            .members
            .push((declaration.to_string(), field.name.clone()));
    }

    /// Runs the once-per-run post-pass and returns the report.
    ///
    /// Every open consecutive group whose values leave a gap is reported at
    /// its first constant, and its accepted members are marked
    /// `nonconsecutive.constant.values`. All groups end up validated.
    pub fn finish(mut self, sink: &mut dyn DiagnosticSink) -> ConstantReport {
        for group in self.groups.values_mut() {
            if group.status != GroupStatus::Open {
                continue;
            }
            if group.pattern == PatternPolicy::Consecutive && !group.values.is_consecutive() {
                debug!("group {} is not consecutive", group.name);
                let mut diagnostic =
                    Diagnostic::new(DiagnosticKind::NonconsecutiveConstantValues, group.start)
                        .with_arg(&group.name);
                if let Some((declaration, _)) = group.members.first() {
                    diagnostic = diagnostic.with_context(declaration.as_str());
                }
                sink.report(diagnostic);
                for (declaration, constant) in &group.members {
                    self.report.record(
                        declaration,
                        constant,
                        ConstantOutcome::Rejected(DiagnosticKind::NonconsecutiveConstantValues),
                    );
                }
            }
            group.status = GroupStatus::Validated;
        }
        self.report
    }
}
