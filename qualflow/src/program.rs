//! The program model the checks run over.
//!
//! Front ends describe a program as declarations holding fields and routines.
//! Routine bodies are already lowered to control-flow graphs; nothing here
//! parses source text. The model deserializes from JSON:
//!
//! ```json
//! {
//!   "declarations": [{
//!     "name": "Color",
//!     "fields": [{
//!       "name": "RED", "underlying": "int", "qualifier": "Color",
//!       "pattern": "consecutive", "initializer": { "int": 0 },
//!       "modifiers": { "public": true, "static": true, "final": true }
//!     }],
//!     "routines": [{ "name": "size", "declared_purity": "pure" }]
//!   }]
//! }
//! ```

use crate::checks::purity::PurityLabel;
use crate::error::Result;
use crate::lattice::UnderlyingType;
use qualflow_cfg::{ControlFlowGraph, Literal, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A whole run's input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl Program {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }
}

/// A type declaration: the unit diagnostics and reports are grouped by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub span: Span,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            routines: Vec::new(),
            span: Span::empty(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Ordering constraint on the values of a constant group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPolicy {
    /// Any distinct values
    #[default]
    Unconstrained,
    /// Values form a gap-free integer run
    Consecutive,
    /// Every value is a distinct power of two
    Flags,
}

impl PatternPolicy {
    /// Returns true for policies that only make sense on integers.
    pub fn is_numeric(self) -> bool {
        !matches!(self, PatternPolicy::Unconstrained)
    }
}

impl fmt::Display for PatternPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternPolicy::Unconstrained => write!(f, "unconstrained"),
            PatternPolicy::Consecutive => write!(f, "consecutive"),
            PatternPolicy::Flags => write!(f, "flags"),
        }
    }
}

/// Declaration modifiers relevant to the checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub public: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

impl Modifiers {
    /// `public static final`.
    pub fn constant() -> Self {
        Self {
            public: true,
            is_static: true,
            is_final: true,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.public && self.is_static && self.is_final
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub underlying: UnderlyingType,
    /// Constant group the field is qualified with, if any
    #[serde(default)]
    pub qualifier: Option<String>,
    #[serde(default)]
    pub pattern: PatternPolicy,
    /// Compile-time literal initializer
    #[serde(default)]
    pub initializer: Option<Literal>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub span: Span,
}

impl FieldDecl {
    /// A `public static final` field in group `qualifier`.
    pub fn constant(
        name: impl Into<String>,
        qualifier: impl Into<String>,
        pattern: PatternPolicy,
        initializer: Literal,
    ) -> Self {
        let underlying = match &initializer {
            Literal::Int(_) => UnderlyingType::Int,
            Literal::Text(_) => UnderlyingType::Text,
            Literal::Bool(_) => UnderlyingType::Bool,
            Literal::Null => UnderlyingType::Unknown,
        };
        Self {
            name: name.into(),
            underlying,
            qualifier: Some(qualifier.into()),
            pattern,
            initializer: Some(initializer),
            modifiers: Modifiers::constant(),
            span: Span::empty(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// A qualified `public static final` field: a member of a constant group.
    pub fn is_grouped_constant(&self) -> bool {
        self.qualifier.is_some() && self.modifiers.is_constant()
    }
}

/// A routine parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub underlying: UnderlyingType,
    #[serde(default)]
    pub qualifier: Option<String>,
}

/// A routine, with or without an analysable body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub name: String,
    /// Report key; derived from the name and parameter types when absent
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub body: Option<ControlFlowGraph>,
    #[serde(default)]
    pub declared_purity: Option<PurityLabel>,
    #[serde(default)]
    pub span: Span,
}

impl Routine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: None,
            params: Vec::new(),
            body: None,
            declared_purity: None,
            span: Span::empty(),
        }
    }

    pub fn with_body(mut self, body: ControlFlowGraph) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_declared_purity(mut self, label: PurityLabel) -> Self {
        self.declared_purity = Some(label);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, underlying: UnderlyingType) -> Self {
        self.params.push(Param {
            name: name.into(),
            underlying,
            qualifier: None,
        });
        self
    }

    /// The key this routine is reported under, e.g. `add(int,int)`.
    pub fn signature(&self) -> String {
        match &self.signature {
            Some(signature) => signature.clone(),
            None => {
                let params: Vec<String> =
                    self.params.iter().map(|p| p.underlying.to_string()).collect();
                format!("{}({})", self.name, params.join(","))
            }
        }
    }
}
