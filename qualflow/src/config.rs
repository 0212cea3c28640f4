//! Run configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [purity]
//! assume_side_effect_free = false
//! assume_deterministic = false
//! assume_pure = false
//! report = "cf_output.json"
//!
//! [purity.callees]
//! "Math.abs(int)" = "pure"
//!
//! [constants]
//! report = "constants_output.json"
//!
//! [engine]
//! widen_delay = 0
//! max_block_visits = 10000
//! ```
//!
//! Every key is optional. Checker-style option names (`assumePure`, ...) can
//! be applied on top with [`QualflowConfig::with_flags`].

use crate::checks::purity::{PurityKinds, PurityLabel};
use crate::dataflow::EngineConfig;
use crate::error::{QualflowError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default file name of the purity report.
pub const PURITY_REPORT_FILE: &str = "cf_output.json";

/// Default file name of the constant-set report.
pub const CONSTANT_REPORT_FILE: &str = "constants_output.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualflowConfig {
    pub purity: PurityOptions,
    pub constants: ConstantOptions,
    pub engine: EngineConfig,
}

/// Options of the purity classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PurityOptions {
    pub assume_side_effect_free: bool,
    pub assume_deterministic: bool,
    pub assume_pure: bool,
    /// Report file, relative to the output directory
    pub report: PathBuf,
    /// Purity of routines whose bodies are not part of the run, by signature
    pub callees: BTreeMap<String, PurityLabel>,
}

impl Default for PurityOptions {
    fn default() -> Self {
        Self {
            assume_side_effect_free: false,
            assume_deterministic: false,
            assume_pure: false,
            report: PathBuf::from(PURITY_REPORT_FILE),
            callees: BTreeMap::new(),
        }
    }
}

impl PurityOptions {
    pub fn assumes_side_effect_free(&self) -> bool {
        self.assume_side_effect_free || self.assume_pure
    }

    pub fn assumes_deterministic(&self) -> bool {
        self.assume_deterministic || self.assume_pure
    }

    /// Properties granted to routines that cannot be analysed.
    pub fn assumed_kinds(&self) -> PurityKinds {
        PurityKinds {
            deterministic: self.assumes_deterministic(),
            side_effect_free: self.assumes_side_effect_free(),
        }
    }
}

/// Options of the constant-set validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstantOptions {
    /// Report file, relative to the output directory
    pub report: PathBuf,
}

impl Default for ConstantOptions {
    fn default() -> Self {
        Self {
            report: PathBuf::from(CONSTANT_REPORT_FILE),
        }
    }
}

impl QualflowConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| QualflowError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Switch on checker options given by name.
    ///
    /// Recognised names are `assumeSideEffectFree`, `assumeDeterministic` and
    /// `assumePure`; anything else is an error.
    ///
    /// # Example
    /// ```
    /// use qualflow::QualflowConfig;
    ///
    /// let config = QualflowConfig::default().with_flags(["assumePure"]).unwrap();
    /// assert!(config.purity.assumes_deterministic());
    /// assert!(QualflowConfig::default().with_flags(["assumeNothing"]).is_err());
    /// ```
    pub fn with_flags<I, S>(mut self, flags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for flag in flags {
            match flag.as_ref() {
                "assumeSideEffectFree" => self.purity.assume_side_effect_free = true,
                "assumeDeterministic" => self.purity.assume_deterministic = true,
                "assumePure" => self.purity.assume_pure = true,
                other => return Err(QualflowError::UnknownOption(other.to_string())),
            }
        }
        Ok(self)
    }
}
