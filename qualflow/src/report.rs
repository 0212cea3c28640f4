//! Report tables.
//!
//! Both checks summarise a run as `declaration -> (member -> result)`:
//! constant name to outcome for the constant-set validator, routine signature
//! to label for the purity classifier. Tables are written once per run as
//! pretty-printed JSON, replacing any previous file.

use crate::error::{QualflowError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// `declaration -> (member -> result)`, ordered by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportTable<T> {
    entries: BTreeMap<String, BTreeMap<String, T>>,
}

impl<T> Default for ReportTable<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> ReportTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `result` for `member` of `declaration`; the last write wins.
    pub fn record(&mut self, declaration: &str, member: &str, result: T) {
        self.entries
            .entry(declaration.to_string())
            .or_default()
            .insert(member.to_string(), result);
    }

    pub fn get(&self, declaration: &str, member: &str) -> Option<&T> {
        self.entries.get(declaration)?.get(member)
    }

    /// All members of one declaration.
    pub fn declaration(&self, declaration: &str) -> Option<&BTreeMap<String, T>> {
        self.entries.get(declaration)
    }

    /// Every `(declaration, member, result)` triple, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &T)> + '_ {
        self.entries.iter().flat_map(|(declaration, members)| {
            members
                .iter()
                .map(move |(member, result)| (declaration.as_str(), member.as_str(), result))
        })
    }

    /// Number of recorded members across all declarations.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Serialize> ReportTable<T> {
    /// Formats the table as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the table to `path`, overwriting any existing file.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut text = self.to_json_pretty()?;
        text.push('\n');
        std::fs::write(path, text).map_err(|e| QualflowError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_last_write_wins() {
        let mut table = ReportTable::new();
        table.record("A", "f()", 1);
        table.record("A", "f()", 2);
        table.record("B", "g()", 3);
        assert_eq!(table.get("A", "f()"), Some(&2));
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            vec![("A", "f()", &2), ("B", "g()", &3)]
        );
    }

    #[test]
    fn test_write_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "stale contents that are much longer than the report").unwrap();

        let mut table = ReportTable::new();
        table.record("Decl", "member", "ok");
        table.write_json(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n  \"Decl\": {\n    \"member\": \"ok\"\n  }\n}\n");
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let table: ReportTable<u8> = ReportTable::new();
        let err = table.write_json("/nonexistent/dir/out.json").unwrap_err();
        assert!(matches!(err, QualflowError::Io { .. }));
    }
}
