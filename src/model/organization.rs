use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::model::employee::RoleClass;

/// Inclusive numeric band of codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRange {
    pub start: u32,
    pub end: u32,
}

impl CodeRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, n: u32) -> bool {
        self.start <= n && n <= self.end
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgCodes {
    #[serde(default)]
    pub prefix: String,
    pub staff: CodeRange,
    pub labor: CodeRange,
}

impl OrgCodes {
    pub fn range(&self, role: RoleClass) -> CodeRange {
        match role {
            RoleClass::Staff => self.staff,
            RoleClass::Labor => self.labor,
        }
    }

    pub fn format_code(&self, n: u32) -> String {
        format!("{}{}", self.prefix, n)
    }
}

/// Organization name -> code ranges and prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgTable {
    orgs: HashMap<String, OrgCodes>,
}

impl OrgTable {
    pub fn new(orgs: HashMap<String, OrgCodes>) -> anyhow::Result<Self> {
        for (name, codes) in &orgs {
            for role in RoleClass::ALL {
                let range = codes.range(role);
                if range.start > range.end {
                    bail!(
                        "organization {name:?}: {role} range {}..={} is empty",
                        range.start,
                        range.end
                    );
                }
            }
        }
        Ok(Self { orgs })
    }

    /// Reads the table from a JSON file shaped like
    /// `{"Org": {"prefix": "", "staff": {...}, "labor": {...}}}`.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading organization table {}", path.display()))?;
        let orgs: HashMap<String, OrgCodes> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing organization table {}", path.display()))?;
        Self::new(orgs)
    }

    pub fn get(&self, org: &str) -> Option<&OrgCodes> {
        self.orgs.get(org)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.orgs.keys().map(String::as_str)
    }
}

impl Default for OrgTable {
    fn default() -> Self {
        let plain = |staff, labor| OrgCodes {
            prefix: String::new(),
            staff,
            labor,
        };
        let orgs = HashMap::from([
            (
                "Mittal Spinners".to_string(),
                plain(CodeRange::new(1, 100), CodeRange::new(101, 200)),
            ),
            (
                "HRM Spinners".to_string(),
                plain(CodeRange::new(301, 400), CodeRange::new(401, 500)),
            ),
            (
                "Jai Durga Cottex".to_string(),
                OrgCodes {
                    prefix: "JDC-".to_string(),
                    staff: CodeRange::new(1, 100),
                    labor: CodeRange::new(101, 200),
                },
            ),
        ]);
        Self { orgs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_prefixed_cottex() {
        let table = OrgTable::default();
        let cottex = table.get("Jai Durga Cottex").unwrap();
        assert_eq!(cottex.format_code(7), "JDC-7");
        assert_eq!(
            table.get("HRM Spinners").unwrap().range(RoleClass::Labor),
            CodeRange::new(401, 500)
        );
        assert!(table.get("Unknown Mills").is_none());
    }

    #[test]
    fn parses_json_and_rejects_inverted_range() {
        let raw = r#"{"Acme": {"staff": {"start": 1, "end": 5}, "labor": {"start": 6, "end": 9}}}"#;
        let orgs: HashMap<String, OrgCodes> = serde_json::from_str(raw).unwrap();
        let table = OrgTable::new(orgs).unwrap();
        assert_eq!(table.get("Acme").unwrap().prefix, "");

        let raw = r#"{"Acme": {"staff": {"start": 9, "end": 5}, "labor": {"start": 6, "end": 9}}}"#;
        let orgs: HashMap<String, OrgCodes> = serde_json::from_str(raw).unwrap();
        assert!(OrgTable::new(orgs).is_err());
    }
}
