//! Header row resolution.
//!
//! The roster spreadsheet is edited by hand, so column positions drift and
//! header text is not reliably cased. Every lookup goes through
//! [`resolve()`]: alias substitution, then an exact case-insensitive match,
//! then a substring match, then an optional fixed fallback index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RosterError;

const DKP_MARKER: &str = "DKP";
const BATTLE_TERMS: &[&str] = &["KILL", "DEATH", "BATTLE", "WAR", "FIGHT"];

const LEADERBOARD_ALIASES: &[(&str, &str)] = &[
    ("score", "DKP SCORE"),
    ("goal", "DKP GOAL"),
    ("rate", "DKP RATE"),
    ("kills", "BASE T4 KILLS"),
    ("power", "BASE POWER"),
    ("dead", "BASE DEAD"),
    ("kvk", "KVK KILLS | T4 + T5"),
];

/// Maps short category names onto the header text they stand for.
///
/// Keys are stored lowercased; insertion order is kept so listings read the
/// way the table was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
}

impl AliasTable {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The category aliases understood by the leaderboard.
    pub fn leaderboard() -> Self {
        let mut table = Self::empty();
        for (alias, header) in LEADERBOARD_ALIASES {
            table.insert(alias, header);
        }
        table
    }

    /// Adds an alias, replacing the target of an existing one.
    pub fn insert(&mut self, alias: &str, header: &str) {
        let key = alias.trim().to_lowercase();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = header.to_string(),
            None => self.entries.push((key, header.to_string())),
        }
    }

    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (alias, header) in overrides {
            self.insert(alias, header);
        }
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        let key = name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, header)| header.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, header)| (alias.as_str(), header.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::leaderboard()
    }
}

/// How a logical field is located in the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Header names tried in order; the first that resolves wins.
    pub candidates: Vec<String>,
    /// Column used when no candidate matches.
    #[serde(default)]
    pub fallback: Option<usize>,
}

impl FieldSpec {
    pub fn new(candidates: &[&str], fallback: Option<usize>) -> Self {
        Self {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            fallback,
        }
    }

    /// Resolves the field against `header`, honouring the fallback only when it
    /// points inside the header row.
    pub fn resolve(&self, header: &[String]) -> Result<usize, RosterError> {
        if let Some(index) = self
            .candidates
            .iter()
            .find_map(|candidate| find_column(header, candidate))
        {
            return Ok(index);
        }
        match self.fallback {
            Some(index) if index < header.len() => Ok(index),
            _ => Err(RosterError::FieldNotFound(
                self.candidates.first().cloned().unwrap_or_default(),
            )),
        }
    }
}

/// Broad grouping of a stat column, derived from its header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Dkp,
    Battle,
    Other,
}

/// Finds the column for `logical_name`, substituting an alias target first.
pub fn resolve(
    header: &[String],
    logical_name: &str,
    aliases: &AliasTable,
) -> Result<usize, RosterError> {
    resolve_or(header, logical_name, aliases, None)
}

/// [`resolve()`] with a caller-supplied fallback column.
pub fn resolve_or(
    header: &[String],
    logical_name: &str,
    aliases: &AliasTable,
    fallback: Option<usize>,
) -> Result<usize, RosterError> {
    let term = aliases.lookup(logical_name).unwrap_or(logical_name);
    if let Some(index) = find_column(header, term) {
        return Ok(index);
    }
    match fallback {
        Some(index) if index < header.len() => Ok(index),
        _ => Err(RosterError::FieldNotFound(logical_name.to_string())),
    }
}

/// Leftmost exact case-insensitive match, else leftmost header containing
/// `term`.
pub fn find_column(header: &[String], term: &str) -> Option<usize> {
    let needle = term.trim().to_uppercase();
    if needle.is_empty() {
        return None;
    }
    let upper = header
        .iter()
        .map(|cell| cell.trim().to_uppercase())
        .collect::<Vec<_>>();
    upper
        .iter()
        .position(|cell| *cell == needle)
        .or_else(|| upper.iter().position(|cell| cell.contains(&needle)))
}

pub fn classify(header_name: &str) -> FieldKind {
    let upper = header_name.to_uppercase();
    if upper.contains(DKP_MARKER) {
        FieldKind::Dkp
    } else if BATTLE_TERMS.iter().any(|term| upper.contains(term)) {
        FieldKind::Battle
    } else {
        FieldKind::Other
    }
}

pub fn is_dkp_like(header_name: &str) -> bool {
    classify(header_name) == FieldKind::Dkp
}

/// Spreadsheet column letters for a 0-based index (`0` → `A`, `26` → `AA`).
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        letters.push((b'A' + offset as u8) as char);
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}
