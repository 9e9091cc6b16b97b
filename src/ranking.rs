//! Leaderboards.
//!
//! A category name is resolved to a column, every row's cell in that column
//! is normalised with [`parse_numeric()`], and the positive values are sorted
//! descending. Ties keep table order. Entries keep the cell text as typed so
//! `45%` or `2.30M` is shown exactly as the sheet has it.

use log::debug;
use serde::Serialize;

use crate::{
    error::RosterError,
    header::{self, AliasTable},
    record::{Roster, Snapshot},
    sheet::Connect,
    value::parse_numeric,
};

pub const DEFAULT_CATEGORY: &str = "score";
pub const DEFAULT_LIMIT: usize = 10;
/// Header searched when a requested category matches nothing.
pub const FALLBACK_HEADER: &str = "DKP SCORE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub id: String,
    pub display_name: String,
    pub raw_value: String,
    pub value: i64,
    pub linked_identity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    /// Category as the caller asked for it.
    pub requested: String,
    /// Header text of the column that was ranked.
    pub column: String,
    pub entries: Vec<RankedEntry>,
}

impl Leaderboard {
    /// 1-based position of the entry linked to `identity`.
    pub fn position_of(&self, identity: &str) -> Option<usize> {
        if identity.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .position(|entry| entry.linked_identity == identity)
            .map(|index| index + 1)
    }
}

/// Column for `category`: alias → exact → substring, then the DKP score
/// column as a last resort.
pub fn resolve_category(
    header: &[String],
    category: &str,
    aliases: &AliasTable,
) -> Result<usize, RosterError> {
    header::resolve(header, category, aliases)
        .or_else(|_| {
            debug!("Category '{category}' not found, falling back to '{FALLBACK_HEADER}'");
            header::resolve(header, FALLBACK_HEADER, aliases)
        })
        .map_err(|_| RosterError::CategoryNotFound(category.to_string()))
}

pub fn rank_snapshot(
    snapshot: &Snapshot,
    aliases: &AliasTable,
    category: &str,
    limit: usize,
) -> Result<Leaderboard, RosterError> {
    let column = resolve_category(snapshot.header(), category, aliases)?;
    let layout = snapshot.layout();

    let mut entries = Vec::new();
    for index in 0..snapshot.len() {
        let raw_value = snapshot.cell(index, column).trim();
        let display_name = snapshot.cell(index, layout.display_name).trim();
        if raw_value.is_empty() || display_name.is_empty() {
            continue;
        }
        let Ok(value) = parse_numeric(raw_value) else {
            continue;
        };
        if value <= 0 {
            continue;
        }
        entries.push(RankedEntry {
            id: snapshot.cell(index, layout.id).trim().to_string(),
            display_name: snapshot.cell(index, layout.display_name).to_string(),
            raw_value: raw_value.to_string(),
            value,
            linked_identity: snapshot.cell(index, layout.linked_identity).to_string(),
        });
    }

    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries.truncate(limit);

    let column_name = snapshot.header()[column].clone();
    debug!(
        "Ranked {} entr(ies) for '{category}' using column '{column_name}'",
        entries.len()
    );
    Ok(Leaderboard {
        requested: category.to_string(),
        column: column_name,
        entries,
    })
}

impl<C: Connect> Roster<C> {
    pub fn rank(&mut self, category: &str, limit: usize) -> Result<Leaderboard, RosterError> {
        let snapshot = self.snapshot()?;
        rank_snapshot(&snapshot, &self.options().aliases, category, limit)
    }
}
