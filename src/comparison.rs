//! Head-to-head comparison of two linked players.
//!
//! Only columns where both players hold a plain (optionally comma-grouped)
//! integer take part; percentages and `K`/`M` abbreviations are left out so
//! deltas are always between like quantities.

use serde::Serialize;

use crate::{
    chart::BarChart,
    error::RosterError,
    header,
    record::{Record, Roster, Snapshot},
    sheet::Connect,
    value::parse_grouped_integer,
};

/// Which participant of a comparison a result refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The player who asked for the comparison.
    First,
    Second,
}

/// Movement of the first player's value relative to the second's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Equal,
}

impl Direction {
    pub fn of(delta: i64) -> Self {
        match delta.signum() {
            1 => Direction::Up,
            -1 => Direction::Down,
            _ => Direction::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDelta {
    pub field: String,
    pub column: usize,
    pub first: i64,
    pub second: i64,
    pub delta: i64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: String,
    pub display_name: String,
    pub linked_identity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub first: Participant,
    pub second: Participant,
    /// DKP-like fields in header order.
    pub dkp: Vec<FieldDelta>,
    /// Every other comparable field in header order.
    pub other: Vec<FieldDelta>,
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.dkp.is_empty() && self.other.is_empty()
    }

    /// Grouped bar chart of the DKP fields, or `None` when there are none.
    pub fn dkp_chart(&self) -> Option<BarChart> {
        if self.dkp.is_empty() {
            return None;
        }
        Some(BarChart {
            title: "DKP Comparison".to_string(),
            labels: self.dkp.iter().map(|d| d.field.clone()).collect(),
            series: vec![
                (
                    self.first.display_name.clone(),
                    self.dkp.iter().map(|d| d.first).collect(),
                ),
                (
                    self.second.display_name.clone(),
                    self.dkp.iter().map(|d| d.second).collect(),
                ),
            ],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompareOutcome {
    Compared(Comparison),
    Unlinked { side: Side },
}

pub fn compare_snapshot(snapshot: &Snapshot, first: &str, second: &str) -> CompareOutcome {
    let Some(record_a) = snapshot.find_by_linked_identity(first) else {
        return CompareOutcome::Unlinked { side: Side::First };
    };
    let Some(record_b) = snapshot.find_by_linked_identity(second) else {
        return CompareOutcome::Unlinked { side: Side::Second };
    };

    let layout = snapshot.layout();
    let mut dkp = Vec::new();
    let mut other = Vec::new();
    for (column, field) in snapshot.header().iter().enumerate() {
        if layout.is_identity_column(column) {
            continue;
        }
        let (Some((_, raw_a)), Some((_, raw_b))) =
            (record_a.fields.get(column), record_b.fields.get(column))
        else {
            continue;
        };
        let (Ok(value_a), Ok(value_b)) = (parse_grouped_integer(raw_a), parse_grouped_integer(raw_b))
        else {
            continue;
        };
        let delta = value_a.saturating_sub(value_b);
        let entry = FieldDelta {
            field: field.clone(),
            column,
            first: value_a,
            second: value_b,
            delta,
            direction: Direction::of(delta),
        };
        if header::is_dkp_like(field) {
            dkp.push(entry);
        } else {
            other.push(entry);
        }
    }

    let participant = |record: Record| Participant {
        id: record.id,
        display_name: record.display_name,
        linked_identity: record.linked_identity,
    };
    CompareOutcome::Compared(Comparison {
        first: participant(record_a),
        second: participant(record_b),
        dkp,
        other,
    })
}

impl<C: Connect> Roster<C> {
    pub fn compare(&mut self, first: &str, second: &str) -> Result<CompareOutcome, RosterError> {
        let snapshot = self.snapshot()?;
        Ok(compare_snapshot(&snapshot, first, second))
    }
}
