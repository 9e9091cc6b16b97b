//! Per-player stats cards.
//!
//! A card shows the three core DKP fields first, then every other column
//! split into battle-like and general fields. The DKP columns carry fixed
//! fallback positions so a card still renders when someone renames a header.

use serde::{Deserialize, Serialize};

use crate::{
    error::RosterError,
    header::{self, FieldKind, FieldSpec},
    record::{Record, Roster, Snapshot},
    sheet::Connect,
    value::parse_numeric,
};

pub const MISSING_VALUE: &str = "N/A";

const RATE_MID_THRESHOLD: i64 = 100;
const RATE_HIGH_THRESHOLD: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsOptions {
    pub score: FieldSpec,
    pub goal: FieldSpec,
    pub rate: FieldSpec,
    /// Header names never listed on a card.
    pub hidden: Vec<String>,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            score: FieldSpec::new(&["DKP SCORE"], Some(14)),
            goal: FieldSpec::new(&["DKP GOAL"], Some(13)),
            rate: FieldSpec::new(&["DKP RATE"], Some(15)),
            hidden: vec![
                "POWER WEIGHT".to_string(),
                "TOTAL SCORE".to_string(),
                "RSS ASSISTANCE".to_string(),
            ],
        }
    }
}

/// Colour band derived from the DKP completion rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTier {
    Low,
    Mid,
    High,
}

impl RateTier {
    pub fn from_rate(rate: i64) -> Self {
        if rate < RATE_MID_THRESHOLD {
            RateTier::Low
        } else if rate < RATE_HIGH_THRESHOLD {
            RateTier::Mid
        } else {
            RateTier::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DkpSummary {
    pub score: String,
    pub goal: String,
    pub rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsCard {
    pub id: String,
    pub display_name: String,
    pub linked_identity: String,
    pub dkp: DkpSummary,
    pub rate_tier: RateTier,
    pub battle: Vec<(String, String)>,
    pub other: Vec<(String, String)>,
}

pub fn build_card(snapshot: &Snapshot, record: &Record, options: &StatsOptions) -> StatsCard {
    let header = snapshot.header();
    // Cells past the end of a short row are missing, not empty.
    let row = record
        .row
        .checked_sub(1)
        .and_then(|index| snapshot.rows().get(index))
        .map(Vec::as_slice)
        .unwrap_or_default();
    let value_at = |spec: &FieldSpec| -> String {
        spec.resolve(header)
            .ok()
            .and_then(|column| row.get(column))
            .cloned()
            .unwrap_or_else(|| MISSING_VALUE.to_string())
    };
    let dkp = DkpSummary {
        score: value_at(&options.score),
        goal: value_at(&options.goal),
        rate: value_at(&options.rate),
    };
    let rate_tier = RateTier::from_rate(parse_numeric(&dkp.rate).unwrap_or(0));

    let layout = snapshot.layout();
    let mut battle = Vec::new();
    let mut other = Vec::new();
    for (column, (name, value)) in record.fields.iter().enumerate() {
        if name.trim().is_empty()
            || layout.is_identity_column(column)
            || options
                .hidden
                .iter()
                .any(|hidden| hidden.eq_ignore_ascii_case(name.trim()))
        {
            continue;
        }
        match header::classify(name) {
            FieldKind::Dkp => {}
            FieldKind::Battle => battle.push((name.clone(), value.clone())),
            FieldKind::Other => other.push((name.clone(), value.clone())),
        }
    }

    StatsCard {
        id: record.id.clone(),
        display_name: record.display_name.clone(),
        linked_identity: record.linked_identity.clone(),
        dkp,
        rate_tier,
        battle,
        other,
    }
}

impl<C: Connect> Roster<C> {
    /// Stats card for the record linked to `identity`, if any.
    pub fn stats(&mut self, identity: &str) -> Result<Option<StatsCard>, RosterError> {
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .find_by_linked_identity(identity)
            .map(|record| build_card(&snapshot, &record, &self.options().stats)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::MemoryConnector;

    #[test]
    fn card_groups_fields_and_skips_hidden_ones() {
        let connector = MemoryConnector::from_strs(&[
            &[
                "ID",
                "IN-GAME NAME",
                "Discord ID",
                "BASE POWER",
                "BASE T4 KILLS",
                "POWER WEIGHT",
                "DKP SCORE",
                "DKP GOAL",
                "DKP RATE",
                "",
            ],
            &[
                "11", "Ragnar", "rag#1", "45.2M", "1,200", "0.4", "9000", "3000", "300%", "x",
            ],
        ]);
        let mut roster = Roster::new(connector);
        let card = roster.stats("rag#1").expect("read").expect("card");
        assert_eq!(card.dkp.score, "9000");
        assert_eq!(card.dkp.goal, "3000");
        assert_eq!(card.dkp.rate, "300%");
        assert_eq!(card.rate_tier, RateTier::High);
        assert_eq!(
            card.battle,
            vec![("BASE T4 KILLS".to_string(), "1,200".to_string())]
        );
        assert_eq!(
            card.other,
            vec![("BASE POWER".to_string(), "45.2M".to_string())]
        );
    }

    #[test]
    fn missing_dkp_columns_fall_back_or_report_missing() {
        let connector = MemoryConnector::from_strs(&[
            &["ID", "Name", "Discord ID", "Points"],
            &["1", "Solo", "solo#1", "77"],
        ]);
        let mut roster = Roster::new(connector);
        let card = roster.stats("solo#1").expect("read").expect("card");
        assert_eq!(card.dkp.score, MISSING_VALUE);
        assert_eq!(card.rate_tier, RateTier::Low);
        assert_eq!(card.other, vec![("Points".to_string(), "77".to_string())]);
    }

    #[test]
    fn short_row_reports_missing_dkp_values() {
        let connector = MemoryConnector::from_strs(&[
            &["ID", "IN-GAME NAME", "Discord ID", "DKP SCORE", "DKP GOAL", "DKP RATE"],
            &["1", "Short", "s#1"],
        ]);
        let mut roster = Roster::new(connector);
        let card = roster.stats("s#1").expect("read").expect("card");
        assert_eq!(card.dkp.score, MISSING_VALUE);
        assert_eq!(card.dkp.goal, MISSING_VALUE);
        assert_eq!(card.dkp.rate, MISSING_VALUE);
        assert_eq!(card.rate_tier, RateTier::Low);
    }

    #[test]
    fn unlinked_identity_has_no_card() {
        let connector = MemoryConnector::from_strs(&[&["ID", "Name", "Discord ID"], &["1", "A", ""]]);
        let mut roster = Roster::new(connector);
        assert!(roster.stats("nobody").expect("read").is_none());
    }

    #[test]
    fn rate_tiers_follow_thresholds() {
        assert_eq!(RateTier::from_rate(99), RateTier::Low);
        assert_eq!(RateTier::from_rate(100), RateTier::Mid);
        assert_eq!(RateTier::from_rate(299), RateTier::Mid);
        assert_eq!(RateTier::from_rate(300), RateTier::High);
    }
}
