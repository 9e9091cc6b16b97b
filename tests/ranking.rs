mod common;

use common::memory_roster;
use dkp_roster::{
    error::RosterError,
    header::AliasTable,
    ranking::{RankedEntry, rank_snapshot},
    record::{FieldMap, Roster, Snapshot},
    sheet::MemoryConnector,
};
use proptest::prelude::*;

#[test]
fn two_row_example_ranks_descending() {
    let mut roster = Roster::new(MemoryConnector::from_strs(&[
        &["ID", "Name", "Discord ID", "DKP SCORE"],
        &["1", "Alice", "", "500"],
        &["2", "Bob", "bob#1", "1200"],
    ]));
    let board = roster.rank("score", 10).expect("rank");
    assert_eq!(
        board.entries,
        vec![
            RankedEntry {
                id: "2".to_string(),
                display_name: "Bob".to_string(),
                raw_value: "1200".to_string(),
                value: 1200,
                linked_identity: "bob#1".to_string(),
            },
            RankedEntry {
                id: "1".to_string(),
                display_name: "Alice".to_string(),
                raw_value: "500".to_string(),
                value: 500,
                linked_identity: String::new(),
            },
        ]
    );
}

#[test]
fn sample_roster_skips_unparseable_and_keeps_raw_text() {
    let (mut roster, _) = memory_roster();
    let board = roster.rank("score", 10).expect("rank");
    let names = board
        .entries
        .iter()
        .map(|e| e.display_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["Erin", "Bob", "Alice", "Carol"]);
    assert_eq!(board.entries[0].raw_value, "2.5K");
    assert_eq!(board.entries[0].value, 2_500);
    assert_eq!(board.position_of("alice#1"), Some(3));

    let rates = roster.rank("rate", 2).expect("rank rate");
    assert_eq!(rates.column, "DKP RATE");
    assert_eq!(rates.entries.len(), 2);
    assert_eq!(rates.entries[0].raw_value, "500%");
}

#[test]
fn unknown_category_falls_back_to_score_column() {
    let (mut roster, _) = memory_roster();
    let board = roster.rank("honor", 10).expect("rank");
    assert_eq!(board.requested, "honor");
    assert_eq!(board.column, "DKP SCORE");
}

#[test]
fn missing_score_column_is_category_not_found() {
    let mut roster = Roster::new(MemoryConnector::from_strs(&[
        &["ID", "Name", "Discord ID", "Points"],
        &["1", "Alice", "", "5"],
    ]));
    assert!(matches!(
        roster.rank("honor", 10),
        Err(RosterError::CategoryNotFound(category)) if category == "honor"
    ));
}

fn snapshot_with(values: &[String]) -> Snapshot {
    let mut grid = vec![vec![
        "ID".to_string(),
        "Name".to_string(),
        "Discord ID".to_string(),
        "DKP SCORE".to_string(),
    ]];
    for (index, value) in values.iter().enumerate() {
        grid.push(vec![
            index.to_string(),
            format!("player{index}"),
            String::new(),
            value.clone(),
        ]);
    }
    Snapshot::from_rows(grid, &FieldMap::default()).expect("snapshot")
}

fn cell_value() -> impl Strategy<Value = String> {
    prop_oneof![
        (-5_000i64..5_000_000).prop_map(|n| n.to_string()),
        (0i64..100).prop_map(|n| format!("{n}%")),
        (0u32..999).prop_map(|n| format!("{}.{}K", n, n % 10)),
        Just(String::new()),
        Just("n/a".to_string()),
    ]
}

proptest! {
    #[test]
    fn ranking_is_bounded_sorted_and_positive(
        values in prop::collection::vec(cell_value(), 0..40),
        limit in 1usize..15,
    ) {
        let snapshot = snapshot_with(&values);
        let board = rank_snapshot(&snapshot, &AliasTable::leaderboard(), "score", limit)
            .expect("rank");
        prop_assert!(board.entries.len() <= limit);
        prop_assert!(board.entries.iter().all(|entry| entry.value > 0));
        for pair in board.entries.windows(2) {
            prop_assert!(pair[0].value >= pair[1].value);
        }
    }
}
