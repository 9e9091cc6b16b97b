//! Command surface.
//!
//! Each handler runs one user command against a [`Roster`] and returns a
//! [`Reply`]. Handlers never fail: business-rule outcomes and errors alike
//! become replies with an appropriate [`Tone`], so one bad command cannot
//! take the process down.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::{error, info, warn};
use serde::{Serialize, Serializer};

use crate::{
    chart::{ChartRenderer, render_or_placeholder},
    comparison::{CompareOutcome, Comparison, Direction, FieldDelta, Side},
    error::{RosterError, TableError},
    header::{self, AliasTable},
    mutation::{LinkOutcome, UnlinkOutcome},
    ranking::Leaderboard,
    record::Roster,
    sheet::Connect,
    stats::{RateTier, StatsCard},
    table::{Align, render_table},
    value::{format_compact, format_delta},
};

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];
const MISSING_ID: &str = "N/A";
const OUT_OF_RANGE: &str = "Out of range";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Warning,
    Error,
    Info,
}

impl Tone {
    fn marker(self) -> &'static str {
        match self {
            Tone::Success => "✅",
            Tone::Warning => "⚠️",
            Tone::Error => "❌",
            Tone::Info => "📊",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub filename: String,
    #[serde(rename = "byte_len", serialize_with = "serialize_len")]
    pub bytes: Vec<u8>,
}

fn serialize_len<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(bytes.len() as u64)
}

/// Transport-neutral response to one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub tone: Tone,
    pub title: String,
    pub description: String,
    pub sections: Vec<Section>,
    pub attachment: Option<Attachment>,
    pub generated_at: DateTime<Utc>,
}

impl Reply {
    pub fn new(tone: Tone, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tone,
            title: title.into(),
            description: description.into(),
            sections: Vec::new(),
            attachment: None,
            generated_at: Utc::now(),
        }
    }

    pub fn with_section(mut self, title: impl Into<String>, lines: Vec<String>) -> Self {
        self.sections.push(Section {
            title: title.into(),
            lines,
        });
        self
    }

    pub fn with_attachment(mut self, filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.attachment = Some(Attachment {
            filename: filename.into(),
            bytes,
        });
        self
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.title == title)
    }

    pub fn is_failure(&self) -> bool {
        self.tone == Tone::Error
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {}", self.tone.marker(), self.title);
        if !self.description.is_empty() {
            let _ = writeln!(out, "{}", self.description);
        }
        let body = self
            .sections
            .iter()
            .map(|section| {
                let lines = section.lines.iter().map(|line| format!("  {line}")).join("\n");
                format!("{}\n{lines}", section.title)
            })
            .join("\n\n");
        if !body.is_empty() {
            let _ = writeln!(out, "\n{body}");
        }
        if let Some(attachment) = &self.attachment {
            let _ = writeln!(
                out,
                "\nAttachment: {} ({} bytes)",
                attachment.filename,
                attachment.bytes.len()
            );
        }
        out
    }
}

pub fn missing_argument(usage: &str) -> Reply {
    Reply::new(
        Tone::Error,
        "Missing Argument",
        format!("Please provide all required arguments (usage: {usage})."),
    )
}

pub fn link<C: Connect>(roster: &mut Roster<C>, requester: &str, id: Option<&str>) -> Reply {
    let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) else {
        return missing_argument("link <ID>");
    };
    match roster.link(id, requester) {
        Ok(LinkOutcome::Success { id }) => Reply::new(
            Tone::Success,
            "Link Successful",
            format!("{requester} has been linked to ID {id}."),
        ),
        Ok(LinkOutcome::AlreadyLinked { existing_id }) => Reply::new(
            Tone::Warning,
            "Already Linked",
            format!("You are already linked to ID {existing_id}."),
        ),
        Ok(LinkOutcome::IdInUse { id }) => Reply::new(
            Tone::Warning,
            "ID Already Linked",
            format!("ID {id} is already linked to another user."),
        ),
        Ok(LinkOutcome::NotFound { id }) => Reply::new(
            Tone::Error,
            "ID Not Found",
            format!("ID {id} was not found. Please check and try again."),
        ),
        Err(err) => failure("link", err),
    }
}

pub fn unlink<C: Connect>(roster: &mut Roster<C>, requester: &str) -> Reply {
    match roster.unlink(requester) {
        Ok(UnlinkOutcome::Success { freed_id }) => Reply::new(
            Tone::Success,
            "Unlink Successful",
            format!("{requester} has been unlinked from ID {freed_id}."),
        ),
        Ok(UnlinkOutcome::NotLinked) => not_linked(),
        Err(err) => failure("unlink", err),
    }
}

/// Stats card for `target`, or for the requester when no target is given.
pub fn stats<C: Connect>(roster: &mut Roster<C>, requester: &str, target: Option<&str>) -> Reply {
    let target = target.map(str::trim).filter(|t| !t.is_empty());
    let identity = target.unwrap_or(requester);
    match roster.stats(identity) {
        Ok(Some(card)) => stats_reply(&card),
        Ok(None) if identity != requester => Reply::new(
            Tone::Error,
            "User Not Linked",
            format!("{identity} is not linked to any ID."),
        ),
        Ok(None) => not_linked(),
        Err(err) => failure("stats", err),
    }
}

fn stats_reply(card: &StatsCard) -> Reply {
    let tier = match card.rate_tier {
        RateTier::Low => "low",
        RateTier::Mid => "mid",
        RateTier::High => "high",
    };
    let mut reply = Reply::new(
        Tone::Info,
        format!("Stats for {}", card.display_name),
        format!("ID: {}\nIn-Game Name: {}", card.id, card.display_name),
    )
    .with_section(
        "DKP Stats",
        vec![
            format!("DKP Score: {}", card.dkp.score),
            format!("DKP Goal: {}", card.dkp.goal),
            format!("DKP Rate: {} ({tier})", card.dkp.rate),
        ],
    );
    let pairs = |fields: &[(String, String)]| {
        fields
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
    };
    if !card.battle.is_empty() {
        reply = reply.with_section("Battle Stats", pairs(&card.battle));
    }
    if !card.other.is_empty() {
        reply = reply.with_section("Additional Info", pairs(&card.other));
    }
    reply
}

pub fn leaderboard<C: Connect>(
    roster: &mut Roster<C>,
    requester: Option<&str>,
    category: &str,
    limit: usize,
) -> Reply {
    match roster.rank(category, limit) {
        Ok(board) if board.entries.is_empty() => Reply::new(
            Tone::Warning,
            "No Data",
            format!("No valid data found for the '{}' category.", board.column),
        ),
        Ok(board) => {
            info!(
                "Leaderboard '{}' produced {} entr(ies)",
                board.column,
                board.entries.len()
            );
            leaderboard_reply(&board, requester.unwrap_or(""))
        }
        Err(err) => failure("leaderboard", err),
    }
}

fn leaderboard_reply(board: &Leaderboard, requester: &str) -> Reply {
    let highlighted = board.position_of(requester);
    let rows = board
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let position = index + 1;
            let rank = MEDALS
                .get(index)
                .map(|medal| medal.to_string())
                .unwrap_or_else(|| format!("#{position}"));
            let name = if highlighted == Some(position) {
                format!("{} (you)", entry.display_name)
            } else {
                entry.display_name.clone()
            };
            let id = if entry.id.is_empty() {
                MISSING_ID.to_string()
            } else {
                entry.id.clone()
            };
            vec![rank, name, id, entry.raw_value.clone()]
        })
        .collect::<Vec<_>>();
    let headers = vec![
        "Rank".to_string(),
        "Name".to_string(),
        "ID".to_string(),
        board.column.clone(),
    ];
    let table = render_table(
        &headers,
        &rows,
        &[Align::Left, Align::Left, Align::Left, Align::Right],
    );
    Reply::new(
        Tone::Info,
        format!("{} Leaderboard", board.column),
        format!("Top players ranked by {}", board.column),
    )
    .with_section("Rankings", table.lines().map(str::to_string).collect())
}

/// Compares the requester against `target` and attaches a chart of the DKP
/// fields when there are any.
pub fn compare<C: Connect>(
    roster: &mut Roster<C>,
    renderer: &dyn ChartRenderer,
    requester: &str,
    target: &str,
) -> Reply {
    let target = target.trim();
    if target.is_empty() {
        return missing_argument("compare <TARGET>");
    }
    if target == requester {
        return Reply::new(
            Tone::Warning,
            "Invalid Comparison",
            "You cannot compare stats with yourself.",
        );
    }
    match roster.compare(requester, target) {
        Ok(CompareOutcome::Compared(comparison)) => comparison_reply(&comparison, renderer),
        Ok(CompareOutcome::Unlinked { side: Side::First }) => not_linked(),
        Ok(CompareOutcome::Unlinked { side: Side::Second }) => Reply::new(
            Tone::Error,
            "Not Linked",
            format!("{target} is not linked to any ID."),
        ),
        Err(err) => failure("compare", err),
    }
}

fn comparison_reply(comparison: &Comparison, renderer: &dyn ChartRenderer) -> Reply {
    let first = &comparison.first.display_name;
    let second = &comparison.second.display_name;
    let mut reply = Reply::new(
        Tone::Info,
        "Stat Comparison",
        format!("Comparing stats between {first} and {second}"),
    );
    if comparison.is_empty() {
        return reply.with_section(
            "Comparison",
            vec!["No numeric fields are available for both players.".to_string()],
        );
    }
    if !comparison.dkp.is_empty() {
        reply = reply.with_section("DKP Comparison", delta_lines(&comparison.dkp));
    }
    if !comparison.other.is_empty() {
        reply = reply.with_section("Other Stats Comparison", delta_lines(&comparison.other));
    }
    reply = reply.with_section("Legend", vec![format!("{first} vs {second}")]);
    match comparison.dkp_chart() {
        Some(chart) => {
            let bytes = render_or_placeholder(renderer, &chart);
            reply.with_attachment(format!("dkp_comparison.{}", renderer.extension()), bytes)
        }
        None => reply,
    }
}

fn delta_lines(deltas: &[FieldDelta]) -> Vec<String> {
    deltas
        .iter()
        .map(|delta| {
            let arrow = match delta.direction {
                Direction::Up => "▲",
                Direction::Down => "▼",
                Direction::Equal => "=",
            };
            format!(
                "{}: {} {arrow} {} {}",
                delta.field,
                format_compact(delta.first),
                format_compact(delta.second),
                format_delta(delta.delta)
            )
        })
        .collect()
}

/// Lists the header layout and the requester's DKP cells, for diagnosing a
/// sheet whose columns have drifted.
pub fn inspect<C: Connect>(roster: &mut Roster<C>, requester: &str) -> Reply {
    let snapshot = match roster.snapshot() {
        Ok(snapshot) => snapshot,
        Err(err) => return failure("inspect", err),
    };
    let Some(record) = snapshot.find_by_linked_identity(requester) else {
        return not_linked();
    };
    let row = snapshot
        .rows()
        .get(record.row - 1)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let header_rows = snapshot
        .header()
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.trim().is_empty())
        .map(|(index, name)| vec![header::column_letter(index), index.to_string(), name.clone()])
        .collect::<Vec<_>>();
    let headers = ["Column", "Index", "Header"].map(str::to_string);
    let header_table = render_table(
        &headers,
        &header_rows,
        &[Align::Left, Align::Right, Align::Left],
    );

    let dkp_lines = snapshot
        .header()
        .iter()
        .enumerate()
        .filter(|(_, name)| header::is_dkp_like(name))
        .map(|(index, name)| match row.get(index) {
            Some(value) => format!("{name}: '{value}'"),
            None => format!("{name}: {OUT_OF_RANGE}"),
        })
        .collect::<Vec<_>>();

    Reply::new(
        Tone::Info,
        "Sheet Layout",
        format!("Row {} belongs to ID {}", record.row + 1, record.id),
    )
    .with_section("Headers", header_table.lines().map(str::to_string).collect())
    .with_section("DKP Values", dkp_lines)
    .with_section(
        "Row",
        vec![
            format!("Row length: {}", row.len()),
            format!("Linked identity: {}", record.linked_identity),
        ],
    )
}

/// Leaderboard categories and the columns they stand for. Needs no table.
pub fn categories(aliases: &AliasTable) -> Reply {
    let rows = aliases
        .iter()
        .map(|(alias, column)| vec![alias.to_string(), column.to_string()])
        .collect::<Vec<_>>();
    let headers = ["Category", "Column"].map(str::to_string);
    let table = render_table(&headers, &rows, &[]);
    Reply::new(
        Tone::Info,
        "Leaderboard Categories",
        format!(
            "Use one of: {}. Any other name is matched against the sheet headers.",
            aliases.iter().map(|(alias, _)| alias).join(", ")
        ),
    )
    .with_section("Categories", table.lines().map(str::to_string).collect())
}

fn not_linked() -> Reply {
    Reply::new(
        Tone::Error,
        "Not Linked",
        "You are not linked to any ID. Use `link <ID>` first.",
    )
}

/// Turns a failed query into a user-facing reply.
fn failure(command: &str, err: RosterError) -> Reply {
    match err {
        table_err @ RosterError::Table(TableError::Connection(_) | TableError::Auth(_)) => {
            warn!("{command}: {table_err}");
            Reply::new(
                Tone::Error,
                "Spreadsheet Unavailable",
                "The roster spreadsheet could not be reached. Please try again later.",
            )
        }
        RosterError::CategoryNotFound(category) => Reply::new(
            Tone::Error,
            "Invalid Category",
            format!("Category '{category}' was not found. Run `categories` to list valid names."),
        ),
        RosterError::FieldNotFound(field) => {
            warn!("{command}: no column for '{field}'");
            Reply::new(
                Tone::Error,
                "Sheet Layout Changed",
                format!("The roster has no '{field}' column."),
            )
        }
        RosterError::BlankIdentity => missing_argument("--user <IDENTITY>"),
        RosterError::StaleRow { row } => {
            warn!("{command}: row {row} changed during update");
            Reply::new(
                Tone::Warning,
                "Roster Changed",
                "The roster changed while it was being updated. Please try again.",
            )
        }
        other => {
            error!("{command}: {other}");
            Reply::new(
                Tone::Error,
                "Error",
                "An unexpected error occurred. Please try again later.",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chart::SvgBarChart, sheet::MemoryConnector};

    fn roster() -> Roster<MemoryConnector> {
        Roster::new(MemoryConnector::from_strs(&[
            &["ID", "Name", "Discord ID", "DKP SCORE", "DKP GOAL", "T4 KILLS"],
            &["1", "Alice", "alice#1", "900", "1,000", "12,000"],
            &["2", "Bob", "bob#1", "1,200", "1,000", "9,000"],
            &["", "Carol", "", "300", "", ""],
            &["4", "Dave", "", "n/a", "", ""],
        ]))
    }

    #[test]
    fn link_without_id_asks_for_argument() {
        let mut roster = roster();
        let reply = link(&mut roster, "zed#1", Some("  "));
        assert_eq!(reply.title, "Missing Argument");
        assert_eq!(roster.connector().connect_count(), 0);
    }

    #[test]
    fn link_with_blank_requester_asks_for_identity() {
        let mut roster = roster();
        let reply = link(&mut roster, "", Some("4"));
        assert_eq!(reply.title, "Missing Argument");
        assert_eq!(roster.connector().cell(4, 2).as_deref(), Some(""));
    }

    #[test]
    fn link_outcomes_map_to_tones() {
        let mut roster = roster();
        assert_eq!(link(&mut roster, "dave#1", Some("4")).tone, Tone::Success);
        assert_eq!(link(&mut roster, "dave#1", Some("4")).title, "Already Linked");
        assert_eq!(link(&mut roster, "eve#1", Some("2")).title, "ID Already Linked");
        assert_eq!(link(&mut roster, "eve#1", Some("99")).title, "ID Not Found");
    }

    #[test]
    fn stats_distinguishes_requester_and_target() {
        let mut roster = roster();
        assert_eq!(stats(&mut roster, "nobody", None).title, "Not Linked");
        assert_eq!(
            stats(&mut roster, "alice#1", Some("ghost#0")).title,
            "User Not Linked"
        );
        let reply = stats(&mut roster, "nobody", Some("bob#1"));
        assert_eq!(reply.title, "Stats for Bob");
        let dkp = reply.section("DKP Stats").expect("dkp section");
        assert_eq!(dkp.lines[0], "DKP Score: 1,200");
        assert_eq!(
            reply.section("Battle Stats").expect("battle").lines,
            vec!["T4 KILLS: 9,000"]
        );
    }

    #[test]
    fn leaderboard_marks_medals_requester_and_missing_ids() {
        let mut roster = roster();
        let reply = leaderboard(&mut roster, Some("alice#1"), "score", 10);
        assert_eq!(reply.title, "DKP SCORE Leaderboard");
        let lines = &reply.section("Rankings").expect("rankings").lines;
        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("🥇") && lines[2].contains("Bob"));
        assert!(lines[3].contains("Alice (you)"));
        assert!(lines[4].contains("Carol") && lines[4].contains(MISSING_ID));
    }

    #[test]
    fn leaderboard_without_values_reports_no_data() {
        let mut roster = Roster::new(MemoryConnector::from_strs(&[
            &["ID", "Name", "Discord ID", "DKP SCORE"],
            &["1", "A", "", "0"],
        ]));
        let reply = leaderboard(&mut roster, None, "honor", 10);
        assert_eq!(reply.title, "No Data");
        assert_eq!(
            reply.description,
            "No valid data found for the 'DKP SCORE' category."
        );
    }

    #[test]
    fn compare_rejects_self_before_reading() {
        let mut roster = roster();
        let reply = compare(&mut roster, &SvgBarChart::default(), "alice#1", "alice#1");
        assert_eq!(reply.title, "Invalid Comparison");
        assert_eq!(roster.connector().connect_count(), 0);
    }

    #[test]
    fn compare_lists_deltas_and_attaches_chart() {
        let mut roster = roster();
        let reply = compare(&mut roster, &SvgBarChart::default(), "alice#1", "bob#1");
        let dkp = reply.section("DKP Comparison").expect("dkp");
        assert_eq!(dkp.lines[0], "DKP SCORE: 900 ▼ 1.20K (-300)");
        assert_eq!(dkp.lines[1], "DKP GOAL: 1.00K = 1.00K (=)");
        let other = reply.section("Other Stats Comparison").expect("other");
        assert_eq!(other.lines[0], "T4 KILLS: 12.00K ▲ 9.00K (+3.00K)");
        let attachment = reply.attachment.expect("chart");
        assert_eq!(attachment.filename, "dkp_comparison.svg");
        assert!(attachment.bytes.starts_with(b"<svg"));
    }

    #[test]
    fn compare_with_unlinked_target_has_no_chart() {
        let mut roster = roster();
        let reply = compare(&mut roster, &SvgBarChart::default(), "alice#1", "ghost#0");
        assert_eq!(reply.description, "ghost#0 is not linked to any ID.");
        assert!(reply.attachment.is_none());
    }

    #[test]
    fn connection_failure_becomes_unavailable_reply() {
        let connector = MemoryConnector::from_strs(&[&["ID", "Name", "Discord ID"]]);
        connector.set_offline(true);
        let mut roster = Roster::new(connector);
        let reply = unlink(&mut roster, "alice#1");
        assert_eq!(reply.title, "Spreadsheet Unavailable");
        assert!(reply.is_failure());
    }

    #[test]
    fn inspect_reports_letters_and_short_rows() {
        let mut roster = Roster::new(MemoryConnector::from_strs(&[
            &["ID", "Name", "Discord ID", "DKP SCORE", "", "DKP RATE"],
            &["1", "Alice", "alice#1", "900"],
        ]));
        let reply = inspect(&mut roster, "alice#1");
        let headers = &reply.section("Headers").expect("headers").lines;
        assert_eq!(headers.len(), 7);
        assert!(headers[2].starts_with("A "));
        assert!(headers[6].starts_with("F ") && headers[6].ends_with("DKP RATE"));
        assert_eq!(
            reply.section("DKP Values").expect("dkp").lines,
            vec!["DKP SCORE: '900'", "DKP RATE: Out of range"]
        );
        assert_eq!(reply.section("Row").expect("row").lines[0], "Row length: 4");
    }

    #[test]
    fn categories_lists_aliases_without_table() {
        let reply = categories(&AliasTable::leaderboard());
        assert!(reply.description.starts_with("Use one of: score, goal, rate"));
        assert_eq!(reply.section("Categories").expect("table").lines.len(), 9);
    }

    #[test]
    fn attachment_serialises_length_only() {
        let reply = Reply::new(Tone::Info, "t", "d").with_attachment("a.svg", vec![1, 2, 3]);
        let json = serde_json::to_value(&reply).expect("json");
        assert_eq!(json["attachment"]["byte_len"], 3);
        assert_eq!(json["tone"], "info");
        let text = reply.render_text();
        assert!(text.contains("Attachment: a.svg (3 bytes)"));
    }
}
