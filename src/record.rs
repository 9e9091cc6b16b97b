//! Record access over a roster table.
//!
//! [`Roster`] owns the connector and the current table handle. Every query
//! asks for a fresh handle and a full [`Snapshot`] of the grid; nothing is
//! cached between calls. A snapshot knows where the identity columns are
//! ([`Layout`]) and hands out [`Record`]s that pair each header name with its
//! cell text.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{RosterError, TableError},
    header::{AliasTable, FieldSpec},
    sheet::{Connect, Table, one_based},
    stats::StatsOptions,
};

/// Header candidates for the three identity columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub id: FieldSpec,
    pub display_name: FieldSpec,
    pub linked_identity: FieldSpec,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            id: FieldSpec::new(&["ID"], Some(0)),
            display_name: FieldSpec::new(&["IN-GAME NAME", "NAME"], Some(1)),
            linked_identity: FieldSpec::new(&["DISCORD ID", "DISCORD"], Some(2)),
        }
    }
}

/// Everything a [`Roster`] needs besides the connector.
#[derive(Debug, Clone, Default)]
pub struct RosterOptions {
    pub fields: FieldMap,
    pub aliases: AliasTable,
    pub stats: StatsOptions,
}

/// Column positions of the identity fields within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub id: usize,
    pub display_name: usize,
    pub linked_identity: usize,
}

impl Layout {
    pub fn resolve(header: &[String], fields: &FieldMap) -> Result<Self, RosterError> {
        Ok(Self {
            id: fields.id.resolve(header)?,
            display_name: fields.display_name.resolve(header)?,
            linked_identity: fields.linked_identity.resolve(header)?,
        })
    }

    pub fn is_identity_column(&self, column: usize) -> bool {
        column == self.id || column == self.display_name || column == self.linked_identity
    }
}

/// One player row keyed by header name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Position in the grid; the header is row 0.
    pub row: usize,
    pub id: String,
    pub display_name: String,
    pub linked_identity: String,
    pub fields: Vec<(String, String)>,
}

impl Record {
    /// Cell text for a header name exactly as it appears in the header row.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_linked(&self) -> bool {
        !self.linked_identity.is_empty()
    }
}

/// A full read of the table taken at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    layout: Layout,
}

impl Snapshot {
    pub fn from_rows(mut grid: Vec<Vec<String>>, fields: &FieldMap) -> Result<Self, RosterError> {
        let rows = if grid.is_empty() {
            Vec::new()
        } else {
            grid.split_off(1)
        };
        let header = grid.into_iter().next().unwrap_or_default();
        let layout = Layout::resolve(&header, fields)?;
        Ok(Self {
            header,
            rows,
            layout,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows only; `rows()[0]` is grid row 1.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text of data row `data_index`; missing cells read as empty.
    pub fn cell(&self, data_index: usize, column: usize) -> &str {
        self.rows
            .get(data_index)
            .and_then(|row| row.get(column))
            .map(|cell| cell.as_str())
            .unwrap_or("")
    }

    pub fn record(&self, data_index: usize) -> Option<Record> {
        let row = self.rows.get(data_index)?;
        let fields = self
            .header
            .iter()
            .enumerate()
            .map(|(column, name)| {
                let value = row.get(column).cloned().unwrap_or_default();
                (name.clone(), value)
            })
            .collect();
        Some(Record {
            row: data_index + 1,
            id: self.cell(data_index, self.layout.id).trim().to_string(),
            display_name: self.cell(data_index, self.layout.display_name).to_string(),
            linked_identity: self
                .cell(data_index, self.layout.linked_identity)
                .to_string(),
            fields,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        (0..self.rows.len()).filter_map(|index| self.record(index))
    }

    /// First data row linked to `identity`. An empty identity matches nothing.
    pub fn position_by_linked_identity(&self, identity: &str) -> Option<usize> {
        if identity.is_empty() {
            return None;
        }
        let column = self.layout.linked_identity;
        (0..self.rows.len()).find(|&index| self.cell(index, column) == identity)
    }

    pub fn position_by_id(&self, id: &str) -> Option<usize> {
        let wanted = id.trim();
        if wanted.is_empty() {
            return None;
        }
        let column = self.layout.id;
        (0..self.rows.len()).find(|&index| self.cell(index, column).trim() == wanted)
    }

    pub fn find_by_linked_identity(&self, identity: &str) -> Option<Record> {
        self.position_by_linked_identity(identity)
            .and_then(|index| self.record(index))
    }

    pub fn find_by_id(&self, id: &str) -> Option<Record> {
        self.position_by_id(id).and_then(|index| self.record(index))
    }
}

/// Data access entry point: a connector plus the options that shape lookups.
pub struct Roster<C: Connect> {
    connector: C,
    handle: Option<C::Table>,
    options: RosterOptions,
}

impl<C: Connect> Roster<C> {
    pub fn new(connector: C) -> Self {
        Self::with_options(connector, RosterOptions::default())
    }

    pub fn with_options(connector: C, options: RosterOptions) -> Self {
        Self {
            connector,
            handle: None,
            options,
        }
    }

    pub fn options(&self) -> &RosterOptions {
        &self.options
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Replaces the table handle with a freshly connected one.
    ///
    /// A failure here is final for the current operation; the previous handle
    /// is dropped either way so a later call starts clean.
    pub(crate) fn reconnect(&mut self) -> Result<&mut C::Table, RosterError> {
        if self.handle.take().is_some() {
            debug!("Dropping previous table handle before reconnecting");
        }
        match self.connector.connect() {
            Ok(table) => Ok(self.handle.insert(table)),
            Err(err) => {
                warn!("Could not re-establish table connection: {err}");
                Err(err.into())
            }
        }
    }

    /// Reconnects and reads the whole table.
    pub fn snapshot(&mut self) -> Result<Snapshot, RosterError> {
        let grid = self.reconnect()?.read_all_rows()?;
        let snapshot = Snapshot::from_rows(grid, &self.options.fields)?;
        debug!(
            "Read snapshot with {} column(s) and {} row(s)",
            snapshot.header().len(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    pub fn find_by_linked_identity(&mut self, identity: &str) -> Result<Option<Record>, RosterError> {
        Ok(self.snapshot()?.find_by_linked_identity(identity))
    }

    pub fn find_by_id(&mut self, id: &str) -> Result<Option<Record>, RosterError> {
        Ok(self.snapshot()?.find_by_id(id))
    }

    /// Writes one cell through the current handle. Callers pass 0-based grid
    /// coordinates.
    pub(crate) fn write(&mut self, row: usize, column: usize, text: &str) -> Result<(), RosterError> {
        let (row_number, column_number) = one_based(row, column);
        self.current()?.write_cell(row_number, column_number, text)?;
        Ok(())
    }

    /// Re-reads the grid through the current handle without reconnecting.
    pub(crate) fn reread(&mut self) -> Result<Vec<Vec<String>>, RosterError> {
        Ok(self.current()?.read_all_rows()?)
    }

    fn current(&mut self) -> Result<&mut C::Table, RosterError> {
        if self.handle.is_none() {
            self.reconnect()?;
        }
        self.handle.as_mut().ok_or_else(|| {
            TableError::Connection("table handle unavailable".to_string()).into()
        })
    }
}
