//! The table handle contract.
//!
//! The roster lives in an external grid of text cells. Row 0 is the header.
//! Indices are 0-based everywhere in this crate except [`Table::write_cell`],
//! which addresses the grid the way spreadsheet services do (1-based row and
//! column numbers).

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::error::TableError;

pub trait Table {
    fn read_header(&self) -> Result<Vec<String>, TableError> {
        Ok(self.read_all_rows()?.into_iter().next().unwrap_or_default())
    }

    /// Every row including the header, in table order.
    fn read_all_rows(&self) -> Result<Vec<Vec<String>>, TableError>;

    fn write_cell(&mut self, row: usize, column: usize, text: &str) -> Result<(), TableError>;
}

/// Produces a fresh, authorised [`Table`] handle.
///
/// Handles can go stale when a remote service drops an idle session, so the
/// roster asks for a new one before each operation.
pub trait Connect {
    type Table: Table;

    fn connect(&self) -> Result<Self::Table, TableError>;
}

/// Converts a 0-based grid position to the 1-based numbering of `write_cell`.
pub fn one_based(row: usize, column: usize) -> (usize, usize) {
    (row + 1, column + 1)
}

/// In-process grid shared between every handle a [`MemoryConnector`] hands
/// out. Used by tests and benches.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    grid: Rc<RefCell<Vec<Vec<String>>>>,
    offline: Rc<Cell<bool>>,
    connects: Rc<Cell<usize>>,
}

impl MemoryConnector {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            grid: Rc::new(RefCell::new(rows)),
            offline: Rc::new(Cell::new(false)),
            connects: Rc::new(Cell::new(0)),
        }
    }

    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
    }

    /// Makes subsequent `connect` calls and reads through existing handles
    /// fail with [`TableError::Connection`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.get()
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.grid.borrow().clone()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<String> {
        self.grid
            .borrow()
            .get(row)
            .and_then(|cells| cells.get(column))
            .cloned()
    }

    /// Overwrites a cell directly, standing in for an edit made by someone
    /// else while an operation is in flight.
    pub fn edit(&self, row: usize, column: usize, text: &str) {
        let mut grid = self.grid.borrow_mut();
        if let Some(cells) = grid.get_mut(row) {
            if cells.len() <= column {
                cells.resize(column + 1, String::new());
            }
            cells[column] = text.to_string();
        }
    }
}

impl Connect for MemoryConnector {
    type Table = MemoryTable;

    fn connect(&self) -> Result<MemoryTable, TableError> {
        if self.offline.get() {
            return Err(TableError::Connection("memory table is offline".to_string()));
        }
        self.connects.set(self.connects.get() + 1);
        Ok(MemoryTable {
            grid: Rc::clone(&self.grid),
            offline: Rc::clone(&self.offline),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryTable {
    grid: Rc<RefCell<Vec<Vec<String>>>>,
    offline: Rc<Cell<bool>>,
}

impl MemoryTable {
    fn ensure_online(&self) -> Result<(), TableError> {
        if self.offline.get() {
            Err(TableError::Connection("memory table is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Table for MemoryTable {
    fn read_all_rows(&self) -> Result<Vec<Vec<String>>, TableError> {
        self.ensure_online()?;
        Ok(self.grid.borrow().clone())
    }

    fn write_cell(&mut self, row: usize, column: usize, text: &str) -> Result<(), TableError> {
        self.ensure_online()?;
        let mut grid = self.grid.borrow_mut();
        if row == 0 || column == 0 || row > grid.len() {
            return Err(TableError::OutOfRange { row, column });
        }
        let cells = &mut grid[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = text.to_string();
        Ok(())
    }
}
