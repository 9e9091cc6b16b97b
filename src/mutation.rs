//! Linking and unlinking chat identities.
//!
//! Both operations reconnect, take a snapshot, decide, and write at most one
//! cell: the record's linked-identity column. Before the write the row is read
//! again through the same handle; if its id or link cell moved in the
//! meantime the write is abandoned with [`RosterError::StaleRow`].

use log::{debug, info};
use serde::Serialize;

use crate::{
    error::RosterError,
    record::{Roster, Snapshot},
    sheet::Connect,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkOutcome {
    Success { id: String },
    /// The identity is already attached to a record.
    AlreadyLinked { existing_id: String },
    /// The requested record belongs to another identity.
    IdInUse { id: String },
    NotFound { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnlinkOutcome {
    Success { freed_id: String },
    NotLinked,
}

impl<C: Connect> Roster<C> {
    pub fn link(&mut self, id: &str, identity: &str) -> Result<LinkOutcome, RosterError> {
        if identity.trim().is_empty() {
            return Err(RosterError::BlankIdentity);
        }
        let id = id.trim();
        let snapshot = self.snapshot()?;

        debug!("link: checking whether '{identity}' is already linked");
        if let Some(existing) = snapshot.find_by_linked_identity(identity) {
            return Ok(LinkOutcome::AlreadyLinked {
                existing_id: existing.id,
            });
        }

        debug!("link: scanning for record '{id}'");
        let Some(target) = snapshot.find_by_id(id) else {
            return Ok(LinkOutcome::NotFound { id: id.to_string() });
        };
        if target.is_linked() {
            return Ok(LinkOutcome::IdInUse { id: id.to_string() });
        }

        self.write_link(&snapshot, target.row, "", identity)?;
        info!("Linked '{identity}' to record '{}'", target.id);
        Ok(LinkOutcome::Success { id: target.id })
    }

    pub fn unlink(&mut self, identity: &str) -> Result<UnlinkOutcome, RosterError> {
        let snapshot = self.snapshot()?;
        let Some(record) = snapshot.find_by_linked_identity(identity) else {
            return Ok(UnlinkOutcome::NotLinked);
        };
        self.write_link(&snapshot, record.row, identity, "")?;
        info!("Unlinked '{identity}' from record '{}'", record.id);
        Ok(UnlinkOutcome::Success {
            freed_id: record.id,
        })
    }

    /// Writes `value` into the link cell of grid row `row`, provided the row
    /// still carries the id seen in `snapshot` and its link cell still reads
    /// `expected`.
    fn write_link(
        &mut self,
        snapshot: &Snapshot,
        row: usize,
        expected: &str,
        value: &str,
    ) -> Result<(), RosterError> {
        let layout = snapshot.layout();
        let seen_id = snapshot.cell(row - 1, layout.id).trim().to_string();

        let current = self.reread()?;
        if grid_cell(&current, row, layout.id).trim() != seen_id
            || grid_cell(&current, row, layout.linked_identity) != expected
        {
            return Err(RosterError::StaleRow { row });
        }

        debug!(
            "Writing link cell at row {row}, column {}",
            layout.linked_identity
        );
        self.write(row, layout.linked_identity, value)
    }
}

fn grid_cell(grid: &[Vec<String>], row: usize, column: usize) -> &str {
    grid.get(row)
        .and_then(|cells| cells.get(column))
        .map(|cell| cell.as_str())
        .unwrap_or("")
}
