//! A roster table stored in a local CSV or TSV file.
//!
//! Each read parses the whole file; each cell write rewrites it. That mirrors
//! the remote spreadsheet's cost model closely enough for local use and tests.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use encoding_rs::Encoding;
use log::debug;

use crate::{
    error::TableError,
    io_utils,
    sheet::{Connect, Table},
};

#[derive(Debug, Clone)]
pub struct CsvConnector {
    path: PathBuf,
    delimiter: u8,
    encoding: &'static Encoding,
}

impl CsvConnector {
    pub fn new(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: io_utils::resolve_delimiter(path, delimiter),
            encoding,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connect for CsvConnector {
    type Table = CsvTable;

    fn connect(&self) -> Result<CsvTable, TableError> {
        let metadata = fs::metadata(&self.path).map_err(|err| io_error(&self.path, err))?;
        if !metadata.is_file() {
            return Err(TableError::Connection(format!(
                "{} is not a file",
                self.path.display()
            )));
        }
        debug!("Connected to table file {:?}", self.path);
        Ok(CsvTable {
            path: self.path.clone(),
            delimiter: self.delimiter,
            encoding: self.encoding,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CsvTable {
    path: PathBuf,
    delimiter: u8,
    encoding: &'static Encoding,
}

impl Table for CsvTable {
    fn read_all_rows(&self) -> Result<Vec<Vec<String>>, TableError> {
        let mut reader = io_utils::open_csv_reader_from_path(&self.path, self.delimiter)
            .map_err(|err| io_error(&self.path, err))?;
        let mut rows = Vec::new();
        for (idx, record) in reader.byte_records().enumerate() {
            let record = record.map_err(|err| {
                TableError::Connection(format!("Reading row {} of {:?}: {err}", idx + 1, self.path))
            })?;
            let decoded = io_utils::decode_record(&record, self.encoding).map_err(|err| {
                TableError::Connection(format!("Row {} of {:?}: {err}", idx + 1, self.path))
            })?;
            rows.push(decoded);
        }
        Ok(rows)
    }

    fn write_cell(&mut self, row: usize, column: usize, text: &str) -> Result<(), TableError> {
        let mut rows = self.read_all_rows()?;
        if row == 0 || column == 0 || row > rows.len() {
            return Err(TableError::OutOfRange { row, column });
        }
        let cells = &mut rows[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = text.to_string();

        let bytes = io_utils::encode_rows(&rows, self.delimiter, self.encoding)
            .map_err(|err| TableError::Connection(format!("Encoding {:?}: {err}", self.path)))?;
        fs::write(&self.path, bytes).map_err(|err| io_error(&self.path, err))?;
        debug!("Wrote cell ({row}, {column}) in {:?}", self.path);
        Ok(())
    }
}

fn io_error(path: &Path, err: std::io::Error) -> TableError {
    match err.kind() {
        ErrorKind::PermissionDenied => TableError::Auth(format!("{}: {err}", path.display())),
        _ => TableError::Connection(format!("{}: {err}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::UTF_8;
    use tempfile::tempdir;

    #[test]
    fn write_cell_round_trips_through_the_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("roster.csv");
        fs::write(&path, "ID,Name,Discord ID\n1,Alice,\n2,Bob\n").expect("write fixture");

        let connector = CsvConnector::new(&path, None, UTF_8);
        let mut table = connector.connect().expect("connect");
        table.write_cell(3, 3, "bob#1").expect("write");

        let rows = table.read_all_rows().expect("read");
        assert_eq!(rows[2], vec!["2", "Bob", "bob#1"]);
        assert_eq!(table.read_header().expect("header")[2], "Discord ID");
    }

    #[test]
    fn missing_file_is_a_connection_error() {
        let dir = tempdir().expect("temp dir");
        let connector = CsvConnector::new(&dir.path().join("absent.csv"), None, UTF_8);
        assert!(matches!(connector.connect(), Err(TableError::Connection(_))));
    }

    #[test]
    fn tsv_extension_switches_delimiter() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("roster.tsv");
        fs::write(&path, "ID\tName\n1\tAlice, the Bold\n").expect("write fixture");
        let table = CsvConnector::new(&path, None, UTF_8)
            .connect()
            .expect("connect");
        assert_eq!(table.read_all_rows().expect("read")[1][1], "Alice, the Bold");
    }
}
