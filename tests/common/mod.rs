#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use dkp_roster::{record::Roster, sheet::MemoryConnector};
use tempfile::{TempDir, tempdir};

/// Header and rows shared by most roster tests. Carol has no ID and Dave's
/// score is not a number.
pub const SAMPLE_ROSTER: &str = "\
ID,IN-GAME NAME,DISCORD ID,BASE POWER,T4 KILLS,POWER WEIGHT,DKP GOAL,DKP SCORE,DKP RATE
1,Alice,alice#1,\"1,500,000\",\"12,000\",0.4,\"1,000\",900,90%
2,Bob,bob#1,\"2,100,000\",\"9,000\",0.6,\"1,000\",\"1,200\",120%
,Carol,,\"800,000\",,0.1,500,300,60%
4,Dave,,\"950,000\",,0.2,500,n/a,
5,Erin,,\"1,100,000\",\"3,000\",0.3,500,2.5K,500%
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes [`SAMPLE_ROSTER`] as `roster.csv`.
    pub fn sample_roster(&self) -> PathBuf {
        self.write("roster.csv", SAMPLE_ROSTER)
    }
}

/// Parses CSV text into the grid shape a table handle returns.
pub fn grid(contents: &str) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(contents.as_bytes())
        .records()
        .map(|record| {
            record
                .expect("fixture record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// In-memory roster over [`SAMPLE_ROSTER`], plus the connector so tests can
/// inspect or tamper with the grid.
pub fn memory_roster() -> (Roster<MemoryConnector>, MemoryConnector) {
    let connector = MemoryConnector::new(grid(SAMPLE_ROSTER));
    (Roster::new(connector.clone()), connector)
}
