//! Settings file.
//!
//! Everything is optional; a missing key keeps its default. Example:
//!
//! ```yaml
//! table: roster.csv
//! input_encoding: utf-8
//! leaderboard:
//!   default_category: score
//!   limit: 10
//!   aliases:
//!     honor: HONOR POINTS
//! fields:
//!   linked_identity:
//!     candidates: ["DISCORD ID"]
//!     fallback: 2
//! stats:
//!   hidden: ["POWER WEIGHT"]
//! ```

use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    header::AliasTable,
    io_utils,
    ranking::{DEFAULT_CATEGORY, DEFAULT_LIMIT},
    record::{FieldMap, RosterOptions},
    stats::StatsOptions,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeaderboardSettings {
    pub default_category: String,
    pub limit: usize,
    /// Extra or replacement category aliases, merged over the built-in ones.
    pub aliases: BTreeMap<String, String>,
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            default_category: DEFAULT_CATEGORY.to_string(),
            limit: DEFAULT_LIMIT,
            aliases: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub table: Option<PathBuf>,
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
    pub leaderboard: LeaderboardSettings,
    pub fields: FieldMap,
    pub stats: StatsOptions,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening settings file {path:?}"))?;
        let settings: Settings = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing settings YAML {path:?}"))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(text).context("Parsing settings YAML")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.leaderboard.limit > 0,
            "leaderboard.limit must be at least 1"
        );
        ensure!(
            !self.leaderboard.default_category.trim().is_empty(),
            "leaderboard.default_category must not be empty"
        );
        for (name, spec) in [
            ("fields.id", &self.fields.id),
            ("fields.display_name", &self.fields.display_name),
            ("fields.linked_identity", &self.fields.linked_identity),
        ] {
            ensure!(
                !spec.candidates.is_empty() || spec.fallback.is_some(),
                "{name} needs at least one candidate header or a fallback index"
            );
        }
        if let Some(delimiter) = &self.delimiter {
            io_utils::parse_delimiter(delimiter).map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        self.delimiter
            .as_deref()
            .map(|value| io_utils::parse_delimiter(value).map_err(anyhow::Error::msg))
            .transpose()
    }

    pub fn roster_options(&self) -> RosterOptions {
        RosterOptions {
            fields: self.fields.clone(),
            aliases: AliasTable::leaderboard().with_overrides(&self.leaderboard.aliases),
            stats: self.stats.clone(),
        }
    }
}
