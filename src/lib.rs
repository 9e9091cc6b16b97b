pub mod chart;
pub mod cli;
pub mod commands;
pub mod comparison;
pub mod config;
pub mod csv_sheet;
pub mod error;
pub mod header;
pub mod io_utils;
pub mod mutation;
pub mod ranking;
pub mod record;
pub mod sheet;
pub mod stats;
pub mod table;
pub mod value;

use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    chart::SvgBarChart,
    cli::{Cli, Commands, OutputFormat},
    commands::Reply,
    config::Settings,
    csv_sheet::CsvConnector,
    record::Roster,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dkp_roster", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let options = settings.roster_options();

    if let Commands::Categories = cli.command {
        return emit(&commands::categories(&options.aliases), cli.format);
    }

    let path = table_path(&cli, &settings)?;
    let encoding = io_utils::resolve_encoding(
        cli.input_encoding
            .as_deref()
            .or(settings.input_encoding.as_deref()),
    )?;
    let delimiter = match cli.delimiter {
        Some(delimiter) => Some(delimiter),
        None => settings.delimiter_byte()?,
    };
    let connector = CsvConnector::new(&path, delimiter, encoding);
    info!(
        "Using roster table {:?} with delimiter '{}'",
        connector.path(),
        printable_delimiter(io_utils::resolve_delimiter(&path, delimiter))
    );
    let mut roster = Roster::with_options(connector, options);
    let user = cli.user.as_deref().map(str::trim).filter(|u| !u.is_empty());

    let reply = match &cli.command {
        Commands::Link(args) => match user {
            Some(user) => commands::link(&mut roster, user, args.id.as_deref()),
            None => commands::missing_argument("--user <IDENTITY> link <ID>"),
        },
        Commands::Unlink => match user {
            Some(user) => commands::unlink(&mut roster, user),
            None => commands::missing_argument("--user <IDENTITY> unlink"),
        },
        Commands::Stats(args) => match (user, args.target.as_deref()) {
            (Some(user), target) => commands::stats(&mut roster, user, target),
            (None, Some(target)) => commands::stats(&mut roster, "", Some(target)),
            (None, None) => commands::missing_argument("--user <IDENTITY> stats [TARGET]"),
        },
        Commands::Leaderboard(args) => {
            let category = args
                .category
                .as_deref()
                .unwrap_or(&settings.leaderboard.default_category);
            let limit = args.limit.unwrap_or(settings.leaderboard.limit);
            debug!("Leaderboard request for '{category}' limited to {limit}");
            commands::leaderboard(&mut roster, user, category, limit)
        }
        Commands::Compare(args) => match user {
            Some(user) => {
                let renderer = SvgBarChart::default();
                let target = args.target.as_deref().unwrap_or_default();
                let reply = commands::compare(&mut roster, &renderer, user, target);
                if let Some(out) = &args.chart_out {
                    write_chart(&reply, out)?;
                }
                reply
            }
            None => commands::missing_argument("--user <IDENTITY> compare <TARGET>"),
        },
        Commands::Inspect => match user {
            Some(user) => commands::inspect(&mut roster, user),
            None => commands::missing_argument("--user <IDENTITY> inspect"),
        },
        Commands::Categories => commands::categories(&roster.options().aliases),
    };
    emit(&reply, cli.format)
}

fn table_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    cli.table
        .clone()
        .or_else(|| settings.table.clone())
        .ok_or_else(|| {
            anyhow!("No roster table given; pass --table or set `table` in the settings file")
        })
}

fn write_chart(reply: &Reply, out: &Path) -> Result<()> {
    match &reply.attachment {
        Some(attachment) => {
            fs::write(out, &attachment.bytes)
                .with_context(|| format!("Writing chart to {out:?}"))?;
            info!(
                "Chart {} ({} bytes) written to {out:?}",
                attachment.filename,
                attachment.bytes.len()
            );
        }
        None => debug!("No chart produced; {out:?} left untouched"),
    }
    Ok(())
}

fn emit(reply: &Reply, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", reply.render_text()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(reply).context("Serialising reply")?;
            println!("{json}");
        }
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
