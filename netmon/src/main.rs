//! netmon - record network connectivity samples and export them
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/netmon/netmon.db (~/.local/share/netmon/netmon.db)
//! - Logs: $XDG_STATE_HOME/netmon/netmon.log.<date> (~/.local/state/netmon/)
//! - Config: $XDG_CONFIG_HOME/netmon/config.toml (~/.config/netmon/config.toml)
//! - Preferences: $XDG_CONFIG_HOME/netmon/preferences.toml

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use netmon_core::chooser;
use netmon_core::columns;
use netmon_core::config::TimeZoneMode;
use netmon_core::logging;
use netmon_core::export::{ExportFormatKind, ExportOptions, FileExport};
use netmon_core::preferences::{self, TomlFileStore};
use netmon_core::{Config, Database, Preferences, Sample};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "netmon")]
#[command(about = "Record network connectivity samples and export them")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record one sample
    Log {
        /// Sample values as a JSON object of column: value
        #[arg(long)]
        json: Option<String>,

        /// When the sample was taken (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Sample values as COLUMN=VALUE
        assignments: Vec<String>,
    },

    /// Show or change the columns selected for display
    Columns {
        /// Comma-separated columns to select
        #[arg(long, conflicts_with = "all")]
        select: Option<String>,

        /// Select every column
        #[arg(long)]
        all: bool,
    },

    /// Read or change preferences
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsAction>,
    },

    /// List a folder to pick an export location
    Browse {
        /// Folder to list; a file lists its parent folder
        dir: Option<PathBuf>,

        /// Show folders only
        #[arg(long)]
        folders_only: bool,
    },

    /// Export every recorded sample to a file
    Export {
        /// Output format: csv, html or kml
        #[arg(short, long, default_value = "csv")]
        format: ExportFormatKind,

        /// Output file or folder (default: export.output_dir from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render timestamps in UTC instead of the configured zone
        #[arg(long)]
        utc: bool,
    },

    /// Show what has been recorded
    Status,

    /// Delete every recorded sample
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Print every preference
    List,
    /// Print one preference
    Get { key: String },
    /// Change one preference
    Set { key: String, value: String },
    /// Put one preference back to its default
    Reset { key: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard = logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("netmon starting");

    let prefs_path = Config::preferences_path();
    let store = TomlFileStore::open(&prefs_path).context("failed to open preferences")?;
    let mut prefs = Preferences::new(store);

    match args.command {
        Command::Log {
            json,
            at,
            assignments,
        } => cmd_log(json.as_deref(), at, &assignments),
        Command::Columns { select, all } => cmd_columns(&mut prefs, select.as_deref(), all),
        Command::Prefs { action } => cmd_prefs(&mut prefs, action.unwrap_or(PrefsAction::List)),
        Command::Browse { dir, folders_only } => cmd_browse(&config, dir.as_deref(), folders_only),
        Command::Export {
            format,
            output,
            utc,
        } => cmd_export(&config, &prefs, format, output, utc),
        Command::Status => cmd_status(&prefs),
        Command::Clear { yes } => cmd_clear(yes),
    }
}

fn open_database() -> Result<Database> {
    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;
    Ok(db)
}

fn cmd_log(json: Option<&str>, at: Option<DateTime<Utc>>, assignments: &[String]) -> Result<()> {
    let timestamp = at.unwrap_or_else(Utc::now);

    let mut sample = match json {
        Some(json) => {
            let value: serde_json::Value =
                serde_json::from_str(json).context("--json is not valid JSON")?;
            Sample::from_json(timestamp, &value)?
        }
        None => Sample::new(timestamp),
    };
    let assigned = Sample::from_assignments(timestamp, assignments)?;
    sample.values.extend(assigned.values);

    let db = open_database()?;
    let id = db.insert_sample(&sample).context("failed to record sample")?;
    println!("Recorded sample {} at {}", id, timestamp.to_rfc3339());
    Ok(())
}

fn cmd_columns(
    prefs: &mut Preferences<TomlFileStore>,
    select: Option<&str>,
    all: bool,
) -> Result<()> {
    if all {
        prefs.set_selected_columns(columns::column_names().as_slice())?;
    } else if let Some(select) = select {
        let chosen = columns::choose_many(select.split(','))?;
        if chosen.is_empty() {
            anyhow::bail!("select at least one column");
        }
        prefs.set_selected_columns(chosen.as_slice())?;
    }

    let selected = prefs.selected_columns();
    for column in columns::KNOWN_COLUMNS {
        let mark = if selected.iter().any(|s| s == column) {
            "x"
        } else {
            " "
        };
        println!("[{}] {}", mark, column);
    }
    Ok(())
}

fn cmd_prefs(prefs: &mut Preferences<TomlFileStore>, action: PrefsAction) -> Result<()> {
    match action {
        PrefsAction::List => {
            for key in preferences::KEYS {
                println!("{} = {}", key, prefs.display_value(key)?);
            }
        }
        PrefsAction::Get { key } => {
            println!("{}", prefs.display_value(&key)?);
        }
        PrefsAction::Set { key, value } => {
            prefs.set_from_text(&key, &value)?;
            tracing::info!(key = %key, value = %value, "Preference changed");
            println!("{} = {}", key, prefs.display_value(&key)?);
        }
        PrefsAction::Reset { key } => {
            prefs.reset(&key)?;
            tracing::info!(key = %key, "Preference reset");
            println!("{} = {}", key, prefs.display_value(&key)?);
        }
    }
    Ok(())
}

fn cmd_browse(config: &Config, dir: Option<&Path>, folders_only: bool) -> Result<()> {
    let folder = chooser::initial_folder(dir, &config.export.output_dir());
    let entries = chooser::list_entries(&folder, folders_only)
        .with_context(|| format!("failed to list {}", folder.display()))?;

    println!("{}", folder.display());
    if let Some(parent) = folder.parent() {
        println!("  ../  ({})", parent.display());
    }
    for entry in entries {
        if entry.is_dir {
            println!("  {}/", entry.name);
        } else {
            println!("  {}", entry.name);
        }
    }
    Ok(())
}

/// Where the export file goes: an explicit file, a file in an explicit
/// folder, or a file in the configured output folder.
///
/// An output ending in a separator is a folder even if it does not exist yet.
fn export_target(config: &Config, kind: ExportFormatKind, output: Option<PathBuf>) -> PathBuf {
    let file_name = format!("netmon.{}", kind.extension());
    match output {
        Some(path) if names_folder(&path) => path.join(file_name),
        Some(path) => path,
        None => config.export.output_dir().join(file_name),
    }
}

fn names_folder(path: &Path) -> bool {
    path.is_dir()
        || path
            .as_os_str()
            .to_string_lossy()
            .ends_with(std::path::is_separator)
}

fn cmd_export(
    config: &Config,
    prefs: &Preferences<TomlFileStore>,
    kind: ExportFormatKind,
    output: Option<PathBuf>,
    utc: bool,
) -> Result<()> {
    let db = open_database()?;
    let total = db.count_samples()?;
    let target = export_target(config, kind, output);

    let options = ExportOptions {
        timezone: if utc {
            TimeZoneMode::Utc
        } else {
            config.export.timezone
        },
        kml_column: prefs.kml_export_column(),
    };

    let pb = ProgressBar::new(total.max(0) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} rows")?
            .progress_chars("#>-"),
    );

    let result = FileExport::new(&target, kind, options)
        .with_progress(|rows| pb.set_position(rows as u64))
        .export(&db);
    pb.finish_and_clear();

    let summary =
        result.with_context(|| format!("could not export to {}", target.display()))?;
    println!(
        "Exported {} sample(s) to {}",
        summary.written(),
        summary.path.display()
    );
    if summary.skipped > 0 {
        println!("Skipped {} sample(s) without a location", summary.skipped);
    }
    Ok(())
}

fn cmd_status(prefs: &Preferences<TomlFileStore>) -> Result<()> {
    let db = open_database()?;
    let count = db.count_samples()?;

    println!("Database:        {}", Config::database_path().display());
    let log_dir = logging::log_dir();
    println!("Logs:            {}", log_dir.display());
    if let Some(file) = logging::latest_log_file(&log_dir) {
        println!("Latest log:      {}", file.display());
    }
    println!("Samples:         {}", count);
    match db.latest_sample_at()? {
        Some(ts) => println!("Latest sample:   {}", ts.to_rfc3339()),
        None => println!("Latest sample:   -"),
    }
    println!("Service enabled: {}", prefs.is_service_enabled()?);
    println!("Update interval: {} ms", prefs.update_interval()?);
    println!("Scheduler:       {}", prefs.scheduler().name());
    Ok(())
}

fn cmd_clear(yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("refusing to delete samples without --yes");
    }
    let db = open_database()?;
    let removed = db.clear_samples()?;
    println!("Deleted {} sample(s)", removed);
    Ok(())
}
