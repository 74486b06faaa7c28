//! CLI tool for inspecting and editing keilo data directories.
//!
//! Loads the database from the data directory, runs one command, and saves
//! the database again if the command changed it. Records are printed as one
//! JSON object per line.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use keilo_core::config::DbConfig;
use keilo_core::persistence::{record_to_object, PersistenceManager};
use keilo_core::{Conditions, Database, Field, Record, SortOrder, Table};
use tracing::Level;

/// Command-line arguments for the keilo tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data directory holding the manifest and table files
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Write compact instead of indented JSON files
    #[arg(long)]
    compact: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tables with their key field and record count
    Tables,
    /// Create an empty table
    Create {
        table: String,
        /// Key field name
        #[arg(long)]
        key: String,
    },
    /// Drop a table
    Drop { table: String },
    /// Insert a record given as field=value pairs, key field included
    Insert {
        table: String,
        #[arg(value_parser = parse_pair, required = true)]
        fields: Vec<(String, String)>,
    },
    /// Print records matching every --where condition
    Select {
        table: String,
        #[arg(long = "where", value_parser = parse_pair)]
        conditions: Vec<(String, String)>,
        /// Sort output by this field (key when omitted and --desc is given)
        #[arg(long)]
        sort_by: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// Overwrite fields on records matching every --where condition
    Update {
        table: String,
        #[arg(long = "where", value_parser = parse_pair)]
        conditions: Vec<(String, String)>,
        #[arg(long = "set", value_parser = parse_pair, required = true)]
        replacements: Vec<(String, String)>,
    },
    /// Remove records matching every --where condition
    Remove {
        table: String,
        #[arg(long = "where", value_parser = parse_pair, required = true)]
        conditions: Vec<(String, String)>,
    },
    /// Print the join of two tables on their key values
    Join {
        left: String,
        right: String,
        /// Store the joined table under this name
        #[arg(long)]
        save_as: Option<String>,
    },
    /// Write one table to a JSON file
    Export { table: String, file: PathBuf },
    /// Add a table from a JSON file
    Import { file: PathBuf },
}

/// Parses a `name=value` argument.
fn parse_pair(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{}'", arg)),
    }
}

fn to_conditions(pairs: Vec<(String, String)>) -> Conditions {
    pairs.into_iter().collect()
}

fn print_records(out: &mut impl Write, records: &[Record]) -> Result<()> {
    for record in records {
        writeln!(out, "{}", serde_json::to_string(&record_to_object(record))?)?;
    }
    Ok(())
}

/// Runs one command against a loaded database.
///
/// # Returns
/// `true` if the database changed and must be saved.
fn run(
    db: &Database,
    persistence: &PersistenceManager,
    command: Command,
    out: &mut impl Write,
) -> Result<bool> {
    match command {
        Command::Tables => {
            for table in db.tables()? {
                writeln!(
                    out,
                    "{}\tkey={}\trecords={}",
                    table.name(),
                    table.key(),
                    table.count()?
                )?;
            }
            Ok(false)
        }
        Command::Create { table, key } => {
            db.create_table(&table, &key)?;
            tracing::info!("Created table '{}' keyed on '{}'", table, key);
            Ok(true)
        }
        Command::Drop { table } => {
            db.drop_table(&table)?;
            tracing::info!("Dropped table '{}'", table);
            Ok(true)
        }
        Command::Insert { table, fields } => {
            let target = db.get_table(&table)?;
            let Some(position) = fields.iter().position(|(name, _)| name == target.key()) else {
                bail!("Record for table '{}' needs its key field '{}'", table, target.key());
            };

            let mut fields = fields;
            let (key, value) = fields.remove(position);
            let mut record = Record::new(Field::new(key, value));
            for (name, value) in fields {
                record.push(Field::new(name, value));
            }
            target.insert(record)?;
            Ok(true)
        }
        Command::Select {
            table,
            conditions,
            sort_by,
            desc,
        } => {
            let mut records = db.get_table(&table)?.select(&to_conditions(conditions))?;
            let order = SortOrder::from(!desc);
            match sort_by {
                Some(field) => {
                    records.sort_by(|a, b| order.apply(a.get(&field).cmp(&b.get(&field))))
                }
                None if desc => {
                    records.sort_by(|a, b| order.apply(a.key().value().cmp(b.key().value())))
                }
                None => {}
            }
            print_records(out, &records)?;
            Ok(false)
        }
        Command::Update {
            table,
            conditions,
            replacements,
        } => {
            let updated = db
                .get_table(&table)?
                .update(&to_conditions(conditions), &to_conditions(replacements))?;
            writeln!(out, "updated {}", updated)?;
            Ok(true)
        }
        Command::Remove { table, conditions } => {
            let removed = db.get_table(&table)?.remove(&to_conditions(conditions))?;
            writeln!(out, "removed {}", removed)?;
            Ok(true)
        }
        Command::Join {
            left,
            right,
            save_as,
        } => {
            let joined = db.join_tables(&left, &right)?;
            let records = joined.get_records()?;
            print_records(out, &records)?;
            match save_as {
                Some(name) => {
                    db.add_table(Table::with_records(name, joined.key(), records)?)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        Command::Export { table, file } => {
            let target = db.get_table(&table)?;
            let checksum = persistence
                .export_table(&target, &file)
                .with_context(|| format!("Failed to export table '{}'", table))?;
            writeln!(out, "exported {} (crc32 {:08x})", file.display(), checksum)?;
            Ok(false)
        }
        Command::Import { file } => {
            let table = persistence
                .import_table(&file)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            let table = db.add_table(table)?;
            writeln!(out, "imported {} ({} records)", table.name(), table.count()?)?;
            Ok(true)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = DbConfig {
        data_dir: args.data_dir,
        pretty_json: !args.compact,
        ..Default::default()
    };
    let persistence = PersistenceManager::new(&config);
    let data_dir = persistence.data_dir().display();
    tracing::debug!("Using data directory {}", data_dir);
    let db = persistence
        .load()
        .with_context(|| format!("Failed to load database from {}", data_dir))?;

    let mut out = std::io::stdout().lock();
    if run(&db, &persistence, args.command, &mut out)? {
        persistence
            .save(&db)
            .with_context(|| format!("Failed to save database to {}", data_dir))?;
    }
    Ok(())
}
