//! JSON file persistence: table files, manifest and checksums.
//!
//! Layout under the data directory:
//! - `manifest.json` lists the tables and the CRC32 of each table file
//! - `tables/<table>.json` holds one table (see [`TableFile`])


mod io_utils;
mod schema;

pub use io_utils::{classify_io_error, retry_io_operation};
pub use schema::{record_to_object, ManifestFile, RecordObject, TableFile, FORMAT_VERSION};

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::DbConfig;
use crate::database::Database;
use crate::error::DbError;
use crate::table::Table;

use io_utils::io_context;

const MANIFEST_FILE: &str = "manifest.json";
const TABLES_DIR: &str = "tables";

/// Persistence manager for table and manifest files.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    /// Data directory path
    data_dir: PathBuf,
    /// Indent JSON output
    pretty_json: bool,
    /// Maximum retry attempts for transient I/O errors
    max_retries: u32,
    /// Delay between retries in milliseconds
    retry_delay_ms: u64,
}

impl PersistenceManager {
    /// Creates a new persistence manager with the given configuration.
    pub fn new(config: &DbConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            pretty_json: config.pretty_json,
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
        }
    }

    /// Returns the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Saves every table and then the manifest.
    ///
    /// Table files of tables that were in the previous manifest but are no
    /// longer in the database are deleted after the new manifest is written.
    ///
    /// # Arguments
    /// * `db` - Database to save
    ///
    /// # Returns
    /// `Result<(), DbError>` indicating success or failure.
    pub fn save(&self, db: &Database) -> Result<(), DbError> {
        let tables_dir = self.data_dir.join(TABLES_DIR);
        fs::create_dir_all(&tables_dir)
            .map_err(|e| classify_io_error(e, &io_context("create", &tables_dir)))?;

        let previous = self.read_manifest()?;
        let tables = db.tables()?;
        tracing::debug!("Saving {} tables to {}", tables.len(), self.data_dir.display());

        let mut manifest = ManifestFile {
            version: FORMAT_VERSION,
            tables: Vec::with_capacity(tables.len()),
            checksums: BTreeMap::new(),
        };
        for table in &tables {
            let path = self.table_path(table.name())?;
            let checksum = self.export_table(table, &path)?;
            manifest.tables.push(table.name().to_string());
            manifest.checksums.insert(table.name().to_string(), checksum);
        }

        let bytes = self.encode(&manifest)?;
        self.write_atomic(&self.data_dir.join(MANIFEST_FILE), &bytes)?;

        if let Some(previous) = previous {
            for stale in previous
                .tables
                .iter()
                .filter(|name| !manifest.tables.contains(name))
            {
                let Ok(path) = self.table_path(stale) else {
                    continue;
                };
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!("Failed to remove stale table file {}: {}", path.display(), e);
                }
            }
        }

        tracing::debug!("Save completed: {} tables", manifest.tables.len());
        Ok(())
    }

    /// Loads the database described by the manifest.
    ///
    /// A missing manifest yields an empty database.
    ///
    /// # Errors
    /// - `DataCorruption` if a table file fails its checksum or names a different table
    /// - `SerializationError` if a file cannot be parsed or has an unsupported version
    pub fn load(&self) -> Result<Database, DbError> {
        let db = Database::new();
        let Some(manifest) = self.read_manifest()? else {
            tracing::debug!("No manifest in {}, starting empty", self.data_dir.display());
            return Ok(db);
        };

        if manifest.version != FORMAT_VERSION {
            return Err(DbError::SerializationError(format!(
                "Unsupported manifest version: {}",
                manifest.version
            )));
        }

        for name in &manifest.tables {
            let path = self.table_path(name)?;
            let bytes = self.read_file(&path)?;

            if let Some(&expected) = manifest.checksums.get(name) {
                let actual = crc32fast::hash(&bytes);
                if actual != expected {
                    return Err(DbError::DataCorruption(format!(
                        "Checksum mismatch for table '{}': expected {:08x}, got {:08x}",
                        name, expected, actual
                    )));
                }
            }

            let file = parse_table_file(&bytes, &path)?;
            if &file.name != name {
                return Err(DbError::DataCorruption(format!(
                    "File {} holds table '{}', expected '{}'",
                    path.display(),
                    file.name,
                    name
                )));
            }
            db.add_table(file.into_table()?)?;
        }

        tracing::debug!("Loaded {} tables", manifest.tables.len());
        Ok(db)
    }

    /// Writes one table to `path`.
    ///
    /// # Returns
    /// CRC32 of the written bytes.
    pub fn export_table(&self, table: &Table, path: &Path) -> Result<u32, DbError> {
        let bytes = self.encode(&TableFile::from_table(table)?)?;
        self.write_atomic(path, &bytes)?;
        tracing::debug!("Wrote table '{}' to {}", table.name(), path.display());
        Ok(crc32fast::hash(&bytes))
    }

    /// Reads one table from `path`.
    pub fn import_table(&self, path: &Path) -> Result<Table, DbError> {
        let bytes = self.read_file(path)?;
        parse_table_file(&bytes, path)?.into_table()
    }

    fn read_manifest(&self) -> Result<Option<ManifestFile>, DbError> {
        let path = self.data_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = self.read_file(&path)?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| DbError::SerializationError(format!("Failed to parse manifest: {}", e)))
    }

    /// Table file path; names that would escape the data directory are rejected.
    fn table_path(&self, name: &str) -> Result<PathBuf, DbError> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(DbError::SerializationError(format!(
                "Table name '{}' cannot be used as a file name",
                name
            )));
        }
        Ok(self.data_dir.join(TABLES_DIR).join(format!("{}.json", name)))
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, DbError> {
        let encoded = if self.pretty_json {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        encoded.map_err(|e| DbError::SerializationError(e.to_string()))
    }

    /// Writes to a temporary sibling, syncs, then renames over `path`.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), DbError> {
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        retry_io_operation(
            || {
                File::create(&temp_path)
                    .and_then(|mut file| {
                        file.write_all(bytes)?;
                        file.sync_all()
                    })
                    .map_err(|e| classify_io_error(e, &io_context("write", &temp_path)))?;
                fs::rename(&temp_path, path)
                    .map_err(|e| classify_io_error(e, &io_context("rename", &temp_path)))
            },
            self.max_retries,
            self.retry_delay_ms,
            "write",
        )
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, DbError> {
        retry_io_operation(
            || fs::read(path).map_err(|e| classify_io_error(e, &io_context("read", path))),
            self.max_retries,
            self.retry_delay_ms,
            "read",
        )
    }
}

fn parse_table_file(bytes: &[u8], path: &Path) -> Result<TableFile, DbError> {
    serde_json::from_slice(bytes).map_err(|e| {
        DbError::SerializationError(format!("Failed to parse {}: {}", path.display(), e))
    })
}
