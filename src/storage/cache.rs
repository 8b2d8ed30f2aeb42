use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::indexing::index::{Index, Unit};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

/// Table definition for the persisted index
/// Key: schema version string, value: JSON serialized PersistedIndex
const INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("persisted_index");

/// On-disk shape of an index snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedIndex {
    pub verses: Vec<Unit>,
    pub words: Vec<String>,
    pub legal: String,
}

impl PersistedIndex {
    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<&Index> for PersistedIndex {
    fn from(index: &Index) -> Self {
        Self {
            verses: index.units().to_vec(),
            words: index.vocabulary().to_vec(),
            legal: index.front_matter().to_string(),
        }
    }
}

impl From<PersistedIndex> for Index {
    fn from(persisted: PersistedIndex) -> Self {
        Index::from_parts(persisted.verses, persisted.words, persisted.legal)
    }
}

/// Persistent snapshot of the derived index, keyed by schema version
pub struct IndexCache {
    db: Database,
}

impl IndexCache {
    /// Open or create the cache database
    pub fn open(config: &Config) -> Result<Self> {
        if let Some(parent) = config.cache_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Persistence(format!("Failed to create cache directory: {}", e)))?;
        }

        let db = if config.cache_path.exists() {
            match Database::open(&config.cache_path) {
                Ok(db) => db,
                Err(e) if e.to_string().to_lowercase().contains("lock") => {
                    return Err(Error::Persistence(
                        "Index cache is locked. Another versefind process may be running.".to_string(),
                    ));
                }
                Err(e) => {
                    // Only derived data lives here; start over with an empty file.
                    tracing::warn!("Index cache {:?} is unreadable, recreating it: {}", config.cache_path, e);
                    std::fs::remove_file(&config.cache_path).map_err(|err| {
                        Error::Persistence(format!("Failed to open index cache: {} (removal failed: {})", e, err))
                    })?;
                    create_database(config)?
                }
            }
        } else {
            create_database(config)?
        };

        let write_txn = db.begin_write().map_err(|e| {
            Error::Persistence(format!("Failed to begin write transaction: {}", e))
        })?;
        {
            let _table = write_txn.open_table(INDEX_TABLE).map_err(|e| {
                Error::Persistence(format!("Failed to open table: {}", e))
            })?;
        }
        write_txn.commit().map_err(|e| {
            Error::Persistence(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(Self { db })
    }

    /// Restore the index stored under `version`.
    ///
    /// Absent, unreadable and malformed records all come back as `None`;
    /// the caller re-ingests in every case.
    pub fn load(&self, version: &str) -> Option<Index> {
        let json = match self.read_record(version) {
            Ok(Some(json)) => json,
            Ok(None) => {
                tracing::debug!("No cached index under {:?}", version);
                return None;
            }
            Err(e) => {
                tracing::warn!("Ignoring index cache: {}", e);
                return None;
            }
        };

        match PersistedIndex::from_json(&json) {
            Ok(persisted) => Some(persisted.into()),
            Err(e) => {
                tracing::warn!("Cached index under {:?} is malformed: {}", version, e);
                None
            }
        }
    }

    fn read_record(&self, version: &str) -> Result<Option<String>> {
        let read_txn = self.db.begin_read().map_err(|e| {
            Error::Persistence(format!("Failed to begin read transaction: {}", e))
        })?;

        let table = read_txn.open_table(INDEX_TABLE).map_err(|e| {
            Error::Persistence(format!("Failed to open table: {}", e))
        })?;

        let value = table.get(version).map_err(|e| {
            Error::Persistence(format!("Failed to read cached index: {}", e))
        })?;

        Ok(value.map(|guard| guard.value().to_string()))
    }

    /// Store `index` under `version` and drop records kept under any other
    /// version. Failures are returned as `Error::Persistence` for the caller
    /// to absorb.
    pub fn save(&self, index: &Index, version: &str) -> Result<()> {
        let json = PersistedIndex::from(index).to_json()?;

        let write_txn = self.db.begin_write().map_err(|e| {
            Error::Persistence(format!("Failed to begin write transaction: {}", e))
        })?;

        {
            let mut table = write_txn.open_table(INDEX_TABLE).map_err(|e| {
                Error::Persistence(format!("Failed to open table: {}", e))
            })?;

            let stale = stored_keys(&table)?
                .into_iter()
                .filter(|key| key != version)
                .collect::<Vec<_>>();
            for key in &stale {
                table.remove(key.as_str()).map_err(|e| {
                    Error::Persistence(format!("Failed to remove stale index {:?}: {}", key, e))
                })?;
            }
            if !stale.is_empty() {
                tracing::info!("Removed {} stale cached index(es)", stale.len());
            }

            table.insert(version, json.as_str()).map_err(|e| {
                Error::Persistence(format!("Failed to store index: {}", e))
            })?;
        }

        write_txn.commit().map_err(|e| {
            Error::Persistence(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }

    /// Remove every stored record
    pub fn clear(&self) -> Result<()> {
        let write_txn = self.db.begin_write().map_err(|e| {
            Error::Persistence(format!("Failed to begin write transaction: {}", e))
        })?;

        {
            let mut table = write_txn.open_table(INDEX_TABLE).map_err(|e| {
                Error::Persistence(format!("Failed to open table: {}", e))
            })?;
            for key in stored_keys(&table)? {
                table.remove(key.as_str()).map_err(|e| {
                    Error::Persistence(format!("Failed to remove cached index: {}", e))
                })?;
            }
        }

        write_txn.commit().map_err(|e| {
            Error::Persistence(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }

    /// Versions that currently have a stored record
    pub fn versions(&self) -> Result<Vec<String>> {
        let read_txn = self.db.begin_read().map_err(|e| {
            Error::Persistence(format!("Failed to begin read transaction: {}", e))
        })?;
        let table = read_txn.open_table(INDEX_TABLE).map_err(|e| {
            Error::Persistence(format!("Failed to open table: {}", e))
        })?;
        stored_keys(&table)
    }

    /// Overwrite the raw record under `version`. Only for exercising the
    /// malformed-record path in tests.
    #[cfg(test)]
    fn put_raw(&self, version: &str, raw: &str) -> Result<()> {
        let write_txn = self.db.begin_write().map_err(|e| Error::Persistence(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(INDEX_TABLE)
                .map_err(|e| Error::Persistence(e.to_string()))?;
            table
                .insert(version, raw)
                .map_err(|e| Error::Persistence(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(())
    }

    /// Replace the index table with one of a different value type, so every
    /// later read or write of it fails inside redb.
    #[cfg(test)]
    pub(crate) fn retype_table(&self) -> Result<()> {
        let conflicting: TableDefinition<&str, u64> = TableDefinition::new("persisted_index");
        let write_txn = self.db.begin_write().map_err(|e| Error::Persistence(e.to_string()))?;
        write_txn
            .delete_table(INDEX_TABLE)
            .map_err(|e| Error::Persistence(e.to_string()))?;
        {
            write_txn
                .open_table(conflicting)
                .map_err(|e| Error::Persistence(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(())
    }
}

fn create_database(config: &Config) -> Result<Database> {
    Database::create(&config.cache_path)
        .map_err(|e| Error::Persistence(format!("Failed to create index cache: {}", e)))
}

fn stored_keys(table: &impl ReadableTable<&'static str, &'static str>) -> Result<Vec<String>> {
    let iter = table.iter().map_err(|e| {
        Error::Persistence(format!("Failed to iterate cached indexes: {}", e))
    })?;

    let mut keys = Vec::new();
    for entry in iter {
        let (key, _) = entry.map_err(|e| {
            Error::Persistence(format!("Failed to read cached index key: {}", e))
        })?;
        keys.push(key.value().to_string());
    }
    Ok(keys)
}
