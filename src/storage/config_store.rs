// Per-guild configuration records stored as JSON files
//
// Layout: <root>/<guild_id>/<kind>.json, one flat document per record kind.
// Updates are read-modify-write with no locking. Two writers racing on the
// same record end up with whichever saved last.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::models::guild::{ConfigKind, ConfigRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, guild_id: u64, kind: ConfigKind) -> PathBuf {
        self.root
            .join(guild_id.to_string())
            .join(format!("{}.json", kind))
    }

    async fn read<T: ConfigRecord>(&self, guild_id: u64) -> StoreResult<Option<T>> {
        let path = self.path_for(guild_id, T::KIND);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }

    /// Load a record, falling back to its defaults when none is stored
    pub async fn load<T: ConfigRecord>(&self, guild_id: u64) -> StoreResult<T> {
        Ok(self.read(guild_id).await?.unwrap_or_default())
    }

    /// Overwrite a record
    pub async fn save<T: ConfigRecord>(&self, guild_id: u64, record: &T) -> StoreResult<()> {
        let path = self.path_for(guild_id, T::KIND);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await.map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(record).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;

        fs::write(&path, json)
            .await
            .map_err(|source| StoreError::Io { path: path.clone(), source })?;

        debug!("Saved {} config for guild {}", T::KIND, guild_id);
        Ok(())
    }

    /// Load a record, writing the defaults first if none is stored yet
    pub async fn load_or_initialize<T: ConfigRecord>(&self, guild_id: u64) -> StoreResult<T> {
        if let Some(existing) = self.read(guild_id).await? {
            return Ok(existing);
        }

        let record = T::default();
        self.save(guild_id, &record).await?;
        info!("Initialized {} config for guild {}", T::KIND, guild_id);
        Ok(record)
    }

    /// Read-modify-write a record. Not atomic with respect to other writers.
    pub async fn update<T, F, R>(&self, guild_id: u64, f: F) -> StoreResult<R>
    where
        T: ConfigRecord,
        F: FnOnce(&mut T) -> R,
    {
        let mut record: T = self.load(guild_id).await?;
        let out = f(&mut record);
        self.save(guild_id, &record).await?;
        Ok(out)
    }

    /// Make sure all three records exist for a guild
    pub async fn initialize_guild(&self, guild_id: u64) -> StoreResult<()> {
        use crate::models::guild::{ErrorConfig, FormatConfig, LogsConfig};

        self.load_or_initialize::<FormatConfig>(guild_id).await?;
        self.load_or_initialize::<ErrorConfig>(guild_id).await?;
        self.load_or_initialize::<LogsConfig>(guild_id).await?;
        Ok(())
    }
}
