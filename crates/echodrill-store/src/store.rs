//! JSON record store for cut plans

use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use directories::ProjectDirs;
use echodrill_core::CutPlan;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::StoreError;

/// One JSON file per audio item under a data directory
///
/// Writes go to a temporary file that is renamed into place, so a reader
/// sees either the previous record or the new one. Concurrent saves of the
/// same item resolve as last write wins.
pub struct PlanStore {
    dir: PathBuf,
}

impl PlanStore {
    /// Store under the platform data directory
    pub fn new() -> Result<Self, StoreError> {
        let dirs = ProjectDirs::from("com", "echodrill", "Echodrill").ok_or_else(|| {
            StoreError::DataDirectoryError("Could not determine data directory".to_string())
        })?;

        Ok(Self {
            dir: dirs.data_dir().join("plans"),
        })
    }

    /// Store under a custom directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn directory(&self) -> &PathBuf {
        &self.dir
    }

    /// File backing an item's plan
    ///
    /// Item ids are usually audio paths, so they are hashed into a flat name.
    pub fn path_for(&self, item_id: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(item_id.as_bytes());
        let digest = hex::encode(hasher.finalize());
        self.dir.join(format!("{}.json", &digest[..32]))
    }

    /// Load an item's plan
    ///
    /// A missing or undecodable record yields `None`; decoded plans are
    /// re-clamped before they are returned.
    pub async fn load(&self, item_id: &str) -> Result<Option<CutPlan>, StoreError> {
        match self.read_record(item_id).await {
            Ok(Some(mut plan)) => {
                plan.sanitize();
                Ok(Some(plan))
            }
            Ok(None) => Ok(None),
            Err(StoreError::Corrupt { path, reason }) => {
                warn!("Ignoring corrupt plan record {}: {}", path, reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Load an item's plan or start a fresh one
    pub async fn load_or_default(&self, item_id: &str) -> Result<CutPlan, StoreError> {
        Ok(self.load(item_id).await?.unwrap_or_default())
    }

    /// Persist an item's plan
    pub async fn save(&self, item_id: &str, plan: &CutPlan) -> Result<PathBuf, StoreError> {
        let path = self.path_for(item_id);
        fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_vec_pretty(plan)?;
        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            // One temp file per save.
            let mut temp = NamedTempFile::new_in(&dir)?;
            temp.write_all(&json)?;
            temp.as_file().sync_all()?;
            temp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::IoError(std::io::Error::other(e)))??;

        debug!("Saved plan for {} to {}", item_id, path.display());
        Ok(path)
    }

    /// Remove an item's plan if present
    pub async fn delete(&self, item_id: &str) -> Result<bool, StoreError> {
        let path = self.path_for(item_id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted plan for {}", item_id);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_record(&self, item_id: &str) -> Result<Option<CutPlan>, StoreError> {
        let path = self.path_for(item_id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }
}
