use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tempfile::{Builder, TempPath};

use crate::domain::DatasetInfo;
use crate::error::PrepError;

pub const DEFAULT_CACHE_DIR: &str = "dataset_cache";

/// Local layout of downloaded dataset archives:
///
/// ```text
/// <root>/<json_tag>.zip
/// <root>/metadata/<dataset>.json
/// ```
#[derive(Debug, Clone)]
pub struct DatasetCache {
    root: Utf8PathBuf,
}

impl DatasetCache {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn archive_path(&self, info: &DatasetInfo) -> Utf8PathBuf {
        self.root.join(info.archive_file_name())
    }

    pub fn metadata_path(&self, dataset: &str) -> Utf8PathBuf {
        self.root.join("metadata").join(format!("{dataset}.json"))
    }

    pub fn ensure_root(&self) -> Result<(), PrepError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| PrepError::Filesystem(err.to_string()))
    }

    pub fn archive_exists(&self, info: &DatasetInfo) -> bool {
        self.archive_path(info).as_std_path().exists()
    }

    /// Removes the cached archive. Returns whether a file was removed.
    pub fn remove_archive(&self, info: &DatasetInfo) -> Result<bool, PrepError> {
        let path = self.archive_path(info);
        if !path.as_std_path().exists() {
            return Ok(false);
        }
        fs::remove_file(path.as_std_path())
            .map_err(|err| PrepError::Filesystem(format!("remove {path}: {err}")))?;
        Ok(true)
    }

    /// Temp file inside the cache root, so persisting it is a same-filesystem rename.
    pub fn download_temp(&self) -> Result<TempPath, PrepError> {
        Builder::new()
            .prefix("atomprep-download")
            .tempfile_in(self.root.as_std_path())
            .map(|file| file.into_temp_path())
            .map_err(|err| PrepError::Filesystem(err.to_string()))
    }

    pub fn persist_archive(
        &self,
        temp: TempPath,
        info: &DatasetInfo,
    ) -> Result<Utf8PathBuf, PrepError> {
        let dest = self.archive_path(info);
        temp.persist(dest.as_std_path())
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        Ok(dest)
    }

    pub fn write_metadata(&self, metadata: &CacheMetadata) -> Result<(), PrepError> {
        let path = self.metadata_path(&metadata.dataset);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(metadata)
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn read_metadata(&self, dataset: &str) -> Result<Option<CacheMetadata>, PrepError> {
        let path = self.metadata_path(dataset);
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        let metadata = serde_json::from_str(&content)
            .map_err(|err| PrepError::Filesystem(format!("metadata {path}: {err}")))?;
        Ok(Some(metadata))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub dataset: String,
    pub source_url: String,
    pub archive: String,
    pub downloaded_at: String,
    pub tool: String,
}

impl CacheMetadata {
    pub fn new(dataset: &str, info: &DatasetInfo, archive: &Utf8Path) -> Self {
        Self {
            dataset: dataset.to_string(),
            source_url: info.url.clone(),
            archive: archive.to_string(),
            downloaded_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("atomprep/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
