use tracing::{info, warn};

use crate::domain::{Catalog, DatasetInfo};
use crate::error::PrepError;
use crate::figshare::ArchiveDownloader;
use crate::fs_util::read_zip_entry;
use crate::record::{DatasetRecord, parse_records};
use crate::store::{CacheMetadata, DatasetCache};

/// Loads catalogued datasets through a local archive cache.
///
/// A load that hits a corrupt archive deletes the cached file and is attempted exactly
/// once more; whatever the second attempt returns is final.
pub struct DatasetFetcher<D: ArchiveDownloader> {
    cache: DatasetCache,
    catalog: Catalog,
    downloader: D,
}

impl<D: ArchiveDownloader> DatasetFetcher<D> {
    pub fn new(cache: DatasetCache, catalog: Catalog, downloader: D) -> Self {
        Self {
            cache,
            catalog,
            downloader,
        }
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn load(&self, dataset: &str) -> Result<Vec<DatasetRecord>, PrepError> {
        self.cache.ensure_root()?;
        let info = self.catalog.get(dataset)?;

        match self.load_cached(dataset, info) {
            Err(err) if err.is_corrupt_archive() => {
                warn!(dataset, error = %err, "cached archive is corrupt; removing and retrying");
                self.cache.remove_archive(info)?;
                self.load_cached(dataset, info)
            }
            other => other,
        }
    }

    fn load_cached(
        &self,
        dataset: &str,
        info: &DatasetInfo,
    ) -> Result<Vec<DatasetRecord>, PrepError> {
        let archive = self.cache.archive_path(info);
        if !self.cache.archive_exists(info) {
            info!(dataset, url = %info.url, "downloading dataset archive");
            let temp = self.cache.download_temp()?;
            self.downloader.download_archive(&info.url, &temp)?;
            let archive = self.cache.persist_archive(temp, info)?;
            self.cache
                .write_metadata(&CacheMetadata::new(dataset, info, &archive))?;
        }

        info!(dataset, archive = %archive, "loading dataset archive");
        let content = read_zip_entry(archive.as_std_path(), &info.json_tag)?;
        let records = parse_records(&content)?;
        info!(dataset, records = records.len(), "dataset loaded");
        Ok(records)
    }
}
