use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::compact::{CompactDescription, CompactStructure};
use crate::error::PrepError;
use crate::export::{ExportOptions, ExportSummary, export_samples};
use crate::fetcher::DatasetFetcher;
use crate::figshare::ArchiveDownloader;
use crate::fs_util::validate_zip;
use crate::store::DatasetCache;

#[derive(Debug, Clone, Serialize)]
pub struct PrepareResult {
    pub dataset: String,
    pub property: String,
    pub records: usize,
    pub written: usize,
    pub skipped_missing: usize,
    pub id_prop_path: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetsResult {
    pub cache_dir: String,
    pub datasets: Vec<DatasetEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetEntry {
    pub name: String,
    pub url: String,
    pub archive: String,
    pub description: Option<String>,
    pub cached: bool,
    pub downloaded_at: Option<String>,
    /// Set only when verification was requested and the archive is cached.
    pub intact: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DescribeResult {
    pub path: String,
    pub formula: String,
    pub natoms: usize,
    #[serde(flatten)]
    pub description: CompactDescription,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<D: ArchiveDownloader> {
    fetcher: DatasetFetcher<D>,
}

impl<D: ArchiveDownloader> App<D> {
    pub fn new(fetcher: DatasetFetcher<D>) -> Self {
        Self { fetcher }
    }

    pub fn cache(&self) -> &DatasetCache {
        self.fetcher.cache()
    }

    /// Loads `dataset` through the cache and exports its samples.
    pub fn prepare(
        &self,
        dataset: &str,
        options: &ExportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<PrepareResult, PrepError> {
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; loading {dataset}"),
            elapsed: None,
        });
        let start = Instant::now();
        let records = self.fetcher.load(dataset)?;
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {} records", records.len()),
            elapsed: Some(start.elapsed()),
        });

        sink.event(ProgressEvent {
            message: format!(
                "phase=Export; writing {} to {}",
                options.property, options.output_dir
            ),
            elapsed: None,
        });
        let start = Instant::now();
        let ExportSummary {
            id_prop_path,
            samples,
            skipped_missing,
        } = export_samples(&records, options)?;
        sink.event(ProgressEvent {
            message: format!("phase=Export; {} samples written", samples.len()),
            elapsed: Some(start.elapsed()),
        });

        Ok(PrepareResult {
            dataset: dataset.to_string(),
            property: options.property.clone(),
            records: records.len(),
            written: samples.len(),
            skipped_missing,
            id_prop_path,
            files: samples.into_iter().map(|sample| sample.file_name).collect(),
        })
    }

    pub fn datasets(
        &self,
        verify: bool,
        sink: &dyn ProgressSink,
    ) -> Result<DatasetsResult, PrepError> {
        sink.event(ProgressEvent {
            message: "phase=Resolve; scanning cache".to_string(),
            elapsed: None,
        });

        let cache = self.fetcher.cache();
        let mut datasets = Vec::new();
        for (name, info) in self.fetcher.catalog().iter() {
            let archive = cache.archive_path(info);
            let cached = cache.archive_exists(info);
            let downloaded_at = cache
                .read_metadata(name)?
                .map(|metadata| metadata.downloaded_at);
            let intact = if verify && cached {
                sink.event(ProgressEvent {
                    message: format!("phase=Verify; {archive}"),
                    elapsed: None,
                });
                match validate_zip(archive.as_std_path()) {
                    Ok(()) => Some(true),
                    Err(err) if err.is_corrupt_archive() => Some(false),
                    Err(err) => return Err(err),
                }
            } else {
                None
            };
            datasets.push(DatasetEntry {
                name: name.to_string(),
                url: info.url.clone(),
                archive: archive.to_string(),
                description: info.description.clone(),
                cached,
                downloaded_at,
                intact,
            });
        }

        Ok(DatasetsResult {
            cache_dir: cache.root().to_string(),
            datasets,
        })
    }

    pub fn describe(
        &self,
        path: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<DescribeResult, PrepError> {
        sink.event(ProgressEvent {
            message: format!("phase=Read; {}", path.display()),
            elapsed: None,
        });
        let compact = CompactStructure::from_poscar(path)?;
        let structure = compact.structure();
        let formula = crate::description::reduced_formula(&structure.composition());
        Ok(DescribeResult {
            path: path.display().to_string(),
            formula,
            natoms: structure.num_atoms(),
            description: compact.describe(),
        })
    }
}
