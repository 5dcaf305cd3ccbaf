#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use camino::Utf8PathBuf;
use serde_json::{Value, json};
use zip::write::SimpleFileOptions;

use atomprep::domain::{Catalog, DatasetInfo};
use atomprep::error::PrepError;
use atomprep::figshare::ArchiveDownloader;
use atomprep::store::DatasetCache;

pub const DATASET: &str = "mini_3d";
pub const JSON_TAG: &str = "mini_3d-2024.json";

pub fn info() -> DatasetInfo {
    DatasetInfo {
        url: "https://example.org/ndownloader/files/1".to_string(),
        json_tag: JSON_TAG.to_string(),
        description: Some("test dataset".to_string()),
    }
}

pub fn catalog() -> Catalog {
    let mut catalog = Catalog::builtin();
    catalog.insert(DATASET, info());
    catalog
}

pub fn cache_in(dir: &Path) -> DatasetCache {
    DatasetCache::new(Utf8PathBuf::from_path_buf(dir.join("dataset_cache")).unwrap())
}

pub fn record(jid: &str, bandgap: Value) -> Value {
    json!({
        "jid": jid,
        "atoms": {
            "lattice_mat": [[0.0, 2.73, 2.73], [2.73, 0.0, 2.73], [2.73, 2.73, 0.0]],
            "coords": [[0.0, 0.0, 0.0], [0.25, 0.25, 0.25]],
            "elements": ["Si", "Si"],
            "abc": [3.86, 3.86, 3.86],
            "angles": [60.0, 60.0, 60.0],
            "cartesian": false,
            "props": ["", ""]
        },
        "optb88vdw_bandgap": bandgap,
        "formation_energy_peratom": 0.0
    })
}

pub fn records_json(count: usize) -> Vec<u8> {
    let records: Vec<Value> = (0..count)
        .map(|i| record(&format!("JVASP-{}", 1000 + i), json!(0.5 + i as f64)))
        .collect();
    serde_json::to_vec(&records).unwrap()
}

pub fn zip_bytes(entry: &str, content: &[u8]) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        writer.start_file(entry, SimpleFileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
        writer.finish().unwrap();
    }
    buffer.into_inner()
}

/// Serves queued payloads in order and records, per call, whether the cached archive
/// existed at the time of the download.
pub struct ScriptedDownloader {
    payloads: Mutex<Vec<Vec<u8>>>,
    archive: PathBuf,
    pub calls: Mutex<Vec<bool>>,
}

impl ScriptedDownloader {
    pub fn new(archive: PathBuf, payloads: Vec<Vec<u8>>) -> Self {
        Self {
            payloads: Mutex::new(payloads),
            archive,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ArchiveDownloader for ScriptedDownloader {
    fn download_archive(&self, _url: &str, destination: &Path) -> Result<(), PrepError> {
        self.calls.lock().unwrap().push(self.archive.exists());
        let mut payloads = self.payloads.lock().unwrap();
        if payloads.is_empty() {
            return Err(PrepError::FigshareHttp("no payload queued".to_string()));
        }
        let payload = payloads.remove(0);
        fs::write(destination, payload).map_err(|err| PrepError::Filesystem(err.to_string()))
    }
}
