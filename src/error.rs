use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PrepError {
    #[error("unknown dataset: {0}")]
    #[diagnostic(help("run `atomprep datasets` to list known datasets"))]
    UnknownDataset(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("dataset download failed: {0}")]
    FigshareHttp(String),

    #[error("dataset download returned status {status}: {message}")]
    FigshareStatus { status: u16, message: String },

    #[error("corrupt dataset archive {path}: {reason}")]
    CorruptArchive { path: String, reason: String },

    #[error("archive {archive} has no entry named {entry}")]
    ArchiveEntryMissing { archive: String, entry: String },

    #[error("failed to parse dataset records: {0}")]
    DatasetParse(String),

    #[error("record {id} has no property {property}")]
    MissingProperty { id: String, property: String },

    #[error("record {id} has a non-numeric value for {property}: {value}")]
    InvalidPropertyValue {
        id: String,
        property: String,
        value: String,
    },

    #[error("invalid structure for {id}: {reason}")]
    InvalidStructure { id: String, reason: String },

    #[error("failed to parse POSCAR {path}: {reason}")]
    PoscarParse { path: String, reason: String },

    #[error("failed to write {path}: {reason}")]
    CsvWrite { path: String, reason: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl PrepError {
    pub fn is_corrupt_archive(&self) -> bool {
        matches!(self, PrepError::CorruptArchive { .. })
    }
}
