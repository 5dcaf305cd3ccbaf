use std::fs;
use std::io::{self, Read};
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::PrepError;

/// Reads one entry of a zip archive into a string.
///
/// Structural zip failures and decompression failures are reported as
/// [`PrepError::CorruptArchive`]; a missing entry is not corruption.
pub fn read_zip_entry(zip_path: &Path, entry_name: &str) -> Result<String, PrepError> {
    let corrupt = |reason: String| PrepError::CorruptArchive {
        path: zip_path.display().to_string(),
        reason,
    };

    let file = fs::File::open(zip_path)
        .map_err(|err| PrepError::Filesystem(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive = ZipArchive::new(file).map_err(|err| corrupt(err.to_string()))?;

    let mut entry = match archive.by_name(entry_name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(PrepError::ArchiveEntryMissing {
                archive: zip_path.display().to_string(),
                entry: entry_name.to_string(),
            });
        }
        Err(err) => return Err(corrupt(err.to_string())),
    };

    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|err| corrupt(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| PrepError::DatasetParse(err.to_string()))
}

pub fn validate_zip(zip_path: &Path) -> Result<(), PrepError> {
    let corrupt = |reason: String| PrepError::CorruptArchive {
        path: zip_path.display().to_string(),
        reason,
    };

    let file = fs::File::open(zip_path)
        .map_err(|err| PrepError::Filesystem(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive = ZipArchive::new(file).map_err(|err| corrupt(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|err| corrupt(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        io::copy(&mut entry, &mut io::sink()).map_err(|err| corrupt(err.to_string()))?;
    }
    Ok(())
}
