use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::domain::PropertyValue;
use crate::error::PrepError;
use crate::poscar::write_poscar;
use crate::record::DatasetRecord;
use crate::structure::Structure;

pub const DEFAULT_ID_PROP_FILE: &str = "id_prop.csv";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub property: String,
    /// Upper bound on written samples; `0` writes every eligible record.
    pub max_samples: usize,
    pub output_dir: Utf8PathBuf,
    pub id_prop_file: String,
}

impl ExportOptions {
    pub fn id_prop_path(&self) -> Utf8PathBuf {
        self.output_dir.join(&self.id_prop_file)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub id_prop_path: String,
    pub samples: Vec<ExportedSample>,
    pub skipped_missing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedSample {
    pub id: String,
    pub file_name: String,
    pub value: f64,
}

/// Writes a POSCAR file and an `id_prop.csv` line for each record whose target
/// property is available, in record order, until `max_samples` lines are written.
pub fn export_samples<'a, I>(
    records: I,
    options: &ExportOptions,
) -> Result<ExportSummary, PrepError>
where
    I: IntoIterator<Item = &'a DatasetRecord>,
{
    std::fs::create_dir_all(options.output_dir.as_std_path())
        .map_err(|err| PrepError::Filesystem(err.to_string()))?;

    let id_prop_path = options.id_prop_path();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(id_prop_path.as_std_path())
        .map_err(|err| csv_error(&id_prop_path, err))?;

    let mut samples = Vec::new();
    let mut skipped_missing = 0;

    for record in records {
        let structure = Structure::from_payload(&record.jid, &record.atoms)?;
        let value = match record.property(&options.property)? {
            PropertyValue::Available(value) => value,
            PropertyValue::Missing => {
                skipped_missing += 1;
                continue;
            }
        };

        let file_name = record.poscar_file_name();
        write_poscar(&structure, options.output_dir.join(&file_name).as_std_path())?;
        let value_text = PropertyValue::Available(value).to_string();
        writer
            .write_record([file_name.as_str(), value_text.as_str()])
            .map_err(|err| csv_error(&id_prop_path, err))?;

        samples.push(ExportedSample {
            id: record.jid.clone(),
            file_name,
            value,
        });
        if samples.len() == options.max_samples {
            break;
        }
    }

    writer
        .flush()
        .map_err(|err| PrepError::CsvWrite {
            path: id_prop_path.to_string(),
            reason: err.to_string(),
        })?;

    Ok(ExportSummary {
        id_prop_path: id_prop_path.to_string(),
        samples,
        skipped_missing,
    })
}

fn csv_error(path: &Utf8Path, err: csv::Error) -> PrepError {
    PrepError::CsvWrite {
        path: path.to_string(),
        reason: err.to_string(),
    }
}
