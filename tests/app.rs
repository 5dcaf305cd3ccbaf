mod common;

use std::fs;

use atomprep::app::{App, ProgressEvent, ProgressSink};
use atomprep::export::ExportOptions;
use atomprep::fetcher::DatasetFetcher;
use atomprep::output::JsonOutput;
use camino::Utf8PathBuf;

use common::{
    DATASET, JSON_TAG, ScriptedDownloader, cache_in, catalog, info, records_json, zip_bytes,
};

struct CollectingSink(std::sync::Mutex<Vec<String>>);

impl ProgressSink for CollectingSink {
    fn event(&self, event: ProgressEvent) {
        self.0.lock().unwrap().push(event.message);
    }
}

#[test]
fn prepare_fetches_and_exports_with_cap() {
    let temp = tempfile::tempdir().unwrap();
    let cache = cache_in(temp.path());
    let downloader = ScriptedDownloader::new(
        cache.archive_path(&info()).into_std_path_buf(),
        vec![zip_bytes(JSON_TAG, &records_json(80))],
    );
    let app = App::new(DatasetFetcher::new(cache, catalog(), downloader));
    let options = ExportOptions {
        property: "optb88vdw_bandgap".to_string(),
        max_samples: 50,
        output_dir: Utf8PathBuf::from_path_buf(temp.path().join("samples")).unwrap(),
        id_prop_file: "id_prop.csv".to_string(),
    };
    let sink = CollectingSink(Default::default());

    let result = app.prepare(DATASET, &options, &sink).unwrap();

    assert_eq!(result.records, 80);
    assert_eq!(result.written, 50);
    assert_eq!(result.files[0], "POSCAR-JVASP-1000.vasp");
    let index = fs::read_to_string(options.id_prop_path().as_std_path()).unwrap();
    assert_eq!(index.lines().count(), 50);
    assert!(index.starts_with("POSCAR-JVASP-1000.vasp,0.500000\n"));
    assert!(
        sink.0
            .lock()
            .unwrap()
            .iter()
            .any(|message| message.starts_with("phase=Export"))
    );
}

#[test]
fn datasets_reports_cache_and_integrity() {
    let temp = tempfile::tempdir().unwrap();
    let cache = cache_in(temp.path());
    cache.ensure_root().unwrap();
    fs::write(cache.archive_path(&info()).as_std_path(), b"broken").unwrap();
    let downloader = ScriptedDownloader::new(
        cache.archive_path(&info()).into_std_path_buf(),
        Vec::new(),
    );
    let app = App::new(DatasetFetcher::new(cache, catalog(), downloader));

    let listing = app.datasets(true, &JsonOutput).unwrap();
    let mini = listing
        .datasets
        .iter()
        .find(|entry| entry.name == DATASET)
        .unwrap();
    assert!(mini.cached);
    assert_eq!(mini.intact, Some(false));

    let dft = listing
        .datasets
        .iter()
        .find(|entry| entry.name == "dft_3d")
        .unwrap();
    assert!(!dft.cached);
    assert_eq!(dft.intact, None);
}

#[test]
fn describe_reads_poscar_into_compact_description() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("POSCAR");
    fs::write(
        &path,
        "NaCl\n1.0\n5.64 0.0 0.0\n0.0 5.64 0.0\n0.0 0.0 5.64\nNa Cl\n1 1\ndirect\n\
         0.0 0.0 0.0\n0.5 0.5 0.5\n",
    )
    .unwrap();
    let cache = cache_in(temp.path());
    let downloader =
        ScriptedDownloader::new(cache.archive_path(&info()).into_std_path_buf(), Vec::new());
    let app = App::new(DatasetFetcher::new(cache, catalog(), downloader));

    let result = app.describe(&path, &JsonOutput).unwrap();

    assert_eq!(result.formula, "NaCl");
    assert_eq!(result.natoms, 2);
    assert_eq!(
        result.description.text(),
        "NaCl_AB_Na:0.5,Cl:0.5_2_[5.64,5.64,5.64]_[90.0,90.0,90.0]_179.406_2_cubic"
    );
    assert_eq!(result.description.desc_1, result.description.desc_3);
}
