use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use atomprep::app::{App, PrepareResult};
use atomprep::config::{ConfigLoader, PrepareOverrides, ResolvedConfig};
use atomprep::error::PrepError;
use atomprep::fetcher::DatasetFetcher;
use atomprep::figshare::{ArchiveDownloader, FigshareHttpClient};
use atomprep::output::{ConsoleProgress, JsonOutput, OutputMode};
use atomprep::store::DatasetCache;

#[derive(Parser)]
#[command(name = "atomprep")]
#[command(about = "Prepare crystal-structure datasets (POSCAR + id_prop.csv) for property models")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch a dataset and export POSCAR files with id_prop.csv (default)")]
    Prepare(PrepareArgs),
    #[command(about = "List known datasets and their cache status")]
    Datasets(DatasetsArgs),
    #[command(about = "Print the compact description of a POSCAR file")]
    Describe(DescribeArgs),
}

#[derive(Args, Clone, Default)]
struct PrepareArgs {
    #[arg(long)]
    dataset: Option<String>,

    #[arg(long)]
    property: Option<String>,

    /// Maximum number of exported samples; 0 exports all
    #[arg(long)]
    max_samples: Option<usize>,

    #[arg(long)]
    output_dir: Option<String>,

    #[arg(long)]
    cache_dir: Option<String>,
}

#[derive(Args)]
struct DatasetsArgs {
    #[arg(long)]
    cache_dir: Option<String>,

    /// Read every cached archive to check it is intact
    #[arg(long)]
    verify: bool,
}

#[derive(Args)]
struct DescribeArgs {
    path: PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<PrepError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PrepError) -> u8 {
    match error {
        PrepError::UnknownDataset(_) | PrepError::ConfigRead(_) => 2,
        PrepError::FigshareHttp(_)
        | PrepError::FigshareStatus { .. }
        | PrepError::CorruptArchive { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Prepare(PrepareArgs::default())) {
        Commands::Prepare(args) => run_prepare(args, config, output_mode),
        Commands::Datasets(args) => run_datasets(args, config, output_mode),
        Commands::Describe(args) => run_describe(args, config, output_mode),
    }
}

fn build_app<D: ArchiveDownloader>(config: &ResolvedConfig, downloader: D) -> App<D> {
    let cache = DatasetCache::new(config.cache_dir.clone());
    App::new(DatasetFetcher::new(cache, config.catalog.clone(), downloader))
}

fn run_prepare(
    args: PrepareArgs,
    config: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let config = config.apply(PrepareOverrides {
        dataset: args.dataset,
        property: args.property,
        max_samples: args.max_samples,
        output_dir: args.output_dir,
        cache_dir: args.cache_dir,
    });
    let app = build_app(&config, FigshareHttpClient::new()?);
    let options = config.export_options();

    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.prepare(&config.dataset, &options, &JsonOutput)?;
            JsonOutput::print_prepare(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let result = app.prepare(&config.dataset, &options, &ConsoleProgress)?;
            print_prepare_summary(&result);
        }
    }
    Ok(())
}

fn run_datasets(
    args: DatasetsArgs,
    config: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let config = config.apply(PrepareOverrides {
        cache_dir: args.cache_dir,
        ..PrepareOverrides::default()
    });
    let app = build_app(&config, NopDownloader);

    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.datasets(args.verify, &JsonOutput)?;
            JsonOutput::print_datasets(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let result = app.datasets(args.verify, &ConsoleProgress)?;
            let green = "\x1b[32m";
            let yellow = "\x1b[33m";
            let red = "\x1b[31m";
            let reset = "\x1b[0m";
            println!("cache: {}", result.cache_dir);
            for entry in &result.datasets {
                let (color, status) = match (entry.cached, entry.intact) {
                    (true, Some(false)) => (red, "corrupt"),
                    (true, _) => (green, "cached"),
                    (false, _) => (yellow, "not cached"),
                };
                println!("{color}{:<10} {status}{reset}  {}", entry.name, entry.archive);
                if let Some(description) = &entry.description {
                    println!("           {description}");
                }
            }
        }
    }
    Ok(())
}

fn run_describe(
    args: DescribeArgs,
    config: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let app = build_app(&config, NopDownloader);

    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.describe(&args.path, &JsonOutput)?;
            JsonOutput::print_describe(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let result = app.describe(&args.path, &ConsoleProgress)?;
            println!("{} ({} atoms)", result.formula, result.natoms);
            println!("{}", result.description.text());
        }
    }
    Ok(())
}

fn print_prepare_summary(result: &PrepareResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}atomprep summary{reset}");
    println!(
        "{green}dataset {} ({} records), property {}{reset}",
        result.dataset, result.records, result.property
    );
    println!("{green}written samples: {}{reset}", result.written);
    if result.skipped_missing > 0 {
        println!(
            "{yellow}skipped (property not available): {}{reset}",
            result.skipped_missing
        );
    }
    println!("{cyan}index: {}{reset}", result.id_prop_path);
}

struct NopDownloader;

impl ArchiveDownloader for NopDownloader {
    fn download_archive(
        &self,
        url: &str,
        _destination: &std::path::Path,
    ) -> Result<(), PrepError> {
        Err(PrepError::FigshareHttp(format!(
            "downloader not configured for {url}"
        )))
    }
}
