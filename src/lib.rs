//! APK Guardian
//!
//! Client of a remote Android package scanning service. Packages are validated locally, uploaded
//! for analysis and the raw verdict of the server is turned into a display result with warnings,
//! recommendations and a security breakdown. Results can be printed, stored as JSON and the
//! server generated Word report can be downloaded.

#![forbid(
    overflowing_literals,
    stable_features,
    unconditional_recursion,
    unused_allocation,
    while_true,
    unused_parens,
    unused_comparisons,
    unused_import_braces,
    non_shorthand_field_patterns
)]
#![deny(unused_attributes, unused_extern_crates)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    unused_qualifications,
    unused_results,
    variant_size_differences
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod analysis;
pub mod backend;
pub mod cli;
mod config;
pub mod criticality;
pub mod error;
pub mod export;
pub mod results;
pub mod upload;
mod utils;
pub mod validation;

use crate::{
    analysis::{AnalysisStore, Orchestrator},
    backend::{Backend, DemoBackend, HttpBackend, ScanBackend},
    error::Kind,
    results::{
        report::{Generator, Json, Terminal},
        AnalysisReport, DisplayResult, FingerPrint,
    },
    upload::UploadState,
    validation::SelectedFile,
};
use chrono::Local;
use clap::ArgMatches;
use colored::Colorize;
use failure::{Error, ResultExt};
use log::{debug, warn, Level, LevelFilter};
use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::time;

pub use crate::{
    config::Config,
    utils::{print_error, print_warning},
};

/// Refresh interval of the progress display.
const PROGRESS_REFRESH: Duration = Duration::from_millis(250);

/// Initialize the config with the config files and command line options.
///
/// The file given with `--config` is used if present. Otherwise, on UNIX, if the local file
/// (`config.toml`) does not exist but the global one does (`/etc/apk-guardian/config.toml`),
/// the latter is used. Otherwise the local file is used. Finally, if none of the files could be
/// loaded, the default config is used.
pub fn initialize_config(cli: &ArgMatches<'_>) -> Result<Config, Error> {
    let config_path = PathBuf::from("config.toml");
    let global_config_path = PathBuf::from("/etc/apk-guardian/config.toml");

    let mut config = if let Some(path) = cli.value_of_os("config") {
        Config::from_file(path)?
    } else if cfg!(target_family = "unix") && !config_path.exists() && global_config_path.exists()
    {
        Config::from_file(&global_config_path)
            .context("there was an error when reading the /etc/apk-guardian/config.toml file")?
    } else if config_path.exists() {
        Config::from_file(&config_path)
            .context("there was an error when reading the config.toml file")?
    } else {
        debug!("config file not found, using the default configuration");
        Config::default()
    };

    config
        .decorate_with_cli(cli)
        .context("there was an error reading the configuration from the CLI")?;

    Ok(config)
}

/// Initializes the logger, honoring `RUST_LOG` when set.
pub fn initialize_logger(is_verbose: bool, is_quiet: bool) {
    let log_level = if is_verbose {
        LevelFilter::Debug
    } else if is_quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    let _ = builder.format(|buf, record| match record.level() {
        Level::Warn => writeln!(
            buf,
            "{}{}",
            "Warning: ".bold().yellow(),
            record.args().to_string().yellow()
        ),
        Level::Error => writeln!(
            buf,
            "{}{}",
            "Error: ".bold().red(),
            record.args().to_string().red()
        ),
        Level::Debug => writeln!(
            buf,
            "{}{}",
            "Debug: ".bold(),
            record.args().to_string().bold()
        ),
        Level::Info => writeln!(buf, "{}", record.args()),
        Level::Trace => writeln!(buf, "{}: {}", record.level(), record.args()),
    });

    if let Ok(env_log) = env::var("RUST_LOG") {
        let _ = builder.parse_filters(&env_log);
    } else {
        let _ = builder
            .filter(Some("apk_guardian_core"), log_level)
            .filter(Some("apk_guardian"), log_level);
    }

    if let Err(e) = builder.try_init() {
        eprintln!("Could not initialize logger: {}", e);
    }
}

/// Builds the backend selected by the configuration.
pub fn build_backend(config: &Config) -> Result<Backend, Kind> {
    if config.is_demo() {
        debug!("running in demo mode, no request will leave this machine");
        Ok(Backend::Demo(DemoBackend::new()))
    } else {
        Ok(Backend::Http(HttpBackend::new(config.api_url())?))
    }
}

/// Builds the orchestrator of the analysis runs.
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator<Backend>, Kind> {
    Ok(Orchestrator::new(
        build_backend(config)?,
        config.simulator(),
        config.scan_options(),
    ))
}

/// Checks that the backend is reachable.
pub async fn check_health<B: ScanBackend>(backend: &B) -> Result<(), Kind> {
    backend.health().await?;
    debug!("the analysis server is reachable");
    Ok(())
}

/// Validates the file and selects it for upload.
fn select(upload: &mut UploadState, file: &SelectedFile, config: &Config) -> Result<(), Kind> {
    if upload.select(file.clone(), config.extensions()) {
        Ok(())
    } else {
        let message = upload.error().unwrap_or_default().to_owned();
        warn!("`{}` is not a valid package: {}", file.name(), message);
        Err(Kind::Validation { message })
    }
}

/// Validates and analyzes one file.
///
/// Validation happens before anything is sent, so invalid files never reach the backend.
pub async fn analyze_file<B: ScanBackend>(
    file: &SelectedFile,
    config: &Config,
    orchestrator: &Orchestrator<B>,
) -> Result<DisplayResult, Kind> {
    let mut upload = UploadState::new();
    select(&mut upload, file, config)?;

    let analysis = orchestrator.start_analysis(upload.selected_file());
    if config.is_progress() && !config.is_quiet() {
        let (result, ()) = tokio::join!(analysis, show_progress(orchestrator.store()));
        result
    } else {
        analysis.await
    }
}

/// Validates and analyzes several files with a single batch request.
pub async fn analyze_files<B: ScanBackend>(
    files: &[SelectedFile],
    config: &Config,
    orchestrator: &Orchestrator<B>,
) -> Result<Vec<DisplayResult>, Kind> {
    let mut upload = UploadState::new();
    for file in files {
        select(&mut upload, file, config)?;
    }

    let analysis = orchestrator.start_batch_analysis(files);
    if config.is_progress() && !config.is_quiet() {
        let (result, ()) = tokio::join!(analysis, show_progress(orchestrator.store()));
        result
    } else {
        analysis.await
    }
}

/// Prints a line each time the simulated progress moves to another check.
async fn show_progress(store: &AnalysisStore) {
    let mut last = None;
    loop {
        time::sleep(PROGRESS_REFRESH).await;
        let state = store.snapshot();
        if !state.is_analyzing() {
            break;
        }
        if state.current_check() == last {
            continue;
        }
        last = state.current_check();
        if let Some(check) = state.checks().iter().find(|c| Some(c.id()) == last) {
            println!(
                "  {} {:>3}%  {} ({})",
                utils::progress_bar(state.overall_progress(), 20),
                state.overall_progress(),
                check.name(),
                check.duration_hint()
            );
        }
    }
}

/// Analyzes the given package with the given config.
pub async fn analyze_package<P: AsRef<Path>, B: ScanBackend>(
    package: P,
    config: &Config,
    orchestrator: &Orchestrator<B>,
) -> Result<(), Error> {
    let file = SelectedFile::from_path(&package)?;
    if !config.is_quiet() {
        println!();
        println!("Starting analysis of {}.", file.name().italic());
    }

    let result = analyze_file(&file, config, orchestrator).await?;
    publish(config, file.clone(), result)?;

    if config.has_to_generate_report() {
        download_report(config, orchestrator, &[file]).await?;
    }

    Ok(())
}

/// Analyzes every configured package with a single batch request.
pub async fn analyze_batch<B: ScanBackend>(
    config: &Config,
    orchestrator: &Orchestrator<B>,
) -> Result<(), Error> {
    let files = config
        .packages()
        .iter()
        .map(SelectedFile::from_path)
        .collect::<Result<Vec<_>, _>>()?;
    if !config.is_quiet() {
        println!();
        println!("Starting batch analysis of {} packages.", files.len());
    }

    let results = analyze_files(&files, config, orchestrator).await?;
    for (file, result) in files.iter().zip(results) {
        publish(config, file.clone(), result)?;
    }

    if config.has_to_generate_report() {
        download_report(config, orchestrator, &files).await?;
    }

    Ok(())
}

/// Prints the result and stores it as JSON when configured.
fn publish(config: &Config, file: SelectedFile, result: DisplayResult) -> Result<(), Error> {
    let fingerprint = match FingerPrint::new(file.path()) {
        Ok(fingerprint) => Some(fingerprint),
        Err(e) => {
            warn!("could not compute the fingerprint of `{}`: {}", file.name(), e);
            None
        }
    };
    let report = AnalysisReport::new(file, result, fingerprint);

    Terminal::new(io::stdout().lock())
        .generate(config, &report)
        .context("there was an error printing the results")?;

    if config.has_to_generate_json() {
        Json::new().generate(config, &report).context(format!(
            "there was an error generating the JSON results, tried to generate at: {}",
            Json::path(config, &report).display()
        ))?;
    }

    Ok(())
}

/// Downloads the Word report of `files` and opens it when configured.
async fn download_report<B: ScanBackend>(
    config: &Config,
    orchestrator: &Orchestrator<B>,
    files: &[SelectedFile],
) -> Result<(), Error> {
    let path = export::export_report(
        orchestrator.backend(),
        files,
        config.reports_folder(),
        Local::now().date_naive(),
        orchestrator.options(),
    )
    .await?;

    if !config.is_quiet() {
        println!("Report saved to {}.", path.display().to_string().bold());
    }

    if config.is_open() {
        let status = open::that(&path).context("report could not be opened automatically")?;

        if !status.success() {
            return Err(Kind::Io {
                message: format!("report opening errored with status code: {}", status),
            }
            .into());
        }
    }

    Ok(())
}

/// Exit code of the program for the given error.
///
/// The first classified error in the causal chain decides. Unclassified errors exit with 1.
pub fn exit_code(error: &Error) -> i32 {
    error
        .iter_chain()
        .filter_map(|e| e.downcast_ref::<Kind>())
        .next()
        .map_or(1, i32::from)
}
