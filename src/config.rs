//! Configuration module.
//!
//! Handles and configures the initial settings and variables needed to run the program. The
//! settings come from an optional TOML file and are then decorated with the command line
//! options, which always take precedence.

use crate::{
    analysis::Simulator,
    backend::ScanOptions,
    error::Kind,
    validation::ExtensionSet,
};
use clap::ArgMatches;
use failure::{Error, ResultExt};
use log::debug;
use reqwest::Url;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Default analysis server.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Config structure.
///
/// Contains the configuration of the client. Keys missing from the configuration file keep
/// their default value, unknown keys are rejected.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Packages to analyze.
    #[serde(skip)]
    packages: Vec<PathBuf>,
    /// Boolean to represent `--verbose` mode.
    #[serde(skip)]
    verbose: bool,
    /// Boolean to represent `--quiet` mode.
    #[serde(skip)]
    quiet: bool,
    /// Boolean to represent `--batch` mode.
    #[serde(skip)]
    batch: bool,
    /// Boolean to represent `--health` mode.
    #[serde(skip)]
    health: bool,
    /// Boolean to represent overall `--force` mode.
    force: bool,
    /// Stores the results as JSON.
    json: bool,
    /// Downloads the Word report.
    report: bool,
    /// Opens the downloaded report.
    open: bool,
    /// Fabricates results locally instead of contacting the server.
    demo: bool,
    /// Asks the server for a quick scan.
    quick: bool,
    /// Asks the server for debugging information.
    debug: bool,
    /// Simulates the per check progress while the server works.
    progress: bool,
    /// Accepts `.apks` and `.xapk` packages besides `.apk`.
    extended_formats: bool,
    /// Base URL of the analysis server.
    api_url: String,
    /// Timeout of scan requests, in seconds.
    scan_timeout: u64,
    /// Timeout of report requests, in seconds.
    report_timeout: u64,
    /// Folder where the JSON results are stored.
    results_folder: PathBuf,
    /// Folder where the downloaded reports are stored.
    reports_folder: PathBuf,
    /// Configuration files that have been loaded.
    #[serde(skip)]
    loaded_files: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            verbose: false,
            quiet: false,
            batch: false,
            health: false,
            force: false,
            json: false,
            report: false,
            open: false,
            demo: false,
            quick: false,
            debug: false,
            progress: true,
            extended_formats: false,
            api_url: DEFAULT_API_URL.to_owned(),
            scan_timeout: 600,
            report_timeout: 900,
            results_folder: PathBuf::from("results"),
            reports_folder: PathBuf::from("reports"),
            loaded_files: Vec::new(),
        }
    }
}

impl Config {
    /// Creates a new `Config` struct from a TOML file.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, Error> {
        let config_path = config_path.as_ref();
        let config_str = fs::read_to_string(config_path).context(format!(
            "could not read the configuration file `{}`",
            config_path.display()
        ))?;

        let mut config: Self = toml::from_str(&config_str).map_err(|e| Kind::Config {
            message: format!("`{}`: {}", config_path.display(), e),
        })?;
        config.loaded_files.push(config_path.to_path_buf());
        debug!("loaded configuration from `{}`", config_path.display());

        Ok(config)
    }

    /// Modifies the options from the CLI.
    pub fn decorate_with_cli(&mut self, cli: &ArgMatches<'_>) -> Result<(), Error> {
        if let Some(packages) = cli.values_of_os("packages") {
            self.packages = packages.map(PathBuf::from).collect();
        }

        self.verbose = cli.is_present("verbose");
        self.quiet = cli.is_present("quiet");
        self.batch = cli.is_present("batch");
        self.health = cli.is_present("health");
        self.force = self.force || cli.is_present("force");
        self.json = self.json || cli.is_present("json");
        self.report = self.report || cli.is_present("report");
        self.open = self.open || cli.is_present("open");
        self.demo = self.demo || cli.is_present("demo");
        self.quick = self.quick || cli.is_present("quick");
        self.debug = self.debug || cli.is_present("debug");
        self.extended_formats = self.extended_formats || cli.is_present("extended");
        if cli.is_present("no-progress") {
            self.progress = false;
        }

        if let Some(api_url) = cli.value_of("api-url") {
            let _ = parse_api_url(api_url)?;
            self.api_url = api_url.to_owned();
        }

        Ok(())
    }

    /// Checks if the config is ready to run an analysis.
    pub fn check(&self) -> bool {
        self.errors().is_empty()
    }

    /// Returns the list of problems preventing the analysis from running.
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.demo {
            if let Err(e) = parse_api_url(&self.api_url) {
                errors.push(e.to_string());
            }
        }
        if self.scan_timeout == 0 {
            errors.push("the scan timeout must be greater than zero".to_owned());
        }
        if self.report_timeout == 0 {
            errors.push("the report timeout must be greater than zero".to_owned());
        }
        if !self.health {
            if self.packages.is_empty() {
                errors.push("no package to analyze was given".to_owned());
            }
            for package in &self.packages {
                if !package.is_file() {
                    errors.push(format!("the package `{}` does not exist", package.display()));
                }
            }
        }
        if self.report && self.demo {
            errors.push("report generation is not available in demo mode".to_owned());
        }
        errors
    }

    /// Returns the packages to analyze.
    pub fn packages(&self) -> &[PathBuf] {
        &self.packages
    }

    /// Returns the loaded configuration files.
    pub fn loaded_config_files(&self) -> &[PathBuf] {
        &self.loaded_files
    }

    /// Returns true if the application is running in `--verbose` mode, false otherwise.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Returns true if the application is running in `--quiet` mode, false otherwise.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Returns true if the packages are sent in a single batch request.
    pub fn is_batch(&self) -> bool {
        self.batch
    }

    /// Returns true if only the server health has to be checked.
    pub fn is_health(&self) -> bool {
        self.health
    }

    /// Returns true if the application is running in `--force` mode, false otherwise.
    pub fn is_force(&self) -> bool {
        self.force
    }

    /// Returns true if the JSON results have to be stored.
    pub fn has_to_generate_json(&self) -> bool {
        self.json
    }

    /// Returns true if the Word report has to be downloaded.
    pub fn has_to_generate_report(&self) -> bool {
        self.report
    }

    /// Returns true if the downloaded report has to be opened.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns true if results are fabricated locally.
    pub fn is_demo(&self) -> bool {
        self.demo
    }

    /// Returns true if the per check progress is simulated and shown.
    pub fn is_progress(&self) -> bool {
        self.progress
    }

    /// Returns the base URL of the analysis server.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Returns the folder where the JSON results are stored.
    pub fn results_folder(&self) -> &Path {
        &self.results_folder
    }

    /// Returns the folder where the downloaded reports are stored.
    pub fn reports_folder(&self) -> &Path {
        &self.reports_folder
    }

    /// Returns the accepted package extensions.
    pub fn extensions(&self) -> ExtensionSet {
        if self.extended_formats {
            ExtensionSet::Extended
        } else {
            ExtensionSet::Standard
        }
    }

    /// Returns the options sent with every scan.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            quick: self.quick,
            debug: self.debug,
            scan_timeout: Duration::from_secs(self.scan_timeout),
            report_timeout: Duration::from_secs(self.report_timeout),
        }
    }

    /// Returns the progress simulator of the analysis runs.
    pub fn simulator(&self) -> Simulator {
        if self.progress {
            Simulator::Random
        } else {
            Simulator::Disabled
        }
    }
}

/// Parses an analysis server URL. Only HTTP and HTTPS are accepted.
fn parse_api_url(api_url: &str) -> Result<Url, Kind> {
    let url = Url::parse(api_url).map_err(|e| Kind::Config {
        message: format!("invalid API URL `{}`: {}", api_url, e),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Kind::Config {
            message: format!("unsupported scheme `{}` in API URL `{}`", scheme, api_url),
        }),
    }
}
