//! Command line interface definition.

use clap::{crate_version, App, Arg};

/// Generates the command line interface.
pub fn generate_cli() -> App<'static, 'static> {
    App::new("APK Guardian")
        .version(crate_version!())
        .about("Checks Android packages against a remote security analysis service")
        .arg(
            Arg::with_name("packages")
                .help("The APK files to analyze")
                .value_name("PACKAGE")
                .multiple(true)
                .required_unless("health"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .conflicts_with("quiet")
                .help("If you'd like the auditor to talk more than necessary"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("If you'd like a zen auditor that only prints the verdicts"),
        )
        .arg(
            Arg::with_name("force")
                .long("force")
                .help("If you'd like to overwrite existing JSON results"),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Stores the analysis results as JSON in the results folder"),
        )
        .arg(
            Arg::with_name("report")
                .long("report")
                .help("Downloads the Word report generated by the analysis server"),
        )
        .arg(
            Arg::with_name("open")
                .long("open")
                .requires("report")
                .help("Opens the downloaded report once it has been saved"),
        )
        .arg(
            Arg::with_name("extended")
                .long("extended")
                .help("Also accepts .apks and .xapk packages"),
        )
        .arg(
            Arg::with_name("quick")
                .long("quick")
                .help("Asks the server for a quick scan"),
        )
        .arg(
            Arg::with_name("debug")
                .long("debug")
                .help("Asks the server to include debugging information"),
        )
        .arg(
            Arg::with_name("no-progress")
                .long("no-progress")
                .help("Disables the per-check progress display"),
        )
        .arg(
            Arg::with_name("demo")
                .long("demo")
                .conflicts_with("report")
                .help("Generates results locally, without contacting any server"),
        )
        .arg(
            Arg::with_name("batch")
                .long("batch")
                .help("Sends all the packages in a single batch request"),
        )
        .arg(
            Arg::with_name("health")
                .long("health")
                .help("Checks that the analysis server is reachable and exits"),
        )
        .arg(
            Arg::with_name("api-url")
                .long("api-url")
                .value_name("URL")
                .takes_value(true)
                .help("Base URL of the analysis server"),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .takes_value(true)
                .help("Configuration file to use instead of config.toml"),
        )
}
