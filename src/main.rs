//! APK Guardian command line client.

#![forbid(
    overflowing_literals,
    stable_features,
    unconditional_recursion,
    while_true,
    unused_parens,
    unused_import_braces
)]
#![deny(unused_extern_crates)]
#![warn(missing_docs, unused_qualifications, unused_results)]

use apk_guardian_core::{
    analyze_batch, analyze_package, build_orchestrator, check_health, cli, error::Kind,
    exit_code, initialize_config, initialize_logger, print_error, print_warning,
};
use colored::Colorize;
use failure::Error;
use std::process;

/// Program entry point.
#[tokio::main]
async fn main() {
    let cli = cli::generate_cli().get_matches();
    let verbose = cli.is_present("verbose");
    initialize_logger(verbose, cli.is_present("quiet"));

    if let Err(e) = run(&cli).await {
        print_error(format!("{}", e), verbose);

        for cause in e.iter_causes() {
            eprintln!("\t{}{}", "Caused by: ".bold(), cause);
        }

        if verbose {
            eprintln!("{}", e.backtrace());
        }

        process::exit(exit_code(&e));
    }
}

/// Analyzes the packages given on the command line.
async fn run(cli: &clap::ArgMatches<'static>) -> Result<(), Error> {
    let config = initialize_config(cli)?;

    for file in config.loaded_config_files() {
        log::debug!("loaded config file `{}`", file.display());
    }

    let errors = config.errors();
    if !errors.is_empty() {
        for error in &errors {
            print_warning(error);
        }
        return Err(Kind::Config {
            message: "the configuration is not valid to run the analysis".to_owned(),
        }
        .into());
    }

    let orchestrator = build_orchestrator(&config)?;

    if config.is_health() {
        check_health(orchestrator.backend()).await?;
        if !config.is_quiet() {
            println!("The analysis server at {} is reachable.", config.api_url());
        }
        return Ok(());
    }

    if config.is_batch() {
        analyze_batch(&config, &orchestrator).await?;
    } else {
        for package in config.packages() {
            analyze_package(package, &config, &orchestrator).await?;
        }
    }

    if config.is_verbose() {
        println!();
        println!("Everything went smoothly, now you can check all the results.");
    }

    Ok(())
}
