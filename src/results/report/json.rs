//! JSON report generation module.

use crate::{
    config::Config,
    results::{report::Generator, AnalysisReport},
};
use failure::{Error, ResultExt};
use log::{debug, info};
use serde_json::ser;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
};

/// JSON report generator.
#[derive(Debug)]
pub struct Json;

impl Json {
    /// Creates a new JSON report generator.
    pub fn new() -> Self {
        Json
    }

    /// Path of the JSON results of the given report.
    pub fn path(config: &Config, report: &AnalysisReport) -> PathBuf {
        config
            .results_folder()
            .join(report.file().stem())
            .join("results.json")
    }
}

impl Default for Json {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for Json {
    fn generate(&mut self, config: &Config, report: &AnalysisReport) -> Result<(), Error> {
        let path = Self::path(config, report);
        if path.exists() && !config.is_force() {
            info!(
                "results for `{}` already exist at `{}`, use --force to overwrite them",
                report.file().name(),
                path.display()
            );
            return Ok(());
        }

        debug!("starting JSON report generation, first we create the file");
        if let Some(folder) = path.parent() {
            fs::create_dir_all(folder)
                .context(format!("could not create the folder `{}`", folder.display()))?;
        }
        let mut f = BufWriter::new(
            File::create(&path)
                .context(format!("could not create the file `{}`", path.display()))?,
        );

        debug!("the report file has been created, now it's time to fill it");
        ser::to_writer_pretty(&mut f, report)?;
        f.flush()?;
        info!("JSON results written to `{}`", path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Json;
    use crate::{
        cli::generate_cli,
        config::Config,
        results::{normalize, report::Generator, AnalysisReport, RawAnalysisResult},
        validation::SelectedFile,
    };
    use serde_json::Value;
    use std::{env, fs};

    fn config(folder: &str, force: bool) -> Config {
        let path = env::temp_dir().join(folder).join("config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            format!(
                "results_folder = {:?}\n",
                env::temp_dir().join(folder).join("results").display().to_string()
            ),
        )
        .unwrap();
        let mut config = Config::from_file(&path).unwrap();
        let mut args = vec!["apk-guardian", "app.apk"];
        if force {
            args.push("--force");
        }
        config
            .decorate_with_cli(&generate_cli().get_matches_from(args))
            .unwrap();
        config
    }

    fn report(prediction: &str) -> AnalysisReport {
        let file = SelectedFile::new("app.apk", 2048, "app.apk");
        let raw = RawAnalysisResult {
            prediction: Some(prediction.to_owned()),
            probability: Some(0.3),
            ..RawAnalysisResult::default()
        };
        let result = normalize(&raw, &file);
        AnalysisReport::new(file, result, None)
    }

    fn written_verdict(config: &Config, report: &AnalysisReport) -> String {
        let contents = fs::read_to_string(Json::path(config, report)).unwrap();
        let json: Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(json["file_name"], "app.apk");
        assert_eq!(json["file_size"], 2048);
        json["result"]["verdict"].as_str().unwrap().to_owned()
    }

    #[test]
    fn it_writes_json_results() {
        let config = config("apk-guardian-json-test", false);
        let _ = fs::remove_dir_all(config.results_folder());

        let first = report("legit");
        Json::new().generate(&config, &first).unwrap();
        assert_eq!(written_verdict(&config, &first), "safe");

        // Existing results are kept unless forced.
        let second = report("fake");
        Json::new().generate(&config, &second).unwrap();
        assert_eq!(written_verdict(&config, &second), "safe");

        let forced = self::config("apk-guardian-json-test", true);
        Json::new().generate(&forced, &second).unwrap();
        assert_eq!(written_verdict(&forced, &second), "dangerous");

        fs::remove_dir_all(env::temp_dir().join("apk-guardian-json-test")).unwrap();
    }
}
