//! HTTP client for the remote analysis server.

use super::{ReportDocument, ScanBackend, ScanOptions, DEFAULT_HEALTH_TIMEOUT};
use crate::{error::Kind, results::RawAnalysisResult, validation::SelectedFile};
use log::{debug, info};
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tokio::fs;

/// MIME type of Android packages.
const APK_MIME: &str = "application/vnd.android.package-archive";

/// Client of the analysis server HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    health_timeout: Duration,
}

/// Response of the batch scan endpoint.
#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    results: Vec<RawAnalysisResult>,
}

impl HttpBackend {
    /// Creates a client for the server at the given base URL.
    pub fn new<S: AsRef<str>>(base_url: S) -> Result<Self, Kind> {
        let client = Client::builder().build().map_err(|e| Kind::Config {
            message: format!("could not create the HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            base_url: base_url.as_ref().trim_end_matches('/').to_owned(),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        })
    }

    /// Sets the time the health check waits for the server to answer.
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Gets the base URL of the server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_with_flags(&self, path: &str, options: &ScanOptions) -> RequestBuilder {
        let mut request = self
            .client
            .post(self.endpoint(path))
            .timeout(options.scan_timeout);
        if options.quick {
            request = request.query(&[("quick", "true")]);
        }
        if options.debug {
            request = request.query(&[("debug", "true")]);
        }
        request
    }

    /// Sends the request and decodes the JSON body of a successful response.
    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, Kind> {
        let response = request.send().await?;
        let response = check_status(response)?;
        Ok(response.json::<T>().await?)
    }
}

/// Classifies unsuccessful responses.
fn check_status(response: Response) -> Result<Response, Kind> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        debug!("server answered with status {}", status);
        Err(Kind::from_status(status.as_u16()))
    }
}

/// Reads a package from disk as a multipart part.
async fn file_part(file: &SelectedFile) -> Result<Part, Kind> {
    let bytes = fs::read(file.path()).await?;
    Ok(Part::bytes(bytes)
        .file_name(file.name().to_owned())
        .mime_str(APK_MIME)?)
}

async fn files_form(files: &[SelectedFile]) -> Result<Form, Kind> {
    let mut form = Form::new();
    for file in files {
        form = form.part("files", file_part(file).await?);
    }
    Ok(form)
}

impl ScanBackend for HttpBackend {
    async fn health(&self) -> Result<(), Kind> {
        let response = self
            .client
            .get(self.endpoint("/"))
            .timeout(self.health_timeout)
            .send()
            .await?;
        let _ = check_status(response)?;
        Ok(())
    }

    async fn scan(
        &self,
        file: &SelectedFile,
        options: &ScanOptions,
    ) -> Result<RawAnalysisResult, Kind> {
        let form = Form::new().part("file", file_part(file).await?);
        info!(
            "uploading `{}` ({} bytes) to {}",
            file.name(),
            file.size(),
            self.base_url
        );
        Self::send_json(self.post_with_flags("/scan", options).multipart(form)).await
    }

    async fn scan_batch(
        &self,
        files: &[SelectedFile],
        options: &ScanOptions,
    ) -> Result<Vec<RawAnalysisResult>, Kind> {
        let form = files_form(files).await?;
        info!("uploading {} packages to {}", files.len(), self.base_url);
        let response: BatchResponse =
            Self::send_json(self.post_with_flags("/scan-batch", options).multipart(form)).await?;
        Ok(response.results)
    }

    async fn report_batch(
        &self,
        files: &[SelectedFile],
        options: &ScanOptions,
    ) -> Result<ReportDocument, Kind> {
        let form = files_form(files).await?;
        let request = self
            .client
            .post(self.endpoint("/report-batch"))
            .timeout(options.report_timeout)
            .multipart(form);
        Self::send_json(request).await
    }
}
