use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::PrepError;

/// Fetches a dataset archive from its source URL into a local file.
pub trait ArchiveDownloader: Send + Sync {
    fn download_archive(&self, url: &str, destination: &Path) -> Result<(), PrepError>;
}

impl<T: ArchiveDownloader + ?Sized> ArchiveDownloader for &T {
    fn download_archive(&self, url: &str, destination: &Path) -> Result<(), PrepError> {
        (**self).download_archive(url, destination)
    }
}

#[derive(Clone)]
pub struct FigshareHttpClient {
    client: Client,
}

impl FigshareHttpClient {
    pub fn new() -> Result<Self, PrepError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("atomprep/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PrepError::FigshareHttp(err.to_string()))?,
        );
        // Archives run to hundreds of megabytes; only the connect phase is bounded.
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()
            .map_err(|err| PrepError::FigshareHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl ArchiveDownloader for FigshareHttpClient {
    fn download_archive(&self, url: &str, destination: &Path) -> Result<(), PrepError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| PrepError::FigshareHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "figshare request failed".to_string());
            return Err(PrepError::FigshareStatus { status, message });
        }

        let mut file =
            File::create(destination).map_err(|err| PrepError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| PrepError::FigshareHttp(err.to_string()))?;
        Ok(())
    }
}
