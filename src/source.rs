use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// Published export of the form-responses sheet.
pub const DEFAULT_EXPORT_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vR2KXpX8_6FUj3Ks77B6WNJrw2QJlQnt0WWPSk2U6V1z8a1G5rwEnKNBqrnmT_9HZCoy5uREiZrs9uA/pub?gid=1596920951&single=true&output=csv";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Where the CSV text comes from.
#[async_trait]
pub trait CsvSource: Send + Sync {
    async fn fetch(&self) -> Result<String, TransportError>;

    /// Short human-readable origin, for titles and logs.
    fn describe(&self) -> String;
}

/// One GET per fetch. No explicit timeout; the client default applies.
pub struct HttpSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpSource {
    pub fn new(url: Url) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl CsvSource for HttpSource {
    async fn fetch(&self) -> Result<String, TransportError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status });
        }
        let text = response.text().await?;
        debug!(url = %self.url, bytes = text.len(), "fetched csv");
        Ok(text)
    }

    fn describe(&self) -> String {
        self.url.host_str().unwrap_or("remote").to_string()
    }
}

/// A local `.csv` or gzip-compressed `.csv.gz` export.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn read_csv_or_gz(path: &Path) -> std::io::Result<String> {
    let mut data = String::new();
    let file = File::open(path)?;
    let is_gz = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));
    if is_gz {
        GzDecoder::new(file).read_to_string(&mut data)?;
    } else {
        let mut file = file;
        file.read_to_string(&mut data)?;
    }
    Ok(data)
}

#[async_trait]
impl CsvSource for FileSource {
    async fn fetch(&self) -> Result<String, TransportError> {
        let path = self.path.clone();
        let read = tokio::task::spawn_blocking(move || read_csv_or_gz(&path))
            .await
            .map_err(std::io::Error::other)
            .and_then(|r| r);
        read.map_err(|source| TransportError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
