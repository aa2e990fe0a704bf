use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use filetime::FileTime;
use futures::StreamExt;
use log::{debug, warn};
use reqwest::{Client, header};
use serde_json::json;
use tokio::io::AsyncWriteExt;

use crate::credentials::Credential;
use crate::error::{DownloadError, FetchError};
use crate::model::{MediaRecord, SearchResponse};

pub const SEARCH_URL: &str = "https://photoslibrary.googleapis.com/v1/mediaItems:search";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct PhotosLibraryClient {
    search_url: String,
    client: Client,
}

/// Result of one item's download attempt.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub filename: String,
    pub result: Result<u64, DownloadError>,
}

impl PhotosLibraryClient {
    pub fn new(request_timeout: Duration) -> reqwest::Result<PhotosLibraryClient> {
        PhotosLibraryClient::with_search_url(SEARCH_URL, request_timeout)
    }

    pub fn with_search_url(
        search_url: &str,
        request_timeout: Duration,
    ) -> reqwest::Result<PhotosLibraryClient> {
        Ok(PhotosLibraryClient {
            search_url: search_url.to_string(),
            client: Self::build_client(request_timeout)?,
        })
    }

    fn build_client(request_timeout: Duration) -> reqwest::Result<Client> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(request_timeout)
            .read_timeout(request_timeout)
            .build()
    }

    /// Media items created on `date`. Failures are logged and read as an
    /// empty day so the caller can move on.
    pub async fn fetch_day(&self, date: NaiveDate, credential: &Credential) -> Vec<MediaRecord> {
        match self.search_day(date, credential).await {
            Ok(response) => {
                if response.next_page_token.is_some() {
                    warn!(
                        "{date} has more media items than fit in one page, only the first {} are fetched",
                        response.media_items.len()
                    );
                }
                response
                    .media_items
                    .into_iter()
                    .map(MediaRecord::from)
                    .collect()
            }
            Err(e) => {
                warn!("{e}");
                Vec::new()
            }
        }
    }

    pub async fn search_day(
        &self,
        date: NaiveDate,
        credential: &Credential,
    ) -> Result<SearchResponse, FetchError> {
        let payload = json!({
            "filters": {
                "dateFilter": {
                    "dates": [
                        {
                            "day": date.day(),
                            "month": date.month(),
                            "year": date.year()
                        }
                    ]
                }
            }
        });

        let request_err = |error| FetchError::Request { date, error };
        let body = self
            .client
            .post(&self.search_url)
            .bearer_auth(&credential.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(request_err)?
            .error_for_status()
            .map_err(request_err)?
            .bytes()
            .await
            .map_err(request_err)?;

        serde_json::from_slice::<SearchResponse>(&body).map_err(|error| FetchError::Decode { date, error })
    }

    /// Downloads every record into `output_directory`. A failed item is
    /// reported in its outcome and does not stop the rest.
    pub async fn download_media(
        &self,
        records: &[MediaRecord],
        output_directory: &Path,
    ) -> Vec<DownloadOutcome> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            let result = self.save_media_file(record, output_directory).await;
            if let Err(e) = &result {
                warn!("{e} (item {})", record.product_url);
            }
            outcomes.push(DownloadOutcome {
                filename: record.filename.clone(),
                result,
            });
        }
        outcomes
    }

    async fn save_media_file(
        &self,
        record: &MediaRecord,
        output_directory: &Path,
    ) -> Result<u64, DownloadError> {
        let path = target_path(record, output_directory)?;

        if record.is_video() {
            if let Some(status) = record.video_status.as_deref().filter(|s| *s != "READY") {
                warn!("{} has video status {status}, download may fail", record.filename);
            }
        }

        let request_err = |error| DownloadError::Request {
            filename: record.filename.clone(),
            error,
        };
        let write_err = |error| DownloadError::Write {
            path: path.clone(),
            error,
        };

        let download_url = record.download_url();
        debug!("Fetching {} ({}) from {download_url}", record.filename, record.mime_type);
        let response = self
            .client
            .get(download_url)
            .send()
            .await
            .map_err(request_err)?
            .error_for_status()
            .map_err(request_err)?;

        // Only complete downloads ever appear under the real filename.
        let partial = output_directory.join(format!(".{}.part", record.filename));
        let written = match stream_to_file(response, &partial, &record.filename).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(e) = tokio::fs::remove_file(&partial).await {
                    debug!("Unable to remove {}: {e}", partial.display());
                }
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, &path).await.map_err(write_err)?;

        if let Some(created_at) = record.created_at() {
            let mtime = FileTime::from_unix_time(created_at.timestamp(), 0);
            if let Err(e) = filetime::set_file_mtime(&path, mtime) {
                warn!("Unable to set modification time of {}: {e}", path.display());
            }
        }

        Ok(written)
    }
}

async fn stream_to_file(
    response: reqwest::Response,
    path: &Path,
    filename: &str,
) -> Result<u64, DownloadError> {
    let write_err = |error| DownloadError::Write {
        path: path.to_path_buf(),
        error,
    };

    let mut file = tokio::fs::File::create(path).await.map_err(write_err)?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| DownloadError::Request {
            filename: filename.to_string(),
            error,
        })?;
        file.write_all(&chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(write_err)?;

    Ok(written)
}

/// Items are written under their remote filename, which must stay inside
/// the output directory.
fn target_path(record: &MediaRecord, output_directory: &Path) -> Result<PathBuf, DownloadError> {
    let filename = record.filename.as_str();
    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\'])
    {
        return Err(DownloadError::InvalidFilename {
            id: record.id.clone(),
            filename: filename.to_string(),
        });
    }
    Ok(output_directory.join(filename))
}
