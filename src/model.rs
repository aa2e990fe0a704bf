pub use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(rename = "mediaItems", default)]
    pub media_items: Vec<MediaItem>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MediaItem {
    pub id: String,
    #[serde(rename = "productUrl")]
    pub product_url: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub filename: String,
    #[serde(rename = "mediaMetadata")]
    pub media_metadata: MediaMetadata,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MediaMetadata {
    #[serde(rename = "creationTime")]
    pub creation_time: String,
    #[serde(deserialize_with = "deserialize_dimension")]
    pub width: u64,
    #[serde(deserialize_with = "deserialize_dimension")]
    pub height: u64,
    pub photo: Option<serde_json::Value>,
    pub video: Option<VideoMetadata>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VideoMetadata {
    pub status: Option<String>,
}

/// The API encodes int64 fields as JSON strings.
fn deserialize_dimension<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Dimension {
        Number(u64),
        Text(String),
    }

    match Dimension::deserialize(deserializer)? {
        Dimension::Number(n) => Ok(n),
        Dimension::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Photo,
    Video,
}

/// One media item of a day's search, flattened for filtering and download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRecord {
    pub id: String,
    pub product_url: String,
    pub base_url: String,
    pub mime_type: String,
    pub filename: String,
    pub creation_time: String,
    pub width: u64,
    pub height: u64,
    pub file_type: FileType,
    pub video_status: Option<String>,
}

impl From<MediaItem> for MediaRecord {
    fn from(item: MediaItem) -> MediaRecord {
        let metadata = item.media_metadata;
        let file_type = if metadata.photo.is_some() {
            FileType::Photo
        } else {
            FileType::Video
        };

        MediaRecord {
            id: item.id,
            product_url: item.product_url,
            base_url: item.base_url,
            mime_type: item.mime_type,
            filename: item.filename,
            creation_time: metadata.creation_time,
            width: metadata.width,
            height: metadata.height,
            file_type,
            video_status: metadata.video.and_then(|video| video.status),
        }
    }
}

impl MediaRecord {
    pub fn is_video(&self) -> bool {
        self.file_type == FileType::Video
    }

    /// `baseUrl` is not downloadable on its own: photos ask for the original
    /// dimensions, videos for the downloadable variant.
    pub fn download_url(&self) -> String {
        match self.file_type {
            FileType::Photo => format!(
                "{base_url}=w{width}-h{height}",
                base_url = self.base_url,
                width = self.width,
                height = self.height
            ),
            FileType::Video => format!("{base_url}=dv", base_url = self.base_url),
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.creation_time)
            .ok()
            .map(|time| time.with_timezone(&Utc))
    }
}

pub fn filter_media(
    records: Vec<MediaRecord>,
    download_video: bool,
    download_images: bool,
) -> Vec<MediaRecord> {
    records
        .into_iter()
        .filter(|record| download_video || !record.is_video())
        .filter(|record| download_images || record.is_video())
        .collect()
}
