use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("unable to read client secret file {path}: {msg}")]
    ClientSecret { path: PathBuf, msg: String },

    #[error("unable to access credential cache {path}: {error}")]
    Storage {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("cached credential {path} is corrupt and has been removed, run again to re-authorise")]
    CorruptCredential { path: PathBuf },

    #[error("consent was not granted: {reason}")]
    ConsentDenied { reason: String },

    #[error("invalid authorisation callback: {msg}")]
    Callback { msg: String },

    #[error("unable to exchange authorisation code: {msg}")]
    TokenExchange { msg: String },

    #[error("unable to refresh credential: {msg}")]
    Refresh { msg: String },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("search request for {date} failed: {error}")]
    Request {
        date: NaiveDate,
        error: reqwest::Error,
    },

    #[error("unable to decode search response for {date}: {error}")]
    Decode {
        date: NaiveDate,
        error: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("refusing to write media item {id} to unsafe filename {filename:?}")]
    InvalidFilename { id: String, filename: String },

    #[error("unable to fetch {filename}: {error}")]
    Request {
        filename: String,
        error: reqwest::Error,
    },

    #[error("unable to write {path}: {error}")]
    Write {
        path: PathBuf,
        error: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("start date {start} is after end date {end}")]
    InvertedWindow { start: NaiveDate, end: NaiveDate },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("unable to create destination folder {path}: {error}")]
    Destination {
        path: PathBuf,
        error: std::io::Error,
    },
}
