use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use indicatif::ProgressBar;
use log::{debug, info};

use crate::credentials::{Authenticator, CredentialProvider, CredentialStore};
use crate::error::PipelineError;
use crate::model::filter_media;
use crate::photos_client::PhotosLibraryClient;
use crate::planner::{DateWindow, ExclusionRange, plan};

pub struct PipelineSettings {
    pub window: DateWindow,
    pub exclusions: Vec<ExclusionRange>,
    pub download_video: bool,
    pub download_images: bool,
    pub destination_folder: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOutcome {
    NoMedia,
    Downloaded { downloaded: usize, failed: usize },
}

/// What happened on one planned day; displays as the progress line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    pub date: NaiveDate,
    pub outcome: DayOutcome,
}

impl fmt::Display for DayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.date.format("%-d/%-m/%Y");
        match self.outcome {
            DayOutcome::NoMedia => write!(f, "{label}: No media items found for date"),
            DayOutcome::Downloaded {
                downloaded,
                failed: 0,
            } => write!(f, "{label}: Downloaded {downloaded} items"),
            DayOutcome::Downloaded { downloaded, failed } => {
                write!(f, "{label}: Downloaded {downloaded} items ({failed} failed)")
            }
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub days_planned: usize,
    pub days_with_media: usize,
    pub items_downloaded: usize,
    pub items_failed: usize,
    pub bytes_written: u64,
    pub days: Vec<DayReport>,
}

pub struct PipelineDriver<S, A> {
    credentials: CredentialProvider<S, A>,
    client: PhotosLibraryClient,
    settings: PipelineSettings,
}

impl<S: CredentialStore, A: Authenticator> PipelineDriver<S, A> {
    pub fn new(
        credentials: CredentialProvider<S, A>,
        client: PhotosLibraryClient,
        settings: PipelineSettings,
    ) -> PipelineDriver<S, A> {
        PipelineDriver {
            credentials,
            client,
            settings,
        }
    }

    /// Fetches, filters and downloads each planned day in order, one day at
    /// a time. Only credential and destination problems end the run early.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let destination = &self.settings.destination_folder;
        std::fs::create_dir_all(destination).map_err(|error| PipelineError::Destination {
            path: destination.clone(),
            error,
        })?;

        let credential = self.credentials.obtain().await?;

        let days = plan(&self.settings.window, &self.settings.exclusions);
        let mut summary = RunSummary {
            days_planned: days.len(),
            ..RunSummary::default()
        };
        info!(
            "Planned {} days between {} and {}",
            days.len(),
            self.settings.window.start(),
            self.settings.window.end()
        );

        let pb = ProgressBar::new(days.len() as u64);
        for date in days {
            let records = self.client.fetch_day(date, &credential).await;
            let records = filter_media(
                records,
                self.settings.download_video,
                self.settings.download_images,
            );

            let outcome = if records.is_empty() {
                DayOutcome::NoMedia
            } else {
                let outcomes = self.client.download_media(&records, destination).await;
                let mut downloaded = 0;
                let mut failed = 0;
                for outcome in &outcomes {
                    match outcome.result {
                        Ok(bytes) => {
                            debug!("Saved {} ({bytes} bytes)", outcome.filename);
                            downloaded += 1;
                            summary.bytes_written += bytes;
                        }
                        Err(_) => failed += 1,
                    }
                }
                summary.days_with_media += 1;
                summary.items_downloaded += downloaded;
                summary.items_failed += failed;
                DayOutcome::Downloaded { downloaded, failed }
            };

            let report = DayReport { date, outcome };
            pb.suspend(|| println!("{report}"));
            pb.inc(1);
            summary.days.push(report);
        }
        pb.finish_and_clear();

        self.credentials.release();

        Ok(summary)
    }
}
