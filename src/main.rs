mod config;
mod credentials;
mod error;
mod model;
mod photos_client;
mod pipeline;
mod planner;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use git_version::git_version;

use crate::config::Config;
use crate::credentials::{
    API_NAME, API_VERSION, ClientSecret, CredentialProvider, FileCredentialStore,
    GoogleAuthenticator,
};
use crate::photos_client::PhotosLibraryClient;
use crate::pipeline::{PipelineDriver, PipelineSettings};
use crate::planner::DateWindow;

pub const GIT_VERSION: &str = git_version!(fallback = "unknown");

/// Photos Library Downloader
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Config file location
    #[clap(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// First day to download, overrides the config file (YYYY-MM-DD)
    #[clap(short, long)]
    start_date: Option<NaiveDate>,

    /// Last day to download, overrides the config file (YYYY-MM-DD)
    #[clap(short, long)]
    end_date: Option<NaiveDate>,

    /// Folder to save media to, overrides the config file
    #[clap(short, long)]
    output_directory: Option<PathBuf>,

    /// Skip videos
    #[clap(long)]
    no_video: bool,

    /// Skip photos
    #[clap(long)]
    no_photos: bool,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(_) => process::exit(0),
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(1);
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    println!("Photos Library Downloader");
    println!("{GIT_VERSION}");

    let conf = Config::read(&args.config)?;
    let window = DateWindow::new(
        args.start_date.unwrap_or(conf.start_date),
        args.end_date.unwrap_or(conf.end_date),
    )?;

    let secret = ClientSecret::read(&conf.client_secret_file)?;
    let credentials = CredentialProvider::new(
        FileCredentialStore::new(&conf.credentials_dir, API_NAME, API_VERSION),
        GoogleAuthenticator::new(secret),
    );
    let client = PhotosLibraryClient::new(conf.request_timeout())
        .context("unable to build HTTP client")?;
    let settings = PipelineSettings {
        window,
        exclusions: conf.exclusions(),
        download_video: conf.download_video && !args.no_video,
        download_images: conf.download_images && !args.no_photos,
        destination_folder: args
            .output_directory
            .unwrap_or_else(|| conf.destination_folder.clone()),
    };

    println!(
        "Saving media to {dir}...",
        dir = settings.destination_folder.display()
    );
    let summary = PipelineDriver::new(credentials, client, settings)
        .run()
        .await?;

    println!(
        "Finished getting media. {downloaded} files from {days} days ({bytes} bytes).",
        downloaded = summary.items_downloaded,
        days = summary.days_planned,
        bytes = summary.bytes_written
    );
    if summary.items_failed > 0 {
        println!("{failed} items could not be downloaded.", failed = summary.items_failed);
    }

    Ok(())
}
