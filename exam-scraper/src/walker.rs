use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{error, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::difficulty::Difficulty;
use crate::download::{download, ensure_dir};
use crate::error::DownloadError;
use crate::http::Fetch;
use crate::listing::fetch_listing;

/// Where in the walk a per-item failure happened.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Listing,
    Download,
    Save,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Failure {
    pub stage: FailureStage,
    pub year: String,
    pub subject: String,
    pub quarter: usize,
    /// Listing URL for `Listing` failures, attachment title otherwise.
    pub target: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DownloadRecord {
    pub year: String,
    pub subject: String,
    pub quarter: usize,
    pub title: String,
    pub difficulty: Difficulty,
    pub path: PathBuf,
}

/// Outcome of a full walk.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub listings_fetched: usize,
    pub downloaded: Vec<DownloadRecord>,
    pub failures: Vec<Failure>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            started_at: Local::now(),
            finished_at: None,
            listings_fetched: 0,
            downloaded: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn failures_in(&self, stage: FailureStage) -> impl Iterator<Item = &Failure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run summary")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write run summary: {}", path.display()))
    }
}

/// Position of the listing currently being processed.
struct Slot<'a> {
    year: &'a str,
    subject: &'a str,
    quarter: usize,
}

impl Slot<'_> {
    fn failure(&self, stage: FailureStage, target: &str, message: String) -> Failure {
        Failure {
            stage,
            year: self.year.to_string(),
            subject: self.subject.to_string(),
            quarter: self.quarter,
            target: target.to_string(),
            message,
        }
    }
}

/// Drives listing fetches and downloads over a [`Catalog`].
///
/// Owns the HTTP client for the whole run; dropping the walker releases it.
pub struct CatalogWalker<F: Fetch, R: Rng> {
    client: F,
    rng: R,
    root: PathBuf,
}

impl<F: Fetch, R: Rng> CatalogWalker<F, R> {
    pub fn new(client: F, rng: R, root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            rng,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn client(&self) -> &F {
        &self.client
    }

    /// Walk every listing in `catalog`.
    ///
    /// Listing, download and save failures are logged and recorded in the
    /// summary. Failing to create one of the walk's own directories aborts
    /// the run.
    pub fn run(&mut self, catalog: &Catalog) -> Result<RunSummary> {
        let mut summary = RunSummary::new();
        create_dir(&self.root)?;

        for year in &catalog.years {
            let year_dir = self.root.join(&year.name);
            create_dir(&year_dir)?;

            for subject in &year.subjects {
                for (quarter, url) in subject.quarter_urls() {
                    let slot = Slot {
                        year: &year.name,
                        subject: &subject.name,
                        quarter,
                    };
                    let quarter_dir = year_dir
                        .join(&subject.name)
                        .join(format!("Quarter {}", quarter));
                    create_dir(&quarter_dir)?;

                    self.walk_listing(&slot, url, &quarter_dir, &mut summary)?;
                }
            }
        }

        summary.finished_at = Some(Local::now());
        info!(
            "Finished: {} downloaded, {} failed across {} of {} listings",
            summary.downloaded.len(),
            summary.failures.len(),
            summary.listings_fetched,
            catalog.listing_count()
        );
        Ok(summary)
    }

    fn walk_listing(
        &mut self,
        slot: &Slot<'_>,
        url: &str,
        quarter_dir: &Path,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let attachments = match fetch_listing(&self.client, url) {
            Ok(attachments) => attachments,
            Err(e) => {
                error!("Error fetching URL {}: {}", url, e);
                summary
                    .failures
                    .push(slot.failure(FailureStage::Listing, url, e.to_string()));
                return Ok(());
            }
        };
        summary.listings_fetched += 1;

        for attachment in attachments {
            let difficulty = Difficulty::assign(&mut self.rng);
            let dest_dir = quarter_dir.join(difficulty.as_str());
            create_dir(&dest_dir)?;

            match download(
                &self.client,
                &attachment,
                slot.subject,
                difficulty,
                &dest_dir,
            ) {
                Ok(path) => summary.downloaded.push(DownloadRecord {
                    year: slot.year.to_string(),
                    subject: slot.subject.to_string(),
                    quarter: slot.quarter,
                    title: attachment.title,
                    difficulty,
                    path,
                }),
                Err(DownloadError::Fetch(e)) => {
                    error!("Failed to download {}: {}", attachment.title, e);
                    summary.failures.push(slot.failure(
                        FailureStage::Download,
                        &attachment.title,
                        e.to_string(),
                    ));
                }
                Err(e @ DownloadError::Save { .. }) => {
                    error!("Failed to save {}: {}", attachment.title, e);
                    summary.failures.push(slot.failure(
                        FailureStage::Save,
                        &attachment.title,
                        e.to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    ensure_dir(dir).with_context(|| format!("Failed to create directory: {}", dir.display()))
}
