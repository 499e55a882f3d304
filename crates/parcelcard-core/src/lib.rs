//! Core library for the parcelcard property-card scraper.
//!
//! The pipeline fetches rendered property-card PDFs from the assessor's
//! mapping service, extracts a fixed field set from each card's tabular
//! layout, and accumulates the records into a durable CSV dataset that can
//! be resumed across runs. Post-processing cleans the addresses, scores
//! owner/property address similarity, optionally geocodes, and exports
//! owner locations as GeoJSON.

pub mod batch;
pub mod card;
pub mod error;
pub mod export;
pub mod extraction;
pub mod fetch;
pub mod geocode;
pub mod listing;
pub mod model;
pub mod output;
pub mod postprocess;
pub mod progress;
pub mod resume;

use std::future::Future;
use std::path::{Path, PathBuf};

use log::info;
use tokio_util::sync::CancellationToken;

pub use batch::{run_batch, BatchSummary, CardPipeline, MAX_CONCURRENCY, MIN_CONCURRENCY};
pub use error::CardError;
pub use model::{ParcelRecord, FIELD_NAMES};
pub use progress::{ProgressReporter, SilentReporter};

/// Result of a full scrape run.
#[derive(Debug)]
pub struct ScrapeOutcome {
    /// Valid rows carried over from a previous run.
    pub preserved: usize,
    /// What the batch did with the remaining work.
    pub summary: BatchSummary,
    /// Broken-parcels report path, when any parcel broke.
    pub broken_report: Option<PathBuf>,
}

/// Run the scraping stage: compute the remaining work from any existing
/// output, re-seed preserved rows, drive the batch, report broken parcels.
///
/// `produce` turns one parcel id into a record; the real implementation is
/// [`CardPipeline::produce`], and tests substitute their own. Only setup
/// failures (unreadable resume file, unwritable output) abort the run;
/// per-parcel failures are recorded and reported instead.
pub async fn run_scrape<F, Fut>(
    produce: F,
    listing_ids: &[String],
    output_path: &Path,
    concurrency: usize,
    cancel: &CancellationToken,
    progress: &dyn ProgressReporter,
) -> Result<ScrapeOutcome, CardError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<ParcelRecord, CardError>>,
{
    let plan = resume::plan_resume(output_path, listing_ids)?;

    let mut writer = output::DatasetWriter::create(output_path)?;
    for record in &plan.preserved {
        writer.append(record)?;
    }

    info!(
        "Processing parcels. Writing to {}. This may take a while...",
        output_path.display()
    );
    let summary = batch::run_batch(
        produce,
        &plan.remaining,
        &mut writer,
        concurrency,
        cancel,
        progress,
    )
    .await?;

    let broken_report = output::write_broken_report(output_path, &summary.broken)?;

    Ok(ScrapeOutcome {
        preserved: plan.preserved.len(),
        summary,
        broken_report,
    })
}
