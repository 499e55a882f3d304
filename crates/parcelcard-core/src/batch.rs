use std::collections::BTreeSet;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::card::extract_record;
use crate::error::CardError;
use crate::extraction::grid::CardGrid;
use crate::extraction::pdftotext::PdftotextExtractor;
use crate::extraction::PdfExtractor;
use crate::fetch::DocumentFetcher;
use crate::model::ParcelRecord;
use crate::output::DatasetWriter;
use crate::progress::ProgressReporter;

/// Bounds on the worker-pool size.
pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 200;

/// Result of one batch run.
#[derive(Debug)]
pub struct BatchSummary {
    /// Parcels taken to completion (recorded), in completion order.
    pub processed: usize,
    /// Parcels for which no owner could be extracted.
    pub broken: BTreeSet<String>,
    /// Whether the run stopped early on a cancellation signal.
    pub cancelled: bool,
}

/// The real per-parcel pipeline: fetch the rendered card into scratch,
/// extract its pages, read the positional field locators.
///
/// Owns the per-run scratch directory; dropping the pipeline removes it
/// recursively.
pub struct CardPipeline {
    fetcher: DocumentFetcher,
    extractor: Arc<dyn PdfExtractor>,
    scratch: TempDir,
}

impl CardPipeline {
    pub fn new() -> Result<Self, CardError> {
        let scratch = tempfile::Builder::new().prefix("parcelcard").tempdir()?;
        let fetcher = DocumentFetcher::new(scratch.path())?;
        Ok(CardPipeline {
            fetcher,
            extractor: Arc::new(PdftotextExtractor::new()),
            scratch,
        })
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Produce the record for one parcel.
    ///
    /// The scratch file lives exactly as long as this call: it is removed
    /// on success, extraction failure, and every early return.
    pub async fn produce(&self, parcel_id: String) -> Result<ParcelRecord, CardError> {
        let scratch_file = self.fetcher.fetch_card(&parcel_id).await?;

        // pdftotext is a blocking subprocess; keep it off the async workers.
        let pages = {
            let extractor = Arc::clone(&self.extractor);
            let path = scratch_file.path().to_path_buf();
            tokio::task::spawn_blocking(move || extractor.extract_pages(&path))
                .await
                .map_err(|e| CardError::Extraction(format!("extraction task failed: {e}")))??
        };

        let grid = CardGrid::from_pages(&pages)?;
        Ok(extract_record(&parcel_id, &grid))
    }
}

/// Drive the remaining work set through a bounded worker pool.
///
/// Results are consumed in completion order; each record is appended to
/// the output and flushed before the item counts as complete, so a forced
/// kill loses at most the in-flight items. Per-item failures never abort
/// the batch: a failed parcel is recorded bare (id only) and joins the
/// broken set. Cancellation stops dispatching new parcels while in-flight
/// ones finish and are flushed.
pub async fn run_batch<F, Fut>(
    produce: F,
    remaining: &[String],
    writer: &mut DatasetWriter,
    concurrency: usize,
    cancel: &CancellationToken,
    progress: &dyn ProgressReporter,
) -> Result<BatchSummary, CardError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<ParcelRecord, CardError>>,
{
    let concurrency = concurrency.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY);
    let total = remaining.len() as u64;
    let mut broken: BTreeSet<String> = BTreeSet::new();
    let mut completed: u64 = 0;

    progress.begin(total);

    let produce = &produce;
    let jobs = remaining.iter().map(|id| {
        let parcel_id = id.clone();
        async move {
            let outcome = produce(parcel_id.clone()).await;
            (parcel_id, outcome)
        }
    });

    let cancelled = cancel.cancelled();
    futures::pin_mut!(cancelled);
    let mut results = stream::iter(jobs)
        .take_until(cancelled)
        .buffer_unordered(concurrency);

    while let Some((parcel_id, outcome)) = results.next().await {
        let record = match outcome {
            Ok(record) => record,
            Err(err) => {
                warn!("parcel {parcel_id}: {err}");
                ParcelRecord::bare(&parcel_id)
            }
        };

        if record.is_broken() {
            broken.insert(parcel_id.clone());
        }

        if let Err(err) = writer.append(&record) {
            // Losing a row silently would defeat the resume scan; surface
            // the parcel in the broken report instead.
            error!("failed to record parcel {parcel_id}: {err}");
            broken.insert(parcel_id.clone());
        }

        completed += 1;
        progress.item_done(completed, total);
    }
    drop(results);

    progress.finish();

    let was_cancelled = cancel.is_cancelled();
    if was_cancelled {
        info!("cancellation requested; stopped after {completed} of {total} parcels");
    }

    Ok(BatchSummary {
        processed: completed as usize,
        broken,
        cancelled: was_cancelled,
    })
}
