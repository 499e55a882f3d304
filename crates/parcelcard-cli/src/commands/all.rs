use std::path::PathBuf;

use log::info;
use tokio_util::sync::CancellationToken;

use parcelcard_core::error::CardError;
use parcelcard_core::extraction::pdftotext::PdftotextExtractor;
use parcelcard_core::{listing, postprocess, run_scrape, CardPipeline};

use crate::commands::build_geocoder;
use crate::progress::BarReporter;

pub async fn run(
    input_file: PathBuf,
    output_file: PathBuf,
    concurrency: usize,
    geocode: bool,
    geoapify_key: Option<String>,
) -> Result<(), CardError> {
    if !PdftotextExtractor::is_available() {
        return Err(CardError::PdftotextNotFound);
    }

    let parcel_ids = listing::load_parcel_ids(&input_file)?;
    let pipeline = CardPipeline::new()?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received; letting in-flight parcels finish");
                cancel.cancel();
            }
        });
    }

    let progress = BarReporter::new();
    let outcome = run_scrape(
        |id| pipeline.produce(id),
        &parcel_ids,
        &output_file,
        concurrency,
        &cancel,
        &progress,
    )
    .await?;

    let post_path = postprocess::post_processed_path(&output_file);
    if outcome.summary.cancelled {
        info!("Run cancelled; skipping post-processing");
    } else {
        let geocoder = build_geocoder(geocode, geoapify_key)?;
        postprocess::post_process_file(
            &output_file,
            &post_path,
            concurrency,
            geocoder.as_ref(),
            &progress,
        )
        .await?;
    }

    info!("Processing complete!");
    info!(
        "Processed {} parcels ({} preserved from a previous run)",
        outcome.summary.processed + outcome.preserved,
        outcome.preserved
    );
    info!(
        "Output to files: \"{}\" and \"{}\"",
        output_file.display(),
        post_path.display()
    );
    if let Some(report) = &outcome.broken_report {
        info!("Broken parcels written to file: {}", report.display());
    }

    Ok(())
}
