use std::path::PathBuf;

use log::info;

use parcelcard_core::error::CardError;
use parcelcard_core::postprocess;

use crate::commands::build_geocoder;
use crate::progress::BarReporter;

pub async fn run(
    output_file: PathBuf,
    post_processed_output_file: Option<PathBuf>,
    concurrency: usize,
    geocode: bool,
    geoapify_key: Option<String>,
) -> Result<(), CardError> {
    let post_path = post_processed_output_file
        .unwrap_or_else(|| postprocess::post_processed_path(&output_file));
    let geocoder = build_geocoder(geocode, geoapify_key)?;

    let progress = BarReporter::new();
    let rows = postprocess::post_process_file(
        &output_file,
        &post_path,
        concurrency,
        geocoder.as_ref(),
        &progress,
    )
    .await?;

    info!("Post-processed {rows} rows to \"{}\"", post_path.display());
    Ok(())
}
