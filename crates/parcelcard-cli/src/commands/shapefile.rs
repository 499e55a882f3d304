use std::path::PathBuf;

use log::info;

use parcelcard_core::error::CardError;
use parcelcard_core::export;

pub fn run(post_processed_output_file: PathBuf, shapefile: PathBuf) -> Result<(), CardError> {
    let count = export::generate_owner_points(&post_processed_output_file, &shapefile)?;
    info!(
        "{count} owner points written to \"{}\"",
        shapefile.display()
    );
    Ok(())
}
