use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::batch::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::error::CardError;
use crate::geocode::Geocoder;
use crate::progress::ProgressReporter;

/// Post-processed dataset columns: the output dataset plus similarity and
/// the optional coordinate pairs.
pub const PROCESSED_FIELD_NAMES: [&str; 16] = [
    "parcel_number",
    "alt_parcel_number",
    "county",
    "township",
    "property_address",
    "owner",
    "owner_address",
    "tax_district",
    "neighborhood",
    "property_class",
    "property_subclass",
    "property_address_owner_address_similarity",
    "owner_address_lat",
    "owner_address_lng",
    "property_address_lat",
    "property_address_lng",
];

/// One row of the post-processed dataset.
///
/// Deserializes from both the raw output dataset (the extra columns fall
/// back to defaults) and an already post-processed file, so existing
/// coordinates survive a re-run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub parcel_number: String,
    pub alt_parcel_number: Option<String>,
    pub county: Option<String>,
    pub township: Option<String>,
    pub property_address: Option<String>,
    pub owner: Option<String>,
    pub owner_address: Option<String>,
    pub tax_district: Option<String>,
    pub neighborhood: Option<String>,
    pub property_class: Option<String>,
    pub property_subclass: Option<String>,
    #[serde(default)]
    pub property_address_owner_address_similarity: f64,
    #[serde(default)]
    pub owner_address_lat: Option<f64>,
    #[serde(default)]
    pub owner_address_lng: Option<f64>,
    #[serde(default)]
    pub property_address_lat: Option<f64>,
    #[serde(default)]
    pub property_address_lng: Option<f64>,
}

/// Normalize a street address for comparison and geocoding.
///
/// Commas go away, hyphens split tokens, everything is uppercased, and the
/// `AV` suffix becomes `AVE`. A short (< 5 chars) final token is dropped —
/// usually a stray suffix fragment — unless it came out of the suffix
/// mapping, which marks it as a real street type.
pub fn clean_address(address: &str) -> String {
    let stripped = address.replace(',', "").replace('-', " ");
    let mut tokens: Vec<(String, bool)> = stripped
        .split_whitespace()
        .map(|word| {
            let upper = word.to_uppercase();
            if upper == "AV" {
                ("AVE".to_string(), true)
            } else {
                (upper, false)
            }
        })
        .collect();

    if let Some((last, expanded)) = tokens.last() {
        if last.chars().count() < 5 && !expanded {
            tokens.pop();
        }
    }

    tokens
        .into_iter()
        .map(|(word, _)| word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Textual similarity in [0, 1]: 1.0 for identical strings, 0.0 for
/// entirely different ones.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Clean one row: normalize both address fields and score how alike they
/// are. High similarity usually means an owner-occupied parcel.
pub fn post_process_row(mut row: ProcessedRecord) -> ProcessedRecord {
    let property = clean_address(row.property_address.as_deref().unwrap_or(""));
    let owner = clean_address(row.owner_address.as_deref().unwrap_or(""));
    row.property_address_owner_address_similarity = similarity(&property, &owner);
    row.property_address = Some(property);
    row.owner_address = Some(owner);
    row
}

/// Default path of the post-processed dataset next to the output file.
pub fn post_processed_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("output");
    let ext = output.extension().and_then(OsStr::to_str).unwrap_or("csv");
    output.with_file_name(format!("{stem}_post_processed.{ext}"))
}

/// Clean and enrich a finished dataset.
///
/// Row order is preserved (the cleaning stage buffers in order), so the
/// result is deterministic for a given input. Geocoding is sequential and
/// skips rows that already carry coordinates.
pub async fn post_process_file(
    input: &Path,
    output: &Path,
    concurrency: usize,
    geocoder: Option<&Geocoder>,
    progress: &dyn ProgressReporter,
) -> Result<usize, CardError> {
    info!("Post-processing output to {}", output.display());

    let mut reader = csv::Reader::from_path(input)?;
    let rows: Vec<ProcessedRecord> = reader
        .deserialize()
        .collect::<Result<_, csv::Error>>()?;
    let total = rows.len() as u64;
    let concurrency = concurrency.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY);

    info!("Post processing {total} parcels");
    progress.begin(total);
    let mut processed: Vec<ProcessedRecord> = Vec::with_capacity(rows.len());
    {
        let mut cleaned = stream::iter(
            rows.into_iter()
                .map(|row| async move { post_process_row(row) }),
        )
        .buffered(concurrency);
        let mut done: u64 = 0;
        while let Some(row) = cleaned.next().await {
            processed.push(row);
            done += 1;
            progress.item_done(done, total);
        }
    }

    if let Some(geocoder) = geocoder {
        info!("Geocoding parcels");
        progress.begin(total);
        let mut done: u64 = 0;
        for row in processed.iter_mut() {
            geocode_row(geocoder, row).await;
            done += 1;
            progress.item_done(done, total);
        }
    }

    info!("Writing post-processed output");
    let file = File::create(output)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(PROCESSED_FIELD_NAMES)?;
    for row in &processed {
        writer.serialize(row)?;
    }
    writer.flush()?;
    progress.finish();

    Ok(processed.len())
}

/// Fill in missing coordinates for one row. Failures are logged per
/// address and leave the columns empty.
async fn geocode_row(geocoder: &Geocoder, row: &mut ProcessedRecord) {
    if row.owner_address_lat.is_none() || row.owner_address_lng.is_none() {
        match geocoder
            .forward(row.owner_address.as_deref().unwrap_or(""))
            .await
        {
            Ok(Some(point)) => {
                row.owner_address_lat = Some(point.lat);
                row.owner_address_lng = Some(point.lng);
            }
            Ok(None) => {}
            Err(e) => error!("{e}"),
        }
    }

    if row.property_address_lat.is_none() || row.property_address_lng.is_none() {
        match geocoder
            .forward(row.property_address.as_deref().unwrap_or(""))
            .await
        {
            Ok(Some(point)) => {
                row.property_address_lat = Some(point.lat);
                row.property_address_lng = Some(point.lng);
            }
            Ok(None) => {}
            Err(e) => error!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_address_expands_trailing_av() {
        assert_eq!(clean_address("123 Main Av"), "123 MAIN AVE");
    }

    #[test]
    fn clean_address_drops_short_trailing_token() {
        assert_eq!(clean_address("500 E WASHINGTON ST"), "500 E WASHINGTON");
    }

    #[test]
    fn clean_address_splits_hyphens_and_strips_commas() {
        assert_eq!(clean_address("123 N. Main-St Av"), "123 N. MAIN ST AVE");
        assert_eq!(clean_address("123 Main St, Indianapolis"), "123 MAIN ST INDIANAPOLIS");
    }

    #[test]
    fn clean_address_keeps_long_trailing_token() {
        assert_eq!(clean_address("123 Main Street"), "123 MAIN STREET");
    }

    #[test]
    fn clean_address_handles_empty_input() {
        assert_eq!(clean_address(""), "");
        assert_eq!(clean_address("  ,  "), "");
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("123 MAIN ST", "123 MAIN ST"), 1.0);
        assert_eq!(similarity("A", "B"), 0.0);
    }

    #[test]
    fn post_processed_path_inserts_suffix() {
        assert_eq!(
            post_processed_path(Path::new("/data/output.csv")),
            Path::new("/data/output_post_processed.csv")
        );
    }

    #[test]
    fn post_process_row_scores_cleaned_addresses() {
        let row = ProcessedRecord {
            parcel_number: "1".into(),
            property_address: Some("123 Main Av".into()),
            owner_address: Some("123 Main-Av".into()),
            ..Default::default()
        };
        let processed = post_process_row(row);
        assert_eq!(processed.property_address.as_deref(), Some("123 MAIN AVE"));
        assert_eq!(processed.owner_address.as_deref(), Some("123 MAIN AVE"));
        assert_eq!(processed.property_address_owner_address_similarity, 1.0);
    }

    #[tokio::test]
    async fn post_process_file_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("output.csv");
        std::fs::write(
            &input,
            "parcel_number,alt_parcel_number,county,township,property_address,owner,owner_address,tax_district,neighborhood,property_class,property_subclass\n\
             1,,Marion,,123 Main Av,DOE JOHN,123 Main Av,101,,510,\n\
             2,,Marion,,9 Elm St,ROE JANE,PO Box 441,101,,510,\n",
        )
        .unwrap();

        let out_a = dir.path().join("a.csv");
        let out_b = dir.path().join("b.csv");
        let progress = crate::progress::SilentReporter;
        post_process_file(&input, &out_a, 4, None, &progress)
            .await
            .unwrap();
        post_process_file(&input, &out_b, 4, None, &progress)
            .await
            .unwrap();

        let a = std::fs::read_to_string(&out_a).unwrap();
        let b = std::fs::read_to_string(&out_b).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("parcel_number,"));
        assert!(a.contains("123 MAIN AVE"));
    }
}
