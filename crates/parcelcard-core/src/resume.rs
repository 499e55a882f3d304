use std::collections::HashSet;
use std::path::Path;

use log::info;

use crate::error::CardError;
use crate::model::ParcelRecord;

/// Header label echo that marks a misaligned row. A row whose address
/// field contains this text was written from a shifted layout and must
/// not count as recorded.
const HEADER_ECHO: &str = "property address";

/// Work split computed from a prior output dataset.
#[derive(Debug)]
pub struct ResumePlan {
    /// Valid rows from the previous run, re-seeded into the new output
    /// before new work begins.
    pub preserved: Vec<ParcelRecord>,
    /// Listing ids still to process, in listing order, deduplicated.
    pub remaining: Vec<String>,
}

/// Scan an existing output dataset (if any) and split the listing into
/// already-recorded and remaining work.
///
/// A row counts as recorded only when it has an owner and its address
/// field does not echo the dataset's own header label. The first row per
/// parcel id wins. A malformed row fails the run: silently dropping data
/// here would lose previous work without anyone noticing.
pub fn plan_resume(output_path: &Path, listing_ids: &[String]) -> Result<ResumePlan, CardError> {
    let mut preserved = Vec::new();
    let mut recorded_ids: HashSet<String> = HashSet::new();

    if output_path.exists() {
        info!(
            "Checking {} for already-recorded parcels",
            output_path.display()
        );
        let mut reader = csv::Reader::from_path(output_path)?;
        for (index, result) in reader.deserialize::<ParcelRecord>().enumerate() {
            let record = result.map_err(|e| CardError::ResumeScan {
                path: output_path.to_path_buf(),
                reason: format!("row {}: {e}", index + 2),
            })?;
            if is_recorded(&record) && recorded_ids.insert(record.parcel_number.clone()) {
                preserved.push(record);
            }
        }
    }

    let mut seen = HashSet::new();
    let remaining: Vec<String> = listing_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .filter(|id| !recorded_ids.contains(id.as_str()))
        .cloned()
        .collect();

    info!(
        "{} unprocessed parcels ({} already recorded)",
        remaining.len(),
        preserved.len()
    );

    Ok(ResumePlan {
        preserved,
        remaining,
    })
}

fn is_recorded(record: &ParcelRecord) -> bool {
    let has_owner = record
        .owner
        .as_deref()
        .is_some_and(|o| !o.trim().is_empty());
    let address_echoes_header = record
        .property_address
        .as_deref()
        .unwrap_or("")
        .to_lowercase()
        .contains(HEADER_ECHO);
    has_owner && !address_echoes_header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::DatasetWriter;

    fn record(id: &str, owner: Option<&str>, address: Option<&str>) -> ParcelRecord {
        ParcelRecord {
            parcel_number: id.to_string(),
            owner: owner.map(str::to_string),
            property_address: address.map(str::to_string),
            ..Default::default()
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_output_leaves_all_work() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan_resume(&dir.path().join("none.csv"), &ids(&["1", "2"])).unwrap();
        assert!(plan.preserved.is_empty());
        assert_eq!(plan.remaining, ids(&["1", "2"]));
    }

    #[test]
    fn recorded_rows_are_excluded_from_remaining() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");
        let mut writer = DatasetWriter::create(&path).unwrap();
        writer
            .append(&record("1", Some("DOE JOHN"), Some("123 MAIN ST")))
            .unwrap();
        writer.append(&record("2", None, Some("9 ELM ST"))).unwrap();
        drop(writer);

        let plan = plan_resume(&path, &ids(&["1", "2", "3"])).unwrap();
        assert_eq!(plan.preserved.len(), 1);
        assert_eq!(plan.preserved[0].parcel_number, "1");
        // id 2 had no owner: it stays in the work set
        assert_eq!(plan.remaining, ids(&["2", "3"]));
    }

    #[test]
    fn header_echo_rows_are_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");
        let mut writer = DatasetWriter::create(&path).unwrap();
        writer
            .append(&record("1", Some("DOE JOHN"), Some("Property Address")))
            .unwrap();
        drop(writer);

        let plan = plan_resume(&path, &ids(&["1"])).unwrap();
        assert!(plan.preserved.is_empty());
        assert_eq!(plan.remaining, ids(&["1"]));
    }

    #[test]
    fn first_row_per_parcel_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");
        let mut writer = DatasetWriter::create(&path).unwrap();
        writer
            .append(&record("1", Some("FIRST OWNER"), Some("123 MAIN ST")))
            .unwrap();
        writer
            .append(&record("1", Some("SECOND OWNER"), Some("123 MAIN ST")))
            .unwrap();
        drop(writer);

        let plan = plan_resume(&path, &ids(&["1"])).unwrap();
        assert_eq!(plan.preserved.len(), 1);
        assert_eq!(plan.preserved[0].owner.as_deref(), Some("FIRST OWNER"));
    }

    #[test]
    fn duplicate_listing_ids_collapse() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan_resume(&dir.path().join("none.csv"), &ids(&["1", "1", "2"])).unwrap();
        assert_eq!(plan.remaining, ids(&["1", "2"]));
    }

    #[test]
    fn malformed_output_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");
        std::fs::write(&path, "parcel_number,owner\n1,DOE,EXTRA,FIELDS,HERE\n").unwrap();

        let err = plan_resume(&path, &ids(&["1"])).unwrap_err();
        assert!(matches!(err, CardError::ResumeScan { .. }));
    }
}
