use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::CardError;
use crate::model::{ParcelRecord, FIELD_NAMES};

/// Append-only writer for the output dataset.
///
/// The header is written once at creation; every append is flushed before
/// returning so a killed run keeps all completed rows. The file is the
/// single source of truth for resumability.
pub struct DatasetWriter {
    writer: csv::Writer<File>,
}

impl DatasetWriter {
    /// Create (truncate) the output file and write the header row.
    pub fn create(path: &Path) -> Result<Self, CardError> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(FIELD_NAMES)?;
        writer.flush()?;
        Ok(DatasetWriter { writer })
    }

    /// Append one record and flush it to storage.
    pub fn append(&mut self, record: &ParcelRecord) -> Result<(), CardError> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Sibling path of the broken-parcels report.
pub fn broken_report_path(output_path: &Path) -> PathBuf {
    match output_path.parent() {
        Some(parent) => parent.join("broken_parcels.csv"),
        None => PathBuf::from("broken_parcels.csv"),
    }
}

/// Write the broken-parcels report next to the output file.
///
/// Nothing is written when the set is empty; the report from a previous
/// run, if any, is left alone in that case.
pub fn write_broken_report(
    output_path: &Path,
    broken: &BTreeSet<String>,
) -> Result<Option<PathBuf>, CardError> {
    if broken.is_empty() {
        return Ok(None);
    }

    let path = broken_report_path(output_path);
    warn!(
        "Some parcels are broken. Writing their ids to \"{}\"",
        path.display()
    );

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["broken_parcel_id"])?;
    for id in broken {
        writer.write_record([id.as_str()])?;
    }
    writer.flush()?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_then_rows_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        let mut writer = DatasetWriter::create(&path).unwrap();
        let record = ParcelRecord {
            parcel_number: "1018233".into(),
            owner: Some("DOE, JOHN \"JD\"".into()),
            property_address: Some("123 MAIN ST".into()),
            ..Default::default()
        };
        writer.append(&record).unwrap();
        drop(writer);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            FIELD_NAMES.to_vec()
        );
        let rows: Vec<ParcelRecord> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(rows, vec![record]);
    }

    #[test]
    fn empty_broken_set_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output.csv");
        let written = write_broken_report(&output, &BTreeSet::new()).unwrap();
        assert!(written.is_none());
        assert!(!broken_report_path(&output).exists());
    }

    #[test]
    fn broken_report_lists_each_id_once() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output.csv");
        let broken: BTreeSet<String> = ["22", "11"].iter().map(|s| s.to_string()).collect();

        let path = write_broken_report(&output, &broken).unwrap().unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "broken_parcel_id\n11\n22\n");
    }
}
