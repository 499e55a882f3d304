use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use log::info;

use crate::error::CardError;

/// Column in the input listing holding parcel identifiers.
pub const ID_COLUMN: &str = "PARCEL_C";

/// Load the parcel id column from an input listing.
///
/// Excel listings (`.xlsx` / `.xls`) are the assessor's native export
/// format; a CSV with the same header column is accepted as well. Numeric
/// cells are coerced to their string form so ids compare cleanly against
/// previously recorded rows.
pub fn load_parcel_ids(path: &Path) -> Result<Vec<String>, CardError> {
    let is_excel = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xls"));

    let ids = if is_excel {
        load_excel(path)?
    } else {
        load_csv(path)?
    };

    info!("Loaded {} parcel ids from {}", ids.len(), path.display());
    Ok(ids)
}

fn load_excel(path: &Path) -> Result<Vec<String>, CardError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| CardError::Listing {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let (_, range) = workbook
        .worksheets()
        .into_iter()
        .next()
        .ok_or_else(|| CardError::Listing {
            path: path.to_path_buf(),
            reason: "workbook has no worksheets".into(),
        })?;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| CardError::Listing {
        path: path.to_path_buf(),
        reason: "worksheet is empty".into(),
    })?;

    let id_col = header
        .iter()
        .position(|cell| cell_as_id(cell).as_deref() == Some(ID_COLUMN))
        .ok_or_else(|| CardError::Listing {
            path: path.to_path_buf(),
            reason: format!("missing '{ID_COLUMN}' column"),
        })?;

    let mut ids = Vec::new();
    for row in rows {
        if let Some(id) = row.get(id_col).and_then(cell_as_id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn load_csv(path: &Path) -> Result<Vec<String>, CardError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| CardError::Listing {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let id_col = reader
        .headers()
        .map_err(|e| CardError::Listing {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .iter()
        .position(|h| h.trim() == ID_COLUMN)
        .ok_or_else(|| CardError::Listing {
            path: path.to_path_buf(),
            reason: format!("missing '{ID_COLUMN}' column"),
        })?;

    let mut ids = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| CardError::Listing {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if let Some(id) = record.get(id_col).map(str::trim) {
            if !id.is_empty() {
                ids.push(id.to_string());
            }
        }
    }
    Ok(ids)
}

/// String form of a listing cell. Whole floats print without the trailing
/// `.0` that Excel gives numeric parcel ids.
fn cell_as_id(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        Data::Empty => None,
        other => {
            let s = other.to_string();
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn float_ids_lose_trailing_zero() {
        assert_eq!(cell_as_id(&Data::Float(1018233.0)).unwrap(), "1018233");
        assert_eq!(cell_as_id(&Data::Int(42)).unwrap(), "42");
        assert_eq!(cell_as_id(&Data::String(" 7012 ".into())).unwrap(), "7012");
        assert!(cell_as_id(&Data::Empty).is_none());
    }

    #[test]
    fn csv_listing_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "STATE,{ID_COLUMN},ACRES").unwrap();
        writeln!(file, "IN,1018233,0.5").unwrap();
        writeln!(file, "IN,1018234,1.0").unwrap();
        drop(file);

        let ids = load_parcel_ids(&path).unwrap();
        assert_eq!(ids, vec!["1018233", "1018234"]);
    }

    #[test]
    fn csv_listing_without_id_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let err = load_parcel_ids(&path).unwrap_err();
        assert!(matches!(err, CardError::Listing { .. }));
    }
}
