use log::warn;

use crate::extraction::grid::{CardGrid, COL_DETAIL, COL_OWNERSHIP, COL_PARCEL};
use crate::model::{squash_control_whitespace, ParcelRecord};

/// A semantic record field sourced from the card layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    County,
    Township,
    PropertyAddress,
    Owner,
    OwnerAddress,
    AltParcelNumber,
    TaxDistrict,
    Neighborhood,
    PropertyClass,
    PropertySubclass,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::County => "county",
            Field::Township => "township",
            Field::PropertyAddress => "property_address",
            Field::Owner => "owner",
            Field::OwnerAddress => "owner_address",
            Field::AltParcelNumber => "alt_parcel_number",
            Field::TaxDistrict => "tax_district",
            Field::Neighborhood => "neighborhood",
            Field::PropertyClass => "property_class",
            Field::PropertySubclass => "property_subclass",
        }
    }
}

/// Secondary position to read when the primary cell echoes a header label
/// (an off-by-one rendering artifact seen upstream).
#[derive(Debug, Clone, Copy)]
pub struct Fallback {
    pub at: (usize, usize),
    pub when_primary_is: &'static str,
}

/// One (field, position) entry of the layout contract.
#[derive(Debug, Clone, Copy)]
pub struct FieldLocator {
    pub field: Field,
    /// Required for a record to count as complete.
    pub required: bool,
    /// (row, column); row 0 is the first line after the header line.
    pub at: (usize, usize),
    pub fallback: Option<Fallback>,
}

/// The positional layout contract with the assessor's card rendering.
///
/// A silent upstream layout change corrupts fields without raising an
/// error; when that happens this table is the one place to fix.
pub const LOCATORS: [FieldLocator; 10] = [
    FieldLocator {
        field: Field::County,
        required: false,
        at: (1, COL_OWNERSHIP),
        fallback: None,
    },
    FieldLocator {
        field: Field::Township,
        required: false,
        at: (2, COL_OWNERSHIP),
        fallback: None,
    },
    FieldLocator {
        field: Field::Owner,
        required: true,
        at: (1, COL_DETAIL),
        fallback: None,
    },
    FieldLocator {
        field: Field::OwnerAddress,
        required: true,
        at: (7, COL_DETAIL),
        fallback: None,
    },
    FieldLocator {
        field: Field::AltParcelNumber,
        required: false,
        at: (7, COL_OWNERSHIP),
        fallback: None,
    },
    FieldLocator {
        field: Field::PropertyClass,
        required: true,
        at: (8, COL_OWNERSHIP),
        fallback: None,
    },
    FieldLocator {
        field: Field::TaxDistrict,
        required: false,
        at: (9, COL_OWNERSHIP),
        fallback: None,
    },
    FieldLocator {
        field: Field::Neighborhood,
        required: false,
        at: (10, COL_OWNERSHIP),
        fallback: None,
    },
    FieldLocator {
        field: Field::PropertyAddress,
        required: true,
        at: (13, COL_PARCEL),
        fallback: Some(Fallback {
            at: (14, COL_PARCEL),
            when_primary_is: "Property Address",
        }),
    },
    FieldLocator {
        field: Field::PropertySubclass,
        required: false,
        at: (29, COL_OWNERSHIP),
        fallback: None,
    },
];

/// Read every locator position out of the grid and assemble the record.
///
/// Positionally missing fields stay `None`; an incomplete record is logged
/// and still returned so the caller decides its disposition.
pub fn extract_record(parcel_id: &str, grid: &CardGrid) -> ParcelRecord {
    let mut record = ParcelRecord::bare(parcel_id);
    let mut missing_required = Vec::new();

    for locator in &LOCATORS {
        let value = locate(grid, locator);
        if value.is_none() && locator.required {
            missing_required.push(locator.field.name());
        }
        set_field(&mut record, locator.field, value);
    }

    if !missing_required.is_empty() {
        warn!(
            "parcel {parcel_id}: incomplete record, missing {}",
            missing_required.join(", ")
        );
    }

    record
}

fn locate(grid: &CardGrid, locator: &FieldLocator) -> Option<String> {
    let primary = grid.cell(locator.at.0, locator.at.1);

    let value = match (primary, locator.fallback) {
        (Some(text), Some(fallback)) if text == fallback.when_primary_is => {
            grid.cell(fallback.at.0, fallback.at.1)
        }
        _ => primary,
    };

    value.map(squash_control_whitespace)
}

fn set_field(record: &mut ParcelRecord, field: Field, value: Option<String>) {
    let slot = match field {
        Field::County => &mut record.county,
        Field::Township => &mut record.township,
        Field::PropertyAddress => &mut record.property_address,
        Field::Owner => &mut record.owner,
        Field::OwnerAddress => &mut record.owner_address,
        Field::AltParcelNumber => &mut record.alt_parcel_number,
        Field::TaxDistrict => &mut record.tax_district,
        Field::Neighborhood => &mut record.neighborhood,
        Field::PropertyClass => &mut record.property_class,
        Field::PropertySubclass => &mut record.property_subclass,
    };
    *slot = value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PageContent;

    const OWNERSHIP_COLUMN: usize = 50;
    const DETAIL_COLUMN: usize = 25;

    fn place(line: &mut String, offset: usize, text: &str) {
        while line.chars().count() < offset {
            line.push(' ');
        }
        line.push_str(text);
    }

    fn header_line() -> String {
        let mut header = String::from("Parcel Number");
        place(&mut header, OWNERSHIP_COLUMN, "Ownership");
        header
    }

    /// A synthetic card with every locator position populated.
    fn card_lines(property_address_rows: &[(usize, &str)]) -> Vec<String> {
        let mut lines = vec![header_line()];
        // 30 data rows below the header
        for _ in 0..30 {
            lines.push(String::new());
        }

        place(&mut lines[2], DETAIL_COLUMN, "DOE JOHN");
        place(&mut lines[2], OWNERSHIP_COLUMN, "Marion");
        place(&mut lines[3], OWNERSHIP_COLUMN, "Washington Township");
        place(&mut lines[8], DETAIL_COLUMN, "PO BOX 441 INDY IN");
        place(&mut lines[8], OWNERSHIP_COLUMN, "49-01-01-000.000-101");
        place(&mut lines[9], OWNERSHIP_COLUMN, "510");
        place(&mut lines[10], OWNERSHIP_COLUMN, "101");
        place(&mut lines[11], OWNERSHIP_COLUMN, "CBD West");
        for &(row, text) in property_address_rows {
            // row is a grid row; line index is row + 1 (header line first)
            place(&mut lines[row + 1], 0, text);
        }
        place(&mut lines[30], OWNERSHIP_COLUMN, "1");
        lines
    }

    fn grid_from(lines: Vec<String>) -> CardGrid {
        CardGrid::from_pages(&[PageContent {
            page_number: 1,
            lines,
        }])
        .unwrap()
    }

    #[test]
    fn every_locator_populates_its_field() {
        let grid = grid_from(card_lines(&[(13, "123 MAIN ST")]));
        let record = extract_record("1018233", &grid);

        assert_eq!(record.parcel_number, "1018233");
        assert_eq!(record.county.as_deref(), Some("Marion"));
        assert_eq!(record.township.as_deref(), Some("Washington Township"));
        assert_eq!(record.owner.as_deref(), Some("DOE JOHN"));
        assert_eq!(record.owner_address.as_deref(), Some("PO BOX 441 INDY IN"));
        assert_eq!(
            record.alt_parcel_number.as_deref(),
            Some("49-01-01-000.000-101")
        );
        assert_eq!(record.property_class.as_deref(), Some("510"));
        assert_eq!(record.tax_district.as_deref(), Some("101"));
        assert_eq!(record.neighborhood.as_deref(), Some("CBD West"));
        assert_eq!(record.property_address.as_deref(), Some("123 MAIN ST"));
        assert_eq!(record.property_subclass.as_deref(), Some("1"));
        assert!(record.is_complete());
    }

    #[test]
    fn header_echo_falls_back_one_row() {
        let grid = grid_from(card_lines(&[
            (13, "Property Address"),
            (14, "456 OAK AVE"),
        ]));
        let record = extract_record("1018233", &grid);
        assert_eq!(record.property_address.as_deref(), Some("456 OAK AVE"));
    }

    #[test]
    fn positionally_missing_fields_stay_none() {
        // Card with only the header line and owner row
        let mut lines = vec![header_line()];
        lines.push(String::new());
        let mut owner_row = String::new();
        place(&mut owner_row, DETAIL_COLUMN, "DOE JOHN");
        lines.push(owner_row);

        let record = extract_record("1018233", &grid_from(lines));
        assert_eq!(record.owner.as_deref(), Some("DOE JOHN"));
        assert!(record.property_address.is_none());
        assert!(record.property_class.is_none());
        assert!(!record.is_complete());
        assert!(!record.is_broken());
    }
}
