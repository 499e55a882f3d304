use crate::error::CardError;
use crate::extraction::PageContent;

/// Reconstructed property-card table.
///
/// The rendered card is a three-column layout: a left column headed
/// `Parcel Number`, an unnamed detail column in the middle (owner name and
/// mailing address), and a right column headed `Ownership` (county,
/// township, tax attributes). `pdftotext -layout` preserves the column
/// alignment with spaces; this module turns that alignment back into
/// addressable cells.
///
/// Row 0 is the first line after the header line, so the (row, column)
/// positions used by the field locators stay stable across documents as
/// long as the upstream rendering does not change. That alignment is a
/// physical contract with the remote service, not a semantic parse.
#[derive(Debug)]
pub struct CardGrid {
    rows: Vec<[Option<String>; COLUMN_COUNT]>,
}

/// Left column, headed by the `Parcel Number` label.
pub const COL_PARCEL: usize = 0;
/// Middle column. The card gives it no heading; it carries owner data.
pub const COL_DETAIL: usize = 1;
/// Right column, headed by the `Ownership` label.
pub const COL_OWNERSHIP: usize = 2;

const COLUMN_COUNT: usize = 3;

const PARCEL_LABEL: &str = "Parcel Number";
const OWNERSHIP_LABEL: &str = "Ownership";

/// Tolerance (in character columns) when matching a segment's start offset
/// against a column anchor; rendered values drift by a column or two.
const COLUMN_JITTER: usize = 2;

impl CardGrid {
    /// Build the grid from extracted page content.
    ///
    /// Fails with [`CardError::TableMissing`] when no line carries both
    /// column labels — the distinct "layout absent" condition, as opposed
    /// to a parsed table with positionally missing fields.
    pub fn from_pages(pages: &[PageContent]) -> Result<CardGrid, CardError> {
        let lines: Vec<&str> = pages
            .iter()
            .flat_map(|p| p.lines.iter().map(|l| l.as_str()))
            .collect();

        let header_index = lines
            .iter()
            .position(|line| line.contains(PARCEL_LABEL) && line.contains(OWNERSHIP_LABEL))
            .ok_or_else(|| {
                CardError::TableMissing(format!(
                    "no header line with '{PARCEL_LABEL}' and '{OWNERSHIP_LABEL}' labels"
                ))
            })?;

        let header = lines[header_index];
        let parcel_anchor = char_offset_of(header, PARCEL_LABEL).unwrap_or(0);
        let ownership_anchor = char_offset_of(header, OWNERSHIP_LABEL).ok_or_else(|| {
            CardError::TableMissing(format!("'{OWNERSHIP_LABEL}' label offset unreadable"))
        })?;

        let rows = lines[header_index + 1..]
            .iter()
            .map(|line| assign_columns(line, parcel_anchor, ownership_anchor))
            .collect();

        Ok(CardGrid { rows })
    }

    /// Trimmed cell content, or None when the position is out of range or
    /// the cell is empty.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)?
            .get(col)?
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Number of rows below the header line.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Place each whitespace-gap segment of a line into its column by start
/// offset: at the left margin → parcel, at or right of the ownership
/// anchor → ownership, otherwise the unnamed detail column.
fn assign_columns(
    line: &str,
    parcel_anchor: usize,
    ownership_anchor: usize,
) -> [Option<String>; COLUMN_COUNT] {
    let mut cells: [Option<String>; COLUMN_COUNT] = Default::default();

    for (start, segment) in split_segments(line) {
        let col = if start >= ownership_anchor.saturating_sub(COLUMN_JITTER) {
            COL_OWNERSHIP
        } else if start <= parcel_anchor + COLUMN_JITTER {
            COL_PARCEL
        } else {
            COL_DETAIL
        };

        match &mut cells[col] {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(segment);
            }
            empty => *empty = Some(segment.to_string()),
        }
    }

    cells
}

/// Split a line by gaps of 2+ whitespace characters, keeping each
/// segment's starting character column.
fn split_segments(line: &str) -> Vec<(usize, &str)> {
    let mut segments = Vec::new();
    let mut start_byte = None;
    let mut start_char = 0;
    let mut end_byte = 0;
    let mut space_count = 0;

    for (char_idx, (byte_idx, c)) in line.char_indices().enumerate() {
        if c.is_whitespace() {
            space_count += 1;
            if space_count == 2 {
                if let Some(s) = start_byte.take() {
                    segments.push((start_char, &line[s..end_byte]));
                }
            }
        } else {
            if start_byte.is_none() {
                start_byte = Some(byte_idx);
                start_char = char_idx;
            }
            end_byte = byte_idx + c.len_utf8();
            space_count = 0;
        }
    }

    if let Some(s) = start_byte {
        segments.push((start_char, &line[s..end_byte]));
    }

    segments
}

/// Character-column offset of a label within a line.
fn char_offset_of(line: &str, label: &str) -> Option<usize> {
    let byte_offset = line.find(label)?;
    Some(line[..byte_offset].chars().count())
}
