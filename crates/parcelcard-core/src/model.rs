use serde::{Deserialize, Serialize};

/// Output dataset column order. The CSV header is exactly these names.
pub const FIELD_NAMES: [&str; 11] = [
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
];

/// One extracted property-card record.
///
/// `parcel_number` is always present (it comes from the input listing, not
/// the document). Every other field may be absent when extraction only
/// partially succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelRecord {
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
}

impl ParcelRecord {
    /// A record carrying only the parcel number, used when a parcel fails
    /// before any field could be extracted.
    pub fn bare(parcel_number: &str) -> Self {
        ParcelRecord {
            parcel_number: parcel_number.to_string(),
            ..Default::default()
        }
    }

    /// A record is complete when every field required for downstream use
    /// is present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.parcel_number.trim().is_empty()
            && present(&self.property_address)
            && present(&self.owner_address)
            && present(&self.owner)
            && present(&self.property_class)
    }

    /// Broken means no owner could be extracted at all. Broken parcels are
    /// reported separately and retried on the next run.
    pub fn is_broken(&self) -> bool {
        !present(&self.owner)
    }
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Collapse runs of carriage returns, line feeds, and tabs into a single
/// space so a record always serializes onto one CSV line.
pub fn squash_control_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c == '\r' || c == '\n' || c == '\t' {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}
