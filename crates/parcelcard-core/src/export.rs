use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use log::info;

use crate::error::CardError;
use crate::postprocess::ProcessedRecord;

/// Export owner locations from a post-processed dataset as GeoJSON.
///
/// Rows without both owner coordinates are skipped; each remaining row
/// becomes one point feature keyed by the owner name. Returns the number
/// of features written.
pub fn generate_owner_points(post_processed: &Path, out: &Path) -> Result<usize, CardError> {
    let mut reader = csv::Reader::from_path(post_processed)?;

    let mut features = Vec::new();
    for result in reader.deserialize::<ProcessedRecord>() {
        let row = result?;
        let (Some(lat), Some(lng)) = (row.owner_address_lat, row.owner_address_lng) else {
            continue;
        };

        let mut properties = JsonObject::new();
        properties.insert(
            "owner".to_string(),
            JsonValue::String(row.owner.unwrap_or_default()),
        );

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lng, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    let count = features.len();
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    std::fs::write(out, serde_json::to_string(&collection)?)?;
    info!("Wrote {count} owner points to {}", out.display());

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_without_coordinates_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("post.csv");
        std::fs::write(
            &input,
            "parcel_number,alt_parcel_number,county,township,property_address,owner,owner_address,tax_district,neighborhood,property_class,property_subclass,property_address_owner_address_similarity,owner_address_lat,owner_address_lng,property_address_lat,property_address_lng\n\
             1,,,,123 MAIN,DOE JOHN,123 MAIN,,,510,,1.0,39.77,-86.15,,\n\
             2,,,,9 ELM,ROE JANE,PO BOX,,,510,,0.2,,,,\n",
        )
        .unwrap();

        let out = dir.path().join("owners.geojson");
        let count = generate_owner_points(&input, &out).unwrap();
        assert_eq!(count, 1);

        let geojson: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(geojson["type"], "FeatureCollection");
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["owner"], "DOE JOHN");
        assert_eq!(
            features[0]["geometry"]["coordinates"],
            serde_json::json!([-86.15, 39.77])
        );
    }
}
