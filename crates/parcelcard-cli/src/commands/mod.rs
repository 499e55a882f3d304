pub mod all;
pub mod post_process;
pub mod shapefile;

use parcelcard_core::error::CardError;
use parcelcard_core::geocode::Geocoder;

/// Geocoder selected by the CLI flags: none unless `--geocode` is given,
/// Geoapify when a key is supplied, Nominatim otherwise.
pub(crate) fn build_geocoder(
    geocode: bool,
    geoapify_key: Option<String>,
) -> Result<Option<Geocoder>, CardError> {
    if !geocode {
        return Ok(None);
    }
    Ok(Some(Geocoder::new(geoapify_key)?))
}
