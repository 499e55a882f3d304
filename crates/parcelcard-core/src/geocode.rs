use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;

use crate::error::CardError;

pub const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
pub const GEOAPIFY_ENDPOINT: &str = "https://api.geoapify.com/v1/geocode/search";

/// The public Nominatim instance allows at most one request per second.
const NOMINATIM_DELAY: Duration = Duration::from_secs(1);

const GEOCODE_TIMEOUT: Duration = Duration::from_secs(30);
const GEOCODE_USER_AGENT: &str = "parcelcard/0.1 (property-records research)";

/// A forward-geocoded coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

enum Provider {
    /// Keyless default. Slow but free; requests are self-throttled.
    Nominatim,
    /// Keyed alternative; the key rides as a query parameter.
    Geoapify { api_key: String },
}

/// Forward geocoder over one of two providers, chosen by key presence.
pub struct Geocoder {
    client: reqwest::Client,
    provider: Provider,
}

impl Geocoder {
    pub fn new(geoapify_key: Option<String>) -> Result<Self, CardError> {
        let client = reqwest::Client::builder()
            .user_agent(GEOCODE_USER_AGENT)
            .timeout(GEOCODE_TIMEOUT)
            .build()?;
        let provider = match geoapify_key {
            Some(api_key) => Provider::Geoapify { api_key },
            None => Provider::Nominatim,
        };
        Ok(Geocoder { client, provider })
    }

    /// Resolve an address to a point. `Ok(None)` means the provider had
    /// no match; errors are per-address and callers log and move on.
    pub async fn forward(&self, address: &str) -> Result<Option<GeoPoint>, CardError> {
        if address.trim().is_empty() {
            return Ok(None);
        }
        match &self.provider {
            Provider::Nominatim => self.nominatim(address).await,
            Provider::Geoapify { api_key } => self.geoapify(address, api_key).await,
        }
    }

    async fn nominatim(&self, address: &str) -> Result<Option<GeoPoint>, CardError> {
        #[derive(Deserialize)]
        struct Hit {
            lat: String,
            lon: String,
        }

        sleep(NOMINATIM_DELAY).await;

        let hits: Vec<Hit> = self
            .client
            .get(NOMINATIM_ENDPOINT)
            .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(hit) = hits.first() else {
            return Ok(None);
        };
        let lat: f64 = hit
            .lat
            .parse()
            .map_err(|_| CardError::Geocode(format!("bad latitude '{}'", hit.lat)))?;
        let lng: f64 = hit
            .lon
            .parse()
            .map_err(|_| CardError::Geocode(format!("bad longitude '{}'", hit.lon)))?;
        Ok(Some(GeoPoint { lat, lng }))
    }

    async fn geoapify(&self, address: &str, api_key: &str) -> Result<Option<GeoPoint>, CardError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            results: Vec<Hit>,
        }

        #[derive(Deserialize)]
        struct Hit {
            lat: f64,
            lon: f64,
        }

        let response: Response = self
            .client
            .get(GEOAPIFY_ENDPOINT)
            .query(&[("text", address), ("format", "json"), ("apiKey", api_key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.results.first().map(|hit| GeoPoint {
            lat: hit.lat,
            lng: hit.lon,
        }))
    }
}
