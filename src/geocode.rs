use std::collections::HashMap;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ZIPPOPOTAM_URL: &str = "https://api.zippopotam.us/us";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum GeocodeError {
    #[error("Request for zipcode '{0}' failed: {1}")]
    Request(String, #[source] reqwest::Error),
    #[error("Lookup for zipcode '{0}' returned status {1}.")]
    Status(String, reqwest::StatusCode),
    #[error("No usable place found for zipcode '{0}'.")]
    NotFound(String),
}

#[derive(Serialize, Deserialize, Debug)]
struct ZipPlace {
    latitude: Option<String>,
    longitude: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct ZipLookup {
    #[serde(default)]
    places: Vec<ZipPlace>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Pull the first place's coordinates out of a lookup response body.
pub fn parse_places(body: &str) -> Option<Coordinates> {
    let lookup = serde_json::from_str::<ZipLookup>(body).ok()?;
    let place = lookup.places.first()?;
    let latitude = place.latitude.as_deref()?.trim().parse::<f64>().ok()?;
    let longitude = place.longitude.as_deref()?.trim().parse::<f64>().ok()?;
    Some(Coordinates {
        latitude,
        longitude,
    })
}

/// Zipcode lookups against zippopotam.us, remembered for the life of the process.
pub struct Geocoder {
    base_url: String,
    cache: HashMap<String, Coordinates>,
}

impl Default for Geocoder {
    fn default() -> Self {
        Self::new(ZIPPOPOTAM_URL)
    }
}

impl Geocoder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: HashMap::new(),
        }
    }

    pub fn build_client() -> reqwest::Result<Client> {
        Client::builder().timeout(REQUEST_TIMEOUT).build()
    }

    pub fn cached(&self, zipcode: &str) -> Option<Coordinates> {
        self.cache.get(zipcode).copied()
    }

    pub fn remember(&mut self, zipcode: &str, coordinates: Coordinates) {
        self.cache.insert(zipcode.to_string(), coordinates);
    }

    pub async fn coordinates(
        &mut self,
        client: &Client,
        zipcode: &str,
    ) -> Result<Coordinates, GeocodeError> {
        if let Some(coordinates) = self.cached(zipcode) {
            debug!("Found coordinates for {} in cache.", zipcode);
            return Ok(coordinates);
        }

        let endpt = format!("{}/{}", self.base_url, zipcode);
        debug!("Looking up zipcode via {}", endpt);
        let res = client
            .get(&endpt)
            .send()
            .await
            .map_err(|e| GeocodeError::Request(zipcode.to_string(), e))?;
        if !res.status().is_success() {
            warn!("Zipcode lookup status code: {}", res.status());
            return Err(GeocodeError::Status(zipcode.to_string(), res.status()));
        }
        let body = res
            .text()
            .await
            .map_err(|e| GeocodeError::Request(zipcode.to_string(), e))?;

        let coordinates =
            parse_places(&body).ok_or_else(|| GeocodeError::NotFound(zipcode.to_string()))?;
        info!(
            "Coordinates for {}: latitude {}, longitude {}",
            zipcode, coordinates.latitude, coordinates.longitude
        );
        self.remember(zipcode, coordinates);
        Ok(coordinates)
    }
}
