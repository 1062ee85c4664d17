//! Free-text place search via Nominatim (OpenStreetMap). No API key, but
//! requests must carry an identifying User-Agent (set on the shared client).

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    location::{Coordinates, ResolvedLocation},
    provider::{ProviderId, endpoint, get_json},
};

#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    // Nominatim encodes coordinates as strings.
    lat: String,
    lon: String,
    name: Option<String>,
    display_name: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    country: Option<String>,
    country_code: Option<String>,
}

impl NominatimClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self { http, base_url: base_url.to_string() }
    }

    /// Best match for `query`, or `None` when nothing matched.
    pub async fn search(&self, query: &str) -> Result<Option<ResolvedLocation>> {
        let url = endpoint(&self.base_url, "search");
        debug!(%url, query, "nominatim search");

        let places: Vec<NominatimPlace> = get_json(
            self.http.get(&url).query(&[
                ("q", query),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ]),
            ProviderId::Nominatim,
        )
        .await?;

        places.into_iter().next().map(NominatimPlace::into_resolved).transpose()
    }
}

impl NominatimPlace {
    fn into_resolved(self) -> Result<ResolvedLocation> {
        let lat: f64 = self.lat.trim().parse().with_context(|| {
            format!("Nominatim returned a non-numeric latitude: '{}'", self.lat)
        })?;
        let lon: f64 = self.lon.trim().parse().with_context(|| {
            format!("Nominatim returned a non-numeric longitude: '{}'", self.lon)
        })?;
        let coordinates = Coordinates::new(lat, lon)
            .context("Nominatim returned coordinates out of range")?;

        let name = self
            .name
            .filter(|n| !n.is_empty())
            .or_else(|| {
                self.display_name
                    .as_deref()
                    .and_then(|d| d.split(',').next())
                    .map(|s| s.trim().to_string())
            })
            .filter(|n| !n.is_empty());

        let country = self
            .address
            .and_then(|a| a.country.or_else(|| a.country_code.map(|c| c.to_uppercase())));

        Ok(ResolvedLocation { coordinates, name, country })
    }
}
