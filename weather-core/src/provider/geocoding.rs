use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::{
    error::WeatherError,
    location::{Coordinates, ResolvedLocation},
    provider::{Geocoder, NominatimClient, ProviderId, endpoint, get_json},
};

/// Structured name search on the Open-Meteo geocoding API; used for postal codes.
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: Option<String>,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    country_code: Option<String>,
}

impl OpenMeteoGeocoder {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self { http, base_url: base_url.to_string() }
    }

    /// Best match for `name` (optionally restricted to `country`), or `None`.
    pub async fn search(
        &self,
        name: &str,
        country: Option<&str>,
    ) -> Result<Option<ResolvedLocation>> {
        let url = endpoint(&self.base_url, "search");
        debug!(%url, name, country, "open-meteo geocoding search");

        let mut params = vec![("name", name), ("count", "1"), ("language", "en")];
        if let Some(country) = country {
            params.push(("country", country));
        }

        let response: GeocodingResponse =
            get_json(self.http.get(&url).query(&params), ProviderId::OpenMeteoGeocoding).await?;

        let Some(first) = response.results.unwrap_or_default().into_iter().next() else {
            return Ok(None);
        };

        let coordinates = Coordinates::new(first.latitude, first.longitude)
            .context("Open-Meteo geocoding returned coordinates out of range")?;

        Ok(Some(ResolvedLocation {
            coordinates,
            name: first.name,
            country: first.country.or(first.country_code),
        }))
    }
}

/// City names go to Nominatim, postal codes to Open-Meteo geocoding.
/// The first candidate always wins.
#[derive(Debug, Clone)]
pub struct GeocodingResolver {
    places: NominatimClient,
    codes: OpenMeteoGeocoder,
}

impl GeocodingResolver {
    pub fn new(places: NominatimClient, codes: OpenMeteoGeocoder) -> Self {
        Self { places, codes }
    }
}

#[async_trait]
impl Geocoder for GeocodingResolver {
    #[instrument(skip(self))]
    async fn resolve_city(
        &self,
        name: &str,
        country: Option<&str>,
    ) -> Result<ResolvedLocation, WeatherError> {
        let query = match country {
            Some(country) => format!("{name}, {country}"),
            None => name.to_string(),
        };

        let found = self
            .places
            .search(&query)
            .await
            .map_err(|e| WeatherError::upstream(ProviderId::Nominatim.as_str(), e))?
            .ok_or_else(|| WeatherError::location_not_found("city name", &query))?;

        info!(
            lat = found.coordinates.lat,
            lon = found.coordinates.lon,
            name = found.name.as_deref(),
            "resolved city"
        );
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn resolve_postal_code(
        &self,
        code: &str,
        country: Option<&str>,
    ) -> Result<ResolvedLocation, WeatherError> {
        let found = self
            .codes
            .search(code, country)
            .await
            .map_err(|e| WeatherError::upstream(ProviderId::OpenMeteoGeocoding.as_str(), e))?
            .ok_or_else(|| WeatherError::location_not_found("postal code", code))?;

        info!(
            lat = found.coordinates.lat,
            lon = found.coordinates.lon,
            name = found.name.as_deref(),
            "resolved postal code"
        );
        Ok(found)
    }
}
