use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    error::WeatherError,
    location::{Coordinates, ResolvedLocation},
    model::ForecastWindow,
    units::UnitSystem,
};

pub mod geocoding;
pub mod nominatim;
pub mod open_meteo;

pub use geocoding::{GeocodingResolver, OpenMeteoGeocoder};
pub use nominatim::NominatimClient;
pub use open_meteo::{ForecastPayload, OpenMeteoProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenMeteo,
    OpenMeteoGeocoding,
    Nominatim,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::OpenMeteoGeocoding => "open-meteo geocoding",
            ProviderId::Nominatim => "nominatim",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns a postal code or city name into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn resolve_city(
        &self,
        name: &str,
        country: Option<&str>,
    ) -> Result<ResolvedLocation, WeatherError>;

    async fn resolve_postal_code(
        &self,
        code: &str,
        country: Option<&str>,
    ) -> Result<ResolvedLocation, WeatherError>;
}

/// Fetches raw weather payloads for already-validated coordinates.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(
        &self,
        at: Coordinates,
        units: UnitSystem,
    ) -> Result<ForecastPayload, WeatherError>;

    async fn fetch_forecast(
        &self,
        at: Coordinates,
        window: &ForecastWindow,
        units: UnitSystem,
    ) -> Result<ForecastPayload, WeatherError>;

    async fn fetch_alerts(&self, at: Coordinates) -> Result<ForecastPayload, WeatherError>;
}

/// Construct the geocoder described by `config`.
pub fn geocoder_from_config(config: &Config) -> anyhow::Result<Arc<dyn Geocoder>> {
    let http = http_client(config)?;
    let resolver = GeocodingResolver::new(
        NominatimClient::new(http.clone(), &config.providers.nominatim_url),
        OpenMeteoGeocoder::new(http, &config.providers.geocoding_url),
    );
    Ok(Arc::new(resolver))
}

/// Construct the weather provider described by `config`.
pub fn weather_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let http = http_client(config)?;
    Ok(Arc::new(OpenMeteoProvider::new(http, &config.providers.forecast_url)))
}

/// HTTP client shared by all providers: per-call timeout and a stable User-Agent.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(config.timeout())
        .user_agent(config.providers.user_agent.as_str())
        .build()
        .context("Failed to build HTTP client")
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Send a request and decode a JSON body, treating any non-2xx as failure.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    service: ProviderId,
) -> anyhow::Result<T> {
    let res = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {service}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {service} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{service} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {service} JSON"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
