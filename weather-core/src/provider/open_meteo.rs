use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::WeatherError,
    location::Coordinates,
    model::ForecastWindow,
    provider::{ProviderId, WeatherProvider, endpoint, get_json},
    units::UnitSystem,
};

const CURRENT_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "weather_code",
    "cloud_cover",
    "pressure_msl",
    "surface_pressure",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
];

const DAILY_FIELDS: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "apparent_temperature_max",
    "apparent_temperature_min",
    "precipitation_sum",
    "rain_sum",
    "showers_sum",
    "snowfall_sum",
    "precipitation_hours",
    "precipitation_probability_max",
    "wind_speed_10m_max",
    "wind_gusts_10m_max",
    "wind_direction_10m_dominant",
];

const HOURLY_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "weather_code",
    "cloud_cover",
    "pressure_msl",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
];

/// Open-Meteo `/forecast` client. Keyless.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    base_url: String,
}

impl OpenMeteoProvider {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self { http, base_url: base_url.to_string() }
    }

    async fn fetch(
        &self,
        params: Vec<(&'static str, String)>,
    ) -> Result<ForecastPayload, WeatherError> {
        let url = endpoint(&self.base_url, "forecast");
        debug!(%url, ?params, "requesting forecast endpoint");

        get_json(self.http.get(&url).query(&params), ProviderId::OpenMeteo)
            .await
            .map_err(|e| WeatherError::upstream(ProviderId::OpenMeteo.as_str(), e))
    }
}

fn base_params(at: Coordinates) -> Vec<(&'static str, String)> {
    vec![("latitude", at.lat.to_string()), ("longitude", at.lon.to_string())]
}

fn unit_params(params: &mut Vec<(&'static str, String)>, units: UnitSystem) {
    params.extend(
        units
            .policy()
            .query_params()
            .into_iter()
            .map(|(key, value)| (key, value.to_string())),
    );
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    #[instrument(skip(self))]
    async fn fetch_current(
        &self,
        at: Coordinates,
        units: UnitSystem,
    ) -> Result<ForecastPayload, WeatherError> {
        let mut params = base_params(at);
        params.push(("current", CURRENT_FIELDS.join(",")));
        unit_params(&mut params, units);

        self.fetch(params).await
    }

    #[instrument(skip(self))]
    async fn fetch_forecast(
        &self,
        at: Coordinates,
        window: &ForecastWindow,
        units: UnitSystem,
    ) -> Result<ForecastPayload, WeatherError> {
        let mut params = base_params(at);
        params.push(("daily", DAILY_FIELDS.join(",")));
        params.push(("hourly", HOURLY_FIELDS.join(",")));
        unit_params(&mut params, units);
        params.push(("timezone", "auto".to_string()));

        // Open-Meteo rejects forecast_days combined with an explicit range.
        if window.start_date().is_none() && window.end_date().is_none() {
            params.push(("forecast_days", window.days().to_string()));
        }
        if let Some(start) = window.start_date() {
            params.push(("start_date", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = window.end_date() {
            params.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }

        self.fetch(params).await
    }

    #[instrument(skip(self))]
    async fn fetch_alerts(&self, at: Coordinates) -> Result<ForecastPayload, WeatherError> {
        let mut params = base_params(at);
        params.push(("alerts", "temperature".to_string()));
        params.push(("timezone", "auto".to_string()));

        self.fetch(params).await
    }
}

/// Raw `/forecast` response. Every block and series is optional so that a
/// sparse payload still decodes; the normalizer fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub timezone: Option<String>,
    /// Location echo; Open-Meteo itself never sends one.
    #[serde(default)]
    pub location: Option<LocationEcho>,
    #[serde(default)]
    pub current: Option<CurrentBlock>,
    #[serde(default)]
    pub daily: Option<DailyBlock>,
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
    #[serde(default)]
    pub alerts: Option<Vec<AlertPayload>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocationEcho {
    pub name: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CurrentBlock {
    pub time: Option<String>,
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub rain: Option<f64>,
    pub showers: Option<f64>,
    pub snowfall: Option<f64>,
    pub weather_code: Option<i64>,
    pub cloud_cover: Option<f64>,
    pub pressure_msl: Option<f64>,
    pub surface_pressure: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
    pub wind_gusts_10m: Option<f64>,
    // Not requested, but passed through when present.
    pub visibility: Option<f64>,
    pub uv_index: Option<f64>,
}

/// Column-oriented series; index `i` of every vector belongs to `time[i]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DailyBlock {
    pub time: Vec<String>,
    pub weather_code: Vec<Option<i64>>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
    pub apparent_temperature_max: Vec<Option<f64>>,
    pub apparent_temperature_min: Vec<Option<f64>>,
    pub precipitation_sum: Vec<Option<f64>>,
    pub rain_sum: Vec<Option<f64>>,
    pub showers_sum: Vec<Option<f64>>,
    pub snowfall_sum: Vec<Option<f64>>,
    pub precipitation_hours: Vec<Option<f64>>,
    pub precipitation_probability_max: Vec<Option<f64>>,
    pub wind_speed_10m_max: Vec<Option<f64>>,
    pub wind_gusts_10m_max: Vec<Option<f64>>,
    pub wind_direction_10m_dominant: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HourlyBlock {
    pub time: Vec<String>,
    pub temperature_2m: Vec<Option<f64>>,
    pub relative_humidity_2m: Vec<Option<f64>>,
    pub apparent_temperature: Vec<Option<f64>>,
    pub precipitation: Vec<Option<f64>>,
    pub rain: Vec<Option<f64>>,
    pub showers: Vec<Option<f64>>,
    pub snowfall: Vec<Option<f64>>,
    pub weather_code: Vec<Option<i64>>,
    pub cloud_cover: Vec<Option<f64>>,
    pub pressure_msl: Vec<Option<f64>>,
    pub wind_speed_10m: Vec<Option<f64>>,
    pub wind_direction_10m: Vec<Option<f64>>,
    pub wind_gusts_10m: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertPayload {
    pub event: Option<String>,
    pub description: Option<String>,
    pub onset: Option<String>,
    pub expires: Option<String>,
    pub severity: Option<String>,
    pub certainty: Option<String>,
    pub urgency: Option<String>,
    pub areas: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}
