use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::{
    codes::WeatherCondition,
    error::{ErrorResponse, WeatherError},
    location::Coordinates,
    units::{UnitLabels, UnitSystem},
};

pub const DEFAULT_FORECAST_DAYS: i64 = 5;
pub const MAX_FORECAST_DAYS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    #[default]
    Current,
    Forecast,
    Alerts,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Current => "current",
            RequestKind::Forecast => "forecast",
            RequestKind::Alerts => "alerts",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RequestKind {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "current" => Ok(RequestKind::Current),
            "forecast" => Ok(RequestKind::Forecast),
            "alerts" => Ok(RequestKind::Alerts),
            _ => Err(WeatherError::ValidationError(format!(
                "Request kind must be one of: current, forecast, alerts (got '{value}')"
            ))),
        }
    }
}

/// A weather request as received from a caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRequest {
    #[serde(alias = "location")]
    pub location_string: String,
    #[serde(default, alias = "country")]
    pub country_hint: Option<String>,
    /// One of "metric", "imperial", "kelvin"; the service default when absent.
    #[serde(default, alias = "units")]
    pub unit_system: Option<String>,
    #[serde(default)]
    pub request_kind: RequestKind,
    /// Signed so that negative input reaches validation as `InvalidDays`.
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl WeatherRequest {
    pub fn new(location: impl Into<String>, kind: RequestKind) -> Self {
        Self { location_string: location.into(), request_kind: kind, ..Self::default() }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country_hint = Some(country.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.unit_system = Some(units.into());
        self
    }

    pub fn with_days(mut self, days: i64) -> Self {
        self.days = Some(days);
        self
    }

    pub fn with_dates(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }
}

/// Validated forecast span. Holding one means `days` is within
/// `1..=MAX_FORECAST_DAYS` and both dates are real calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastWindow {
    days: u32,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl ForecastWindow {
    pub fn new(
        days: i64,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Self, WeatherError> {
        let days = u32::try_from(days)
            .ok()
            .filter(|d| (1..=MAX_FORECAST_DAYS).contains(d))
            .ok_or_else(|| {
                WeatherError::InvalidDays(format!(
                    "Forecast days must be between 1 and {MAX_FORECAST_DAYS}, got {days}"
                ))
            })?;

        Ok(Self {
            days,
            start_date: start_date.map(|d| parse_date("Start date", d)).transpose()?,
            end_date: end_date.map(|d| parse_date("End date", d)).transpose()?,
        })
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }
}

/// Strict `YYYY-MM-DD`: four-digit year, zero-padded month and day, and a
/// date that exists on the calendar.
fn parse_date(label: &str, value: &str) -> Result<NaiveDate, WeatherError> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });

    let parsed = shape_ok
        .then(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .flatten();

    parsed.ok_or_else(|| {
        WeatherError::InvalidDateFormat(format!(
            "{label} must be a valid date in YYYY-MM-DD format, got '{value}'"
        ))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationInfo {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wind {
    pub speed: Option<f64>,
    pub direction: Option<f64>,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Precipitation {
    pub rain: f64,
    pub showers: f64,
    pub snowfall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub uv_index: Option<f64>,
    pub weather: WeatherCondition,
    pub wind: Wind,
    pub clouds: Option<f64>,
    pub precipitation: Precipitation,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTemperature {
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub feels_like_max: Option<f64>,
    pub feels_like_min: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPrecipitation {
    pub sum: Option<f64>,
    pub rain: Option<f64>,
    pub showers: Option<f64>,
    pub snowfall: Option<f64>,
    pub hours: Option<f64>,
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWind {
    pub max_speed: Option<f64>,
    pub max_gust: Option<f64>,
    pub direction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecastEntry {
    pub date: String,
    pub temperature: DailyTemperature,
    pub weather: WeatherCondition,
    pub precipitation: DailyPrecipitation,
    pub wind: DailyWind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyTemperature {
    pub current: Option<f64>,
    pub feels_like: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyForecastEntry {
    pub timestamp: String,
    pub temperature: HourlyTemperature,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub weather: WeatherCondition,
    pub wind: Wind,
    pub clouds: Option<f64>,
    pub precipitation: Precipitation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherAlert {
    pub event: String,
    pub description: String,
    pub onset: Option<String>,
    pub expires: Option<String>,
    pub severity: String,
    pub certainty: String,
    pub urgency: String,
    pub areas: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentReport {
    pub current: CurrentWeather,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub timezone: Option<String>,
    pub daily: Vec<DailyForecastEntry>,
    pub hourly: Vec<HourlyForecastEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsReport {
    pub alerts: Vec<WeatherAlert>,
    pub alert_count: usize,
    pub has_alerts: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportData {
    Current(CurrentReport),
    Forecast(ForecastReport),
    Alerts(AlertsReport),
}

/// Normalized response for a single location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location: LocationInfo,
    pub units: UnitLabels,
    #[serde(flatten)]
    pub data: ReportData,
}

impl WeatherReport {
    pub fn current(&self) -> Option<&CurrentWeather> {
        match &self.data {
            ReportData::Current(report) => Some(&report.current),
            _ => None,
        }
    }

    pub fn forecast(&self) -> Option<&ForecastReport> {
        match &self.data {
            ReportData::Forecast(report) => Some(report),
            _ => None,
        }
    }

    pub fn alerts(&self) -> Option<&AlertsReport> {
        match &self.data {
            ReportData::Alerts(report) => Some(report),
            _ => None,
        }
    }
}

/// Request to compare current conditions across several locations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub locations: Vec<String>,
    /// Country hints matched to `locations` by position; may be shorter.
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default, alias = "units")]
    pub unit_system: Option<String>,
}

/// Outcome for one location of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub location: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<WeatherReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl ComparisonEntry {
    pub fn from_result(location: String, result: Result<WeatherReport, WeatherError>) -> Self {
        match result {
            Ok(report) => Self { location, success: true, data: Some(report), error: None },
            Err(err) => Self {
                location,
                success: false,
                data: None,
                error: Some(err.to_response()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub comparison: Vec<ComparisonEntry>,
    pub units: UnitSystem,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_window_day_bounds() {
        assert!(ForecastWindow::new(1, None, None).is_ok());
        assert!(ForecastWindow::new(16, None, None).is_ok());

        for days in [0, 17, -1, i64::from(u32::MAX) + 1] {
            let err = ForecastWindow::new(days, None, None).unwrap_err();
            assert!(matches!(err, WeatherError::InvalidDays(_)));
        }
    }

    #[test]
    fn forecast_window_parses_dates() {
        let window = ForecastWindow::new(3, Some("2024-02-29"), Some("2024-03-02")).unwrap();
        assert_eq!(window.start_date(), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(window.end_date(), NaiveDate::from_ymd_opt(2024, 3, 2));
    }

    #[test]
    fn forecast_window_rejects_malformed_dates() {
        for bad in ["2023-02-29", "2024-13-01", "2024-1-05", "05/01/2024", "2024-01-05T00:00", ""] {
            let err = ForecastWindow::new(3, Some(bad), None).unwrap_err();
            assert!(matches!(err, WeatherError::InvalidDateFormat(_)), "{bad} should be rejected");
        }

        let err = ForecastWindow::new(3, None, Some("tomorrow")).unwrap_err();
        assert!(err.to_string().starts_with("End date"));
    }

    #[test]
    fn request_kind_parsing() {
        assert_eq!(RequestKind::try_from("Forecast").unwrap(), RequestKind::Forecast);
        assert!(RequestKind::try_from("history").is_err());
    }

    #[test]
    fn request_deserializes_from_camel_case() {
        let req: WeatherRequest = serde_json::from_value(serde_json::json!({
            "locationString": "Paris",
            "countryHint": "FR",
            "unitSystem": "imperial",
            "requestKind": "forecast",
            "days": 3
        }))
        .unwrap();

        assert_eq!(
            req,
            WeatherRequest::new("Paris", RequestKind::Forecast)
                .with_country("FR")
                .with_units("imperial")
                .with_days(3)
        );
    }

    #[test]
    fn negative_days_deserialize_for_validation() {
        let req: WeatherRequest = serde_json::from_value(serde_json::json!({
            "locationString": "Paris",
            "requestKind": "forecast",
            "days": -1
        }))
        .unwrap();

        assert_eq!(req.days, Some(-1));
        let err = ForecastWindow::new(req.days.unwrap(), None, None).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidDays(_)));
        assert!(err.to_string().ends_with("got -1"));
    }

    #[test]
    fn comparison_entry_omits_absent_side() {
        let entry = ComparisonEntry::from_result(
            "Atlantis".into(),
            Err(WeatherError::location_not_found("city name", "Atlantis")),
        );
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["errorKind"], "LocationNotFound");
        assert!(json.get("data").is_none());
    }
}
