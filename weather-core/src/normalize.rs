//! Raw provider payloads to the stable output shape.
//!
//! Everything here is a pure function of its inputs; callers pass `now`
//! for timestamp fields. Missing values become `None` (serialized as
//! `null`), never an error.

use chrono::{DateTime, Utc};

use crate::{
    codes::condition,
    location::ResolvedLocation,
    model::{
        AlertsReport, CurrentReport, CurrentWeather, DailyForecastEntry, DailyPrecipitation,
        DailyTemperature, DailyWind, ForecastReport, HourlyForecastEntry, HourlyTemperature,
        LocationInfo, Precipitation, ReportData, WeatherAlert, WeatherReport, Wind,
    },
    provider::open_meteo::{AlertPayload, DailyBlock, ForecastPayload, HourlyBlock},
    units::UnitSystem,
};

/// Hourly entries kept in a forecast.
pub const HOURLY_LIMIT: usize = 24;

const UNKNOWN_LOCATION: &str = "Unknown Location";
const UNKNOWN_COUNTRY: &str = "Unknown";

pub fn current(
    payload: &ForecastPayload,
    location: &ResolvedLocation,
    units: UnitSystem,
    now: DateTime<Utc>,
) -> WeatherReport {
    let block = payload.current.clone().unwrap_or_default();

    let current = CurrentWeather {
        temperature: block.temperature_2m,
        feels_like: block.apparent_temperature,
        humidity: block.relative_humidity_2m,
        pressure: block.pressure_msl.or(block.surface_pressure),
        visibility: block.visibility,
        uv_index: block.uv_index,
        weather: condition(block.weather_code),
        wind: Wind {
            speed: block.wind_speed_10m,
            direction: block.wind_direction_10m,
            gust: block.wind_gusts_10m,
        },
        clouds: block.cloud_cover,
        precipitation: Precipitation {
            rain: block.rain.unwrap_or(0.0),
            showers: block.showers.unwrap_or(0.0),
            snowfall: block.snowfall.unwrap_or(0.0),
        },
        timestamp: now,
    };

    report(payload, location, units, ReportData::Current(CurrentReport { current }))
}

/// Keeps the first `days` daily entries and the first 24 hourly ones, or
/// fewer when the provider sent fewer.
pub fn forecast(
    payload: &ForecastPayload,
    location: &ResolvedLocation,
    units: UnitSystem,
    days: usize,
) -> WeatherReport {
    let daily = payload
        .daily
        .as_ref()
        .map(|block| daily_entries(block, days))
        .unwrap_or_default();

    let hourly = payload
        .hourly
        .as_ref()
        .map(|block| hourly_entries(block, HOURLY_LIMIT))
        .unwrap_or_default();

    let data = ReportData::Forecast(ForecastReport {
        timezone: payload.timezone.clone(),
        daily,
        hourly,
    });
    report(payload, location, units, data)
}

pub fn alerts(
    payload: &ForecastPayload,
    location: &ResolvedLocation,
    units: UnitSystem,
    now: DateTime<Utc>,
) -> WeatherReport {
    let alerts: Vec<WeatherAlert> = payload
        .alerts
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(alert)
        .collect();

    let data = ReportData::Alerts(AlertsReport {
        alert_count: alerts.len(),
        has_alerts: !alerts.is_empty(),
        alerts,
        timestamp: now,
    });
    report(payload, location, units, data)
}

fn report(
    payload: &ForecastPayload,
    location: &ResolvedLocation,
    units: UnitSystem,
    data: ReportData,
) -> WeatherReport {
    WeatherReport {
        location: location_info(payload, location),
        units: units.policy().labels,
        data,
    }
}

fn location_info(payload: &ForecastPayload, location: &ResolvedLocation) -> LocationInfo {
    let echo = payload.location.as_ref();

    let name = echo
        .and_then(|e| e.name.clone())
        .or_else(|| location.name.clone())
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

    let country = echo
        .and_then(|e| e.country.clone())
        .or_else(|| location.country.clone())
        .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());

    LocationInfo { name, country, coordinates: location.coordinates }
}

/// Value at `i` of a provider series; short or null series read as `None`.
fn at<T: Copy>(series: &[Option<T>], i: usize) -> Option<T> {
    series.get(i).copied().flatten()
}

fn daily_entries(block: &DailyBlock, days: usize) -> Vec<DailyForecastEntry> {
    block
        .time
        .iter()
        .take(days)
        .enumerate()
        .map(|(i, date)| DailyForecastEntry {
            date: date.clone(),
            temperature: DailyTemperature {
                max: at(&block.temperature_2m_max, i),
                min: at(&block.temperature_2m_min, i),
                feels_like_max: at(&block.apparent_temperature_max, i),
                feels_like_min: at(&block.apparent_temperature_min, i),
            },
            weather: condition(at(&block.weather_code, i)),
            precipitation: DailyPrecipitation {
                sum: at(&block.precipitation_sum, i),
                rain: at(&block.rain_sum, i),
                showers: at(&block.showers_sum, i),
                snowfall: at(&block.snowfall_sum, i),
                hours: at(&block.precipitation_hours, i),
                probability: at(&block.precipitation_probability_max, i),
            },
            wind: DailyWind {
                max_speed: at(&block.wind_speed_10m_max, i),
                max_gust: at(&block.wind_gusts_10m_max, i),
                direction: at(&block.wind_direction_10m_dominant, i),
            },
        })
        .collect()
}

fn hourly_entries(block: &HourlyBlock, limit: usize) -> Vec<HourlyForecastEntry> {
    block
        .time
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, timestamp)| HourlyForecastEntry {
            timestamp: timestamp.clone(),
            temperature: HourlyTemperature {
                current: at(&block.temperature_2m, i),
                feels_like: at(&block.apparent_temperature, i),
            },
            humidity: at(&block.relative_humidity_2m, i),
            pressure: at(&block.pressure_msl, i),
            weather: condition(at(&block.weather_code, i)),
            wind: Wind {
                speed: at(&block.wind_speed_10m, i),
                direction: at(&block.wind_direction_10m, i),
                gust: at(&block.wind_gusts_10m, i),
            },
            clouds: at(&block.cloud_cover, i),
            precipitation: Precipitation {
                rain: at(&block.rain, i).unwrap_or(0.0),
                showers: at(&block.showers, i).unwrap_or(0.0),
                snowfall: at(&block.snowfall, i).unwrap_or(0.0),
            },
        })
        .collect()
}

fn alert(raw: &AlertPayload) -> WeatherAlert {
    let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "Unknown".to_string());

    WeatherAlert {
        event: raw.event.clone().unwrap_or_else(|| "Weather Alert".to_string()),
        description: raw
            .description
            .clone()
            .unwrap_or_else(|| "No description available".to_string()),
        onset: raw.onset.clone(),
        expires: raw.expires.clone(),
        severity: or_unknown(&raw.severity),
        certainty: or_unknown(&raw.certainty),
        urgency: or_unknown(&raw.urgency),
        areas: raw.areas.clone().unwrap_or_default(),
        tags: raw.tags.clone().unwrap_or_default(),
    }
}
