//! Classification of free-form location strings.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::WeatherError;

static COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?)$").expect("coordinate pattern is valid")
});

static TRAILING_COUNTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s+([A-Z]{2})$").expect("country suffix pattern is valid")
});

/// What a location string turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    Coordinates { lat: f64, lon: f64 },
    PostalCode { value: String },
    CityName { value: String, country: Option<String> },
}

impl LocationInput {
    /// Country carried by the string itself, if any.
    pub fn country(&self) -> Option<&str> {
        match self {
            LocationInput::CityName { country, .. } => country.as_deref(),
            _ => None,
        }
    }
}

/// Classify a raw location string. Never fails: anything that is not
/// coordinates or a postal code is a city name.
///
/// Surrounding whitespace is dropped first; the coordinate and postal code
/// patterns must then match the whole remaining string.
pub fn classify(raw: &str) -> LocationInput {
    let input = raw.trim();

    if let Some(caps) = COORDINATES.captures(input) {
        if let (Ok(lat), Ok(lon)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) {
            return LocationInput::Coordinates { lat, lon };
        }
    }

    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        return LocationInput::PostalCode { value: input.to_string() };
    }

    if let Some((city, country)) = input.split_once(',') {
        return city_name(city, Some(country));
    }

    if let Some(caps) = TRAILING_COUNTRY.captures(input) {
        return city_name(&caps[1], Some(&caps[2]));
    }

    city_name(input, None)
}

fn city_name(value: &str, country: Option<&str>) -> LocationInput {
    LocationInput::CityName {
        value: value.trim().to_string(),
        country: country.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string),
    }
}

/// Coordinates that passed range validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, WeatherError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(WeatherError::InvalidCoordinates(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(WeatherError::InvalidCoordinates(format!(
                "Longitude must be between -180 and 180, got: {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }
}

/// A location ready for a weather lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    pub name: Option<String>,
    pub country: Option<String>,
}

impl ResolvedLocation {
    pub fn from_coordinates(coordinates: Coordinates) -> Self {
        Self { coordinates, name: None, country: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(value: &str, country: Option<&str>) -> LocationInput {
        LocationInput::CityName {
            value: value.to_string(),
            country: country.map(str::to_string),
        }
    }

    #[test]
    fn coordinates_are_parsed() {
        assert_eq!(
            classify("40.7128,-74.0060"),
            LocationInput::Coordinates { lat: 40.7128, lon: -74.006 }
        );
        assert_eq!(classify("-33,151"), LocationInput::Coordinates { lat: -33.0, lon: 151.0 });
    }

    #[test]
    fn coordinates_are_not_range_checked_here() {
        assert_eq!(classify("95.5,200"), LocationInput::Coordinates { lat: 95.5, lon: 200.0 });
    }

    #[test]
    fn digits_are_postal_codes() {
        assert_eq!(classify("10001"), LocationInput::PostalCode { value: "10001".into() });
        assert_eq!(classify(" 75001 "), LocationInput::PostalCode { value: "75001".into() });
    }

    #[test]
    fn comma_splits_city_and_country() {
        assert_eq!(classify("Paris, FR"), city("Paris", Some("FR")));
        assert_eq!(classify("Paris, France"), city("Paris", Some("France")));
        assert_eq!(classify("Springfield, IL, US"), city("Springfield", Some("IL, US")));
    }

    #[test]
    fn empty_country_after_comma_is_dropped() {
        assert_eq!(classify("Paris,"), city("Paris", None));
    }

    #[test]
    fn trailing_country_code() {
        assert_eq!(classify("Paris FR"), city("Paris", Some("FR")));
        assert_eq!(classify("Los Angeles US"), city("Los Angeles", Some("US")));
    }

    #[test]
    fn plain_names() {
        assert_eq!(classify("Paris"), city("Paris", None));
        assert_eq!(classify("  New York  "), city("New York", None));
        assert_eq!(classify("Chamonix-Mont-Blanc"), city("Chamonix-Mont-Blanc", None));
        assert_eq!(classify("Rome it"), city("Rome it", None));
    }

    #[test]
    fn surrounding_whitespace_is_ignored_but_inner_text_is_not() {
        assert_eq!(
            classify("  40.7128,-74.0060\t"),
            LocationInput::Coordinates { lat: 40.7128, lon: -74.006 }
        );
        assert_eq!(classify("40.7128,-74.0060 N"), city("40.7128", Some("-74.0060 N")));
        assert_eq!(classify("10001-1234"), city("10001-1234", None));
    }

    #[test]
    fn empty_city_before_comma_is_kept_empty() {
        assert_eq!(classify(" , FR"), city("", Some("FR")));
    }

    #[test]
    fn spaced_coordinates_fall_through_to_city() {
        assert_eq!(classify("40.7128, -74.0060"), city("40.7128", Some("-74.0060")));
    }

    #[test]
    fn coordinates_range_validation() {
        assert!(Coordinates::new(90.0, -180.0).is_ok());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());

        let err = Coordinates::new(91.0, 0.0).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidCoordinates(_)));
        assert!(err.to_string().contains("Latitude"));

        let err = Coordinates::new(0.0, -181.0).unwrap_err();
        assert!(err.to_string().contains("Longitude"));

        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }
}
