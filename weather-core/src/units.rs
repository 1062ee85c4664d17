use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::error::WeatherError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
    Kelvin,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
            UnitSystem::Kelvin => "kelvin",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial, UnitSystem::Kelvin]
    }

    pub fn policy(&self) -> &'static UnitPolicy {
        UnitPolicy::for_system(*self)
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            "kelvin" => Ok(UnitSystem::Kelvin),
            _ => Err(WeatherError::InvalidUnits(format!(
                "Units must be one of: metric, imperial, kelvin (got '{value}')"
            ))),
        }
    }
}

/// Provider query tokens plus the labels advertised in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPolicy {
    pub system: UnitSystem,
    pub temperature_unit: &'static str,
    pub wind_speed_unit: &'static str,
    pub precipitation_unit: &'static str,
    pub labels: UnitLabels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitLabels {
    pub temperature: &'static str,
    pub wind_speed: &'static str,
    pub precipitation: &'static str,
}

// "kelvin" keeps Celsius provider values and only relabels them. Switching
// to absolute temperatures means changing this row's temperature token and
// converting in the normalizer.
static UNIT_TABLE: [UnitPolicy; 3] = [
    UnitPolicy {
        system: UnitSystem::Metric,
        temperature_unit: "celsius",
        wind_speed_unit: "kmh",
        precipitation_unit: "mm",
        labels: UnitLabels { temperature: "°C", wind_speed: "km/h", precipitation: "mm" },
    },
    UnitPolicy {
        system: UnitSystem::Imperial,
        temperature_unit: "fahrenheit",
        wind_speed_unit: "mph",
        precipitation_unit: "inch",
        labels: UnitLabels { temperature: "°F", wind_speed: "mph", precipitation: "inch" },
    },
    UnitPolicy {
        system: UnitSystem::Kelvin,
        temperature_unit: "celsius",
        wind_speed_unit: "kmh",
        precipitation_unit: "mm",
        labels: UnitLabels { temperature: "K", wind_speed: "km/h", precipitation: "mm" },
    },
];

impl UnitPolicy {
    pub fn for_system(system: UnitSystem) -> &'static UnitPolicy {
        match system {
            UnitSystem::Metric => &UNIT_TABLE[0],
            UnitSystem::Imperial => &UNIT_TABLE[1],
            UnitSystem::Kelvin => &UNIT_TABLE[2],
        }
    }

    /// Query parameters understood by the Open-Meteo forecast endpoint.
    pub fn query_params(&self) -> [(&'static str, &'static str); 3] {
        [
            ("temperature_unit", self.temperature_unit),
            ("wind_speed_unit", self.wind_speed_unit),
            ("precipitation_unit", self.precipitation_unit),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_system_as_str_roundtrip() {
        for system in UnitSystem::all() {
            let parsed = UnitSystem::try_from(system.as_str()).expect("roundtrip should succeed");
            assert_eq!(*system, parsed);
        }
    }

    #[test]
    fn unknown_units_error() {
        let err = UnitSystem::try_from("rankine").unwrap_err();
        assert!(matches!(err, WeatherError::InvalidUnits(_)));
        assert!(err.to_string().contains("metric, imperial, kelvin"));
    }

    #[test]
    fn table_rows_match_their_system() {
        for system in UnitSystem::all() {
            assert_eq!(system.policy().system, *system);
        }
    }

    #[test]
    fn imperial_tokens() {
        let policy = UnitSystem::Imperial.policy();
        assert_eq!(
            policy.query_params(),
            [
                ("temperature_unit", "fahrenheit"),
                ("wind_speed_unit", "mph"),
                ("precipitation_unit", "inch"),
            ]
        );
    }

    #[test]
    fn kelvin_queries_like_metric_but_relabels() {
        let metric = UnitSystem::Metric.policy();
        let kelvin = UnitSystem::Kelvin.policy();

        assert_eq!(metric.query_params(), kelvin.query_params());
        assert_eq!(kelvin.labels.temperature, "K");
        assert_eq!(metric.labels.temperature, "°C");
    }
}
