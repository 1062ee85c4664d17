//! WMO weather interpretation codes as reported by Open-Meteo.
//!
//! See <https://open-meteo.com/en/docs#weathervariables>.

use serde::Serialize;

/// Human-facing interpretation of a single weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherCondition {
    /// Coarse category, e.g. "Rain".
    pub main: &'static str,
    pub description: &'static str,
    /// OpenWeather-style icon token, e.g. "10d".
    pub icon: &'static str,
}

const UNKNOWN: WeatherCondition = WeatherCondition {
    main: "Unknown",
    description: "Unknown weather",
    icon: "01d",
};

const fn entry(
    main: &'static str,
    description: &'static str,
    icon: &'static str,
) -> WeatherCondition {
    WeatherCondition { main, description, icon }
}

/// Look up a weather code. Unknown or missing codes never fail.
pub fn condition(code: Option<i64>) -> WeatherCondition {
    let Some(code) = code else {
        return UNKNOWN;
    };

    match code {
        0 => entry("Clear", "Clear sky", "01d"),
        1 => entry("Clear", "Mainly clear", "02d"),
        2 => entry("Clear", "Partly cloudy", "03d"),
        3 => entry("Clear", "Overcast", "04d"),
        45 => entry("Fog", "Fog", "50d"),
        48 => entry("Fog", "Depositing rime fog", "50d"),
        51 => entry("Drizzle", "Light drizzle", "09d"),
        53 => entry("Drizzle", "Moderate drizzle", "09d"),
        55 => entry("Drizzle", "Dense drizzle", "09d"),
        56 => entry("Drizzle", "Light freezing drizzle", "09d"),
        57 => entry("Drizzle", "Dense freezing drizzle", "09d"),
        61 => entry("Rain", "Slight rain", "10d"),
        63 => entry("Rain", "Moderate rain", "10d"),
        65 => entry("Rain", "Heavy rain", "10d"),
        66 => entry("Rain", "Light freezing rain", "10d"),
        67 => entry("Rain", "Heavy freezing rain", "10d"),
        71 => entry("Snow", "Slight snow", "13d"),
        73 => entry("Snow", "Moderate snow", "13d"),
        75 => entry("Snow", "Heavy snow", "13d"),
        77 => entry("Snow", "Snow grains", "13d"),
        80 => entry("Rain", "Slight rain showers", "09d"),
        81 => entry("Rain", "Moderate rain showers", "09d"),
        82 => entry("Rain", "Violent rain showers", "09d"),
        85 => entry("Snow", "Slight snow showers", "13d"),
        86 => entry("Snow", "Heavy snow showers", "13d"),
        95 => entry("Thunderstorm", "Thunderstorm", "11d"),
        96 => entry("Thunderstorm", "Thunderstorm with slight hail", "11d"),
        99 => entry("Thunderstorm", "Thunderstorm with heavy hail", "11d"),
        _ => UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_sky() {
        let c = condition(Some(0));
        assert_eq!(c.main, "Clear");
        assert_eq!(c.description, "Clear sky");
        assert_eq!(c.icon, "01d");
    }

    #[test]
    fn heavy_hail_thunderstorm() {
        let c = condition(Some(99));
        assert_eq!(c.main, "Thunderstorm");
        assert_eq!(c.description, "Thunderstorm with heavy hail");
        assert_eq!(c.icon, "11d");
    }

    #[test]
    fn showers_use_shower_icon() {
        assert_eq!(condition(Some(80)).main, "Rain");
        assert_eq!(condition(Some(80)).icon, "09d");
        assert_eq!(condition(Some(85)).main, "Snow");
    }

    #[test]
    fn unknown_codes_fall_back() {
        for code in [Some(4), Some(100), Some(-1), None] {
            let c = condition(code);
            assert_eq!(c.main, "Unknown");
            assert_eq!(c.description, "Unknown weather");
            assert_eq!(c.icon, "01d");
        }
    }
}
