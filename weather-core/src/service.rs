use anyhow::Context;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    Config,
    error::WeatherError,
    location::{Coordinates, LocationInput, ResolvedLocation, classify},
    model::{
        CompareRequest, Comparison, ComparisonEntry, DEFAULT_FORECAST_DAYS, ForecastWindow,
        RequestKind, WeatherReport, WeatherRequest,
    },
    normalize,
    provider::{Geocoder, WeatherProvider, geocoder_from_config, weather_provider_from_config},
    units::UnitSystem,
};

/// Validates a request, resolves its location, fetches and normalizes.
///
/// Holds nothing mutable; share it freely behind an `Arc`.
#[derive(Debug, Clone)]
pub struct WeatherService {
    geocoder: Arc<dyn Geocoder>,
    provider: Arc<dyn WeatherProvider>,
    default_units: UnitSystem,
}

/// A request that passed validation.
#[derive(Debug)]
struct Validated {
    units: UnitSystem,
    window: Option<ForecastWindow>,
}

impl WeatherService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        provider: Arc<dyn WeatherProvider>,
        default_units: UnitSystem,
    ) -> Self {
        Self { geocoder, provider, default_units }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate().context("Invalid configuration")?;

        Ok(Self::new(
            geocoder_from_config(config)?,
            weather_provider_from_config(config)?,
            config.default_units,
        ))
    }

    #[instrument(
        skip(self, request),
        fields(location = %request.location_string, kind = %request.request_kind)
    )]
    pub async fn handle(&self, request: &WeatherRequest) -> Result<WeatherReport, WeatherError> {
        let validated = self.validate(request)?;

        let location = self
            .resolve(&request.location_string, request.country_hint.as_deref())
            .await?;

        let at = location.coordinates;
        let units = validated.units;

        match request.request_kind {
            RequestKind::Current => {
                let payload = self.provider.fetch_current(at, units).await?;
                Ok(normalize::current(&payload, &location, units, Utc::now()))
            }
            RequestKind::Forecast => {
                let window = match validated.window {
                    Some(window) => window,
                    None => forecast_window(request)?,
                };
                let payload = self.provider.fetch_forecast(at, &window, units).await?;
                let days = window.days() as usize;
                Ok(normalize::forecast(&payload, &location, units, days))
            }
            RequestKind::Alerts => {
                let payload = self.provider.fetch_alerts(at).await?;
                Ok(normalize::alerts(&payload, &location, units, Utc::now()))
            }
        }
    }

    /// Turn a location string into validated coordinates plus display values.
    ///
    /// A country carried in the string beats `country_hint`.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        location: &str,
        country_hint: Option<&str>,
    ) -> Result<ResolvedLocation, WeatherError> {
        let input = classify(location);
        let hint = country_hint.map(str::trim).filter(|c| !c.is_empty());
        debug!(?input, "classified location");

        match input {
            LocationInput::Coordinates { lat, lon } => {
                Ok(ResolvedLocation::from_coordinates(Coordinates::new(lat, lon)?))
            }
            LocationInput::PostalCode { ref value } => {
                self.geocoder.resolve_postal_code(value, hint).await
            }
            LocationInput::CityName { ref value, .. } => {
                let country = input.country().or(hint);
                self.geocoder.resolve_city(value, country).await
            }
        }
    }

    /// Current conditions for several locations at once. Per-location
    /// failures are reported in their entry; only invalid input fails the
    /// whole call.
    #[instrument(skip(self, request), fields(count = request.locations.len()))]
    pub async fn compare(&self, request: &CompareRequest) -> Result<Comparison, WeatherError> {
        if request.locations.len() < 2 {
            return Err(WeatherError::ValidationError(format!(
                "At least 2 locations are required for comparison, got {}",
                request.locations.len()
            )));
        }

        let units = self.units(request.unit_system.as_deref())?;

        let lookups = request.locations.iter().enumerate().map(|(i, location)| {
            let mut single = WeatherRequest::new(location.clone(), RequestKind::Current)
                .with_units(units.as_str());
            single.country_hint = request
                .countries
                .get(i)
                .filter(|c| !c.trim().is_empty())
                .cloned();

            async move {
                let result = self.handle(&single).await;
                ComparisonEntry::from_result(single.location_string, result)
            }
        });

        let comparison = join_all(lookups).await;
        info!(
            succeeded = comparison.iter().filter(|e| e.success).count(),
            failed = comparison.iter().filter(|e| !e.success).count(),
            "comparison finished"
        );

        Ok(Comparison { comparison, units, timestamp: Utc::now() })
    }

    fn units(&self, requested: Option<&str>) -> Result<UnitSystem, WeatherError> {
        requested.map_or(Ok(self.default_units), UnitSystem::try_from)
    }

    /// Everything that can be rejected without touching the network.
    fn validate(&self, request: &WeatherRequest) -> Result<Validated, WeatherError> {
        if request.location_string.trim().is_empty() {
            return Err(WeatherError::ValidationError(
                "Location must not be empty".to_string(),
            ));
        }

        let units = self.units(request.unit_system.as_deref())?;

        let window = match request.request_kind {
            RequestKind::Forecast => Some(forecast_window(request)?),
            RequestKind::Current | RequestKind::Alerts => None,
        };

        match classify(&request.location_string) {
            LocationInput::Coordinates { lat, lon } => {
                Coordinates::new(lat, lon)?;
            }
            LocationInput::CityName { value, .. } if value.is_empty() => {
                return Err(WeatherError::ValidationError(format!(
                    "City name must not be empty, got '{}'",
                    request.location_string
                )));
            }
            _ => {}
        }

        Ok(Validated { units, window })
    }
}

fn forecast_window(request: &WeatherRequest) -> Result<ForecastWindow, WeatherError> {
    ForecastWindow::new(
        request.days.unwrap_or(DEFAULT_FORECAST_DAYS),
        request.start_date.as_deref(),
        request.end_date.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ForecastPayload;
    use crate::provider::open_meteo::CurrentBlock;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Knows a fixed set of cities; everything else is not found.
    #[derive(Debug, Default)]
    struct FakeGeocoder {
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn resolve_city(
            &self,
            name: &str,
            country: Option<&str>,
        ) -> Result<ResolvedLocation, WeatherError> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), country.map(str::to_string)));

            let (lat, lon) = match name {
                "Paris" => (48.8566, 2.3522),
                "London" => (51.5074, -0.1278),
                _ => return Err(WeatherError::location_not_found("city name", name)),
            };
            Ok(ResolvedLocation {
                coordinates: Coordinates::new(lat, lon)?,
                name: Some(name.to_string()),
                country: country.map(str::to_string),
            })
        }

        async fn resolve_postal_code(
            &self,
            code: &str,
            _country: Option<&str>,
        ) -> Result<ResolvedLocation, WeatherError> {
            Err(WeatherError::location_not_found("postal code", code))
        }
    }

    #[derive(Debug, Default)]
    struct FakeProvider {
        fetches: AtomicUsize,
        endpoints: Mutex<Vec<&'static str>>,
    }

    impl FakeProvider {
        fn payload(&self, endpoint: &'static str) -> ForecastPayload {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.endpoints.lock().unwrap().push(endpoint);
            ForecastPayload {
                current: Some(CurrentBlock {
                    temperature_2m: Some(18.0),
                    weather_code: Some(3),
                    ..CurrentBlock::default()
                }),
                ..ForecastPayload::default()
            }
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch_current(
            &self,
            _at: Coordinates,
            _units: UnitSystem,
        ) -> Result<ForecastPayload, WeatherError> {
            Ok(self.payload("current"))
        }

        async fn fetch_forecast(
            &self,
            _at: Coordinates,
            _window: &ForecastWindow,
            _units: UnitSystem,
        ) -> Result<ForecastPayload, WeatherError> {
            Ok(self.payload("forecast"))
        }

        async fn fetch_alerts(&self, _at: Coordinates) -> Result<ForecastPayload, WeatherError> {
            Ok(self.payload("alerts"))
        }
    }

    fn service() -> (WeatherService, Arc<FakeGeocoder>, Arc<FakeProvider>) {
        let geocoder = Arc::new(FakeGeocoder::default());
        let provider = Arc::new(FakeProvider::default());
        let service = WeatherService::new(geocoder.clone(), provider.clone(), UnitSystem::Metric);
        (service, geocoder, provider)
    }

    #[tokio::test]
    async fn coordinates_skip_geocoding() {
        let (service, geocoder, _) = service();

        let report = service
            .handle(&WeatherRequest::new("40.7128,-74.0060", RequestKind::Current))
            .await
            .unwrap();

        assert_eq!(report.location.coordinates, Coordinates { lat: 40.7128, lon: -74.006 });
        assert_eq!(report.current().unwrap().weather.description, "Overcast");
        assert!(geocoder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn days_out_of_range_fail_before_fetch() {
        let (service, _, provider) = service();

        for days in [0, 17] {
            let req = WeatherRequest::new("Paris", RequestKind::Forecast).with_days(days);
            let err = service.handle(&req).await.unwrap_err();
            assert!(matches!(err, WeatherError::InvalidDays(_)));
        }
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);

        for days in [1, 16] {
            let req = WeatherRequest::new("Paris", RequestKind::Forecast).with_days(days);
            assert!(service.handle(&req).await.is_ok());
        }
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn negative_days_from_json_are_invalid_days() {
        let (service, _, provider) = service();

        let req: WeatherRequest = serde_json::from_value(serde_json::json!({
            "locationString": "Paris",
            "requestKind": "forecast",
            "days": -1
        }))
        .unwrap();
        let err = service.handle(&req).await.unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidDays);
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn each_kind_reaches_its_endpoint() {
        let (service, _, provider) = service();

        for kind in [RequestKind::Forecast, RequestKind::Alerts, RequestKind::Current] {
            let report = service.handle(&WeatherRequest::new("Paris", kind)).await.unwrap();
            match kind {
                RequestKind::Current => assert!(report.current().is_some()),
                RequestKind::Forecast => assert!(report.forecast().is_some()),
                RequestKind::Alerts => assert!(report.alerts().is_some()),
            }
        }

        let endpoints = provider.endpoints.lock().unwrap().clone();
        assert_eq!(endpoints, ["forecast", "alerts", "current"]);
    }

    #[tokio::test]
    async fn empty_city_before_country_is_rejected() {
        let (service, geocoder, _) = service();

        let err = service
            .handle(&WeatherRequest::new(" , FR", RequestKind::Current))
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::ValidationError(_)));
        assert!(geocoder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn days_are_ignored_for_current() {
        let (service, _, _) = service();
        let req = WeatherRequest::new("Paris", RequestKind::Current).with_days(99);
        assert!(service.handle(&req).await.is_ok());
    }

    #[tokio::test]
    async fn out_of_range_coordinates_fail_before_fetch() {
        let (service, _, provider) = service();

        let err = service
            .handle(&WeatherRequest::new("95.5,10", RequestKind::Current))
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::InvalidCoordinates(_)));
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bad_units_and_dates_are_validation_errors() {
        let (service, _, provider) = service();

        let err = service
            .handle(&WeatherRequest::new("Paris", RequestKind::Current).with_units("rankine"))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::InvalidUnits(_)));

        let req = WeatherRequest::new("Paris", RequestKind::Forecast)
            .with_dates(Some("2024/06/01".into()), None);
        let err = service.handle(&req).await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidDateFormat(_)));

        let err = service
            .handle(&WeatherRequest::new("   ", RequestKind::Current))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::ValidationError(_)));

        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn parsed_country_beats_hint() {
        let (service, geocoder, _) = service();

        service
            .handle(&WeatherRequest::new("Paris, FR", RequestKind::Current).with_country("US"))
            .await
            .unwrap();
        service
            .handle(&WeatherRequest::new("London", RequestKind::Current).with_country("GB"))
            .await
            .unwrap();

        let calls = geocoder.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            [
                ("Paris".to_string(), Some("FR".to_string())),
                ("London".to_string(), Some("GB".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_city_is_location_not_found() {
        let (service, _, provider) = service();

        let err = service
            .handle(&WeatherRequest::new("Nowhereville12345xyz", RequestKind::Current))
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::LocationNotFound(_)));
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn compare_reports_each_location_in_order() {
        let (service, _, _) = service();

        let request = CompareRequest {
            locations: vec!["Paris".into(), "Atlantis".into(), "London".into()],
            countries: vec!["FR".into()],
            unit_system: Some("imperial".into()),
        };
        let result = service.compare(&request).await.unwrap();

        let outcome: Vec<(&str, bool)> = result
            .comparison
            .iter()
            .map(|e| (e.location.as_str(), e.success))
            .collect();
        assert_eq!(outcome, [("Paris", true), ("Atlantis", false), ("London", true)]);

        assert_eq!(result.units, UnitSystem::Imperial);
        assert_eq!(result.comparison[0].data.as_ref().unwrap().location.country, "FR");
        assert_eq!(
            result.comparison[1].error.as_ref().unwrap().error_kind,
            crate::error::ErrorKind::LocationNotFound
        );
        assert_eq!(result.comparison[2].data.as_ref().unwrap().units.temperature, "°F");
    }

    #[tokio::test]
    async fn compare_needs_two_locations() {
        let (service, _, _) = service();

        let request = CompareRequest {
            locations: vec!["Paris".into()],
            ..CompareRequest::default()
        };
        let err = service.compare(&request).await.unwrap_err();
        assert!(matches!(err, WeatherError::ValidationError(_)));
    }

    #[test]
    fn from_config_rejects_invalid_config() {
        let cfg = Config { timeout_seconds: 0, ..Config::default() };
        assert!(WeatherService::from_config(&cfg).is_err());
        assert!(WeatherService::from_config(&Config::default()).is_ok());
    }
}
