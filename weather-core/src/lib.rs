//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Location classification and geocoding (postal codes, city names, coordinates)
//! - The Open-Meteo forecast client and its raw payloads
//! - Normalization into a stable, unit-labelled output shape
//! - [`WeatherService`], which ties validation, resolution and fetching together
//! - Configuration handling and the error taxonomy
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod codes;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod service;
pub mod units;

pub use config::{Config, ProvidersConfig};
pub use error::{ErrorKind, ErrorResponse, WeatherError};
pub use location::{Coordinates, LocationInput, ResolvedLocation, classify};
pub use model::{
    CompareRequest, Comparison, ComparisonEntry, ForecastWindow, RequestKind, WeatherReport,
    WeatherRequest,
};
pub use provider::{Geocoder, ProviderId, WeatherProvider};
pub use service::WeatherService;
pub use units::UnitSystem;
