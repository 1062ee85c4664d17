use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Select, Text};
use serde::Serialize;
use std::{path::PathBuf, process::ExitCode};
use tracing::debug;
use weather_core::{CompareRequest, Config, RequestKind, UnitSystem, WeatherRequest, WeatherService};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather",
    version,
    about = "Weather by city name, postal code or coordinates"
)]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct Target {
    /// City ("Paris", "Paris, FR"), postal code ("10001") or "lat,lon".
    pub location: String,

    /// Country used to disambiguate city names and postal codes.
    #[arg(long)]
    pub country: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current conditions.
    Current {
        #[command(flatten)]
        target: Target,

        /// metric, imperial or kelvin.
        #[arg(long)]
        units: Option<String>,
    },

    /// Daily and hourly forecast.
    Forecast {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        units: Option<String>,

        /// Number of days, 1 to 16 (default 5).
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,

        /// First day, YYYY-MM-DD.
        #[arg(long)]
        start_date: Option<String>,

        /// Last day, YYYY-MM-DD.
        #[arg(long)]
        end_date: Option<String>,
    },

    /// Active weather alerts.
    Alerts {
        #[command(flatten)]
        target: Target,
    },

    /// Current conditions for several locations side by side.
    Compare {
        #[arg(required = true)]
        locations: Vec<String>,

        /// Country for the location at the same position; repeatable.
        #[arg(long = "country")]
        countries: Vec<String>,

        #[arg(long)]
        units: Option<String>,
    },

    /// Interactively edit the configuration file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        let request = match self.command {
            Command::Configure => {
                configure(&path)?;
                return Ok(ExitCode::SUCCESS);
            }
            Command::Current { target, units } => {
                Query::Single(target.request(RequestKind::Current, units))
            }
            Command::Forecast { target, units, days, start_date, end_date } => {
                let mut request = target
                    .request(RequestKind::Forecast, units)
                    .with_dates(start_date, end_date);
                request.days = days;
                Query::Single(request)
            }
            Command::Alerts { target } => {
                Query::Single(target.request(RequestKind::Alerts, None))
            }
            Command::Compare { locations, countries, units } => Query::Compare(CompareRequest {
                locations,
                countries,
                unit_system: units,
            }),
        };

        let mut config = Config::load_from(&path)?;
        config.apply_env()?;
        debug!(path = %path.display(), ?config, "configuration loaded");

        let service = WeatherService::from_config(&config)?;

        let outcome = match &request {
            Query::Single(request) => service.handle(request).await.map(|r| print_json(&r)),
            Query::Compare(request) => service.compare(request).await.map(|c| print_json(&c)),
        };

        match outcome {
            Ok(printed) => {
                printed?;
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                print_json(&err.to_response())?;
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

enum Query {
    Single(WeatherRequest),
    Compare(CompareRequest),
}

impl Target {
    fn request(self, kind: RequestKind, units: Option<String>) -> WeatherRequest {
        let mut request = WeatherRequest::new(self.location, kind);
        request.country_hint = self.country;
        request.unit_system = units;
        request
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
    println!("{out}");
    Ok(())
}

fn configure(path: &std::path::Path) -> anyhow::Result<()> {
    let mut cfg = Config::load_from(path)?;

    cfg.timeout_seconds = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(cfg.timeout_seconds)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()?;

    let systems = UnitSystem::all().to_vec();
    let cursor = systems.iter().position(|u| *u == cfg.default_units).unwrap_or(0);
    cfg.default_units = Select::new("Default units:", systems)
        .with_starting_cursor(cursor)
        .prompt()?;

    cfg.providers.forecast_url = Text::new("Forecast API base URL:")
        .with_default(&cfg.providers.forecast_url)
        .prompt()?;

    cfg.validate()?;
    cfg.save_to(path)?;

    println!("Configuration saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_flags() {
        let cli = Cli::try_parse_from([
            "weather", "forecast", "Paris, FR", "--days", "3", "--units", "imperial", "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Forecast { target, units, days, .. } => {
                assert_eq!(target.location, "Paris, FR");
                assert_eq!(units.as_deref(), Some("imperial"));
                assert_eq!(days, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn negative_days_reach_validation() {
        let cli = Cli::try_parse_from(["weather", "forecast", "Paris", "--days", "-1"])
            .unwrap();

        let Command::Forecast { target, days, .. } = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(days, Some(-1));

        let mut request = target.request(RequestKind::Forecast, None);
        request.days = days;

        let service = WeatherService::from_config(&Config::default()).unwrap();
        let err = service.handle(&request).await.unwrap_err();
        let body = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(body["errorKind"], "InvalidDays");
    }

    #[test]
    fn compare_collects_repeated_countries() {
        let cli = Cli::try_parse_from([
            "weather", "compare", "Paris", "London", "--country", "FR", "--country", "GB",
        ])
        .unwrap();

        match cli.command {
            Command::Compare { locations, countries, units } => {
                assert_eq!(locations, ["Paris", "London"]);
                assert_eq!(countries, ["FR", "GB"]);
                assert_eq!(units, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn target_builds_request() {
        let target = Target { location: "10001".into(), country: Some("US".into()) };
        let request = target.request(RequestKind::Alerts, None);

        assert_eq!(request.location_string, "10001");
        assert_eq!(request.country_hint.as_deref(), Some("US"));
        assert_eq!(request.request_kind, RequestKind::Alerts);
        assert_eq!(request.unit_system, None);
    }
}
