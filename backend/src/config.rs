use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::battery::DEFAULT_CHARGER_POWER_KW;
use crate::error::ConfigError;
use crate::snapping::DEFAULT_SNAP_RADIUS_M;

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1/lookup";

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// When set, snapping, routing and elevation run against this local graph.
    pub road_network: Option<PathBuf>,
    pub osrm_url: String,
    pub elevation_url: String,
    pub snap_radius_m: f64,
    pub charger_power_kw: f64,
    pub http_timeout: Duration,
    pub cluster_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            road_network: None,
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            elevation_url: DEFAULT_ELEVATION_URL.to_string(),
            snap_radius_m: DEFAULT_SNAP_RADIUS_M,
            charger_power_kw: DEFAULT_CHARGER_POWER_KW,
            http_timeout: Duration::from_secs(10),
            cluster_seed: 42,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let snap_radius_m = parse(&lookup, "SNAP_RADIUS_M")?.unwrap_or(defaults.snap_radius_m);
        let charger_power_kw =
            parse(&lookup, "CHARGER_POWER_KW")?.unwrap_or(defaults.charger_power_kw);
        check_positive("SNAP_RADIUS_M", snap_radius_m)?;
        check_positive("CHARGER_POWER_KW", charger_power_kw)?;

        Ok(Self {
            bind_addr: parse(&lookup, "BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            road_network: lookup("ROAD_NETWORK_JSON")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            osrm_url: lookup("OSRM_URL").unwrap_or(defaults.osrm_url),
            elevation_url: lookup("ELEVATION_URL").unwrap_or(defaults.elevation_url),
            snap_radius_m,
            charger_power_kw,
            http_timeout: parse(&lookup, "HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            cluster_seed: parse(&lookup, "CLUSTER_SEED")?.unwrap_or(defaults.cluster_seed),
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value })
        })
        .transpose()
}

fn check_positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
    }
}
