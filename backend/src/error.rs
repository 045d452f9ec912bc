use thiserror::Error;

/// Input errors raised by the planning core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    #[error("target battery {target}% is below current battery {current}%")]
    InvalidRange { current: f64, target: f64 },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("at least one route is required")]
    NoRoutes,
    #[error("number of stations must be at least 1")]
    NoStations,
}

/// Failures of the HTTP adapters. Never leaves the adapter that produced it.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned no result")]
    EmptyResponse,
    #[error("expected {expected} results, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

/// Failures while assembling the server state at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Network(#[from] crate::network::NetworkError),
    #[error(transparent)]
    Campus(#[from] crate::campus::CampusError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
