use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub metrics: MetricsConfig,
}

impl ClientConfig {
    pub fn load() -> CommonResult<Self> {
        Figment::from(Toml::string(DEFAULT_CONFIG))
            .admerge(Env::prefixed("SPANNER__").map(|p| p.as_str().replace("__", ".").into()))
            .extract()
            .map_err(|e| CommonError::InvalidArgument(e.to_string()))
    }
}

/// Client-side metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Record attempt and operation metrics.
    pub enabled: bool,
    /// Record latency and connectivity metrics for the Google Front End hop.
    pub gfe_enabled: bool,
}

/// Environment variables for client configuration.
pub struct ClientConfigEnv;

impl ClientConfigEnv {
    pub const METRICS_ENABLED: &'static str = "SPANNER__METRICS__ENABLED";
    pub const METRICS_GFE_ENABLED: &'static str = "SPANNER__METRICS__GFE_ENABLED";
}
