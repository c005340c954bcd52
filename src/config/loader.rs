//! Configuration loading from disk.

use std::fs;
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::HarnessConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the file as TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but the values are unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: HarnessConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Semantic checks the schema cannot express.
pub fn validate(config: &HarnessConfig) -> Result<(), ConfigError> {
    if config.endpoints.proxy_port == 0 || config.endpoints.target_port == 0 {
        return Err(ConfigError::Invalid("endpoint ports must be non-zero".to_string()));
    }
    if config.endpoints.proxy_port == config.endpoints.target_port {
        return Err(ConfigError::Invalid(format!(
            "proxy and target ports must differ (both are {})",
            config.endpoints.proxy_port
        )));
    }
    if config.network.raw_probe_port == 0 {
        return Err(ConfigError::Invalid("raw_probe_port must be non-zero".to_string()));
    }

    let addrs = [
        ("endpoints.bind_host", &config.endpoints.bind_host),
        ("network.host_unreachable_addr", &config.network.host_unreachable_addr),
        ("network.net_unreachable_addr", &config.network.net_unreachable_addr),
        ("network.blackhole_addr", &config.network.blackhole_addr),
    ];
    for (field, addr) in addrs {
        if addr.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "{} `{}` is not an IP address",
                field, addr
            )));
        }
    }

    if config.timeouts.probe_secs == 0 {
        return Err(ConfigError::Invalid("probe_secs must be non-zero".to_string()));
    }
    // Upstream timeouts must resolve while the probe is still watching,
    // otherwise every slow upstream looks like a probe timeout.
    if config.timeouts.upstream_secs >= config.timeouts.probe_secs {
        return Err(ConfigError::Invalid(format!(
            "upstream_secs ({}) must be below probe_secs ({})",
            config.timeouts.upstream_secs, config.timeouts.probe_secs
        )));
    }

    Ok(())
}
