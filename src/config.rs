use crate::models::AppConfig;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Arc<AppConfig>, String> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

    let mut config = parse_config(&contents)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;

    log_config(&config);
    Ok(Arc::new(config))
}

/// Parse a YAML document; missing sections take their defaults
pub fn parse_config(contents: &str) -> Result<AppConfig, String> {
    serde_yaml::from_str(contents).map_err(|e| format!("Failed to parse YAML config: {}", e))
}

/// Apply `PORT`, `SESSION_TTL_SECS`, `REAPER_INTERVAL_SECS`, `SESSION_EXPIRY_BASIS`
/// and `DISPLAY_TIMEZONE` on top of the file values
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), String>
where
    F: Fn(&str) -> Option<String>,
{
    fn parsed<T: std::str::FromStr>(key: &str, value: String) -> Result<T, String> {
        value
            .trim()
            .parse()
            .map_err(|_| format!("Invalid value '{}' for {}", value, key))
    }

    if let Some(value) = lookup("PORT") {
        config.server.port = parsed("PORT", value)?;
    }
    if let Some(value) = lookup("SESSION_TTL_SECS") {
        config.session.ttl_secs = parsed("SESSION_TTL_SECS", value)?;
    }
    if let Some(value) = lookup("REAPER_INTERVAL_SECS") {
        config.session.reaper_interval_secs = parsed("REAPER_INTERVAL_SECS", value)?;
    }
    if let Some(value) = lookup("SESSION_EXPIRY_BASIS") {
        config.session.expiry_basis = value.parse()?;
    }
    if let Some(value) = lookup("DISPLAY_TIMEZONE") {
        config.display.timezone = value.trim().to_string();
    }

    Ok(())
}

/// Load configuration with fallback options
pub fn load_config_with_fallback() -> Result<Arc<AppConfig>, String> {
    // Try loading from environment variable first
    if let Ok(config_path) = std::env::var("CONFIG_PATH") {
        match load_config(&config_path) {
            Ok(config) => return Ok(config),
            Err(e) => warn!(
                "Failed to load config from CONFIG_PATH ({}): {}",
                config_path, e
            ),
        }
    }

    // Try common config file locations
    let paths = ["config.yaml", "config.yml"];

    for path in paths {
        if Path::new(path).exists() {
            match load_config(path) {
                Ok(config) => return Ok(config),
                Err(e) => warn!("Failed to load config from '{}': {}", path, e),
            }
        }
    }

    info!("No configuration file found, using defaults");
    let mut config = AppConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;

    log_config(&config);
    Ok(Arc::new(config))
}

fn log_config(config: &AppConfig) {
    info!(
        "Sessions expire after {}s ({:?} basis), reaper runs every {}s",
        config.session.ttl_secs, config.session.expiry_basis, config.session.reaper_interval_secs
    );
    info!(
        "Timestamps displayed in {} (status refresh: {})",
        config.display.timezone, config.display.refresh_on_status
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ExpiryBasis;
    use std::collections::HashMap;

    #[test]
    fn test_load_valid_config() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
session:
  ttl_secs: 60
  reaper_interval_secs: 15
  expiry_basis: created
display:
  timezone: "UTC"
  refresh_on_status: true
"#;

        let config = parse_config(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.session.ttl_secs, 60);
        assert_eq!(config.session.reaper_interval_secs, 15);
        assert_eq!(config.session.expiry_basis, ExpiryBasis::Created);
        assert!(config.display.refresh_on_status);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config("session:\n  ttl_secs: 90\n").unwrap();

        assert_eq!(config.session.ttl_secs, 90);
        assert_eq!(config.session.reaper_interval_secs, 60);
        assert_eq!(config.session.expiry_basis, ExpiryBasis::LastAccess);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.display.timezone, "America/Mexico_City");
    }

    #[test]
    fn test_config_validation_rejects_zero_ttl() {
        let mut config = AppConfig::default();
        config.session.ttl_secs = 0;

        let result = config.validate();
        assert!(result.unwrap_err().contains("ttl_secs"));
    }

    #[test]
    fn test_config_validation_rejects_out_of_range_ttl() {
        let mut config = AppConfig::default();
        let max = i64::MAX.to_string();
        apply_env_overrides(&mut config, |key| {
            (key == "SESSION_TTL_SECS").then(|| max.clone())
        })
        .unwrap();

        let result = config.validate();
        assert!(result.unwrap_err().contains("out of range"));
    }

    #[test]
    fn test_config_validation_caps_reaper_interval() {
        let mut config = AppConfig::default();
        config.session.reaper_interval_secs = u64::MAX;

        let result = config.validate();
        assert!(result.unwrap_err().contains("reaper_interval_secs"));
    }

    #[test]
    fn test_config_validation_rejects_unknown_timezone() {
        let mut config = AppConfig::default();
        config.display.timezone = "Mars/Olympus_Mons".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().contains("Mars/Olympus_Mons"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "4000"),
            ("SESSION_TTL_SECS", "300"),
            ("SESSION_EXPIRY_BASIS", "created"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.session.ttl_secs, 300);
        assert_eq!(config.session.expiry_basis, ExpiryBasis::Created);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = AppConfig::default();
        let result = apply_env_overrides(&mut config, |key| {
            (key == "REAPER_INTERVAL_SECS").then(|| "soon".to_string())
        });

        assert!(result.unwrap_err().contains("REAPER_INTERVAL_SECS"));
    }
}
