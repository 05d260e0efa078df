use game_core::ExpiryPolicy;
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("Invalid APP_BASE_URL {value}: {source}")]
    BaseUrl {
        value: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rankings_path: String,
    /// Page the deep links point at; validated on load.
    pub app_base_url: String,
    pub heartbeat_interval_seconds: u64,
    pub poll_interval_seconds: u64,
    pub invitation_ttl_seconds: u64,
    pub presence_window_minutes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_base_url =
            lookup("APP_BASE_URL").unwrap_or_else(|| "http://localhost:8080/".to_string());
        Url::parse(&app_base_url).map_err(|source| ConfigError::BaseUrl {
            value: app_base_url.clone(),
            source,
        })?;

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://weatherguessr.db?mode=rwc".to_string()),
            rankings_path: lookup("RANKINGS_PATH")
                .unwrap_or_else(|| "./data/rankings.json".to_string()),
            app_base_url,
            heartbeat_interval_seconds: parse_positive(&lookup, "HEARTBEAT_INTERVAL_SECONDS", 30)?,
            poll_interval_seconds: parse_positive(&lookup, "POLL_INTERVAL_SECONDS", 10)?,
            invitation_ttl_seconds: parse_positive(&lookup, "INVITATION_TTL_SECONDS", 300)?,
            presence_window_minutes: parse_positive(&lookup, "PRESENCE_WINDOW_MINUTES", 30)?,
        })
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy::new(
            chrono::Duration::seconds(self.invitation_ttl_seconds as i64),
            chrono::Duration::minutes(self.presence_window_minutes as i64),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            rankings_path: "./data/rankings.json".to_string(),
            app_base_url: "http://localhost:8080/".to_string(),
            heartbeat_interval_seconds: 30,
            poll_interval_seconds: 10,
            invitation_ttl_seconds: 300,
            presence_window_minutes: 30,
        }
    }
}

fn parse_positive<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(ConfigError::Invalid { name, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.rankings_path, "./data/rankings.json");
        assert_eq!(config.expiry_policy(), ExpiryPolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("POLL_INTERVAL_SECONDS", "2"),
            ("INVITATION_TTL_SECONDS", "60"),
            ("APP_BASE_URL", "https://weatherguessr.example/play"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval_seconds, 2);
        assert_eq!(
            config.expiry_policy().invitation_ttl,
            chrono::Duration::seconds(60)
        );
        assert_eq!(config.app_base_url, "https://weatherguessr.example/play");
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[("HEARTBEAT_INTERVAL_SECONDS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "HEARTBEAT_INTERVAL_SECONDS",
                ..
            }
        ));
        assert!(Config::from_lookup(lookup(&[("POLL_INTERVAL_SECONDS", "0")])).is_err());
        assert!(matches!(
            Config::from_lookup(lookup(&[("APP_BASE_URL", "not a url")])),
            Err(ConfigError::BaseUrl { .. })
        ));
    }
}
