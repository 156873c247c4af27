use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub yolink: YoLinkConfig,
    pub server: ServerConfig,
    pub intervals: IntervalConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the per-level rolling log files. Console only when unset.
    pub directory: Option<String>,
    pub debug_file: String,
    pub info_file: String,
    pub warn_file: String,
    pub error_file: String,
    pub console_level: String,
}

#[derive(Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct YoLinkConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_url: String,
    pub token_url: String,
    pub broker_host: String,
    pub broker_port: u16,
    /// Fraction of the advertised token lifetime after which it is refreshed.
    pub token_safety_fraction: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct IntervalConfig {
    pub reconnect_delay_seconds: u64,
    pub mqtt_keep_alive_seconds: u64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub update_feed_size: usize,
    pub session_queue_size: usize,
    pub mqtt_queue_size: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            debug_file: "log_debug.log".to_string(),
            info_file: "log_info.log".to_string(),
            warn_file: "log_warn.log".to_string(),
            error_file: "log_error.log".to_string(),
            console_level: "info".to_string(),
        }
    }
}

impl Default for YoLinkConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_url: "https://api.yosmart.com/open/yolink/v2/api".to_string(),
            token_url: "https://api.yosmart.com/open/yolink/token".to_string(),
            broker_host: "api.yosmart.com".to_string(),
            broker_port: 8003,
            token_safety_fraction: 0.9,
        }
    }
}

// Hand-written so the client secret never reaches a log line.
impl std::fmt::Debug for YoLinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoLinkConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("api_url", &self.api_url)
            .field("token_url", &self.token_url)
            .field("broker_host", &self.broker_host)
            .field("broker_port", &self.broker_port)
            .field("token_safety_fraction", &self.token_safety_fraction)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            static_dir: "../frontend/public".to_string(),
        }
    }
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_seconds: 5,
            mqtt_keep_alive_seconds: 30,
            request_timeout_seconds: 30,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            update_feed_size: 100,
            session_queue_size: 100,
            mqtt_queue_size: 100,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Unable to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Reads `path` when it exists, then layers the process environment on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overrides fields from environment lookups. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(client_id) = lookup("YOLINK_CLIENT_ID") {
            self.yolink.client_id = Some(client_id);
        }
        if let Some(client_secret) = lookup("YOLINK_CLIENT_SECRET") {
            self.yolink.client_secret = Some(client_secret);
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got \"{}\"", port))?;
        }
        if let Some(static_dir) = lookup("STATIC_DIR") {
            self.server.static_dir = static_dir;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let mut config = Config::default();
        config.apply_env(env(&[])).unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.yolink.client_id.is_none());
        assert_eq!(config.yolink.broker_port, 8003);
        assert_eq!(config.limits.session_queue_size, 100);
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[yolink]\nclient_id = \"from-file\"\n"
        )
        .unwrap();

        let mut config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.yolink.client_id.as_deref(), Some("from-file"));
        // untouched sections keep their defaults
        assert_eq!(config.intervals.reconnect_delay_seconds, 5);

        config
            .apply_env(env(&[
                ("YOLINK_CLIENT_ID", "from-env"),
                ("YOLINK_CLIENT_SECRET", "s3cret"),
                ("PORT", "8181"),
            ]))
            .unwrap();
        assert_eq!(config.yolink.client_id.as_deref(), Some("from-env"));
        assert_eq!(config.yolink.client_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.server.port, 8181);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("YOLINK_CLIENT_ID", ""), ("PORT", "")]))
            .unwrap();
        assert!(config.yolink.client_id.is_none());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn debug_output_hides_secret() {
        let mut config = YoLinkConfig::default();
        config.client_secret = Some("hunter2".to_string());
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
