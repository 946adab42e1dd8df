use crate::catalog::{KeyPolicy, MatchConfig, MatchConfigError, DEFAULT_THRESHOLD};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PLACEHOLDER_URL: &str = "https://via.placeholder.com/300x400?text=No+Photo";
pub const DEFAULT_MAX_ROSTER: usize = 5_000;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            catalog: CatalogConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the roster and photos live and how names are matched.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub roster_path: PathBuf,
    pub static_dir: PathBuf,
    pub photo_subdir: String,
    pub placeholder_url: String,
    pub max_roster: usize,
    pub matching: MatchConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            roster_path: PathBuf::from("List.xlsx"),
            static_dir: PathBuf::from("static"),
            photo_subdir: "KOL_Picture".to_string(),
            placeholder_url: DEFAULT_PLACEHOLDER_URL.to_string(),
            max_roster: DEFAULT_MAX_ROSTER,
            matching: MatchConfig::default(),
        }
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let threshold = match env::var("KOL_MATCH_THRESHOLD") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|_| ConfigError::InvalidThreshold(raw.clone()))?,
            Err(_) => DEFAULT_THRESHOLD,
        };

        let key_policy = match env::var("KOL_KEY_POLICY") {
            Ok(raw) => KeyPolicy::parse(&raw).ok_or(ConfigError::InvalidKeyPolicy(raw))?,
            Err(_) => KeyPolicy::default(),
        };

        let max_roster = match env::var("KOL_MAX_ROSTER") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => return Err(ConfigError::InvalidRosterLimit(raw)),
            },
            Err(_) => defaults.max_roster,
        };

        let matching = MatchConfig {
            threshold,
            partial_scoring: env_flag("KOL_PARTIAL_SCORING", true)?,
            containment_fallback: env_flag("KOL_CONTAINMENT_FALLBACK", true)?,
            key_policy,
        };
        matching.validate().map_err(ConfigError::Matching)?;

        Ok(Self {
            roster_path: env::var("KOL_ROSTER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.roster_path),
            static_dir: env::var("KOL_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            photo_subdir: env::var("KOL_PHOTO_SUBDIR").unwrap_or(defaults.photo_subdir),
            placeholder_url: env::var("KOL_PLACEHOLDER_URL").unwrap_or(defaults.placeholder_url),
            max_roster,
            matching,
        })
    }

    pub fn photo_dir(&self) -> PathBuf {
        self.static_dir.join(&self.photo_subdir)
    }

    /// URL prefix under which photos are served.
    pub fn photo_route(&self) -> String {
        format!("/static/{}", self.photo_subdir.trim_matches('/'))
    }
}

fn env_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name, value: raw }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidThreshold(String),
    InvalidKeyPolicy(String),
    InvalidRosterLimit(String),
    InvalidFlag { name: &'static str, value: String },
    Matching(MatchConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidThreshold(value) => {
                write!(f, "KOL_MATCH_THRESHOLD must be a number, got '{}'", value)
            }
            ConfigError::InvalidKeyPolicy(value) => write!(
                f,
                "KOL_KEY_POLICY must be 'compact' or 'spaced', got '{}'",
                value
            ),
            ConfigError::InvalidRosterLimit(value) => write!(
                f,
                "KOL_MAX_ROSTER must be a positive integer, got '{}'",
                value
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{} must be true or false, got '{}'", name, value)
            }
            ConfigError::Matching(err) => write!(f, "invalid matching settings: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Matching(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "KOL_ROSTER_PATH",
            "KOL_STATIC_DIR",
            "KOL_PHOTO_SUBDIR",
            "KOL_PLACEHOLDER_URL",
            "KOL_MATCH_THRESHOLD",
            "KOL_KEY_POLICY",
            "KOL_PARTIAL_SCORING",
            "KOL_CONTAINMENT_FALLBACK",
            "KOL_MAX_ROSTER",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.catalog, CatalogConfig::default());
        assert_eq!(config.catalog.photo_dir(), PathBuf::from("static/KOL_Picture"));
        assert_eq!(config.catalog.photo_route(), "/static/KOL_Picture");
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_matching_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("KOL_MATCH_THRESHOLD", "0.7");
        env::set_var("KOL_KEY_POLICY", "spaced");
        env::set_var("KOL_CONTAINMENT_FALLBACK", "off");
        env::set_var("KOL_MAX_ROSTER", "250");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.catalog.matching.threshold, 0.7);
        assert_eq!(config.catalog.matching.key_policy, KeyPolicy::Spaced);
        assert!(config.catalog.matching.partial_scoring);
        assert!(!config.catalog.matching.containment_fallback);
        assert_eq!(config.catalog.max_roster, 250);
    }

    #[test]
    fn rejects_invalid_matching_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        env::set_var("KOL_MATCH_THRESHOLD", "1.4");
        assert!(matches!(AppConfig::load(), Err(ConfigError::Matching(_))));

        env::set_var("KOL_MATCH_THRESHOLD", "high");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidThreshold(_))
        ));
        reset_env();

        env::set_var("KOL_PARTIAL_SCORING", "maybe");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFlag {
                name: "KOL_PARTIAL_SCORING",
                ..
            })
        ));
        reset_env();

        env::set_var("KOL_MAX_ROSTER", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidRosterLimit(_))
        ));
        reset_env();
    }
}
