use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::collaborators::address::VIACEP_BASE_URL;
use crate::proposals::CreditorProfile;

const DEFAULT_LOCAL_STORE: &str = "data/proposals.json";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

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
    pub storage: StorageConfig,
    pub notify: NotifyConfig,
    pub integrations: IntegrationsConfig,
    pub access: AccessConfig,
    pub creditor: CreditorProfile,
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

        let timeout_secs = match optional("REMOTE_STORE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout { value: raw })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let storage = StorageConfig {
            local_path: optional("LOCAL_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_STORE)),
            remote_url: optional("REMOTE_STORE_URL"),
            timeout: Duration::from_secs(timeout_secs),
        };

        let notify = NotifyConfig {
            webhook_url: optional("NOTIFY_WEBHOOK_URL"),
            recipient: optional("NOTIFY_RECIPIENT").unwrap_or_default(),
        };

        let integrations = IntegrationsConfig {
            address_lookup_url: optional("ADDRESS_LOOKUP_URL")
                .unwrap_or_else(|| VIACEP_BASE_URL.to_string()),
            assistant_api_key: optional("ASSISTANT_API_KEY"),
        };

        let access = AccessConfig {
            staff_tokens: parse_staff_tokens(&env::var("STAFF_TOKENS").unwrap_or_default())?,
        };

        let creditor = CreditorProfile {
            name: optional("CREDITOR_NAME").unwrap_or_default(),
            qualification: optional("CREDITOR_QUALIFICATION").unwrap_or_default(),
            tax_id: optional("CREDITOR_TAX_ID").unwrap_or_default(),
            city: optional("CONTRACT_CITY").unwrap_or_default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage,
            notify,
            integrations,
            access,
            creditor,
        })
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `subject:token` pairs separated by commas. A bare token is granted to subject `staff`.
fn parse_staff_tokens(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((subject, token)) if !subject.trim().is_empty() && !token.trim().is_empty() => {
                Ok((subject.trim().to_string(), token.trim().to_string()))
            }
            Some(_) => Err(ConfigError::InvalidStaffToken {
                entry: entry.to_string(),
            }),
            None => Ok(("staff".to_string(), entry.to_string())),
        })
        .collect()
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

/// Where proposal records live. `remote_url` unset means the local file is the store of record.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub local_path: PathBuf,
    pub remote_url: Option<String>,
    /// Applied to every outbound HTTP call, not only the remote store.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    pub recipient: String,
}

#[derive(Debug, Clone)]
pub struct IntegrationsConfig {
    pub address_lookup_url: String,
    pub assistant_api_key: Option<String>,
}

#[derive(Clone)]
pub struct AccessConfig {
    pub staff_tokens: Vec<(String, String)>,
}

impl fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subjects: Vec<&str> = self
            .staff_tokens
            .iter()
            .map(|(subject, _)| subject.as_str())
            .collect();
        f.debug_struct("AccessConfig")
            .field("staff_subjects", &subjects)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout { value: String },
    InvalidStaffToken { entry: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout { value } => write!(
                f,
                "REMOTE_STORE_TIMEOUT_SECS must be a positive integer, got '{value}'"
            ),
            ConfigError::InvalidStaffToken { entry } => {
                let subject = entry.split(':').next().unwrap_or_default();
                write!(
                    f,
                    "STAFF_TOKENS entry for '{subject}' must be formatted as subject:token"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout { .. }
            | ConfigError::InvalidStaffToken { .. } => None,
        }
    }
}
