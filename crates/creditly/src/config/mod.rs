use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Business identity shown in prompts, contracts and the root endpoint.
pub const BRAND_NAME: &str = "Creditly Global";
pub const BRAND_DOMAIN: &str = "creditlyglobal.com";
pub const BRAND_EMAIL: &str = "info@creditlyglobal.com";
pub const BRAND_PHONE: &str = "+971 4 887 1190";

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
            "dev" | "development" => Self::Development,
            "test" | "ci" => Self::Test,
            _ => Self::Production,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Test => "test",
            AppEnvironment::Production => "production",
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub brand: BrandConfig,
    pub chat: ChatConfig,
    pub submission: SubmissionConfig,
    pub drafts: DraftsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "production".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let base_url = non_empty_var("APP_BASE_URL")
            .unwrap_or_else(|| format!("https://{BRAND_DOMAIN}"))
            .trim_end_matches('/')
            .to_string();

        let chat = ChatConfig {
            api_key: non_empty_var("OPENAI_API_KEY"),
            model: non_empty_var("OPENAI_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            api_base: non_empty_var("OPENAI_API_BASE")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: seconds_var("CHAT_TIMEOUT_SECS", 30)?,
        };

        let submission = SubmissionConfig {
            endpoint: non_empty_var("SUBMISSION_ENDPOINT")
                .unwrap_or_else(|| format!("{base_url}/api/v1/requests")),
            timeout: seconds_var("SUBMISSION_TIMEOUT_SECS", 30)?,
        };

        let drafts = DraftsConfig {
            dir: PathBuf::from(
                non_empty_var("DRAFTS_DIR").unwrap_or_else(|| ".creditly/drafts".to_string()),
            ),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            brand: BrandConfig::standard(base_url),
            chat,
            submission,
            drafts,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn seconds_var(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match non_empty_var(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::InvalidTimeout { key }),
        },
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandConfig {
    pub name: String,
    pub domain: String,
    pub email: String,
    pub phone: String,
    pub base_url: String,
}

impl BrandConfig {
    pub fn standard(base_url: impl Into<String>) -> Self {
        Self {
            name: BRAND_NAME.to_string(),
            domain: BRAND_DOMAIN.to_string(),
            email: BRAND_EMAIL.to_string(),
            phone: BRAND_PHONE.to_string(),
            base_url: base_url.into(),
        }
    }

    /// Browser origins allowed to call the API.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![
            "http://localhost:3000".to_string(),
            "http://localhost:5173".to_string(),
            format!("https://{}", self.domain),
            format!("https://www.{}", self.domain),
        ];
        if !origins.contains(&self.base_url) {
            origins.push(self.base_url.clone());
        }
        origins
    }
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self::standard(format!("https://{BRAND_DOMAIN}"))
    }
}

/// Upstream chat-completion provider.
#[derive(Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DraftsConfig {
    pub dir: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout { key } => {
                write!(f, "{key} must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidTimeout { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
