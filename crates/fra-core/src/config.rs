//! Configuration module
//!
//! Configuration is read from the environment (optionally seeded from a `.env` file) into
//! typed structs, then validated once at startup so misconfiguration fails fast.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{
    api_prefix, DEFAULT_API_VERSION, DEFAULT_MAX_FILES_PER_REQUEST, DEFAULT_MAX_FILE_SIZE_BYTES,
};
use crate::formats::FileFormat;
use crate::storage_types::StorageBackend;
use crate::validation::UploadPolicy;

const SERVER_PORT: u16 = 5000;
const MAX_FILE_SIZE_MB: usize = DEFAULT_MAX_FILE_SIZE_BYTES / 1024 / 1024;
const INGEST_TIMEOUT_SECS: u64 = 60;
const STORAGE_CONNECT_RETRIES: u32 = 5;
const STORAGE_CONNECT_RETRY_DELAY_MS: u64 = 5000;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Settings shared by every HTTP service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub api_version: String,
    pub http_concurrency_limit: usize,
}

/// Upload and storage settings
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub base: BaseConfig,
    pub storage_backend: StorageBackend,
    pub local_storage_path: PathBuf,
    pub local_storage_base_url: String,
    /// Where in-flight uploads are staged before commit; defaults to `<local_storage_path>/.staging`.
    pub staging_path: Option<PathBuf>,
    pub max_file_size_bytes: usize,
    pub max_files_per_request: usize,
    pub allowed_formats: Vec<FileFormat>,
    pub ingest_timeout_secs: u64,
    pub storage_connect_retries: u32,
    pub storage_connect_retry_delay_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["http://localhost:3000".to_string()],
                environment: "development".to_string(),
                api_version: DEFAULT_API_VERSION.to_string(),
                http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            },
            storage_backend: StorageBackend::Local,
            local_storage_path: PathBuf::from("public"),
            local_storage_base_url: "/public".to_string(),
            staging_path: None,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_files_per_request: DEFAULT_MAX_FILES_PER_REQUEST,
            allowed_formats: FileFormat::ALL.to_vec(),
            ingest_timeout_secs: INGEST_TIMEOUT_SECS,
            storage_connect_retries: STORAGE_CONNECT_RETRIES,
            storage_connect_retry_delay_ms: STORAGE_CONNECT_RETRY_DELAY_MS,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, anyhow::Error> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", key, raw)),
        _ => Ok(default),
    }
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| defaults.base.environment.clone());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| defaults.base.cors_origins.clone());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse::<StorageBackend>()?,
            Err(_) => defaults.storage_backend,
        };

        let local_storage_path = env::var("LOCAL_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| defaults.local_storage_path.clone());

        let allowed_formats = match env::var("ALLOWED_EXTENSIONS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<FileFormat>().map_err(|_| {
                        anyhow::anyhow!(
                            "ALLOWED_EXTENSIONS contains unsupported extension '{}'",
                            s
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => defaults.allowed_formats.clone(),
        };

        let max_file_size_mb = parse_env("MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB)?;

        Ok(Self {
            base: BaseConfig {
                server_port: parse_env("PORT", SERVER_PORT)?,
                cors_origins,
                environment,
                api_version: env::var("API_VERSION")
                    .unwrap_or_else(|_| defaults.base.api_version.clone()),
                http_concurrency_limit: parse_env(
                    "HTTP_CONCURRENCY_LIMIT",
                    HTTP_CONCURRENCY_LIMIT,
                )?,
            },
            storage_backend,
            local_storage_path,
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| defaults.local_storage_base_url.clone()),
            staging_path: env::var("STAGING_PATH").ok().map(PathBuf::from),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            max_files_per_request: parse_env(
                "MAX_FILES_PER_REQUEST",
                DEFAULT_MAX_FILES_PER_REQUEST,
            )?,
            allowed_formats,
            ingest_timeout_secs: parse_env("INGEST_TIMEOUT_SECS", INGEST_TIMEOUT_SECS)?,
            storage_connect_retries: parse_env("STORAGE_CONNECT_RETRIES", STORAGE_CONNECT_RETRIES)?,
            storage_connect_retry_delay_ms: parse_env(
                "STORAGE_CONNECT_RETRY_DELAY_MS",
                STORAGE_CONNECT_RETRY_DELAY_MS,
            )?,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.max_files_per_request == 0 {
            return Err(anyhow::anyhow!(
                "MAX_FILES_PER_REQUEST must be greater than 0"
            ));
        }

        if self.allowed_formats.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_EXTENSIONS must name at least one of: csv, txt, xlsx, xml"
            ));
        }

        if self.ingest_timeout_secs == 0 {
            return Err(anyhow::anyhow!("INGEST_TIMEOUT_SECS must be greater than 0"));
        }

        if self.storage_connect_retries == 0 {
            return Err(anyhow::anyhow!(
                "STORAGE_CONNECT_RETRIES must be at least 1"
            ));
        }

        let is_production = is_production_env(&self.base.environment);
        if is_production && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        Ok(())
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IngestConfig>);

impl Default for Config {
    fn default() -> Self {
        Config(Box::default())
    }
}

impl Config {
    pub fn new(config: IngestConfig) -> Self {
        Config(Box::new(config))
    }

    fn as_ingest(&self) -> &IngestConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config::new(IngestConfig::from_env()?))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_ingest().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_ingest().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.as_ingest().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_ingest().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_ingest().base.environment
    }

    /// API prefix derived from `API_VERSION` (e.g. "/api/v1").
    pub fn api_prefix(&self) -> String {
        api_prefix(&self.as_ingest().base.api_version)
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_ingest().base.http_concurrency_limit.max(1)
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_ingest().storage_backend
    }

    pub fn local_storage_path(&self) -> &std::path::Path {
        &self.as_ingest().local_storage_path
    }

    pub fn local_storage_base_url(&self) -> &str {
        &self.as_ingest().local_storage_base_url
    }

    pub fn staging_path(&self) -> PathBuf {
        self.as_ingest()
            .staging_path
            .clone()
            .unwrap_or_else(|| self.local_storage_path().join(".staging"))
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.as_ingest().max_file_size_bytes
    }

    pub fn max_files_per_request(&self) -> usize {
        self.as_ingest().max_files_per_request
    }

    pub fn allowed_formats(&self) -> &[FileFormat] {
        &self.as_ingest().allowed_formats
    }

    /// Upload policy built from the allow-list and size ceiling.
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(
            self.allowed_formats().to_vec(),
            self.max_file_size_bytes() as u64,
        )
    }

    /// Largest request body the transport accepts: every file at the ceiling plus 1 MiB
    /// for multipart framing.
    pub fn max_request_body_bytes(&self) -> usize {
        self.max_file_size_bytes()
            .saturating_mul(self.max_files_per_request())
            .saturating_add(1024 * 1024)
    }

    pub fn ingest_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.as_ingest().ingest_timeout_secs)
    }

    pub fn storage_connect_retries(&self) -> u32 {
        self.as_ingest().storage_connect_retries
    }

    pub fn storage_connect_retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.as_ingest().storage_connect_retry_delay_ms)
    }
}
