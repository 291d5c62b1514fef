//! Configuration module
//!
//! Upload limits, allow-listed MIME types, chunk sizes and directory roots. Values are
//! read from the environment once at startup and passed explicitly to each component.

use std::env;
use std::path::{Path, PathBuf};

use crate::codec::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};

const SERVER_PORT: u16 = 3000;
const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const ALLOWED_FILE_TYPES: &str =
    "image/jpeg,image/png,image/gif,image/webp,video/mp4,video/quicktime,application/pdf";
const TMP_UPLOAD_DIR: &str = "public/uploads/tmp";
const FINAL_UPLOAD_DIR: &str = "public/uploads";
const REAPER_MAX_AGE_SECS: u64 = 24 * 60 * 60;
const REAPER_INTERVAL_SECS: u64 = 60 * 60;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MIN_API_KEY_LENGTH: usize = 32;

/// Chunked upload configuration
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub max_file_size_bytes: u64,
    pub allowed_file_types: Vec<String>,
    pub default_chunk_size: usize,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    pub tmp_dir: PathBuf,
    pub final_dir: PathBuf,
    /// Origin used for `appUrl`/`ufsUrl`; derived from the Host header when unset
    pub public_base_url: Option<String>,
    /// When set, upload requests must present this key
    pub upload_api_key: Option<String>,
    /// Temporary upload directories older than this are reaped. 0 = disabled.
    pub reaper_max_age_secs: u64,
    pub reaper_interval_secs: u64,
    pub http_concurrency_limit: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            allowed_file_types: parse_list(ALLOWED_FILE_TYPES),
            default_chunk_size: DEFAULT_CHUNK_SIZE,
            min_chunk_size: MIN_CHUNK_SIZE,
            max_chunk_size: MAX_CHUNK_SIZE,
            tmp_dir: PathBuf::from(TMP_UPLOAD_DIR),
            final_dir: PathBuf::from(FINAL_UPLOAD_DIR),
            public_base_url: None,
            upload_api_key: None,
            reaper_max_age_secs: REAPER_MAX_AGE_SECS,
            reaper_interval_secs: REAPER_INTERVAL_SECS,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
        }
    }
}

impl UploadConfig {
    /// Configuration rooted at `root`: finals in `root`, temporaries in `root/tmp`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            tmp_dir: root.join("tmp"),
            final_dir: root.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let max_file_size_bytes = match env::var("MAX_FILE_SIZE_BYTES") {
            Ok(raw) => raw.parse::<u64>().unwrap_or(MAX_FILE_SIZE_BYTES),
            Err(_) => env::var("MAX_FILE_SIZE_MB")
                .ok()
                .and_then(|mb| mb.parse::<u64>().ok())
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(MAX_FILE_SIZE_BYTES),
        };

        let config = UploadConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .unwrap_or(SERVER_PORT),
            cors_origins: parse_list(&cors_origins_str),
            environment,
            max_file_size_bytes,
            allowed_file_types: parse_list(
                &env::var("ALLOWED_FILE_TYPES").unwrap_or_else(|_| ALLOWED_FILE_TYPES.to_string()),
            ),
            default_chunk_size: env::var("DEFAULT_CHUNK_SIZE_BYTES")
                .unwrap_or_else(|_| DEFAULT_CHUNK_SIZE.to_string())
                .parse()
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            min_chunk_size: env::var("MIN_CHUNK_SIZE_BYTES")
                .unwrap_or_else(|_| MIN_CHUNK_SIZE.to_string())
                .parse()
                .unwrap_or(MIN_CHUNK_SIZE),
            max_chunk_size: env::var("MAX_CHUNK_SIZE_BYTES")
                .unwrap_or_else(|_| MAX_CHUNK_SIZE.to_string())
                .parse()
                .unwrap_or(MAX_CHUNK_SIZE),
            tmp_dir: PathBuf::from(
                env::var("UPLOAD_TMP_DIR").unwrap_or_else(|_| TMP_UPLOAD_DIR.to_string()),
            ),
            final_dir: PathBuf::from(
                env::var("UPLOAD_FINAL_DIR").unwrap_or_else(|_| FINAL_UPLOAD_DIR.to_string()),
            ),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .ok()
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty()),
            upload_api_key: env::var("UPLOAD_API_KEY").ok().filter(|s| !s.is_empty()),
            reaper_max_age_secs: env::var("UPLOAD_REAPER_MAX_AGE_SECS")
                .unwrap_or_else(|_| REAPER_MAX_AGE_SECS.to_string())
                .parse()
                .unwrap_or(REAPER_MAX_AGE_SECS),
            reaper_interval_secs: env::var("UPLOAD_REAPER_INTERVAL_SECS")
                .unwrap_or_else(|_| REAPER_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(REAPER_INTERVAL_SECS),
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be greater than 0"));
        }

        if self.allowed_file_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_FILE_TYPES must list at least one MIME type"
            ));
        }

        if self.min_chunk_size == 0 {
            return Err(anyhow::anyhow!("MIN_CHUNK_SIZE_BYTES must be greater than 0"));
        }

        if self.min_chunk_size > self.default_chunk_size
            || self.default_chunk_size > self.max_chunk_size
        {
            return Err(anyhow::anyhow!(
                "Chunk sizes must satisfy MIN ({}) <= DEFAULT ({}) <= MAX ({})",
                self.min_chunk_size,
                self.default_chunk_size,
                self.max_chunk_size
            ));
        }

        if self.tmp_dir == self.final_dir {
            return Err(anyhow::anyhow!(
                "UPLOAD_TMP_DIR and UPLOAD_FINAL_DIR must be different directories"
            ));
        }

        if let Some(ref key) = self.upload_api_key {
            if key.len() < MIN_API_KEY_LENGTH {
                return Err(anyhow::anyhow!(
                    "UPLOAD_API_KEY must be at least {} characters long",
                    MIN_API_KEY_LENGTH
                ));
            }
        }

        Ok(())
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploadConfig>);

impl From<UploadConfig> for Config {
    fn from(config: UploadConfig) -> Self {
        Config(Box::new(config))
    }
}

impl Config {
    fn as_upload(&self) -> &UploadConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(UploadConfig::from_env()?.into())
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_upload().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.as_upload().environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.as_upload().server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_upload().environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_upload().cors_origins
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.as_upload().max_file_size_bytes
    }

    pub fn allowed_file_types(&self) -> &[String] {
        &self.as_upload().allowed_file_types
    }

    pub fn default_chunk_size(&self) -> usize {
        self.as_upload().default_chunk_size
    }

    pub fn min_chunk_size(&self) -> usize {
        self.as_upload().min_chunk_size
    }

    pub fn max_chunk_size(&self) -> usize {
        self.as_upload().max_chunk_size
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.as_upload().tmp_dir
    }

    pub fn final_dir(&self) -> &Path {
        &self.as_upload().final_dir
    }

    pub fn public_base_url(&self) -> Option<&str> {
        self.as_upload().public_base_url.as_deref()
    }

    pub fn upload_api_key(&self) -> Option<&str> {
        self.as_upload().upload_api_key.as_deref()
    }

    pub fn reaper_max_age_secs(&self) -> u64 {
        self.as_upload().reaper_max_age_secs
    }

    pub fn reaper_interval_secs(&self) -> u64 {
        self.as_upload().reaper_interval_secs
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_upload().http_concurrency_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = UploadConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.allowed_file_types.len(), 7);
        assert!(config
            .allowed_file_types
            .contains(&"application/pdf".to_string()));
    }

    #[test]
    fn test_with_root_separates_directories() {
        let config = UploadConfig::with_root("/srv/uploads");
        assert_eq!(config.final_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(config.tmp_dir, PathBuf::from("/srv/uploads/tmp"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_chunk_sizes() {
        let config = UploadConfig {
            min_chunk_size: 2048,
            default_chunk_size: 1024,
            ..UploadConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Chunk sizes"));
    }

    #[test]
    fn test_validate_rejects_same_directories() {
        let config = UploadConfig {
            tmp_dir: PathBuf::from("same"),
            final_dir: PathBuf::from("same"),
            ..UploadConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_api_key() {
        let config = UploadConfig {
            upload_api_key: Some("short".to_string()),
            ..UploadConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_list_normalizes() {
        assert_eq!(
            parse_list(" Image/PNG , ,video/mp4"),
            vec!["image/png".to_string(), "video/mp4".to_string()]
        );
    }

    #[test]
    fn test_config_getters() {
        let config: Config = UploadConfig {
            environment: "Production".to_string(),
            ..UploadConfig::default()
        }
        .into();
        assert!(config.is_production());
        assert_eq!(config.server_port(), 3000);
        assert!(config.upload_api_key().is_none());
    }
}
