use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::request::DataRequest;
use crate::types::TimeRange;

pub const DEFAULT_AUTH_URL: &str = "https://cmr.earthdata.nasa.gov/legacy-services/rest/tokens";
pub const DEFAULT_DATA_URL: &str = "https://n5eil01u.ecs.nsidc.org/egi/request";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variables that override secrets from the config file.
pub const ENV_USERNAME: &str = "SMAPSTACK_USERNAME";
pub const ENV_PASSWORD: &str = "SMAPSTACK_PASSWORD";
pub const ENV_CLIENT_ID: &str = "SMAPSTACK_CLIENT_ID";
pub const ENV_EMAIL: &str = "SMAPSTACK_EMAIL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing required option `{0}`")]
    Missing(&'static str),
    #[error("invalid option `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Account details exchanged for a token at the auth endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub user_ip_address: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("user_ip_address", &self.user_ip_address)
            .finish()
    }
}

/// Pipeline configuration, loadable from a JSON file
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub user_ip_address: String,

    /// Dataset short name (e.g. `SPL3SMP`)
    pub dataset: String,
    pub version: String,
    pub format: String,
    pub time_range: Option<TimeRange>,
    /// Variable path inside the granule (e.g. `/Soil_Moisture_Retrieval_Data/soil_moisture`)
    pub coverage: String,
    pub projection: String,
    pub email: String,

    pub auth_url: String,
    pub data_url: String,
    pub download_dir: PathBuf,
    pub extract_dir: PathBuf,
    pub output: PathBuf,
    pub request_timeout_secs: u64,
    /// Replace an existing output raster instead of failing
    pub overwrite: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            client_id: String::new(),
            user_ip_address: "127.0.0.1".to_string(),
            dataset: String::new(),
            version: String::new(),
            format: "GeoTIFF".to_string(),
            time_range: None,
            coverage: String::new(),
            projection: "Geographic".to_string(),
            email: String::new(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            data_url: DEFAULT_DATA_URL.to_string(),
            download_dir: PathBuf::from("download"),
            extract_dir: PathBuf::from("extracted"),
            output: PathBuf::from("stack.tif"),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            overwrite: false,
        }
    }
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("credentials", &self.credentials())
            .field("dataset", &self.dataset)
            .field("version", &self.version)
            .field("format", &self.format)
            .field("time_range", &self.time_range)
            .field("coverage", &self.coverage)
            .field("projection", &self.projection)
            .field("auth_url", &self.auth_url)
            .field("data_url", &self.data_url)
            .field("download_dir", &self.download_dir)
            .field("extract_dir", &self.extract_dir)
            .field("output", &self.output)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("overwrite", &self.overwrite)
            .finish()
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Override secrets with values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override secrets using `lookup`, which maps an environment key to its value.
    pub fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let targets: [(&str, &mut String); 4] = [
            (ENV_USERNAME, &mut self.username),
            (ENV_PASSWORD, &mut self.password),
            (ENV_CLIENT_ID, &mut self.client_id),
            (ENV_EMAIL, &mut self.email),
        ];
        for (key, slot) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
    }

    /// Check the options needed to authenticate.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        require("username", &self.username)?;
        require("password", &self.password)?;
        require("client_id", &self.client_id)?;
        require("user_ip_address", &self.user_ip_address)?;
        require_url("auth_url", &self.auth_url)?;
        Ok(())
    }

    /// Check every option needed to run the download stages.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_credentials()?;
        require("dataset", &self.dataset)?;
        require("version", &self.version)?;
        require("format", &self.format)?;
        if self.time_range.is_none() {
            return Err(ConfigError::Missing("time_range"));
        }
        require("coverage", &self.coverage)?;
        require("projection", &self.projection)?;
        require("email", &self.email)?;
        require_url("data_url", &self.data_url)?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            client_id: self.client_id.clone(),
            user_ip_address: self.user_ip_address.clone(),
        }
    }

    pub fn data_request(&self) -> Result<DataRequest, ConfigError> {
        let time_range = self.time_range.ok_or(ConfigError::Missing("time_range"))?;
        Ok(DataRequest {
            short_name: self.dataset.clone(),
            version: self.version.clone(),
            format: self.format.clone(),
            time_range,
            coverage: self.coverage.clone(),
            projection: self.projection.clone(),
            email: self.email.clone(),
        })
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(field));
    }
    Ok(())
}

fn require_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    require(field, value)?;
    reqwest::Url::parse(value).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })?;
    Ok(())
}
