use crate::s3::{AccessKey, Bucket, Region};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// S3 profile: credentials plus where to reach the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// AWS access key ID
    pub access_key: String,

    /// AWS secret access key
    pub secret_key: String,

    /// AWS region (default: us-east-1)
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint URL for S3-compatible services; the region's standard endpoint when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Optional default bucket name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

impl Profile {
    /// The region this profile talks to.
    ///
    /// An explicit endpoint wins; otherwise a known region name maps to its
    /// standard endpoint and any other name to `s3.<name>.amazonaws.com`.
    pub fn region(&self) -> Region {
        match &self.endpoint {
            Some(endpoint) => Region::custom(self.region.clone(), endpoint.clone()),
            None => Region::from_name(&self.region).unwrap_or_else(|| {
                Region::new(
                    self.region.clone(),
                    &format!("s3.{}.amazonaws.com", self.region),
                )
            }),
        }
    }

    pub fn access_key(&self) -> AccessKey {
        AccessKey::new(self.access_key.clone(), self.secret_key.clone())
    }

    /// Open `name`, or the profile's default bucket when `name` is `None`.
    pub fn open_bucket(&self, name: Option<&str>, timeout: Option<Duration>) -> Result<Bucket> {
        let name = name
            .or(self.bucket.as_deref())
            .context("No bucket given and the profile has no default bucket")?;

        let region = self.region();
        Bucket::open_with_timeout(name, &region, &self.access_key(), timeout)
            .with_context(|| format!("Failed to open bucket '{}' in {}", name, region))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Named profiles for different S3 configurations
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Profile used when none is named
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Per-request timeout in seconds (0 disables it)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            default_profile: None,
            request_timeout: default_request_timeout(),
        }
    }

    /// Get a profile by name, or the default profile if not specified
    pub fn get_profile(&self, name: Option<&str>) -> Option<&Profile> {
        if let Some(name) = name {
            self.profiles.get(name)
        } else if let Some(default) = &self.default_profile {
            self.profiles.get(default)
        } else {
            self.profiles.values().next()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.request_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: Config = serde_yaml::from_str(&content)
        .context("Failed to parse YAML configuration")?;

    Ok(config)
}

/// Load configuration from environment variables
///
/// Supports both AWS standard variables and the short S3_* forms:
/// - AWS_ACCESS_KEY_ID / S3_KEY
/// - AWS_SECRET_ACCESS_KEY / S3_SECRET
/// - AWS_REGION (optional, defaults to us-east-1)
/// - S3_ENDPOINT (optional, for S3-compatible services)
/// - S3_BUCKET (optional)
/// - S3_REQUEST_TIMEOUT (optional, seconds)
pub fn load_from_env() -> Result<Config> {
    // Try to load .env file if it exists (don't fail if it doesn't)
    let _ = dotenvy::dotenv();

    let mut config = Config::new();

    let access_key = std::env::var("AWS_ACCESS_KEY_ID")
        .or_else(|_| std::env::var("S3_KEY"))
        .context("Neither AWS_ACCESS_KEY_ID nor S3_KEY environment variable is set")?;

    let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
        .or_else(|_| std::env::var("S3_SECRET"))
        .context("Neither AWS_SECRET_ACCESS_KEY nor S3_SECRET environment variable is set")?;

    let region = std::env::var("AWS_REGION").unwrap_or_else(|_| default_region());

    let endpoint = std::env::var("S3_ENDPOINT")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let bucket = std::env::var("S3_BUCKET").ok();

    let profile = Profile {
        access_key,
        secret_key,
        region,
        endpoint,
        bucket,
    };

    config.profiles.insert("default".to_string(), profile);
    config.default_profile = Some("default".to_string());

    if let Ok(timeout) = std::env::var("S3_REQUEST_TIMEOUT") {
        config.request_timeout = timeout
            .trim()
            .parse()
            .context(format!("Invalid S3_REQUEST_TIMEOUT: {:?}", timeout))?;
    }

    Ok(config)
}

/// Load configuration from file or environment
///
/// Reads the YAML file when a path is given and falls back to environment
/// variables otherwise.
///
/// # Arguments
/// * `config_path` - Optional path to YAML config file
/// * `profile_name` - Optional profile name to use (only relevant for YAML configs)
pub fn load_config(config_path: Option<&str>, profile_name: Option<&str>) -> Result<Config> {
    if let Some(path) = config_path {
        let mut config = load_from_yaml(path)?;

        // If a specific profile is requested, make it the default
        if let Some(name) = profile_name {
            if !config.profiles.contains_key(name) {
                anyhow::bail!("Profile '{}' not found in config file", name);
            }
            config.default_profile = Some(name.to_string());
        }

        Ok(config)
    } else {
        load_from_env()
    }
}
