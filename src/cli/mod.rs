//! Command-line front end for the bucket client
//!
//! # Usage
//!
//! ```bash
//! # List keys, optionally starting after a given key
//! s3bucket ls s3://bucket
//! s3bucket ls s3://bucket/photos/2019 --max-keys 100
//!
//! # Download and upload
//! s3bucket get s3://bucket/key /local/file.txt
//! s3bucket put /local/file.txt s3://bucket/key
//! s3bucket cat s3://bucket/key
//!
//! # Object info and removal
//! s3bucket stat s3://bucket/key
//! s3bucket rm s3://bucket/key --force
//! ```

pub mod args;
pub mod commands;

use crate::config::{Config, Profile};
use crate::s3::Bucket;
use anyhow::{Context, Result};
use std::time::Duration;

/// The profile and limits a command runs with
#[derive(Debug, Clone)]
pub struct Session {
    profile: Profile,
    timeout: Option<Duration>,
}

impl Session {
    /// Select `profile_name`, or the configured default, from `config`.
    pub fn new(config: &Config, profile_name: Option<&str>) -> Result<Self> {
        let profile = config
            .get_profile(profile_name)
            .with_context(|| match profile_name {
                Some(name) => format!("Profile '{}' not found", name),
                None => "No profile configured".to_string(),
            })?
            .clone();

        Ok(Self {
            profile,
            timeout: config.timeout(),
        })
    }

    pub fn open_bucket(&self, name: &str) -> Result<Bucket> {
        self.profile.open_bucket(Some(name), self.timeout)
    }
}
