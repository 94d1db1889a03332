//! s3bucket - blocking client for objects stored in an S3 bucket

pub mod cli;
pub mod config;
pub mod http;
pub mod s3;

pub use config::Config;
pub use s3::{AccessKey, Bucket, Error, Region, Result};
