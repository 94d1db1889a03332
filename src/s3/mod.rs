//! Blocking client for a single S3 bucket
//!
//! This module provides:
//! - Key validation and Content-MD5 computation
//! - Request construction and AWS SigV4 signing
//! - Response interpretation and ListBucketResult decoding
//! - The [`Bucket`] façade tying them together

pub mod bucket;
pub mod clock;
pub mod digest;
pub mod error;
pub mod key;
pub mod list;
pub mod region;
pub mod request;
pub mod response;
pub mod signer;

pub use bucket::Bucket;
pub use clock::{Clock, FixedClock, RealClock};
pub use error::{Error, Result};
pub use key::{validate_key, validate_marker, KeyError, MAX_KEY_LEN};
pub use list::Keys;
pub use region::Region;
pub use signer::{AccessKey, S3SignerV4, SignError, Signer};
