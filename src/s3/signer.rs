//! Request signing
//!
//! [`Signer`] is the seam between request construction and authentication.
//! [`S3SignerV4`] implements AWS Signature Version 4 with:
//! - Pre-computed AWS4+secret_key bytes
//! - Daily signing key cache (avoids 4 HMAC operations per request)
//! - Constant empty payload hash, UNSIGNED-PAYLOAD for bodies

use crate::http::{encode_path, Request};
use crate::s3::clock::{Clock, RealClock};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Pre-computed SHA256 hash of empty payload
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Payload hash sent when a body is present
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Signing errors
#[derive(Error, Debug)]
pub enum SignError {
    #[error("Missing credentials: {0} is empty")]
    MissingCredentials(&'static str),

    #[error("Header {0} contains a line break")]
    InvalidHeader(String),

    #[error("{0}")]
    Custom(String),
}

/// Adds provider authentication to a built request.
pub trait Signer: Send + Sync {
    fn sign(&self, request: &mut Request) -> Result<(), SignError>;
}

/// An access key id and its secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKey {
    pub id: String,
    pub secret: String,
}

impl AccessKey {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKey")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// AWS Signature Version 4 signer
pub struct S3SignerV4 {
    access_key: String,
    region: String,
    service: String,
    /// Value of the Host header, which every request must carry signed
    host: String,
    /// Pre-computed "AWS4" + secret_key as bytes
    aws4_key: Vec<u8>,
    /// Cached signing key per day: (date_stamp, derived_key)
    cached_signing_key: Mutex<Option<(String, [u8; 32])>>,
    clock: Arc<dyn Clock>,
}

impl S3SignerV4 {
    /// Create a signer for requests sent to `host` in `region`.
    pub fn new(key: &AccessKey, region: &str, host: &str) -> Result<Self, SignError> {
        if key.id.is_empty() {
            return Err(SignError::MissingCredentials("access key id"));
        }
        if key.secret.is_empty() {
            return Err(SignError::MissingCredentials("secret access key"));
        }

        Ok(Self {
            access_key: key.id.clone(),
            region: region.to_string(),
            service: "s3".to_string(),
            host: host.to_string(),
            aws4_key: format!("AWS4{}", key.secret).into_bytes(),
            cached_signing_key: Mutex::new(None),
            clock: Arc::new(RealClock),
        })
    }

    /// Use `clock` for request timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Canonical query string: encoded pairs sorted by name, then value.
    fn create_canonical_query_string(request: &Request) -> String {
        let mut params: Vec<(String, String)> = request
            .parameters
            .iter()
            .map(|(k, v)| {
                (
                    urlencoding::encode(k).into_owned(),
                    urlencoding::encode(v).into_owned(),
                )
            })
            .collect();

        params.sort_unstable();

        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Create canonical headers - keys are already lowercase and sorted by BTreeMap
    fn create_canonical_headers(headers: &BTreeMap<String, String>) -> String {
        let mut result = String::with_capacity(headers.len() * 64);
        for (k, v) in headers {
            result.push_str(k);
            result.push(':');
            result.push_str(v);
            result.push('\n');
        }
        result
    }

    /// Create signed headers list - keys are already lowercase and sorted by BTreeMap
    fn create_signed_headers(headers: &BTreeMap<String, String>) -> String {
        headers.keys().map(String::as_str).collect::<Vec<_>>().join(";")
    }

    /// Calculate the signature with daily signing key cache
    fn calculate_signature(&self, date_stamp: &str, string_to_sign: &str) -> String {
        let signing_key = {
            let mut cache = self
                .cached_signing_key
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match *cache {
                Some((ref cached_date, cached_key)) if cached_date == date_stamp => cached_key,
                _ => {
                    let key = self.derive_signing_key(date_stamp);
                    *cache = Some((date_stamp.to_string(), key));
                    key
                }
            }
        };

        hex::encode(Self::hmac_sha256(&signing_key, string_to_sign.as_bytes()))
    }

    /// Derive signing key from date stamp (4 chained HMAC operations)
    fn derive_signing_key(&self, date_stamp: &str) -> [u8; 32] {
        let k_date = Self::hmac_sha256(&self.aws4_key, date_stamp.as_bytes());
        let k_region = Self::hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = Self::hmac_sha256(&k_region, self.service.as_bytes());
        Self::hmac_sha256(&k_service, b"aws4_request")
    }

    /// HMAC-SHA256 returning fixed-size array (no heap allocation)
    fn hmac_sha256(key: &[u8], msg: &[u8]) -> [u8; 32] {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        mac.update(msg);
        let result = mac.finalize().into_bytes();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        output
    }
}

impl Signer for S3SignerV4 {
    fn sign(&self, request: &mut Request) -> Result<(), SignError> {
        let now = self.clock.now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        let payload_hash = if request.body.is_some() {
            UNSIGNED_PAYLOAD
        } else {
            EMPTY_SHA256
        };

        request
            .headers
            .retain(|name, _| !name.eq_ignore_ascii_case("authorization"));
        request.headers.insert("Host".to_string(), self.host.clone());
        request.headers.insert("X-Amz-Date".to_string(), amz_date.clone());
        request
            .headers
            .insert("X-Amz-Content-Sha256".to_string(), payload_hash.to_string());

        let mut canonical = BTreeMap::new();
        for (name, value) in &request.headers {
            if value.contains(['\r', '\n']) {
                return Err(SignError::InvalidHeader(name.clone()));
            }
            canonical.insert(name.to_ascii_lowercase(), canonical_value(value));
        }

        let canonical_headers = Self::create_canonical_headers(&canonical);
        let signed_headers = Self::create_signed_headers(&canonical);
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method,
            encode_path(&request.path),
            Self::create_canonical_query_string(request),
            canonical_headers,
            signed_headers,
            payload_hash
        );

        tracing::trace!(canonical_request = %canonical_request, "sigv4_canonical_request");

        let credential_scope =
            format!("{}/{}/{}/aws4_request", date_stamp, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signature = self.calculate_signature(&date_stamp, &string_to_sign);

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, credential_scope, signed_headers, signature
        );
        request.headers.insert("Authorization".to_string(), authorization);

        Ok(())
    }
}

/// Header value with surrounding spaces trimmed and inner runs collapsed to one space.
fn canonical_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
