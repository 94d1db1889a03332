//! The bucket façade
//!
//! Every operation runs the same pipeline: validate the key, build the
//! request, sign it, send it once, then interpret the response. Nothing is
//! sent for a key that fails validation, and nothing is retried.

use crate::http::conn::endpoint_authority;
use crate::http::{Conn, ConnError, HeaderMap, HttpConn, Request, Response, StatusCode};
use crate::s3::clock::{Clock, RealClock};
use crate::s3::error::{Error, Result};
use crate::s3::key::{validate_key, validate_marker};
use crate::s3::list::{decode_list_page, Keys};
use crate::s3::region::Region;
use crate::s3::request;
use crate::s3::response::{expect_status, read_body};
use crate::s3::signer::{AccessKey, S3SignerV4, Signer};
use bytes::Bytes;
use std::io::{Read, Seek};
use std::sync::Arc;
use std::time::Duration;

/// A named bucket in one region: a collection of objects keyed on Unicode strings.
///
/// Keys must be non-empty, at most 1024 bytes of UTF-8, and made only of
/// characters legal in XML 1.0. Operations take keys as `AsRef<[u8]>` so
/// that byte strings which are not UTF-8 are rejected rather than unrepresentable.
///
/// The handle is immutable and cheap to clone. It may be shared across
/// threads; concurrent operations are as safe as the injected connection and
/// signer, which must be `Send + Sync`.
#[derive(Clone)]
pub struct Bucket {
    name: String,
    conn: Arc<dyn Conn>,
    signer: Arc<dyn Signer>,
    clock: Arc<dyn Clock>,
}

impl Bucket {
    /// Open a bucket that already exists in `region` and is readable with `key`.
    pub fn open(name: impl Into<String>, region: &Region, key: &AccessKey) -> Result<Self> {
        Self::open_with_timeout(name, region, key, None)
    }

    /// Like [`Bucket::open`], failing any single exchange that exceeds `timeout`.
    pub fn open_with_timeout(
        name: impl Into<String>,
        region: &Region,
        key: &AccessKey,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Self::open_with_clock(name, region, key, timeout, Arc::new(RealClock))
    }

    /// Like [`Bucket::open_with_timeout`], taking request times from `clock`.
    ///
    /// The same clock stamps the `Date` header and the signature.
    pub fn open_with_clock(
        name: impl Into<String>,
        region: &Region,
        key: &AccessKey,
        timeout: Option<Duration>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let endpoint = region.endpoint_url().map_err(|source| {
            Error::Open(ConnError::InvalidUrl {
                url: region.endpoint().to_string(),
                source,
            })
        })?;

        let mut conn = HttpConn::new(&endpoint).map_err(Error::Open)?;
        if let Some(timeout) = timeout {
            conn = conn.with_timeout(timeout);
        }

        let host = endpoint_authority(&endpoint).map_err(Error::Open)?;
        let signer = S3SignerV4::new(key, region.name(), &host)
            .map_err(Error::Credentials)?
            .with_clock(clock.clone());

        let name = name.into();
        tracing::debug!(bucket = %name, region = %region, "open_bucket");

        Ok(Self::with_parts(
            name,
            Arc::new(conn),
            Arc::new(signer),
            clock,
        ))
    }

    /// Assemble a bucket from explicit collaborators.
    pub fn with_parts(
        name: impl Into<String>,
        conn: Arc<dyn Conn>,
        signer: Arc<dyn Signer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            conn,
            signer,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Retrieve the data stored under `key`.
    pub fn get_object(&self, key: impl AsRef<[u8]>) -> Result<Bytes> {
        let key = validate_key(key.as_ref())?;
        tracing::debug!(bucket = %self.name, key = %key, "get_object");

        let request = request::get_object(&self.name, key, self.clock.now());
        let mut response = self.execute(request, StatusCode::OK)?;
        Ok(Bytes::from(read_body(&mut response)?))
    }

    /// Retrieve the response headers for `key` without its data.
    pub fn get_header(&self, key: impl AsRef<[u8]>) -> Result<HeaderMap> {
        let key = validate_key(key.as_ref())?;
        tracing::debug!(bucket = %self.name, key = %key, "get_header");

        let request = request::head_object(&self.name, key, self.clock.now());
        let response = self.execute(request, StatusCode::OK)?;
        Ok(response.headers)
    }

    /// Store `data` under `key`, replacing any previous object.
    ///
    /// The object gets the default ACL of "private".
    pub fn store_object(&self, key: impl AsRef<[u8]>, data: impl Into<Bytes>) -> Result<()> {
        let key = validate_key(key.as_ref())?;
        let data = data.into();
        tracing::debug!(bucket = %self.name, key = %key, bytes = data.len(), "store_object");

        let request = request::store_object(&self.name, key, data, self.clock.now());
        self.execute(request, StatusCode::OK)?;
        Ok(())
    }

    /// Stream the whole of `data` to `key`, replacing any previous object.
    ///
    /// The stream is read once to compute its Content-MD5, rewound, and read
    /// again for transmission; it is sent from its start regardless of its
    /// current position.
    pub fn put<R>(&self, key: impl AsRef<[u8]>, data: R) -> Result<()>
    where
        R: Read + Seek + Send + 'static,
    {
        let key = validate_key(key.as_ref())?;
        tracing::debug!(bucket = %self.name, key = %key, "put");

        let request = request::put_object(&self.name, key, Box::new(data), self.clock.now())
            .map_err(Error::Digest)?;
        self.execute(request, StatusCode::OK)?;
        Ok(())
    }

    /// Delete the object stored under `key`.
    pub fn delete_object(&self, key: impl AsRef<[u8]>) -> Result<()> {
        let key = validate_key(key.as_ref())?;
        tracing::debug!(bucket = %self.name, key = %key, "delete_object");

        let request = request::delete_object(&self.name, key, self.clock.now());
        self.execute(request, StatusCode::NO_CONTENT)?;
        Ok(())
    }

    /// Return a run of contiguous keys strictly greater than `prev_key`, in
    /// order; the empty string means "from the beginning".
    ///
    /// At some instant during the request there were no keys between
    /// `prev_key` and the first key returned, nor between consecutive keys
    /// returned. More keys may follow the last one. An empty result means
    /// that at some instant during the request the bucket held no keys
    /// greater than `prev_key`. Nothing stronger holds: concurrent writers
    /// can make keys appear or vanish between calls.
    ///
    /// To list a whole bucket, start with `""` and call again with the last
    /// key returned until a call returns no keys, or use [`Bucket::keys`].
    pub fn list_keys(&self, prev_key: impl AsRef<[u8]>) -> Result<Vec<String>> {
        let marker = validate_marker(prev_key.as_ref())?;
        tracing::debug!(bucket = %self.name, marker = %marker, "list_keys");

        let request = request::list_keys(&self.name, marker, self.clock.now());
        let mut response = self.execute(request, StatusCode::OK)?;
        let body = read_body(&mut response)?;
        let keys = decode_list_page(&body)?;

        tracing::debug!(bucket = %self.name, count = keys.len(), "list_keys_page");
        Ok(keys)
    }

    /// Iterate over every key in the bucket, paging with [`Bucket::list_keys`].
    pub fn keys(&self) -> Keys<'_> {
        Keys::new(self, String::new())
    }

    /// Iterate over the keys strictly greater than `start_after`.
    pub fn keys_after(&self, start_after: impl AsRef<[u8]>) -> Result<Keys<'_>> {
        let marker = validate_marker(start_after.as_ref())?;
        Ok(Keys::new(self, marker.to_string()))
    }

    /// Sign, send once, and check the status.
    fn execute(&self, mut request: Request, expected: StatusCode) -> Result<Response> {
        self.signer.sign(&mut request).map_err(Error::Sign)?;
        let response = self.conn.send_request(request).map_err(Error::SendRequest)?;
        expect_status(response, expected)
    }
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
