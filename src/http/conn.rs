//! Blocking HTTP connection built on hyper
//!
//! Each `HttpConn` owns:
//! - A hyper client (HTTP/1.1, native-tls) with its connection pool
//! - A single-threaded tokio runtime that drives one exchange per call
//!
//! `send_request` blocks the calling thread, so it must not be called from
//! inside another tokio runtime.

use crate::http::{encode_parameters, encode_path, Conn, ConnError, Request, Response, FORM_CONTENT_TYPE};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use std::io::{Cursor, Read};
use std::time::Duration;
use url::Url;

/// Connection to a single `http` or `https` endpoint.
pub struct HttpConn {
    scheme: String,
    /// Host with a non-default port appended, as sent in URLs
    authority: String,
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
    runtime: tokio::runtime::Runtime,
    timeout: Option<Duration>,
}

impl HttpConn {
    /// Create a connection for the scheme and host of `endpoint`.
    ///
    /// Only `http` and `https` are accepted; the path of `endpoint` is ignored.
    pub fn new(endpoint: &Url) -> Result<Self, ConnError> {
        match endpoint.scheme() {
            "http" | "https" => {}
            other => return Err(ConnError::UnsupportedScheme(other.to_string())),
        }

        let authority = endpoint_authority(endpoint)?;

        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(10)));
        http.set_keepalive(Some(Duration::from_secs(90)));

        let tls = TlsConnector::new()?;
        let https = HttpsConnector::from((http, tls.into()));

        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .set_host(true)
            .build(https);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            scheme: endpoint.scheme().to_string(),
            authority,
            client,
            runtime,
            timeout: None,
        })
    }

    /// Fail any exchange that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full URL for a request: encoded path plus form-encoded parameters.
    pub fn build_url(&self, request: &Request) -> String {
        let path = encode_path(&request.path);
        let query = encode_parameters(&request.parameters);

        let mut url = String::with_capacity(
            self.scheme.len() + 3 + self.authority.len() + path.len() + query.len() + 2,
        );
        url.push_str(&self.scheme);
        url.push_str("://");
        url.push_str(&self.authority);
        if !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(&path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url
    }

    fn build_hyper_request(
        &self,
        request: Request,
    ) -> Result<hyper::Request<Full<Bytes>>, ConnError> {
        let url = self.build_url(&request);

        let mut builder = hyper::Request::builder()
            .method(request.method.clone())
            .uri(&url);
        for (key, value) in request.headers.iter() {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let needs_form_type = !request.parameters.is_empty()
            && request.body.is_none()
            && request.header("content-type").is_none();
        if needs_form_type {
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE);
        }

        let body = match request.body {
            Some(mut body) => {
                let mut buf = Vec::new();
                body.read_to_end(&mut buf)?;
                Bytes::from(buf)
            }
            None => Bytes::new(),
        };

        Ok(builder.body(Full::new(body))?)
    }
}

impl Conn for HttpConn {
    fn send_request(&self, request: Request) -> Result<Response, ConnError> {
        let method = request.method.clone();
        let path = request.path.clone();
        let hyper_request = self.build_hyper_request(request)?;

        let exchange = async {
            let response = self
                .client
                .request(hyper_request)
                .await
                .map_err(|e| ConnError::Request {
                    host: self.authority.clone(),
                    message: error_chain(&e),
                })?;
            let (parts, body) = response.into_parts();
            let body = body.collect().await?.to_bytes();
            Ok::<_, ConnError>((parts, body))
        };

        let (parts, body) = match self.timeout {
            Some(limit) => self.runtime.block_on(async {
                tokio::time::timeout(limit, exchange)
                    .await
                    .map_err(|_| ConnError::Timeout(limit))?
            })?,
            None => self.runtime.block_on(exchange)?,
        };

        tracing::debug!(
            method = %method,
            host = %self.authority,
            path = %path,
            status = parts.status.as_u16(),
            bytes = body.len(),
            "http_exchange"
        );

        Ok(Response::new(parts.status, parts.headers, Cursor::new(body)))
    }
}

/// Host plus explicit non-default port.
pub(crate) fn endpoint_authority(endpoint: &Url) -> Result<String, ConnError> {
    let host = endpoint
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ConnError::MissingHost(endpoint.to_string()))?;
    Ok(match endpoint.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
