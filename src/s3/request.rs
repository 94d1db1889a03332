//! Request construction for each bucket operation
//!
//! | Operation | Verb   | Path            | Extra headers              | Success |
//! |-----------|--------|-----------------|----------------------------|---------|
//! | get       | GET    | `/bucket/key`   | Date                       | 200     |
//! | head      | HEAD   | `/bucket/key`   | Date                       | 200     |
//! | store/put | PUT    | `/bucket/key`   | Date, Content-MD5          | 200     |
//! | delete    | DELETE | `/bucket/key`   | Date, Content-MD5 (empty)  | 204     |
//! | list      | GET    | `/bucket`       | Date, `marker` parameter   | 200     |

use crate::http::{Body, Method, Request};
use crate::s3::clock::http_date;
use crate::s3::digest::{content_md5, content_md5_bytes};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::{self, Cursor};

pub const DATE: &str = "Date";
pub const CONTENT_MD5: &str = "Content-MD5";
pub const MARKER: &str = "marker";

fn object_path(bucket: &str, key: &str) -> String {
    let mut path = String::with_capacity(bucket.len() + key.len() + 2);
    path.push('/');
    path.push_str(bucket);
    path.push('/');
    path.push_str(key);
    path
}

fn dated(method: Method, path: String, now: DateTime<Utc>) -> Request {
    let mut request = Request::new(method, path);
    request.headers.insert(DATE.to_string(), http_date(now));
    request
}

pub fn get_object(bucket: &str, key: &str, now: DateTime<Utc>) -> Request {
    dated(Method::GET, object_path(bucket, key), now)
}

pub fn head_object(bucket: &str, key: &str, now: DateTime<Utc>) -> Request {
    dated(Method::HEAD, object_path(bucket, key), now)
}

pub fn store_object(bucket: &str, key: &str, data: Bytes, now: DateTime<Utc>) -> Request {
    let mut request = dated(Method::PUT, object_path(bucket, key), now);
    request
        .headers
        .insert(CONTENT_MD5.to_string(), content_md5_bytes(&data));
    request.body = Some(Box::new(Cursor::new(data)));
    request
}

/// PUT a seekable stream; the stream is hashed and rewound before it is attached.
pub fn put_object(bucket: &str, key: &str, mut body: Body, now: DateTime<Utc>) -> io::Result<Request> {
    let digest = content_md5(&mut body)?;
    let mut request = dated(Method::PUT, object_path(bucket, key), now);
    request.headers.insert(CONTENT_MD5.to_string(), digest);
    request.body = Some(body);
    Ok(request)
}

pub fn delete_object(bucket: &str, key: &str, now: DateTime<Utc>) -> Request {
    let mut request = dated(Method::DELETE, object_path(bucket, key), now);
    request
        .headers
        .insert(CONTENT_MD5.to_string(), content_md5_bytes(b""));
    request
}

/// List the bucket; `marker` is omitted when empty (start of range).
pub fn list_keys(bucket: &str, marker: &str, now: DateTime<Utc>) -> Request {
    let mut path = String::with_capacity(bucket.len() + 1);
    path.push('/');
    path.push_str(bucket);

    let mut request = dated(Method::GET, path, now);
    if !marker.is_empty() {
        request.parameters.set(MARKER, marker);
    }
    request
}
