//! Bucket operation errors
//!
//! Every variant names the step that failed: validation, signing, transport,
//! server status, or response shape.

use crate::http::{ConnError, StatusCode};
use crate::s3::key::KeyError;
use crate::s3::signer::SignError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    InvalidKey(#[from] KeyError),

    #[error("Sign: {0}")]
    Sign(#[source] SignError),

    #[error("SendRequest: {0}")]
    SendRequest(#[source] ConnError),

    #[error("Error from server: {status} {body}")]
    Server { status: StatusCode, body: String },

    #[error("Invalid data from server ({detail}): {body}")]
    Protocol { detail: String, body: String },

    #[error("ReadBody: {0}")]
    ReadBody(#[source] std::io::Error),

    #[error("Content-MD5: {0}")]
    Digest(#[source] std::io::Error),

    #[error("NewConn: {0}")]
    Open(#[source] ConnError),

    #[error("NewSigner: {0}")]
    Credentials(#[source] SignError),
}

impl Error {
    /// Status code of a server error, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server answered 404 Not Found.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
