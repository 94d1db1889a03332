//! Response interpretation: expected status or a server error

use crate::http::{Response, StatusCode};
use crate::s3::error::{Error, Result};

/// Return the response if its status is `expected`, otherwise a server error
/// carrying the status and the full body.
pub fn expect_status(mut response: Response, expected: StatusCode) -> Result<Response> {
    if response.status == expected {
        return Ok(response);
    }
    Err(server_error(&mut response))
}

/// Build the error for an unexpected status, reading the body to the end.
///
/// A body that cannot be read yields `Error::ReadBody` instead.
pub fn server_error(response: &mut Response) -> Error {
    match response.read_body() {
        Ok(body) => {
            let body = String::from_utf8_lossy(&body).into_owned();
            tracing::warn!(status = response.status.as_u16(), body = %body, "server_error");
            Error::Server {
                status: response.status,
                body,
            }
        }
        Err(e) => Error::ReadBody(e),
    }
}

/// Read the whole body of a successful response.
pub fn read_body(response: &mut Response) -> Result<Vec<u8>> {
    response.read_body().map_err(Error::ReadBody)
}
