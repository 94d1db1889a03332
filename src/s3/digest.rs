//! Content-MD5 computation for request bodies
//!
//! The server recomputes the digest and rejects a body that arrives corrupted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::{self, Read, Seek, SeekFrom};

/// Base64 MD5 of an in-memory body.
pub fn content_md5_bytes(data: &[u8]) -> String {
    STANDARD.encode(md5::compute(data).0)
}

/// Base64 MD5 of a whole seekable stream.
///
/// The stream is hashed from its start and left rewound to its start on every
/// path out of this function, so it can be handed to the transport as-is.
pub fn content_md5<R: Read + Seek + ?Sized>(body: &mut R) -> io::Result<String> {
    body.seek(SeekFrom::Start(0))?;

    let digest = hash_stream(body);
    let rewound = body.seek(SeekFrom::Start(0));

    let digest = digest?;
    rewound?;
    Ok(STANDARD.encode(digest.0))
}

fn hash_stream<R: Read + ?Sized>(body: &mut R) -> io::Result<md5::Digest> {
    let mut context = md5::Context::new();
    io::copy(body, &mut context)?;
    Ok(context.compute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_empty_body() {
        assert_eq!(content_md5_bytes(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
        let mut body = Cursor::new(Vec::new());
        assert_eq!(content_md5(&mut body).unwrap(), "1B2M2Y8AsgTpgAmY7PhCfg==");
    }

    #[test]
    fn test_known_digest() {
        let data = b"The quick brown fox jumps over the lazy dog";
        assert_eq!(content_md5_bytes(data), "nhB9nTcrtoJr2B01QqQZ1g==");
    }

    #[test]
    fn test_stream_matches_bytes_and_rewinds() {
        let data = b"taco burrito enchilada".to_vec();
        let mut body = Cursor::new(data.clone());
        body.seek(SeekFrom::Start(7)).unwrap();

        let digest = content_md5(&mut body).unwrap();
        assert_eq!(digest, content_md5_bytes(&data));
        assert_eq!(body.position(), 0);

        let mut reread = Vec::new();
        body.read_to_end(&mut reread).unwrap();
        assert_eq!(reread, data);
    }

    /// Fails every read after the first chunk, tracking its position.
    struct FailingReader {
        inner: Cursor<Vec<u8>>,
        reads: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.reads > 1 {
                return Err(io::Error::new(io::ErrorKind::Other, "taco"));
            }
            let n = buf.len().min(4);
            self.inner.read(&mut buf[..n])
        }
    }

    impl Seek for FailingReader {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn test_rewinds_after_read_failure() {
        let mut body = FailingReader {
            inner: Cursor::new(b"some longer body".to_vec()),
            reads: 0,
        };

        let err = content_md5(&mut body).unwrap_err();
        assert!(err.to_string().contains("taco"));
        assert_eq!(body.inner.position(), 0);
    }
}
