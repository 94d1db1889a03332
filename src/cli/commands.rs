use crate::cli::args::{parse_object_path, parse_s3_path};
use crate::cli::Session;
use crate::http::HeaderMap;
use crate::s3::Bucket;
use anyhow::{Context, Result};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use std::io::{self, BufRead, Write};
use std::path::Path;

// ============================================================================
// Utility functions
// ============================================================================

/// Format bytes in human-readable form (B, KB, MB, GB, TB)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exponent = (bytes_f64.ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);

    let value = bytes_f64 / 1024_f64.powi(exponent as i32);

    if exponent == 0 {
        format!("{} {}", bytes, UNITS[exponent])
    } else {
        format!("{:.2} {}", value, UNITS[exponent])
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &hyper::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Write up to `max_keys` keys after `start_after`, one per line (0 = unlimited).
pub fn write_listing(
    bucket: &Bucket,
    start_after: &str,
    max_keys: usize,
    out: &mut dyn Write,
) -> Result<usize> {
    let limit = if max_keys == 0 { usize::MAX } else { max_keys };
    let mut count = 0;

    for key in bucket.keys_after(start_after)?.take(limit) {
        let key = key.context("Failed to list keys")?;
        writeln!(out, "{}", key)?;
        count += 1;
    }

    Ok(count)
}

/// Write the metadata a HEAD request returned for `s3://bucket/key`.
pub fn write_stat(bucket: &str, key: &str, headers: &HeaderMap, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Object: s3://{}/{}", bucket, key)?;

    match header_str(headers, &CONTENT_LENGTH).and_then(|v| v.parse::<u64>().ok()) {
        Some(size) => writeln!(out, "Size: {} ({})", format_bytes(size), size)?,
        None => writeln!(out, "Size: Unknown")?,
    }
    if let Some(content_type) = header_str(headers, &CONTENT_TYPE) {
        writeln!(out, "Type: {}", content_type)?;
    }
    if let Some(etag) = header_str(headers, &ETAG) {
        writeln!(out, "ETag: {}", etag)?;
    }
    writeln!(
        out,
        "Last Modified: {}",
        header_str(headers, &LAST_MODIFIED).unwrap_or("Unknown")
    )?;

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

// ============================================================================
// Commands
// ============================================================================

/// List keys, starting after the key part of `path` if it has one
pub fn cmd_ls(session: &Session, path: &str, max_keys: usize) -> Result<()> {
    let (bucket_name, start_after) = parse_s3_path(path)?;
    let bucket = session.open_bucket(&bucket_name)?;

    let stdout = io::stdout();
    let mut out = io::BufWriter::with_capacity(64 * 1024, stdout.lock());
    let count = write_listing(&bucket, start_after.as_deref().unwrap_or(""), max_keys, &mut out)?;
    out.flush()?;

    tracing::debug!(bucket = %bucket_name, count, "ls_done");
    Ok(())
}

/// Write an object's data to stdout
pub fn cmd_cat(session: &Session, path: &str) -> Result<()> {
    let (bucket_name, key) = parse_object_path(path)?;
    let bucket = session.open_bucket(&bucket_name)?;

    let data = bucket
        .get_object(&key)
        .with_context(|| format!("Failed to get s3://{}/{}", bucket_name, key))?;

    let mut out = io::stdout().lock();
    out.write_all(&data)?;
    out.flush()?;
    Ok(())
}

/// Download an object into a local file
pub fn cmd_get(session: &Session, path: &str, file: &Path) -> Result<()> {
    let (bucket_name, key) = parse_object_path(path)?;
    let bucket = session.open_bucket(&bucket_name)?;

    let data = bucket
        .get_object(&key)
        .with_context(|| format!("Failed to get s3://{}/{}", bucket_name, key))?;
    std::fs::write(file, &data).with_context(|| format!("Failed to write {:?}", file))?;

    println!(
        "Downloaded: s3://{}/{} -> {} ({})",
        bucket_name,
        key,
        file.display(),
        format_bytes(data.len() as u64)
    );
    Ok(())
}

/// Upload a local file, streaming it from disk
pub fn cmd_put(session: &Session, file: &Path, path: &str) -> Result<()> {
    let (bucket_name, key) = parse_object_path(path)?;
    let bucket = session.open_bucket(&bucket_name)?;

    let source = std::fs::File::open(file).with_context(|| format!("Failed to open {:?}", file))?;
    let size = source.metadata()?.len();

    bucket
        .put(&key, source)
        .with_context(|| format!("Failed to put s3://{}/{}", bucket_name, key))?;

    println!(
        "Uploaded: {} -> s3://{}/{} ({})",
        file.display(),
        bucket_name,
        key,
        format_bytes(size)
    );
    Ok(())
}

/// Delete one object, asking first unless `force` is set
pub fn cmd_rm(session: &Session, path: &str, force: bool) -> Result<()> {
    let (bucket_name, key) = parse_object_path(path)?;

    if !force && !confirm(&format!("Delete s3://{}/{}?", bucket_name, key))? {
        println!("Delete cancelled");
        return Ok(());
    }

    let bucket = session.open_bucket(&bucket_name)?;
    bucket
        .delete_object(&key)
        .with_context(|| format!("Failed to delete s3://{}/{}", bucket_name, key))?;

    println!("Deleted: s3://{}/{}", bucket_name, key);
    Ok(())
}

/// Show object info from its headers
pub fn cmd_stat(session: &Session, path: &str) -> Result<()> {
    let (bucket_name, key) = parse_object_path(path)?;
    let bucket = session.open_bucket(&bucket_name)?;

    let headers = bucket.get_header(&key).map_err(|err| {
        if err.is_not_found() {
            anyhow::anyhow!("Object not found: s3://{}/{}", bucket_name, key)
        } else {
            anyhow::Error::new(err).context(format!("Failed to stat s3://{}/{}", bucket_name, key))
        }
    })?;

    write_stat(&bucket_name, &key, &headers, &mut io::stdout().lock())
}
