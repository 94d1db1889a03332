/// Split an S3 path into bucket and optional key.
///
/// Accepts both "s3://bucket/key" (URI) and "s3/bucket/key" (mc-compatible).
pub fn parse_s3_path(path: &str) -> anyhow::Result<(String, Option<String>)> {
    let path = path.trim();

    let stripped = if let Some(p) = path.strip_prefix("s3://") {
        p
    } else if let Some(p) = path.strip_prefix("s3/") {
        p
    } else {
        anyhow::bail!("Invalid S3 path format. Expected: s3://bucket/key");
    };

    let (bucket, key) = match stripped.split_once('/') {
        Some((bucket, key)) => (bucket, key),
        None => (stripped, ""),
    };

    if bucket.is_empty() {
        anyhow::bail!("Bucket name cannot be empty");
    }

    let key = (!key.is_empty()).then(|| key.to_string());
    Ok((bucket.to_string(), key))
}

/// Like [`parse_s3_path`], but the key is mandatory.
pub fn parse_object_path(path: &str) -> anyhow::Result<(String, String)> {
    let (bucket, key) = parse_s3_path(path)?;
    let key = key.ok_or_else(|| anyhow::anyhow!("Object key is required: {}", path))?;
    Ok((bucket, key))
}
