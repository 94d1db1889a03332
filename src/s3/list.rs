//! Listing: `ListBucketResult` decoding and key paging
//!
//! A listing call returns keys strictly greater than a marker, in order, up
//! to a page size the server chooses. The guarantee is a snapshot at some
//! instant during the call, not a consistent cursor: keys written or deleted
//! concurrently may appear or vanish between pages.

use crate::s3::bucket::Bucket;
use crate::s3::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::VecDeque;

/// Root element of a listing response (namespace `http://s3.amazonaws.com/doc/2006-03-01/`)
const LIST_BUCKET_RESULT: &[u8] = b"ListBucketResult";

/// Decode a listing body into its keys, in document order.
///
/// Each `Contents` child of the root contributes the text of its `Key`.
pub fn decode_list_page(body: &[u8]) -> Result<Vec<String>> {
    parse_keys(body).map_err(|detail| Error::Protocol {
        detail,
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

fn parse_keys(body: &[u8]) -> std::result::Result<Vec<String>, String> {
    let mut reader = Reader::from_reader(body);

    let mut keys = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    // Key of the Contents element being read
    let mut current: Option<String> = None;
    // Text of the Key element being read
    let mut key_text: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = e.local_name();
                match depth {
                    1 => {
                        check_root(name.as_ref())?;
                        saw_root = true;
                    }
                    2 if name.as_ref() == b"Contents" => current = Some(String::new()),
                    3 if current.is_some() && name.as_ref() == b"Key" => {
                        key_text = Some(String::new())
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.local_name();
                match depth {
                    0 => {
                        check_root(name.as_ref())?;
                        saw_root = true;
                    }
                    1 if name.as_ref() == b"Contents" => keys.push(String::new()),
                    2 if name.as_ref() == b"Key" => {
                        if let Some(ref mut key) = current {
                            key.clear();
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(ref mut text) = key_text {
                    let unescaped = e.unescape().map_err(|e| e.to_string())?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(ref mut text) = key_text {
                    let raw = std::str::from_utf8(&e).map_err(|e| e.to_string())?;
                    text.push_str(raw);
                }
            }
            Ok(Event::End(_)) => {
                match depth {
                    3 => {
                        if let (Some(text), Some(key)) = (key_text.take(), current.as_mut()) {
                            *key = text;
                        }
                    }
                    2 => {
                        if let Some(key) = current.take() {
                            keys.push(key);
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    if !saw_root {
        return Err("no root element".to_string());
    }
    if depth != 0 {
        return Err("unexpected end of document".to_string());
    }

    Ok(keys)
}

fn check_root(name: &[u8]) -> std::result::Result<(), String> {
    if name == LIST_BUCKET_RESULT {
        return Ok(());
    }
    Err(format!(
        "unexpected root element {}",
        String::from_utf8_lossy(name)
    ))
}

/// Iterator over every key in a bucket, fetched one page at a time.
///
/// Each page is requested with the last key of the previous page as its
/// marker, until a page comes back empty. The result carries only the
/// per-page snapshot guarantee of [`Bucket::list_keys`]; across pages a key
/// created behind the marker is missed and a deleted key may already have
/// been returned. Iteration stops after the first error.
pub struct Keys<'a> {
    bucket: &'a Bucket,
    page: VecDeque<String>,
    marker: String,
    done: bool,
}

impl<'a> Keys<'a> {
    pub(crate) fn new(bucket: &'a Bucket, start_after: String) -> Self {
        Self {
            bucket,
            page: VecDeque::new(),
            marker: start_after,
            done: false,
        }
    }
}

impl Iterator for Keys<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(key) = self.page.pop_front() {
            return Some(Ok(key));
        }
        if self.done {
            return None;
        }

        match self.bucket.list_keys(&self.marker) {
            Ok(keys) if keys.is_empty() => {
                self.done = true;
                None
            }
            Ok(keys) => {
                if let Some(last) = keys.last() {
                    self.marker = last.clone();
                }
                self.page.extend(keys);
                self.page.pop_front().map(Ok)
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
