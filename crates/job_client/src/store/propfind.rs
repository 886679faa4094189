//! Parsing of WebDAV `PROPFIND` multistatus responses.

use quick_xml::events::Event;
use quick_xml::Reader;
use url::Url;

use crate::error::{ClientError, Result};

pub const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:"><D:prop><D:resourcetype/></D:prop></D:propfind>"#;

/// Extracts every `href` from a multistatus document, in document order.
///
/// Namespace prefixes are ignored. Absolute URLs are reduced to their path
/// so callers always see server-absolute paths such as `/webdav/cwl/a.cwl`.
pub fn parse_multistatus(content: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut saw_multistatus = false;
    let mut in_href = false;
    let mut current = String::new();
    let mut hrefs = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"multistatus" => saw_multistatus = true,
                b"href" => {
                    in_href = true;
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"multistatus" => {
                saw_multistatus = true;
            }
            Ok(Event::Text(e)) if in_href => {
                let text = e
                    .unescape()
                    .map_err(|err| ClientError::InvalidListing(err.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"href" => {
                in_href = false;
                let href = current.trim();
                if !href.is_empty() {
                    hrefs.push(normalize_href(href));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(ClientError::InvalidListing(format!(
                    "malformed XML at position {}: {}",
                    reader.buffer_position(),
                    err
                )))
            }
            _ => {}
        }
    }

    if !saw_multistatus {
        return Err(ClientError::InvalidListing(
            "response is not a DAV multistatus document".to_string(),
        ));
    }

    Ok(hrefs)
}

fn normalize_href(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => href.to_string(),
    }
}
