//! `<loc>` extraction from sitemap XML
//!
//! Works on urlset documents, sitemap indexes and the image/video/news
//! extensions alike: every element whose local name is `loc` contributes its
//! text, whatever its namespace or depth.

use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::bytes::Regex;
use std::sync::OnceLock;

use crate::utils::error::FetchError;

/// How far into the body the XML declaration is looked for
const DECLARATION_SCAN_BYTES: usize = 1024;

/// Collect the text of every `loc` element in document order
///
/// # Errors
///
/// Returns `FetchError::Parse` on malformed XML
pub fn extract_locs(xml: &str) -> Result<Vec<String>, FetchError> {
    let mut reader = Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut in_loc = false;
    let mut current = String::new();

    loop {
        let event = reader.read_event().map_err(|e| FetchError::Parse {
            position: reader.error_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(ref e) if e.local_name().as_ref() == b"loc" => {
                in_loc = true;
                current.clear();
            }
            Event::End(ref e) if e.local_name().as_ref() == b"loc" => {
                in_loc = false;
                let url = current.trim();
                if !url.is_empty() {
                    urls.push(url.to_string());
                }
            }
            Event::Text(ref e) if in_loc => {
                let text = e.unescape().map_err(|err| FetchError::Parse {
                    position: reader.buffer_position() as u64,
                    message: err.to_string(),
                })?;
                current.push_str(&text);
            }
            Event::CData(e) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(urls)
}

/// Decode a response body
///
/// A BOM wins, then the `charset` parameter of `content_type`, then the
/// `encoding` of the XML declaration, then UTF-8.
///
/// # Errors
///
/// Returns `FetchError::Decode` if the bytes are invalid in the chosen encoding
pub fn decode_body(bytes: &[u8], content_type: &str) -> Result<String, FetchError> {
    let encoding = charset_label(content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| declared_encoding(bytes))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(bytes);

    if had_errors {
        return Err(FetchError::Decode(format!(
            "invalid {} content",
            used.name()
        )));
    }

    Ok(text.into_owned())
}

/// Encoding named by `<?xml ... encoding="..."?>`, if ASCII-compatible
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    static DECLARATION_RE: OnceLock<Regex> = OnceLock::new();

    let re = DECLARATION_RE.get_or_init(|| {
        Regex::new(r#"(?-u)^\s*<\?xml[^>]*?\sencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
            .expect("Invalid regex pattern")
    });

    let head = &bytes[..bytes.len().min(DECLARATION_SCAN_BYTES)];
    let label = re.captures(head)?.get(1)?;

    Encoding::for_label(label.as_bytes()).filter(|encoding| encoding.is_ascii_compatible())
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}
