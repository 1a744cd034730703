//! Content-type detection for streamed results.
//!
//! Only the first [`SNIFF_LEN`] bytes are inspected: binary signatures
//! first, then markup and JSON prefixes, then a UTF-8 text check.

use std::io;

use futures_util::stream::{self, StreamExt};
use mime::Mime;
use thales_middleware::ByteStream;

/// Number of leading bytes inspected.
pub const SNIFF_LEN: usize = 512;

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b\x08", "application/gzip"),
    (b"\x00asm", "application/wasm"),
    (b"OggS\x00", "application/ogg"),
    (b"ID3", "audio/mpeg"),
    (b"\x1aE\xdf\xa3", "video/webm"),
];

const HTML_PREFIXES: &[&[u8]] = &[b"<!doctype html", b"<html", b"<head", b"<body", b"<!--"];

/// Detects the media type of `data`.
///
/// # Example
///
/// ```
/// use thales_crud::sniff::sniff_content_type;
///
/// assert_eq!(sniff_content_type(b"%PDF-1.7 ...").as_ref(), "application/pdf");
/// assert_eq!(sniff_content_type(b"  {\"a\": 1}").as_ref(), "application/json");
/// assert_eq!(sniff_content_type(&[0, 159, 146, 150]).as_ref(), "application/octet-stream");
/// ```
#[must_use]
pub fn sniff_content_type(data: &[u8]) -> Mime {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some(found) = riff_type(data) {
        return parse(found);
    }
    if let Some((_, found)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
        return parse(found);
    }

    let text = data.strip_prefix(b"\xef\xbb\xbf").unwrap_or(data);
    let start = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(text.len());
    let trimmed = &text[start..];

    if starts_with_ignore_case(trimmed, b"<?xml") {
        return mime::TEXT_XML;
    }
    if HTML_PREFIXES
        .iter()
        .any(|prefix| starts_with_ignore_case(trimmed, prefix))
    {
        return mime::TEXT_HTML_UTF_8;
    }
    if matches!(trimmed.first(), Some(b'{' | b'[')) && is_text(data) {
        return mime::APPLICATION_JSON;
    }
    if is_text(data) {
        return mime::TEXT_PLAIN_UTF_8;
    }
    mime::APPLICATION_OCTET_STREAM
}

/// Reads enough of `stream` to sniff it, then returns the type and a
/// stream that replays the bytes already read.
pub async fn sniff_stream(mut stream: ByteStream) -> io::Result<(Mime, ByteStream)> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    let mut read = Vec::new();
    while head.len() < SNIFF_LEN {
        match stream.next().await {
            Some(chunk) => {
                let chunk = chunk?;
                head.extend_from_slice(&chunk);
                read.push(chunk);
            }
            None => break,
        }
    }

    let content_type = sniff_content_type(&head);
    let replay = stream::iter(read.into_iter().map(Ok));
    Ok((content_type, Box::pin(replay.chain(stream))))
}

fn riff_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 12 || !data.starts_with(b"RIFF") {
        return None;
    }
    match &data[8..12] {
        b"WEBP" => Some("image/webp"),
        b"WAVE" => Some("audio/wav"),
        b"AVI " => Some("video/x-msvideo"),
        _ => None,
    }
}

fn parse(media_type: &str) -> Mime {
    media_type
        .parse()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

fn starts_with_ignore_case(data: &[u8], prefix: &[u8]) -> bool {
    data.len() >= prefix.len() && data[..prefix.len()].eq_ignore_ascii_case(prefix)
}

// A multi-byte sequence cut off by the sniff window still counts as text.
fn is_text(data: &[u8]) -> bool {
    let valid = match std::str::from_utf8(data) {
        Ok(text) => text,
        Err(err) if err.error_len().is_none() => {
            std::str::from_utf8(&data[..err.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return false,
    };
    !valid
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r' | '\x0c'))
}
