// src/ingest/encoding.rs
//! Picks a text decoding for an uploaded export by looking at its leading bytes.
//!
//! Only two encodings are recognised: UTF-16LE (announced by its BOM) and UTF-8.
//! Anything else is decoded as lossy UTF-8, which degrades to mojibake rather than
//! an error.

const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
}

pub fn detect(bytes: &[u8]) -> TextEncoding {
    if bytes.starts_with(&UTF16LE_BOM) {
        TextEncoding::Utf16Le
    } else {
        TextEncoding::Utf8
    }
}

/// Decode `bytes` with the encoding chosen by [`detect`]. Never fails.
pub fn decode(bytes: &[u8]) -> String {
    match detect(bytes) {
        TextEncoding::Utf16Le => decode_utf16le(&bytes[UTF16LE_BOM.len()..]),
        TextEncoding::Utf8 => {
            let body = bytes.strip_prefix(&UTF8_BOM[..]).unwrap_or(bytes);
            String::from_utf8_lossy(body).into_owned()
        }
    }
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    let mut out: String = char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    // dangling odd byte
    if bytes.len() % 2 == 1 {
        out.push(char::REPLACEMENT_CHARACTER);
    }
    out
}
