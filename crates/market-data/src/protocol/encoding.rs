//! Character-encoding handling for upstream bodies and quote names.
//!
//! The provider serves its legacy protocol in a Chinese multi-byte encoding
//! (commonly GBK) and does not always label it. Bodies are decoded from raw
//! bytes here, and individual names that still look mis-decoded are repaired
//! best-effort.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, WINDOWS_1252};
use log::warn;

use crate::errors::MarketDataError;

/// Top-level domain hint for the detector; the upstream serves mainland data.
const DETECTOR_TLD: &[u8] = b"cn";

/// Extract the `charset` parameter from a `Content-Type` header value.
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Decode a response body.
///
/// A known `charset` label wins. Without one, valid UTF-8 is taken as-is and
/// anything else goes through encoding detection.
pub fn decode_body(bytes: &[u8], charset: Option<&str>) -> String {
    if let Some(encoding) = charset.and_then(|label| Encoding::for_label(label.as_bytes())) {
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            warn!(
                "Body declared as {} contained malformed sequences",
                encoding.name()
            );
        }
        return text.into_owned();
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(Some(DETECTOR_TLD), true);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Strip ASCII control characters and repair text that was decoded with the wrong charset.
///
/// Returns [`MarketDataError::Encoding`] when the text is empty after cleanup,
/// carries replacement characters, or cannot be repaired into printable text.
pub fn repair_text(raw: &str) -> Result<String, MarketDataError> {
    // C1 controls are kept until after repair: they are valid bytes of mis-decoded text.
    let stripped: String = raw.chars().filter(|c| !c.is_ascii_control()).collect();
    let trimmed = stripped.trim_matches(|c: char| c.is_ascii_whitespace());

    if trimmed.is_empty() {
        return Err(MarketDataError::Encoding("empty text".to_string()));
    }

    if trimmed.contains(char::REPLACEMENT_CHARACTER) {
        return Err(MarketDataError::Encoding(format!(
            "replacement characters in '{}'",
            trimmed
        )));
    }

    let repaired = match misdecoded_bytes(trimmed) {
        Some(bytes) => redecode(trimmed, bytes)?,
        None => trimmed.to_string(),
    };

    if !is_printable(&repaired) {
        return Err(MarketDataError::Encoding(format!(
            "non-printable characters in '{}'",
            repaired
        )));
    }

    Ok(repaired)
}

/// Original bytes of multi-byte text that was read one byte per char.
///
/// Covers both ISO-8859-1 readings (only U+0000..U+00FF) and windows-1252
/// readings, where bytes 0x80..0x9F became characters such as U+20AC or U+0160.
/// Returns `None` for plain ASCII and for text no single-byte reading explains.
fn misdecoded_bytes(text: &str) -> Option<Vec<u8>> {
    if text.is_ascii() {
        return None;
    }

    if text.chars().all(|c| (c as u32) <= 0xFF) {
        return Some(text.chars().map(|c| c as u32 as u8).collect());
    }

    let (bytes, _, had_errors) = WINDOWS_1252.encode(text);
    (!had_errors).then(|| bytes.into_owned())
}

/// Decode recovered bytes as UTF-8, or as whatever the detector guesses.
fn redecode(text: &str, bytes: Vec<u8>) -> Result<String, MarketDataError> {
    if let Ok(utf8) = String::from_utf8(bytes.clone()) {
        return Ok(utf8);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&bytes, true);
    let encoding = detector.guess(Some(DETECTOR_TLD), false);
    let (decoded, had_errors) = encoding.decode_without_bom_handling(&bytes);

    if had_errors {
        return Err(MarketDataError::Encoding(format!(
            "could not re-decode '{}' as {}",
            text,
            encoding.name()
        )));
    }

    Ok(decoded.trim().to_string())
}

fn is_printable(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| {
            !c.is_control()
                && c != char::REPLACEMENT_CHARACTER
                && !('\u{E000}'..='\u{F8FF}').contains(&c)
        })
}
