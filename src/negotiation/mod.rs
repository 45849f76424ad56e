//! # Negotiation Module
//!
//! Content negotiation in both directions:
//!
//! - **Response**: [`negotiate`] picks which declared content type a response
//!   body is encoded as, given the request's `Accept` header.
//! - **Request**: [`select_content_type`] picks which declared content type the
//!   request body is decoded as, given its `Content-Type` header.
//!
//! ## Selection rules
//!
//! Each declared type is scored with the quality of the most specific `Accept`
//! range that covers it (`type/subtype;params` beats `type/subtype` beats
//! `type/*` beats `*/*`). `q=0` marks a type as unacceptable. The highest score
//! wins and declaration order breaks ties, so the result is deterministic for
//! any fixed input. A missing `Accept` header, or one in which no range parses,
//! selects the first declared type.
//!
//! ```rust
//! use verbtree::negotiation::negotiate;
//!
//! let offered = vec!["text/plain".to_string(), "application/json".to_string()];
//! assert_eq!(negotiate(Some("application/json"), &offered).unwrap(), "application/json");
//! assert_eq!(negotiate(None, &offered).unwrap(), "text/plain");
//! ```

mod media_type;

pub use media_type::MediaType;

use std::fmt;

/// Quality values are kept in thousandths (`q=0.5` is 500).
pub const MAX_QUALITY: u16 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    InvalidMediaType(String),
    /// None of the offered representations is acceptable (HTTP 406).
    NotAcceptable,
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationError::InvalidMediaType(raw) => write!(f, "invalid media type `{raw}`"),
            NegotiationError::NotAcceptable => {
                write!(f, "no offered content type satisfies the Accept header")
            }
        }
    }
}

impl std::error::Error for NegotiationError {}

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    pub media_type: MediaType,
    pub quality: u16,
}

/// Parse an `Accept` header, silently skipping malformed entries.
#[must_use]
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    header
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let mut media_type = MediaType::parse(entry).ok()?;
            let quality = match media_type.remove_param("q") {
                Some(raw) => parse_quality(&raw)?,
                None => MAX_QUALITY,
            };
            Some(MediaRange {
                media_type,
                quality,
            })
        })
        .collect()
}

/// `0`, `0.5`, `1.000` → thousandths; anything outside `[0, 1]` or with more
/// than three decimals is rejected.
fn parse_quality(raw: &str) -> Option<u16> {
    let (whole, fraction) = match raw.split_once('.') {
        Some((w, f)) => (w, f),
        None => (raw, ""),
    };
    if fraction.len() > 3 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: u16 = match whole {
        "0" => 0,
        "1" => 1,
        _ => return None,
    };
    let mut thousandths = 0u16;
    for (i, digit) in fraction.chars().enumerate() {
        let d = digit.to_digit(10)? as u16;
        thousandths += d * 10u16.pow(2 - i as u32);
    }
    let quality = whole * MAX_QUALITY + thousandths;
    (quality <= MAX_QUALITY).then_some(quality)
}

fn quality_for(ranges: &[MediaRange], offered: &MediaType) -> u16 {
    let mut best: Option<&MediaRange> = None;
    for range in ranges.iter().filter(|r| r.media_type.matches(offered)) {
        let more_specific = best.map_or(true, |b| {
            range.media_type.specificity() > b.media_type.specificity()
        });
        if more_specific {
            best = Some(range);
        }
    }
    best.map_or(0, |r| r.quality)
}

/// Choose the response content type among `offered` for the given `Accept` value.
pub fn negotiate<'a>(
    accept: Option<&str>,
    offered: &'a [String],
) -> Result<&'a str, NegotiationError> {
    let first = offered.first().ok_or(NegotiationError::NotAcceptable)?;
    let ranges = accept.map(parse_accept).unwrap_or_default();
    if ranges.is_empty() {
        return Ok(first);
    }

    let mut best: Option<(&'a str, u16)> = None;
    for candidate in offered {
        let Ok(media_type) = MediaType::parse(candidate) else {
            continue;
        };
        let quality = quality_for(&ranges, &media_type);
        if quality == 0 {
            continue;
        }
        if best.map_or(true, |(_, q)| quality > q) {
            best = Some((candidate.as_str(), quality));
        }
    }
    best.map(|(ct, _)| ct).ok_or(NegotiationError::NotAcceptable)
}

/// First declared request content type (possibly a range such as `text/*`)
/// covering the request's `Content-Type`.
#[must_use]
pub fn select_content_type<'a>(content_type: &str, accepted: &'a [String]) -> Option<&'a str> {
    let requested = MediaType::parse(content_type).ok()?;
    accepted
        .iter()
        .find(|declared| {
            MediaType::parse(declared).is_ok_and(|range| {
                let main_ok = range.main_type() == "*" || range.main_type() == requested.main_type();
                let sub_ok = range.sub_type() == "*" || range.sub_type() == requested.sub_type();
                main_ok && sub_ok
            })
        })
        .map(String::as_str)
}
