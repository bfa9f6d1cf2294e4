//! `Range` header interpretation.
//!
//! Only the single-range byte form `bytes=<start>-[<end>]` is honoured.
//! Suffix ranges (`bytes=-500`), multi-range requests and other units are
//! recognised and deliberately ignored: the response falls back to the
//! whole object with status 200, which every client must accept.

use axum::http::{header, HeaderMap};
use reel_blob::ResolvedRange;

/// What the client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No `Range` header.
    Absent,
    /// `bytes=<start>-[<end>]`
    Single { start: u64, end: Option<u64> },
    /// A header was sent but is not served as a range.
    Ignored(IgnoredRange),
}

/// Why a `Range` header was not honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredRange {
    Malformed,
    MultiRange,
    Suffix,
    OtherUnit,
    Inverted,
}

/// How the response must be framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeDecision {
    /// 200 with the whole object.
    Full,
    /// 206 with the given window.
    Partial(ResolvedRange),
    /// 416 with `Content-Range: bytes */{length}`.
    Unsatisfiable,
}

impl RangeRequest {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut values = headers.get_all(header::RANGE).iter();
        let Some(first) = values.next() else {
            return Self::Absent;
        };
        if values.next().is_some() {
            return Self::Ignored(IgnoredRange::MultiRange);
        }
        match first.to_str() {
            Ok(value) => Self::parse(value),
            Err(_) => Self::Ignored(IgnoredRange::Malformed),
        }
    }

    pub fn parse(value: &str) -> Self {
        let Some((unit, ranges)) = value.trim().split_once('=') else {
            return Self::Ignored(IgnoredRange::Malformed);
        };
        if !unit.trim().eq_ignore_ascii_case("bytes") {
            return Self::Ignored(IgnoredRange::OtherUnit);
        }
        if ranges.contains(',') {
            return Self::Ignored(IgnoredRange::MultiRange);
        }

        let Some((start, end)) = ranges.split_once('-') else {
            return Self::Ignored(IgnoredRange::Malformed);
        };
        let (start, end) = (start.trim(), end.trim());

        if start.is_empty() {
            return if parse_offset(end).is_some() {
                Self::Ignored(IgnoredRange::Suffix)
            } else {
                Self::Ignored(IgnoredRange::Malformed)
            };
        }

        let Some(start) = parse_offset(start) else {
            return Self::Ignored(IgnoredRange::Malformed);
        };
        let end = if end.is_empty() {
            None
        } else {
            match parse_offset(end) {
                Some(end) => Some(end),
                None => return Self::Ignored(IgnoredRange::Malformed),
            }
        };

        if matches!(end, Some(end) if end < start) {
            return Self::Ignored(IgnoredRange::Inverted);
        }
        Self::Single { start, end }
    }

    /// Decide the response mode against an object of `length` bytes.
    pub fn resolve(&self, length: u64) -> RangeDecision {
        match *self {
            // an empty object has no satisfiable byte positions at all
            Self::Single { .. } | Self::Ignored(_) if length == 0 => RangeDecision::Unsatisfiable,
            Self::Absent | Self::Ignored(_) => RangeDecision::Full,
            Self::Single { start, .. } if start >= length => RangeDecision::Unsatisfiable,
            Self::Single { start, end } => {
                let last = length - 1;
                let end = end.map_or(last, |end| end.min(last));
                RangeDecision::Partial(ResolvedRange::new(start, end, length))
            }
        }
    }
}

/// Digits only: `u64::from_str` alone would also accept a leading `+`.
fn parse_offset(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn partial(start: u64, end: u64, total: u64) -> RangeDecision {
        RangeDecision::Partial(ResolvedRange::new(start, end, total))
    }

    #[test]
    fn single_ranges() {
        assert_eq!(RangeRequest::parse("bytes=0-499"), RangeRequest::Single { start: 0, end: Some(499) });
        assert_eq!(RangeRequest::parse("bytes=500-"), RangeRequest::Single { start: 500, end: None });
        assert_eq!(RangeRequest::parse(" Bytes = 7 - 9 "), RangeRequest::Single { start: 7, end: Some(9) });
    }

    #[test]
    fn ignored_forms() {
        assert_eq!(RangeRequest::parse("bytes=-500"), RangeRequest::Ignored(IgnoredRange::Suffix));
        assert_eq!(RangeRequest::parse("bytes=0-1,5-6"), RangeRequest::Ignored(IgnoredRange::MultiRange));
        assert_eq!(RangeRequest::parse("items=0-1"), RangeRequest::Ignored(IgnoredRange::OtherUnit));
        assert_eq!(RangeRequest::parse("bytes=9-3"), RangeRequest::Ignored(IgnoredRange::Inverted));
        for bad in ["bytes", "bytes=", "bytes=-", "bytes=a-b", "bytes=+1-2", "bytes=1-x", "bytes=99999999999999999999-"] {
            assert_eq!(RangeRequest::parse(bad), RangeRequest::Ignored(IgnoredRange::Malformed), "{bad}");
        }
    }

    #[test]
    fn resolution() {
        let open = RangeRequest::Single { start: 0, end: None };
        assert_eq!(open.resolve(100), partial(0, 99, 100));

        let clamped = RangeRequest::Single { start: 90, end: Some(5000) };
        assert_eq!(clamped.resolve(100), partial(90, 99, 100));

        let past_end = RangeRequest::Single { start: 100, end: Some(200) };
        assert_eq!(past_end.resolve(100), RangeDecision::Unsatisfiable);

        assert_eq!(RangeRequest::Absent.resolve(100), RangeDecision::Full);
        assert_eq!(RangeRequest::Ignored(IgnoredRange::Suffix).resolve(100), RangeDecision::Full);
    }

    #[test]
    fn empty_object() {
        assert_eq!(RangeRequest::Absent.resolve(0), RangeDecision::Full);
        assert_eq!(RangeRequest::Single { start: 0, end: Some(0) }.resolve(0), RangeDecision::Unsatisfiable);
        assert_eq!(RangeRequest::Ignored(IgnoredRange::MultiRange).resolve(0), RangeDecision::Unsatisfiable);
    }

    #[test]
    fn repeated_header_is_multi_range() {
        let mut headers = HeaderMap::new();
        assert_eq!(RangeRequest::from_headers(&headers), RangeRequest::Absent);

        headers.append(header::RANGE, HeaderValue::from_static("bytes=0-1"));
        assert_eq!(RangeRequest::from_headers(&headers), RangeRequest::Single { start: 0, end: Some(1) });

        headers.append(header::RANGE, HeaderValue::from_static("bytes=4-5"));
        assert_eq!(RangeRequest::from_headers(&headers), RangeRequest::Ignored(IgnoredRange::MultiRange));
    }
}
