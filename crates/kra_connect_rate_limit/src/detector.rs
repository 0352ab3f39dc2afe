//! Throttling hints from response headers.

use reqwest::header::HeaderMap;
use std::time::Duration;

/// Parse `Retry-After-Ms` or `Retry-After` from a response.
///
/// `Retry-After-Ms` (fractional milliseconds) wins over `Retry-After`
/// (whole seconds). Zero, negative, unparseable and unrepresentable values are
/// ignored; the HTTP-date form of `Retry-After` is not supported.
///
/// # Example
///
/// ```
/// use kra_connect_rate_limit::parse_retry_after;
/// use reqwest::header::{HeaderMap, HeaderValue};
/// use std::time::Duration;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("retry-after", HeaderValue::from_static("3"));
/// assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(3)));
/// ```
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    if let Some(ms) = header_str(headers, "retry-after-ms").and_then(|s| s.parse::<f64>().ok())
        && ms > 0.0
        && let Ok(delay) = Duration::try_from_secs_f64(ms / 1000.0)
    {
        return Some(delay);
    }

    header_str(headers, "retry-after")
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

fn header_str<'a>(headers: &'a HeaderMap, key: &str) -> Option<&'a str> {
    headers.get(key)?.to_str().ok().map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn milliseconds_take_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("10"));
        headers.insert("retry-after-ms", HeaderValue::from_static("1500"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert("retry-after", HeaderValue::from_static("0"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert("retry-after-ms", HeaderValue::from_static("-5"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn oversized_milliseconds_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after-ms", HeaderValue::from_static("1e300"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert("retry-after-ms", HeaderValue::from_static("inf"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert("retry-after", HeaderValue::from_static("4"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(4)));
    }

    #[test]
    fn missing_headers_yield_none() {
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);
    }
}
