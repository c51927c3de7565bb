use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Default retry attempts after the initial GET.
pub const MAX_RETRIES: u32 = 2;
/// Base delay before the first retry.
pub const BASE_DELAY_MS: u64 = 500;

/// Session reads are retried on gateway statuses and on bodies that read
/// like a proxy or model backend hiccup.
fn transient_body_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)too many requests|rate.?limit|temporarily unavailable|service.?unavailable|gateway.?time.?out|upstream.?connect|connection.?(refused|reset)",
        )
        .expect("transient body pattern must compile")
    })
}

pub fn is_retryable_http_error(status: u16, error_text: &str) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
        || transient_body_pattern().is_match(error_text)
}

/// Doubling backoff: 500 ms, 1 s, 2 s, ...
pub fn retry_delay(attempt: u32) -> Duration {
    let exponent = attempt.min(30);
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(exponent)))
}
