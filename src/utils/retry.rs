// Upstream retry hints
// Author: kelexine (https://github.com/kelexine)
//
// The relay never retries a generation itself. The hint parsed here is passed
// to callers (Retry-After header, traffic generator back-off).

use serde_json::Value;
use std::time::Duration;

/// Upper bound applied to upstream retry hints.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Parse Google's retryDelay from an error body (e.g. "0.457639761s", "40s").
/// Returns `None` when the body carries no RetryInfo detail.
pub fn parse_retry_delay(error_json: &str) -> Option<Duration> {
    let parsed: Value = serde_json::from_str(error_json).ok()?;

    // Navigate: error.details[] -> find RetryInfo -> retryDelay
    let details = parsed.get("error")?.get("details")?.as_array()?;

    details
        .iter()
        .filter(|detail| {
            detail.get("@type").and_then(Value::as_str)
                == Some("type.googleapis.com/google.rpc.RetryInfo")
        })
        .find_map(|detail| detail.get("retryDelay")?.as_str())
        .and_then(parse_duration_string)
}

/// Parse duration strings like "0.457639761s", "40s", "1.5s",
/// capped at [`MAX_RETRY_DELAY`].
fn parse_duration_string(duration_str: &str) -> Option<Duration> {
    let seconds: f64 = duration_str.strip_suffix('s')?.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    let capped_seconds = seconds.min(MAX_RETRY_DELAY.as_secs_f64());
    Some(Duration::from_millis((capped_seconds * 1000.0) as u64))
}
