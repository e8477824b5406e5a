use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, as carried in header and response
/// timestamps.
///
/// Clocks set before the epoch report `0`.
#[must_use]
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
