/// Timestamps are unix milliseconds (UTC), matching the stored record format.
pub type UnixMillis = i64;

/// Current wall-clock time in unix milliseconds.
pub fn now_millis() -> UnixMillis {
    chrono::Utc::now().timestamp_millis()
}
