use std::time::{SystemTime, UNIX_EPOCH};

use time::{OffsetDateTime, Time};

/// Nanoseconds since the Unix epoch.
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// `HH:MM:SS.mmm` (UTC) for a nanosecond timestamp.
pub fn time_of_day(timestamp_ns: u64) -> String {
    let time = OffsetDateTime::from_unix_timestamp_nanos(i128::from(timestamp_ns))
        .map(|at| at.time())
        .unwrap_or(Time::MIDNIGHT);
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        time.hour(),
        time.minute(),
        time.second(),
        time.millisecond()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_time_of_day() {
        let ts = ((13 * 3600 + 4 * 60 + 5) * 1000 + 67) * 1_000_000;
        assert_eq!(time_of_day(ts), "13:04:05.067");
        assert_eq!(time_of_day(86_400 * 1_000_000_000), "00:00:00.000");
    }

    #[test]
    fn clock_moves_forward() {
        let a = now_ns();
        let b = now_ns();
        assert!(b >= a);
        assert!(a > 0);
    }
}
