//! Windows FILETIME conversion.
//!
//! FILETIME is a 64-bit count of 100-ns ticks since 1601-01-01 UTC. The
//! container persists it verbatim; this module only exists so callers can
//! work with a stable intermediate (seconds + nanoseconds since the Unix
//! epoch) instead.

/// 1601-01-01 UTC to 1970-01-01 UTC, in 100-ns ticks.
const TICKS_TO_UNIX_EPOCH: i64 = 116_444_736_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Converts a FILETIME value to (seconds, nanoseconds) since the Unix epoch.
/// Dates before 1601 or outside `i64` range saturate rather than panic.
pub fn filetime_to_unix(filetime: i64) -> (i64, u32) {
    let ticks_since_unix = filetime.saturating_sub(TICKS_TO_UNIX_EPOCH);
    let seconds = ticks_since_unix.div_euclid(TICKS_PER_SECOND);
    let remainder_ticks = ticks_since_unix.rem_euclid(TICKS_PER_SECOND);
    (seconds, (remainder_ticks * 100) as u32)
}

/// Converts (seconds, nanoseconds) since the Unix epoch to a FILETIME value.
pub fn unix_to_filetime(seconds: i64, nanoseconds: u32) -> i64 {
    let ticks = seconds
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add((nanoseconds / 100) as i64);
    ticks.saturating_add(TICKS_TO_UNIX_EPOCH)
}

/// FILETIME for the current instant, used when the caller does not supply
/// an explicit modification time at `Add`.
pub fn now() -> i64 {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    unix_to_filetime(duration.as_secs() as i64, duration.subsec_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch_round_trips() {
        let ft = unix_to_filetime(0, 0);
        assert_eq!(filetime_to_unix(ft), (0, 0));
    }

    #[test]
    fn arbitrary_instant_round_trips() {
        let (secs, nanos) = (1_700_000_000i64, 123_400_000u32);
        let ft = unix_to_filetime(secs, nanos);
        assert_eq!(filetime_to_unix(ft), (secs, nanos));
    }

    #[test]
    fn known_filetime_matches_unix_seconds() {
        // 2009-02-13T23:31:30Z == Unix 1234567890, a commonly cited FILETIME
        // conversion fixture.
        let ft = unix_to_filetime(1_234_567_890, 0);
        assert_eq!(ft, 128_790_414_900_000_000);
    }
}
