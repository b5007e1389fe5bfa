/// Returns true for a well-formed `HH:MM` 24-hour time string.
pub fn is_valid_time(value: &str) -> bool {
    let mut parts = value.splitn(2, ':');
    let (Some(hours), Some(minutes)) = (parts.next(), parts.next()) else {
        return false;
    };
    if hours.len() != 2 || minutes.len() != 2 {
        return false;
    }
    match (hours.parse::<u8>(), minutes.parse::<u8>()) {
        (Ok(h), Ok(m)) => h < 24 && m < 60,
        _ => false,
    }
}

/// Returns true for a day-of-week index in `0..=6` (0 = Sunday).
pub fn is_valid_day(day: i16) -> bool {
    (0..=6).contains(&day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_times() {
        assert!(is_valid_time("00:00"));
        assert!(is_valid_time("07:30"));
        assert!(is_valid_time("23:59"));
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("07:60"));
        assert!(!is_valid_time("7:30"));
        assert!(!is_valid_time("0730"));
        assert!(!is_valid_time(""));
    }

    #[test]
    fn day_bounds() {
        assert!(is_valid_day(0));
        assert!(is_valid_day(6));
        assert!(!is_valid_day(7));
        assert!(!is_valid_day(-1));
    }
}
