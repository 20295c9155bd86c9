/// Format a playback position as `mm:ss`.
///
/// Fractional seconds round up, so a clip of 59.5s reads `01:00`. Minutes are
/// not wrapped into hours. Negative or non-finite positions read `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0. {
        return String::from("00:00");
    }
    let total = seconds.ceil() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_minutes_and_seconds() {
        assert_eq!(format_time(0.), "00:00");
        assert_eq!(format_time(61.), "01:01");
        assert_eq!(format_time(600.), "10:00");
        assert_eq!(format_time(6000.), "100:00");
    }

    #[test]
    fn rounds_partial_seconds_up() {
        assert_eq!(format_time(0.2), "00:01");
        assert_eq!(format_time(59.5), "01:00");
        assert_eq!(format_time(119.01), "02:00");
    }

    #[test]
    fn unknown_duration_reads_zero() {
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(f64::INFINITY), "00:00");
        assert_eq!(format_time(-3.), "00:00");
    }
}
