//! Clock formatting for elapsed time and playback positions

/// Render a second count as `minutes:seconds`, seconds zero-padded to two
/// digits. Non-finite or negative inputs render as `0:00`.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_renders_as_0_00() {
        assert_eq!(format_clock(0.0), "0:00");
    }

    #[test]
    fn sixty_five_renders_as_1_05() {
        assert_eq!(format_clock(65.0), "1:05");
    }

    #[test]
    fn five_hundred_ninety_nine_renders_as_9_59() {
        assert_eq!(format_clock(599.0), "9:59");
    }

    #[test]
    fn fractional_seconds_floor() {
        assert_eq!(format_clock(65.9), "1:05");
    }

    #[test]
    fn over_ten_minutes() {
        assert_eq!(format_clock(601.0), "10:01");
    }

    #[test]
    fn negative_and_non_finite_render_as_zero() {
        assert_eq!(format_clock(-5.0), "0:00");
        assert_eq!(format_clock(f64::NAN), "0:00");
        assert_eq!(format_clock(f64::INFINITY), "0:00");
    }
}
