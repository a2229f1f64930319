//! Display formatting for amounts and timestamps.
//!
//! Timestamps are rendered in a fixed display offset rather than the host's
//! local zone, so every user sees the same wall-clock time.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Hours east of UTC used for displayed dates and times.
pub const DISPLAY_UTC_OFFSET_HOURS: i32 = 5;

const CURRENCY_CODE: &str = "PKR";

/// Render an amount as `PKR 1,234.50`; `None` renders as an empty string.
///
/// # Examples
/// ```
/// use famspend::format::format_currency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_currency(Some(Decimal::new(123_450, 2))), "PKR 1,234.50");
/// assert_eq!(format_currency(None), "");
/// ```
pub fn format_currency(amount: Option<Decimal>) -> String {
    let Some(amount) = amount else {
        return String::new();
    };
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}{CURRENCY_CODE} {}.{fraction}", group_thousands(whole))
}

/// Render the date part as `MM/DD/YY`.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&display_offset())
        .format("%m/%d/%y")
        .to_string()
}

/// Render the time part as `hh:mm AM`.
pub fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&display_offset())
        .format("%I:%M %p")
        .to_string()
}

fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    //! Regression coverage for display formatting.
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(Decimal::ZERO, "PKR 0.00")]
    #[case(Decimal::new(5, 1), "PKR 0.50")]
    #[case(Decimal::new(1000, 0), "PKR 1,000.00")]
    #[case(Decimal::new(1_234_567_891, 2), "PKR 12,345,678.91")]
    #[case(Decimal::new(12_345, 3), "PKR 12.35")]
    #[case(Decimal::new(-25_005, 3), "-PKR 25.01")]
    fn currency_uses_two_decimals_and_grouping(#[case] amount: Decimal, #[case] expected: &str) {
        assert_eq!(format_currency(Some(amount)), expected);
    }

    #[rstest]
    fn timestamps_render_in_display_offset() {
        let at = Utc
            .with_ymd_and_hms(2024, 12, 31, 20, 5, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(format_date(at), "01/01/25");
        assert_eq!(format_time(at), "01:05 AM");
    }

    #[rstest]
    fn afternoon_times_use_pm() {
        let at = Utc
            .with_ymd_and_hms(2024, 5, 1, 10, 30, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(format_date(at), "05/01/24");
        assert_eq!(format_time(at), "03:30 PM");
    }
}
