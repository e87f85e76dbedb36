//! Calendar month arithmetic for interest bookkeeping dates.

use time::{Date, Month, OffsetDateTime};

/// Add `months` calendar months to `datetime`, keeping the time of day and
/// offset.
///
/// If the day of the month does not exist in the target month, the last day
/// of that month is used instead, e.g. 31 January plus one month is
/// 28 (or 29) February.
///
/// Returns `None` if the result is outside the range of dates supported by
/// `time`.
pub fn add_months(datetime: OffsetDateTime, months: u32) -> Option<OffsetDateTime> {
    let zero_based_month = i64::from(u8::from(datetime.month())) - 1;
    let total_months = i64::from(datetime.year()) * 12 + zero_based_month + i64::from(months);

    let year = i32::try_from(total_months.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(total_months.rem_euclid(12) + 1).ok()?).ok()?;
    let day = datetime.day().min(last_day_of_month(year, month));

    let date = Date::from_calendar_date(year, month, day).ok()?;

    Some(datetime.replace_date(date))
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::add_months;

    #[test]
    fn adds_months_within_year() {
        let got = add_months(datetime!(2025-01-15 10:30 +13), 3);

        assert_eq!(got, Some(datetime!(2025-04-15 10:30 +13)));
    }

    #[test]
    fn rolls_over_into_next_year() {
        let got = add_months(datetime!(2025-11-02 08:00 UTC), 12);

        assert_eq!(got, Some(datetime!(2026-11-02 08:00 UTC)));

        let got = add_months(datetime!(2025-11-02 08:00 UTC), 6);

        assert_eq!(got, Some(datetime!(2026-05-02 08:00 UTC)));
    }

    #[test]
    fn clamps_to_end_of_shorter_month() {
        assert_eq!(
            add_months(datetime!(2025-01-31 00:00 UTC), 1),
            Some(datetime!(2025-02-28 00:00 UTC))
        );
        assert_eq!(
            add_months(datetime!(2024-01-31 00:00 UTC), 1),
            Some(datetime!(2024-02-29 00:00 UTC))
        );
        assert_eq!(
            add_months(datetime!(2025-08-31 00:00 UTC), 1),
            Some(datetime!(2025-09-30 00:00 UTC))
        );
    }

    #[test]
    fn zero_months_is_identity() {
        let datetime = datetime!(2025-06-30 23:59:59 -05);

        assert_eq!(add_months(datetime, 0), Some(datetime));
    }
}
