use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current time in `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if the timezone name is not a known canonical name.
pub fn now_in(canonical_timezone: &str) -> Option<OffsetDateTime> {
    get_local_offset(canonical_timezone).map(|offset| OffsetDateTime::now_utc().to_offset(offset))
}
