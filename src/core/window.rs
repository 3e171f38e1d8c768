use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Length of the rolling service-frequency window
pub const SERVICE_WINDOW_YEARS: i32 = 5;

/// Start of the service-frequency window: midnight UTC on the same month and
/// day, `SERVICE_WINDOW_YEARS` years before `now`.
///
/// A 29 February anchor with no leap day in the target year falls back to
/// 28 February. The bound is inclusive.
pub fn service_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    let year = now.year() - SERVICE_WINDOW_YEARS;
    let date = NaiveDate::from_ymd_opt(year, now.month(), now.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, now.month(), now.day() - 1))
        .unwrap_or(NaiveDate::MIN);

    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
