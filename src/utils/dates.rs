use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde::{Deserialize, Deserializer};

/// Number of days in a Gregorian month: day 0 of the following month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        year.checked_add(1).map(|y| (y, 1))
    } else {
        month.checked_add(1).map(|m| (year, m))
    };
    next.and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1))
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(0)
}

pub fn first_day(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn last_day(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
}

/// Server-local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; a timestamp is reduced to its UTC day.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.naive_utc().date())
    })
}

pub fn deserialize_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_day(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

pub fn deserialize_opt_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_day(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lengths_follow_gregorian_rules() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 13), 0);
    }

    #[test]
    fn out_of_range_years_have_no_days() {
        assert_eq!(days_in_month(i32::MAX, 12), 0);
        assert_eq!(days_in_month(i32::MIN, 1), 0);
        assert_eq!(days_in_month(2024, u32::MAX), 0);
        assert_eq!(last_day(i32::MAX, 12), None);
    }

    #[test]
    fn timestamps_are_normalized_to_utc_day() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_day("2024-03-05"), Some(d));
        assert_eq!(parse_day("2024-03-05T18:30:00Z"), Some(d));
        assert_eq!(parse_day("2024-03-06T01:00:00+05:30"), Some(d));
        assert_eq!(parse_day("05/03/2024"), None);
    }
}
