use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static FULL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}[-/][0-9]{1,2}[-/][0-9]{1,2}").expect("valid date regex"));

/// Derive the order date for a ledger row.
///
/// A `YYYY-MM-DD` / `YYYY/MM/DD` date text is taken as-is and the year/month
/// columns are ignored. Otherwise the date text only carries the day: for
/// `"M/D"`, `"M-D"` or `"M.D"` the second token is the day, a bare `"D"` is the
/// day itself, and year and month come from their own columns.
///
/// Returns `None` whenever the pieces do not form a real calendar date.
pub fn parse_order_date(year: &str, month: &str, date_text: &str) -> Option<NaiveDate> {
    let s = date_text.trim();

    if FULL_DATE.is_match(s) {
        let parts: Vec<&str> = s.split(['-', '/']).collect();
        let y = parse_int(parts.first()?)?;
        let m = parse_int(parts.get(1)?)?;
        let d = parse_int(parts.get(2)?)?;
        return build_date(y, m, d);
    }

    let y = non_zero(year)?;
    let m = non_zero(month)?;
    if s.is_empty() {
        return None;
    }

    let parts: Vec<&str> = s.split(['-', '/', '.']).collect();
    let day_token = if parts.len() >= 2 { parts[1] } else { parts[0] };
    let d = parse_int(day_token)?;
    build_date(y, m, d)
}

fn parse_int(token: &str) -> Option<i64> {
    token.trim().parse::<i64>().ok()
}

/// Year and month columns must be present and non-zero.
fn non_zero(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    parse_int(raw).filter(|v| *v != 0)
}

fn build_date(y: i64, m: i64, d: i64) -> Option<NaiveDate> {
    if !(1..=9999).contains(&y) {
        return None;
    }
    let m = u32::try_from(m).ok()?;
    let d = u32::try_from(d).ok()?;
    NaiveDate::from_ymd_opt(y as i32, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_date_wins_over_columns() {
        assert_eq!(parse_order_date("2019", "7", "2024-03-05"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_order_date("", "", "2024/3/5"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_order_date("1999", "12", "2023-11-30"), Some(ymd(2023, 11, 30)));
    }

    #[test]
    fn test_full_date_with_trailing_time_is_rejected() {
        assert_eq!(parse_order_date("2024", "3", "2024-03-05 10:00"), None);
    }

    #[test]
    fn test_day_from_second_token() {
        assert_eq!(parse_order_date("2024", "3", "3/15"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_order_date("2024", "3", "3-15"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_order_date("2024", "3", "3.15"), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn test_bare_day() {
        assert_eq!(parse_order_date("2024", "2", "29"), Some(ymd(2024, 2, 29)));
        assert_eq!(parse_order_date(" 2024 ", " 2 ", " 7 "), Some(ymd(2024, 2, 7)));
    }

    #[test]
    fn test_missing_pieces() {
        assert_eq!(parse_order_date("", "3", "15"), None);
        assert_eq!(parse_order_date("2024", "", "15"), None);
        assert_eq!(parse_order_date("2024", "3", ""), None);
        assert_eq!(parse_order_date("0", "3", "15"), None);
        assert_eq!(parse_order_date("", "", ""), None);
    }

    #[test]
    fn test_invalid_calendar_dates() {
        assert_eq!(parse_order_date("2024", "4", "31"), None);
        assert_eq!(parse_order_date("2023", "2", "29"), None);
        assert_eq!(parse_order_date("2024", "13", "1"), None);
        assert_eq!(parse_order_date("2024", "3", "0"), None);
        assert_eq!(parse_order_date("2024", "-3", "1"), None);
        assert_eq!(parse_order_date("2024", "3", "오전"), None);
        assert_eq!(parse_order_date("", "", "2024-02-30"), None);
    }
}
