//! Date helper functions

use chrono::NaiveDate;

/// Format a date in the site's long form (like "1 January 2023")
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(format_date(&date), "1 January 2023");
    }

    #[test]
    fn test_format_date_two_digit_day() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 28).unwrap();
        assert_eq!(format_date(&date), "28 November 2024");
    }
}
