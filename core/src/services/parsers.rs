use std::str::FromStr;

use chrono::{Months, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::{ReportError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d, %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parses the `Date/Time` column of a trade export. The time of day is
/// dropped, only the calendar date is relevant for rates and holding periods.
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    for format in DATE_TIME_FORMATS.iter() {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(timestamp.date());
        }
    }
    NaiveDate::parse_from_str(date_str, DATE_FORMAT)
        .map_err(|_| ReportError::InvalidDate(date_str.to_string()))
}

/// Converts a numeric cell to a decimal while ignoring thousands separators
/// and whitespace, e.g. `"1,234.50"` or `" 12 "`.
pub fn decimal_cleanup(number_str: &str) -> Result<Decimal> {
    let cleaned: String = number_str
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    Decimal::from_str(&cleaned).map_err(|_| ReportError::InvalidNumber(number_str.to_string()))
}

pub fn is_number(number_str: &str) -> bool {
    Decimal::from_str(number_str.trim()).is_ok()
}

/// Same calendar day `years` years earlier. February 29 becomes February 28
/// when the target year is not a leap year.
pub fn subtract_years(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    date.checked_sub_months(Months::new(years * 12))
}
