//! Academic year labels.
//!
//! A label like `"2024/25"` partitions all timetable state; one active grid
//! exists per year. The school year starts in September, so dates before
//! September belong to the label that began the previous calendar year.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Academic year label in `"YYYY/YY"` form, e.g. `"2024/25"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicYear(String);

impl AcademicYear {
    /// The academic year containing today's date (UTC).
    pub fn current() -> Self {
        Self::from_date(chrono::Utc::now().date_naive())
    }

    /// The academic year containing the given date, with a September boundary.
    pub fn from_date(date: chrono::NaiveDate) -> Self {
        use chrono::Datelike;
        let start = if date.month() < 9 {
            date.year() - 1
        } else {
            date.year()
        };
        Self::from_start_year(start)
    }

    /// Build the label starting in the given calendar year, e.g. 2024 -> "2024/25".
    pub fn from_start_year(start: i32) -> Self {
        AcademicYear(format!("{}/{:02}", start, (start + 1) % 100))
    }

    /// The label string, e.g. `"2024/25"`.
    pub fn label(&self) -> &str {
        &self.0
    }

    /// Calendar year the academic year starts in.
    pub fn start_year(&self) -> i32 {
        // Validated on construction, the prefix is always four digits.
        self.0[..4].parse().unwrap_or(0)
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AcademicYear {
    type Err = String;

    /// Parse an academic year label.
    ///
    /// # Arguments
    /// * `s` - Label in `"YYYY/YY"` form where the suffix is the start year
    ///   plus one, modulo 100
    ///
    /// # Returns
    /// * `Ok(AcademicYear)` if valid
    /// * `Err` describing the malformation otherwise
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('/')
            .ok_or_else(|| format!("Academic year '{}' must be in YYYY/YY form", s))?;

        if start.len() != 4 || !start.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Academic year '{}' has an invalid start year", s));
        }
        if end.len() != 2 || !end.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Academic year '{}' has an invalid end year", s));
        }

        let start_year: i32 = start
            .parse()
            .map_err(|_| format!("Academic year '{}' has an invalid start year", s))?;
        let end_year: i32 = end
            .parse()
            .map_err(|_| format!("Academic year '{}' has an invalid end year", s))?;

        if (start_year + 1) % 100 != end_year {
            return Err(format!(
                "Academic year '{}' is not consecutive: expected suffix {:02}",
                s,
                (start_year + 1) % 100
            ));
        }

        Ok(AcademicYear(s.to_string()))
    }
}

impl TryFrom<String> for AcademicYear {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AcademicYear> for String {
    fn from(year: AcademicYear) -> Self {
        year.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_valid_label() {
        let year: AcademicYear = "2024/25".parse().unwrap();
        assert_eq!(year.label(), "2024/25");
        assert_eq!(year.start_year(), 2024);
    }

    #[test]
    fn test_parse_rejects_non_consecutive() {
        assert!("2024/26".parse::<AcademicYear>().is_err());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("2024".parse::<AcademicYear>().is_err());
        assert!("24/25".parse::<AcademicYear>().is_err());
        assert!("2024/2025".parse::<AcademicYear>().is_err());
        assert!("abcd/ef".parse::<AcademicYear>().is_err());
    }

    #[test]
    fn test_century_rollover() {
        let year = AcademicYear::from_start_year(2099);
        assert_eq!(year.label(), "2099/00");
        assert_eq!("2099/00".parse::<AcademicYear>().unwrap(), year);
    }

    #[test]
    fn test_from_date_september_boundary() {
        let spring = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        assert_eq!(AcademicYear::from_date(spring).label(), "2024/25");

        let autumn = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        assert_eq!(AcademicYear::from_date(autumn).label(), "2025/26");
    }

    #[test]
    fn test_serde_roundtrip() {
        let year: AcademicYear = "2024/25".parse().unwrap();
        let json = serde_json::to_string(&year).unwrap();
        assert_eq!(json, "\"2024/25\"");
        let back: AcademicYear = serde_json::from_str(&json).unwrap();
        assert_eq!(back, year);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        assert!(serde_json::from_str::<AcademicYear>("\"2024-25\"").is_err());
    }
}
