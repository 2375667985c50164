use chrono::{Datelike, NaiveDate};

/// Age in whole years on `today`; zero for birth dates in the future.
#[inline]
pub fn calculate_age(birth_date: NaiveDate, today: NaiveDate) -> u32 {
    if birth_date > today {
        return 0;
    }

    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }

    age.max(0) as u32
}

/// Age band index used by preferences and the age-range filter.
///
/// Returns `None` for ages below 20, which fall outside every band.
///
/// | band | ages   |
/// |------|--------|
/// | 1    | 20-22  |
/// | 2    | 23-25  |
/// | 3    | 26-28  |
/// | 4    | 29-30  |
/// | 5    | 31+    |
#[inline]
pub fn age_band(age: u32) -> Option<u8> {
    match age {
        20..=22 => Some(1),
        23..=25 => Some(2),
        26..=28 => Some(3),
        29..=30 => Some(4),
        31.. => Some(5),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let birth = date(2000, 6, 15);
        assert_eq!(calculate_age(birth, date(2025, 6, 14)), 24);
        assert_eq!(calculate_age(birth, date(2025, 6, 15)), 25);
        assert_eq!(calculate_age(birth, date(2025, 12, 31)), 25);
    }

    #[test]
    fn test_leap_day_birthday() {
        let birth = date(2004, 2, 29);
        assert_eq!(calculate_age(birth, date(2025, 2, 28)), 20);
        assert_eq!(calculate_age(birth, date(2025, 3, 1)), 21);
    }

    #[test]
    fn test_future_birth_date() {
        assert_eq!(calculate_age(date(2030, 1, 1), date(2025, 1, 1)), 0);
    }

    #[test]
    fn test_age_bands() {
        assert_eq!(age_band(19), None);
        assert_eq!(age_band(20), Some(1));
        assert_eq!(age_band(22), Some(1));
        assert_eq!(age_band(23), Some(2));
        assert_eq!(age_band(28), Some(3));
        assert_eq!(age_band(29), Some(4));
        assert_eq!(age_band(30), Some(4));
        assert_eq!(age_band(31), Some(5));
        assert_eq!(age_band(64), Some(5));
    }
}
