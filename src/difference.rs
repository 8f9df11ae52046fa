use chrono::NaiveDate;

/// Whole days from `earlier` to `later`; positive when `later` comes after.
///
/// Called as `day_difference(news_date, dream_date)`, so `-1` means the dream
/// happened one day after the news.
pub fn day_difference(later: NaiveDate, earlier: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Day difference floored into 7-day steps (-1..=-7 days is week -1).
pub fn week_difference(later: NaiveDate, earlier: NaiveDate) -> i64 {
    day_difference(later, earlier).div_euclid(7)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn dream_one_day_after_news_is_minus_one() {
        let news = ymd(2020, 3, 10);
        let dream = ymd(2020, 3, 11);
        assert_eq!(day_difference(news, dream), -1);
        assert_eq!(day_difference(dream, news), 1);
        assert_eq!(day_difference(news, news), 0);
    }

    #[test]
    fn crosses_leap_day_and_year_end() {
        assert_eq!(day_difference(ymd(2020, 3, 1), ymd(2020, 2, 28)), 2);
        assert_eq!(day_difference(ymd(2020, 1, 1), ymd(2019, 12, 31)), 1);
    }

    #[test]
    fn week_difference_floors() {
        let base = ymd(2020, 6, 15);
        assert_eq!(week_difference(ymd(2020, 6, 21), base), 0);
        assert_eq!(week_difference(ymd(2020, 6, 22), base), 1);
        assert_eq!(week_difference(ymd(2020, 6, 14), base), -1);
        assert_eq!(week_difference(ymd(2020, 6, 8), base), -1);
        assert_eq!(week_difference(ymd(2020, 6, 7), base), -2);
    }
}
