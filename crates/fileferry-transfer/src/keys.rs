//! Object key layout helpers.
//!
//! Daily files live at `{prefix}/{YYYY}/{YYYY-MM-DD}{suffix}`.

use chrono::NaiveDate;

/// Key for one day's file.
pub fn key_for_date(prefix: &str, suffix: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}/{}{}",
        prefix,
        date.format("%Y"),
        date.format("%Y-%m-%d"),
        suffix
    )
}

/// Date encoded in a key's final path segment, if any.
pub fn date_from_key(key: &str) -> Option<NaiveDate> {
    let basename = key.rsplit('/').next()?;
    let stem = basename.split('.').next()?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout_round_trips() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let key = key_for_date("us_stocks_sip/day_aggs_v1", ".csv.gz", date);
        assert_eq!(key, "us_stocks_sip/day_aggs_v1/2024/2024-01-02.csv.gz");
        assert_eq!(date_from_key(&key), Some(date));
    }

    #[test]
    fn date_from_key_rejects_other_names() {
        assert_eq!(date_from_key("us_stocks_sip/day_aggs_v1/README.txt"), None);
        assert_eq!(date_from_key("us_stocks_sip/day_aggs_v1/2024/notes.csv.gz"), None);
        assert_eq!(date_from_key(""), None);
    }

    #[test]
    fn date_from_key_handles_bare_names() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(date_from_key("2023-12-31.csv.gz"), Some(date));
    }
}
