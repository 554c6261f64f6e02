use chrono::{Datelike, NaiveDate};

/// How often a fresh full image file is started. Parsed from the first
/// letter of the configured keyword, case-insensitively, so `daily`, `Dag`
/// and `d` all mean the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RotationInterval {
    /// `None` for anything unrecognized; the image name then carries no date
    /// suffix at all.
    #[must_use]
    pub fn parse(keyword: &str) -> Option<RotationInterval> {
        match keyword.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('d') => Some(RotationInterval::Daily),
            Some('w') => Some(RotationInterval::Weekly),
            Some('m') => Some(RotationInterval::Monthly),
            Some('y') => Some(RotationInterval::Yearly),
            Some(_) | None => None,
        }
    }
}

/// The target image filename for a run on the given date.
///
/// The week number is the ISO week; the year next to it stays the calendar
/// year of the date, so the first days of January can pair with week 52/53.
#[must_use]
pub fn image_file_name(
    base_name: &str,
    interval: Option<RotationInterval>,
    date: NaiveDate,
) -> String {
    match interval {
        Some(RotationInterval::Daily) => format!(
            "{}_{:04}-{:02}-{:02}.img",
            base_name,
            date.year(),
            date.month(),
            date.day()
        ),
        Some(RotationInterval::Weekly) => format!(
            "{}_{:04}-wk{:02}.img",
            base_name,
            date.year(),
            date.iso_week().week()
        ),
        Some(RotationInterval::Monthly) => {
            format!("{}_{:04}-{:02}.img", base_name, date.year(), date.month())
        }
        Some(RotationInterval::Yearly) => format!("{}_{:04}.img", base_name, date.year()),
        None => format!("{base_name}.img"),
    }
}
