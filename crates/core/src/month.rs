use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// A calendar month independent of year (1 = January).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarMonth(u32);

impl CalendarMonth {
    pub fn new(number: u32) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self(number))
    }

    pub fn of(instant: DateTime<Utc>) -> Self {
        Self(instant.month())
    }

    /// Parses a full English month name, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_ascii_lowercase();
        MONTH_NAMES
            .iter()
            .position(|name| *name == needle)
            .map(|index| Self(index as u32 + 1))
    }

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[(self.0 - 1) as usize]
    }

    pub fn title(self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title())
    }
}

/// Trailing span of whole calendar months that aggregate queries may read.
///
/// The window ends at the anchor instant and starts at 00:00 UTC on the first day of
/// the month `months - 1` months before the anchor month. Rows before the start are
/// invisible to stats and leaderboards but are never deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibilityWindow {
    anchor: DateTime<Utc>,
    start: DateTime<Utc>,
}

impl VisibilityWindow {
    pub fn trailing(anchor: DateTime<Utc>, months: u32) -> Self {
        let months = months.max(1);
        let offset = anchor.year() * 12 + anchor.month0() as i32 - (months as i32 - 1);
        let year = offset.div_euclid(12);
        let month = offset.rem_euclid(12) as u32 + 1;
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        Self { anchor, start }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn current_month(&self) -> CalendarMonth {
        CalendarMonth::of(self.anchor)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start
    }
}
