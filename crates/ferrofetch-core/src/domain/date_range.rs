use time::macros::format_description;
use time::Date;

use crate::ValidationError;

const OPEN_START: &str = "1900-1-1";
const OPEN_END: &str = "2100-1-1";

/// Inclusive start/end pair for historic price requests.
///
/// Both bounds are kept as strings and passed to the upstream untouched. The
/// default range is wide enough to cover any listing's full history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    start: String,
    end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Builds a range from typed dates, rendered as `YYYY-MM-DD`.
    pub fn between(start: Date, end: Date) -> Self {
        Self::new(format_iso_date(start), format_iso_date(end))
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self
    }

    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end = end.into();
        self
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::new(OPEN_START, OPEN_END)
    }
}

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_iso_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: input.to_owned(),
        }
    })
}

pub(crate) fn format_iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
