//! Date helper functions

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Display language for dates and fallback strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    /// Brazilian Portuguese
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    /// English
    #[serde(rename = "en")]
    En,
}

const PT_BR_MONTHS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

const EN_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl Locale {
    /// Parse a language tag like `pt-BR` or `en-US`
    pub fn from_tag(tag: &str) -> Self {
        let lower = tag.to_ascii_lowercase();
        if lower == "en" || lower.starts_with("en-") || lower.starts_with("en_") {
            Locale::En
        } else {
            Locale::PtBr
        }
    }

    /// Abbreviated month name, `month` is 1-based
    pub fn month_abbrev(&self, month: u32) -> &'static str {
        let months = match self {
            Locale::PtBr => &PT_BR_MONTHS,
            Locale::En => &EN_MONTHS,
        };
        months[(month.clamp(1, 12) - 1) as usize]
    }

    /// Shown instead of a date that is missing or unparseable
    pub fn missing_date(&self) -> &'static str {
        match self {
            Locale::PtBr => "Data indisponível",
            Locale::En => "Date unavailable",
        }
    }

    fn time_joiner(&self) -> &'static str {
        match self {
            Locale::PtBr => "às",
            Locale::En => "at",
        }
    }
}

/// Parse a CMS timestamp.
///
/// Accepts RFC 3339 (`2021-03-15T10:00:00.000Z`) and the colon-less offset
/// form the content API emits (`2021-03-15T10:00:00+0000`).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Formats publication dates as "day abbreviated-month year"
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    timezone: Tz,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(Locale::PtBr, Tz::UTC)
    }
}

impl DateFormatter {
    pub fn new(locale: Locale, timezone: Tz) -> Self {
        Self { locale, timezone }
    }

    /// Build from a language tag and an IANA timezone name.
    ///
    /// Unknown timezone names fall back to UTC.
    pub fn from_settings(language: &str, timezone: &str) -> Self {
        let tz = match timezone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                if !timezone.is_empty() {
                    tracing::warn!("Unknown timezone '{}', using UTC", timezone);
                }
                Tz::UTC
            }
        };
        Self::new(Locale::from_tag(language), tz)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Format a parsed date, e.g. "15 Mar 2021"
    pub fn format(&self, date: Option<&DateTime<Utc>>) -> String {
        match date {
            Some(date) => {
                let local = self.timezone.from_utc_datetime(&date.naive_utc());
                format!(
                    "{} {} {}",
                    local.day(),
                    self.locale.month_abbrev(local.month()),
                    local.year()
                )
            }
            None => self.locale.missing_date().to_string(),
        }
    }

    /// Parse and format a raw CMS timestamp
    pub fn format_str(&self, value: Option<&str>) -> String {
        let parsed = value.and_then(parse_timestamp);
        if parsed.is_none() {
            if let Some(raw) = value {
                tracing::warn!("Unparseable publication date '{}'", raw);
            }
        }
        self.format(parsed.as_ref())
    }

    /// Format with the time of day, e.g. "19 Mar 2021, às 15:49"
    pub fn format_with_time(&self, date: Option<&DateTime<Utc>>) -> String {
        match date {
            Some(date) => {
                let local = self.timezone.from_utc_datetime(&date.naive_utc());
                format!(
                    "{}, {} {:02}:{:02}",
                    self.format(Some(date)),
                    self.locale.time_joiner(),
                    local.hour(),
                    local.minute()
                )
            }
            None => self.locale.missing_date().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pt_br_date() {
        let formatter = DateFormatter::default();
        assert_eq!(
            formatter.format_str(Some("2021-03-15T10:00:00.000Z")),
            "15 Mar 2021"
        );
        assert_eq!(
            formatter.format_str(Some("2021-02-03T10:00:00+0000")),
            "3 Fev 2021"
        );
    }

    #[test]
    fn test_missing_date_uses_placeholder() {
        let formatter = DateFormatter::default();
        assert_eq!(formatter.format_str(None), "Data indisponível");
        assert_eq!(formatter.format_str(Some("not a date")), "Data indisponível");
        assert!(!formatter.format_str(None).contains("Invalid"));
    }

    #[test]
    fn test_timezone_shifts_day() {
        let formatter = DateFormatter::from_settings("pt-BR", "America/Sao_Paulo");
        assert_eq!(
            formatter.format_str(Some("2021-03-15T01:00:00Z")),
            "14 Mar 2021"
        );
    }

    #[test]
    fn test_english_locale() {
        let formatter = DateFormatter::from_settings("en-US", "UTC");
        assert_eq!(formatter.format_str(Some("2021-08-01T00:00:00Z")), "1 Aug 2021");
    }

    #[test]
    fn test_format_with_time() {
        let formatter = DateFormatter::default();
        let date = parse_timestamp("2021-03-19T15:49:00+0000").unwrap();
        assert_eq!(formatter.format_with_time(Some(&date)), "19 Mar 2021, às 15:49");
    }
}
