#![forbid(unsafe_code)]

//! Clock ticker: wall-clock formatting re-armed on whole-second boundaries.
//!
//! The pattern and timezone are parsed once, when the ticker is built, so a
//! bad configuration fails at start-up and formatting itself cannot fail.
//! Patterns are chrono strftime patterns; zones are `utc`, a fixed offset,
//! or an IANA name such as `Europe/Berlin`, which follows daylight saving.

use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::time::SystemTime;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use keyhole_runtime::{RepeatingTask, next_second_boundary};

/// Clock configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// The pattern holds a directive chrono does not know, or a lone `%`.
    InvalidPattern(String),
    /// The timezone is not `utc`, a fixed offset, or a known zone name.
    UnknownTimezone(String),
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern(p) => write!(f, "invalid clock format {p:?}"),
            Self::UnknownTimezone(tz) => write!(
                f,
                "unknown timezone {tz:?} (expected utc, +HH:MM, or a zone name like Europe/Berlin)"
            ),
        }
    }
}

impl std::error::Error for ClockError {}

/// Where the clock is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockZone {
    #[default]
    Utc,
    Fixed(FixedOffset),
    Named(Tz),
}

impl ClockZone {
    /// Parse `utc` (any case), `+HH:MM`, `-HHMM`, `UTC+HH:MM`, or an IANA name.
    pub fn parse(spec: &str) -> Result<Self, ClockError> {
        let trimmed = spec.trim();
        if ["utc", "gmt", "z"].iter().any(|n| trimmed.eq_ignore_ascii_case(n)) {
            return Ok(Self::Utc);
        }
        if let Ok(tz) = Tz::from_str(trimmed) {
            return Ok(Self::Named(tz));
        }
        let offset = ["utc", "gmt"]
            .iter()
            .find_map(|prefix| {
                trimmed
                    .get(..prefix.len())
                    .filter(|head| head.eq_ignore_ascii_case(prefix))
                    .map(|_| &trimmed[prefix.len()..])
            })
            .unwrap_or(trimmed);
        match FixedOffset::from_str(offset) {
            Ok(fixed) if fixed.local_minus_utc() == 0 => Ok(Self::Utc),
            Ok(fixed) => Ok(Self::Fixed(fixed)),
            Err(_) => Err(ClockError::UnknownTimezone(spec.to_string())),
        }
    }
}

/// A validated strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockFormat {
    pattern: String,
}

impl ClockFormat {
    pub fn parse(pattern: &str) -> Result<Self, ClockError> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ClockError::InvalidPattern(pattern.to_string()));
        }
        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render `instant` as seen in `zone`.
    #[must_use]
    pub fn format(&self, instant: SystemTime, zone: ClockZone) -> String {
        let utc = DateTime::<Utc>::from(instant);
        let mut out = String::new();
        // The pattern was checked in `parse`, so writing cannot fail.
        let _ = match zone {
            ClockZone::Utc => write!(out, "{}", utc.format(&self.pattern)),
            ClockZone::Fixed(offset) => {
                write!(out, "{}", utc.with_timezone(&offset).format(&self.pattern))
            }
            ClockZone::Named(tz) => write!(out, "{}", utc.with_timezone(&tz).format(&self.pattern)),
        };
        out
    }
}

/// Renders the footer clock and decides when it next needs to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockTicker {
    format: ClockFormat,
    zone: ClockZone,
}

impl ClockTicker {
    /// Build a ticker, validating pattern and timezone.
    pub fn new(pattern: &str, timezone: &str) -> Result<Self, ClockError> {
        Ok(Self {
            format: ClockFormat::parse(pattern)?,
            zone: ClockZone::parse(timezone)?,
        })
    }

    /// Render `now` and compute the next whole-second deadline.
    #[must_use]
    pub fn tick(&self, now: SystemTime) -> (String, SystemTime) {
        (self.format.format(now, self.zone), next_second_boundary(now))
    }

    #[must_use]
    pub fn zone(&self) -> ClockZone {
        self.zone
    }
}

impl RepeatingTask for ClockTicker {
    type Output = String;

    fn run(&mut self, now: SystemTime) -> (String, SystemTime) {
        self.tick(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    // 2021-03-04 05:06:07 UTC, a Thursday.
    const SAMPLE: u64 = 1_614_834_367;
    // 2021-07-04 12:00:00 UTC
    const SUMMER: u64 = 1_625_400_000;

    #[test]
    fn default_pattern() {
        let ticker = ClockTicker::new("%Y-%m-%d %H:%M:%S %Z", "utc").unwrap();
        let (text, next) = ticker.tick(at(SAMPLE) + Duration::from_millis(250));
        assert_eq!(text, "2021-03-04 05:06:07 UTC");
        assert_eq!(next, at(SAMPLE + 1));
    }

    #[test]
    fn names_and_twelve_hour_clock() {
        let fmt = ClockFormat::parse("%a %A %b %B %e %I%p %j %y %%").unwrap();
        assert_eq!(
            fmt.format(at(SAMPLE), ClockZone::Utc),
            "Thu Thursday Mar March  4 05AM 063 21 %"
        );
    }

    #[test]
    fn common_shorthand_directives() {
        let fmt = ClockFormat::parse("%T|%D|%s").unwrap();
        assert_eq!(
            fmt.format(at(SAMPLE), ClockZone::Utc),
            "05:06:07|03/04/21|1614834367"
        );
        assert!(ClockFormat::parse("%c").is_ok());
    }

    #[test]
    fn named_zones_follow_daylight_saving() {
        let ticker = ClockTicker::new("%H:%M %Z", "America/New_York").unwrap();
        assert_eq!(ticker.tick(at(SAMPLE)).0, "00:06 EST");
        assert_eq!(ticker.tick(at(SUMMER)).0, "08:00 EDT");

        let berlin = ClockTicker::new("%H:%M %Z", "Europe/Berlin").unwrap();
        assert_eq!(berlin.tick(at(SAMPLE)).0, "06:06 CET");
        assert_eq!(berlin.tick(at(SUMMER)).0, "14:00 CEST");

        assert!(matches!(ClockZone::parse("US/Eastern"), Ok(ClockZone::Named(_))));
    }

    #[test]
    fn fixed_offsets() {
        let zone = ClockZone::parse("UTC-05:30").unwrap();
        assert_eq!(zone, ClockZone::Fixed(FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap()));
        let fmt = ClockFormat::parse("%Y-%m-%d %H:%M %z").unwrap();
        assert_eq!(fmt.format(at(SAMPLE), zone), "2021-03-03 23:36 -0530");
        assert_eq!(
            ClockZone::parse("+0200").unwrap(),
            ClockZone::Fixed(FixedOffset::east_opt(7200).unwrap())
        );
        assert_eq!(ClockZone::parse("UTC").unwrap(), ClockZone::Utc);
        assert_eq!(ClockZone::parse("+00:00").unwrap(), ClockZone::Utc);
    }

    #[test]
    fn bad_timezones() {
        for tz in ["Mars/Olympus", "+25:00", "", "utc+", "+ab:cd"] {
            assert_eq!(
                ClockZone::parse(tz),
                Err(ClockError::UnknownTimezone(tz.to_string())),
                "{tz}"
            );
        }
    }

    #[test]
    fn bad_patterns() {
        assert_eq!(
            ClockFormat::parse("%Q"),
            Err(ClockError::InvalidPattern("%Q".into()))
        );
        assert!(ClockFormat::parse("%H:%").is_err());
        assert!(ClockTicker::new("%H", "mars").is_err());
    }

    #[test]
    fn pre_epoch_instants_format() {
        let before = UNIX_EPOCH - Duration::from_secs(1);
        let fmt = ClockFormat::parse("%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(fmt.format(before, ClockZone::Utc), "1969-12-31 23:59:59");
    }
}
