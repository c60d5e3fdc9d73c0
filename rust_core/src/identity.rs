//! Game Identity Builder
//!
//! Turns `(home, away, start instant)` into a [`GameKey`]. The date component is taken
//! in one reference timezone so feeds that disagree on offsets still agree on the key
//! for games near midnight.

use crate::error::IngestError;
use crate::models::{GameKey, TeamCode};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

/// Calendar format of the key's date component
const KEY_DATE_FORMAT: &str = "%m.%d.%Y";

/// Offset-less ISO timestamps (ticket feed fallback of `localDate` + `localTime`)
const NAIVE_ISO_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Odds feed prose, e.g. "Saturday, Nov 16, 2024 at 3:00am" (rendered from UTC)
const ODDS_PROSE_FORMAT: &str = "%A, %b %d, %Y at %I:%M%p";

#[derive(Debug, Clone, Copy)]
pub struct GameKeyBuilder {
    reference: FixedOffset,
}

impl GameKeyBuilder {
    pub fn new(reference: FixedOffset) -> Self {
        Self { reference }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Reference timezone from an offset in minutes east of UTC.
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }

    pub fn reference(&self) -> FixedOffset {
        self.reference
    }

    /// Parse a feed timestamp under every known format.
    pub fn parse_start(&self, raw: &str) -> Result<DateTime<Utc>, IngestError> {
        let value = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(dt.with_timezone(&Utc));
        }

        for format in NAIVE_ISO_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                if let Some(dt) = self.reference.from_local_datetime(&naive).single() {
                    return Ok(dt.with_timezone(&Utc));
                }
            }
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(value, ODDS_PROSE_FORMAT) {
            return Ok(Utc.from_utc_datetime(&naive));
        }

        Err(IngestError::InvalidTimestamp {
            value: raw.to_string(),
        })
    }

    pub fn build(&self, home: &TeamCode, away: &TeamCode, start: DateTime<Utc>) -> GameKey {
        let date = start
            .with_timezone(&self.reference)
            .format(KEY_DATE_FORMAT)
            .to_string();
        GameKey::from_parts(home, away, &date)
    }
}

impl Default for GameKeyBuilder {
    fn default() -> Self {
        Self::utc()
    }
}
