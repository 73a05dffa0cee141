//! Timestamps as the Drycc controller writes them.
//!
//! The controller and the services behind it are not consistent about
//! timestamp text. Three layouts are accepted on input; output always uses
//! the Drycc layout, `2006-01-02T15:04:05UTC`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// `chrono` layout of the date and time part shared by the Drycc layouts.
const DATETIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

/// [`DATETIME_LAYOUT`] with an optional fraction of a second, for input only.
const DATETIME_INPUT_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Zone written after [`DATETIME_LAYOUT`] on output.
const CANONICAL_ZONE: &str = "UTC";

/// Timestamp text matched none of the accepted layouts.
#[derive(Debug, Error)]
#[error("cannot parse {text:?} as a Drycc timestamp: {source}")]
pub struct TimeParseError {
    /// The offending text.
    pub text: String,
    /// Why the last layout rejected it.
    #[source]
    pub source: LayoutError,
}

/// Why one layout rejected a timestamp.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Chrono(#[from] chrono::ParseError),

    #[error("zone abbreviation {0:?} is not made of letters")]
    Zone(String),
}

type Layout = fn(&str) -> Result<DateTime<Utc>, LayoutError>;

/// Accepted input layouts, in the order they are tried.
const LAYOUTS: [Layout; 3] = [parse_rfc3339, parse_drycc, parse_pyopenssl];

/// `2006-01-02T15:04:05Z07:00`
fn parse_rfc3339(text: &str) -> Result<DateTime<Utc>, LayoutError> {
    Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
}

/// `2006-01-02T15:04:05MST`. The abbreviation carries no offset, so it is read as UTC.
fn parse_drycc(text: &str) -> Result<DateTime<Utc>, LayoutError> {
    let (naive, zone) = NaiveDateTime::parse_and_remainder(text, DATETIME_INPUT_LAYOUT)?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(LayoutError::Zone(zone.to_string()));
    }
    Ok(naive.and_utc())
}

/// `2006-01-02T15:04:05`, as pyOpenSSL reports certificate expiry.
fn parse_pyopenssl(text: &str) -> Result<DateTime<Utc>, LayoutError> {
    Ok(NaiveDateTime::parse_from_str(text, DATETIME_INPUT_LAYOUT)?.and_utc())
}

/// A point in time exchanged with the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Parse controller text in any accepted layout.
    ///
    /// # Errors
    ///
    /// Returns [`TimeParseError`] when no layout accepts the text.
    pub fn parse(text: &str) -> Result<Self, TimeParseError> {
        let mut last = None;
        for layout in LAYOUTS {
            match layout(text) {
                Ok(instant) => return Ok(Self(instant)),
                Err(err) => last = Some(err),
            }
        }
        Err(TimeParseError {
            text: text.to_string(),
            source: last.unwrap_or_else(|| LayoutError::Zone(String::new())),
        })
    }

    /// The instant.
    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// Returns true for the zero value, `0001-01-01T00:00:00UTC`.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        let zero = NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or_default();
        Self(zero.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0.format(DATETIME_LAYOUT), CANONICAL_ZONE)
    }
}

impl FromStr for Timestamp {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(de::Error::custom)
    }
}
