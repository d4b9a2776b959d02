use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A `major.minor.patch` add-on version.
///
/// Field order matters: the derived `Ord` compares lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("version string is empty")]
    Empty,
    #[error("invalid version component '{component}' in '{input}'")]
    InvalidComponent { input: String, component: String },
    #[error("too many version components in '{input}' (expected at most 3)")]
    TooManyComponents { input: String },
}

impl Version {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version descriptor body such as `"1.4.0\n"`.
    ///
    /// A leading `v` is accepted and missing minor or patch components default
    /// to zero, so `"1.4"` parses the same as `"1.4.0"`.
    ///
    /// # Errors
    /// Returns an error for empty input, non-numeric components, or more than
    /// three components.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let trimmed = input.trim();
        let core = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if core.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let mut components = [0_u64; 3];
        for (index, part) in core.split('.').enumerate() {
            if index >= components.len() {
                return Err(VersionParseError::TooManyComponents {
                    input: trimmed.to_string(),
                });
            }
            components[index] = parse_component(trimmed, part)?;
        }

        let [major, minor, patch] = components;
        Ok(Self::new(major, minor, patch))
    }
}

fn parse_component(input: &str, part: &str) -> Result<u64, VersionParseError> {
    // `u64::from_str` accepts a leading '+', which is not a valid component.
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError::InvalidComponent {
            input: input.to_string(),
            component: part.to_string(),
        });
    }
    part.parse::<u64>()
        .map_err(|_| VersionParseError::InvalidComponent {
            input: input.to_string(),
            component: part.to_string(),
        })
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<(u64, u64, u64)> for Version {
    fn from((major, minor, patch): (u64, u64, u64)) -> Self {
        Self::new(major, minor, patch)
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
