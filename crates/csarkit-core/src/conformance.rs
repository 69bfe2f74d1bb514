//! CSAR conformance levels
//!
//! A CSAR declares the generation of the SDC TOSCA model it targets in
//! `csar.meta` (`SDC-TOSCA-Definitions-Version: 4.0`). Levels are compared with
//! semantic version ordering; the short forms `4` and `4.0` are accepted.

use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// A declared conformance level
#[derive(Debug, Clone)]
pub struct ConformanceLevel {
    raw: String,
    version: Version,
}

impl ConformanceLevel {
    pub fn new(major: u64, minor: u64) -> Self {
        Self {
            raw: format!("{}.{}", major, minor),
            version: Version::new(major, minor, 0),
        }
    }

    pub fn parse(level: &str) -> Result<Self> {
        let raw = level.trim();
        let invalid = || CoreError::InvalidConformanceLevel {
            level: level.to_string(),
        };

        let parts: Vec<&str> = raw.split('.').collect();
        let padded = match parts.len() {
            1 => format!("{}.0.0", raw),
            2 => format!("{}.0", raw),
            3 => raw.to_string(),
            _ => return Err(invalid()),
        };

        let version = Version::parse(&padded).map_err(|_| invalid())?;
        Ok(Self {
            raw: raw.to_string(),
            version,
        })
    }

    /// The level as written in the CSAR
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl FromStr for ConformanceLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ConformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for ConformanceLevel {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for ConformanceLevel {}

impl PartialOrd for ConformanceLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConformanceLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

impl Serialize for ConformanceLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ConformanceLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Unquoted levels in YAML (`4.0`) arrive as numbers
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(f64),
        }

        let text = match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s,
            Repr::Number(n) => format!("{:?}", n),
        };
        ConformanceLevel::parse(&text).map_err(serde::de::Error::custom)
    }
}
