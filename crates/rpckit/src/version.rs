//! Dotted version strings.
//!
//! Server versions are not semver (`0.3`, `2.2.5`, `1.0rc1`), so they are
//! compared component-wise: each dot-separated segment splits into a leading
//! number and a suffix. A segment with no suffix ranks above the same number
//! with one, so release candidates sort before their release. Missing
//! trailing components count as `0`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// One dot-separated component: numeric part and suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Component {
    number: u64,
    suffix: String,
}

impl Component {
    fn parse(segment: &str) -> Self {
        let digits = segment
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(segment.len());
        let (number, suffix) = segment.split_at(digits);

        Self {
            number: if number.is_empty() {
                0
            } else {
                number.parse().unwrap_or(u64::MAX)
            },
            suffix: suffix.to_string(),
        }
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| match (self.suffix.is_empty(), other.suffix.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.suffix.cmp(&other.suffix),
            })
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed server version.
///
/// Equality follows ordering, so `1.2` equals `1.2.0`.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    components: Vec<Component>,
}

impl Version {
    /// Parse a version string. Never fails: malformed segments become
    /// `(0, segment)`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        Self {
            raw: raw.to_string(),
            components: raw.split('.').map(Component::parse).collect(),
        }
    }

    /// Whether this version is at least `minimum`.
    #[must_use]
    pub fn at_least(&self, minimum: &Version) -> bool {
        self >= minimum
    }

    /// The string this version was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        let padding = Component::default();

        (0..len)
            .map(|i| {
                let a = self.components.get(i).unwrap_or(&padding);
                let b = other.components.get(i).unwrap_or(&padding);
                a.cmp(b)
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Compare two version strings.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    Version::parse(a).cmp(&Version::parse(b))
}
