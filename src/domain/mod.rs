//! Domain primitives shared by the store, the services and the API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How hard a recipe is to cook.
///
/// Persisted and serialized as the lowercase name (`easy`, `medium`, `hard`).
///
/// ```rust
/// use ladle::domain::Difficulty;
///
/// let d: Difficulty = "Hard".parse().unwrap();
/// assert_eq!(d, Difficulty::Hard);
/// assert_eq!(d.as_str(), "hard");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty '{0}', expected one of: easy, medium, hard")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| ParseDifficultyError(s.to_string()))
    }
}

/// Generates a new row identifier.
///
/// UUIDv7 is time-ordered, so rows created within the same timestamp still
/// sort by insertion order when ordered by id.
#[must_use]
pub fn new_row_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Current time as an RFC 3339 UTC string with microsecond precision.
///
/// Fixed width, so lexicographic order matches chronological order.
#[must_use]
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
