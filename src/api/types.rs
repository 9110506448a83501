// src/api/types.rs — Typed records for each WaniKani resource

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Unix seconds to UTC, `None` for out-of-range values.
pub fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

// ---------------------------------------------------------------------------
// Account-level resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInformation {
    pub username: String,
    /// MD5 of the account email, always 32 hex characters.
    pub gravatar: String,
    pub level: u32,
    pub title: String,
    pub about: String,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub topics_count: u32,
    pub posts_count: u32,
    pub creation_date: i64,
    pub vacation_date: Option<i64>,
}

impl UserInformation {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.creation_date)
    }

    pub fn on_vacation(&self) -> bool {
        self.vacation_date.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyQueue {
    pub lessons_available: u32,
    pub reviews_available: u32,
    pub next_review_date: Option<i64>,
    pub reviews_available_next_hour: u32,
    pub reviews_available_next_day: u32,
}

impl StudyQueue {
    pub fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.next_review_date.and_then(timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelProgression {
    pub radicals_progress: u32,
    pub radicals_total: u32,
    pub kanji_progress: u32,
    pub kanji_total: u32,
}

impl LevelProgression {
    /// Fraction of this level's kanji passed, 0.0 when the level is empty.
    pub fn kanji_ratio(&self) -> f64 {
        if self.kanji_total == 0 {
            0.0
        } else {
            self.kanji_progress as f64 / self.kanji_total as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SrsCounts {
    pub radicals: u32,
    pub kanji: u32,
    pub vocabulary: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SrsDistribution {
    pub apprentice: SrsCounts,
    pub guru: SrsCounts,
    pub master: SrsCounts,
    pub enlighten: SrsCounts,
    pub burned: SrsCounts,
}

// ---------------------------------------------------------------------------
// Study items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Radical,
    Kanji,
    Vocabulary,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Radical => "radical",
            Self::Kanji => "kanji",
            Self::Vocabulary => "vocabulary",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-user review statistics. Absent until the item is unlocked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemStats {
    pub srs: String,
    pub unlocked_date: Option<i64>,
    pub available_date: Option<i64>,
    pub burned: bool,
    pub burned_date: Option<i64>,
    pub meaning_correct: Option<u32>,
    pub meaning_incorrect: Option<u32>,
    pub meaning_max_streak: Option<u32>,
    pub meaning_current_streak: Option<u32>,
    pub reading_correct: Option<u32>,
    pub reading_incorrect: Option<u32>,
    pub reading_max_streak: Option<u32>,
    pub reading_current_streak: Option<u32>,
}

impl ItemStats {
    pub fn unlocked_at(&self) -> Option<DateTime<Utc>> {
        self.unlocked_date.and_then(timestamp)
    }

    pub fn burned_at(&self) -> Option<DateTime<Utc>> {
        self.burned_date.and_then(timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Radical {
    #[serde(deserialize_with = "null_as_empty")]
    pub character: String,
    pub meaning: String,
    /// Image URL for radicals without a unicode character.
    pub image: Option<String>,
    pub level: u32,
    #[serde(alias = "user_specific")]
    pub stats: Option<ItemStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kanji {
    pub character: String,
    pub meaning: String,
    pub onyomi: Option<String>,
    pub kunyomi: Option<String>,
    pub important_reading: String,
    pub level: u32,
    #[serde(alias = "user_specific")]
    pub stats: Option<ItemStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub character: String,
    pub kana: String,
    pub meaning: String,
    pub level: u32,
    #[serde(alias = "user_specific")]
    pub stats: Option<ItemStats>,
}

/// Radicals, kanji and vocabulary share one shape here; the kind-specific
/// fields are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentUnlock {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub character: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub unlocked_date: Option<i64>,
    #[serde(default)]
    pub kana: Option<String>,
    #[serde(default)]
    pub onyomi: Option<String>,
    #[serde(default)]
    pub kunyomi: Option<String>,
    #[serde(default)]
    pub important_reading: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl RecentUnlock {
    pub fn unlocked_at(&self) -> Option<DateTime<Utc>> {
        self.unlocked_date.and_then(timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub character: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub level: u32,
    /// Correct-answer percentage; the API sends it as a string.
    #[serde(deserialize_with = "percentage")]
    pub percentage: u32,
    #[serde(default)]
    pub kana: Option<String>,
    #[serde(default)]
    pub onyomi: Option<String>,
    #[serde(default)]
    pub kunyomi: Option<String>,
    #[serde(default)]
    pub important_reading: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Image-only radicals send `"character": null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `"75"`, `75` or `75.0`.
fn percentage<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|p| u32::try_from(p).ok())
        .ok_or_else(|| D::Error::custom(format!("invalid percentage: {value}")))
}
