// src/api/mod.rs — Remote API surface: resources, paths, transport seam

pub mod decode;
pub mod srs;
pub mod transport;
pub mod types;

use async_trait::async_trait;

use crate::infra::errors::WkError;

/// One named endpoint of the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    UserInformation,
    StudyQueue,
    LevelProgression,
    SrsDistribution,
    RecentUnlocks,
    CriticalItems,
    Radicals,
    Kanji,
    Vocabulary,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserInformation => "user-information",
            Self::StudyQueue => "study-queue",
            Self::LevelProgression => "level-progression",
            Self::SrsDistribution => "srs-distribution",
            Self::RecentUnlocks => "recent-unlocks",
            Self::CriticalItems => "critical-items",
            Self::Radicals => "radicals",
            Self::Kanji => "kanji",
            Self::Vocabulary => "vocabulary",
        }
    }

    /// All known resources.
    pub fn all() -> &'static [Resource] {
        &[
            Resource::UserInformation,
            Resource::StudyQueue,
            Resource::LevelProgression,
            Resource::SrsDistribution,
            Resource::RecentUnlocks,
            Resource::CriticalItems,
            Resource::Radicals,
            Resource::Kanji,
            Resource::Vocabulary,
        ]
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `{account_key}/{resource}[/{csv args}]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    pub account_key: String,
    pub resource: Resource,
    pub args: Vec<u32>,
}

impl ResourcePath {
    pub fn new(account_key: impl Into<String>, resource: Resource, args: Vec<u32>) -> Self {
        Self {
            account_key: account_key.into(),
            resource,
            args,
        }
    }

    pub fn csv_args(&self) -> String {
        self.args
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.account_key, self.resource)?;
        if !self.args.is_empty() {
            write!(f, "/{}", self.csv_args())?;
        }
        Ok(())
    }
}

/// Fetches raw JSON for a resource path. Supplied by the host.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, path: &ResourcePath) -> Result<serde_json::Value, WkError>;
}
