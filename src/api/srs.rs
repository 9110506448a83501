// src/api/srs.rs — SRS stages and their display colours

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::{ItemStats, SrsCounts, SrsDistribution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SrsStage {
    Apprentice,
    Guru,
    Master,
    Enlighten,
    Burned,
}

/// Hex colours (no leading `#`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageColors {
    pub dark: &'static str,
    pub light: &'static str,
}

impl SrsStage {
    pub const ALL: [SrsStage; 5] = [
        SrsStage::Apprentice,
        SrsStage::Guru,
        SrsStage::Master,
        SrsStage::Enlighten,
        SrsStage::Burned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apprentice => "apprentice",
            Self::Guru => "guru",
            Self::Master => "master",
            Self::Enlighten => "enlighten",
            Self::Burned => "burned",
        }
    }

    /// Ordinal, apprentice = 0 through burned = 4.
    pub fn level(&self) -> u8 {
        match self {
            Self::Apprentice => 0,
            Self::Guru => 1,
            Self::Master => 2,
            Self::Enlighten => 3,
            Self::Burned => 4,
        }
    }

    pub fn colors(&self) -> StageColors {
        let (dark, light) = match self {
            Self::Apprentice => ("FF00AA", "DD0093"),
            Self::Guru => ("AA38C6", "882D9E"),
            Self::Master => ("5571E2", "294BBD"),
            Self::Enlighten => ("00AAFF", "0093DD"),
            Self::Burned => ("555555", "434343"),
        };
        StageColors { dark, light }
    }
}

impl FromStr for SrsStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apprentice" => Ok(Self::Apprentice),
            "guru" => Ok(Self::Guru),
            "master" => Ok(Self::Master),
            // The API has used both spellings.
            "enlighten" | "enlightened" => Ok(Self::Enlighten),
            "burned" => Ok(Self::Burned),
            other => Err(format!("unknown SRS stage '{other}'")),
        }
    }
}

impl std::fmt::Display for SrsStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SrsDistribution {
    pub fn stage(&self, stage: SrsStage) -> &SrsCounts {
        match stage {
            SrsStage::Apprentice => &self.apprentice,
            SrsStage::Guru => &self.guru,
            SrsStage::Master => &self.master,
            SrsStage::Enlighten => &self.enlighten,
            SrsStage::Burned => &self.burned,
        }
    }
}

impl ItemStats {
    pub fn stage(&self) -> Option<SrsStage> {
        self.srs.parse().ok()
    }
}
