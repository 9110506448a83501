// src/collection/coverage.rs — Can cached items answer a request?
//
// Each collection kind reads its arguments differently:
//   Levels     — explicit levels, or 1..=user_level when none are given.
//                The user's own level must be cached too. Unknown user level
//                means the default request can never be answered locally.
//   Limit      — a count N, covered once N items are cached.
//   Threshold  — a percentage T, covered once any cached item tracks >= T.
//                This only proves one qualifying item is present, not all.
//
// When not covered, the plan carries the narrowed arguments to send.

use tracing::debug;

use super::{CacheableItem, Collection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageRule {
    Levels,
    Limit { default: u32, min: u32, max: u32 },
    Threshold { default: u32, min: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    /// Cached data answers the request; no round trip.
    Shortcut,
    /// Send these arguments (possibly fewer than requested, possibly none).
    Fetch(Vec<u32>),
}

impl FetchPlan {
    pub fn is_shortcut(&self) -> bool {
        matches!(self, FetchPlan::Shortcut)
    }
}

impl CoverageRule {
    pub fn plan<T: CacheableItem>(
        &self,
        cached: &Collection<T>,
        args: &[u32],
        user_level: Option<u32>,
    ) -> FetchPlan {
        match *self {
            CoverageRule::Levels => levels_plan(cached, args, user_level),
            CoverageRule::Limit { default, min, max } => {
                let limit = clamp_arg(args, default, min, max);
                limit_plan(cached.len(), limit)
            }
            CoverageRule::Threshold { default, min, max } => {
                let threshold = clamp_arg(args, default, min, max);
                threshold_plan(cached, threshold)
            }
        }
    }
}

fn clamp_arg(args: &[u32], default: u32, min: u32, max: u32) -> u32 {
    args.first().copied().unwrap_or(default).clamp(min, max)
}

pub fn levels_plan<T: CacheableItem>(
    cached: &Collection<T>,
    requested: &[u32],
    user_level: Option<u32>,
) -> FetchPlan {
    let wanted: Vec<u32> = if requested.is_empty() {
        match user_level {
            Some(level) if level > 0 => (1..=level).collect(),
            _ => {
                debug!("User level unknown; cannot shortcut {}", T::COLLECTION);
                return FetchPlan::Fetch(Vec::new());
            }
        }
    } else {
        let mut seen = Vec::with_capacity(requested.len());
        for level in requested {
            if !seen.contains(level) {
                seen.push(*level);
            }
        }
        seen
    };

    let missing: Vec<u32> = wanted
        .into_iter()
        .filter(|level| !cached.has_level(*level))
        .collect();

    if missing.is_empty() {
        FetchPlan::Shortcut
    } else {
        FetchPlan::Fetch(missing)
    }
}

pub fn limit_plan(cached_len: usize, limit: u32) -> FetchPlan {
    if cached_len >= limit as usize {
        FetchPlan::Shortcut
    } else {
        FetchPlan::Fetch(vec![limit])
    }
}

pub fn threshold_plan<T: CacheableItem>(cached: &Collection<T>, threshold: u32) -> FetchPlan {
    match cached.max_percentage() {
        Some(p) if p >= threshold => FetchPlan::Shortcut,
        _ => FetchPlan::Fetch(vec![threshold]),
    }
}
