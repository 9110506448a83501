// src/client/mod.rs — Per-account client state and the account registry

pub mod account;
pub mod registry;

pub use account::Account;
pub use registry::Registry;

/// Cache keys for single-value resources, relative to the account scope.
pub const INFO_KEY: &str = "info";
pub const STUDY_QUEUE_KEY: &str = "study_queue";
pub const LEVEL_PROGRESSION_KEY: &str = "level_progression";
pub const SRS_DISTRIBUTION_KEY: &str = "srs_distribution";

/// Namespace of one account under the cache root.
pub fn user_namespace(api_key: &str) -> String {
    format!("user/{api_key}")
}
