// src/api/decode.rs — Response envelope and per-resource decoding
//
// Every response looks like
//   { "user_information": {...}, "requested_information": ..., "error": {...}? }
// A present `error` turns an otherwise successful response into a failure.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::types::{
    CriticalItem, Kanji, LevelProgression, Radical, RecentUnlock, SrsDistribution, StudyQueue,
    UserInformation, Vocabulary,
};
use super::Resource;
use crate::infra::errors::WkError;

#[derive(Debug, Clone)]
pub struct Envelope {
    pub resource: Resource,
    pub user_information: Option<UserInformation>,
    pub requested_information: Value,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Split a raw response, routing an application-level `error` to `Err`.
pub fn envelope(resource: Resource, mut json: Value) -> Result<Envelope, WkError> {
    let Some(obj) = json.as_object_mut() else {
        return Err(WkError::malformed(resource.as_str(), "response is not an object"));
    };

    if let Some(err) = obj.remove("error").filter(|e| !e.is_null()) {
        let remote: RemoteError = serde_json::from_value(err).unwrap_or(RemoteError {
            code: "unknown".into(),
            message: "unreadable error object".into(),
        });
        return Err(WkError::Remote {
            code: remote.code,
            message: remote.message,
        });
    }

    let user_information = match obj.remove("user_information") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            serde_json::from_value(v)
                .map_err(|e| WkError::malformed(resource.as_str(), e.to_string()))?,
        ),
    };

    Ok(Envelope {
        resource,
        user_information,
        requested_information: obj.remove("requested_information").unwrap_or(Value::Null),
    })
}

fn requested<T: DeserializeOwned>(env: Envelope) -> Result<T, WkError> {
    let resource = env.resource;
    serde_json::from_value(env.requested_information)
        .map_err(|e| WkError::malformed(resource.as_str(), e.to_string()))
}

/// List resources are sometimes wrapped as `{"general": [...]}`.
fn requested_list<T: DeserializeOwned>(mut env: Envelope) -> Result<Vec<T>, WkError> {
    if env.requested_information.is_null() {
        return Ok(Vec::new());
    }
    if let Some(general) = env
        .requested_information
        .get_mut("general")
        .map(Value::take)
    {
        env.requested_information = general;
    }
    requested(env)
}

pub fn user_information(env: Envelope) -> Result<UserInformation, WkError> {
    env.user_information
        .ok_or_else(|| WkError::malformed(Resource::UserInformation.as_str(), "missing user_information"))
}

pub fn study_queue(env: Envelope) -> Result<StudyQueue, WkError> {
    requested(env)
}

pub fn level_progression(env: Envelope) -> Result<LevelProgression, WkError> {
    requested(env)
}

pub fn srs_distribution(env: Envelope) -> Result<SrsDistribution, WkError> {
    requested(env)
}

pub fn recent_unlocks(env: Envelope) -> Result<Vec<RecentUnlock>, WkError> {
    requested_list(env)
}

pub fn critical_items(env: Envelope) -> Result<Vec<CriticalItem>, WkError> {
    requested_list(env)
}

pub fn radicals(env: Envelope) -> Result<Vec<Radical>, WkError> {
    requested_list(env)
}

pub fn kanji(env: Envelope) -> Result<Vec<Kanji>, WkError> {
    requested_list(env)
}

pub fn vocabulary(env: Envelope) -> Result<Vec<Vocabulary>, WkError> {
    requested_list(env)
}
