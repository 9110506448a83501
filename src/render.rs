// src/render.rs — Presentation data and the rendering seam
//
// Nothing here builds markup. Links and images are plain data; a host
// `Renderer` decides how to show them.

use std::sync::Arc;

use url::Url;

use crate::api::types::{CriticalItem, ItemKind, Kanji, Radical, RecentUnlock, UserInformation, Vocabulary};
use crate::deferred::Deferred;
use crate::infra::config::ApiConfig;
use crate::infra::errors::WkError;

pub const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar/";
pub const TWITTER_BASE: &str = "https://twitter.com/";

/// Gravatar accepts 1px to 2048px.
pub const AVATAR_SIZE_RANGE: (u32, u32) = (1, 2048);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub src: String,
    pub size: Option<u32>,
}

// ---------------------------------------------------------------------------
// URLs that need no site base
// ---------------------------------------------------------------------------

impl UserInformation {
    pub fn avatar_url(&self, size: Option<u32>) -> String {
        let mut url = format!("{GRAVATAR_BASE}{}", self.gravatar);
        if let Some(size) = size {
            let (min, max) = AVATAR_SIZE_RANGE;
            url.push_str(&format!("?s={}", size.clamp(min, max)));
        }
        url
    }

    /// `None` when the account has no twitter handle.
    pub fn twitter_url(&self) -> Option<String> {
        self.twitter
            .as_deref()
            .map(|t| t.trim_start_matches('@'))
            .filter(|t| !t.is_empty())
            .map(|t| format!("{TWITTER_BASE}{t}"))
    }
}

pub fn avatar(info: &UserInformation, size: Option<u32>) -> Image {
    Image {
        src: info.avatar_url(size),
        size: size.map(|s| s.clamp(AVATAR_SIZE_RANGE.0, AVATAR_SIZE_RANGE.1)),
    }
}

// ---------------------------------------------------------------------------
// Site links
// ---------------------------------------------------------------------------

/// Anything with a page on the site.
pub trait StudyItem {
    fn kind(&self) -> ItemKind;
    fn character(&self) -> &str;
    fn meaning(&self) -> &str;

    /// Link text when none is given: the character, else the meaning.
    fn label(&self) -> &str {
        if self.character().is_empty() {
            self.meaning()
        } else {
            self.character()
        }
    }
}

macro_rules! study_item {
    ($ty:ty, $kind:expr) => {
        impl StudyItem for $ty {
            fn kind(&self) -> ItemKind {
                $kind
            }
            fn character(&self) -> &str {
                &self.character
            }
            fn meaning(&self) -> &str {
                &self.meaning
            }
        }
    };
}

study_item!(Radical, ItemKind::Radical);
study_item!(Kanji, ItemKind::Kanji);
study_item!(Vocabulary, ItemKind::Vocabulary);

impl StudyItem for RecentUnlock {
    fn kind(&self) -> ItemKind {
        self.kind
    }
    fn character(&self) -> &str {
        &self.character
    }
    fn meaning(&self) -> &str {
        &self.meaning
    }
}

impl StudyItem for CriticalItem {
    fn kind(&self) -> ItemKind {
        self.kind
    }
    fn character(&self) -> &str {
        &self.character
    }
    fn meaning(&self) -> &str {
        &self.meaning
    }
}

/// Builds page URLs under the site root.
#[derive(Debug, Clone)]
pub struct SiteLinks {
    base: Url,
}

impl SiteLinks {
    pub fn new(base_url: &str) -> Result<Self, WkError> {
        let base = Url::parse(base_url)
            .map_err(|e| WkError::Config(format!("invalid site url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(WkError::Config(format!("site url '{base_url}' cannot hold paths")));
        }
        Ok(Self { base })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, WkError> {
        Self::new(&config.base_url)
    }

    /// Segments are percent-encoded, so characters and usernames are safe.
    fn page(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.to_string()
    }

    pub fn profile_url(&self, info: &UserInformation) -> String {
        self.page(&["community", "people", &info.username])
    }

    /// The account's own website, falling back to the profile page.
    pub fn web_url(&self, info: &UserInformation) -> String {
        match info.website.as_deref().map(str::trim) {
            Some(site) if !site.is_empty() => site.to_string(),
            _ => self.profile_url(info),
        }
    }

    pub fn item_url(&self, item: &impl StudyItem) -> String {
        self.page(&[item.kind().as_str(), item.label()])
    }

    pub fn weblink(&self, info: &UserInformation, text: Option<&str>) -> Link {
        Link {
            href: self.web_url(info),
            text: text.unwrap_or(&info.username).to_string(),
        }
    }

    pub fn item_link(&self, item: &impl StudyItem, text: Option<&str>) -> Link {
        Link {
            href: self.item_url(item),
            text: text.unwrap_or(item.label()).to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer seam
// ---------------------------------------------------------------------------

/// Host-supplied presentation for one kind of result.
pub trait Renderer<T: ?Sized>: Send + Sync {
    fn render(&self, value: &T);

    fn render_error(&self, error: &WkError) {
        tracing::warn!("Request failed: {error}");
    }
}

/// Route a handle's outcome into `renderer`.
pub fn attach<T: 'static>(deferred: &Deferred<T>, renderer: Arc<dyn Renderer<T>>) {
    let on_error = renderer.clone();
    deferred.then(
        move |value| renderer.render(value),
        move |error| on_error.render_error(error),
    );
}
