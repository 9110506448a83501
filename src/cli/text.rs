// src/cli/text.rs — Plain-text renderer for terminal output

use std::sync::Arc;

use chrono::Utc;

use crate::api::srs::SrsStage;
use crate::api::types::{
    CriticalItem, ItemStats, Kanji, LevelProgression, Radical, RecentUnlock, SrsDistribution,
    StudyQueue, UserInformation, Vocabulary,
};
use crate::infra::errors::WkError;
use crate::render::{Renderer, SiteLinks, StudyItem};

type Sink = Arc<dyn Fn(&str) + Send + Sync>;

/// Writes one line per call to `out`; errors go to `err`.
pub struct TextRenderer {
    links: SiteLinks,
    out: Sink,
    err: Sink,
}

impl TextRenderer {
    pub fn stdout(links: SiteLinks) -> Self {
        Self::with_sinks(
            links,
            Arc::new(|line: &str| println!("{line}")),
            Arc::new(|line: &str| eprintln!("{line}")),
        )
    }

    pub fn with_sinks(links: SiteLinks, out: Sink, err: Sink) -> Self {
        Self { links, out, err }
    }

    /// A free-form status line.
    pub fn line(&self, line: &str) {
        (self.out)(line);
    }

    fn emit(&self, lines: Vec<String>) {
        for line in lines {
            (self.out)(&line);
        }
    }

    fn report(&self, error: &WkError) {
        if error.is_retriable() {
            (self.err)(&format!("error: {error} (temporary, try again later)"));
        } else {
            (self.err)(&format!("error: {error}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

pub fn info_lines(info: &UserInformation, links: &SiteLinks) -> Vec<String> {
    let mut lines = vec![
        format!("{} (level {}, {})", info.username, info.level, info.title),
        format!("  Profile:  {}", links.web_url(info)),
        format!("  Avatar:   {}", info.avatar_url(Some(80))),
    ];
    if let Some(twitter) = info.twitter_url() {
        lines.push(format!("  Twitter:  {twitter}"));
    }
    if let Some(created) = info.created_at() {
        lines.push(format!("  Joined:   {}", created.format("%Y-%m-%d")));
    }
    lines.push(format!(
        "  Forums:   {} topics, {} posts",
        info.topics_count, info.posts_count
    ));
    if info.on_vacation() {
        lines.push("  On vacation".into());
    }
    lines
}

pub fn queue_lines(queue: &StudyQueue) -> Vec<String> {
    let next = match queue.next_review_at() {
        Some(at) if at <= Utc::now() => "now".to_string(),
        Some(at) => at.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => "none scheduled".to_string(),
    };
    vec![
        format!("Lessons available:  {}", queue.lessons_available),
        format!("Reviews available:  {}", queue.reviews_available),
        format!("  next hour:        {}", queue.reviews_available_next_hour),
        format!("  next day:         {}", queue.reviews_available_next_day),
        format!("Next review:        {next}"),
    ]
}

pub fn progress_lines(progress: &LevelProgression) -> Vec<String> {
    vec![
        format!(
            "Radicals: {}/{}",
            progress.radicals_progress, progress.radicals_total
        ),
        format!(
            "Kanji:    {}/{} ({:.0}%)",
            progress.kanji_progress,
            progress.kanji_total,
            progress.kanji_ratio() * 100.0
        ),
    ]
}

pub fn srs_lines(dist: &SrsDistribution) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<12}{:>9}{:>7}{:>12}{:>7}",
        "stage", "radicals", "kanji", "vocabulary", "total"
    )];
    for stage in SrsStage::ALL {
        let c = dist.stage(stage);
        lines.push(format!(
            "{:<12}{:>9}{:>7}{:>12}{:>7}",
            stage.as_str(),
            c.radicals,
            c.kanji,
            c.vocabulary,
            c.total
        ));
    }
    lines
}

fn item_line(item: &impl StudyItem, level: u32, detail: &str, links: &SiteLinks) -> String {
    let link = links.item_link(item, None);
    let mut line = format!("[{:>2}] {:<10} {:<8}", level, item.kind().as_str(), link.text);
    if !item.meaning().is_empty() {
        line.push_str(&format!(" {}", item.meaning()));
    }
    if !detail.is_empty() {
        line.push_str(&format!(" ({detail})"));
    }
    line.push_str(&format!("  {}", link.href));
    line
}

fn stage_of(stats: Option<&ItemStats>) -> String {
    match stats {
        None => "locked".into(),
        Some(s) => s
            .stage()
            .map(|st| st.as_str().to_string())
            .unwrap_or_else(|| s.srs.clone()),
    }
}

pub fn radical_lines(items: &[Radical], links: &SiteLinks) -> Vec<String> {
    items
        .iter()
        .map(|r| item_line(r, r.level, &stage_of(r.stats.as_ref()), links))
        .collect()
}

pub fn kanji_lines(items: &[Kanji], links: &SiteLinks) -> Vec<String> {
    items
        .iter()
        .map(|k| {
            let detail = format!("{}, {}", k.important_reading, stage_of(k.stats.as_ref()));
            item_line(k, k.level, &detail, links)
        })
        .collect()
}

pub fn vocabulary_lines(items: &[Vocabulary], links: &SiteLinks) -> Vec<String> {
    items
        .iter()
        .map(|v| {
            let detail = format!("{}, {}", v.kana, stage_of(v.stats.as_ref()));
            item_line(v, v.level, &detail, links)
        })
        .collect()
}

pub fn recent_lines(items: &[RecentUnlock], links: &SiteLinks) -> Vec<String> {
    items
        .iter()
        .map(|u| {
            let when = u
                .unlocked_at()
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            item_line(u, u.level, &when, links)
        })
        .collect()
}

pub fn critical_lines(items: &[CriticalItem], links: &SiteLinks) -> Vec<String> {
    items
        .iter()
        .map(|c| item_line(c, c.level, &format!("{}%", c.percentage), links))
        .collect()
}

fn or_empty(lines: Vec<String>, what: &str) -> Vec<String> {
    if lines.is_empty() {
        vec![format!("No {what}.")]
    } else {
        lines
    }
}

// ---------------------------------------------------------------------------
// Renderer impls
// ---------------------------------------------------------------------------

macro_rules! text_renderer {
    ($ty:ty, |$r:ident, $v:ident| $lines:expr) => {
        impl Renderer<$ty> for TextRenderer {
            fn render(&self, value: &$ty) {
                let $r = self;
                let $v = value;
                self.emit($lines);
            }

            fn render_error(&self, error: &WkError) {
                self.report(error);
            }
        }
    };
}

text_renderer!(UserInformation, |r, v| info_lines(v, &r.links));
text_renderer!(StudyQueue, |_r, v| queue_lines(v));
text_renderer!(LevelProgression, |_r, v| progress_lines(v));
text_renderer!(SrsDistribution, |_r, v| srs_lines(v));
text_renderer!(Vec<RecentUnlock>, |r, v| or_empty(
    recent_lines(v, &r.links),
    "recent unlocks"
));
text_renderer!(Vec<CriticalItem>, |r, v| or_empty(
    critical_lines(v, &r.links),
    "critical items"
));
text_renderer!(Vec<Radical>, |r, v| or_empty(radical_lines(v, &r.links), "radicals"));
text_renderer!(Vec<Kanji>, |r, v| or_empty(kanji_lines(v, &r.links), "kanji"));
text_renderer!(Vec<Vocabulary>, |r, v| or_empty(
    vocabulary_lines(v, &r.links),
    "vocabulary"
));
