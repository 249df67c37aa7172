//! The media gallery: images and videos with heart/trophy reactions and a lightbox.

use chrono::{DateTime, Duration, Utc};
use devpulse_types::UserId;
use enumap::EnuMap;
use larder::{PartialAppState, data_model::Timestamped};
use serde::{Deserialize, Serialize};

use crate::{
    counters::Membership,
    ledger::SubjectId,
    rank::{Rankable, SortMode, rank},
};

pub const MEDIA_KEY: &str = "devpulse_media_v2";

#[derive(EnuMap, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaReaction {
    Heart,
    Trophy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: SubjectId,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub author_id: UserId,
    pub title: String,
    pub src: String,
    #[serde(default)]
    pub caption: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reactions: MediaReactionMap<Membership>,
}

impl MediaItem {
    pub fn reaction_count(&self, reaction: MediaReaction) -> usize {
        self.reactions.get(&reaction).count()
    }

    pub fn has_reacted(&self, reaction: MediaReaction, user: &UserId) -> bool {
        self.reactions.get(&reaction).contains(user)
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
    }
}

impl Rankable for MediaItem {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn score(&self) -> i64 {
        i64::try_from(self.views).unwrap_or(i64::MAX)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryFilter {
    #[default]
    All,
    Following,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GallerySort {
    #[default]
    Trending,
    Newest,
}

impl From<GallerySort> for SortMode {
    fn from(sort: GallerySort) -> Self {
        match sort {
            GallerySort::Trending => SortMode::Top,
            GallerySort::Newest => SortMode::New,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GalleryQuery {
    pub filter: GalleryFilter,
    pub sort: GallerySort,
    pub search: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gallery {
    pub items: Vec<MediaItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GalleryEvent {
    ToggleReaction {
        item: SubjectId,
        user: UserId,
        reaction: MediaReaction,
    },
    RecordView {
        item: SubjectId,
    },
}

impl PartialAppState for Gallery {
    type Event = GalleryEvent;
    type Partial = Self;

    fn process_event(mut gallery: Self, event: &Timestamped<GalleryEvent>) -> Self {
        match &event.event {
            GalleryEvent::ToggleReaction {
                item,
                user,
                reaction,
            } => match gallery.item_mut(item) {
                Some(target) => {
                    target.reactions.get_mut(reaction).toggle(user);
                }
                None => log::warn!("Reaction on unknown media item {item}"),
            },
            GalleryEvent::RecordView { item } => match gallery.item_mut(item) {
                Some(target) => target.views += 1,
                None => log::warn!("View of unknown media item {item}"),
            },
        }
        gallery
    }

    fn finalize(gallery: Self) -> Self {
        gallery
    }
}

impl Gallery {
    pub fn item(&self, id: &SubjectId) -> Option<&MediaItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    fn item_mut(&mut self, id: &SubjectId) -> Option<&mut MediaItem> {
        self.items.iter_mut().find(|item| &item.id == id)
    }

    /// The items the gallery grid shows for `query`. `following` is the set of authors the
    /// viewer follows.
    pub fn view(&self, query: &GalleryQuery, following: &Membership) -> Vec<&MediaItem> {
        let matching: Vec<&MediaItem> = self
            .items
            .iter()
            .filter(|item| match query.filter {
                GalleryFilter::All => true,
                GalleryFilter::Following => following.contains(&item.author_id),
            })
            .filter(|item| item.matches(&query.search))
            .collect();
        rank(&matching, query.sort.into())
            .into_iter()
            .copied()
            .collect()
    }

    pub fn seed(now: DateTime<Utc>) -> Self {
        let item = |id: &str,
                    kind: MediaKind,
                    author: &str,
                    title: &str,
                    src: &str,
                    caption: &str,
                    age: Duration,
                    views: u64,
                    hearts: &[&str],
                    trophies: &[&str],
                    tags: &[&str]| MediaItem {
            id: SubjectId::from(id),
            kind,
            author_id: UserId::from(author),
            title: title.to_string(),
            src: src.to_string(),
            caption: caption.to_string(),
            created_at: now - age,
            views,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            reactions: MediaReactionMap {
                heart: hearts.iter().copied().collect(),
                trophy: trophies.iter().copied().collect(),
            },
        };
        const FLOWER: &str = "https://interactive-examples.mdn.mozilla.net/media/cc0-videos/flower.mp4";

        Self {
            items: vec![
                item(
                    "m1",
                    MediaKind::Image,
                    "u_alex",
                    "Neon UI mockups",
                    "https://picsum.photos/id/1018/1200/1800",
                    "Vibrant neon UI concepts for a dashboard.",
                    Duration::days(1),
                    450,
                    &["u_sam"],
                    &[],
                    &["ui", "design"],
                ),
                item(
                    "m2",
                    MediaKind::Video,
                    "u_sam",
                    "Quick WebRTC demo",
                    FLOWER,
                    "Short demo of live drawing with low-latency.",
                    Duration::hours(12),
                    1200,
                    &["u_alex", "u_jordan"],
                    &["u_jordan"],
                    &["webrtc", "demo"],
                ),
                item(
                    "m3",
                    MediaKind::Image,
                    "u_jordan",
                    "Caching architecture sketch",
                    "https://picsum.photos/id/1025/1200/1600",
                    "Rough sketch for IndexedDB-based caching flow.",
                    Duration::hours(72),
                    210,
                    &[],
                    &[],
                    &["architecture", "browser"],
                ),
                item(
                    "m4",
                    MediaKind::Image,
                    "u_aria",
                    "Landing page hero",
                    "https://picsum.photos/id/1043/1200/1600",
                    "Hero shot experiments for a marketing site.",
                    Duration::hours(6),
                    980,
                    &["u_alex"],
                    &[],
                    &["marketing", "design"],
                ),
                item(
                    "m5",
                    MediaKind::Video,
                    "u_alex",
                    "Tiny animation library showcase",
                    FLOWER,
                    "Animations running at 60fps with a tiny bundle size.",
                    Duration::minutes(30),
                    2000,
                    &[],
                    &["u_aria"],
                    &["animation", "css"],
                ),
            ],
        }
    }
}

/// The item open in the media viewer. Its position is looked up in the current view every
/// time, since counting a view can move the item within a trending view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lightbox {
    item: SubjectId,
}

impl Lightbox {
    pub fn open(view: &[&MediaItem], item: &SubjectId) -> Option<Self> {
        view.iter().any(|candidate| &candidate.id == item).then(|| Self {
            item: item.clone(),
        })
    }

    pub fn item(&self) -> &SubjectId {
        &self.item
    }

    /// `None` once the item has dropped out of `view`.
    pub fn index(&self, view: &[&MediaItem]) -> Option<usize> {
        view.iter().position(|candidate| candidate.id == self.item)
    }

    pub fn current<'a>(&self, view: &[&'a MediaItem]) -> Option<&'a MediaItem> {
        view.iter().find(|candidate| candidate.id == self.item).copied()
    }

    pub fn has_previous(&self, view: &[&MediaItem]) -> bool {
        self.index(view).is_some_and(|index| index > 0)
    }

    pub fn has_next(&self, view: &[&MediaItem]) -> bool {
        self.index(view).is_some_and(|index| index + 1 < view.len())
    }

    /// Step back one item. Stays put at the start of the view.
    pub fn previous(&mut self, view: &[&MediaItem]) -> bool {
        self.step(view, |index| index.checked_sub(1))
    }

    /// Step forward one item. Stays put at the end of the view.
    pub fn next(&mut self, view: &[&MediaItem]) -> bool {
        self.step(view, |index| index.checked_add(1))
    }

    fn step(&mut self, view: &[&MediaItem], to: impl FnOnce(usize) -> Option<usize>) -> bool {
        let target = self
            .index(view)
            .and_then(to)
            .and_then(|index| view.get(index));
        match target {
            Some(target) => {
                self.item = target.id.clone();
                true
            }
            None => false,
        }
    }
}

pub fn share_link(origin: &str, item: &SubjectId) -> String {
    format!("{}/media/{item}", origin.trim_end_matches('/'))
}
