//! A user's profile page: details, social links, portfolio sections and the follow button.

use chrono::{DateTime, Utc};
use devpulse_types::{
    UserId, is_http_url,
    profile::{Profile, SectionItem, SectionKind, SocialProvider},
};
use larder::{PartialAppState, data_model::Timestamped};
use serde::{Deserialize, Serialize};

use crate::counters::Membership;

pub const FOLLOWING_KEY: &str = "devpulse_following_v1";

pub fn profile_key(username: &str) -> String {
    format!("devpulse_profile_{username}")
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Link must be an http(s) URL, got `{0}`")]
    InvalidLink(String),

    #[error("No {kind:?} item at index {index}")]
    MissingItem { kind: SectionKind, index: usize },

    #[error("Only the owner can edit this profile")]
    NotOwner,

    #[error("You can't follow yourself")]
    OwnProfile,

    #[error("No profile is open")]
    NoProfile,
}

/// The fields of the "Edit Profile" dialog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileDetails {
    pub display_name: String,
    pub avatar: String,
    pub bio: String,
    pub website: String,
    pub followers: u64,
    pub following: u64,
}

impl ProfileDetails {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            display_name: profile.display_name.clone(),
            avatar: profile.avatar.clone(),
            bio: profile.bio.clone(),
            website: profile.website.clone(),
            followers: profile.stats.followers,
            following: profile.stats.following,
        }
    }
}

/// The section editor form, tags as the user typed them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionDraft {
    pub title: String,
    pub description: String,
    pub link: String,
    pub tags: String,
}

impl SectionDraft {
    pub fn from_item(item: &SectionItem) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone(),
            link: item.link.clone(),
            tags: item.tags.join(", "),
        }
    }

    pub fn into_item(self, created_at: DateTime<Utc>) -> Result<SectionItem, ProfileError> {
        let link = self.link.trim().to_string();
        if !link.is_empty() && !is_http_url(&link) {
            return Err(ProfileError::InvalidLink(link));
        }
        Ok(SectionItem {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            link,
            tags: split_tags(&self.tags),
            created_at,
        })
    }
}

/// `"rust, , wasm "` becomes `["rust", "wasm"]`.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfilePage(pub Profile);

#[derive(Clone, Debug, PartialEq)]
pub enum ProfileEvent {
    UpdateDetails(ProfileDetails),
    SetSocial {
        provider: SocialProvider,
        url: String,
    },
    AddSectionItem {
        kind: SectionKind,
        item: SectionItem,
    },
    /// Replace an item's content. The item keeps its original creation time: `item.created_at`
    /// is ignored, so an edit never moves an item to the time it was edited.
    EditSectionItem {
        kind: SectionKind,
        index: usize,
        item: SectionItem,
    },
    DeleteSectionItem {
        kind: SectionKind,
        index: usize,
    },
    /// The viewer started (`true`) or stopped following this profile.
    Followed(bool),
}

impl PartialAppState for ProfilePage {
    type Event = ProfileEvent;
    type Partial = Self;

    fn process_event(ProfilePage(mut profile): Self, event: &Timestamped<ProfileEvent>) -> Self {
        match &event.event {
            ProfileEvent::UpdateDetails(details) => {
                profile.display_name = details.display_name.clone();
                profile.avatar = details.avatar.clone();
                profile.bio = details.bio.clone();
                profile.website = details.website.clone();
                profile.stats.followers = details.followers;
                profile.stats.following = details.following;
            }
            ProfileEvent::SetSocial { provider, url } => {
                *profile.socials.get_mut(provider) = url.trim().to_string();
            }
            ProfileEvent::AddSectionItem { kind, item } => {
                profile.sections.get_mut(kind).insert(0, item.clone());
            }
            ProfileEvent::EditSectionItem { kind, index, item } => {
                match profile.sections.get_mut(kind).get_mut(*index) {
                    Some(existing) => {
                        *existing = SectionItem {
                            created_at: existing.created_at,
                            ..item.clone()
                        };
                    }
                    None => log::warn!("No {kind:?} item at {index} to edit"),
                }
            }
            ProfileEvent::DeleteSectionItem { kind, index } => {
                let items = profile.sections.get_mut(kind);
                if *index < items.len() {
                    items.remove(*index);
                } else {
                    log::warn!("No {kind:?} item at {index} to delete");
                }
            }
            ProfileEvent::Followed(true) => profile.stats.followers += 1,
            ProfileEvent::Followed(false) => {
                profile.stats.followers = profile.stats.followers.saturating_sub(1);
            }
        }
        ProfilePage(profile)
    }

    fn finalize(page: Self) -> Self {
        page
    }
}

impl ProfilePage {
    pub fn profile(&self) -> &Profile {
        &self.0
    }

    /// The user id a follow of this profile is recorded under.
    pub fn follow_target(&self) -> UserId {
        if self.0.owner_id.is_empty() {
            UserId::new(self.0.username.clone())
        } else {
            UserId::new(self.0.owner_id.clone())
        }
    }

    pub fn item(&self, kind: SectionKind, index: usize) -> Result<&SectionItem, ProfileError> {
        self.0
            .sections
            .get(&kind)
            .get(index)
            .ok_or(ProfileError::MissingItem { kind, index })
    }
}

/// The authors the viewer follows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Following(pub Membership);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleFollow(pub UserId);

impl PartialAppState for Following {
    type Event = ToggleFollow;
    type Partial = Self;

    fn process_event(Following(mut followed): Self, event: &Timestamped<ToggleFollow>) -> Self {
        followed.toggle(&event.event.0);
        Following(followed)
    }

    fn finalize(following: Self) -> Self {
        following
    }
}

impl Following {
    pub fn contains(&self, user: &UserId) -> bool {
        self.0.contains(user)
    }

    /// A fresh install follows two of the demo authors.
    pub fn seed() -> Self {
        Following(["u_alex", "u_sam"].into_iter().collect())
    }
}
