use chrono::{DateTime, Utc};
use enumap::EnuMap;
use serde::{Deserialize, Serialize};

/// The signed-in user, as the auth provider describes them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Viewer {
    /// Whether this viewer is the person the profile at `username` belongs to.
    pub fn owns(&self, username: &str) -> bool {
        self.username.as_deref() == Some(username) || self.id == username
    }
}

#[derive(EnuMap, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialProvider {
    Github,
    Youtube,
    Linkedin,
    Instagram,
}

#[derive(EnuMap, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    OpenSource,
    Projects,
    Tutorials,
    Articles,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SectionItem {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub posts: u64,
    pub stars: u64,
    pub views: u64,
    pub followers: u64,
    pub following: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Empty until the owner has signed in and saved once.
    pub owner_id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub website: String,
    pub socials: SocialProviderMap<String>,
    pub stats: ProfileStats,
    pub sections: SectionKindMap<Vec<SectionItem>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub joined_at: DateTime<Utc>,
}

impl Profile {
    /// The profile shown for `username` before anything has been saved.
    /// The viewer's details are only borrowed when the viewer owns it.
    pub fn placeholder(username: &str, viewer: Option<&Viewer>, now: DateTime<Utc>) -> Self {
        let owner = viewer.filter(|viewer| viewer.owns(username));
        Self {
            owner_id: owner.map(|viewer| viewer.id.clone()).unwrap_or_default(),
            username: username.to_string(),
            display_name: owner
                .and_then(|viewer| viewer.full_name.clone().or_else(|| viewer.username.clone()))
                .unwrap_or_else(|| "New Dev".to_string()),
            avatar: owner
                .and_then(|viewer| viewer.image_url.clone())
                .unwrap_or_else(|| format!("https://ui-avatars.com/api/?name={username}")),
            bio: String::new(),
            website: String::new(),
            socials: SocialProviderMap::default(),
            stats: ProfileStats::default(),
            sections: SectionKindMap::default(),
            joined_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer() -> Viewer {
        Viewer {
            id: "user_2x".to_string(),
            username: Some("alex_dev".to_string()),
            full_name: Some("Alex Rivera".to_string()),
            image_url: Some("https://img.example/alex.png".to_string()),
        }
    }

    #[test]
    fn test_owner_matches_username_or_id() {
        let viewer = viewer();
        assert!(viewer.owns("alex_dev"));
        assert!(viewer.owns("user_2x"));
        assert!(!viewer.owns("sarah_codes"));
    }

    #[test]
    fn test_placeholder_for_owner_uses_viewer_details() {
        let now = Utc::now();
        let profile = Profile::placeholder("alex_dev", Some(&viewer()), now);

        assert_eq!(profile.owner_id, "user_2x");
        assert_eq!(profile.display_name, "Alex Rivera");
        assert_eq!(profile.avatar, "https://img.example/alex.png");
        assert_eq!(profile.joined_at, now);
    }

    #[test]
    fn test_placeholder_for_someone_else_stays_anonymous() {
        let profile = Profile::placeholder("sarah_codes", Some(&viewer()), Utc::now());

        assert_eq!(profile.owner_id, "");
        assert_eq!(profile.display_name, "New Dev");
        assert_eq!(
            profile.avatar,
            "https://ui-avatars.com/api/?name=sarah_codes"
        );
    }

    #[test]
    fn test_profile_json_shape() {
        let joined = DateTime::<Utc>::from_timestamp_millis(1_760_000_000_000).unwrap();
        let mut profile = Profile::placeholder("alex_dev", Some(&viewer()), joined);
        profile.socials.github = "https://github.com/alex".to_string();

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["displayName"], "Alex Rivera");
        assert_eq!(json["socials"]["github"], "https://github.com/alex");
        assert!(json["sections"]["openSource"].as_array().unwrap().is_empty());
        assert!(json["sections"].get("open_source").is_none());

        let back: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_profile_reads_documents_keyed_like_the_web_app() {
        let doc = serde_json::json!({
            "ownerId": "user_2x",
            "username": "alex_dev",
            "displayName": "Alex Rivera",
            "bio": "",
            "avatar": "https://img.example/alex.png",
            "joinedAt": 1_760_000_000_000_i64,
            "socials": {"github": "", "youtube": "", "linkedin": "", "instagram": ""},
            "stats": {"posts": 0, "stars": 0, "views": 0, "followers": 0, "following": 0},
            "sections": {"openSource": [], "projects": [], "tutorials": [], "articles": []},
        });

        let profile: Profile = serde_json::from_value(doc.clone()).unwrap();
        assert!(profile.sections.open_source.is_empty());
        assert_eq!(serde_json::to_value(&profile).unwrap()["sections"], doc["sections"]);
    }
}
