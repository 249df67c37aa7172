use chrono::Utc;
use devpulse_types::{
    UserId,
    profile::{Profile, SectionKind, SocialProvider, Viewer},
};
use larder::{
    AppState, DirectoryStorage, KeyValueStorage, Persisted, StorageError, Store,
    data_model::Stamper,
};
use serde::Serialize;

use crate::{
    api::ApiClient,
    config::{Config, DEMO_USER_ID},
    explore::{EXPLORE_KEY, ExploreBoard, ExploreEvent},
    feed::{FEED_KEY, Feed, FeedEvent, Post},
    ledger::{SubjectId, VoteDirection},
    media::{Gallery, GalleryEvent, GalleryQuery, Lightbox, MEDIA_KEY, MediaItem, MediaReaction},
    notifications::{Inbox, InboxEvent, NOTIFICATIONS_KEY},
    profile::{
        FOLLOWING_KEY, Following, ProfileDetails, ProfileError, ProfileEvent, ProfilePage,
        SectionDraft, ToggleFollow, profile_key,
    },
    repos::{Repo, RepoEvent, RepoSettingsForm, RepoShelf, repos_key},
    settings::{SETTINGS_KEY, Settings, SettingsEvent},
    ui::{Modal, UiState},
};

/// Shown inline when the notification list can't be refreshed.
pub const NOTIFICATIONS_UNAVAILABLE: &str = "Failed to load notifications";

/// The profile page currently on screen.
#[derive(Debug)]
pub struct ProfileView {
    page: Persisted<ProfilePage>,
    repos: Persisted<RepoShelf>,
}

impl ProfileView {
    pub fn profile(&self) -> &Profile {
        self.page.state().profile()
    }

    pub fn page(&self) -> &ProfilePage {
        self.page.state()
    }

    pub fn repos(&self) -> &RepoShelf {
        self.repos.state()
    }
}

/// Everything one signed-in (or signed-out) user has open.
///
/// Every user action goes through here: it is stamped, applied to the page it belongs to,
/// saved once, and only then (for notifications and profiles) sent to the server.
pub struct Session<B: KeyValueStorage> {
    store: Store<B>,
    stamper: Stamper,
    user: UserId,
    viewer: Option<Viewer>,
    api: Option<ApiClient>,
    pub ui: UiState,
    feed: Persisted<Feed>,
    explore: Persisted<ExploreBoard>,
    gallery: Persisted<Gallery>,
    inbox: Persisted<Inbox>,
    settings: Persisted<Settings>,
    following: Persisted<Following>,
    profile: Option<ProfileView>,
    notification_error: Option<String>,
}

fn apply<B, S>(store: &mut Store<B>, stamper: &mut Stamper, target: &mut Persisted<S>, event: S::Event)
where
    B: KeyValueStorage,
    S: AppState + Default + Serialize,
{
    target.dispatch(store, &stamper.stamp(event));
}

impl Session<DirectoryStorage> {
    /// Open a session backed by `config.data_dir`, talking to `config.api_base_url` if set.
    ///
    /// Server requests are sent in the background. On native targets that needs a running tokio
    /// runtime: a session driven from plain synchronous code still updates its local documents,
    /// but its requests are dropped with a warning and never reach the server.
    pub fn from_config(config: &Config, viewer: Option<Viewer>) -> Result<Self, StorageError> {
        let backend = DirectoryStorage::open(&config.data_dir)?;
        let viewer = viewer.or_else(|| {
            config.user_id.as_ref().map(|id| Viewer {
                id: id.to_string(),
                username: None,
                full_name: None,
                image_url: None,
            })
        });
        let api = config
            .api_base_url
            .as_ref()
            .map(|url| ApiClient::new(url.clone()).with_access_token(config.access_token.clone()));
        Ok(Self::open(backend, viewer).with_api(api))
    }
}

impl<B: KeyValueStorage> Session<B> {
    /// Load every page from `backend`, seeding whatever is missing.
    pub fn open(backend: B, viewer: Option<Viewer>) -> Self {
        let now = Utc::now();
        let mut store = Store::new(backend);
        let user = viewer
            .as_ref()
            .map_or_else(|| UserId::from(DEMO_USER_ID), |viewer| UserId::new(viewer.id.clone()));
        log::info!("Opening session for {user}");

        let feed = Persisted::load(&mut store, FEED_KEY, Feed::seed(now));
        let explore = Persisted::load(&mut store, EXPLORE_KEY, ExploreBoard::seed(now));
        let gallery = Persisted::load(&mut store, MEDIA_KEY, Gallery::seed(now));
        let inbox = Persisted::load(&mut store, NOTIFICATIONS_KEY, Inbox::seed(now));
        let settings = Persisted::load(&mut store, SETTINGS_KEY, Settings::default());
        let following = Persisted::load(&mut store, FOLLOWING_KEY, Following::seed());

        Self {
            store,
            stamper: Stamper::new(),
            user,
            viewer,
            api: None,
            ui: UiState::default(),
            feed,
            explore,
            gallery,
            inbox,
            settings,
            following,
            profile: None,
            notification_error: None,
        }
    }

    pub fn with_api(mut self, api: Option<ApiClient>) -> Self {
        self.api = api;
        self
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    /// End the session, handing back the storage it wrote to.
    pub fn into_backend(self) -> B {
        self.store.into_backend()
    }

    // Feed

    pub fn feed(&self) -> &Feed {
        self.feed.state()
    }

    pub fn vote_post(&mut self, post: &SubjectId, direction: VoteDirection) {
        let event = FeedEvent::Vote {
            post: post.clone(),
            user: self.user.clone(),
            direction,
        };
        apply(&mut self.store, &mut self.stamper, &mut self.feed, event);
    }

    pub fn toggle_star(&mut self, post: &SubjectId) {
        let event = FeedEvent::ToggleStar {
            post: post.clone(),
            user: self.user.clone(),
        };
        apply(&mut self.store, &mut self.stamper, &mut self.feed, event);
    }

    /// Returns `false` without touching anything when `text` is blank or `post` doesn't exist.
    pub fn comment_on_post(&mut self, post: &SubjectId, text: &str) -> bool {
        if text.trim().is_empty() || self.feed().post(post).is_none() {
            return false;
        }
        let event = FeedEvent::Comment {
            post: post.clone(),
            comment: SubjectId::generate("c"),
            author: self.user.clone(),
            text: text.to_string(),
        };
        apply(&mut self.store, &mut self.stamper, &mut self.feed, event);
        true
    }

    /// The revealed part of the feed in the current sort order, and whether there is more.
    pub fn feed_page(&self) -> (Vec<&Post>, bool) {
        let ranked = self.feed().ranked(self.ui.feed_sort);
        let has_more = self.ui.feed_pager.has_more(ranked.len());
        (self.ui.feed_pager.window(&ranked).to_vec(), has_more)
    }

    pub fn load_more_posts(&mut self) {
        self.ui.feed_pager.load_more();
    }

    /// Throw away every local change to the feed.
    pub fn reset_feed(&mut self) {
        self.feed.reset(&mut self.store, Feed::seed(Utc::now()));
        self.ui.feed_pager = Default::default();
    }

    // Explore

    pub fn explore(&self) -> &ExploreBoard {
        self.explore.state()
    }

    pub fn vote_explore_post(&mut self, post: &SubjectId, direction: VoteDirection) {
        let event = ExploreEvent::VotePost {
            post: post.clone(),
            user: self.user.clone(),
            direction,
        };
        apply(&mut self.store, &mut self.stamper, &mut self.explore, event);
    }

    pub fn vote_explore_comment(
        &mut self,
        post: &SubjectId,
        comment: &SubjectId,
        direction: VoteDirection,
    ) {
        let event = ExploreEvent::VoteComment {
            post: post.clone(),
            comment: comment.clone(),
            user: self.user.clone(),
            direction,
        };
        apply(&mut self.store, &mut self.stamper, &mut self.explore, event);
    }

    /// Post the draft typed under `post`. A blank draft is ignored and left in place.
    pub fn submit_explore_comment(&mut self, post: &SubjectId) -> bool {
        let text = self.ui.draft(post).trim().to_string();
        if text.is_empty() || self.explore().post(post).is_none() {
            return false;
        }
        let event = ExploreEvent::Comment {
            post: post.clone(),
            comment: SubjectId::generate("c"),
            author: self.user.clone(),
            text,
        };
        apply(&mut self.store, &mut self.stamper, &mut self.explore, event);
        self.ui.take_draft(post);
        self.ui.show_comments(post.clone());
        true
    }

    // Media

    pub fn gallery(&self) -> &Gallery {
        self.gallery.state()
    }

    pub fn toggle_reaction(&mut self, item: &SubjectId, reaction: MediaReaction) {
        let event = GalleryEvent::ToggleReaction {
            item: item.clone(),
            user: self.user.clone(),
            reaction,
        };
        apply(&mut self.store, &mut self.stamper, &mut self.gallery, event);
    }

    pub fn gallery_view(&self, query: &GalleryQuery) -> Vec<&MediaItem> {
        self.gallery().view(query, &self.following.state().0)
    }

    /// Open the lightbox on `item` and count the view. Returns `false` if `item` isn't in
    /// the current view.
    pub fn open_media(&mut self, query: &GalleryQuery, item: &SubjectId) -> bool {
        let Some(lightbox) = Lightbox::open(&self.gallery_view(query), item) else {
            return false;
        };
        let event = GalleryEvent::RecordView { item: item.clone() };
        apply(&mut self.store, &mut self.stamper, &mut self.gallery, event);
        self.ui.open_modal(Modal::MediaViewer(lightbox));
        true
    }

    pub fn current_media(&self, query: &GalleryQuery) -> Option<&MediaItem> {
        match self.ui.modal() {
            Some(Modal::MediaViewer(lightbox)) => lightbox.current(&self.gallery_view(query)),
            _ => None,
        }
    }

    pub fn next_media(&mut self, query: &GalleryQuery) -> bool {
        let view = self.gallery.state().view(query, &self.following.state().0);
        match self.ui.modal_mut() {
            Some(Modal::MediaViewer(lightbox)) => lightbox.next(&view),
            _ => false,
        }
    }

    pub fn previous_media(&mut self, query: &GalleryQuery) -> bool {
        let view = self.gallery.state().view(query, &self.following.state().0);
        match self.ui.modal_mut() {
            Some(Modal::MediaViewer(lightbox)) => lightbox.previous(&view),
            _ => false,
        }
    }

    // Notifications

    pub fn inbox(&self) -> &Inbox {
        self.inbox.state()
    }

    pub fn notification_error(&self) -> Option<&str> {
        self.notification_error.as_deref()
    }

    pub fn mark_notification_read(&mut self, id: &str) {
        let event = InboxEvent::MarkRead { id: id.to_string() };
        apply(&mut self.store, &mut self.stamper, &mut self.inbox, event);
        if let Some(api) = &self.api {
            api.mark_read_in_background(id.to_string());
        }
    }

    pub fn mark_all_notifications_read(&mut self) {
        apply(
            &mut self.store,
            &mut self.stamper,
            &mut self.inbox,
            InboxEvent::MarkAllRead,
        );
    }

    /// Pull notifications from the server and merge them in. Offline sessions skip this.
    pub async fn refresh_notifications(&mut self) {
        let Some(api) = self.api.clone() else {
            return;
        };
        match api.fetch_notifications().await {
            Ok(incoming) => {
                log::info!("Fetched {} notifications", incoming.len());
                self.notification_error = None;
                apply(
                    &mut self.store,
                    &mut self.stamper,
                    &mut self.inbox,
                    InboxEvent::Merge { incoming },
                );
            }
            Err(e) => {
                log::error!("Failed to fetch notifications: {e}");
                self.notification_error = Some(NOTIFICATIONS_UNAVAILABLE.to_string());
            }
        }
    }

    // Profile

    /// Show the profile at `username`, loading it (or a placeholder) and its repos.
    pub fn open_profile(&mut self, username: &str) -> &ProfileView {
        let seed = ProfilePage(Profile::placeholder(
            username,
            self.viewer.as_ref(),
            Utc::now(),
        ));
        let view = ProfileView {
            page: Persisted::load(&mut self.store, profile_key(username), seed),
            repos: Persisted::load(&mut self.store, repos_key(username), RepoShelf::default()),
        };
        self.ui.close_modal();
        self.profile.insert(view)
    }

    pub fn profile_view(&self) -> Option<&ProfileView> {
        self.profile.as_ref()
    }

    pub fn is_profile_owner(&self) -> bool {
        match (&self.viewer, &self.profile) {
            (Some(viewer), Some(view)) => viewer.owns(&view.profile().username),
            _ => false,
        }
    }

    pub fn is_following(&self) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|view| self.following.state().contains(&view.page().follow_target()))
    }

    fn edit_profile(&mut self, event: ProfileEvent) -> Result<(), ProfileError> {
        if self.profile.is_none() {
            return Err(ProfileError::NoProfile);
        }
        if !self.is_profile_owner() {
            return Err(ProfileError::NotOwner);
        }
        self.change_profile(event)
    }

    fn change_profile(&mut self, event: ProfileEvent) -> Result<(), ProfileError> {
        let view = self.profile.as_mut().ok_or(ProfileError::NoProfile)?;
        apply(&mut self.store, &mut self.stamper, &mut view.page, event);
        if let Some(api) = &self.api {
            api.save_profile_in_background(view.profile().clone());
        }
        Ok(())
    }

    pub fn update_profile(&mut self, details: ProfileDetails) -> Result<(), ProfileError> {
        self.edit_profile(ProfileEvent::UpdateDetails(details))?;
        self.ui.close_modal();
        Ok(())
    }

    /// An empty `url` clears the link.
    pub fn set_social(&mut self, provider: SocialProvider, url: &str) -> Result<(), ProfileError> {
        let url = url.trim();
        if !url.is_empty() && !devpulse_types::is_http_url(url) {
            return Err(ProfileError::InvalidLink(url.to_string()));
        }
        self.edit_profile(ProfileEvent::SetSocial {
            provider,
            url: url.to_string(),
        })
    }

    /// Add a new item (`index` is `None`) or replace the one at `index`.
    pub fn save_section_item(
        &mut self,
        kind: SectionKind,
        index: Option<usize>,
        draft: SectionDraft,
    ) -> Result<(), ProfileError> {
        let item = draft.into_item(Utc::now())?;
        let event = match index {
            None => ProfileEvent::AddSectionItem { kind, item },
            Some(index) => {
                self.section_item_exists(kind, index)?;
                ProfileEvent::EditSectionItem { kind, index, item }
            }
        };
        self.edit_profile(event)?;
        self.ui.close_modal();
        Ok(())
    }

    pub fn delete_section_item(&mut self, kind: SectionKind, index: usize) -> Result<(), ProfileError> {
        self.section_item_exists(kind, index)?;
        self.edit_profile(ProfileEvent::DeleteSectionItem { kind, index })
    }

    fn section_item_exists(&self, kind: SectionKind, index: usize) -> Result<(), ProfileError> {
        let view = self.profile.as_ref().ok_or(ProfileError::NoProfile)?;
        view.page().item(kind, index).map(|_| ())
    }

    /// Follow or unfollow the open profile. Returns whether the viewer now follows it.
    pub fn toggle_follow(&mut self) -> Result<bool, ProfileError> {
        let target = self
            .profile
            .as_ref()
            .ok_or(ProfileError::NoProfile)?
            .page()
            .follow_target();
        if self.is_profile_owner() {
            return Err(ProfileError::OwnProfile);
        }
        apply(
            &mut self.store,
            &mut self.stamper,
            &mut self.following,
            ToggleFollow(target.clone()),
        );
        let now_following = self.following.state().contains(&target);
        self.change_profile(ProfileEvent::Followed(now_following))?;
        Ok(now_following)
    }

    pub fn import_repos(&mut self, repos: Vec<Repo>) -> Result<(), ProfileError> {
        let view = self.profile.as_mut().ok_or(ProfileError::NoProfile)?;
        apply(
            &mut self.store,
            &mut self.stamper,
            &mut view.repos,
            RepoEvent::Import(repos),
        );
        Ok(())
    }

    pub fn save_repo_settings(&mut self, repo: &str, form: RepoSettingsForm) -> Result<(), ProfileError> {
        if !self.is_profile_owner() {
            return Err(ProfileError::NotOwner);
        }
        let view = self.profile.as_mut().ok_or(ProfileError::NoProfile)?;
        apply(
            &mut self.store,
            &mut self.stamper,
            &mut view.repos,
            RepoEvent::SaveSettings {
                repo: repo.to_string(),
                form,
            },
        );
        Ok(())
    }

    // Settings

    pub fn dark_mode(&self) -> bool {
        self.settings.state().dark_mode()
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        apply(
            &mut self.store,
            &mut self.stamper,
            &mut self.settings,
            SettingsEvent::SetDarkMode(dark),
        );
    }

    /// Returns the new mode.
    pub fn toggle_theme(&mut self) -> bool {
        let dark = !self.dark_mode();
        self.set_dark_mode(dark);
        dark
    }
}
