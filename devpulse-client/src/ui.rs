//! Ephemeral view state. Nothing here is ever persisted.

use std::collections::BTreeMap;

use devpulse_types::profile::SectionKind;

use crate::{ledger::SubjectId, media::Lightbox, rank::SortMode};

pub const FEED_PAGE_SIZE: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Menu {
    Profile,
    Mobile,
    Notifications,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Modal {
    EditProfile,
    /// `index` is `None` when adding a new item.
    SectionEditor {
        kind: SectionKind,
        index: Option<usize>,
    },
    ProfileImage,
    MediaViewer(Lightbox),
}

/// How much of the feed is revealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedPager {
    visible: usize,
}

impl Default for FeedPager {
    fn default() -> Self {
        Self {
            visible: FEED_PAGE_SIZE,
        }
    }
}

impl FeedPager {
    pub fn visible(&self) -> usize {
        self.visible
    }

    pub fn load_more(&mut self) {
        self.visible += FEED_PAGE_SIZE;
    }

    pub fn has_more(&self, total: usize) -> bool {
        total > self.visible
    }

    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..items.len().min(self.visible)]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    menu: Option<Menu>,
    modal: Option<Modal>,
    open_comments: Option<SubjectId>,
    drafts: BTreeMap<SubjectId, String>,
    pub feed_sort: SortMode,
    pub feed_pager: FeedPager,
}

impl UiState {
    pub fn menu(&self) -> Option<Menu> {
        self.menu
    }

    pub fn is_open(&self, menu: Menu) -> bool {
        self.menu == Some(menu)
    }

    /// Open `menu`, closing any other, or close it if it was already open.
    pub fn toggle_menu(&mut self, menu: Menu) -> bool {
        if self.is_open(menu) {
            self.menu = None;
            false
        } else {
            self.menu = Some(menu);
            true
        }
    }

    /// A click outside any menu.
    pub fn dismiss(&mut self) {
        self.menu = None;
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn modal_mut(&mut self) -> Option<&mut Modal> {
        self.modal.as_mut()
    }

    pub fn open_modal(&mut self, modal: Modal) {
        self.menu = None;
        self.modal = Some(modal);
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn open_comments(&self) -> Option<&SubjectId> {
        self.open_comments.as_ref()
    }

    pub fn show_comments(&mut self, subject: SubjectId) {
        self.open_comments = Some(subject);
    }

    /// Only one comment panel is open at a time.
    pub fn toggle_comments(&mut self, subject: &SubjectId) {
        if self.open_comments.as_ref() == Some(subject) {
            self.open_comments = None;
        } else {
            self.open_comments = Some(subject.clone());
        }
    }

    pub fn draft(&self, subject: &SubjectId) -> &str {
        self.drafts.get(subject).map_or("", String::as_str)
    }

    pub fn set_draft(&mut self, subject: SubjectId, text: impl Into<String>) {
        self.drafts.insert(subject, text.into());
    }

    pub fn take_draft(&mut self, subject: &SubjectId) -> String {
        self.drafts.remove(subject).unwrap_or_default()
    }
}
