//! Repository cards on a profile, with per-repo display settings.

use larder::{PartialAppState, data_model::Timestamped};
use serde::{Deserialize, Serialize};

pub fn repos_key(username: &str) -> String {
    format!("devpulse_repos_{username}")
}

const fn yes() -> bool {
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSettings {
    #[serde(default = "yes")]
    pub show_stars: bool,
    #[serde(default = "yes")]
    pub show_forks: bool,
    #[serde(default = "yes")]
    pub show_description: bool,
    #[serde(default)]
    pub pin_to_top: bool,
    /// Hidden repos stay listed for their owner, dimmed.
    #[serde(default)]
    pub hide_repo: bool,
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self {
            show_stars: true,
            show_forks: true,
            show_description: true,
            pin_to_top: false,
            hide_repo: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub forks: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub settings: RepoSettings,
}

/// What a repo card renders once its settings are applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoCard<'a> {
    pub name: &'a str,
    /// `None` when the owner hid the description.
    pub description: Option<&'a str>,
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub dimmed: bool,
}

impl Repo {
    pub fn card(&self) -> RepoCard<'_> {
        let settings = &self.settings;
        RepoCard {
            name: &self.name,
            description: settings.show_description.then(|| {
                if self.description.is_empty() {
                    "No description yet."
                } else {
                    self.description.as_str()
                }
            }),
            stars: settings.show_stars.then_some(self.stars),
            forks: settings.show_forks.then_some(self.forks),
            dimmed: settings.hide_repo,
        }
    }
}

/// The repo settings popover.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepoSettingsForm {
    pub settings: RepoSettings,
    pub description: String,
}

impl RepoSettingsForm {
    pub fn for_repo(repo: &Repo) -> Self {
        Self {
            settings: repo.settings,
            description: repo.description.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoShelf {
    pub repos: Vec<Repo>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepoEvent {
    /// Replace the list with freshly fetched repos, keeping settings for repos already known.
    Import(Vec<Repo>),
    SaveSettings { repo: String, form: RepoSettingsForm },
}

impl PartialAppState for RepoShelf {
    type Event = RepoEvent;
    type Partial = Self;

    fn process_event(mut shelf: Self, event: &Timestamped<RepoEvent>) -> Self {
        match &event.event {
            RepoEvent::Import(fetched) => {
                let repos: Vec<Repo> = fetched
                    .iter()
                    .map(|repo| {
                        let mut repo = repo.clone();
                        if let Some(known) = shelf.repo(&repo.id) {
                            repo.settings = known.settings;
                        }
                        repo
                    })
                    .collect();
                shelf.repos = repos;
            }
            RepoEvent::SaveSettings { repo, form } => {
                match shelf.repos.iter_mut().find(|r| &r.id == repo) {
                    Some(target) => {
                        target.settings = form.settings;
                        target.description = form.description.clone();
                    }
                    None => log::warn!("Settings saved for unknown repo {repo}"),
                }
            }
        }
        shelf
    }

    fn finalize(shelf: Self) -> Self {
        shelf
    }
}

impl RepoShelf {
    pub fn repo(&self, id: &str) -> Option<&Repo> {
        self.repos.iter().find(|repo| repo.id == id)
    }

    /// Pinned repos first, otherwise in the order they were imported.
    pub fn display_order(&self) -> Vec<&Repo> {
        let mut ordered: Vec<&Repo> = self.repos.iter().collect();
        ordered.sort_by_key(|repo| !repo.settings.pin_to_top);
        ordered
    }
}
