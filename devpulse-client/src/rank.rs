use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Something a listing can order.
pub trait Rankable {
    fn created_at(&self) -> DateTime<Utc>;

    /// Higher ranks first in [`SortMode::Top`].
    fn score(&self) -> i64;
}

impl<T: Rankable + ?Sized> Rankable for &T {
    fn created_at(&self) -> DateTime<Utc> {
        (**self).created_at()
    }

    fn score(&self) -> i64 {
        (**self).score()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    New,
    #[serde(alias = "trending")]
    Top,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown sort mode `{0}`")]
pub struct ParseSortModeError(String);

impl std::str::FromStr for SortMode {
    type Err = ParseSortModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" | "newest" | "latest" => Ok(SortMode::New),
            "top" | "trending" => Ok(SortMode::Top),
            other => Err(ParseSortModeError(other.to_string())),
        }
    }
}

/// Order `subjects` for display. The input is left alone and ties keep their input order.
pub fn rank<S: Rankable>(subjects: &[S], mode: SortMode) -> Vec<&S> {
    let mut ranked: Vec<&S> = subjects.iter().collect();
    match mode {
        SortMode::New => ranked.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
        SortMode::Top => ranked.sort_by(|a, b| {
            b.score()
                .cmp(&a.score())
                .then_with(|| b.created_at().cmp(&a.created_at()))
        }),
    }
    ranked
}
