use chrono::{DateTime, Utc};
use devpulse_types::UserId;
use serde::{Deserialize, Serialize};

use crate::{counters::Tally, ledger::SubjectId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: SubjectId,
    #[serde(alias = "author")]
    pub author_id: UserId,
    #[serde(alias = "body")]
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Only explore comments are votable; feed comments keep this at zero.
    #[serde(flatten)]
    pub tally: Tally,
}

/// Comments on one subject, oldest first. Entries are only ever appended.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentLog(Vec<Comment>);

impl CommentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` as a new comment. Blank text is ignored and leaves the log unchanged.
    pub fn append(
        &mut self,
        id: SubjectId,
        author_id: UserId,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Option<&Comment> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.0.push(Comment {
            id,
            author_id,
            text: text.to_string(),
            created_at,
            tally: Tally::default(),
        });
        self.0.last()
    }

    pub fn get(&self, id: &SubjectId) -> Option<&Comment> {
        self.0.iter().find(|comment| &comment.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &SubjectId) -> Option<&mut Comment> {
        self.0.iter_mut().find(|comment| &comment.id == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_comments_are_ignored() {
        let mut log = CommentLog::new();
        for blank in ["", "   ", "\n\t "] {
            assert!(
                log.append(SubjectId::generate("c"), UserId::from("me_demo"), blank, Utc::now())
                    .is_none()
            );
        }
        assert!(log.is_empty());
    }

    #[test]
    fn test_append_trims_and_keeps_order() {
        let mut log = CommentLog::new();
        let me = UserId::from("me_demo");
        log.append(SubjectId::from("c1"), me.clone(), "  first ", Utc::now());
        log.append(SubjectId::from("c2"), me, "second", Utc::now());

        let texts: Vec<&str> = log.iter().map(|comment| comment.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(log.get(&SubjectId::from("c2")).unwrap().tally, Tally::default());
    }

    #[test]
    fn test_comment_json_flattens_votes() {
        let created_at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        let comment = Comment {
            id: SubjectId::from("c1"),
            author_id: UserId::from("bob"),
            text: "Nice".to_string(),
            created_at,
            tally: Tally::new(3, 1),
        };
        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "c1",
                "authorId": "bob",
                "text": "Nice",
                "createdAt": 1_700_000_000_000i64,
                "upvotes": 3,
                "downvotes": 1,
            })
        );
        assert_eq!(serde_json::from_value::<Comment>(json).unwrap(), comment);
    }
}
