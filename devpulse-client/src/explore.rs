//! The explore board. Posts and their comments are both votable, and the board is always
//! ordered by net score.

use chrono::{DateTime, Duration, Utc};
use devpulse_types::UserId;
use larder::{PartialAppState, data_model::Timestamped};
use serde::{Deserialize, Serialize};

use crate::{
    comments::CommentLog,
    counters::Tally,
    ledger::{SubjectId, VoteDirection, VoteLedger},
    rank::{Rankable, SortMode, rank},
};

pub const EXPLORE_KEY: &str = "devpulse_explore_v2";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorePost {
    pub id: SubjectId,
    #[serde(alias = "authorId")]
    pub author: UserId,
    #[serde(default)]
    pub author_avatar: String,
    pub title: String,
    pub body: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub tally: Tally,
    #[serde(default)]
    pub comments: CommentLog,
}

impl Rankable for ExplorePost {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn score(&self) -> i64 {
        self.tally.net()
    }
}

/// Post votes and comment votes are tracked separately.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreVotes {
    #[serde(default)]
    pub posts: VoteLedger,
    #[serde(default)]
    pub comments: VoteLedger,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreBoard {
    pub posts: Vec<ExplorePost>,
    #[serde(default)]
    pub votes: ExploreVotes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExploreEvent {
    VotePost {
        post: SubjectId,
        user: UserId,
        direction: VoteDirection,
    },
    VoteComment {
        post: SubjectId,
        comment: SubjectId,
        user: UserId,
        direction: VoteDirection,
    },
    Comment {
        post: SubjectId,
        comment: SubjectId,
        author: UserId,
        text: String,
    },
}

impl PartialAppState for ExploreBoard {
    type Event = ExploreEvent;
    type Partial = Self;

    fn process_event(mut board: Self, event: &Timestamped<ExploreEvent>) -> Self {
        let ExploreBoard { posts, votes } = &mut board;
        match &event.event {
            ExploreEvent::VotePost {
                post,
                user,
                direction,
            } => match posts.iter_mut().find(|p| &p.id == post) {
                Some(target) => {
                    votes.posts.apply(post, user, *direction, &mut target.tally);
                }
                None => log::warn!("Vote on unknown explore post {post}"),
            },
            ExploreEvent::VoteComment {
                post,
                comment,
                user,
                direction,
            } => {
                let target = posts
                    .iter_mut()
                    .find(|p| &p.id == post)
                    .and_then(|p| p.comments.get_mut(comment));
                match target {
                    Some(target) => {
                        votes
                            .comments
                            .apply(comment, user, *direction, &mut target.tally);
                    }
                    None => log::warn!("Vote on unknown comment {comment} of {post}"),
                }
            }
            ExploreEvent::Comment {
                post,
                comment,
                author,
                text,
            } => match posts.iter_mut().find(|p| &p.id == post) {
                Some(target) => {
                    target
                        .comments
                        .append(comment.clone(), author.clone(), text, event.timestamp);
                }
                None => log::warn!("Comment on unknown explore post {post}"),
            },
        }
        board
    }

    fn finalize(board: Self) -> Self {
        board
    }
}

impl ExploreBoard {
    pub fn post(&self, id: &SubjectId) -> Option<&ExplorePost> {
        self.posts.iter().find(|post| &post.id == id)
    }

    pub fn ranked(&self) -> Vec<&ExplorePost> {
        rank(&self.posts, SortMode::Top)
    }

    pub fn my_post_vote(&self, post: &SubjectId, user: &UserId) -> Option<VoteDirection> {
        self.votes.posts.vote_of(post, user)
    }

    pub fn my_comment_vote(&self, comment: &SubjectId, user: &UserId) -> Option<VoteDirection> {
        self.votes.comments.vote_of(comment, user)
    }

    pub fn seed(now: DateTime<Utc>) -> Self {
        let posts = vec![
            ExplorePost {
                id: SubjectId::from("p1"),
                author: UserId::from("alice"),
                author_avatar: String::new(),
                title: "I rewrote my CLI tool in Rust: results & benchmarks".to_string(),
                body: "Rewrote my old Node CLI tool in Rust. Startup time improved from ~120ms to ~12ms. Memory dropped by 75%. Sharing some benchmarks and pitfalls.".to_string(),
                created_at: now - Duration::days(2),
                tally: Tally::new(234, 7),
                comments: seeded_comments([
                    ("c1", "bob", "Amazing. Can you share the benchmarking script?", 12, 0, now - Duration::hours(20)),
                    ("c2", "cara", "Did you use `cargo` features for release optimization?", 3, 1, now - Duration::hours(18)),
                ]),
            },
            ExplorePost {
                id: SubjectId::from("p2"),
                author: UserId::from("dave"),
                author_avatar: String::new(),
                title: "Help: Strange memory leak in C++ program with vector reserve".to_string(),
                body: "I reserved a huge vector then filled it. Memory never returned. Am I doing something wrong? Minimal code included.".to_string(),
                created_at: now - Duration::hours(12),
                tally: Tally::new(87, 5),
                comments: seeded_comments([(
                    "c3",
                    "erin",
                    "Are you using global allocators or a third-party profiler?",
                    6,
                    0,
                    now - Duration::hours(10),
                )]),
            },
        ];
        Self {
            posts,
            votes: ExploreVotes::default(),
        }
    }
}

fn seeded_comments<const N: usize>(
    comments: [(&str, &str, &str, u64, u64, DateTime<Utc>); N],
) -> CommentLog {
    let mut log = CommentLog::new();
    for (id, author, text, upvotes, downvotes, created_at) in comments {
        log.append(SubjectId::from(id), UserId::from(author), text, created_at);
        if let Some(comment) = log.get_mut(&SubjectId::from(id)) {
            comment.tally = Tally::new(upvotes, downvotes);
        }
    }
    log
}

/// Link to a single explore post, for sharing.
pub fn post_link(origin: &str, post: &SubjectId) -> String {
    format!("{}/posts/{post}", origin.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder::{AppState as _, data_model::Stamper};

    fn me() -> UserId {
        UserId::from("alex_dev")
    }

    fn ids(board: &ExploreBoard) -> Vec<&str> {
        board.ranked().into_iter().map(|post| post.id.as_str()).collect()
    }

    #[test]
    fn test_board_ranks_by_net_score() {
        let board = ExploreBoard::seed(Utc::now());
        assert_eq!(ids(&board), vec!["p1", "p2"]);
    }

    #[test]
    fn test_downvotes_can_reorder_the_board() {
        let now = Utc::now();
        let mut board = ExploreBoard::seed(now);
        board.posts[0].tally = Tally::new(80, 0);
        board.posts[1].tally = Tally::new(80, 0);
        // equal scores: the newer post wins
        assert_eq!(ids(&board), vec!["p2", "p1"]);

        let mut stamper = Stamper::new();
        let board = board.apply_event(&stamper.stamp(ExploreEvent::VotePost {
            post: SubjectId::from("p2"),
            user: me(),
            direction: VoteDirection::Down,
        }));
        assert_eq!(ids(&board), vec!["p1", "p2"]);
    }

    #[test]
    fn test_comment_votes_use_their_own_ledger() {
        let mut stamper = Stamper::new();
        let vote = stamper.stamp(ExploreEvent::VoteComment {
            post: SubjectId::from("p1"),
            comment: SubjectId::from("c1"),
            user: me(),
            direction: VoteDirection::Up,
        });
        let board = ExploreBoard::seed(Utc::now()).apply_event(&vote);

        let comment = board
            .post(&SubjectId::from("p1"))
            .unwrap()
            .comments
            .get(&SubjectId::from("c1"))
            .unwrap();
        assert_eq!(comment.tally, Tally::new(13, 0));
        assert_eq!(
            board.my_comment_vote(&SubjectId::from("c1"), &me()),
            Some(VoteDirection::Up)
        );
        // the post ledger has no entry for the same user
        assert_eq!(board.my_post_vote(&SubjectId::from("p1"), &me()), None);

        let board = board.apply_event(&vote);
        let comment = board.posts[0].comments.get(&SubjectId::from("c1")).unwrap();
        assert_eq!(comment.tally, Tally::new(12, 0));
    }

    #[test]
    fn test_vote_on_comment_under_wrong_post_is_ignored() {
        let mut stamper = Stamper::new();
        let seed = ExploreBoard::seed(Utc::now());
        let board = seed.clone().apply_event(&stamper.stamp(ExploreEvent::VoteComment {
            post: SubjectId::from("p2"),
            comment: SubjectId::from("c1"),
            user: me(),
            direction: VoteDirection::Up,
        }));
        assert_eq!(board, seed);
    }

    #[test]
    fn test_comment_appends_to_post() {
        let mut stamper = Stamper::new();
        let board = ExploreBoard::seed(Utc::now()).apply_event(&stamper.stamp(
            ExploreEvent::Comment {
                post: SubjectId::from("p2"),
                comment: SubjectId::generate("c"),
                author: me(),
                text: "  Try heaptrack  ".to_string(),
            },
        ));

        let post = board.post(&SubjectId::from("p2")).unwrap();
        assert_eq!(post.comments.len(), 2);
        let added = post.comments.iter().last().unwrap();
        assert_eq!(added.text, "Try heaptrack");
        assert_eq!(added.author_id, me());
    }

    #[test]
    fn test_post_link() {
        assert_eq!(
            post_link("http://localhost:3000/", &SubjectId::from("p1")),
            "http://localhost:3000/posts/p1"
        );
    }
}
