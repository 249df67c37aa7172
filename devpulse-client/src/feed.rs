//! The community feed: posts with votes, stars and a discussion thread.

use chrono::{DateTime, Duration, Utc};
use devpulse_types::UserId;
use larder::{PartialAppState, data_model::Timestamped};
use serde::{Deserialize, Serialize};

use crate::{
    comments::CommentLog,
    counters::{Membership, Tally},
    ledger::{SubjectId, VoteDirection, VoteLedger},
    rank::{Rankable, SortMode, rank},
};

pub const FEED_KEY: &str = "devpulse_feed_v4";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: SubjectId,
    pub author_id: UserId,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub tally: Tally,
    #[serde(default)]
    pub comments: CommentLog,
    #[serde(default)]
    pub stars: Membership,
}

impl Rankable for Post {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn score(&self) -> i64 {
        self.tally.net()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub posts: Vec<Post>,
    #[serde(default)]
    pub votes: VoteLedger,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedEvent {
    Vote {
        post: SubjectId,
        user: UserId,
        direction: VoteDirection,
    },
    ToggleStar {
        post: SubjectId,
        user: UserId,
    },
    Comment {
        post: SubjectId,
        comment: SubjectId,
        author: UserId,
        text: String,
    },
}

impl PartialAppState for Feed {
    type Event = FeedEvent;
    type Partial = Self;

    fn process_event(mut feed: Self, event: &Timestamped<FeedEvent>) -> Self {
        let Feed { posts, votes } = &mut feed;
        match &event.event {
            FeedEvent::Vote {
                post,
                user,
                direction,
            } => match posts.iter_mut().find(|p| &p.id == post) {
                Some(target) => {
                    votes.apply(post, user, *direction, &mut target.tally);
                }
                None => log::warn!("Vote on unknown post {post}"),
            },
            FeedEvent::ToggleStar { post, user } => match posts.iter_mut().find(|p| &p.id == post) {
                Some(target) => {
                    target.stars.toggle(user);
                }
                None => log::warn!("Star on unknown post {post}"),
            },
            FeedEvent::Comment {
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
                None => log::warn!("Comment on unknown post {post}"),
            },
        }
        feed
    }

    fn finalize(feed: Self) -> Self {
        feed
    }
}

impl Feed {
    pub fn post(&self, id: &SubjectId) -> Option<&Post> {
        self.posts.iter().find(|post| &post.id == id)
    }

    pub fn ranked(&self, mode: SortMode) -> Vec<&Post> {
        rank(&self.posts, mode)
    }

    pub fn my_vote(&self, post: &SubjectId, user: &UserId) -> Option<VoteDirection> {
        self.votes.vote_of(post, user)
    }

    pub fn has_starred(&self, post: &SubjectId, user: &UserId) -> bool {
        self.post(post).is_some_and(|post| post.stars.contains(user))
    }

    /// The demo posts a fresh install starts with.
    pub fn seed(now: DateTime<Utc>) -> Self {
        let mut first = Post {
            id: SubjectId::from("p1"),
            author_id: UserId::from("u_alex"),
            title: "Vibrant Light Mode is officially live! 🚀".to_string(),
            body: "I finally finished the CSS variable migration for DevPulse. The new slate-blue tint in light mode feels so much more premium than pure white.".to_string(),
            image: Some("https://images.unsplash.com/photo-1618477388954-7852f32655ec?auto=format&fit=crop&q=80&w=1000".to_string()),
            tags: vec!["ui-design".to_string(), "frontend".to_string()],
            created_at: now - Duration::minutes(30),
            tally: Tally::new(84, 2),
            comments: CommentLog::new(),
            stars: ["u_sarah"].into_iter().collect(),
        };
        first.comments.append(
            SubjectId::from("c1"),
            UserId::from("u_sarah"),
            "The transitions are super smooth!",
            now - Duration::minutes(10),
        );

        let posts = vec![
            first,
            Post {
                id: SubjectId::from("p2"),
                author_id: UserId::from("u_jordan"),
                title: "Automata Theory: NFA to Epsilon-NFA".to_string(),
                body: "Working on a visualizer for state machines. Mapping out the recursive epsilon closures was a nightmare, but seeing the transitions animate in real-time is worth it.".to_string(),
                image: Some("https://images.unsplash.com/photo-1509228468518-180dd4864904?auto=format&fit=crop&q=80&w=1000".to_string()),
                tags: vec!["java".to_string(), "cs-theory".to_string()],
                created_at: now - Duration::hours(4),
                tally: Tally::new(126, 0),
                comments: CommentLog::new(),
                stars: Membership::new(),
            },
            Post {
                id: SubjectId::from("p3"),
                author_id: UserId::from("u_moto"),
                title: "Meteor 350 Aurora Green - Clean Look".to_string(),
                body: "Added the custom leg guard today. The way the light hits this green is insane. Shot some 4K wallpapers for the community.".to_string(),
                image: Some("https://images.unsplash.com/photo-1558981403-c5f9899a28bc?auto=format&fit=crop&q=80&w=1000".to_string()),
                tags: vec!["design".to_string(), "moto".to_string()],
                created_at: now - Duration::hours(24),
                tally: Tally::new(45, 1),
                comments: CommentLog::new(),
                stars: Membership::new(),
            },
        ];

        let mut votes = VoteLedger::new();
        votes.insert(SubjectId::from("p1"), UserId::from("u_sarah"), VoteDirection::Up);
        Self { posts, votes }
    }
}

/// Display details for a post or comment author.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    pub id: &'static str,
    pub username: &'static str,
    pub display_name: &'static str,
    pub avatar: &'static str,
}

static DEMO_AUTHORS: [Author; 4] = [
    Author {
        id: "u_alex",
        username: "alex_dev",
        display_name: "Alex Rivera",
        avatar: "https://picsum.photos/id/1005/200/200",
    },
    Author {
        id: "u_sarah",
        username: "sarah_codes",
        display_name: "Sarah Chen",
        avatar: "https://picsum.photos/id/1011/200/200",
    },
    Author {
        id: "u_jordan",
        username: "jordan_stack",
        display_name: "Jordan Smith",
        avatar: "https://picsum.photos/id/1027/200/200",
    },
    Author {
        id: "u_moto",
        username: "aurora_rider",
        display_name: "Mike Wheeler",
        avatar: "https://picsum.photos/id/1074/200/200",
    },
];

static UNKNOWN_AUTHOR: Author = Author {
    id: "",
    username: "",
    display_name: "Developer",
    avatar: "https://picsum.photos/seed/dev/80/80",
};

/// Look up who wrote something, falling back to a generic developer card.
pub fn author(id: &UserId) -> &'static Author {
    DEMO_AUTHORS
        .iter()
        .find(|author| author.id == id.as_str())
        .unwrap_or(&UNKNOWN_AUTHOR)
}
