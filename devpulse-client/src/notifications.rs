use chrono::{DateTime, Duration, Utc};
use devpulse_types::notification::{Notification, NotificationKind};
use larder::{PartialAppState, data_model::Timestamped};
use serde::{Deserialize, Serialize};

pub const NOTIFICATIONS_KEY: &str = "devpulse_notifications_v1";

/// How many notifications the navigation dropdown shows.
pub const PREVIEW_LEN: usize = 2;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inbox {
    pub notifications: Vec<Notification>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InboxEvent {
    MarkRead { id: String },
    MarkAllRead,
    /// Notifications fetched from the server.
    Merge { incoming: Vec<Notification> },
}

impl PartialAppState for Inbox {
    type Event = InboxEvent;
    type Partial = Self;

    fn process_event(mut inbox: Self, event: &Timestamped<InboxEvent>) -> Self {
        match &event.event {
            InboxEvent::MarkRead { id } => {
                match inbox.notifications.iter_mut().find(|n| &n.id == id) {
                    Some(notification) => notification.read = true,
                    None => log::warn!("Cannot mark unknown notification {id} as read"),
                }
            }
            InboxEvent::MarkAllRead => {
                for notification in &mut inbox.notifications {
                    notification.read = true;
                }
            }
            InboxEvent::Merge { incoming } => {
                for fetched in incoming {
                    match inbox.notifications.iter_mut().find(|n| n.id == fetched.id) {
                        Some(existing) => {
                            let read = existing.read || fetched.read;
                            *existing = fetched.clone();
                            existing.read = read;
                        }
                        None => inbox.notifications.push(fetched.clone()),
                    }
                }
            }
        }
        inbox
    }

    fn finalize(inbox: Self) -> Self {
        inbox
    }
}

impl Inbox {
    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Unread before read, newest first within each group.
    pub fn sorted(&self) -> Vec<&Notification> {
        let mut sorted: Vec<&Notification> = self.notifications.iter().collect();
        sorted.sort_by(|a, b| {
            a.read
                .cmp(&b.read)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        sorted
    }

    pub fn preview(&self) -> Vec<&Notification> {
        let mut sorted = self.sorted();
        sorted.truncate(PREVIEW_LEN);
        sorted
    }

    pub fn seed(now: DateTime<Utc>) -> Self {
        let notification = |id: &str,
                            kind: NotificationKind,
                            user: &str,
                            message: &str,
                            post_title: Option<&str>,
                            age: Duration,
                            read: bool| Notification {
            id: id.to_string(),
            kind,
            user: user.to_string(),
            message: message.to_string(),
            post_title: post_title.map(str::to_string),
            created_at: now - age,
            read,
        };
        Self {
            notifications: vec![
                notification(
                    "n1",
                    NotificationKind::Comment,
                    "alice",
                    "commented on your post",
                    Some("Rust CLI benchmarks"),
                    Duration::minutes(5),
                    false,
                ),
                notification(
                    "n2",
                    NotificationKind::Upvote,
                    "bob",
                    "upvoted your post",
                    Some("C++ memory leak issue"),
                    Duration::minutes(30),
                    false,
                ),
                notification(
                    "n3",
                    NotificationKind::Downvote,
                    "cara",
                    "downvoted your comment",
                    Some("CLI tool thread"),
                    Duration::hours(2),
                    true,
                ),
                notification(
                    "n4",
                    NotificationKind::Follow,
                    "dave",
                    "started following you",
                    None,
                    Duration::hours(5),
                    false,
                ),
                notification(
                    "n5",
                    NotificationKind::Star,
                    "erin",
                    "starred your project",
                    Some("DevPulse Frontend"),
                    Duration::hours(12),
                    true,
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder::{AppState as _, data_model::Stamper};

    fn ids(notifications: Vec<&Notification>) -> Vec<&str> {
        notifications.into_iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_puts_unread_first() {
        let inbox = Inbox::seed(Utc::now());
        assert_eq!(ids(inbox.sorted()), vec!["n1", "n2", "n4", "n3", "n5"]);
        assert_eq!(ids(inbox.preview()), vec!["n1", "n2"]);
        assert_eq!(inbox.unread_count(), 3);
    }

    #[test]
    fn test_mark_read_and_mark_all_read() {
        let mut stamper = Stamper::new();
        let inbox = Inbox::seed(Utc::now()).apply_event(&stamper.stamp(InboxEvent::MarkRead {
            id: "n2".to_string(),
        }));
        assert!(inbox.get("n2").unwrap().read);
        assert_eq!(inbox.unread_count(), 2);
        assert_eq!(ids(inbox.sorted()), vec!["n1", "n4", "n2", "n3", "n5"]);

        let inbox = inbox.apply_event(&stamper.stamp(InboxEvent::MarkAllRead));
        assert_eq!(inbox.unread_count(), 0);
    }

    #[test]
    fn test_marking_unknown_id_changes_nothing() {
        let mut stamper = Stamper::new();
        let seed = Inbox::seed(Utc::now());
        let inbox = seed.clone().apply_event(&stamper.stamp(InboxEvent::MarkRead {
            id: "n42".to_string(),
        }));
        assert_eq!(inbox, seed);
    }

    #[test]
    fn test_merge_keeps_local_reads_and_adds_new() {
        let now = Utc::now();
        let mut stamper = Stamper::new();
        let inbox = Inbox::seed(now).apply_event(&stamper.stamp(InboxEvent::MarkRead {
            id: "n1".to_string(),
        }));

        let mut refreshed = Inbox::seed(now).notifications[0].clone();
        refreshed.message = "replied to your post".to_string();
        let mut fresh = refreshed.clone();
        fresh.id = "n6".to_string();
        fresh.created_at = now;

        let inbox = inbox.apply_event(&stamper.stamp(InboxEvent::Merge {
            incoming: vec![refreshed, fresh],
        }));

        let n1 = inbox.get("n1").unwrap();
        assert!(n1.read);
        assert_eq!(n1.message, "replied to your post");
        assert_eq!(inbox.notifications.len(), 6);
        assert_eq!(inbox.sorted()[0].id, "n6");
    }
}
