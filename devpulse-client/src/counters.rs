use std::collections::BTreeSet;

use devpulse_types::UserId;
use serde::{Deserialize, Serialize};

use crate::ledger::{VoteDirection, VoteTransition};

/// Up/down vote counts for one subject. Never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
}

impl Tally {
    pub fn new(upvotes: u64, downvotes: u64) -> Self {
        Self { upvotes, downvotes }
    }

    pub fn net(&self) -> i64 {
        self.upvotes as i64 - self.downvotes as i64
    }

    pub fn count(&self, direction: VoteDirection) -> u64 {
        match direction {
            VoteDirection::Up => self.upvotes,
            VoteDirection::Down => self.downvotes,
        }
    }

    pub fn apply(&mut self, transition: VoteTransition) {
        if let Some(before) = transition.before {
            let counter = self.counter_mut(before);
            *counter = counter.saturating_sub(1);
        }
        if let Some(after) = transition.after {
            *self.counter_mut(after) += 1;
        }
    }

    fn counter_mut(&mut self, direction: VoteDirection) -> &mut u64 {
        match direction {
            VoteDirection::Up => &mut self.upvotes,
            VoteDirection::Down => &mut self.downvotes,
        }
    }
}

/// Users who currently have a reaction toggled on. The count is the set's size.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Membership(BTreeSet<UserId>);

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the user if absent, remove them if present. Returns whether they are now a member.
    pub fn toggle(&mut self, user: &UserId) -> bool {
        if self.0.remove(user) {
            false
        } else {
            self.0.insert(user.clone());
            true
        }
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.0.contains(user)
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }
}

impl<'a> FromIterator<&'a str> for Membership {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(UserId::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_floors_at_zero() {
        let mut tally = Tally::new(0, 0);
        tally.apply(VoteTransition {
            before: Some(VoteDirection::Down),
            after: Some(VoteDirection::Up),
        });
        assert_eq!(tally, Tally::new(1, 0));
        assert_eq!(tally.net(), 1);
    }

    #[test]
    fn test_toggle_twice_restores_count() {
        let mut stars: Membership = ["u_sarah"].into_iter().collect();
        let me = UserId::from("me_demo");

        assert!(stars.toggle(&me));
        assert_eq!(stars.count(), 2);
        assert!(!stars.toggle(&me));
        assert_eq!(stars.count(), 1);
        assert!(stars.contains(&UserId::from("u_sarah")));
        assert!(!stars.contains(&me));
    }

    #[test]
    fn test_membership_is_a_json_array() {
        let hearts: Membership = ["u_b", "u_a"].into_iter().collect();
        assert_eq!(
            serde_json::to_value(&hearts).unwrap(),
            serde_json::json!(["u_a", "u_b"])
        );
    }
}
