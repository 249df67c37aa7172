//! Who voted which way on what.
//!
//! The ledger is the source of truth for a user's current vote. Aggregate
//! tallies only ever move through a [`VoteTransition`] computed here, so the
//! two cannot drift apart.

use std::collections::BTreeMap;

use devpulse_types::UserId;
use serde::{Deserialize, Serialize};

use crate::counters::Tally;

/// Identifies anything that can be voted on: a post, a comment, a media item.
#[derive(Clone, Debug, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh id with the given prefix, e.g. `c1f0e...` for comments.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{prefix}{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn opposite(self) -> Self {
        match self {
            VoteDirection::Up => VoteDirection::Down,
            VoteDirection::Down => VoteDirection::Up,
        }
    }

    fn weight(vote: Option<Self>) -> i64 {
        match vote {
            Some(VoteDirection::Up) => 1,
            Some(VoteDirection::Down) => -1,
            None => 0,
        }
    }
}

/// The before/after of one vote action for one user on one subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteTransition {
    pub before: Option<VoteDirection>,
    pub after: Option<VoteDirection>,
}

impl VoteTransition {
    /// Voting the way you already voted retracts it, anything else replaces it.
    pub fn resolve(before: Option<VoteDirection>, direction: VoteDirection) -> Self {
        let after = if before == Some(direction) {
            None
        } else {
            Some(direction)
        };
        Self { before, after }
    }

    /// Change in `upvotes - downvotes` this transition causes.
    pub fn net_delta(&self) -> i64 {
        VoteDirection::weight(self.after) - VoteDirection::weight(self.before)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteLedger {
    votes: BTreeMap<SubjectId, BTreeMap<UserId, VoteDirection>>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vote_of(&self, subject: &SubjectId, user: &UserId) -> Option<VoteDirection> {
        self.votes.get(subject)?.get(user).copied()
    }

    /// What voting `direction` would do, without doing it.
    pub fn transition(
        &self,
        subject: &SubjectId,
        user: &UserId,
        direction: VoteDirection,
    ) -> VoteTransition {
        VoteTransition::resolve(self.vote_of(subject, user), direction)
    }

    /// Record the vote and move `tally` by the same transition.
    pub fn apply(
        &mut self,
        subject: &SubjectId,
        user: &UserId,
        direction: VoteDirection,
        tally: &mut Tally,
    ) -> VoteTransition {
        let transition = self.transition(subject, user, direction);
        self.record(subject, user, transition.after);
        tally.apply(transition);
        transition
    }

    /// Seed a vote directly, bypassing the toggle rule. Tallies are not touched.
    pub fn insert(&mut self, subject: SubjectId, user: UserId, direction: VoteDirection) {
        self.votes.entry(subject).or_default().insert(user, direction);
    }

    /// Number of users currently recorded as voting `direction` on `subject`.
    pub fn count(&self, subject: &SubjectId, direction: VoteDirection) -> u64 {
        self.votes.get(subject).map_or(0, |voters| {
            voters.values().filter(|vote| **vote == direction).count() as u64
        })
    }

    fn record(&mut self, subject: &SubjectId, user: &UserId, vote: Option<VoteDirection>) {
        match vote {
            Some(direction) => {
                self.votes
                    .entry(subject.clone())
                    .or_default()
                    .insert(user.clone(), direction);
            }
            None => {
                if let Some(voters) = self.votes.get_mut(subject) {
                    voters.remove(user);
                    if voters.is_empty() {
                        self.votes.remove(subject);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VoteDirection::{Down, Up};

    fn post() -> SubjectId {
        SubjectId::from("p1")
    }

    fn cast(ledger: &mut VoteLedger, tally: &mut Tally, user: &str, direction: VoteDirection) {
        ledger.apply(&post(), &UserId::from(user), direction, tally);
    }

    #[test]
    fn test_toggle_rule() {
        assert_eq!(VoteTransition::resolve(None, Up).after, Some(Up));
        assert_eq!(VoteTransition::resolve(Some(Up), Up).after, None);
        assert_eq!(VoteTransition::resolve(Some(Up), Down).after, Some(Down));
        assert_eq!(VoteTransition::resolve(Some(Down), Up).net_delta(), 2);
        assert_eq!(VoteTransition::resolve(Some(Down), Down).net_delta(), 1);
    }

    #[test]
    fn test_single_user_net_stays_within_one() {
        let sequences: [&[VoteDirection]; 5] = [
            &[Up],
            &[Up, Up],
            &[Up, Down, Down],
            &[Down, Up, Up, Down],
            &[Down, Down, Down, Up, Up],
        ];
        for sequence in sequences {
            let mut ledger = VoteLedger::new();
            let mut tally = Tally::default();
            for direction in sequence {
                cast(&mut ledger, &mut tally, "me_demo", *direction);
            }
            assert!((-1..=1).contains(&tally.net()), "sequence {sequence:?}");
        }
    }

    #[test]
    fn test_same_vote_twice_cancels() {
        for direction in [Up, Down] {
            let mut ledger = VoteLedger::new();
            let mut tally = Tally::default();
            cast(&mut ledger, &mut tally, "me_demo", direction);
            cast(&mut ledger, &mut tally, "me_demo", direction);

            assert_eq!(tally, Tally::default());
            assert_eq!(ledger.vote_of(&post(), &UserId::from("me_demo")), None);
            assert_eq!(ledger, VoteLedger::new());
        }
    }

    #[test]
    fn test_switching_moves_the_vote() {
        let mut ledger = VoteLedger::new();
        let mut tally = Tally::default();
        cast(&mut ledger, &mut tally, "me_demo", Up);
        cast(&mut ledger, &mut tally, "me_demo", Down);

        assert_eq!(tally, Tally::new(0, 1));
        assert_eq!(ledger.vote_of(&post(), &UserId::from("me_demo")), Some(Down));
    }

    #[test]
    fn test_tally_matches_ledger_from_zero() {
        let mut ledger = VoteLedger::new();
        let mut tally = Tally::default();
        let actions = [
            ("a", Up),
            ("b", Down),
            ("c", Up),
            ("a", Down),
            ("b", Down),
            ("c", Up),
            ("d", Up),
            ("a", Up),
        ];
        for (user, direction) in actions {
            cast(&mut ledger, &mut tally, user, direction);
            assert_eq!(tally.upvotes, ledger.count(&post(), Up));
            assert_eq!(tally.downvotes, ledger.count(&post(), Down));
        }
        assert_eq!(tally, Tally::new(2, 0));
    }

    #[test]
    fn test_retracting_never_underflows_seed_tally() {
        let mut ledger = VoteLedger::new();
        ledger.insert(post(), UserId::from("u_sarah"), Up);
        let mut tally = Tally::default();

        cast(&mut ledger, &mut tally, "u_sarah", Up);
        assert_eq!(tally, Tally::default());
    }

    #[test]
    fn test_ledger_json_is_keyed_by_subject_then_user() {
        let mut ledger = VoteLedger::new();
        ledger.insert(post(), UserId::from("u_sarah"), Up);

        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json, serde_json::json!({ "p1": { "u_sarah": "up" } }));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = SubjectId::generate("c");
        let b = SubjectId::generate("c");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with('c'));
    }
}
