//! # Timestamped events
//! Every user action becomes an event stamped with the wall-clock time it happened and its position
//! among the events this session has produced. The position breaks ties between events that land on
//! the same millisecond, so replaying a list of stamped events always yields the same order.

use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Timestamped<Event> {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub sequence: usize,
    pub event: Event,
}

/// Hands out stamps for one session.
#[derive(Clone, Debug, Default)]
pub struct Stamper {
    next_sequence: usize,
}

impl Stamper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stamp<Event>(&mut self, event: Event) -> Timestamped<Event> {
        self.stamp_at(event, Utc::now())
    }

    pub fn stamp_at<Event>(&mut self, event: Event, timestamp: DateTime<Utc>) -> Timestamped<Event> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Timestamped {
            timestamp,
            sequence,
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_breaks_timestamp_ties() {
        let mut stamper = Stamper::new();
        let at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        let first = stamper.stamp_at("first", at);
        let second = stamper.stamp_at("second", at);

        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert!(first < second);
    }

    #[test]
    fn test_timestamp_serializes_as_millis() {
        let mut stamper = Stamper::new();
        let at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap();
        let stamped = stamper.stamp_at(7u32, at);

        let json = serde_json::to_value(&stamped).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_123i64);
        assert_eq!(json["event"], 7);
    }
}
