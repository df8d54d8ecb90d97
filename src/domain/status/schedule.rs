//! Change-tracked property values
//!
//! A schedule keeps the current value plus a bounded, newest-first history
//! of earlier values with the time they became effective.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_SIZE: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamped<T> {
    pub value: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> Timestamped<T> {
    pub fn new(value: T, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSchedule<T> {
    entries: VecDeque<Timestamped<T>>,
    max_size: usize,
}

impl<T: Clone + PartialEq> StatusSchedule<T> {
    pub fn new(initial: T, max_size: usize) -> Self {
        Self::starting_at(initial, Utc::now(), max_size)
    }

    pub fn starting_at(initial: T, timestamp: DateTime<Utc>, max_size: usize) -> Self {
        let mut entries = VecDeque::with_capacity(max_size.max(1));
        entries.push_front(Timestamped::new(initial, timestamp));
        Self {
            entries,
            max_size: max_size.max(1),
        }
    }

    pub fn current(&self) -> &Timestamped<T> {
        // Never empty: constructors insert one entry and truncation keeps >= 1
        &self.entries[0]
    }

    pub fn value(&self) -> &T {
        &self.current().value
    }

    /// Record `value` as effective from `timestamp`.
    ///
    /// Returns the replaced current entry when the current value changed.
    /// Repeating the current value is a no-op. A timestamp older than the
    /// current entry is filed into the history without touching the
    /// current value.
    pub fn set(&mut self, value: T, timestamp: DateTime<Utc>) -> Option<Timestamped<T>> {
        let current = self.current();
        if timestamp < current.timestamp {
            let position = self
                .entries
                .iter()
                .position(|entry| entry.timestamp <= timestamp)
                .unwrap_or(self.entries.len());
            self.entries.insert(position, Timestamped::new(value, timestamp));
            self.entries.truncate(self.max_size);
            return None;
        }
        if current.value == value {
            return None;
        }

        let previous = current.clone();
        self.entries.push_front(Timestamped::new(value, timestamp));
        self.entries.truncate(self.max_size);
        Some(previous)
    }

    pub fn set_now(&mut self, value: T) -> Option<Timestamped<T>> {
        self.set(value, Utc::now())
    }

    /// Newest first, current value included
    pub fn history(&self) -> impl Iterator<Item = &Timestamped<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn set_returns_previous_on_change() {
        let t0 = Utc::now();
        let mut schedule = StatusSchedule::starting_at("a", t0, 5);
        let previous = schedule.set("b", t0 + Duration::seconds(1)).unwrap();
        assert_eq!(previous.value, "a");
        assert_eq!(*schedule.value(), "b");
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn repeating_current_value_is_ignored() {
        let t0 = Utc::now();
        let mut schedule = StatusSchedule::starting_at(1, t0, 5);
        assert!(schedule.set(1, t0 + Duration::seconds(5)).is_none());
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.current().timestamp, t0);
    }

    #[test]
    fn history_is_bounded_and_newest_first() {
        let t0 = Utc::now();
        let mut schedule = StatusSchedule::starting_at(0, t0, 3);
        for i in 1..=5 {
            schedule.set(i, t0 + Duration::seconds(i64::from(i)));
        }
        let values: Vec<i32> = schedule.history().map(|e| e.value).collect();
        assert_eq!(values, vec![5, 4, 3]);
        assert_eq!(schedule.max_size(), 3);
    }

    #[test]
    fn late_updates_go_to_history_only() {
        let t0 = Utc::now();
        let mut schedule = StatusSchedule::starting_at("new", t0, 5);
        assert!(schedule.set("old", t0 - Duration::minutes(1)).is_none());
        assert_eq!(*schedule.value(), "new");
        let values: Vec<&str> = schedule.history().map(|e| e.value).collect();
        assert_eq!(values, vec!["new", "old"]);
    }

    #[test]
    fn zero_size_keeps_current_value() {
        let mut schedule = StatusSchedule::new('x', 0);
        schedule.set_now('y');
        assert_eq!(schedule.len(), 1);
        assert_eq!(*schedule.value(), 'y');
    }
}
