//! Date-keyed event cache driving calendar decoration.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use pap_shared::codec::DayEvents;
use pap_shared::types::EventLabel;

/// Event labels per calendar day.
///
/// A date is present only while it has at least one label. Labels are
/// unique within a date since they are the only identity an event has.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    days: BTreeMap<NaiveDate, Vec<EventLabel>>,
}

impl EventIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole content with a bulk load.
    pub fn load(&mut self, days: Vec<DayEvents>) {
        self.days.clear();
        for day in days {
            for label in day.labels {
                self.insert(day.date, label);
            }
        }
        debug!(days = self.days.len(), events = self.len(), "Events loaded");
    }

    /// Append `label` to `date`. Returns `false` if the date already has a
    /// label with that text.
    pub fn insert(&mut self, date: NaiveDate, label: EventLabel) -> bool {
        let labels = self.days.entry(date).or_default();
        if labels.contains(&label) {
            return false;
        }
        labels.push(label);
        true
    }

    /// Remove the first exact match. Removing an absent label is a no-op
    /// that returns `false`.
    pub fn remove(&mut self, date: NaiveDate, label: &EventLabel) -> bool {
        let Some(labels) = self.days.get_mut(&date) else {
            return false;
        };
        let Some(pos) = labels.iter().position(|l| l == label) else {
            return false;
        };
        labels.remove(pos);
        if labels.is_empty() {
            self.days.remove(&date);
        }
        true
    }

    /// `remove(old)` followed by `insert(new)`; the new label takes the
    /// last position of the day. Does nothing if `old` is absent.
    pub fn rename(&mut self, date: NaiveDate, old: &EventLabel, new: EventLabel) -> bool {
        if !self.remove(date, old) {
            return false;
        }
        self.insert(date, new);
        true
    }

    /// Labels of `date`; empty if the day has no events.
    pub fn list_for(&self, date: NaiveDate) -> &[EventLabel] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, date: NaiveDate, label: &EventLabel) -> bool {
        self.list_for(date).contains(label)
    }

    pub fn has_events(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Days with at least one event, in calendar order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    /// Total number of events across all days.
    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }
}
