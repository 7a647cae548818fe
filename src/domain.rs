use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::debug;
use rand::{Rng, distributions::Alphanumeric, thread_rng};

use crate::error::TrackerError;

const ID_LEN: usize = 8;
const EVENT_LENGTH_HOURS: i64 = 1;

pub type EventId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub location: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Event {
    /// Builds a single-day event lasting the fixed event length.
    pub fn new(
        id: impl Into<EventId>,
        title: impl Into<String>,
        location: impl Into<String>,
        start: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            location: location.into(),
            start,
            end: start + event_length(),
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.start.date()
    }
}

/// Field values an edit flow may change. `start`/`end` are not part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPatch {
    pub title: String,
    pub location: String,
}

/// In-memory, insertion-ordered event collection.
///
/// The store does not enforce one event per day; that is the job of the
/// interaction resolver, which routes a slot on an occupied day to the
/// existing event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStore {
    events: Vec<Event>,
    issued_ids: HashSet<EventId>,
    revision: u64,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Bumped by every mutation that changed the collection.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    /// Issues an id that has never been handed out or accepted by this store.
    pub fn next_id(&mut self) -> EventId {
        loop {
            let id = generate_id();
            if self.issued_ids.insert(id.clone()) {
                return id;
            }
        }
    }

    pub fn add(&mut self, event: Event) -> Result<(), TrackerError> {
        if event.title.trim().is_empty() {
            return Err(TrackerError::EmptyTitle);
        }
        if self.get(&event.id).is_some() {
            return Err(TrackerError::DuplicateId(event.id));
        }

        debug!("event=store_add id={} day={}", event.id, event.day());
        self.issued_ids.insert(event.id.clone());
        self.events.push(event);
        self.touch();
        Ok(())
    }

    /// Replaces title and location of the event with `id`, keeping its identity
    /// and position.
    pub fn update(&mut self, id: &str, patch: EventPatch) -> Result<(), TrackerError> {
        if patch.title.trim().is_empty() {
            return Err(TrackerError::EmptyTitle);
        }

        let existing = self
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;

        existing.title = patch.title;
        existing.location = patch.location;
        debug!("event=store_update id={id}");
        self.touch();
        Ok(())
    }

    /// Removes the event with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        let removed = self.events.len() != before;
        if removed {
            debug!("event=store_remove id={id}");
            self.touch();
        }
        removed
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

pub fn event_length() -> Duration {
    Duration::hours(EVENT_LENGTH_HOURS)
}

pub fn generate_id() -> EventId {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{Event, EventPatch, EventStore, generate_id};
    use crate::error::TrackerError;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .expect("valid datetime")
    }

    #[test]
    fn new_event_lasts_one_hour() {
        let event = Event::new("a", "Standup", "", at(2024, 6, 1, 9));
        assert_eq!(event.end, at(2024, 6, 1, 10));
    }

    #[test]
    fn add_rejects_blank_title() {
        let mut store = EventStore::new();
        let result = store.add(Event::new("a", "   ", "", at(2024, 6, 1, 0)));
        assert_eq!(result, Err(TrackerError::EmptyTitle));
        assert!(store.is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn add_keeps_insertion_order() {
        let mut store = EventStore::new();
        store
            .add(Event::new("b", "Second day", "", at(2024, 6, 2, 0)))
            .expect("add should work");
        store
            .add(Event::new("a", "First day", "", at(2024, 6, 1, 0)))
            .expect("add should work");

        let ids = store.all().iter().map(|event| event.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let mut store = EventStore::new();
        store
            .add(Event::new("a", "Standup", "", at(2024, 6, 1, 0)))
            .expect("add should work");
        let result = store.add(Event::new("a", "Retro", "", at(2024, 6, 2, 0)));
        assert_eq!(result, Err(TrackerError::DuplicateId("a".to_string())));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn store_allows_two_events_on_one_day() {
        let mut store = EventStore::new();
        store
            .add(Event::new("a", "Standup", "", at(2024, 6, 1, 9)))
            .expect("add should work");
        store
            .add(Event::new("b", "Lunch", "", at(2024, 6, 1, 12)))
            .expect("store does not enforce one event per day");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_preserves_identity_and_times() {
        let mut store = EventStore::new();
        store
            .add(Event::new("a", "Standup", "Room 1", at(2024, 6, 1, 9)))
            .expect("add should work");

        store
            .update(
                "a",
                EventPatch {
                    title: "Planning".to_string(),
                    location: "Room 2".to_string(),
                },
            )
            .expect("update should work");

        let event = store.get("a").expect("event should remain");
        assert_eq!(event.title, "Planning");
        assert_eq!(event.location, "Room 2");
        assert_eq!(event.start, at(2024, 6, 1, 9));
        assert_eq!(event.end, at(2024, 6, 1, 10));
    }

    #[test]
    fn update_missing_id_is_not_found() {
        let mut store = EventStore::new();
        let result = store.update(
            "missing",
            EventPatch {
                title: "Planning".to_string(),
                location: String::new(),
            },
        );
        assert_eq!(result, Err(TrackerError::NotFound("missing".to_string())));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn remove_absent_id_is_noop() {
        let mut store = EventStore::new();
        store
            .add(Event::new("a", "Standup", "", at(2024, 6, 1, 0)))
            .expect("add should work");
        let revision = store.revision();

        assert!(!store.remove("missing"));
        assert_eq!(store.revision(), revision);
        assert!(store.remove("a"));
        assert!(store.is_empty());
        assert_eq!(store.revision(), revision + 1);
    }

    #[test]
    fn ids_are_never_reissued() {
        let mut store = EventStore::new();
        let first = store.next_id();
        store
            .add(Event::new(first.clone(), "Standup", "", at(2024, 6, 1, 0)))
            .expect("add should work");
        store.remove(&first);

        for _ in 0..200 {
            assert_ne!(store.next_id(), first);
        }
    }

    #[test]
    fn generated_ids_are_alphanumeric() {
        let id = generate_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|ch| ch.is_ascii_alphanumeric()));
    }
}
