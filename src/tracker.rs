use chrono::{NaiveDate, NaiveTime};
use log::{debug, info};

use crate::domain::{Event, EventStore};
use crate::session::{Action, EditSession, FieldValues, Gesture, Resolution, SubmitOutcome, resolve};
use crate::view::{EventStyle, FilterMode, Palette, filter_events, style_of};

/// Application state: the event store, the active filter and at most one
/// open edit session.
#[derive(Debug, Clone)]
pub struct Tracker {
    store: EventStore,
    filter: FilterMode,
    session: Option<EditSession>,
    palette: Palette,
    slot_time: NaiveTime,
    filter_changes: u64,
}

impl Tracker {
    pub fn new(filter: FilterMode, palette: Palette, slot_time: NaiveTime) -> Self {
        Self {
            store: EventStore::new(),
            filter,
            session: None,
            palette,
            slot_time,
            filter_changes: 0,
        }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// Changes whenever anything a surface renders may have gone stale.
    pub fn revision(&self) -> u64 {
        self.store.revision() + self.filter_changes
    }

    /// Gesture for a click on an empty day cell. The time-of-day is the
    /// configured slot time, not something the user picks.
    pub fn select_day(&mut self, day: NaiveDate) -> &EditSession {
        let start = day.and_time(self.slot_time);
        self.handle_gesture(Gesture::SlotSelected(start))
    }

    /// Resolves `gesture` and opens its flow, discarding any open session.
    pub fn handle_gesture(&mut self, gesture: Gesture) -> &EditSession {
        if self.session.is_some() {
            debug!("event=session_superseded");
        }

        let resolution = resolve(gesture, self.store.all());
        match &resolution {
            Resolution::Create { start } => debug!("event=gesture_resolved flow=create day={}", start.date()),
            Resolution::Edit { event } => debug!("event=gesture_resolved flow=edit id={}", event.id),
        }
        self.session.insert(EditSession::open(resolution))
    }

    /// Forwards a dialog button press. Returns `None` when no session is open.
    pub fn submit(&mut self, action: Action, values: &FieldValues) -> Option<SubmitOutcome> {
        let session = self.session.as_ref()?;
        let outcome = session.submit(action, values, &mut self.store);
        if outcome.closes_session() {
            self.session = None;
        }
        Some(outcome)
    }

    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            debug!("event=session_cancelled");
        }
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        if self.filter != mode {
            info!("event=filter_changed from={} to={}", self.filter, mode);
            self.filter = mode;
            self.filter_changes += 1;
        }
    }

    pub fn visible_events(&self, today: NaiveDate) -> Vec<&Event> {
        filter_events(self.store.all(), self.filter, today)
    }

    pub fn style_of(&self, event: &Event, today: NaiveDate) -> EventStyle {
        style_of(event, today, &self.palette)
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(FilterMode::All, Palette::default(), NaiveTime::default())
    }
}
