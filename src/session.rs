use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use log::{debug, info, warn};

use crate::domain::{Event, EventId, EventPatch, EventStore};
use crate::error::TrackerError;
use crate::temporal::same_day;

/// What the calendar surface reports back for a single click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    /// Empty calendar space; the value is the slot start.
    SlotSelected(NaiveDateTime),
    EventSelected(Event),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Create { start: NaiveDateTime },
    Edit { event: Event },
}

/// Decides which flow a gesture opens.
///
/// A slot on a day that already holds an event opens that event instead of
/// a create form, which keeps the calendar at one event per day.
pub fn resolve(gesture: Gesture, events: &[Event]) -> Resolution {
    match gesture {
        Gesture::EventSelected(selected) => {
            let event = events
                .iter()
                .find(|event| event.id == selected.id)
                .cloned()
                .unwrap_or(selected);
            Resolution::Edit { event }
        }
        Gesture::SlotSelected(start) => {
            match events.iter().find(|event| same_day(event.start, start)) {
                Some(existing) => Resolution::Edit {
                    event: existing.clone(),
                },
                None => Resolution::Create { start },
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Title,
    Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub placeholder: &'static str,
    pub default: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Save,
    Edit,
    Delete,
    Cancel,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Save => "Save",
            Action::Edit => "Edit",
            Action::Delete => "Delete",
            Action::Cancel => "Cancel",
        }
    }
}

/// Everything a dialog host needs to render one form. The core never draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSpec {
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
    pub actions: Vec<Action>,
}

impl DialogSpec {
    fn create() -> Self {
        Self {
            title: "Create Event",
            fields: vec![
                FieldSpec {
                    key: FieldKey::Title,
                    placeholder: "Event Title",
                    default: String::new(),
                },
                FieldSpec {
                    key: FieldKey::Location,
                    placeholder: "Event Location",
                    default: String::new(),
                },
            ],
            actions: vec![Action::Save, Action::Cancel],
        }
    }

    fn edit(event: &Event) -> Self {
        Self {
            title: "Event Details",
            fields: vec![
                FieldSpec {
                    key: FieldKey::Title,
                    placeholder: "Event Title",
                    default: event.title.clone(),
                },
                FieldSpec {
                    key: FieldKey::Location,
                    placeholder: "Event Location",
                    default: event.location.clone(),
                },
            ],
            actions: vec![Action::Edit, Action::Delete, Action::Cancel],
        }
    }

    pub fn offers(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }
}

/// Current values of the fields a dialog declared, as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues(BTreeMap<FieldKey, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defaults(dialog: &DialogSpec) -> Self {
        Self(
            dialog
                .fields
                .iter()
                .map(|field| (field.key, field.default.clone()))
                .collect(),
        )
    }

    #[cfg(test)]
    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    /// Missing keys read as empty text.
    pub fn get(&self, key: FieldKey) -> &str {
        self.0.get(&key).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Create { start: NaiveDateTime },
    Edit { id: EventId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Created(EventId),
    Updated(EventId),
    Deleted(EventId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Committed(Change),
    Cancelled,
    /// Validation failed; the form stays open for another try.
    Rejected(TrackerError),
    /// The dialog did not offer this action.
    Ignored,
    /// The edited event is gone; nothing happened.
    Vanished(EventId),
}

impl SubmitOutcome {
    pub fn closes_session(&self) -> bool {
        match self {
            SubmitOutcome::Committed(_) | SubmitOutcome::Cancelled | SubmitOutcome::Vanished(_) => true,
            SubmitOutcome::Rejected(_) | SubmitOutcome::Ignored => false,
        }
    }
}

/// One open create or edit/delete form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    flow: Flow,
    dialog: DialogSpec,
}

impl EditSession {
    pub fn open(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Create { start } => Self {
                flow: Flow::Create { start },
                dialog: DialogSpec::create(),
            },
            Resolution::Edit { event } => Self {
                dialog: DialogSpec::edit(&event),
                flow: Flow::Edit { id: event.id },
            },
        }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn dialog(&self) -> &DialogSpec {
        &self.dialog
    }

    /// Applies `action` with the host's field values. The store is only
    /// touched by a committed outcome.
    pub fn submit(&self, action: Action, values: &FieldValues, store: &mut EventStore) -> SubmitOutcome {
        if !self.dialog.offers(action) {
            debug!("event=session_action_ignored action={}", action.label());
            return SubmitOutcome::Ignored;
        }

        match (action, &self.flow) {
            (Action::Cancel, _) => SubmitOutcome::Cancelled,
            (Action::Save, Flow::Create { start }) => create(*start, values, store),
            (Action::Edit, Flow::Edit { id }) => edit(id, values, store),
            (Action::Delete, Flow::Edit { id }) => delete(id, store),
            _ => SubmitOutcome::Ignored,
        }
    }
}

fn create(start: NaiveDateTime, values: &FieldValues, store: &mut EventStore) -> SubmitOutcome {
    let title = match required_text(values.get(FieldKey::Title)) {
        Ok(title) => title,
        Err(err) => return rejected(err),
    };
    let location = values.get(FieldKey::Location).trim().to_string();

    let id = store.next_id();
    match store.add(Event::new(id.clone(), title, location, start)) {
        Ok(()) => {
            info!("event=event_created id={} day={}", id, start.date());
            SubmitOutcome::Committed(Change::Created(id))
        }
        Err(err) => rejected(err),
    }
}

fn edit(id: &str, values: &FieldValues, store: &mut EventStore) -> SubmitOutcome {
    let title = match required_text(values.get(FieldKey::Title)) {
        Ok(title) => title,
        Err(err) => return rejected(err),
    };
    let patch = EventPatch {
        title,
        location: values.get(FieldKey::Location).trim().to_string(),
    };

    match store.update(id, patch) {
        Ok(()) => {
            info!("event=event_updated id={id}");
            SubmitOutcome::Committed(Change::Updated(id.to_string()))
        }
        Err(TrackerError::NotFound(missing)) => {
            warn!("event=event_update_missing id={missing}");
            SubmitOutcome::Vanished(missing)
        }
        Err(err) => rejected(err),
    }
}

fn delete(id: &str, store: &mut EventStore) -> SubmitOutcome {
    if store.remove(id) {
        info!("event=event_deleted id={id}");
        SubmitOutcome::Committed(Change::Deleted(id.to_string()))
    } else {
        warn!("event=event_delete_missing id={id}");
        SubmitOutcome::Vanished(id.to_string())
    }
}

fn rejected(err: TrackerError) -> SubmitOutcome {
    debug!("event=session_rejected reason=\"{err}\"");
    SubmitOutcome::Rejected(err)
}

fn required_text(input: &str) -> Result<String, TrackerError> {
    let value = input.trim();
    if value.is_empty() {
        Err(TrackerError::EmptyTitle)
    } else {
        Ok(value.to_string())
    }
}
