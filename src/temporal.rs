use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Temporal {
    Past,
    Upcoming,
}

/// Classifies `at` against `today` by calendar day only. Today itself is
/// upcoming.
pub fn classify(at: NaiveDateTime, today: NaiveDate) -> Temporal {
    if at.date() < today {
        Temporal::Past
    } else {
        Temporal::Upcoming
    }
}

pub fn same_day(left: NaiveDateTime, right: NaiveDateTime) -> bool {
    left.date() == right.date()
}
