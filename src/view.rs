use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::Event;
use crate::temporal::{Temporal, classify};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Past,
    Upcoming,
}

impl FilterMode {
    pub const MODES: [FilterMode; 3] = [FilterMode::All, FilterMode::Past, FilterMode::Upcoming];

    pub fn label(self) -> &'static str {
        match self {
            FilterMode::All => "All",
            FilterMode::Past => "Past",
            FilterMode::Upcoming => "Upcoming",
        }
    }

    pub fn admits(self, temporal: Temporal) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Past => temporal == Temporal::Past,
            FilterMode::Upcoming => temporal == Temporal::Upcoming,
        }
    }
}

impl Display for FilterMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FilterMode::All => "all",
            FilterMode::Past => "past",
            FilterMode::Upcoming => "upcoming",
        };
        f.write_str(name)
    }
}

/// Events visible under `mode`, in store order. Recomputed on every call so
/// a change of `today` moves events between buckets.
pub fn filter_events(events: &[Event], mode: FilterMode, today: NaiveDate) -> Vec<&Event> {
    events
        .iter()
        .filter(|event| mode.admits(classify(event.start, today)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub past: Rgb,
    pub upcoming: Rgb,
    pub text: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            past: Rgb(222, 105, 135),
            upcoming: Rgb(140, 189, 76),
            text: Rgb(255, 255, 255),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventStyle {
    pub temporal: Temporal,
    pub background: Rgb,
    pub foreground: Rgb,
    pub opacity: f32,
    pub rounded: bool,
}

pub fn style_of(event: &Event, today: NaiveDate, palette: &Palette) -> EventStyle {
    let temporal = classify(event.start, today);
    let background = match temporal {
        Temporal::Past => palette.past,
        Temporal::Upcoming => palette.upcoming,
    };

    EventStyle {
        temporal,
        background,
        foreground: palette.text,
        opacity: 0.8,
        rounded: true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonStyle {
    pub background: Rgb,
    pub foreground: Rgb,
}

/// Styles the button for `mode` while `active` is the selected filter.
pub fn filter_button_style(mode: FilterMode, active: FilterMode) -> ButtonStyle {
    if mode == active {
        ButtonStyle {
            background: Rgb(0, 123, 255),
            foreground: Rgb(255, 255, 255),
        }
    } else {
        ButtonStyle {
            background: Rgb(240, 240, 240),
            foreground: Rgb(0, 0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    use super::{FilterMode, Palette, Rgb, filter_button_style, filter_events, style_of};
    use crate::domain::Event;
    use crate::temporal::Temporal;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid day")
    }

    fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, 0, 0).expect("valid time")
    }

    fn ids<'a>(events: &[&'a Event]) -> Vec<&'a str> {
        events.iter().map(|event| event.id.as_str()).collect()
    }

    #[test]
    fn past_and_upcoming_split_around_today() {
        let today = day(2024, 6, 10);
        let events = vec![
            Event::new("yesterday", "Retro", "", at(day(2024, 6, 9), 0)),
            Event::new("today", "Standup", "", at(day(2024, 6, 10), 0)),
        ];

        assert_eq!(ids(&filter_events(&events, FilterMode::Past, today)), vec!["yesterday"]);
        assert_eq!(ids(&filter_events(&events, FilterMode::Upcoming, today)), vec!["today"]);
        assert_eq!(
            ids(&filter_events(&events, FilterMode::All, today)),
            vec!["yesterday", "today"]
        );
    }

    #[test]
    fn moving_today_reclassifies_events() {
        let events = vec![Event::new("a", "Standup", "", at(day(2024, 6, 10), 9))];

        let before_midnight = filter_events(&events, FilterMode::Upcoming, day(2024, 6, 10));
        let after_midnight = filter_events(&events, FilterMode::Upcoming, day(2024, 6, 11));
        assert_eq!(before_midnight.len(), 1);
        assert!(after_midnight.is_empty());
    }

    #[test]
    fn style_colors_follow_palette() {
        let palette = Palette::default();
        let today = day(2024, 6, 10);
        let past = Event::new("a", "Retro", "", at(day(2024, 6, 9), 0));
        let upcoming = Event::new("b", "Standup", "", at(today, 0));

        let past_style = style_of(&past, today, &palette);
        let upcoming_style = style_of(&upcoming, today, &palette);
        assert_eq!(past_style.temporal, Temporal::Past);
        assert_eq!(past_style.background, palette.past);
        assert_eq!(upcoming_style.temporal, Temporal::Upcoming);
        assert_eq!(upcoming_style.background, palette.upcoming);
        assert_eq!(upcoming_style.foreground, palette.text);
    }

    #[test]
    fn active_filter_button_is_highlighted() {
        let selected = filter_button_style(FilterMode::Past, FilterMode::Past);
        assert_eq!(selected.background, Rgb(0, 123, 255));
        assert_eq!(selected.foreground, Rgb(255, 255, 255));

        for mode in [FilterMode::All, FilterMode::Upcoming] {
            let idle = filter_button_style(mode, FilterMode::Past);
            assert_eq!(idle.background, Rgb(240, 240, 240));
            assert_eq!(idle.foreground, Rgb(0, 0, 0));
        }
    }

    #[test]
    fn modes_parse_from_lowercase_names() {
        #[derive(serde::Deserialize)]
        struct Row {
            mode: FilterMode,
        }

        let row: Row = toml::from_str("mode = \"upcoming\"").expect("known mode");
        assert_eq!(row.mode, FilterMode::Upcoming);
        assert_eq!(FilterMode::Past.to_string(), "past");
    }

    proptest! {
        #[test]
        fn filter_and_style_agree_for_every_date(offset_days in -800i64..800i64, hour in 0u32..24u32) {
            let today = day(2024, 6, 10);
            let palette = Palette::default();
            let event = Event::new("a", "Standup", "", at(today + Duration::days(offset_days), hour));
            let events = vec![event];

            let in_past = filter_events(&events, FilterMode::Past, today).len() == 1;
            let in_upcoming = filter_events(&events, FilterMode::Upcoming, today).len() == 1;
            let style = style_of(&events[0], today, &palette);

            prop_assert!(in_past != in_upcoming);
            prop_assert_eq!(in_past, style.background == palette.past);
            prop_assert_eq!(in_upcoming, style.background == palette.upcoming);
        }

        #[test]
        fn filtered_is_subset_and_all_is_identity(
            offsets in proptest::collection::vec(-60i64..60i64, 0..20),
            mode_index in 0usize..3usize
        ) {
            let today = day(2024, 6, 10);
            let events = offsets
                .iter()
                .enumerate()
                .map(|(index, offset)| {
                    Event::new(format!("e{index}"), "Event", "", at(today + Duration::days(*offset), 12))
                })
                .collect::<Vec<_>>();
            let mode = FilterMode::MODES[mode_index];

            let filtered = filter_events(&events, mode, today);
            for event in &filtered {
                prop_assert!(events.iter().any(|candidate| candidate == *event));
            }

            let all = filter_events(&events, FilterMode::All, today);
            prop_assert_eq!(all.len(), events.len());
            for (left, right) in all.iter().zip(events.iter()) {
                prop_assert_eq!(*left, right);
            }
        }
    }
}
