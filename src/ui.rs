use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, Local, NaiveDate};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};

use crate::domain::Event;
use crate::logging::logging_status;
use crate::session::{Action, Change, DialogSpec, FieldValues, Flow, Gesture, SubmitOutcome};
use crate::tracker::Tracker;
use crate::view::{filter_button_style, EventStyle, FilterMode, Rgb};

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const GRID_WEEKS: usize = 6;
const CURSOR_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_BORDER_COLOR: Color = Color::DarkGray;
const BACKDROP: Rgb = Rgb(42, 45, 52);

pub fn run_dashboard(tracker: &mut Tracker) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, tracker);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	tracker: &mut Tracker,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(Local::now().date_naive());
	let mut drawn: Option<(u64, NaiveDate)> = None;
	let mut dirty = true;

	loop {
		// Re-read every frame so a session left open past midnight reclassifies.
		let today = Local::now().date_naive();
		let view = build_view(&app, tracker, today);
		let stamp = (tracker.revision(), today);
		if dirty || drawn != Some(stamp) {
			terminal.draw(|frame| draw_dashboard(frame, &app, &view))?;
			drawn = Some(stamp);
			dirty = false;
		}

		if event::poll(StdDuration::from_millis(250))? {
			match event::read()? {
				CEvent::Key(key) => {
					if key.kind != KeyEventKind::Press {
						continue;
					}

					let should_quit = if tracker.session().is_some() {
						handle_dialog_key(&mut app, key.code, tracker)
					} else {
						handle_normal_key(&mut app, key.code, tracker, &view)
					};
					dirty = true;

					if should_quit {
						break;
					}
				}
				CEvent::Resize(_, _) => dirty = true,
				_ => {}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(3), Constraint::Min(14), Constraint::Length(4)])
		.split(frame.area());

	render_header(frame, layout[0], view);
	render_calendar(frame, layout[1], app, view);
	render_footer(frame, layout[2], app, view);

	if view.dialog_open {
		if let Some(dialog) = &app.dialog {
			render_dialog(frame, dialog);
		}
	}
}

fn render_header(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let mut spans = vec![Span::styled(
		"Event Tracker  ",
		Style::default().add_modifier(Modifier::BOLD),
	)];
	for (index, mode) in FilterMode::MODES.iter().enumerate() {
		let button = filter_button_style(*mode, view.filter);
		spans.push(Span::styled(
			format!(" {} {} ", filter_key(*mode), mode.label()),
			Style::default()
				.bg(color(button.background))
				.fg(color(button.foreground)),
		));
		if index + 1 < FilterMode::MODES.len() {
			spans.push(Span::raw(" "));
		}
	}
	if view.store_empty {
		spans.push(Span::raw("   no events yet, press Enter on a day"));
	} else {
		spans.push(Span::raw(format!(
			"   showing {}/{} events",
			view.visible_count, view.total_count
		)));
	}

	let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
	frame.render_widget(header, area);
}

fn render_calendar(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let month = app.calendar_month;
	let block = Block::default()
		.borders(Borders::ALL)
		.title(format!("{} {}", month.format("%B"), month.year()));
	let inner = block.inner(area);
	frame.render_widget(block, area);

	let mut row_constraints = vec![Constraint::Length(1)];
	row_constraints.extend((0..GRID_WEEKS).map(|_| Constraint::Ratio(1, GRID_WEEKS as u32)));
	let rows = Layout::default()
		.direction(Direction::Vertical)
		.constraints(row_constraints)
		.split(inner);

	let weekday_cells = week_columns(rows[0]);
	for (label, cell_area) in WEEKDAY_LABELS.iter().zip(weekday_cells.iter()) {
		let label = Paragraph::new(Line::from(Span::styled(
			*label,
			Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
		)));
		frame.render_widget(label, *cell_area);
	}

	for (week, cells) in view.cells.chunks(7).enumerate() {
		let columns = week_columns(rows[week + 1]);
		for (cell, cell_area) in cells.iter().zip(columns.iter()) {
			render_day_cell(frame, *cell_area, cell, cell.date == app.cursor);
		}
	}
}

fn render_day_cell(frame: &mut Frame, area: Rect, cell: &DayCell, has_cursor: bool) {
	let mut number_style = if cell.in_month {
		Style::default()
	} else {
		Style::default().fg(Color::DarkGray)
	};
	if cell.is_today {
		number_style = number_style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
	}

	let border_style = if has_cursor {
		Style::default()
			.fg(CURSOR_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_BORDER_COLOR)
	};
	let mut block = Block::default()
		.borders(Borders::ALL)
		.border_style(border_style)
		.title(Line::from(Span::styled(format!("{:>2}", cell.date.day()), number_style)));

	let mut lines = Vec::new();
	if let Some(visible) = &cell.event {
		if visible.style.rounded {
			block = block.border_type(BorderType::Rounded);
		}
		let glyph_style = Style::default()
			.bg(color(blend(visible.style.background, BACKDROP, visible.style.opacity)))
			.fg(color(visible.style.foreground));
		lines.push(Line::from(Span::styled(visible.event.title.clone(), glyph_style)));
		if !visible.event.location.is_empty() {
			lines.push(Line::from(Span::styled(
				visible.event.location.clone(),
				Style::default().fg(Color::Gray),
			)));
		}
	}

	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let footer_lines = match view.dialog_open {
		false => vec![
			Line::from("arrows/hjkl move | [ ] month | t today | Enter open day/event | a/p/u filter | q quit"),
			Line::from(app.status.clone()),
		],
		true => vec![
			Line::from("Tab/Up/Down field | type to edit | Left/Right choose button | Enter press | Esc cancel"),
			Line::from(app.status.clone()),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_dialog(frame: &mut Frame, dialog: &DialogState) {
	let area = centered_rect(50, 40, frame.area());
	frame.render_widget(Clear, area);

	let mut lines = Vec::new();
	for (index, field) in dialog.spec.fields.iter().enumerate() {
		let focused = index == dialog.field_index;
		let marker = if focused { "> " } else { "  " };
		let input = &dialog.inputs[index];
		let value = if input.is_empty() {
			Span::styled(field.placeholder, Style::default().fg(Color::DarkGray))
		} else {
			Span::raw(input.clone())
		};
		let marker_style = if focused {
			Style::default()
				.fg(CURSOR_BORDER_COLOR)
				.add_modifier(Modifier::BOLD)
		} else {
			Style::default()
		};
		lines.push(Line::from(vec![Span::styled(marker, marker_style), value]));
		lines.push(Line::from(""));
	}

	let mut buttons = Vec::new();
	for (index, action) in dialog.spec.actions.iter().enumerate() {
		let style = if index == dialog.action_index {
			Style::default()
				.bg(color(action_color(*action)))
				.fg(Color::White)
				.add_modifier(Modifier::BOLD)
		} else {
			Style::default().fg(color(action_color(*action)))
		};
		buttons.push(Span::styled(format!("[ {} ]", action.label()), style));
		buttons.push(Span::raw(" "));
	}
	lines.push(Line::from(buttons));

	let popup = Paragraph::new(lines).block(
		Block::default()
			.borders(Borders::ALL)
			.border_type(BorderType::Rounded)
			.title(dialog.spec.title),
	);
	frame.render_widget(popup, area);
}

fn week_columns(area: Rect) -> Vec<Rect> {
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints((0..7).map(|_| Constraint::Ratio(1, 7)))
		.split(area)
		.to_vec()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(app: &mut App, code: KeyCode, tracker: &mut Tracker, view: &ViewModel) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => return true,
		KeyCode::Left | KeyCode::Char('h') => app.move_cursor(-1),
		KeyCode::Right | KeyCode::Char('l') => app.move_cursor(1),
		KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-7),
		KeyCode::Down | KeyCode::Char('j') => app.move_cursor(7),
		KeyCode::Char('[') => app.shift_month(-1),
		KeyCode::Char(']') => app.shift_month(1),
		KeyCode::Char('t') => app.jump_to(view.today),
		KeyCode::Char('a') | KeyCode::Char('1') => set_filter(app, tracker, FilterMode::All),
		KeyCode::Char('p') | KeyCode::Char('2') => set_filter(app, tracker, FilterMode::Past),
		KeyCode::Char('u') | KeyCode::Char('3') => set_filter(app, tracker, FilterMode::Upcoming),
		KeyCode::Enter | KeyCode::Char(' ') => open_cursor_day(app, tracker, view),
		_ => {}
	}

	false
}

fn set_filter(app: &mut App, tracker: &mut Tracker, mode: FilterMode) {
	tracker.set_filter(mode);
	app.status = format!("Showing {} events", mode);
}

/// Enter on a glyph selects that event; on empty space it selects the slot.
fn open_cursor_day(app: &mut App, tracker: &mut Tracker, view: &ViewModel) {
	let visible = view
		.cells
		.iter()
		.find(|cell| cell.date == app.cursor)
		.and_then(|cell| cell.event.as_ref())
		.map(|visible| visible.event.clone());

	let session = match visible {
		Some(event) => tracker.handle_gesture(Gesture::EventSelected(event)),
		None => tracker.select_day(app.cursor),
	};
	app.status = match session.flow() {
		Flow::Create { start } => format!("New event on {}", start.date().format("%d %b %Y")),
		Flow::Edit { .. } => "Editing event".to_string(),
	};
	app.dialog = Some(DialogState::new(session.dialog()));
}

fn handle_dialog_key(app: &mut App, code: KeyCode, tracker: &mut Tracker) -> bool {
	let Some(dialog) = app.dialog.as_mut() else {
		return false;
	};

	match code {
		KeyCode::Esc => {
			tracker.cancel();
			app.dialog = None;
			app.status = "Cancelled".to_string();
		}
		KeyCode::Tab | KeyCode::Down => dialog.move_field(1),
		KeyCode::BackTab | KeyCode::Up => dialog.move_field(-1),
		KeyCode::Left => dialog.move_action(-1),
		KeyCode::Right => dialog.move_action(1),
		KeyCode::Backspace => {
			dialog.focused_input().pop();
		}
		KeyCode::Char(value) => dialog.focused_input().push(value),
		KeyCode::Enter => {
			if let Some(action) = dialog.selected_action() {
				submit_dialog(app, tracker, action);
			}
		}
		_ => {}
	}

	false
}

fn submit_dialog(app: &mut App, tracker: &mut Tracker, action: Action) {
	let Some(dialog) = &app.dialog else {
		return;
	};
	let values = dialog.values();

	let outcome = tracker.submit(action, &values);
	if tracker.session().is_none() {
		app.dialog = None;
	}
	if let Some(message) = outcome.and_then(|outcome| outcome_message(&outcome, tracker)) {
		app.status = message;
	}
}

fn outcome_message(outcome: &SubmitOutcome, tracker: &Tracker) -> Option<String> {
	match outcome {
		SubmitOutcome::Committed(Change::Created(id)) => Some(format!("Created {}", event_label(tracker, id))),
		SubmitOutcome::Committed(Change::Updated(id)) => Some(format!("Updated {}", event_label(tracker, id))),
		SubmitOutcome::Committed(Change::Deleted(_)) => Some("Event deleted".to_string()),
		SubmitOutcome::Cancelled => Some("Cancelled".to_string()),
		SubmitOutcome::Vanished(_) => Some("Ready".to_string()),
		SubmitOutcome::Rejected(_) | SubmitOutcome::Ignored => None,
	}
}

fn event_label(tracker: &Tracker, id: &str) -> String {
	tracker
		.store()
		.get(id)
		.map(|event| format!("\"{}\" on {}", event.title, event.day().format("%d %b %Y")))
		.unwrap_or_else(|| "event".to_string())
}

fn build_view(app: &App, tracker: &Tracker, today: NaiveDate) -> ViewModel {
	let visible = tracker.visible_events(today);
	let cells = month_grid(app.calendar_month)
		.into_iter()
		.map(|date| DayCell {
			date,
			in_month: date.month() == app.calendar_month.month(),
			is_today: date == today,
			event: visible
				.iter()
				.find(|event| event.day() == date)
				.map(|event| VisibleEvent {
					event: (*event).clone(),
					style: tracker.style_of(event, today),
				}),
		})
		.collect();

	ViewModel {
		today,
		filter: tracker.filter(),
		visible_count: visible.len(),
		total_count: tracker.store().len(),
		store_empty: tracker.store().is_empty(),
		dialog_open: tracker.session().is_some(),
		cells,
	}
}

/// Six Monday-first weeks covering `month`.
fn month_grid(month: NaiveDate) -> Vec<NaiveDate> {
	let first = start_of_week(first_day_of_month(month));
	(0..GRID_WEEKS as i64 * 7)
		.map(|offset| first + Duration::days(offset))
		.collect()
}

fn filter_key(mode: FilterMode) -> char {
	match mode {
		FilterMode::All => 'a',
		FilterMode::Past => 'p',
		FilterMode::Upcoming => 'u',
	}
}

fn action_color(action: Action) -> Rgb {
	match action {
		Action::Save => Rgb(92, 184, 92),
		Action::Edit => Rgb(91, 192, 222),
		Action::Delete => Rgb(217, 83, 79),
		Action::Cancel => Rgb(160, 160, 160),
	}
}

fn color(rgb: Rgb) -> Color {
	Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Terminal cells have no alpha; mix the color onto the backdrop instead.
fn blend(foreground: Rgb, backdrop: Rgb, opacity: f32) -> Rgb {
	let opacity = opacity.clamp(0.0, 1.0);
	let mix = |top: u8, bottom: u8| (top as f32 * opacity + bottom as f32 * (1.0 - opacity)).round() as u8;
	Rgb(
		mix(foreground.0, backdrop.0),
		mix(foreground.1, backdrop.1),
		mix(foreground.2, backdrop.2),
	)
}

fn days_in_month(year: i32, month: u32) -> u32 {
	let first_of_next = if month == 12 {
		NaiveDate::from_ymd_opt(year + 1, 1, 1).expect("next year date should be valid")
	} else {
		NaiveDate::from_ymd_opt(year, month + 1, 1).expect("next month date should be valid")
	};
	(first_of_next - Duration::days(1)).day()
}

fn first_day_of_month(day: NaiveDate) -> NaiveDate {
	NaiveDate::from_ymd_opt(day.year(), day.month(), 1).expect("first day of month must be valid")
}

fn start_of_week(day: NaiveDate) -> NaiveDate {
	let days_from_monday = day.weekday().number_from_monday() as i64 - 1;
	day - Duration::days(days_from_monday)
}

fn shift_month(day: NaiveDate, delta: i32) -> NaiveDate {
	let mut year = day.year();
	let mut month = day.month() as i32 + delta;
	while month > 12 {
		year += 1;
		month -= 12;
	}
	while month < 1 {
		year -= 1;
		month += 12;
	}
	let month_u32 = month as u32;
	let max_day = days_in_month(year, month_u32);
	let target_day = day.day().min(max_day);
	NaiveDate::from_ymd_opt(year, month_u32, target_day).expect("shifted month date must be valid")
}

/// Host-side state of the open form: one text buffer per declared field.
#[derive(Debug, Clone)]
struct DialogState {
	spec: DialogSpec,
	inputs: Vec<String>,
	field_index: usize,
	action_index: usize,
}

impl DialogState {
	fn new(spec: &DialogSpec) -> Self {
		let defaults = FieldValues::from_defaults(spec);
		Self {
			inputs: spec
				.fields
				.iter()
				.map(|field| defaults.get(field.key).to_string())
				.collect(),
			spec: spec.clone(),
			field_index: 0,
			action_index: 0,
		}
	}

	fn move_field(&mut self, delta: i32) {
		self.field_index = step_index(self.field_index, delta, self.inputs.len());
	}

	fn move_action(&mut self, delta: i32) {
		self.action_index = step_index(self.action_index, delta, self.spec.actions.len());
	}

	fn focused_input(&mut self) -> &mut String {
		&mut self.inputs[self.field_index]
	}

	fn selected_action(&self) -> Option<Action> {
		self.spec.actions.get(self.action_index).copied()
	}

	fn values(&self) -> FieldValues {
		let mut values = FieldValues::new();
		for (field, input) in self.spec.fields.iter().zip(self.inputs.iter()) {
			values.set(field.key, input.clone());
		}
		values
	}
}

fn step_index(current: usize, delta: i32, len: usize) -> usize {
	if len == 0 {
		return 0;
	}
	let len = len as i32;
	(current as i32 + delta).rem_euclid(len) as usize
}

#[derive(Debug, Clone)]
struct App {
	cursor: NaiveDate,
	calendar_month: NaiveDate,
	dialog: Option<DialogState>,
	status: String,
}

impl App {
	fn new(today: NaiveDate) -> Self {
		let status = match logging_status() {
			Some((level, dir)) => format!("Ready | log level {level} in {}", dir.display()),
			None => "Ready".to_string(),
		};
		Self {
			cursor: today,
			calendar_month: first_day_of_month(today),
			dialog: None,
			status,
		}
	}

	fn move_cursor(&mut self, delta_days: i64) {
		self.jump_to(self.cursor + Duration::days(delta_days));
	}

	fn shift_month(&mut self, delta_months: i32) {
		self.jump_to(shift_month(self.cursor, delta_months));
	}

	fn jump_to(&mut self, day: NaiveDate) {
		self.cursor = day;
		self.calendar_month = first_day_of_month(day);
	}
}

struct ViewModel {
	today: NaiveDate,
	filter: FilterMode,
	visible_count: usize,
	total_count: usize,
	store_empty: bool,
	dialog_open: bool,
	cells: Vec<DayCell>,
}

struct DayCell {
	date: NaiveDate,
	in_month: bool,
	is_today: bool,
	event: Option<VisibleEvent>,
}

struct VisibleEvent {
	event: Event,
	style: EventStyle,
}
