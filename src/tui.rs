use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::form::{FormState, FORM_FIELDS};
use crate::list::{ListView, Phase, StatusFilter};
use crate::models::KNOWN_STATUSES;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Browse,
    AddForm,
    EditForm,
    ConfirmDelete,
}

const EDIT_FIELDS: [&str; 6] = ["Company", "Position", "Status", "URL", "Location", "Salary range"];

struct AppState {
    list: ListView,
    form: FormState,
    mode: Mode,
    edit_focus: usize,
    status_line: Option<String>,
}

impl AppState {
    fn new() -> Self {
        Self {
            list: ListView::new(),
            form: FormState::new(),
            mode: Mode::Browse,
            edit_focus: 0,
            status_line: None,
        }
    }

    fn cycle_filter(&mut self) {
        let next = match &self.list.filter {
            StatusFilter::All => StatusFilter::Status(KNOWN_STATUSES[0].to_string()),
            StatusFilter::Status(current) => {
                match KNOWN_STATUSES.iter().position(|s| *s == current.as_str()) {
                    Some(i) if i + 1 < KNOWN_STATUSES.len() => {
                        StatusFilter::Status(KNOWN_STATUSES[i + 1].to_string())
                    }
                    _ => StatusFilter::All,
                }
            }
        };
        self.list.set_filter(next);
    }

    fn edit_value_mut(&mut self) -> Option<&mut String> {
        let draft = self.list.draft.as_mut()?;
        let fields = &mut draft.fields;
        Some(match self.edit_focus {
            0 => &mut fields.company,
            1 => &mut fields.position,
            2 => &mut fields.status,
            3 => fields.url.get_or_insert_with(String::new),
            4 => fields.location.get_or_insert_with(String::new),
            _ => fields.salary_range.get_or_insert_with(String::new),
        })
    }

    fn edit_value(&self, idx: usize) -> String {
        let Some(draft) = self.list.draft.as_ref() else {
            return String::new();
        };
        let fields = &draft.fields;
        match idx {
            0 => fields.company.clone(),
            1 => fields.position.clone(),
            2 => fields.status.clone(),
            3 => fields.url.clone().unwrap_or_default(),
            4 => fields.location.clone().unwrap_or_default(),
            _ => fields.salary_range.clone().unwrap_or_default(),
        }
    }

    // Empty optionals typed out in the edit form go back to None.
    fn normalize_draft(&mut self) {
        if let Some(draft) = self.list.draft.as_mut() {
            for slot in [
                &mut draft.fields.url,
                &mut draft.fields.location,
                &mut draft.fields.salary_range,
            ] {
                if slot.as_deref().is_some_and(|v| v.trim().is_empty()) {
                    *slot = None;
                }
            }
        }
    }
}

pub fn run(store: &dyn RecordStore, status: Option<&str>) -> Result<()> {
    let mut state = AppState::new();
    if let Some(status) = status {
        state.list.set_filter(StatusFilter::Status(status.to_string()));
    }
    state.list.refresh(store);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, store);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    store: &dyn RecordStore,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            state.status_line = None;

            match state.mode {
                Mode::Browse => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Down | KeyCode::Char('j') => state.list.select_next(),
                    KeyCode::Up | KeyCode::Char('k') => state.list.select_prev(),
                    KeyCode::Char('f') => state.cycle_filter(),
                    KeyCode::Char('r') => state.list.refresh(store),
                    KeyCode::Char('a') => {
                        state.form.clear();
                        state.mode = Mode::AddForm;
                    }
                    KeyCode::Char('e') => {
                        if let Some(id) = state.list.selected_record().map(|r| r.id.clone()) {
                            state.list.begin_edit(&id);
                            if state.list.is_editing(&id) {
                                state.edit_focus = 0;
                                state.mode = Mode::EditForm;
                            }
                        }
                    }
                    KeyCode::Char('d') => {
                        if let Some(id) = state.list.selected_record().map(|r| r.id.clone()) {
                            state.list.stage_delete(&id);
                            if state.list.confirming.is_some() {
                                state.mode = Mode::ConfirmDelete;
                            }
                        }
                    }
                    _ => {}
                },

                Mode::ConfirmDelete => match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => {
                        if state.list.confirm_delete(store) {
                            state.status_line = Some("Application deleted".to_string());
                        }
                        state.mode = Mode::Browse;
                    }
                    _ => {
                        // Anything else counts as a backdrop click
                        state.list.cancel_delete();
                        state.mode = Mode::Browse;
                    }
                },

                Mode::AddForm => match key.code {
                    KeyCode::Esc => {
                        state.form.clear();
                        state.mode = Mode::Browse;
                    }
                    KeyCode::Tab | KeyCode::Down => state.form.focus_next(),
                    KeyCode::BackTab | KeyCode::Up => state.form.focus_prev(),
                    KeyCode::Backspace => state.form.delete_char(),
                    KeyCode::Enter => {
                        let AppState { form, list, .. } = state;
                        if form.submit(store, &mut || list.refresh(store)) {
                            state.status_line = Some("Application added".to_string());
                            state.mode = Mode::Browse;
                        }
                    }
                    KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                        state.form.insert_char(c);
                    }
                    _ => {}
                },

                Mode::EditForm => match key.code {
                    KeyCode::Esc => {
                        state.list.cancel_edit();
                        state.mode = Mode::Browse;
                    }
                    KeyCode::Tab | KeyCode::Down => {
                        state.edit_focus = (state.edit_focus + 1) % EDIT_FIELDS.len();
                    }
                    KeyCode::BackTab | KeyCode::Up => {
                        state.edit_focus =
                            (state.edit_focus + EDIT_FIELDS.len() - 1) % EDIT_FIELDS.len();
                    }
                    KeyCode::Backspace => {
                        if let Some(value) = state.edit_value_mut() {
                            value.pop();
                        }
                    }
                    KeyCode::Enter => {
                        state.normalize_draft();
                        if state.list.save_edit(store) {
                            state.status_line = Some("Application updated".to_string());
                            state.mode = Mode::Browse;
                        }
                    }
                    KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                        if let Some(value) = state.edit_value_mut() {
                            value.push(c);
                        }
                    }
                    _ => {}
                },
            }

            list_state.select(Some(state.list.selected));
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);

    draw_list(frame, state, list_state, chunks[0]);
    draw_detail(frame, state, chunks[1]);

    // Alert line: red for failures, green for completed mutations
    let message = state
        .list
        .alert
        .as_deref()
        .or(state.form.alert.as_deref())
        .map(|m| (m, Style::default().fg(Color::Red)))
        .or_else(|| {
            state
                .status_line
                .as_deref()
                .map(|m| (m, Style::default().fg(Color::Green)))
        });
    if let Some((text, style)) = message {
        frame.render_widget(Paragraph::new(text).style(style), rows[1]);
    }

    let help = match state.mode {
        Mode::Browse => " j/k:navigate  a:add  e:edit  d:delete  f:filter  r:refresh  q:quit",
        Mode::AddForm | Mode::EditForm => " Tab:next field  Enter:save  Esc:cancel",
        Mode::ConfirmDelete => " y/Enter:delete  any other key:cancel",
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );

    match state.mode {
        Mode::AddForm => draw_add_form(frame, state),
        Mode::EditForm => draw_edit_form(frame, state),
        Mode::ConfirmDelete => draw_confirm_modal(frame, state),
        Mode::Browse => {}
    }
}

fn draw_list(frame: &mut Frame, state: &AppState, list_state: &mut ListState, area: Rect) {
    let visible = state.list.filtered();

    if visible.is_empty() {
        let text = match state.list.phase {
            Phase::Loading => "Loading applications...",
            Phase::Empty => "No applications yet. Add your first one!",
            Phase::Loaded => "No applications match this filter.",
        };
        let placeholder = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Applications "));
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .map(|record| {
            let company = truncate(&record.company, 20);
            let position = truncate(&record.position, 24);
            let line = Line::from(vec![
                Span::styled(
                    format!("{:<9}", truncate(&record.status, 9)),
                    status_style(&record.status),
                ),
                Span::raw(format!(" {company} | {position}")),
            ]);
            ListItem::new(line)
        })
        .collect();

    let title = format!(
        " Applications ({}) [{}] ",
        visible.len(),
        state.list.filter.label()
    );
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, list_state);
}

fn draw_detail(frame: &mut Frame, state: &AppState, area: Rect) {
    let detail = build_detail(state);
    let widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn build_detail(state: &AppState) -> Text<'_> {
    let Some(record) = state.list.selected_record() else {
        return Text::raw("No application selected");
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        record.position.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", record.company)));
    lines.push(Line::from(Span::styled(
        format!("Status: {}", record.status),
        status_style(&record.status),
    )));
    lines.push(Line::from(format!(
        "Applied: {}",
        display_date(&record.applied_date)
    )));
    if let Some(location) = &record.location {
        lines.push(Line::from(format!("Location: {location}")));
    }
    if let Some(salary) = &record.salary_range {
        lines.push(Line::from(format!("Salary range: {salary}")));
    }
    if let Some(url) = &record.url {
        lines.push(Line::from(""));
        for line in textwrap::fill(&format!("URL: {url}"), 60).lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    Text::from(lines)
}

fn draw_add_form(frame: &mut Frame, state: &AppState) {
    let area = centered_rect(50, FORM_FIELDS.len() as u16 + 4, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in FORM_FIELDS.iter().enumerate() {
        let marker = if i == state.form.focused { "> " } else { "  " };
        let style = if i == state.form.focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{:<9} {}", field.label(), state.form.value(*field)),
            style,
        )));
    }
    lines.push(Line::from(""));
    let footer = if state.form.submitting {
        "Adding..."
    } else {
        "Enter to add"
    };
    lines.push(Line::from(Span::styled(
        footer,
        Style::default().fg(Color::DarkGray),
    )));

    let form = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" New application "));
    frame.render_widget(form, area);
}

fn draw_edit_form(frame: &mut Frame, state: &AppState) {
    let area = centered_rect(50, EDIT_FIELDS.len() as u16 + 4, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = Vec::new();
    for (i, label) in EDIT_FIELDS.iter().enumerate() {
        let marker = if i == state.edit_focus { "> " } else { "  " };
        let style = if i == state.edit_focus {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{label:<13} {}", state.edit_value(i)),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter to save",
        Style::default().fg(Color::DarkGray),
    )));

    let form = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Edit application "));
    frame.render_widget(form, area);
}

fn draw_confirm_modal(frame: &mut Frame, state: &AppState) {
    let company = state
        .list
        .confirming_record()
        .map(|r| r.company.as_str())
        .unwrap_or("this company");

    let body = format!(
        "Delete application to {company}?\n\n{}",
        textwrap::fill(
            "This action cannot be undone. The application will be permanently deleted.",
            44
        )
    );

    let area = centered_rect(48, 8, frame.area());
    frame.render_widget(Clear, area);
    let modal = Paragraph::new(body).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Confirm delete ")
            .border_style(Style::default().fg(Color::Red)),
    );
    frame.render_widget(modal, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn status_style(status: &str) -> Style {
    match status {
        "Applied" => Style::default().fg(Color::Cyan),
        "Pending" => Style::default().fg(Color::Yellow),
        "Rejected" => Style::default().fg(Color::Red),
        "Interview" => Style::default().fg(Color::Green),
        "Almost!" => Style::default().fg(Color::Magenta),
        _ => Style::default(),
    }
}

fn display_date(applied_date: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(applied_date, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| applied_date.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_cycles_through_known_statuses_and_back() {
        let mut state = AppState::new();
        assert_eq!(state.list.filter, StatusFilter::All);
        for status in KNOWN_STATUSES {
            state.cycle_filter();
            assert_eq!(state.list.filter, StatusFilter::Status(status.to_string()));
        }
        state.cycle_filter();
        assert_eq!(state.list.filter, StatusFilter::All);
    }

    #[test]
    fn unknown_status_gets_the_default_treatment() {
        assert_eq!(status_style("Ghosted"), Style::default());
        assert_ne!(status_style("Applied"), Style::default());
    }

    #[test]
    fn display_date_trims_the_time_component() {
        assert_eq!(display_date("2026-08-28 12:34:56.789"), "2026-08-28");
        // Unparseable values pass through untouched
        assert_eq!(display_date("whenever"), "whenever");
    }
}
