use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::dashboard::{self, DashboardModel, Operation, Response};
use crate::db::ListingStore;
use crate::filter::present;
use crate::models::{Employer, JobListing};
use crate::truncate;
use crate::view::{DashboardQuery, RequestContext, View};

enum Mode {
    Normal,
    Search(String),
}

struct AppState {
    view: View,
    search_term: Option<String>,
    employer_search_term: Option<String>,
    page: i64,
    selected: usize,
    scroll_offset: u16,
    mode: Mode,
    model: Option<DashboardModel>,
}

impl AppState {
    fn new(view: View) -> Self {
        Self {
            view,
            search_term: None,
            employer_search_term: None,
            page: 1,
            selected: 0,
            scroll_offset: 0,
            mode: Mode::Normal,
            model: None,
        }
    }

    fn query(&self) -> DashboardQuery {
        DashboardQuery {
            active_view: Some(self.view.as_str().to_string()),
            search_term: self.search_term.clone(),
            employer_search_term: self.employer_search_term.clone(),
            current_page: Some(self.page.to_string()),
            ..Default::default()
        }
    }

    /// Re-runs the dashboard for the current view and selection.
    fn refresh<S: ListingStore + ?Sized>(&mut self, store: &S) {
        let ctx = RequestContext::from_query(&self.query());
        let op = match self.view {
            View::Jobs => Operation::ShowJobs,
            View::Employers => Operation::ShowEmployers {
                employer_id: self.employer_names().get(self.selected).cloned(),
                employer_search_term: self.employer_search_term.clone(),
            },
        };
        if let Response::Page(model) = dashboard::dispatch(store, &ctx, op) {
            if let Some(page) = &model.jobs {
                self.page = page.current_page;
            }
            self.model = Some(*model);
        }
        let len = self.len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn jobs(&self) -> &[JobListing] {
        self.model
            .as_ref()
            .and_then(|m| m.jobs.as_ref())
            .map(|p| p.items.as_slice())
            .unwrap_or(&[])
    }

    fn employer_names(&self) -> &[String] {
        self.model
            .as_ref()
            .map(|m| m.distinct_employer_names.as_slice())
            .unwrap_or(&[])
    }

    fn len(&self) -> usize {
        match self.view {
            View::Jobs => self.jobs().len(),
            View::Employers => self.employer_names().len(),
        }
    }

    fn current_job(&self) -> Option<&JobListing> {
        self.jobs().get(self.selected)
    }

    fn current_employer(&self) -> Option<&Employer> {
        self.model.as_ref().and_then(|m| m.selected_employer.as_ref())
    }

    fn active_search(&self) -> Option<&str> {
        match self.view {
            View::Jobs => present(&self.search_term),
            View::Employers => present(&self.employer_search_term),
        }
    }

    fn next(&mut self) -> bool {
        if self.selected + 1 < self.len() {
            self.selected += 1;
            self.scroll_offset = 0;
            return true;
        }
        false
    }

    fn prev(&mut self) -> bool {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
            return true;
        }
        false
    }

    /// Drops the rendered model so the next refresh does not read an
    /// employer id from a list that is no longer displayed.
    fn reset_cursor(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
        self.model = None;
    }

    fn toggle_view(&mut self) {
        self.view = self.view.toggle();
        self.reset_cursor();
    }

    fn turn_page(&mut self, delta: i64) -> bool {
        let Some(page) = self.model.as_ref().and_then(|m| m.jobs.as_ref()) else {
            return false;
        };
        let moved = if delta > 0 { page.has_next() } else { page.has_previous() };
        if moved {
            self.page = page.current_page + delta;
            self.selected = 0;
            self.scroll_offset = 0;
        }
        moved
    }

    fn apply_search(&mut self, term: String) {
        let term = if term.is_empty() { None } else { Some(term) };
        match self.view {
            View::Jobs => {
                self.search_term = term;
                self.page = 1;
            }
            View::Employers => self.employer_search_term = term,
        }
        self.reset_cursor();
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

pub fn run_browse<S: ListingStore + ?Sized>(store: &S, view: View) -> Result<()> {
    let mut state = AppState::new(view);
    state.refresh(store);

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

fn run_loop<S: ListingStore + ?Sized>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    store: &S,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let mut reload = false;
        if let Mode::Search(input) = &mut state.mode {
            match key.code {
                KeyCode::Enter => {
                    let term = std::mem::take(input);
                    state.mode = Mode::Normal;
                    state.apply_search(term);
                    reload = true;
                }
                KeyCode::Esc => state.mode = Mode::Normal,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
        } else {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => {
                    reload = state.next() && state.view == View::Employers;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    reload = state.prev() && state.view == View::Employers;
                }
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Tab => {
                    state.toggle_view();
                    reload = true;
                }
                KeyCode::Char('/') => {
                    let current = state.active_search().unwrap_or_default().to_string();
                    state.mode = Mode::Search(current);
                }
                KeyCode::Char('n') => reload = state.turn_page(1),
                KeyCode::Char('p') => reload = state.turn_page(-1),
                _ => {}
            }
        }

        if reload {
            state.refresh(store);
        }
        list_state.select(Some(state.selected));
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(65),
        ])
        .split(frame.area());

    // Left panel: active list
    let (items, title): (Vec<ListItem>, String) = match state.view {
        View::Jobs => {
            let items = state
                .jobs()
                .iter()
                .map(|job| {
                    let employer = job.employer_name.as_deref().unwrap_or("?");
                    ListItem::new(format!("{} | {}", truncate(job.title(), 35), employer))
                })
                .collect();
            let title = match state.model.as_ref().and_then(|m| m.jobs.as_ref()) {
                Some(page) => format!(
                    " Jobs ({}) page {}/{} ",
                    page.total_items,
                    page.current_page,
                    page.total_pages.max(1)
                ),
                None => " Jobs ".to_string(),
            };
            (items, title)
        }
        View::Employers => {
            let items = state
                .employer_names()
                .iter()
                .map(|name| ListItem::new(name.as_str()))
                .collect();
            (items, format!(" Employers ({}) ", state.employer_names().len()))
        }
    };
    let title = match state.active_search() {
        Some(term) => format!("{}[/{}] ", title, term),
        None => title,
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: detail
    let detail = match state.view {
        View::Jobs => build_job_detail(state.current_job()),
        View::Employers => build_employer_detail(state.current_employer()),
    };
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Footer: help or search prompt
    let help_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let footer = match &state.mode {
        Mode::Search(input) => Paragraph::new(format!(" search: {}_", input))
            .style(Style::default().fg(Color::Yellow)),
        Mode::Normal => Paragraph::new(
            " j/k:navigate  J/K:scroll  tab:jobs/employers  /:search  n/p:page  q:quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, help_area[1]);
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn wrapped(lines: &mut Vec<Line<'static>>, text: &str) {
    for line in textwrap::fill(text, 70).lines() {
        lines.push(Line::from(format!("  {}", line)));
    }
}

fn build_job_detail(job: Option<&JobListing>) -> Text<'static> {
    let Some(job) = job else {
        return Text::raw("No job selected");
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(heading(job.title()));
    if let Some(employer) = &job.employer_name {
        lines.push(Line::from(format!("at {}", employer)));
    }
    if let Some(job_type) = &job.job_type {
        lines.push(Line::from(Span::styled(
            job_type.clone(),
            Style::default().fg(Color::Cyan),
        )));
    }
    if let Some(location) = &job.location {
        lines.push(Line::from(format!("Location: {}", location)));
    }
    if let Some(url) = &job.apply_url {
        lines.push(Line::from(format!("Apply: {}", url)));
    }
    lines.push(Line::from(format!(
        "Posted: {}",
        job.date_posted.format("%Y-%m-%d")
    )));
    lines.push(Line::from(""));

    match present(&job.description) {
        Some(description) => {
            lines.push(heading("Description"));
            wrapped(&mut lines, description);
        }
        None => lines.push(Line::from(Span::styled(
            "(No description)",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    Text::from(lines)
}

fn build_employer_detail(employer: Option<&Employer>) -> Text<'static> {
    let Some(employer) = employer else {
        return Text::raw("No employer selected");
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(heading(employer.name()));
    lines.push(Line::from(""));
    if let Some(vision) = present(&employer.company_vision) {
        lines.push(heading("Company Vision"));
        wrapped(&mut lines, vision);
        lines.push(Line::from(""));
    }
    if let Some(stack) = present(&employer.tech_stack) {
        lines.push(heading("Tech Stack"));
        wrapped(&mut lines, stack);
    }
    Text::from(lines)
}
