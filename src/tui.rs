use std::io;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::domain::{CatalogItem, SortOption};
use crate::listing;
use crate::presenter::{Presenter, PresenterState, Publication};
use crate::store::FoundStore;

const HELP: &str =
    "Tab switch  ↑/↓ move  Enter toggle found  p price  a A-Z  h hide found  / search  r reload  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Browse,
    Search,
}

struct CatalogTab<S: FoundStore + 'static> {
    presenter: Presenter<S>,
    updates: Receiver<Publication>,
    items: Vec<CatalogItem>,
    search: String,
    hide_found: bool,
    sort: Option<SortOption>,
    selected: usize,
}

impl<S: FoundStore + 'static> CatalogTab<S> {
    fn new(mut presenter: Presenter<S>) -> Self {
        let updates = presenter.subscribe();
        Self {
            presenter,
            updates,
            items: Vec::new(),
            search: String::new(),
            hide_found: false,
            sort: None,
            selected: 0,
        }
    }

    fn sync(&mut self) -> Option<String> {
        self.presenter.pump();
        let mut status = None;
        while let Ok(publication) = self.updates.try_recv() {
            match publication {
                Publication::Items(items) => self.items = items,
                Publication::ItemChanged(changed) => {
                    if let Some(item) = self.items.iter_mut().find(|item| item.name == changed.name) {
                        *item = changed;
                    }
                }
                Publication::LoadFailed => {
                    status = Some(format!(
                        "could not load {}, showing the previous list",
                        self.presenter.catalog()
                    ));
                }
            }
        }
        self.selected = self.selected.min(self.visible().len().saturating_sub(1));
        status
    }

    fn visible(&self) -> Vec<&CatalogItem> {
        listing::search(&self.items, &self.search)
    }

    fn toggle_selected(&mut self) -> Option<String> {
        let name = self.visible().get(self.selected)?.name.clone();
        let index = self.items.iter().position(|item| item.name == name)?;
        let found = self.presenter.toggle_found(&mut self.items[index]);
        let state = if found { "found" } else { "not found" };
        Some(format!("{name} marked {state}"))
    }

    fn is_loading(&self) -> bool {
        self.presenter.state() == PresenterState::Loading
    }

    // A pending load would replace the result in file order.
    fn sort_by(&mut self, key: SortOption) {
        if self.is_loading() {
            return;
        }
        self.sort = Some(key);
        self.presenter.sort(&self.items, key);
    }

    fn toggle_hide_found(&mut self) {
        if self.is_loading() {
            return;
        }
        self.hide_found = !self.hide_found;
        if !self.hide_found {
            // Reloading drops the sort.
            self.sort = None;
        }
        self.presenter.filter(&self.items, self.hide_found);
    }
}

pub struct Browser<S: FoundStore + 'static> {
    tabs: Vec<CatalogTab<S>>,
    active: usize,
    input_mode: InputMode,
    status: String,
}

impl<S: FoundStore + 'static> Browser<S> {
    pub fn new(presenters: Vec<Presenter<S>>) -> Self {
        Self {
            tabs: presenters.into_iter().map(CatalogTab::new).collect(),
            active: 0,
            input_mode: InputMode::Browse,
            status: "ready".to_string(),
        }
    }

    pub fn run(&mut self) -> miette::Result<()> {
        for tab in &mut self.tabs {
            if tab.items.is_empty() {
                tab.presenter.load();
            }
        }

        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        loop {
            for tab in &mut self.tabs {
                if let Some(status) = tab.sync() {
                    self.status = status;
                }
            }

            terminal
                .draw(|frame| draw_ui(frame, self))
                .into_diagnostic()?;

            if event::poll(Duration::from_millis(120)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press || self.tabs.is_empty() {
            return key.kind == KeyEventKind::Press;
        }
        if self.input_mode == InputMode::Search {
            self.handle_search_key(key);
            return false;
        }

        let tab_count = self.tabs.len();
        let tab = &mut self.tabs[self.active];
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Right => self.active = (self.active + 1) % tab_count,
            KeyCode::BackTab | KeyCode::Left => {
                self.active = (self.active + tab_count - 1) % tab_count
            }
            KeyCode::Up | KeyCode::Char('k') => tab.selected = tab.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                let last = tab.visible().len().saturating_sub(1);
                tab.selected = (tab.selected + 1).min(last);
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(status) = tab.toggle_selected() {
                    self.status = status;
                }
            }
            KeyCode::Char('p') => tab.sort_by(SortOption::Price),
            KeyCode::Char('a') => tab.sort_by(SortOption::AToZ),
            KeyCode::Char('h') => tab.toggle_hide_found(),
            KeyCode::Char('r') => {
                tab.hide_found = false;
                tab.sort = None;
                tab.presenter.load();
            }
            KeyCode::Char('/') => self.input_mode = InputMode::Search,
            _ => {}
        }
        false
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let tab = &mut self.tabs[self.active];
        match key.code {
            KeyCode::Enter => self.input_mode = InputMode::Browse,
            KeyCode::Esc => {
                tab.search.clear();
                self.input_mode = InputMode::Browse;
            }
            KeyCode::Backspace => {
                tab.search.pop();
            }
            KeyCode::Char(ch) => tab.search.push(ch),
            _ => {}
        }
        tab.selected = 0;
    }
}

fn draw_ui<S: FoundStore + 'static>(frame: &mut ratatui::Frame, browser: &Browser<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(browser), chunks[0]);
    if let Some(tab) = browser.tabs.get(browser.active) {
        draw_items(frame, tab, chunks[1]);
    }
    draw_footer(frame, browser, chunks[2]);
}

fn draw_header<S: FoundStore + 'static>(browser: &Browser<S>) -> Paragraph<'static> {
    let mut tabs = vec![Span::styled(
        "CRITTER GUIDE ",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    for (index, tab) in browser.tabs.iter().enumerate() {
        let style = if index == browser.active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        tabs.push(Span::raw(" "));
        tabs.push(Span::styled(format!(" {} ", tab.presenter.catalog().title()), style));
    }

    let summary = match browser.tabs.get(browser.active) {
        Some(tab) => {
            let found = tab.items.iter().filter(|item| item.found).count();
            let loading = if tab.presenter.state() == PresenterState::Loading {
                "  loading…"
            } else {
                ""
            };
            let sort = tab
                .sort
                .map(|key| key.to_string())
                .unwrap_or_else(|| "file order".to_string());
            let hide = if tab.hide_found { "on" } else { "off" };
            format!(
                "{found}/{} found   Sort: {sort}   Hide found: {hide}{loading}",
                tab.items.len()
            )
        }
        None => "no catalogs".to_string(),
    };

    Paragraph::new(vec![
        Line::from(tabs),
        Line::from(Span::styled(summary, Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Left)
    .block(Block::default().borders(Borders::BOTTOM))
}

fn draw_items<S: FoundStore + 'static>(frame: &mut ratatui::Frame, tab: &CatalogTab<S>, area: Rect) {
    let visible = tab.visible();
    let height = area.height as usize;
    let start = window_start(tab.selected, visible.len(), height);

    let mut lines = Vec::with_capacity(height);
    for (index, item) in visible.iter().enumerate().skip(start).take(height) {
        let mark = if item.found {
            Span::styled("✔ ", Style::default().fg(Color::Green))
        } else {
            Span::raw("  ")
        };
        let mut line = Line::from(vec![
            mark,
            Span::styled(
                format!("{:<22}", item.name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{:>6} Bells  ", item.price),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(format!("{}  ", item.availability())),
            Span::styled(item.location.clone(), Style::default().fg(Color::Gray)),
        ]);
        if index == tab.selected {
            line = line.style(Style::default().bg(Color::DarkGray));
        }
        lines.push(line);
    }
    if visible.is_empty() {
        let message = match tab.presenter.state() {
            PresenterState::Loading | PresenterState::Empty => "loading…",
            PresenterState::Loaded => "nothing matches",
        };
        lines.push(Line::from(Span::styled(
            message,
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_footer<S: FoundStore + 'static>(
    frame: &mut ratatui::Frame,
    browser: &Browser<S>,
    area: Rect,
) {
    let search = browser
        .tabs
        .get(browser.active)
        .map(|tab| tab.search.clone())
        .unwrap_or_default();
    let prefix_style = if browser.input_mode == InputMode::Search {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("/ ", prefix_style),
            Span::styled(search.clone(), Style::default().fg(Color::White)),
            Span::styled(
                format!("   {}", browser.status),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
    ];
    let block = Block::default().borders(Borders::TOP);
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if browser.input_mode == InputMode::Search {
        let cursor_x = area
            .x
            .saturating_add(2 + search.chars().count() as u16)
            .min(area.x.saturating_add(area.width.saturating_sub(1)));
        frame.set_cursor_position((cursor_x, area.y.saturating_add(1)));
    }
}

fn window_start(selected: usize, len: usize, height: usize) -> usize {
    if height == 0 || len <= height {
        return 0;
    }
    let max_start = len - height;
    selected.saturating_sub(height - 1).min(max_start)
}
