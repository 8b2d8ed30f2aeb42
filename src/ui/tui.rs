use crate::core::config::Config;
use crate::core::error::Result;
use crate::indexing::index::Index;
use crate::indexing::pipeline::Status;
use crate::search::engine::{highlight, search, suggest};
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::cursor;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use std::io;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

const TICK: Duration = Duration::from_millis(100);

/// Characters of verse text shown per result row
const SNIPPET_CHARS: usize = 160;

/// Characters kept ahead of the first match in a result row
const SNIPPET_LEAD_CHARS: usize = 40;

/// Full-screen overlay
#[derive(Debug, Clone, PartialEq, Eq)]
enum Popup {
    Verse(u32),
    FrontMatter,
}

/// Interactive TUI search interface
pub struct SearchTui {
    config: Config,
    index: Index,
    index_loaded: bool,
    status: Status,

    // Input state
    query: String,
    suggestions: Vec<String>,
    suggestion_selected: Option<usize>,
    search_mode: bool, // true = typing query, false = browsing results

    // Results state
    searched: String,
    results: Vec<u32>,
    summary: Option<String>,
    selected: usize,

    popup: Option<Popup>,
    popup_scroll: u16,
}

impl SearchTui {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            index: Index::default(),
            index_loaded: false,
            status: Status::Idle,
            query: String::new(),
            suggestions: Vec::new(),
            suggestion_selected: None,
            search_mode: true,
            searched: String::new(),
            results: Vec::new(),
            summary: None,
            selected: 0,
            popup: None,
            popup_scroll: 0,
        }
    }

    /// Queries are only served once the finished index has been installed.
    /// A `Ready` status alone may arrive before the index does.
    pub fn is_ready(&self) -> bool {
        self.index_loaded && self.status.is_ready()
    }

    /// Install the finished index and enable queries
    pub fn set_index(&mut self, index: Index) {
        self.index = index;
        self.index_loaded = true;
        self.status = Status::Ready;
        self.refresh_suggestions();
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Drive the terminal until the user quits. Ingestion runs elsewhere;
    /// its progress arrives through `status` and its result through `ingestion`.
    pub fn run(
        &mut self,
        mut status: watch::Receiver<Status>,
        mut ingestion: oneshot::Receiver<Result<Index>>,
    ) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        // Always restore terminal, even if we early-return with an error.
        struct TerminalRestore;
        impl Drop for TerminalRestore {
            fn drop(&mut self) {
                let _ = disable_raw_mode();
                let mut stdout = io::stdout();
                let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
            }
        }
        let _restore = TerminalRestore;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)?;
        let mut waiting = true;

        loop {
            if waiting {
                match ingestion.try_recv() {
                    Ok(Ok(index)) => {
                        self.set_index(index);
                        waiting = false;
                    }
                    Ok(Err(_)) | Err(oneshot::error::TryRecvError::Closed) => {
                        // The failure text is already on the status channel.
                        self.set_status(status.borrow_and_update().clone());
                        waiting = false;
                    }
                    Err(oneshot::error::TryRecvError::Empty) => {
                        self.set_status(status.borrow_and_update().clone());
                    }
                }
            }

            terminal.draw(|f| self.render(f))?;

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key) {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply one key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return true,
                KeyCode::Char('l') => {
                    self.open_popup(Popup::FrontMatter);
                    return false;
                }
                KeyCode::Char('u') if self.search_mode => {
                    self.query.clear();
                    self.refresh_suggestions();
                    return false;
                }
                _ => return false,
            }
        }

        if self.popup.is_some() {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.popup = None,
                KeyCode::Up => self.popup_scroll = self.popup_scroll.saturating_sub(1),
                KeyCode::Down => self.popup_scroll = self.popup_scroll.saturating_add(1),
                KeyCode::Char('q') => return true,
                _ => {}
            }
            return false;
        }

        if self.search_mode {
            match key.code {
                KeyCode::Esc => return true,
                KeyCode::Enter => {
                    if let Some(word) = self.selected_suggestion() {
                        self.query = word;
                    }
                    self.perform_search();
                }
                KeyCode::Tab => self.cycle_suggestion(),
                KeyCode::Down if !self.results.is_empty() => self.search_mode = false,
                KeyCode::Backspace => {
                    self.query.pop();
                    self.refresh_suggestions();
                }
                KeyCode::Char(c) => {
                    self.query.push(c);
                    self.refresh_suggestions();
                }
                _ => {}
            }
        } else {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return true,
                KeyCode::Up => {
                    if self.selected > 0 {
                        self.selected -= 1;
                    } else {
                        self.search_mode = true;
                    }
                }
                KeyCode::Down => {
                    if self.selected < self.results.len().saturating_sub(1) {
                        self.selected += 1;
                    }
                }
                KeyCode::Enter => {
                    if let Some(&id) = self.results.get(self.selected) {
                        self.open_popup(Popup::Verse(id));
                    }
                }
                KeyCode::Char('/') => self.search_mode = true,
                KeyCode::Char(c) => {
                    // Start a new query quickly by just typing
                    self.search_mode = true;
                    self.query.clear();
                    self.query.push(c);
                    self.refresh_suggestions();
                }
                _ => {}
            }
        }
        false
    }

    fn open_popup(&mut self, popup: Popup) {
        self.popup = Some(popup);
        self.popup_scroll = 0;
    }

    fn refresh_suggestions(&mut self) {
        self.suggestion_selected = None;
        self.suggestions = if self.is_ready() {
            suggest(&self.index, &self.query, &self.config.limits)
                .into_iter()
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };
    }

    fn cycle_suggestion(&mut self) {
        if self.suggestions.is_empty() {
            return;
        }
        self.suggestion_selected = Some(match self.suggestion_selected {
            Some(i) => (i + 1) % self.suggestions.len(),
            None => 0,
        });
    }

    fn selected_suggestion(&self) -> Option<String> {
        self.suggestion_selected
            .and_then(|i| self.suggestions.get(i))
            .cloned()
    }

    fn perform_search(&mut self) {
        if !self.is_ready() {
            return;
        }
        let Some(results) = search(&self.index, &self.query, &self.config.limits) else {
            return;
        };

        self.summary = Some(results.summary());
        self.results = results.units.iter().map(|unit| unit.id).collect();
        self.searched = self.query.clone();
        self.selected = 0;
        self.suggestions.clear();
        self.suggestion_selected = None;
        self.search_mode = self.results.is_empty();
    }

    fn render(&self, f: &mut Frame) {
        let size = f.size();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Length(3), // Search bar
                Constraint::Length(3), // Suggestions
                Constraint::Min(0),    // Results
                Constraint::Length(2), // Footer
            ])
            .split(size);

        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                "versefind",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(self.status.to_string(), status_style(&self.status)),
        ]));
        f.render_widget(title, chunks[0]);

        self.render_search_bar(f, chunks[1]);
        self.render_suggestions(f, chunks[2]);
        self.render_results(f, chunks[3]);
        render_footer(f, chunks[4], self.search_mode);

        if let Some(popup) = &self.popup {
            self.render_popup(f, popup, size);
        }
    }

    fn render_search_bar(&self, f: &mut Frame, area: Rect) {
        let border = if self.search_mode {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let mut spans = vec![Span::raw(self.query.clone())];
        if self.search_mode {
            spans.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
        }
        let bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title("Search"),
        );
        f.render_widget(bar, area);
    }

    fn render_suggestions(&self, f: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for (i, word) in self.suggestions.iter().enumerate() {
            let style = if Some(i) == self.suggestion_selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::Cyan)
            };
            spans.push(Span::styled(format!(" {} ", word), style));
            spans.push(Span::raw(" "));
        }
        let pills = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title("Suggestions (Tab)"),
        );
        f.render_widget(pills, area);
    }

    fn render_results(&self, f: &mut Frame, area: Rect) {
        let title = self.summary.clone().unwrap_or_else(|| "Results".to_string());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title);

        if self.results.is_empty() {
            let placeholder = if self.is_ready() {
                "Type a word or phrase and press Enter."
            } else {
                "Waiting for the text to load…"
            };
            let para = Paragraph::new(placeholder)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(para, area);
            return;
        }

        let items: Vec<ListItem> = self
            .results
            .iter()
            .filter_map(|&id| self.index.unit(id))
            .map(|unit| {
                let snippet = snippet_around_match(&unit.text, &self.searched);
                let mut snippet_line = vec![Span::raw("  ")];
                snippet_line.extend(highlighted_spans(&snippet, &self.searched));
                ListItem::new(Text::from(vec![
                    Line::from(Span::styled(
                        unit.reference.clone(),
                        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(snippet_line),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray));

        let mut state = ListState::default();
        if !self.search_mode {
            state.select(Some(self.selected));
        }
        f.render_stateful_widget(list, area, &mut state);
    }

    fn render_popup(&self, f: &mut Frame, popup: &Popup, size: Rect) {
        let (title, body) = match popup {
            Popup::Verse(id) => match self.index.unit(*id) {
                Some(unit) => (
                    unit.reference.clone(),
                    Text::from(Line::from(highlighted_spans(&unit.text, &self.searched))),
                ),
                None => return,
            },
            Popup::FrontMatter => (
                "Front matter".to_string(),
                Text::from(self.index.front_matter().to_string()),
            ),
        };

        let area = centered_rect(80, 70, size);
        f.render_widget(Clear, area);
        let para = Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .scroll((self.popup_scroll, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(title),
            );
        f.render_widget(para, area);
    }
}

/// Window of at most `SNIPPET_CHARS` characters that contains the first
/// match, marked with an ellipsis on each side where text was cut
fn snippet_around_match(text: &str, query: &str) -> String {
    let total = text.chars().count();
    if total <= SNIPPET_CHARS {
        return text.to_string();
    }

    let fragments = highlight(text, query);
    let match_char = if fragments.iter().any(|fragment| fragment.emphasized) {
        fragments
            .iter()
            .take_while(|fragment| !fragment.emphasized)
            .map(|fragment| fragment.text.chars().count())
            .sum::<usize>()
    } else {
        0
    };

    let start = match_char
        .saturating_sub(SNIPPET_LEAD_CHARS)
        .min(total - SNIPPET_CHARS);
    let end = start + SNIPPET_CHARS;

    let mut snippet = String::new();
    if start > 0 {
        snippet.push('…');
    }
    snippet.extend(text.chars().skip(start).take(SNIPPET_CHARS));
    if end < total {
        snippet.push('…');
    }
    snippet
}

fn highlighted_spans(text: &str, query: &str) -> Vec<Span<'static>> {
    highlight(text, query)
        .into_iter()
        .map(|fragment| {
            if fragment.emphasized {
                Span::styled(
                    fragment.text.to_string(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(fragment.text.to_string())
            }
        })
        .collect()
}

fn status_style(status: &Status) -> Style {
    match status {
        Status::Ready => Style::default().fg(Color::Green),
        Status::Failed(_) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        _ => Style::default().fg(Color::DarkGray),
    }
}

fn render_footer(f: &mut Frame, area: Rect, search_mode: bool) {
    let key = |k: &'static str| {
        Span::styled(k, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    };
    let spans = if search_mode {
        vec![
            key("Enter"),
            Span::raw(": Search | "),
            key("Tab"),
            Span::raw(": Suggestion | "),
            key("↓"),
            Span::raw(": Results | "),
            key("Ctrl+L"),
            Span::raw(": Front matter | "),
            key("Esc"),
            Span::raw(": Quit"),
        ]
    } else {
        vec![
            key("↑↓"),
            Span::raw(": Navigate | "),
            key("Enter"),
            Span::raw(": Open | "),
            key("/"),
            Span::raw(": Edit query | "),
            key("Ctrl+L"),
            Span::raw(": Front matter | "),
            key("q"),
            Span::raw(": Quit"),
        ]
    };
    let footer = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP).border_style(Style::default().fg(Color::DarkGray)));
    f.render_widget(footer, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}
