use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use finance_tracker::{SummaryReport, Tracker, TrackerError};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Description,
    Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddForm {
    pub description: String,
    pub amount: String,
    pub focus: Field,
}

impl AddForm {
    fn new() -> Self {
        Self {
            description: String::new(),
            amount: String::new(),
            focus: Field::Description,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Description => &mut self.description,
            Field::Amount => &mut self.amount,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Description => Field::Amount,
            Field::Amount => Field::Description,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Browse,
    Add(AddForm),
    Summary(SummaryReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub tracker: Tracker,
    pub state: TableState,
    pub mode: Mode,
    pub message: Option<Message>,
    seen_revision: u64,
}

impl App {
    pub fn new(tracker: Tracker) -> Self {
        let mut state = TableState::default();
        if !tracker.ledger().is_empty() {
            state.select(Some(0));
        }
        let seen_revision = tracker.ledger().revision();

        Self {
            tracker,
            state,
            mode: Mode::Browse,
            message: None,
            seen_revision,
        }
    }

    fn len(&self) -> usize {
        self.tracker.ledger().len()
    }

    /// Id of the highlighted row, if any.
    pub fn selected_id(&self) -> Option<u64> {
        self.state
            .selected()
            .and_then(|i| self.tracker.ledger().transactions().get(i))
            .map(|tx| tx.id)
    }

    /// Keep the selection valid after the ledger changed under it.
    fn refresh_if_changed(&mut self) {
        let revision = self.tracker.ledger().revision();
        if revision == self.seen_revision {
            return;
        }
        self.seen_revision = revision;

        let len = self.len();
        let selected = match self.state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.state.select(selected);
    }

    fn info(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            is_error: false,
        });
    }

    fn error(&mut self, err: &TrackerError) {
        if !err.is_user_error() {
            tracing::error!("{err}");
        }
        self.message = Some(Message {
            text: err.to_string(),
            is_error: true,
        });
    }

    pub fn next(&mut self) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + PAGE_SIZE).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.len() == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(PAGE_SIZE));
        self.state.select(Some(i));
    }

    pub fn add_from_form(&mut self, form: &AddForm) -> bool {
        match self.tracker.add(&form.description, &form.amount) {
            Ok(tx) => {
                let amount = self.tracker.money(tx.amount);
                self.info(format!("Added #{} {}", tx.id, amount));
                self.refresh_if_changed();
                self.state.select(Some(self.len() - 1));
                true
            }
            Err(err) => {
                self.error(&err);
                false
            }
        }
    }

    pub fn delete_selected(&mut self) {
        match self.tracker.delete_selected(self.selected_id()) {
            Ok(tx) => {
                self.info(format!("Deleted #{} {}", tx.id, tx.description));
                self.refresh_if_changed();
            }
            Err(err) => self.error(&err),
        }
    }

    pub fn save(&mut self) {
        match self.tracker.save() {
            Ok(confirmation) => self.info(confirmation),
            Err(err) => self.error(&err),
        }
    }

    pub fn reload(&mut self) {
        match self.tracker.reload() {
            Ok(confirmation) => {
                self.info(confirmation);
                self.refresh_if_changed();
            }
            Err(err) => self.error(&err),
        }
    }

    /// Apply one key press. Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => return self.handle_browse_key(key),
            Mode::Summary(report) => {
                if !matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('i') | KeyCode::Char('q')) {
                    self.mode = Mode::Summary(report);
                }
            }
            Mode::Add(mut form) => match key.code {
                KeyCode::Esc => self.info("Add cancelled"),
                KeyCode::Tab | KeyCode::BackTab => {
                    form.toggle_focus();
                    self.mode = Mode::Add(form);
                }
                KeyCode::Enter if form.focus == Field::Description => {
                    form.focus = Field::Amount;
                    self.mode = Mode::Add(form);
                }
                KeyCode::Enter => {
                    // Keep the form open so the amount can be fixed
                    if !self.add_from_form(&form) {
                        self.mode = Mode::Add(form);
                    }
                }
                KeyCode::Backspace => {
                    form.focused_mut().pop();
                    self.mode = Mode::Add(form);
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    form.focused_mut().push(c);
                    self.mode = Mode::Add(form);
                }
                _ => self.mode = Mode::Add(form),
            },
        }
        false
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('a') => {
                self.message = None;
                self.mode = Mode::Add(AddForm::new());
            }
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('s') => self.save(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('i') => self.mode = Mode::Summary(self.tracker.summary_report()),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home if self.len() > 0 => self.state.select(Some(0)),
            KeyCode::End if self.len() > 0 => self.state.select(Some(self.len() - 1)),
            _ => {}
        }
        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Balance header
            Constraint::Min(0),    // Transactions
            Constraint::Length(3), // Message + key hints
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_table(f, chunks[1], app);
    render_status_bar(f, chunks[2], app);

    match &app.mode {
        Mode::Browse => {}
        Mode::Add(form) => render_add_form(f, form),
        Mode::Summary(report) => render_summary(f, report),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let balance = app.tracker.ledger().balance();
    let color = if balance.is_sign_negative() && !balance.is_zero() {
        Color::Red
    } else {
        Color::Green
    };

    let spans = vec![
        Span::styled(
            app.tracker.balance_text(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Transactions: {}", app.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            app.tracker.store().path().display().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Finance Tracker "),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Id", "Description", "Amount", "Date"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.tracker.ledger().transactions().iter().map(|tx| {
        let color = if tx.is_income() {
            Color::Green
        } else if tx.is_expense() {
            Color::Red
        } else {
            Color::White
        };

        Row::new(vec![
            Cell::from(tx.id.to_string()),
            Cell::from(truncate(&tx.description, 40)),
            Cell::from(app.tracker.money(tx.amount)).style(Style::default().fg(color)),
            Cell::from(tx.date.format("%d.%m.%Y %H:%M").to_string()),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Min(20),
            Constraint::Length(16),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Transactions "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = Vec::new();

    if let Some(message) = &app.message {
        let color = if message.is_error { Color::Red } else { Color::Green };
        status_spans.push(Span::styled(format!(" {} ", message.text), Style::default().fg(color)));
        status_spans.push(Span::raw(" | "));
    }

    for (key, label) in [("a", " Add | "), ("d", " Delete | "), ("s", " Save | "), ("r", " Reload | "), ("i", " Income/Expense | ")] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_add_form(f: &mut Frame, form: &AddForm) {
    let area = centered_rect(60, 9, f.size());
    f.render_widget(Clear, area);

    let field = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let cursor = if focused { "▏" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:<13}"), style),
            Span::raw(format!("{value}{cursor}")),
        ])
    };

    let lines = vec![
        Line::from(""),
        field("Description:", &form.description, form.focus == Field::Description),
        Line::from(""),
        field("Amount:", &form.amount, form.focus == Field::Amount),
        Line::from(""),
        Line::from(Span::styled(
            "Enter next/submit | Tab switch | Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Add Transaction "),
    );
    f.render_widget(popup, area);
}

fn render_summary(f: &mut Frame, report: &SummaryReport) {
    let area = centered_rect(50, 8, f.size());
    f.render_widget(Clear, area);

    let [income, expense, net] = report.lines();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(income, Style::default().fg(Color::Green))),
        Line::from(Span::styled(expense, Style::default().fg(Color::Red))),
        Line::from(Span::styled(net, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("Esc close", Style::default().fg(Color::DarkGray))),
    ];

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Income / Expense "),
    );
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let width = (u32::from(r.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
