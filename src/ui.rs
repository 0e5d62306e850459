use crate::conclusion::{conclude, format_amount};
use crate::config::DashboardConfig;
use crate::error::EmptyState;
use crate::report::{self, DateRange, PartyFilter, Report, ReportMode, ReportQuery, ReportRows};
use crate::session::{Session, EMPTY_NAME_WARNING};
use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, List,
        ListItem, Paragraph, Row, Table, Wrap,
    },
    Frame, Terminal,
};
use std::io;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Menu,
    From,
    To,
    Party,
}

/// What the content area currently shows.
#[derive(Debug, Clone)]
pub enum Outcome {
    NotLoaded,
    Ready {
        report: Report,
        conclusion: Option<String>,
    },
    Empty(EmptyState),
    Failed(String),
}

pub struct App {
    config: DashboardConfig,
    pub screen: Screen,
    pub session: Option<Session>,
    pub name_input: String,
    pub warning: Option<String>,
    pub mode: ReportMode,
    pub focus: Focus,
    pub ledger_range: DateRange,
    pub receivables_range: DateRange,
    pub from_input: String,
    pub to_input: String,
    /// Members of the receivables table; index 0 of the selector is "Todos"
    pub parties: Vec<String>,
    pub party_index: usize,
    pub outcome: Outcome,
}

impl App {
    pub fn new(config: DashboardConfig) -> Self {
        let ledger_range = config.ledger_range;
        let receivables_range = config.receivables_range;

        let mut app = Self {
            config,
            screen: Screen::Welcome,
            session: None,
            name_input: String::new(),
            warning: None,
            mode: ReportMode::MonthlyTotals,
            focus: Focus::Menu,
            ledger_range,
            receivables_range,
            from_input: String::new(),
            to_input: String::new(),
            parties: Vec::new(),
            party_index: 0,
            outcome: Outcome::NotLoaded,
        };
        app.sync_date_inputs();
        app
    }

    pub fn current_range(&self) -> DateRange {
        match self.mode {
            ReportMode::MemberIncome => self.receivables_range,
            _ => self.ledger_range,
        }
    }

    pub fn party_filter(&self) -> PartyFilter {
        match self.party_index {
            0 => PartyFilter::All,
            i => self
                .parties
                .get(i - 1)
                .map(|p| PartyFilter::Member(p.clone()))
                .unwrap_or_default(),
        }
    }

    pub fn current_query(&self) -> ReportQuery {
        ReportQuery::new(self.mode, self.current_range(), self.party_filter())
    }

    /// Re-run the current report from scratch.
    pub fn refresh(&mut self) {
        let query = self.current_query();

        self.outcome = match report::run_report(&self.config, &query) {
            Ok(report) if report.is_empty() => Outcome::Empty(EmptyState::NoDataInRange),
            Ok(report) => {
                let conclusion = conclude(&report);
                Outcome::Ready { report, conclusion }
            }
            Err(err) => match err.empty_state() {
                Some(state) => Outcome::Empty(state),
                None => {
                    error!(error = %err, mode = %self.mode, "report failed");
                    Outcome::Failed(err.to_string())
                }
            },
        };
    }

    fn load_parties(&mut self) {
        self.parties = match report::list_parties(&self.config) {
            Ok(parties) => parties,
            Err(err) => {
                info!(error = %err, "member list unavailable");
                Vec::new()
            }
        };
        if self.party_index > self.parties.len() {
            self.party_index = 0;
        }
    }

    pub fn submit_name(&mut self) {
        match Session::start(&self.name_input) {
            Some(session) => {
                info!(viewer = session.name(), "session started");
                self.session = Some(session);
                self.warning = None;
                self.screen = Screen::Dashboard;
                self.refresh();
            }
            None => self.warning = Some(EMPTY_NAME_WARNING.to_string()),
        }
    }

    pub fn select_mode(&mut self, mode: ReportMode) {
        if self.mode == mode && !matches!(self.outcome, Outcome::NotLoaded) {
            return;
        }
        self.mode = mode;
        self.warning = None;
        if mode == ReportMode::MemberIncome {
            self.load_parties();
        }
        self.sync_date_inputs();
        self.refresh();
    }

    fn sync_date_inputs(&mut self) {
        let range = self.current_range();
        self.from_input = range.start.format("%Y-%m-%d").to_string();
        self.to_input = range.end.format("%Y-%m-%d").to_string();
    }

    /// Parse the From/To inputs and re-run on success.
    pub fn apply_dates(&mut self) {
        let parse = |s: &str| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d");

        match (parse(&self.from_input), parse(&self.to_input)) {
            (Ok(start), Ok(end)) => {
                let range = DateRange::new(start, end);
                match self.mode {
                    ReportMode::MemberIncome => self.receivables_range = range,
                    _ => self.ledger_range = range,
                }
                self.warning = None;
                self.refresh();
            }
            _ => self.warning = Some("Dates must be written as YYYY-MM-DD.".to_string()),
        }
    }

    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Menu => Focus::From,
            Focus::From => Focus::To,
            Focus::To if self.mode == ReportMode::MemberIncome => Focus::Party,
            Focus::To | Focus::Party => Focus::Menu,
        };
    }

    pub fn previous_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Menu if self.mode == ReportMode::MemberIncome => Focus::Party,
            Focus::Menu => Focus::To,
            Focus::From => Focus::Menu,
            Focus::To => Focus::From,
            Focus::Party => Focus::To,
        };
    }

    fn cycle_party(&mut self, forward: bool) {
        let options = self.parties.len() + 1;
        self.party_index = if forward {
            (self.party_index + 1) % options
        } else {
            (self.party_index + options - 1) % options
        };
        self.refresh();
    }

    /// Handle one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.screen {
            Screen::Welcome => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Enter => self.submit_name(),
                KeyCode::Backspace => {
                    self.name_input.pop();
                }
                KeyCode::Char(c) => self.name_input.push(c),
                _ => {}
            },
            Screen::Dashboard => match (self.focus, key.code) {
                (_, KeyCode::Char('q')) => return true,
                (Focus::Menu, KeyCode::Esc) => return true,
                (_, KeyCode::Esc) => {
                    self.sync_date_inputs();
                    self.focus = Focus::Menu;
                }
                (_, KeyCode::Tab) => self.next_focus(),
                (_, KeyCode::BackTab) => self.previous_focus(),
                (Focus::Menu, KeyCode::Char('1')) => self.select_mode(ReportMode::MonthlyTotals),
                (Focus::Menu, KeyCode::Char('2')) => self.select_mode(ReportMode::TopExpenses),
                (Focus::Menu, KeyCode::Char('3')) => self.select_mode(ReportMode::MemberIncome),
                (Focus::Menu, KeyCode::Down | KeyCode::Char('j')) => self.select_mode(self.mode.next()),
                (Focus::Menu, KeyCode::Up | KeyCode::Char('k')) => self.select_mode(self.mode.previous()),
                (Focus::Menu, KeyCode::Char('r')) => self.refresh(),
                (Focus::From | Focus::To, KeyCode::Enter) => self.apply_dates(),
                (Focus::From | Focus::To, KeyCode::Backspace) => {
                    self.date_input_mut().pop();
                }
                (Focus::From | Focus::To, KeyCode::Char(c)) if c.is_ascii_digit() || c == '-' => {
                    let input = self.date_input_mut();
                    if input.len() < 10 {
                        input.push(c);
                    }
                }
                (Focus::Party, KeyCode::Right | KeyCode::Down) => self.cycle_party(true),
                (Focus::Party, KeyCode::Left | KeyCode::Up) => self.cycle_party(false),
                _ => {}
            },
        }
        false
    }

    fn date_input_mut(&mut self) -> &mut String {
        match self.focus {
            Focus::To => &mut self.to_input,
            _ => &mut self.from_input,
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "dashboard loop failed");
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    match app.screen {
        Screen::Welcome => render_welcome(f, f.size(), app),
        Screen::Dashboard => render_dashboard(f, app),
    }
}

// ============================================================================
// WELCOME
// ============================================================================

fn render_welcome(f: &mut Frame, area: Rect, app: &App) {
    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Cooperative Financial Dashboard",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  With this dashboard you can explore the association's income and expenses.",
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Enter your name: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{}_", app.name_input),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
    ];

    if let Some(warning) = &app.warning {
        content.push(Line::from(Span::styled(
            format!("  ⚠ {}", warning),
            Style::default().fg(Color::Yellow),
        )));
        content.push(Line::from(""));
    }

    content.push(Line::from(vec![
        Span::styled("  Enter", Style::default().fg(Color::Yellow)),
        Span::styled(" to continue, ", Style::default().fg(Color::DarkGray)),
        Span::styled("Esc", Style::default().fg(Color::Red)),
        Span::styled(" to quit", Style::default().fg(Color::DarkGray)),
    ]));

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Welcome "),
    );

    f.render_widget(paragraph, area);
}

// ============================================================================
// DASHBOARD
// ============================================================================

fn render_dashboard(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Sidebar + report
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(0)])
        .split(chunks[1]);

    render_menu(f, body[0], app);

    let report_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Controls
            Constraint::Min(8),    // Chart + table
            Constraint::Length(5), // Conclusion
        ])
        .split(body[1]);

    render_controls(f, report_area[0], app);
    render_report(f, report_area[1], app);
    render_conclusion(f, report_area[2], app);

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let greeting = app
        .session
        .as_ref()
        .map(|s| s.greeting())
        .unwrap_or_default();

    let header = Paragraph::new(Line::from(vec![
        Span::styled(greeting, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw("  |  "),
        Span::styled(app.mode.title(), Style::default().fg(Color::White)),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_menu(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = ReportMode::ALL
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let selected = *mode == app.mode;
            let marker = if selected { "→ " } else { "  " };
            let style = if selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{}", i + 1), Style::default().fg(Color::Yellow)),
                Span::styled(format!(". {}", mode.title()), style),
            ]))
        })
        .collect();

    let border = if app.focus == Focus::Menu { Color::Yellow } else { Color::White };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Select a query "),
    );

    f.render_widget(list, area);
}

fn render_controls(f: &mut Frame, area: Rect, app: &App) {
    let field = |label: &str, value: String, focus: Focus| {
        let style = if app.focus == focus {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        vec![
            Span::styled(format!(" {}: ", label), Style::default().fg(Color::Cyan)),
            Span::styled(format!(" {} ", value), style),
        ]
    };

    let mut spans = field("From", app.from_input.clone(), Focus::From);
    spans.push(Span::raw("   "));
    spans.extend(field("To", app.to_input.clone(), Focus::To));

    if app.mode == ReportMode::MemberIncome {
        spans.push(Span::raw("   "));
        spans.extend(field("Member", format!("◀ {} ▶", app.party_filter().label()), Focus::Party));
    }

    if let Some(warning) = &app.warning {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(format!("⚠ {}", warning), Style::default().fg(Color::Yellow)));
    }

    let controls = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::White)));

    f.render_widget(controls, area);
}

fn render_report(f: &mut Frame, area: Rect, app: &App) {
    let (report, title) = match &app.outcome {
        Outcome::Ready { report, .. } => (report, chart_title(report)),
        Outcome::NotLoaded => {
            render_message(f, area, "Loading...", Color::DarkGray);
            return;
        }
        Outcome::Empty(state) => {
            // Missing sources are errors for the viewer; an empty range is just a warning
            let color = match state {
                EmptyState::NoDataInRange => Color::Yellow,
                _ => Color::Red,
            };
            render_message(f, area, state.message(), color);
            return;
        }
        Outcome::Failed(message) => {
            render_message(f, area, &format!("Report failed: {}", message), Color::Red);
            return;
        }
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    match &report.rows {
        ReportRows::MonthlyTotals(rows) => {
            let groups: Vec<(String, u64, u64)> = rows
                .iter()
                .map(|r| (r.month.clone(), bar_value(r.inflow), bar_value(r.outflow)))
                .collect();
            render_grouped_bars(f, columns[0], &title, &groups);
        }
        ReportRows::TopExpenses(rows) => {
            let bars: Vec<(String, u64)> = rows
                .iter()
                .map(|r| (r.detail.clone(), bar_value(r.outflow)))
                .collect();
            render_bars(f, columns[0], &title, &bars, Color::Red);
        }
        ReportRows::MemberTotals(rows) => {
            let bars: Vec<(String, u64)> = rows
                .iter()
                .map(|r| (r.party.clone(), bar_value(r.inflow)))
                .collect();
            render_bars(f, columns[0], &title, &bars, Color::Green);
        }
        ReportRows::MemberTimeline(rows) => {
            let points: Vec<(NaiveDate, f64)> = rows.iter().map(|r| (r.date, r.inflow)).collect();
            render_timeline(f, columns[0], &title, &points);
        }
    }

    render_table(f, columns[1], report);
}

fn chart_title(report: &Report) -> String {
    match &report.query {
        ReportQuery::MonthlyTotals { .. } => " Monthly income vs expenses (all cashbooks) ".to_string(),
        ReportQuery::TopExpenses { .. } => " Top 10 expense concepts (all cashbooks) ".to_string(),
        ReportQuery::MemberIncome { party: PartyFilter::All, .. } => " Total income by member ".to_string(),
        ReportQuery::MemberIncome { party, .. } => format!(" Income of {} over time ", party.label()),
    }
}

// Bars are drawn in whole units; negative amounts render as empty bars
fn bar_value(amount: f64) -> u64 {
    if amount.is_finite() && amount > 0.0 {
        amount.round() as u64
    } else {
        0
    }
}

fn render_grouped_bars(f: &mut Frame, area: Rect, title: &str, groups: &[(String, u64, u64)]) {
    let mut chart = BarChart::default()
        .block(chart_block(title))
        .bar_width(3)
        .bar_gap(0)
        .group_gap(2);

    for (month, inflow, outflow) in groups {
        let bars = [
            Bar::default()
                .value(*inflow)
                .text_value(String::new())
                .style(Style::default().fg(Color::Green)),
            Bar::default()
                .value(*outflow)
                .text_value(String::new())
                .style(Style::default().fg(Color::Red)),
        ];
        chart = chart.data(BarGroup::default().label(Line::from(month.clone())).bars(&bars));
    }

    f.render_widget(chart, area);
}

fn render_bars(f: &mut Frame, area: Rect, title: &str, bars: &[(String, u64)], color: Color) {
    let bars: Vec<Bar> = bars
        .iter()
        .map(|(label, value)| {
            Bar::default()
                .label(Line::from(truncate(label, 18)))
                .value(*value)
                .text_value(format_amount(*value as f64))
                .style(Style::default().fg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(chart_block(title))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));

    f.render_widget(chart, area);
}

fn render_timeline(f: &mut Frame, area: Rect, title: &str, points: &[(NaiveDate, f64)]) {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return;
    };

    let data: Vec<(f64, f64)> = points
        .iter()
        .map(|(date, inflow)| ((*date - first.0).num_days() as f64, *inflow))
        .collect();
    let x_max = data.last().map(|p| p.0).unwrap_or(0.0).max(1.0);
    let y_max = data.iter().map(|p| p.1).fold(0.0_f64, f64::max).max(1.0);

    let datasets = vec![Dataset::default()
        .name("income")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&data)];

    let chart = Chart::new(datasets)
        .block(chart_block(title))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::raw(first.0.to_string()),
                    Span::raw(last.0.to_string()),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, y_max])
                .labels(vec![Span::raw("0"), Span::raw(format_amount(y_max))]),
        );

    f.render_widget(chart, area);
}

fn render_table(f: &mut Frame, area: Rect, report: &Report) {
    let (headers, rows): (Vec<&str>, Vec<Vec<String>>) = match &report.rows {
        ReportRows::MonthlyTotals(rows) => (
            vec!["Month", "Income", "Expenses"],
            rows.iter()
                .map(|r| vec![r.month.clone(), format_amount(r.inflow), format_amount(r.outflow)])
                .collect(),
        ),
        ReportRows::TopExpenses(rows) => (
            vec!["Concept", "Total"],
            rows.iter()
                .map(|r| vec![truncate(&r.detail, 20), format_amount(r.outflow)])
                .collect(),
        ),
        ReportRows::MemberTotals(rows) => (
            vec!["Member", "Income"],
            rows.iter()
                .map(|r| vec![truncate(&r.party, 20), format_amount(r.inflow)])
                .collect(),
        ),
        ReportRows::MemberTimeline(rows) => (
            vec!["Date", "Income"],
            rows.iter()
                .map(|r| vec![r.date.to_string(), format_amount(r.inflow)])
                .collect(),
        ),
    };

    let header_cells = headers.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let widths: Vec<Constraint> = headers
        .iter()
        .enumerate()
        .map(|(i, _)| if i == 0 { Constraint::Length(22) } else { Constraint::Length(12) })
        .collect();

    let table = Table::new(rows.into_iter().map(|cells| Row::new(cells).height(1)), widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Data ({} from {}) ", report.len(), report.sources.join(", "))),
        );

    f.render_widget(table, area);
}

fn render_conclusion(f: &mut Frame, area: Rect, app: &App) {
    let line = match &app.outcome {
        Outcome::Ready { conclusion: Some(text), .. } => emphasis_line(text),
        _ => Line::from(Span::styled("-", Style::default().fg(Color::DarkGray))),
    };

    let paragraph = Paragraph::new(line).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Conclusion "),
    );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![
        Span::styled("1-3", Style::default().fg(Color::Yellow)),
        Span::raw(" Query | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Field | "),
    ];

    match app.focus {
        Focus::From | Focus::To => {
            status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Apply dates | "));
            status_spans.push(Span::styled("Esc", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Cancel | "));
        }
        Focus::Party => {
            status_spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Member | "));
        }
        Focus::Menu => {
            status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Nav | "));
            status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Reload | "));
        }
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

fn render_message(f: &mut Frame, area: Rect, message: &str, color: Color) {
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", message), Style::default().fg(color))),
    ])
    .wrap(Wrap { trim: false })
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));

    f.render_widget(paragraph, area);
}

fn chart_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

/// Render `**bold**` runs of a conclusion as bold spans.
fn emphasis_line(text: &str) -> Line<'static> {
    let spans: Vec<Span<'static>> = text
        .split("**")
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            if i % 2 == 1 {
                Span::styled(part.to_string(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            } else {
                Span::raw(part.to_string())
            }
        })
        .collect();
    Line::from(spans)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
