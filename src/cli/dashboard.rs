//! Interactive dashboard using ratatui
//!
//! A sidebar of filter controls beside the current page. Every change to the
//! filter reruns filter -> aggregate -> render on the prepared table.

use std::io::{self, stdout};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use polars::prelude::DataFrame;
use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Tabs,
    },
};

use crate::pipeline::filter::{CategoryDimension, FilterOptions, FilterSession, FilterSpec};
use crate::report::pages::{compute_page, PageKind};
use crate::report::render::render_page;

/// Step of one `+`/`-` press on an age bound, in years
pub const AGE_STEP: f64 = 1.0;
/// Step of one `+`/`-` press on an income bound
pub const INCOME_STEP: f64 = 10_000.0;

const PAGE_SCROLL: u16 = 10;

/// One row of the filter sidebar
#[derive(Debug, Clone, PartialEq)]
pub enum FilterItem {
    Level {
        dimension: CategoryDimension,
        value: String,
    },
    AgeMin,
    AgeMax,
    IncomeMin,
    IncomeMax,
}

/// What the event loop must do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// The page or scroll position changed
    Redraw,
    /// The filter changed
    Refilter,
    Quit,
}

/// Dashboard state, independent of the terminal
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub options: FilterOptions,
    pub spec: FilterSpec,
    pub items: Vec<FilterItem>,
    pub cursor: usize,
    pub page: usize,
    pub scroll: u16,
}

impl DashboardState {
    pub fn new(options: FilterOptions, spec: FilterSpec) -> Self {
        let mut items = Vec::new();
        for dimension in CategoryDimension::ALL {
            for value in options.levels(dimension) {
                items.push(FilterItem::Level {
                    dimension,
                    value: value.clone(),
                });
            }
        }
        items.extend([
            FilterItem::AgeMin,
            FilterItem::AgeMax,
            FilterItem::IncomeMin,
            FilterItem::IncomeMax,
        ]);

        Self {
            options,
            spec,
            items,
            cursor: 0,
            page: 0,
            scroll: 0,
        }
    }

    pub fn page_kind(&self) -> PageKind {
        PageKind::ALL[self.page % PageKind::ALL.len()]
    }

    pub fn current_item(&self) -> Option<&FilterItem> {
        self.items.get(self.cursor)
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Action {
        let pages = PageKind::ALL.len();
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
            KeyCode::Tab | KeyCode::Right => {
                self.page = (self.page + 1) % pages;
                self.scroll = 0;
                Action::Redraw
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.page = (self.page + pages - 1) % pages;
                self.scroll = 0;
                Action::Redraw
            }
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                Action::Redraw
            }
            KeyCode::Down => {
                if self.cursor + 1 < self.items.len() {
                    self.cursor += 1;
                }
                Action::Redraw
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(PAGE_SCROLL);
                Action::Redraw
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(PAGE_SCROLL);
                Action::Redraw
            }
            KeyCode::Char(' ') | KeyCode::Enter => match self.current_item().cloned() {
                Some(FilterItem::Level { dimension, value }) => {
                    self.spec.toggle(dimension, &value);
                    Action::Refilter
                }
                _ => Action::None,
            },
            KeyCode::Char('a') => self.set_dimension(true),
            KeyCode::Char('n') => self.set_dimension(false),
            KeyCode::Char('+') | KeyCode::Char('=') => self.step_bound(1.0),
            KeyCode::Char('-') => self.step_bound(-1.0),
            KeyCode::Char('r') => {
                self.spec = FilterSpec::select_all(&self.options);
                Action::Refilter
            }
            _ => Action::None,
        }
    }

    /// Select every level (or none) of the dimension under the cursor.
    fn set_dimension(&mut self, all: bool) -> Action {
        let Some(FilterItem::Level { dimension, .. }) = self.current_item().cloned() else {
            return Action::None;
        };
        let levels = self.options.levels(dimension).to_vec();
        let selected = self.spec.values_mut(dimension);
        selected.clear();
        if all {
            selected.extend(levels);
        }
        Action::Refilter
    }

    /// Move the bound under the cursor by one step, staying inside the
    /// observed range and never crossing the other bound.
    fn step_bound(&mut self, direction: f64) -> Action {
        let item = self.current_item().cloned();
        let (range, observed, step, is_min) = match item {
            Some(FilterItem::AgeMin) => (&mut self.spec.age, self.options.age, AGE_STEP, true),
            Some(FilterItem::AgeMax) => (&mut self.spec.age, self.options.age, AGE_STEP, false),
            Some(FilterItem::IncomeMin) => {
                (&mut self.spec.income, self.options.income, INCOME_STEP, true)
            }
            Some(FilterItem::IncomeMax) => {
                (&mut self.spec.income, self.options.income, INCOME_STEP, false)
            }
            _ => return Action::None,
        };
        let Some(observed) = observed else {
            return Action::None;
        };
        if !(range.min.is_finite() && range.max.is_finite()) {
            return Action::None;
        }

        let before = *range;
        if is_min {
            range.min = (range.min + direction * step).max(observed.min).min(range.max);
        } else {
            range.max = (range.max + direction * step).min(observed.max).max(range.min);
        }
        if *range == before {
            Action::None
        } else {
            Action::Refilter
        }
    }

    fn item_label(&self, item: &FilterItem) -> String {
        let bound = |v: f64| {
            if v.is_finite() {
                format!("{:.0}", v)
            } else {
                "-".to_string()
            }
        };
        match item {
            FilterItem::Level { dimension, value } => {
                let mark = if self.spec.values(*dimension).contains(value) {
                    "[x]"
                } else {
                    "[ ]"
                };
                format!("  {} {}", mark, value)
            }
            FilterItem::AgeMin => format!("  Age min     {}", bound(self.spec.age.min)),
            FilterItem::AgeMax => format!("  Age max     {}", bound(self.spec.age.max)),
            FilterItem::IncomeMin => format!("  Income min  {}", bound(self.spec.income.min)),
            FilterItem::IncomeMax => format!("  Income max  {}", bound(self.spec.income.max)),
        }
    }

    fn item_group(item: &FilterItem) -> &'static str {
        match item {
            FilterItem::Level { dimension, .. } => dimension.label(),
            FilterItem::AgeMin | FilterItem::AgeMax => "Age",
            FilterItem::IncomeMin | FilterItem::IncomeMax => "Income",
        }
    }
}

/// Rendered text of the current page, or of the error that stopped it
struct PageText {
    rows: usize,
    text: String,
}

fn refresh(
    df: &DataFrame,
    state: &DashboardState,
    session: &mut FilterSession,
) -> PageText {
    let result = session
        .apply(df, &state.spec)
        .and_then(|filtered| Ok((filtered.height(), compute_page(state.page_kind(), &filtered)?)));
    match result {
        Ok((rows, view)) => PageText {
            rows,
            text: render_page(&view),
        },
        Err(e) => PageText {
            rows: 0,
            text: format!("Error: {:#}", e),
        },
    }
}

/// Run the interactive dashboard and return the filter in effect on exit.
pub fn run_dashboard(df: &DataFrame, options: FilterOptions, spec: FilterSpec) -> Result<FilterSpec> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_dashboard_loop(&mut terminal, df, DashboardState::new(options, spec));

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_dashboard_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    df: &DataFrame,
    mut state: DashboardState,
) -> Result<FilterSpec> {
    let mut session = FilterSession::new();
    let mut current = refresh(df, &state, &mut session);
    let mut shown_page = state.page;

    loop {
        terminal.draw(|frame| draw_ui(frame, &mut state, &current, df.height()))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match state.handle_key(key.code) {
                Action::Quit => return Ok(state.spec),
                Action::Refilter => current = refresh(df, &state, &mut session),
                Action::Redraw if state.page != shown_page => {
                    current = refresh(df, &state, &mut session);
                }
                Action::Redraw | Action::None => {}
            }
            shown_page = state.page;
        }
    }
}

fn draw_ui(frame: &mut Frame, state: &mut DashboardState, current: &PageText, total_rows: usize) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    let titles: Vec<Line> = PageKind::ALL
        .iter()
        .map(|kind| Line::from(kind.short_title()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.page)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Credscope ")
                .title_style(Style::default().fg(Color::Cyan).bold()),
        )
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).bold());
    frame.render_widget(tabs, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(20)])
        .split(chunks[1]);

    draw_sidebar(frame, state, body[0]);
    draw_page(frame, state, current, total_rows, body[1]);

    let hint = Line::from(vec![
        Span::styled("  Tab", Style::default().fg(Color::Cyan)),
        Span::styled(" page  ", Style::default().fg(Color::DarkGray)),
        Span::styled("↑/↓", Style::default().fg(Color::Cyan)),
        Span::styled(" move  ", Style::default().fg(Color::DarkGray)),
        Span::styled("Space", Style::default().fg(Color::Cyan)),
        Span::styled(" toggle  ", Style::default().fg(Color::DarkGray)),
        Span::styled("a/n", Style::default().fg(Color::Cyan)),
        Span::styled(" all/none  ", Style::default().fg(Color::DarkGray)),
        Span::styled("+/-", Style::default().fg(Color::Cyan)),
        Span::styled(" range  ", Style::default().fg(Color::DarkGray)),
        Span::styled("r", Style::default().fg(Color::Cyan)),
        Span::styled(" reset  ", Style::default().fg(Color::DarkGray)),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Cyan)),
        Span::styled(" scroll  ", Style::default().fg(Color::DarkGray)),
        Span::styled("q", Style::default().fg(Color::Cyan)),
        Span::styled(" quit", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(hint), chunks[2]);
}

fn draw_sidebar(frame: &mut Frame, state: &DashboardState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Filters ")
        .title_style(Style::default().fg(Color::Magenta).bold());

    let mut items = Vec::new();
    let mut selected_row = 0;
    let mut group = "";
    for (i, item) in state.items.iter().enumerate() {
        let item_group = DashboardState::item_group(item);
        if item_group != group {
            group = item_group;
            items.push(ListItem::new(group).style(Style::default().fg(Color::Magenta).bold()));
        }
        if i == state.cursor {
            selected_row = items.len();
        }
        let style = if i == state.cursor {
            Style::default().fg(Color::Black).bg(Color::Magenta).bold()
        } else {
            Style::default().fg(Color::White)
        };
        items.push(ListItem::new(state.item_label(item)).style(style));
    }

    let mut list_state = ListState::default();
    list_state.select(Some(selected_row));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut list_state);
}

fn draw_page(
    frame: &mut Frame,
    state: &mut DashboardState,
    current: &PageText,
    total_rows: usize,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} of {} rows ", current.rows, total_rows))
        .title_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = current.text.lines().map(Line::from).collect();
    let content_height = lines.len() as u16;
    let max_scroll = content_height.saturating_sub(inner.height);
    if state.scroll > max_scroll {
        state.scroll = max_scroll;
    }

    frame.render_widget(Paragraph::new(lines).scroll((state.scroll, 0)), inner);

    if content_height > inner.height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        let mut scrollbar_state =
            ScrollbarState::new(max_scroll as usize).position(state.scroll as usize);
        frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}
