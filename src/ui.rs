use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, BarChart, Block, Borders, Cell, Chart, Dataset as ChartSeries, GraphType,
        Paragraph, Row, Sparkline, Table, TableState, Wrap,
    },
    Frame, Terminal,
};
use std::io;
use supermarket_dashboard::{
    filter, report_for_subset, BoxStats, Dataset, Dimension, FilterSelection, GroupedTable,
    Page, PageData, PageReport, PivotTable, SalesRecord, ScatterPoint, FILTER_DIMENSIONS,
};

const PAGE_JUMP: usize = 20;

/// Which pane receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Content,
    Sidebar,
}

pub struct App<'a> {
    dataset: &'a Dataset,
    pub selection: FilterSelection,
    pub current_page: Page,
    pub filtered: Vec<&'a SalesRecord>,
    pub report: PageReport,
    pub focus: Focus,
    pub sidebar_cursor: usize,
    /// Filtered rows table instead of the page's charts
    pub show_records: bool,
    pub records_state: TableState,
}

impl<'a> App<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        let selection = FilterSelection::all(dataset);
        let filtered = filter(dataset.records(), &selection);
        let report = report_for_subset(&filtered, Page::Overview);

        let mut records_state = TableState::default();
        if !filtered.is_empty() {
            records_state.select(Some(0));
        }

        Self {
            dataset,
            selection,
            current_page: Page::Overview,
            filtered,
            report,
            focus: Focus::Content,
            sidebar_cursor: 0,
            show_records: false,
            records_state,
        }
    }

    /// Re-run the pipeline after a filter change or navigation
    fn refresh(&mut self) {
        self.filtered = filter(self.dataset.records(), &self.selection);
        self.report = report_for_subset(&self.filtered, self.current_page);

        if self.filtered.is_empty() {
            self.records_state.select(None);
        } else {
            self.records_state.select(Some(0));
        }
    }

    /// Flattened sidebar: every option of every filter dimension
    pub fn sidebar_entries(&self) -> Vec<(Dimension, String)> {
        let options = self.dataset.options();
        FILTER_DIMENSIONS
            .iter()
            .flat_map(|dim| {
                let values = match dim {
                    Dimension::Branch => &options.branches,
                    Dimension::City => &options.cities,
                    Dimension::CustomerType => &options.customer_types,
                    _ => &options.genders,
                };
                values.iter().map(move |v| (*dim, v.clone()))
            })
            .collect()
    }

    pub fn set_page(&mut self, page: Page) {
        if self.current_page != page {
            self.current_page = page;
            self.report = report_for_subset(&self.filtered, page);
        }
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page.next());
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.current_page.previous());
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Content => Focus::Sidebar,
            Focus::Sidebar => Focus::Content,
        };
    }

    pub fn toggle_records(&mut self) {
        self.show_records = !self.show_records;
    }

    /// Toggle the option under the sidebar cursor
    pub fn toggle_selected_option(&mut self) {
        if let Some((dim, value)) = self.sidebar_entries().get(self.sidebar_cursor).cloned() {
            self.selection.toggle(dim, &value);
            self.refresh();
        }
    }

    pub fn select_all(&mut self) {
        self.selection = FilterSelection::all(self.dataset);
        self.refresh();
    }

    pub fn select_none(&mut self) {
        self.selection = FilterSelection::none();
        self.refresh();
    }

    pub fn cursor_down(&mut self) {
        match self.focus {
            Focus::Sidebar => {
                let len = self.sidebar_entries().len();
                if len > 0 {
                    self.sidebar_cursor = (self.sidebar_cursor + 1) % len;
                }
            }
            Focus::Content => self.move_records(1),
        }
    }

    pub fn cursor_up(&mut self) {
        match self.focus {
            Focus::Sidebar => {
                let len = self.sidebar_entries().len();
                if len > 0 {
                    self.sidebar_cursor = (self.sidebar_cursor + len - 1) % len;
                }
            }
            Focus::Content => self.move_records(-1),
        }
    }

    pub fn page_down(&mut self) {
        self.jump_records(PAGE_JUMP as isize);
    }

    pub fn page_up(&mut self) {
        self.jump_records(-(PAGE_JUMP as isize));
    }

    /// Step with wrap-around, like the ledger list
    fn move_records(&mut self, delta: isize) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.records_state.selected() {
            Some(i) => (i as isize + delta).rem_euclid(len as isize) as usize,
            None => 0,
        };
        self.records_state.select(Some(i));
    }

    /// Jump and clamp at either end
    fn jump_records(&mut self, delta: isize) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.records_state.selected() {
            Some(i) => (i as isize + delta).clamp(0, len as isize - 1) as usize,
            None => 0,
        };
        self.records_state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, event::read);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!("UI loop failed: {:?}", err);
    }

    Ok(res?)
}

fn run_app<B, E>(terminal: &mut Terminal<B>, app: &mut App, mut next_event: E) -> io::Result<()>
where
    B: ratatui::backend::Backend,
    E: FnMut() -> io::Result<Event>,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = next_event()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('f') => app.toggle_focus(),
                KeyCode::Char('v') => app.toggle_records(),
                KeyCode::Char('a') => app.select_all(),
                KeyCode::Char('n') => app.select_none(),
                KeyCode::Char(' ') | KeyCode::Enter if app.focus == Focus::Sidebar => {
                    app.toggle_selected_option()
                }
                KeyCode::Char(c @ '0'..='6') => {
                    let index = c as usize - '0' as usize;
                    app.set_page(Page::ALL[index]);
                }
                KeyCode::Down | KeyCode::Char('j') => app.cursor_down(),
                KeyCode::Up | KeyCode::Char('k') => app.cursor_up(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Page tabs
            Constraint::Min(0),    // Sidebar + content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(0)])
        .split(chunks[1]);

    render_sidebar(f, body[0], app);

    if app.show_records {
        render_records(f, body[1], app);
    } else if app.report.is_empty() {
        render_no_data(f, body[1], app);
    } else {
        render_page(f, body[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", title))
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let label = match page {
            Page::Overview => "Overview".to_string(),
            other => other.id().to_uppercase(),
        };
        tab_spans.push(Span::styled(format!("{} {}", i, label), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Rows: {}/{}", app.filtered.len(), app.dataset.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Superstore Sales Dashboard "),
    );

    f.render_widget(header, area);
}

fn render_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let entries = app.sidebar_entries();
    let mut lines = Vec::new();
    let mut last_dim = None;

    for (i, (dim, value)) in entries.iter().enumerate() {
        if last_dim != Some(*dim) {
            if last_dim.is_some() {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                format!("Select {}", dim.column()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            last_dim = Some(*dim);
        }

        let checked = app.selection.is_selected(*dim, value);
        let marker = if checked { "[x]" } else { "[ ]" };
        let mut style = if checked {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if app.focus == Focus::Sidebar && i == app.sidebar_cursor {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }
        lines.push(Line::from(Span::styled(
            format!(" {} {}", marker, truncate(value, 22)),
            style,
        )));
    }

    let border = if app.focus == Focus::Sidebar {
        Color::Yellow
    } else {
        Color::White
    };
    let sidebar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Filter Options "),
    );

    f.render_widget(sidebar, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.report.title),
        Style::default().fg(Color::Cyan),
    )];

    let keys = [
        ("Tab", " Page | "),
        ("0-6", " Jump | "),
        ("f", " Filters | "),
        ("Space", " Toggle | "),
        ("a/n", " All/None | "),
        ("v", " Rows | "),
    ];
    status_spans.push(Span::raw("| "));
    for (key, label) in keys {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_no_data(f: &mut Frame, area: Rect, app: &App) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", app.report.question),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  No records match the current filter selection.",
            Style::default().fg(Color::Yellow),
        )),
        Line::from(Span::styled(
            "  Press a to select every option again.",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(content).block(bordered(app.report.title)), area);
}

fn render_records(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = [
        "Invoice ID", "Date", "Branch", "City", "Customer", "Gender", "Product line", "Total",
        "Payment", "Rating",
    ]
    .iter()
    .map(|h| Cell::from(*h).style(header_style()));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered.iter().map(|r| {
        Row::new(vec![
            Cell::from(r.invoice_id.clone()),
            Cell::from(r.date.format("%Y-%m-%d").to_string()),
            Cell::from(r.branch.clone()),
            Cell::from(r.city.clone()),
            Cell::from(r.customer_type.clone()),
            Cell::from(r.gender.clone()),
            Cell::from(truncate(&r.product_line, 22)),
            Cell::from(format!("{:.2}", r.total)).style(Style::default().fg(Color::Green)),
            Cell::from(r.payment.clone()),
            Cell::from(format!("{:.1}", r.rating)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(11),
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(23),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(bordered("Filtered Records"))
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.records_state);
}

fn render_page(f: &mut Frame, area: Rect, app: &App) {
    let conclusion_height = if app.report.conclusion.is_some() { 5 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(conclusion_height),
        ])
        .split(area);

    if let Some(conclusion) = app.report.conclusion {
        let text = Paragraph::new(conclusion)
            .wrap(Wrap { trim: true })
            .block(bordered("Conclusion"));
        f.render_widget(text, chunks[2]);
    }

    let question = Paragraph::new(Line::from(Span::styled(
        app.report.question,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )))
    .block(bordered(app.report.title));
    f.render_widget(question, chunks[0]);

    let area = chunks[1];
    match &app.report.data {
        PageData::Overview(overview) => {
            let rows = split(Direction::Vertical, area, &[3, 0, 8]);
            let metrics = &overview.metrics;
            let kpis = Paragraph::new(Line::from(vec![
                Span::styled("No. of Customers: ", header_style()),
                Span::raw(format!("{}", metrics.customers)),
                Span::raw("   "),
                Span::styled("Total COGS/Expenses: ", header_style()),
                Span::raw(format_amount(metrics.total_cogs)),
                Span::raw("   "),
                Span::styled("Sum of Profit: ", header_style()),
                Span::raw(format_amount(metrics.gross_income)),
            ]))
            .block(bordered("Key Metrics"));
            f.render_widget(kpis, rows[0]);

            let middle = split(Direction::Horizontal, rows[1], &[0, 0, 0, 0]);
            let product_rows = overview.product_lines.iter().map(|p| {
                Row::new(vec![
                    Cell::from(truncate(&p.product_line, 22)),
                    Cell::from(format_amount(p.total_revenue)),
                    Cell::from(format!("{:.2}", p.average_quantity)),
                    Cell::from(format!("{:.2}", p.average_unit_price)),
                ])
            });
            let product_table = Table::new(
                product_rows,
                [
                    Constraint::Length(23),
                    Constraint::Length(11),
                    Constraint::Length(8),
                    Constraint::Length(8),
                ],
            )
            .header(Row::new(vec!["Product line", "Revenue", "Avg Qty", "Avg $"]).style(header_style()))
            .block(bordered("Sales Analysis by Product Line"));
            f.render_widget(product_table, middle[0]);

            f.render_widget(
                pivot_table(&overview.branch_city, "Branch and City Performance", 2),
                middle[1],
            );
            f.render_widget(
                grouped_table(&overview.branch_city_sales, "Branch/City Revenue", "Total", 2),
                middle[2],
            );
            f.render_widget(
                grouped_table(&overview.customer_gender, "Customer Type by Gender", "Count", 0),
                middle[3],
            );

            let daily: Vec<u64> = overview
                .daily_sales
                .iter()
                .map(|d| d.value.round().max(0.0) as u64)
                .collect();
            let sparkline = Sparkline::default()
                .block(bordered("Sales Trends (daily revenue)"))
                .data(&daily)
                .style(Style::default().fg(Color::Magenta));
            f.render_widget(sparkline, rows[2]);
        }
        PageData::SalesTrends(trends) => {
            let parts = split(Direction::Vertical, area, &[0, 0]);
            let bars: Vec<(String, u64)> = trends
                .monthly_sales
                .iter()
                .map(|m| (m.label.clone(), to_bar(m.value)))
                .collect();
            render_bars(f, parts[0], "Monthly Total Sales Over Time", &bars, 9);

            let rows = trends.monthly_sales.iter().map(|m| {
                Row::new(vec![Cell::from(m.label.clone()), Cell::from(format_amount(m.value))])
            });
            let table = Table::new(rows, [Constraint::Length(10), Constraint::Length(14)])
                .header(Row::new(vec!["Month", "Total Sales"]).style(header_style()))
                .block(bordered("Monthly Sales"));
            f.render_widget(table, parts[1]);
        }
        PageData::Demographics(demo) => {
            let parts = split(Direction::Vertical, area, &[0, 0]);
            render_bars(
                f,
                parts[0],
                "Total Sales by Gender",
                &grouped_bars(&demo.sales_by_gender),
                12,
            );
            let lower = split(Direction::Horizontal, parts[1], &[0, 0]);
            f.render_widget(
                pivot_table(&demo.product_line_gender, "Product Line Preferences by Gender", 0),
                lower[0],
            );
            f.render_widget(
                pivot_table(
                    &demo.product_line_customer_type,
                    "Product Line Preferences by Customer Type",
                    0,
                ),
                lower[1],
            );
        }
        PageData::ProductLines(lines) => {
            let parts = split(Direction::Vertical, area, &[0, 0]);
            render_bars(
                f,
                parts[0],
                "Total Sales by Product Line",
                &grouped_bars(&lines.sales_by_product_line),
                12,
            );
            let rows = lines.revenue_shares.iter().map(|s| {
                Row::new(vec![
                    Cell::from(s.label.clone()),
                    Cell::from(format_amount(s.value)),
                    Cell::from(format!("{:.1}%", s.percent)),
                ])
            });
            let table = Table::new(
                rows,
                [Constraint::Length(26), Constraint::Length(14), Constraint::Length(8)],
            )
            .header(Row::new(vec!["Product line", "Total", "Share"]).style(header_style()))
            .block(bordered("Revenue Contribution by Product Line"));
            f.render_widget(table, parts[1]);
        }
        PageData::BranchesAndCities(branches) => {
            let parts = split(Direction::Vertical, area, &[0, 0]);
            render_bars(
                f,
                parts[0],
                "Sales by Branch",
                &grouped_bars(&branches.sales_by_branch),
                10,
            );
            f.render_widget(
                pivot_table(
                    &branches.product_city_sales,
                    "Product Sales by City and Product Line",
                    0,
                ),
                parts[1],
            );
        }
        PageData::Satisfaction(satisfaction) => {
            let parts = split(Direction::Vertical, area, &[0, 0]);
            render_scatter(f, parts[0], &satisfaction.rating_vs_sales);
            f.render_widget(
                box_table(
                    &satisfaction.rating_by_product_line,
                    "Customer Satisfaction Ratings by Product Line",
                ),
                parts[1],
            );
        }
        PageData::PaymentMethods(payment) => {
            let parts = split(Direction::Vertical, area, &[0, 0]);
            render_bars(
                f,
                parts[0],
                "Sales by Payment Method",
                &grouped_bars(&payment.sales_by_payment),
                12,
            );
            f.render_widget(
                box_table(
                    &payment.rating_by_payment,
                    "Customer Satisfaction Ratings by Payment Method",
                ),
                parts[1],
            );
        }
    }
}

/// Split `area` into parts; 0 means "share the rest", anything else is a fixed length
fn split(direction: Direction, area: Rect, sizes: &[u16]) -> Vec<Rect> {
    let flexible = sizes.iter().filter(|s| **s == 0).count().max(1) as u32;
    let constraints: Vec<Constraint> = sizes
        .iter()
        .map(|s| match s {
            0 => Constraint::Ratio(1, flexible),
            n => Constraint::Length(*n),
        })
        .collect();

    Layout::default()
        .direction(direction)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

fn to_bar(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

fn grouped_bars(table: &GroupedTable) -> Vec<(String, u64)> {
    table
        .rows
        .iter()
        .map(|row| (truncate(&row.key.join(" / "), 12), to_bar(row.value)))
        .collect()
}

fn render_bars(f: &mut Frame, area: Rect, title: &str, bars: &[(String, u64)], width: u16) {
    let data: Vec<(&str, u64)> = bars.iter().map(|(l, v)| (l.as_str(), *v)).collect();
    let chart = BarChart::default()
        .block(bordered(title))
        .data(data.as_slice())
        .bar_width(width)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Blue))
        .value_style(Style::default().fg(Color::Black).bg(Color::Blue));
    f.render_widget(chart, area);
}

fn render_scatter(f: &mut Frame, area: Rect, points: &[ScatterPoint]) {
    let mut colours: Vec<&str> = points.iter().map(|p| p.colour.as_str()).collect();
    colours.sort_unstable();
    colours.dedup();

    let series_points: Vec<Vec<(f64, f64)>> = colours
        .iter()
        .map(|c| {
            points
                .iter()
                .filter(|p| p.colour == *c)
                .map(|p| (p.x, p.y))
                .collect()
        })
        .collect();

    let palette = [Color::Blue, Color::Magenta, Color::Cyan, Color::Green];
    let series: Vec<ChartSeries> = colours
        .iter()
        .zip(series_points.iter())
        .enumerate()
        .map(|(i, (name, data))| {
            ChartSeries::default()
                .name(name.to_string())
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(palette[i % palette.len()]))
                .data(data)
        })
        .collect();

    let max_total = points.iter().map(|p| p.y).fold(0.0, f64::max).max(1.0);
    let chart = Chart::new(series)
        .block(bordered("Customer Satisfaction Rating vs. Sales Volume"))
        .x_axis(
            Axis::default()
                .title("Rating")
                .bounds([0.0, 10.0])
                .labels(vec![Span::raw("0"), Span::raw("5"), Span::raw("10")]),
        )
        .y_axis(
            Axis::default()
                .title("Total")
                .bounds([0.0, max_total])
                .labels(vec![Span::raw("0"), Span::raw(format!("{:.0}", max_total))]),
        );
    f.render_widget(chart, area);
}

fn grouped_table<'t>(
    table: &'t GroupedTable,
    title: &'t str,
    value_header: &'t str,
    decimals: usize,
) -> Table<'t> {
    let mut header: Vec<String> = table.keys.iter().map(|k| k.column().to_string()).collect();
    header.push(value_header.to_string());

    let rows = table.rows.iter().map(|row| {
        let mut cells: Vec<Cell> = row.key.iter().map(|k| Cell::from(k.clone())).collect();
        cells.push(Cell::from(format!("{:.*}", decimals, row.value)));
        Row::new(cells)
    });

    let widths: Vec<Constraint> = (0..header.len()).map(|_| Constraint::Length(14)).collect();
    Table::new(rows, widths)
        .header(Row::new(header).style(header_style()))
        .block(bordered(title))
}

fn pivot_table<'t>(pivot: &'t PivotTable, title: &'t str, decimals: usize) -> Table<'t> {
    let mut header = vec![pivot.row_key.column().to_string()];
    header.extend(pivot.columns.iter().cloned());

    let rows = pivot.rows.iter().zip(pivot.cells.iter()).map(|(label, cells)| {
        let mut row = vec![Cell::from(truncate(label, 22))];
        row.extend(
            cells
                .iter()
                .map(|v| Cell::from(format!("{:.*}", decimals, v))),
        );
        Row::new(row)
    });

    let mut widths = vec![Constraint::Length(23)];
    widths.extend(pivot.columns.iter().map(|_| Constraint::Length(11)));

    Table::new(rows, widths)
        .header(Row::new(header).style(header_style()))
        .block(bordered(title))
}

fn box_table<'t>(stats: &'t [BoxStats], title: &'t str) -> Table<'t> {
    let rows = stats.iter().map(|s| {
        Row::new(vec![
            Cell::from(truncate(&s.key, 22)),
            Cell::from(s.count.to_string()),
            Cell::from(format!("{:.1}", s.min)),
            Cell::from(format!("{:.2}", s.q1)),
            Cell::from(format!("{:.2}", s.median)),
            Cell::from(format!("{:.2}", s.q3)),
            Cell::from(format!("{:.1}", s.max)),
            Cell::from(format!("{:.2}", s.mean)),
        ])
    });

    let mut widths = vec![Constraint::Length(23)];
    widths.extend([Constraint::Length(7); 7]);

    Table::new(rows, widths)
        .header(
            Row::new(vec!["Group", "Count", "Min", "Q1", "Median", "Q3", "Max", "Mean"])
                .style(header_style()),
        )
        .block(bordered(title))
}

fn format_amount(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format!("{:.1}K", value / 1000.0)
    } else {
        format!("{:.2}", value)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;

    fn dataset() -> Dataset {
        let csv = "\
Invoice ID,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating
750-67-8428,A,Yangon,Member,Female,Health and beauty,74.69,7,26.1415,548.9715,1/5/2019,13:08,Ewallet,522.83,4.761904762,26.1415,9.1
226-31-3081,C,Naypyitaw,Normal,Female,Electronic accessories,15.28,5,3.82,80.22,3/8/2019,10:29,Cash,76.4,4.761904762,3.82,9.6
631-41-3108,A,Yangon,Normal,Male,Home and lifestyle,46.33,7,16.2155,340.5255,3/3/2019,13:23,Credit card,324.31,4.761904762,16.2155,7.4
";
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_new_app_shows_everything() {
        let dataset = dataset();
        let app = App::new(&dataset);

        assert_eq!(app.filtered.len(), 3);
        assert_eq!(app.current_page, Page::Overview);
        assert_eq!(app.records_state.selected(), Some(0));
        // A, C, Yangon, Naypyitaw, Member, Normal, Female, Male
        assert_eq!(app.sidebar_entries().len(), 8);
    }

    #[test]
    fn test_toggling_an_option_refilters() {
        let dataset = dataset();
        let mut app = App::new(&dataset);
        app.toggle_focus();

        // cursor 0 is branch A
        app.toggle_selected_option();
        assert_eq!(app.filtered.len(), 1);
        assert_eq!(app.filtered[0].branch, "C");
        assert_eq!(app.report.record_count, 1);

        app.toggle_selected_option();
        assert_eq!(app.filtered.len(), 3);
    }

    #[test]
    fn test_select_none_gives_no_data_state() {
        let dataset = dataset();
        let mut app = App::new(&dataset);

        app.select_none();
        assert!(app.report.is_empty());
        assert_eq!(app.records_state.selected(), None);

        // navigation on an empty subset is a no-op
        app.cursor_down();
        app.page_down();
        assert_eq!(app.records_state.selected(), None);

        app.select_all();
        assert_eq!(app.filtered.len(), 3);
    }

    #[test]
    fn test_page_navigation_rebuilds_report() {
        let dataset = dataset();
        let mut app = App::new(&dataset);

        app.next_page();
        assert_eq!(app.current_page, Page::SalesTrends);
        assert!(matches!(app.report.data, PageData::SalesTrends(_)));

        app.previous_page();
        app.previous_page();
        assert_eq!(app.current_page, Page::PaymentMethods);
        assert!(matches!(app.report.data, PageData::PaymentMethods(_)));
    }

    #[test]
    fn test_sidebar_cursor_wraps() {
        let dataset = dataset();
        let mut app = App::new(&dataset);
        app.toggle_focus();

        app.cursor_up();
        assert_eq!(app.sidebar_cursor, 7);
        app.cursor_down();
        assert_eq!(app.sidebar_cursor, 0);
    }

    #[test]
    fn test_record_cursor_wraps_and_clamps() {
        let dataset = dataset();
        let mut app = App::new(&dataset);

        app.cursor_up();
        assert_eq!(app.records_state.selected(), Some(2));
        app.cursor_down();
        assert_eq!(app.records_state.selected(), Some(0));
        app.page_down();
        assert_eq!(app.records_state.selected(), Some(2));
        app.page_up();
        assert_eq!(app.records_state.selected(), Some(0));
    }

    #[test]
    fn test_truncate_and_format() {
        assert_eq!(truncate("Electronic accessories", 12), "Electroni...");
        assert_eq!(truncate("Cash", 12), "Cash");
        assert_eq!(format_amount(22_000.0), "22.0K");
        assert_eq!(format_amount(80.22), "80.22");
    }

    fn key(code: KeyCode) -> io::Result<Event> {
        Ok(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn test_terminal() -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(200, 60)).unwrap()
    }

    #[test]
    fn test_event_loop_renders_every_page_then_quits() {
        let dataset = dataset();
        let mut app = App::new(&dataset);
        let mut terminal = test_terminal();
        let mut events = vec![key(KeyCode::Char('q'))];
        events.extend((0..Page::ALL.len()).map(|_| key(KeyCode::Tab)));

        run_app(&mut terminal, &mut app, || events.pop().unwrap()).unwrap();

        assert_eq!(app.current_page, Page::Overview);
        assert!(events.is_empty());
    }

    #[test]
    fn test_event_loop_propagates_read_errors() {
        let dataset = dataset();
        let mut app = App::new(&dataset);
        let mut terminal = test_terminal();

        let err = run_app(&mut terminal, &mut app, || {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"))
        })
        .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
