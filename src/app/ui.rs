use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Span, Spans},
    widgets::{Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::filter::Filter;
use crate::app::state::{App, InputMode, LoadState, Report};
use crate::app::view::{self, ChartView};

const GAIN: Color = Color::Rgb(0xff, 0x4d, 0x4d);
const LOSS: Color = Color::Rgb(0x3b, 0x82, 0xf6);
const MUTED: Color = Color::Rgb(0x94, 0xa3, 0xb8);

fn profit_color(positive: bool) -> Color {
    if positive { GAIN } else { LOSS }
}

pub fn draw<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),                    // Title
            Constraint::Min(3),                       // Landing body
            Constraint::Length(3),                    // Input field
            Constraint::Length(3),                    // Help text
        ])
        .split(size);

    draw_title(f, chunks[0]);
    draw_landing(f, app, chunks[1]);
    draw_input(f, app, chunks[2]);
    draw_help(f, app, chunks[3]);

    if app.is_open() {
        draw_backdrop(f, size);
        let area = centered_rect(96, 92, size);
        if let Some(report) = app.report_mut() {
            draw_report(f, report, area);
        }
    }
}

fn draw_title<B: Backend>(f: &mut Frame<B>, area: Rect) {
    let title = Paragraph::new(Spans::from(Span::styled(
        "🏆 모의투자 자산 분석 리포트",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(title, area);
}

fn draw_landing<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let mut lines = vec![
        Spans::from(Span::raw("Press e, type a user id and hit Enter to open the report.")),
    ];
    if let Some(error) = &app.last_error {
        lines.push(Spans::from(Span::raw("")));
        lines.push(Spans::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }

    let landing = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(landing, area);
}

fn draw_input<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let style = match app.input_mode {
        InputMode::Editing => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default().fg(Color::DarkGray),
    };
    let input = Paragraph::new(app.input.as_str())
        .style(style)
        .block(Block::default()
            .borders(Borders::ALL)
            .title("User ID"));

    f.render_widget(input, area);
}

fn draw_help<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let text = if app.is_open() {
        Spans::from(vec![
            key("f"),
            Span::raw(": Winners/Losers | "),
            key("1-5"),
            Span::raw(": Sort column | "),
            key("↓/j ↑/k"),
            Span::raw(": Navigate | "),
            key("Enter"),
            Span::raw(": Chart row | "),
            key("Esc/x"),
            Span::raw(": Close | "),
            key("q"),
            Span::raw(": Quit"),
        ])
    } else {
        match app.input_mode {
            InputMode::Normal => Spans::from(vec![
                key("q"),
                Span::raw(": Quit | "),
                key("e"),
                Span::raw(": Enter user id"),
            ]),
            InputMode::Editing => Spans::from(vec![
                key("Enter"),
                Span::raw(": Open report | "),
                key("Esc"),
                Span::raw(": Cancel"),
            ]),
        }
    };

    let help = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    f.render_widget(help, area);
}

fn draw_backdrop<B: Backend>(f: &mut Frame<B>, area: Rect) {
    f.render_widget(Clear, area);
    f.render_widget(Block::default().style(Style::default().bg(Color::Black)), area);
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

fn draw_report<B: Backend>(f: &mut Frame<B>, report: &mut Report, area: Rect) {
    f.render_widget(Clear, area);
    let frame = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(0x33, 0x41, 0x55)))
        .title(Span::styled(
            format!(" 📊 {} 유저 자산 상세 분석 리포트 ", report.user_id),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));
    let inner = frame.inner(area);
    f.render_widget(frame, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),                    // Banner
            Constraint::Length(1),                    // Filter radio
            Constraint::Length(5),                    // Top 3
            Constraint::Min(8),                       // Chart + list
            Constraint::Length(3),                    // Summary
        ])
        .split(inner);

    draw_banner(f, report, chunks[0]);
    draw_filter(f, report, chunks[1]);
    draw_top_three(f, report, chunks[2]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[3]);
    draw_chart(f, report, body[0]);
    draw_list(f, report, body[1]);

    draw_summary(f, report, chunks[4]);
}

fn draw_banner<B: Backend>(f: &mut Frame<B>, report: &Report, area: Rect) {
    let banner = view::banner(report);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let info = Paragraph::new(vec![
        Spans::from(Span::styled(banner.headline, Style::default().fg(MUTED))),
        Spans::from(Span::styled(
            banner.detail,
            Style::default().fg(if banner.warning { Color::LightRed } else { Color::Yellow }),
        )),
    ])
    .block(Block::default().borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)
        .border_style(Style::default().fg(LOSS)));

    let amount = Paragraph::new(vec![
        Spans::from(Span::styled(banner.amount_label, Style::default().fg(MUTED))),
        Spans::from(Span::styled(
            banner.amount,
            Style::default().fg(GAIN).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Right)
    .block(Block::default().borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
        .border_style(Style::default().fg(LOSS)));

    f.render_widget(info, chunks[0]);
    f.render_widget(amount, chunks[1]);
}

fn draw_filter<B: Backend>(f: &mut Frame<B>, report: &Report, area: Rect) {
    let radio = |filter: Filter| {
        let checked = report.view.filter == filter;
        Span::styled(
            format!("{} {}   ", if checked { "(●)" } else { "( )" }, filter.label()),
            if checked {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(MUTED)
            },
        )
    };
    let line = Paragraph::new(Spans::from(vec![radio(Filter::Winners), radio(Filter::Losers)]));
    f.render_widget(line, area);
}

fn draw_top_three<B: Backend>(f: &mut Frame<B>, report: &Report, area: Rect) {
    let top = view::top_three(&report.all_data);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let panel = |title: &'static str, entries: Vec<view::TopEntry>, color: Color| {
        let lines: Vec<Spans> = entries
            .into_iter()
            .map(|e| {
                Spans::from(vec![
                    Span::styled(format!("{:<16}", e.name), Style::default().fg(Color::Gray)),
                    Span::styled(e.profit, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                ])
            })
            .collect();
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(Span::styled(title, Style::default().fg(color).add_modifier(Modifier::BOLD))),
        )
    };

    f.render_widget(panel("🚀 수익 기여 TOP 3", top.gainers, GAIN), chunks[0]);
    f.render_widget(panel("💧 손실 기여 TOP 3", top.losers, LOSS), chunks[1]);
}

fn draw_chart<B: Backend>(f: &mut Frame<B>, report: &Report, area: Rect) {
    let chart_view = view::chart(report);
    let placeholder = |text: &'static str| {
        Paragraph::new(text)
            .style(Style::default().fg(MUTED))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Chart (만원)"))
    };

    let (series, x_bounds, y_bounds, x_labels, y_labels) = match &chart_view {
        ChartView::Loading => {
            f.render_widget(placeholder("로딩 중..."), area);
            return;
        }
        ChartView::Empty => {
            f.render_widget(placeholder("차트 데이터가 없습니다"), area);
            return;
        }
        ChartView::Plot { series, x_bounds, y_bounds, x_labels, y_labels } => {
            (series, x_bounds, y_bounds, x_labels, y_labels)
        }
    };

    // One dataset per unbroken run so missing closes show up as gaps.
    let datasets: Vec<Dataset> = series
        .iter()
        .flat_map(|s| {
            s.segments.iter().map(move |run| {
                Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(s.color))
                    .data(run)
            })
        })
        .collect();

    let mut legend = vec![Span::raw("Chart (만원) ")];
    for s in series {
        legend.push(Span::styled(format!("■ {} ", s.name), Style::default().fg(s.color)));
    }

    let chart = Chart::new(datasets)
        .block(Block::default()
            .title(Spans::from(legend))
            .borders(Borders::ALL))
        .hidden_legend_constraints((Constraint::Length(0), Constraint::Length(0)))
        .x_axis(Axis::default()
            .style(Style::default().fg(MUTED))
            .bounds(*x_bounds)
            .labels(x_labels.iter().map(|l| Span::raw(l.clone())).collect()))
        .y_axis(Axis::default()
            .style(Style::default().fg(MUTED))
            .bounds(*y_bounds)
            .labels(y_labels.iter().map(|l| Span::raw(l.clone())).collect()));

    f.render_widget(chart, area);
}

fn draw_list<B: Backend>(f: &mut Frame<B>, report: &mut Report, area: Rect) {
    let status = match &report.load {
        LoadState::Loading => Some("로딩 중...".to_string()),
        LoadState::Failed(e) => Some(format!("데이터 로드 실패: {}", e)),
        LoadState::Loaded if report.ranked.is_empty() => Some("표시할 종목이 없습니다".to_string()),
        LoadState::Loaded => None,
    };
    if let Some(status) = status {
        let color = if matches!(report.load, LoadState::Failed(_)) { Color::LightRed } else { MUTED };
        let message = Paragraph::new(status)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Positions"));
        f.render_widget(message, area);
        return;
    }

    let header_cells = view::header_cells(&report.view).into_iter().map(|cell| {
        Cell::from(cell.text).style(
            Style::default()
                .fg(if cell.active { Color::Cyan } else { MUTED })
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows: Vec<Row> = view::list_rows(report)
        .into_iter()
        .map(|r| {
            let color = profit_color(r.positive);
            let mut row = Row::new(vec![
                Cell::from(r.date).style(Style::default().fg(Color::DarkGray)),
                Cell::from(r.name).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(r.invest),
                Cell::from(r.rate).style(Style::default().fg(color)),
                Cell::from(r.profit).style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
            ]);
            if r.selected {
                row = row.style(Style::default().add_modifier(Modifier::REVERSED));
            }
            row
        })
        .collect();

    let table = Table::new(rows)
        .header(header)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(format!("Positions ({})", report.ranked.len())))
        .highlight_symbol(">")
        .widths(&[
            Constraint::Percentage(18),  // Date
            Constraint::Percentage(24),  // Name
            Constraint::Percentage(20),  // Invest
            Constraint::Percentage(16),  // Rate
            Constraint::Percentage(22),  // Profit
        ])
        .column_spacing(1);

    f.render_stateful_widget(table, area, &mut report.table_state);
}

fn draw_summary<B: Backend>(f: &mut Frame<B>, report: &Report, area: Rect) {
    let summary = view::summary(&report.all_data);
    let color = profit_color(summary.positive);
    let item = |label: &'static str, value: String, color: Color| {
        vec![
            Span::styled(format!("{} ", label), Style::default().fg(MUTED)),
            Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::raw("    "),
        ]
    };

    let mut spans = item("총 투자원금", summary.total_invest, Color::White);
    spans.extend(item("총 평가금액", summary.total_eval, Color::White));
    spans.extend(item("총 평가손익", summary.total_profit, color));
    spans.extend(item("누적 수익률", summary.total_rate, color));

    let footer = Paragraph::new(Spans::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}
