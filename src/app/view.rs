//! Plain view models computed from [`Report`]. Drawing code in `ui` only
//! lays these out, so everything the user reads is testable without a
//! terminal.

use chrono::{Datelike, NaiveDate};

use crate::app::filter::{SortColumn, ViewState};
use crate::app::state::{BannerState, ChartState, LoadState, Report};
use crate::models::position::{DerivedPosition, Summary};
use crate::utils::formatters::{format_amount, format_rate, format_signed_amount, format_won};

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub text: String,
    pub active: bool,
}

pub fn header_cells(view: &ViewState) -> Vec<HeaderCell> {
    SortColumn::ALL
        .iter()
        .map(|&column| {
            let active = column == view.sort_column;
            let arrow = match (active, view.ascending) {
                (true, true) => "▲",
                (true, false) => "▼",
                (false, _) => "↕",
            };
            HeaderCell {
                text: format!("{} {}", column.title(), arrow),
                active,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub date: String,
    pub name: String,
    pub invest: String,
    pub rate: String,
    pub profit: String,
    pub positive: bool,
    pub selected: bool,
}

pub fn list_rows(report: &Report) -> Vec<ListRow> {
    report
        .ranked
        .iter()
        .enumerate()
        .map(|(i, p)| ListRow {
            date: p.date().to_string(),
            name: p.name().to_string(),
            invest: format_amount(p.invest),
            rate: format_rate(p.rate, 1),
            profit: format_amount(p.profit),
            positive: p.is_winner(),
            selected: report.view.selected_row == Some(i),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopEntry {
    pub name: String,
    pub profit: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TopThree {
    pub gainers: Vec<TopEntry>,
    pub losers: Vec<TopEntry>,
}

/// Best and worst three contributors over the whole portfolio, regardless
/// of the active filter.
pub fn top_three(all: &[DerivedPosition]) -> TopThree {
    let entry = |p: &DerivedPosition| TopEntry {
        name: p.name().to_string(),
        profit: format_signed_amount(p.profit),
    };

    let mut gainers: Vec<&DerivedPosition> = all.iter().filter(|p| p.profit > 0.0).collect();
    gainers.sort_by(|a, b| b.profit.total_cmp(&a.profit));
    let mut losers: Vec<&DerivedPosition> = all.iter().filter(|p| p.profit < 0.0).collect();
    losers.sort_by(|a, b| a.profit.total_cmp(&b.profit));

    TopThree {
        gainers: gainers.into_iter().take(3).map(entry).collect(),
        losers: losers.into_iter().take(3).map(entry).collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    pub total_invest: String,
    pub total_eval: String,
    pub total_profit: String,
    pub total_rate: String,
    pub positive: bool,
}

pub fn summary(all: &[DerivedPosition]) -> SummaryView {
    let totals = Summary::from_positions(all);
    SummaryView {
        total_invest: format_won(totals.total_invest),
        total_eval: format_won(totals.total_eval),
        total_profit: format_won(totals.total_profit),
        total_rate: format_rate(totals.total_rate, 2),
        positive: totals.total_profit >= 0.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BannerView {
    pub headline: String,
    pub detail: String,
    pub amount_label: String,
    pub amount: String,
    pub warning: bool,
}

/// Banner above the report: the global leader when known, otherwise the
/// viewed user's own total.
pub fn banner(report: &Report) -> BannerView {
    let own_profit: f64 = report.all_data.iter().map(|p| p.profit).sum();
    let own = |detail: &str, warning: bool| BannerView {
        headline: format!("분석 중: {}", report.user_id),
        detail: detail.to_string(),
        amount_label: "조회 유저 총 손익".to_string(),
        amount: format_won(own_profit),
        warning,
    };

    match &report.banner {
        BannerState::Hidden => own("", false),
        BannerState::Loading => own("🏆 랭킹 정보 로딩 중...", false),
        BannerState::Failed => own("⚠️ 랭킹 데이터 연결 실패", true),
        BannerState::Ready(ranker) => BannerView {
            headline: format!("분석 중: {}", report.user_id),
            detail: format!("🏆 전체 1위: {}", ranker.display_name()),
            amount_label: "1위 누적 수익".to_string(),
            amount: format_won(ranker.total_profit),
            warning: false,
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesView {
    pub name: String,
    pub color: tui::style::Color,
    /// Unbroken runs of `(day, price)`; a new run starts after each gap.
    pub segments: Vec<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartView {
    Loading,
    Empty,
    Plot {
        series: Vec<SeriesView>,
        x_bounds: [f64; 2],
        y_bounds: [f64; 2],
        x_labels: Vec<String>,
        y_labels: Vec<String>,
    },
}

fn day_number(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d").ok()
}

pub fn chart(report: &Report) -> ChartView {
    let series = match &report.chart {
        ChartState::Idle | ChartState::Loading => {
            return match report.load {
                LoadState::Failed(_) => ChartView::Empty,
                _ => ChartView::Loading,
            }
        }
        ChartState::Ready(series) => series,
    };

    let views: Vec<SeriesView> = series
        .iter()
        .map(|s| SeriesView {
            name: s.name.clone(),
            color: s.color,
            segments: s
                .segments()
                .into_iter()
                .map(|run| {
                    run.iter()
                        .filter_map(|p| {
                            day_number(&p.date).map(|d| (d.num_days_from_ce() as f64, p.close))
                        })
                        .collect::<Vec<_>>()
                })
                .filter(|run| !run.is_empty())
                .collect(),
        })
        .filter(|s| !s.segments.is_empty())
        .collect();

    let points = || views.iter().flat_map(|s| s.segments.iter().flatten());
    let (Some(x_min), Some(x_max)) = (
        points().map(|p| p.0).reduce(f64::min),
        points().map(|p| p.0).reduce(f64::max),
    ) else {
        return ChartView::Empty;
    };
    let y_min = points().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = points().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let pad = ((y_max - y_min) * 0.05).max(0.5);
    let y_bounds = [y_min - pad, y_max + pad];
    let x_bounds = if x_max > x_min { [x_min, x_max] } else { [x_min - 1.0, x_max + 1.0] };

    let label = |day: f64| {
        NaiveDate::from_num_days_from_ce_opt(day.round() as i32)
            .map(|d| d.format("%y.%m.%d").to_string())
            .unwrap_or_default()
    };
    let x_labels = vec![
        label(x_bounds[0]),
        label((x_bounds[0] + x_bounds[1]) / 2.0),
        label(x_bounds[1]),
    ];
    let y_labels = vec![
        format!("{:.1}", y_bounds[0]),
        format!("{:.1}", (y_bounds[0] + y_bounds[1]) / 2.0),
        format!("{:.1}", y_bounds[1]),
    ];

    ChartView::Plot {
        series: views,
        x_bounds,
        y_bounds,
        x_labels,
        y_labels,
    }
}
