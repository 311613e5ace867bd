use tui::widgets::TableState;
use itertools::Itertools;

use crate::app::color::ColorAllocator;
use crate::app::filter::{Filter, SortColumn, ViewState};
use crate::models::chart::ChartSeries;
use crate::models::config::Config;
use crate::models::position::{derive, DerivedPosition, Position};
use crate::models::ranking::TopRanker;
use crate::services::chart::{assemble, TickerResult};
use crate::services::logger::{log_error, log_info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Network work the runtime has to start on behalf of the app.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Positions { session: u64, user_id: String },
    TopRanker { session: u64 },
    Chart { session: u64, generation: u64, tickers: Vec<String> },
}

/// Completed network work, fed back into the app by the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    Positions { session: u64, result: Result<Vec<Position>, String> },
    TopRanker { session: u64, result: Result<TopRanker, String> },
    Chart { session: u64, generation: u64, batch: Vec<TickerResult> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartState {
    Idle,
    Loading,
    /// An empty vector means every ticker failed.
    Ready(Vec<ChartSeries>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BannerState {
    Hidden,
    Loading,
    Ready(TopRanker),
    Failed,
}

/// Everything that lives exactly as long as one open popup.
pub struct Report {
    pub user_id: String,
    pub session: u64,
    pub load: LoadState,
    pub all_data: Vec<DerivedPosition>,
    pub ranked: Vec<DerivedPosition>,
    pub view: ViewState,
    pub table_state: TableState,
    pub chart: ChartState,
    pub chart_generation: u64,
    pub colors: ColorAllocator,
    pub banner: BannerState,
}

impl Report {
    fn new(user_id: String, session: u64, show_leaderboard: bool) -> Report {
        Report {
            user_id,
            session,
            load: LoadState::Loading,
            all_data: Vec::new(),
            ranked: Vec::new(),
            view: ViewState::default(),
            table_state: TableState::default(),
            chart: ChartState::Idle,
            chart_generation: 0,
            colors: ColorAllocator::new(),
            banner: if show_leaderboard { BannerState::Loading } else { BannerState::Hidden },
        }
    }

    fn rerank(&mut self) {
        self.ranked = self.view.apply(&self.all_data);
    }

    /// First `n` distinct tickers of the ranked list.
    pub fn top_tickers(&self, n: usize) -> Vec<String> {
        self.ranked
            .iter()
            .map(|p| p.code().to_string())
            .unique()
            .take(n)
            .collect()
    }

    fn request_chart(&mut self, tickers: Vec<String>) -> Job {
        self.chart_generation += 1;
        self.chart = ChartState::Loading;
        Job::Chart {
            session: self.session,
            generation: self.chart_generation,
            tickers,
        }
    }
}

pub enum Modal {
    Closed,
    Open(Box<Report>),
}

pub struct App {
    pub config: Config,
    pub modal: Modal,
    pub input_mode: InputMode,
    pub input: String,
    pub last_error: Option<String>,
    next_session: u64,
}

impl App {
    pub fn new(config: Config) -> App {
        App {
            config,
            modal: Modal::Closed,
            input_mode: InputMode::Normal,
            input: String::new(),
            last_error: None,
            next_session: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.modal, Modal::Open(_))
    }

    pub fn report(&self) -> Option<&Report> {
        match &self.modal {
            Modal::Open(report) => Some(&**report),
            Modal::Closed => None,
        }
    }

    pub fn report_mut(&mut self) -> Option<&mut Report> {
        match &mut self.modal {
            Modal::Open(report) => Some(&mut **report),
            Modal::Closed => None,
        }
    }

    pub fn enter_edit_mode(&mut self) {
        self.input_mode = InputMode::Editing;
        self.input.clear();
    }

    pub fn exit_edit_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    /// Opens the report for the typed user id.
    pub fn submit_input(&mut self) -> Vec<Job> {
        let user_id = self.input.trim().to_string();
        self.exit_edit_mode();
        if user_id.is_empty() {
            self.last_error = Some("Enter a user id".to_string());
            return Vec::new();
        }
        self.open_report(&user_id)
    }

    /// Entry point. Does nothing while a report is already open.
    pub fn open_report(&mut self, user_id: &str) -> Vec<Job> {
        if self.is_open() {
            return Vec::new();
        }
        self.next_session += 1;
        let session = self.next_session;
        log_info("Report", &format!("Opening report for {} (session {})", user_id, session)).unwrap_or(());

        self.last_error = None;
        self.modal = Modal::Open(Box::new(Report::new(
            user_id.to_string(),
            session,
            self.config.show_leaderboard,
        )));

        let mut jobs = vec![Job::Positions {
            session,
            user_id: user_id.to_string(),
        }];
        if self.config.show_leaderboard {
            jobs.push(Job::TopRanker { session });
        }
        jobs
    }

    /// Drops the popup, its backdrop and all session data in one step.
    pub fn close_report(&mut self) {
        self.modal = Modal::Closed;
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Vec<Job> {
        match event {
            AppEvent::Positions { session, result } => self.receive_positions(session, result),
            AppEvent::TopRanker { session, result } => {
                self.receive_top_ranker(session, result);
                Vec::new()
            }
            AppEvent::Chart { session, generation, batch } => {
                self.receive_chart(session, generation, batch);
                Vec::new()
            }
        }
    }

    fn current_report(&mut self, session: u64, what: &str) -> Option<&mut Report> {
        match &mut self.modal {
            Modal::Open(report) if report.session == session => Some(&mut **report),
            _ => {
                log_info("Stale Response", &format!("Dropping {} for session {}", what, session)).unwrap_or(());
                None
            }
        }
    }

    pub fn receive_positions(&mut self, session: u64, result: Result<Vec<Position>, String>) -> Vec<Job> {
        let top_n = self.config.chart_top_n;
        let fallback: Vec<String> = self
            .config
            .fallback_tickers
            .iter()
            .map(|t| t.code.clone())
            .collect();
        let Some(report) = self.current_report(session, "positions") else {
            return Vec::new();
        };

        let positions = match result {
            Ok(positions) => positions,
            Err(e) => {
                log_error("Positions Load Failed", &e).unwrap_or(());
                report.load = LoadState::Failed(e);
                return Vec::new();
            }
        };

        report.all_data = derive(&positions);
        report.load = LoadState::Loaded;
        report.rerank();
        if report.all_data.is_empty() {
            report.chart = ChartState::Ready(Vec::new());
            return Vec::new();
        }
        if !report.ranked.is_empty() {
            report.table_state.select(Some(0));
        }

        let mut tickers = report.top_tickers(top_n);
        for code in fallback {
            if tickers.len() >= top_n {
                break;
            }
            if !tickers.contains(&code) {
                tickers.push(code);
            }
        }
        vec![report.request_chart(tickers)]
    }

    pub fn receive_top_ranker(&mut self, session: u64, result: Result<TopRanker, String>) {
        let Some(report) = self.current_report(session, "ranking") else {
            return;
        };
        report.banner = match result {
            Ok(ranker) => BannerState::Ready(ranker),
            Err(e) => {
                log_error("Ranking Load Failed", &e).unwrap_or(());
                BannerState::Failed
            }
        };
    }

    /// Applies a chart batch unless a newer chart request has been issued since.
    pub fn receive_chart(&mut self, session: u64, generation: u64, batch: Vec<TickerResult>) {
        let config = self.config.clone();
        let Some(report) = self.current_report(session, "chart") else {
            return;
        };
        if generation != report.chart_generation {
            log_info(
                "Stale Response",
                &format!("Dropping chart generation {} (current {})", generation, report.chart_generation),
            )
            .unwrap_or(());
            return;
        }
        let series = assemble(batch, &report.all_data, &config, &mut report.colors);
        log_info("Chart", &format!("Drawing {} series", series.len())).unwrap_or(());
        report.chart = ChartState::Ready(series);
    }

    pub fn set_filter(&mut self, filter: Filter) -> Vec<Job> {
        let top_n = self.config.chart_top_n;
        let Some(report) = self.report_mut() else {
            return Vec::new();
        };
        if report.load != LoadState::Loaded {
            return Vec::new();
        }
        report.view.set_filter(filter);
        report.rerank();
        report
            .table_state
            .select(if report.ranked.is_empty() { None } else { Some(0) });

        let tickers = report.top_tickers(top_n);
        if tickers.is_empty() {
            report.chart_generation += 1;
            report.chart = ChartState::Ready(Vec::new());
            return Vec::new();
        }
        vec![report.request_chart(tickers)]
    }

    pub fn toggle_filter(&mut self) -> Vec<Job> {
        match self.report() {
            Some(report) => {
                let next = report.view.filter.toggled();
                self.set_filter(next)
            }
            None => Vec::new(),
        }
    }

    /// Header click. Only the list is re-sorted; the chart stays as it is.
    pub fn click_column(&mut self, column: SortColumn) {
        if let Some(report) = self.report_mut() {
            report.view.click_column(column);
            report.view.selected_row = None;
            report.rerank();
        }
    }

    /// Row click: highlights the row and charts that ticker alone.
    pub fn select_row(&mut self, index: usize) -> Vec<Job> {
        let Some(report) = self.report_mut() else {
            return Vec::new();
        };
        let Some(code) = report.ranked.get(index).map(|p| p.code().to_string()) else {
            return Vec::new();
        };
        report.view.selected_row = Some(index);
        report.table_state.select(Some(index));
        vec![report.request_chart(vec![code])]
    }

    pub fn activate_cursor(&mut self) -> Vec<Job> {
        match self.report().and_then(|r| r.table_state.selected()) {
            Some(index) => self.select_row(index),
            None => Vec::new(),
        }
    }

    pub fn next(&mut self) {
        if let Some(report) = self.report_mut() {
            let len = report.ranked.len();
            if len == 0 {
                return;
            }
            let i = match report.table_state.selected() {
                Some(i) if i + 1 < len => i + 1,
                _ => 0,
            };
            report.table_state.select(Some(i));
        }
    }

    pub fn previous(&mut self) {
        if let Some(report) = self.report_mut() {
            let len = report.ranked.len();
            if len == 0 {
                return;
            }
            let i = match report.table_state.selected() {
                Some(0) | None => len - 1,
                Some(i) => i - 1,
            };
            report.table_state.select(Some(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chart::ChartResponse;
    use crate::services::error::ApiError;

    fn position(code: &str, buy: f64, current: f64, quantity: i64) -> Position {
        Position {
            code: code.to_string(),
            name: format!("{} Corp", code),
            date: "2025-01-01".to_string(),
            buy_price: buy,
            current_price: current,
            quantity,
        }
    }

    fn portfolio() -> Vec<Position> {
        vec![
            position("A", 100.0, 150.0, 10),
            position("B", 200.0, 150.0, 5),
            position("C", 10.0, 30.0, 1),
            position("D", 10.0, 5.0, 1),
        ]
    }

    fn chart_ok(code: &str) -> TickerResult {
        (
            code.to_string(),
            Ok(ChartResponse {
                error: None,
                dates: vec!["2025-01-01".to_string()],
                closes: vec![Some(10_000.0)],
            }),
        )
    }

    fn opened_app() -> (App, u64) {
        let mut app = App::new(Config::default());
        let jobs = app.open_report("user1");
        let session = match &jobs[0] {
            Job::Positions { session, .. } => *session,
            other => panic!("unexpected job {:?}", other),
        };
        (app, session)
    }

    fn chart_job(jobs: &[Job]) -> (u64, Vec<String>) {
        match jobs {
            [Job::Chart { generation, tickers, .. }] => (*generation, tickers.clone()),
            other => panic!("expected one chart job, got {:?}", other),
        }
    }

    #[test]
    fn open_is_idempotent() {
        let (mut app, _) = opened_app();
        app.report_mut().unwrap().view.filter = Filter::Losers;

        assert!(app.open_report("user2").is_empty());
        let report = app.report().unwrap();
        assert_eq!(report.user_id, "user1");
        assert_eq!(report.view.filter, Filter::Losers);
    }

    #[test]
    fn open_requests_positions_and_leaderboard() {
        let mut app = App::new(Config::default());
        let jobs = app.open_report("user1");
        assert_eq!(jobs.len(), 2);
        assert!(matches!(jobs[1], Job::TopRanker { .. }));

        let mut quiet = App::new(Config {
            show_leaderboard: false,
            ..Config::default()
        });
        assert_eq!(quiet.open_report("user1").len(), 1);
        assert_eq!(quiet.report().unwrap().banner, BannerState::Hidden);
    }

    #[test]
    fn positions_populate_ranked_list_and_pad_chart_tickers() {
        let (mut app, session) = opened_app();
        let jobs = app.receive_positions(session, Ok(portfolio()));

        let report = app.report().unwrap();
        assert_eq!(report.load, LoadState::Loaded);
        let codes: Vec<&str> = report.ranked.iter().map(|p| p.code()).collect();
        assert_eq!(codes, vec!["A", "C"]);

        let (_, tickers) = chart_job(&jobs);
        assert_eq!(tickers, vec!["A", "C", "005930.KS", "000660.KS", "035420.KS"]);
        assert_eq!(report.chart, ChartState::Loading);
    }

    #[test]
    fn failed_load_is_visible_and_not_retried() {
        let (mut app, session) = opened_app();
        let jobs = app.receive_positions(session, Err("connection refused".to_string()));

        assert!(jobs.is_empty());
        assert_eq!(
            app.report().unwrap().load,
            LoadState::Failed("connection refused".to_string())
        );
    }

    #[test]
    fn filter_toggle_resets_sort_and_refetches_chart() {
        let (mut app, session) = opened_app();
        app.receive_positions(session, Ok(portfolio()));
        app.click_column(SortColumn::Name);

        let jobs = app.toggle_filter();
        let report = app.report().unwrap();
        assert_eq!(report.view.filter, Filter::Losers);
        assert_eq!(report.view.sort_column, SortColumn::Profit);
        assert!(!report.view.ascending);

        let codes: Vec<&str> = report.ranked.iter().map(|p| p.code()).collect();
        assert_eq!(codes, vec!["D", "B"]);
        let (_, tickers) = chart_job(&jobs);
        assert_eq!(tickers, vec!["D", "B"]);
    }

    #[test]
    fn column_click_does_not_touch_chart() {
        let (mut app, session) = opened_app();
        let jobs = app.receive_positions(session, Ok(portfolio()));
        let (generation, _) = chart_job(&jobs);

        app.click_column(SortColumn::Profit);
        let report = app.report().unwrap();
        assert_eq!(report.chart_generation, generation);
        let codes: Vec<&str> = report.ranked.iter().map(|p| p.code()).collect();
        assert_eq!(codes, vec!["C", "A"]);
    }

    #[test]
    fn row_click_highlights_single_row_and_charts_one_ticker() {
        let (mut app, session) = opened_app();
        app.receive_positions(session, Ok(portfolio()));

        let (_, tickers) = chart_job(&app.select_row(1));
        assert_eq!(tickers, vec!["C"]);
        let (_, tickers) = chart_job(&app.select_row(0));
        assert_eq!(tickers, vec!["A"]);
        assert_eq!(app.report().unwrap().view.selected_row, Some(0));

        assert!(app.select_row(9).is_empty());
    }

    #[test]
    fn latest_chart_request_wins() {
        let (mut app, session) = opened_app();
        let (first, _) = chart_job(&app.receive_positions(session, Ok(portfolio())));
        let (second, _) = chart_job(&app.select_row(0));

        app.receive_chart(session, second, vec![chart_ok("A")]);
        app.receive_chart(session, first, vec![chart_ok("A"), chart_ok("C")]);

        match &app.report().unwrap().chart {
            ChartState::Ready(series) => {
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].name, "A Corp");
            }
            other => panic!("unexpected chart state {:?}", other),
        }
    }

    #[test]
    fn all_failed_tickers_leave_empty_chart() {
        let (mut app, session) = opened_app();
        let (generation, _) = chart_job(&app.receive_positions(session, Ok(portfolio())));

        app.receive_chart(
            session,
            generation,
            vec![("A".to_string(), Err(ApiError::Status(502)))],
        );
        assert_eq!(app.report().unwrap().chart, ChartState::Ready(Vec::new()));
    }

    #[test]
    fn close_discards_session_and_late_responses() {
        let (mut app, session) = opened_app();
        app.close_report();
        assert!(!app.is_open());

        assert!(app.receive_positions(session, Ok(portfolio())).is_empty());
        assert!(app.report().is_none());

        let jobs = app.open_report("user1");
        assert!(matches!(jobs[0], Job::Positions { session: s, .. } if s != session));
        let report = app.report().unwrap();
        assert_eq!(report.load, LoadState::Loading);
        assert!(report.all_data.is_empty());
    }

    #[test]
    fn ranking_failure_sets_banner() {
        let (mut app, session) = opened_app();
        app.receive_top_ranker(session, Err("boom".to_string()));
        assert_eq!(app.report().unwrap().banner, BannerState::Failed);
    }

    #[test]
    fn cursor_wraps_around() {
        let (mut app, session) = opened_app();
        app.receive_positions(session, Ok(portfolio()));

        app.next();
        app.next();
        assert_eq!(app.report().unwrap().table_state.selected(), Some(0));
        app.previous();
        assert_eq!(app.report().unwrap().table_state.selected(), Some(1));
    }

    #[test]
    fn empty_input_does_not_open() {
        let mut app = App::new(Config::default());
        app.enter_edit_mode();
        app.input.push_str("   ");
        assert!(app.submit_input().is_empty());
        assert!(!app.is_open());
        assert!(app.last_error.is_some());
    }
}
