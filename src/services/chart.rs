use futures::future::join_all;
use itertools::Itertools;

use crate::app::color::ColorAllocator;
use crate::models::chart::{build_points, ChartResponse, ChartSeries};
use crate::models::config::Config;
use crate::models::position::DerivedPosition;
use crate::services::api::ReportSource;
use crate::services::error::ApiError;
use crate::services::logger::{log_error, log_info};

/// Settled result of one ticker's request.
pub type TickerResult = (String, Result<ChartResponse, ApiError>);

/// Requests every ticker concurrently and waits for all of them to settle.
/// A failing ticker never prevents the others from completing.
pub async fn fetch_batch(source: &dyn ReportSource, tickers: &[String]) -> Vec<TickerResult> {
    let unique: Vec<String> = tickers.iter().unique().cloned().collect();
    log_info("Chart", &format!("Fetching {} series: {}", unique.len(), unique.join(","))).unwrap_or(());

    let requests = unique.iter().map(|code| source.fetch_chart(code));
    let results = join_all(requests).await;

    unique.into_iter().zip(results).collect()
}

/// Turns settled responses into plottable series, in request order.
/// Errored, error-flagged and date-less responses are left out.
pub fn assemble(
    batch: Vec<TickerResult>,
    positions: &[DerivedPosition],
    config: &Config,
    colors: &mut ColorAllocator,
) -> Vec<ChartSeries> {
    let mut series = Vec::with_capacity(batch.len());
    for (ticker, result) in batch {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                log_error("Chart Fetch Error", &format!("{}: {}", ticker, e)).unwrap_or(());
                continue;
            }
        };
        if let Some(error) = response.error.as_deref() {
            log_info("Chart", &format!("Skipping {}: {}", ticker, error)).unwrap_or(());
            continue;
        }
        if response.dates.is_empty() {
            log_info("Chart", &format!("Skipping {}: no dates", ticker)).unwrap_or(());
            continue;
        }

        let (points, gaps) = build_points(&response, config.price_scale);
        let name = positions
            .iter()
            .find(|p| p.code() == ticker)
            .map(|p| p.name().to_string())
            .or_else(|| config.fallback_name(&ticker).map(str::to_string))
            .unwrap_or_else(|| ticker.clone());
        let color = colors.color_for(&ticker);

        series.push(ChartSeries {
            ticker,
            name,
            color,
            points,
            gaps,
        });
    }
    series
}
