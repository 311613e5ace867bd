use serde::Deserialize;
use tui::style::Color;

/// Raw payload of `/apiEsc/stock-chart-data`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChartResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub closes: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: String,
    pub close: f64,
}

/// One plotted price series (a "trace").
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub ticker: String,
    pub name: String,
    pub color: Color,
    pub points: Vec<PricePoint>,
    /// Indices into `points` where a missing close was dropped right before.
    pub gaps: Vec<usize>,
}

impl ChartSeries {
    /// Splits the series at every gap so the chart never bridges missing data.
    pub fn segments(&self) -> Vec<&[PricePoint]> {
        let mut segments = Vec::new();
        let mut start = 0;
        for &gap in &self.gaps {
            if gap > start {
                segments.push(&self.points[start..gap]);
            }
            start = gap;
        }
        if start < self.points.len() {
            segments.push(&self.points[start..]);
        }
        segments
    }
}

/// Orders `(date, close)` pairs by date and drops null closes, recording
/// where each dropped point sat.
pub fn build_points(response: &ChartResponse, scale: f64) -> (Vec<PricePoint>, Vec<usize>) {
    let mut pairs: Vec<(&String, Option<f64>)> = response
        .dates
        .iter()
        .zip(response.closes.iter().copied())
        .collect();
    // ISO dates sort lexically; stable so equal dates keep source order.
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let scale = if scale > 0.0 { scale } else { 1.0 };
    let mut points = Vec::with_capacity(pairs.len());
    let mut gaps = Vec::new();
    for (date, close) in pairs {
        match close.filter(|c| c.is_finite()) {
            Some(close) => points.push(PricePoint {
                date: date.clone(),
                close: close / scale,
            }),
            None => {
                if gaps.last() != Some(&points.len()) {
                    gaps.push(points.len());
                }
            }
        }
    }
    (points, gaps)
}
