use std::cmp::Ordering;

use crate::models::position::DerivedPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Winners,
    Losers,
}

impl Filter {
    pub fn matches(&self, position: &DerivedPosition) -> bool {
        match self {
            Filter::Winners => position.profit >= 0.0,
            Filter::Losers => position.profit < 0.0,
        }
    }

    pub fn toggled(&self) -> Filter {
        match self {
            Filter::Winners => Filter::Losers,
            Filter::Losers => Filter::Winners,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Filter::Winners => "수익종목 TOP",
            Filter::Losers => "손실종목 TOP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Date,
    Name,
    Invest,
    Rate,
    Profit,
}

impl SortColumn {
    pub const ALL: [SortColumn; 5] = [
        SortColumn::Date,
        SortColumn::Name,
        SortColumn::Invest,
        SortColumn::Rate,
        SortColumn::Profit,
    ];

    /// Direction used when the column is newly selected. Magnitude columns
    /// surface the largest values first.
    pub fn default_ascending(&self) -> bool {
        matches!(self, SortColumn::Name)
    }

    pub fn title(&self) -> &'static str {
        match self {
            SortColumn::Date => "날짜",
            SortColumn::Name => "종목",
            SortColumn::Invest => "투자원금",
            SortColumn::Rate => "수익률",
            SortColumn::Profit => "손익금액",
        }
    }

    fn compare(&self, a: &DerivedPosition, b: &DerivedPosition) -> Ordering {
        match self {
            SortColumn::Date => a.date().cmp(b.date()),
            SortColumn::Name => compare_names(a.name(), b.name()),
            SortColumn::Invest => a.invest.partial_cmp(&b.invest).unwrap_or(Ordering::Equal),
            SortColumn::Rate => a.rate.partial_cmp(&b.rate).unwrap_or(Ordering::Equal),
            SortColumn::Profit => a.profit.partial_cmp(&b.profit).unwrap_or(Ordering::Equal),
        }
    }
}

// Case-folded first so "apple" and "Apple" sit together, raw text second so
// the order stays total.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Filters by profit sign, then sorts by `column`. The sort is stable, so
/// rows that compare equal keep their incoming order.
pub fn apply(
    data: &[DerivedPosition],
    filter: Filter,
    column: SortColumn,
    ascending: bool,
) -> Vec<DerivedPosition> {
    let mut filtered: Vec<DerivedPosition> = data
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect();

    filtered.sort_by(|a, b| {
        let cmp = column.compare(a, b);
        if ascending { cmp } else { cmp.reverse() }
    });
    filtered
}

/// Interactive state of an open report.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub filter: Filter,
    pub sort_column: SortColumn,
    pub ascending: bool,
    /// Row index into the current ranked list.
    pub selected_row: Option<usize>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            filter: Filter::Winners,
            sort_column: SortColumn::Profit,
            ascending: false,
            selected_row: None,
        }
    }
}

impl ViewState {
    /// Header click: same column flips direction, a new column starts at its default.
    pub fn click_column(&mut self, column: SortColumn) {
        if self.sort_column == column {
            self.ascending = !self.ascending;
        } else {
            self.sort_column = column;
            self.ascending = column.default_ascending();
        }
    }

    /// Switching the filter always goes back to profit, largest first.
    pub fn set_filter(&mut self, filter: Filter) {
        let defaults = ViewState::default();
        self.filter = filter;
        self.sort_column = defaults.sort_column;
        self.ascending = defaults.ascending;
        self.selected_row = None;
    }

    pub fn apply(&self, data: &[DerivedPosition]) -> Vec<DerivedPosition> {
        apply(data, self.filter, self.sort_column, self.ascending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::position::{derive, Position};

    fn position(code: &str, name: &str, date: &str, buy: f64, current: f64, quantity: i64) -> Position {
        Position {
            code: code.to_string(),
            name: name.to_string(),
            date: date.to_string(),
            buy_price: buy,
            current_price: current,
            quantity,
        }
    }

    fn sample() -> Vec<DerivedPosition> {
        derive(&[
            position("A", "alpha", "2025-01-03", 100.0, 150.0, 10),
            position("B", "Bravo", "2025-01-01", 200.0, 150.0, 5),
            position("C", "charlie", "2025-01-02", 50.0, 50.0, 3),
            position("D", "Delta", "2025-01-05", 10.0, 40.0, 2),
            position("E", "echo", "2025-01-04", 90.0, 30.0, 1),
        ])
    }

    fn codes(rows: &[DerivedPosition]) -> Vec<&str> {
        rows.iter().map(|r| r.code()).collect()
    }

    #[test]
    fn worked_example_partitions_by_profit_sign() {
        let data = derive(&[
            position("A", "A", "", 100.0, 150.0, 10),
            position("B", "B", "", 200.0, 150.0, 5),
        ]);
        assert_eq!(codes(&apply(&data, Filter::Winners, SortColumn::Profit, false)), vec!["A"]);
        assert_eq!(codes(&apply(&data, Filter::Losers, SortColumn::Profit, false)), vec!["B"]);
    }

    #[test]
    fn winners_and_losers_cover_every_position_once() {
        let data = sample();
        let winners = apply(&data, Filter::Winners, SortColumn::Profit, false);
        let losers = apply(&data, Filter::Losers, SortColumn::Profit, false);

        assert!(winners.iter().all(|p| p.profit >= 0.0));
        assert!(losers.iter().all(|p| p.profit < 0.0));

        let mut all: Vec<&str> = codes(&winners);
        all.extend(codes(&losers));
        all.sort();
        assert_eq!(all, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn zero_profit_counts_as_winner() {
        let data = sample();
        let winners = apply(&data, Filter::Winners, SortColumn::Profit, false);
        assert_eq!(codes(&winners), vec!["A", "D", "C"]);
    }

    #[test]
    fn flipping_direction_reverses_output() {
        let data = sample();
        for column in SortColumn::ALL {
            let desc = apply(&data, Filter::Winners, column, false);
            let mut asc = apply(&data, Filter::Winners, column, true);
            asc.reverse();
            assert_eq!(codes(&desc), codes(&asc), "column {:?}", column);
        }
    }

    #[test]
    fn names_sort_case_insensitively() {
        let data = sample();
        let rows = apply(&data, Filter::Winners, SortColumn::Name, true);
        assert_eq!(codes(&rows), vec!["A", "C", "D"]);
    }

    #[test]
    fn dates_sort_chronologically() {
        let data = sample();
        let rows = apply(&data, Filter::Losers, SortColumn::Date, true);
        assert_eq!(codes(&rows), vec!["B", "E"]);
    }

    #[test]
    fn ties_keep_incoming_order() {
        let data = derive(&[
            position("X", "x", "", 10.0, 20.0, 1),
            position("Y", "y", "", 10.0, 20.0, 1),
        ]);
        assert_eq!(codes(&apply(&data, Filter::Winners, SortColumn::Profit, false)), vec!["X", "Y"]);
        assert_eq!(codes(&apply(&data, Filter::Winners, SortColumn::Profit, true)), vec!["X", "Y"]);
    }

    #[test]
    fn column_clicks_toggle_and_reset_direction() {
        let mut view = ViewState::default();
        view.click_column(SortColumn::Profit);
        assert!(view.ascending);

        view.click_column(SortColumn::Name);
        assert_eq!(view.sort_column, SortColumn::Name);
        assert!(view.ascending);

        view.click_column(SortColumn::Rate);
        assert!(!view.ascending);
    }

    #[test]
    fn filter_change_resets_sort() {
        let mut view = ViewState::default();
        view.click_column(SortColumn::Name);
        view.selected_row = Some(2);

        view.set_filter(Filter::Losers);
        assert_eq!(view.filter, Filter::Losers);
        assert_eq!(view.sort_column, SortColumn::Profit);
        assert!(!view.ascending);
        assert_eq!(view.selected_row, None);
    }
}
