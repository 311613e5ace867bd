use std::collections::HashMap;
use tui::style::Color;

pub const PALETTE: [Color; 10] = [
    Color::Rgb(0x3b, 0x82, 0xf6),
    Color::Rgb(0x10, 0xb9, 0x81),
    Color::Rgb(0xf5, 0x9e, 0x0b),
    Color::Rgb(0xef, 0x44, 0x44),
    Color::Rgb(0x8b, 0x5c, 0xf6),
    Color::Rgb(0xec, 0x48, 0x99),
    Color::Rgb(0x06, 0xb6, 0xd4),
    Color::Rgb(0xf4, 0x3f, 0x5e),
    Color::Rgb(0x84, 0xcc, 0x16),
    Color::Rgb(0xa8, 0x55, 0xf7),
];

/// Hands out palette colors per ticker in first-seen order. A ticker keeps
/// its color for the lifetime of the allocator.
#[derive(Debug, Default)]
pub struct ColorAllocator {
    assigned: HashMap<String, Color>,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_for(&mut self, ticker: &str) -> Color {
        if let Some(color) = self.assigned.get(ticker) {
            return *color;
        }
        let color = PALETTE[self.assigned.len() % PALETTE.len()];
        self.assigned.insert(ticker.to_string(), color);
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_ticker_keeps_its_color() {
        let mut colors = ColorAllocator::new();
        let first = colors.color_for("005930.KS");
        colors.color_for("000660.KS");
        assert_eq!(colors.color_for("005930.KS"), first);
    }

    #[test]
    fn nth_ticker_gets_nth_palette_entry_modulo_len() {
        let mut colors = ColorAllocator::new();
        for n in 0..(PALETTE.len() * 2 + 3) {
            let ticker = format!("T{}", n);
            assert_eq!(colors.color_for(&ticker), PALETTE[n % PALETTE.len()]);
        }
    }
}
