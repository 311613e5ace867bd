use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One held stock lot as returned by `/apiEsc/popup-status`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(from = "PositionRecord")]
pub struct Position {
    pub code: String,
    pub name: String,
    pub date: String,
    pub buy_price: f64,
    pub current_price: f64,
    pub quantity: i64,
}

/// Wire shape of a position. The server sends `ticker` next to `code`
/// (usually the same value); `ticker` is only used when `code` is blank.
/// Extra keys such as `returnRate` are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    ticker: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    date: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    buy_price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    current_price: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    quantity: i64,
}

impl From<PositionRecord> for Position {
    fn from(record: PositionRecord) -> Self {
        let code = if record.code.trim().is_empty() {
            record.ticker
        } else {
            record.code
        };
        Position {
            code,
            name: record.name,
            date: record.date,
            buy_price: record.buy_price,
            current_price: record.current_price,
            quantity: record.quantity,
        }
    }
}

impl Position {
    /// Name shown in tables and legends, falling back to the ticker.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.code
        } else {
            &self.name
        }
    }
}

/// A position together with its computed invest/profit/rate metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedPosition {
    pub position: Position,
    pub invest: f64,
    pub profit: f64,
    pub rate: f64,
}

impl DerivedPosition {
    pub fn from_position(position: Position) -> Self {
        let quantity = position.quantity as f64;
        let invest = position.buy_price * quantity;
        let profit = (position.current_price - position.buy_price) * quantity;
        let rate = if invest > 0.0 { profit / invest * 100.0 } else { 0.0 };

        DerivedPosition {
            position,
            invest,
            profit,
            rate,
        }
    }

    pub fn code(&self) -> &str {
        &self.position.code
    }

    pub fn name(&self) -> &str {
        self.position.display_name()
    }

    pub fn date(&self) -> &str {
        &self.position.date
    }

    /// Market value at the current price.
    pub fn eval(&self) -> f64 {
        self.position.current_price * self.position.quantity as f64
    }

    pub fn is_winner(&self) -> bool {
        self.profit >= 0.0
    }
}

/// Derives metrics for every position, keeping length and order.
pub fn derive(positions: &[Position]) -> Vec<DerivedPosition> {
    positions
        .iter()
        .cloned()
        .map(DerivedPosition::from_position)
        .collect()
}

/// Portfolio-wide totals shown in the summary footer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub total_invest: f64,
    pub total_eval: f64,
    pub total_profit: f64,
    pub total_rate: f64,
}

impl Summary {
    pub fn from_positions(positions: &[DerivedPosition]) -> Self {
        let total_invest: f64 = positions.iter().map(|p| p.invest).sum();
        let total_eval: f64 = positions.iter().map(|p| p.eval()).sum();
        let total_profit = total_eval - total_invest;
        let total_rate = if total_invest > 0.0 {
            total_profit / total_invest * 100.0
        } else {
            0.0
        };

        Summary {
            total_invest,
            total_eval,
            total_profit,
            total_rate,
        }
    }
}

// Text fields may arrive as null when the upstream document lacks them.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

// Prices come back as numbers, numeric strings or null depending on the
// upstream record. Anything without a leading number is treated as zero.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => leading_float(&s),
        _ => 0.0,
    };
    Ok(if parsed.is_finite() { parsed } else { 0.0 })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => leading_integer(&s),
        _ => 0,
    };
    Ok(parsed)
}

/// Parses the leading decimal number of a string ("1,000" -> 1, "12.5abc" -> 12.5).
fn leading_float(raw: &str) -> f64 {
    let bytes = raw.trim_start().as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    let text = std::str::from_utf8(&bytes[..end]).unwrap_or("0");
    text.parse::<f64>().unwrap_or(0.0)
}

/// Parses the leading integer of a string ("12.7" -> 12, "3 shares" -> 3).
fn leading_integer(raw: &str) -> i64 {
    let trimmed = raw.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}
