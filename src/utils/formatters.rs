use itertools::Itertools;

/// Floors a won amount and groups thousands: `-1234.5` -> `-1,235`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let floored = value.floor() as i64;
    let digits = floored.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .join(",");
    if floored < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Amount with the currency suffix used throughout the report.
pub fn format_won(value: f64) -> String {
    format!("{}원", format_amount(value))
}

/// Amount with an explicit sign, as shown in the top-3 panels.
pub fn format_signed_amount(value: f64) -> String {
    if value > 0.0 {
        format!("+{}", format_amount(value))
    } else {
        format_amount(value)
    }
}

pub fn format_rate(rate: f64, decimals: usize) -> String {
    let rate = if rate.is_finite() { rate } else { 0.0 };
    format!("{:.*}%", decimals, rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_after_flooring() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.9), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1234567.8), "1,234,567");
        assert_eq!(format_amount(-250.0), "-250");
        assert_eq!(format_amount(-1234.5), "-1,235");
        assert_eq!(format_amount(f64::NAN), "0");
    }

    #[test]
    fn formats_won_and_signed_values() {
        assert_eq!(format_won(2000.0), "2,000원");
        assert_eq!(format_signed_amount(500.0), "+500");
        assert_eq!(format_signed_amount(-60.0), "-60");
        assert_eq!(format_signed_amount(0.0), "0");
    }

    #[test]
    fn formats_rates() {
        assert_eq!(format_rate(12.5, 2), "12.50%");
        assert_eq!(format_rate(-25.0, 1), "-25.0%");
        assert_eq!(format_rate(f64::INFINITY, 1), "0.0%");
    }
}
