use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

pub const CURRENCY_SYMBOL: &str = "KSh";

/// Formats an amount as Kenyan shillings, e.g. `KSh 1,234.56`.
/// NaN and infinities format as `KSh 0.00`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{} 0.00", CURRENCY_SYMBOL);
    }
    let fixed = format!("{:.2}", amount.abs());
    let negative = amount < 0.0 && fixed != "0.00";
    with_sign(negative, &group_fixed(&fixed))
}

/// Decimal variant of [`format_currency`]; rounds half away from zero
pub fn format_decimal_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{:.2}", rounded.abs());
    with_sign(rounded.is_sign_negative() && !rounded.is_zero(), &group_fixed(&fixed))
}

fn with_sign(negative: bool, grouped: &str) -> String {
    if negative {
        format!("-{} {}", CURRENCY_SYMBOL, grouped)
    } else {
        format!("{} {}", CURRENCY_SYMBOL, grouped)
    }
}

/// Parses `KSh 1,234.56`, `1234.56` or `-KSh 12` into a decimal
pub fn parse_currency(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let digits: String = rest
        .trim_start_matches(CURRENCY_SYMBOL)
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if digits.is_empty() || digits.starts_with('-') {
        return None;
    }
    let value = Decimal::from_str(&digits).ok()?;
    Some(if negative { -value } else { value })
}

/// Formats a number with thousands separators and a fixed number of decimals
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{:.*}", decimals, 0.0);
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let grouped = group_fixed(&fixed);
    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Profit margin of `revenue` over `cost` as a percentage with one decimal, e.g. `40.0%`
pub fn calculate_profit_margin(revenue: f64, cost: f64) -> String {
    if !revenue.is_finite() || !cost.is_finite() || revenue <= 0.0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", (revenue - cost) / revenue * 100.0)
}

/// Percentage change from `old` to `new`. A zero baseline gives 100 when the
/// new value is positive, otherwise 0.
pub fn calculate_percentage_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        return if new > 0.0 { 100.0 } else { 0.0 };
    }
    (new - old) / old.abs() * 100.0
}

/// Lossy conversion used where money feeds chart data
pub fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

/// Inserts thousands separators into an unsigned fixed-point string
fn group_fixed(fixed: &str) -> String {
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed, None),
    };

    let len = int_part.len();
    let mut grouped = String::with_capacity(len + len / 3 + 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(1234.56, "KSh 1,234.56")]
    #[case(0.0, "KSh 0.00")]
    #[case(999.999, "KSh 1,000.00")]
    #[case(1_000_000.0, "KSh 1,000,000.00")]
    #[case(-2500.5, "-KSh 2,500.50")]
    #[case(-0.001, "KSh 0.00")]
    #[case(f64::NAN, "KSh 0.00")]
    #[case(f64::INFINITY, "KSh 0.00")]
    fn formats_shillings(#[case] amount: f64, #[case] expected: &str) {
        assert_eq!(format_currency(amount), expected);
    }

    #[test]
    fn decimal_currency_rounds_half_up() {
        assert_eq!(format_decimal_currency(dec!(1234.565)), "KSh 1,234.57");
        assert_eq!(format_decimal_currency(dec!(-45)), "-KSh 45.00");
    }

    #[rstest]
    #[case("KSh 1,234.56", Some(dec!(1234.56)))]
    #[case("1234", Some(dec!(1234)))]
    #[case("-KSh 12.50", Some(dec!(-12.50)))]
    #[case("KSh", None)]
    #[case("twelve", None)]
    fn parses_shillings(#[case] input: &str, #[case] expected: Option<Decimal>) {
        assert_eq!(parse_currency(input), expected);
    }

    #[test]
    fn profit_margin_has_one_decimal() {
        assert_eq!(calculate_profit_margin(1000.0, 600.0), "40.0%");
        assert_eq!(calculate_profit_margin(0.0, 600.0), "0.0%");
        assert_eq!(calculate_profit_margin(300.0, 400.0), "-33.3%");
    }

    #[test]
    fn percentage_change_handles_zero_baseline() {
        assert_eq!(calculate_percentage_change(0.0, 50.0), 100.0);
        assert_eq!(calculate_percentage_change(0.0, 0.0), 0.0);
        assert_eq!(calculate_percentage_change(200.0, 150.0), -25.0);
    }

    #[test]
    fn numbers_are_grouped() {
        assert_eq!(format_number(1234567.891, 1), "1,234,567.9");
        assert_eq!(format_number(12.0, 0), "12");
        assert_eq!(format_number(-1500.0, 2), "-1,500.00");
    }

    proptest! {
        #[test]
        fn formatted_currency_parses_back(cents in -10_000_000_000i64..10_000_000_000i64) {
            let amount = Decimal::new(cents, 2);
            let formatted = format_decimal_currency(amount);
            prop_assert_eq!(parse_currency(&formatted), Some(amount));
        }
    }
}
