//! Kenyan shilling and Africa/Nairobi date formatting.

pub mod currency;
pub mod dates;

pub use currency::{
    calculate_percentage_change, calculate_profit_margin, format_currency,
    format_decimal_currency, format_number, parse_currency,
};
pub use dates::{
    days_until_due, end_of_month, format_date, format_date_time, format_time, is_overdue,
    relative_time, start_of_month, start_of_week, today,
};
