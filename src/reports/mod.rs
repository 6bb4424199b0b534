//! Report aggregation, chart shaping and CSV export over in-memory rows.

pub mod charts;
pub mod export;
pub mod generator;

use crate::errors::ServiceError;
use chrono::NaiveDate;
use thiserror::Error;

pub use charts::{ChartData, ChartGenerator, Color, Dataset};
pub use export::export_csv;
pub use generator::{
    Bucket, DailyBreakdown, ExpenseEntry, Period, ProductPerformance, Report, ReportGenerator,
    ReportPeriod, SaleEntry,
};

/// Longest range a report or chart covers; the breakdown has one row per day
pub const MAX_REPORT_DAYS: i64 = 366;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid month {month} for year {year}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("End date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("Range {start} to {end} is longer than {max_days} days")]
    RangeTooLong {
        start: NaiveDate,
        end: NaiveDate,
        max_days: i64,
    },
    #[error("CSV rows must serialize to objects")]
    NotARecord,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Inclusive range check shared by reports and charts
pub fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ReportError> {
    if end < start {
        return Err(ReportError::InvalidRange { start, end });
    }
    if (end - start).num_days() + 1 > MAX_REPORT_DAYS {
        return Err(ReportError::RangeTooLong {
            start,
            end,
            max_days: MAX_REPORT_DAYS,
        });
    }
    Ok(())
}

impl From<ReportError> for ServiceError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::InvalidMonth { .. }
            | ReportError::InvalidRange { .. }
            | ReportError::RangeTooLong { .. } => {
                ServiceError::ValidationError(err.to_string())
            }
            other => ServiceError::InternalError(other.to_string()),
        }
    }
}
