//! Chart.js-shaped data built from the report aggregates.

use super::generator::{Bucket, Period, ReportGenerator};
use crate::formatting::currency::to_f64;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use utoipa::ToSchema;

/// Pie/bar colours, cycled when there are more slices than entries
pub const PALETTE: [&str; 8] = [
    "#4CAF50", "#2196F3", "#FF9800", "#E91E63", "#9C27B0", "#00BCD4", "#FFC107", "#795548",
];
const REVENUE_COLOR: &str = "#4CAF50";
const EXPENSE_COLOR: &str = "#F44336";
const PROFIT_COLOR: &str = "#2196F3";

/// One colour for the whole dataset, or one per data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Color {
    Single(String),
    PerPoint(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Color>,
}

impl Dataset {
    fn line(label: &str, data: Vec<f64>, color: &str) -> Self {
        Self {
            label: label.to_string(),
            data,
            background_color: Some(Color::Single(color.to_string())),
            border_color: Some(Color::Single(color.to_string())),
        }
    }

    fn slices(label: &str, data: Vec<f64>) -> Self {
        let colors = palette(data.len());
        Self {
            label: label.to_string(),
            data,
            background_color: Some(Color::PerPoint(colors)),
            border_color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

pub fn palette(len: usize) -> Vec<String> {
    PALETTE.iter().cycle().take(len).map(|c| c.to_string()).collect()
}

pub struct ChartGenerator<'a> {
    reports: &'a ReportGenerator,
}

impl<'a> ChartGenerator<'a> {
    pub fn new(reports: &'a ReportGenerator) -> Self {
        Self { reports }
    }

    /// Revenue per bucket
    pub fn sales_trend(&self, period: Period) -> ChartData {
        let buckets = self.reports.group_sales_by(period);
        ChartData {
            labels: buckets.iter().map(|b| b.key.clone()).collect(),
            datasets: vec![Dataset::line(
                "Revenue",
                buckets.iter().map(|b| to_f64(b.total)).collect(),
                REVENUE_COLOR,
            )],
        }
    }

    /// Revenue and expenses aligned on the union of their bucket keys
    pub fn revenue_vs_expenses(&self, period: Period) -> ChartData {
        let (labels, revenue, expenses) = self.aligned(period);
        ChartData {
            labels,
            datasets: vec![
                Dataset::line("Revenue", revenue.iter().map(|v| to_f64(*v)).collect(), REVENUE_COLOR),
                Dataset::line("Expenses", expenses.iter().map(|v| to_f64(*v)).collect(), EXPENSE_COLOR),
            ],
        }
    }

    /// Revenue minus expenses per bucket
    pub fn profit_trend(&self, period: Period) -> ChartData {
        let (labels, revenue, expenses) = self.aligned(period);
        let profit = revenue
            .iter()
            .zip(&expenses)
            .map(|(r, e)| to_f64(*r - *e))
            .collect();
        ChartData {
            labels,
            datasets: vec![Dataset::line("Net Profit", profit, PROFIT_COLOR)],
        }
    }

    pub fn expenses_by_category(&self) -> ChartData {
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        for expense in self.reports.expenses() {
            *totals
                .entry(expense.category_label().to_string())
                .or_insert(Decimal::ZERO) += expense.amount.unwrap_or_default();
        }
        pie("Expenses", totals)
    }

    pub fn payment_methods(&self) -> ChartData {
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        for sale in self.reports.sales() {
            *totals
                .entry(sale.payment_method.as_str().to_string())
                .or_insert(Decimal::ZERO) += sale.total.unwrap_or_default();
        }
        pie("Revenue", totals)
    }

    pub fn top_products(&self, limit: usize) -> ChartData {
        let top = self.reports.top_products(limit);
        ChartData {
            labels: top.iter().map(|p| p.product_name.clone()).collect(),
            datasets: vec![Dataset::slices(
                "Revenue",
                top.iter().map(|p| to_f64(p.revenue)).collect(),
            )],
        }
    }

    fn aligned(&self, period: Period) -> (Vec<String>, Vec<Decimal>, Vec<Decimal>) {
        let sales = index(self.reports.group_sales_by(period));
        let expenses = index(self.reports.group_expenses_by(period));

        let labels: Vec<String> = sales
            .keys()
            .chain(expenses.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let revenue = labels
            .iter()
            .map(|k| sales.get(k).copied().unwrap_or_default())
            .collect();
        let costs = labels
            .iter()
            .map(|k| expenses.get(k).copied().unwrap_or_default())
            .collect();
        (labels, revenue, costs)
    }
}

fn index(buckets: Vec<Bucket>) -> BTreeMap<String, Decimal> {
    buckets.into_iter().map(|b| (b.key, b.total)).collect()
}

fn pie(label: &str, totals: BTreeMap<String, Decimal>) -> ChartData {
    let (labels, data): (Vec<_>, Vec<_>) = totals.into_iter().map(|(k, v)| (k, to_f64(v))).unzip();
    ChartData {
        labels,
        datasets: vec![Dataset::slices(label, data)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PaymentMethod;
    use crate::reports::generator::{ExpenseEntry, SaleEntry};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn generator() -> ReportGenerator {
        ReportGenerator::new(
            vec![
                SaleEntry {
                    product_name: "Sugar".into(),
                    quantity: dec!(2),
                    total: Some(dec!(300)),
                    payment_method: PaymentMethod::Cash,
                    date: d("2024-01-01"),
                },
                SaleEntry {
                    product_name: "Milk".into(),
                    quantity: dec!(1),
                    total: Some(dec!(60)),
                    payment_method: PaymentMethod::Mpesa,
                    date: d("2024-01-03"),
                },
            ],
            vec![
                ExpenseEntry {
                    description: "Rent".into(),
                    category: Some("Rent".into()),
                    amount: Some(dec!(100)),
                    date: d("2024-01-02"),
                },
                ExpenseEntry {
                    description: "Bags".into(),
                    category: None,
                    amount: Some(dec!(20)),
                    date: d("2024-01-03"),
                },
            ],
        )
    }

    #[test]
    fn revenue_and_expenses_share_labels() {
        let reports = generator();
        let chart = ChartGenerator::new(&reports).revenue_vs_expenses(Period::Day);
        assert_eq!(chart.labels, ["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(chart.datasets[0].data, [300.0, 0.0, 60.0]);
        assert_eq!(chart.datasets[1].data, [0.0, 100.0, 20.0]);
    }

    #[test]
    fn profit_trend_subtracts_expenses() {
        let reports = generator();
        let chart = ChartGenerator::new(&reports).profit_trend(Period::Day);
        assert_eq!(chart.datasets[0].data, [300.0, -100.0, 40.0]);
    }

    #[test]
    fn category_pie_uses_palette() {
        let reports = generator();
        let chart = ChartGenerator::new(&reports).expenses_by_category();
        assert_eq!(chart.labels, ["Rent", "Uncategorized"]);
        assert_eq!(
            chart.datasets[0].background_color,
            Some(Color::PerPoint(vec![PALETTE[0].to_string(), PALETTE[1].to_string()]))
        );
    }

    #[test]
    fn datasets_serialize_for_chart_js() {
        let reports = generator();
        let chart = ChartGenerator::new(&reports).sales_trend(Period::Month);
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["labels"][0], "2024-01");
        assert_eq!(json["datasets"][0]["backgroundColor"], REVENUE_COLOR);
        assert_eq!(json["datasets"][0]["data"][0], 360.0);
    }

    #[test]
    fn palette_cycles() {
        let colors = palette(PALETTE.len() + 2);
        assert_eq!(colors[PALETTE.len()], PALETTE[0]);
        assert_eq!(colors[PALETTE.len() + 1], PALETTE[1]);
    }
}
