use super::ReportError;
use crate::entities::{expense, sale, PaymentMethod};
use crate::formatting::dates::{end_of_month, start_of_week};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;

pub const UNCATEGORIZED: &str = "Uncategorized";
const TOP_PRODUCTS_IN_REPORT: usize = 5;

/// A sale as seen by the report generator
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaleEntry {
    pub product_name: String,
    pub quantity: Decimal,
    /// Missing totals count as zero
    pub total: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub date: NaiveDate,
}

impl From<&sale::Model> for SaleEntry {
    fn from(model: &sale::Model) -> Self {
        Self {
            product_name: model.product_name.clone(),
            quantity: model.quantity,
            total: Some(model.total),
            payment_method: model.payment_method,
            date: model.date,
        }
    }
}

impl SaleEntry {
    fn revenue(&self) -> Decimal {
        self.total.unwrap_or(Decimal::ZERO)
    }
}

/// An expense as seen by the report generator
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseEntry {
    pub description: String,
    pub category: Option<String>,
    /// Missing amounts count as zero
    pub amount: Option<Decimal>,
    pub date: NaiveDate,
}

impl From<&expense::Model> for ExpenseEntry {
    fn from(model: &expense::Model) -> Self {
        Self {
            description: model.description.clone(),
            category: model.category.clone(),
            amount: Some(model.amount),
            date: model.date,
        }
    }
}

impl ExpenseEntry {
    fn cost(&self) -> Decimal {
        self.amount.unwrap_or(Decimal::ZERO)
    }

    /// Trimmed category, or `Uncategorized` when missing or blank
    pub fn category_label(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => UNCATEGORIZED,
        }
    }
}

/// Aggregation bucket size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    /// Weeks start on Sunday
    Week,
    Month,
}

impl Period {
    /// Bucket key: `YYYY-MM-DD` for days and weeks (the starting Sunday), `YYYY-MM` for months
    pub fn key(self, date: NaiveDate) -> String {
        match self {
            Period::Day => date.format("%Y-%m-%d").to_string(),
            Period::Week => start_of_week(date).format("%Y-%m-%d").to_string(),
            Period::Month => date.format("%Y-%m").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Sales or expenses summed into one bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Bucket {
    pub key: String,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub net_profit: Decimal,
    pub sales_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductPerformance {
    pub product_name: String,
    pub quantity: Decimal,
    pub revenue: Decimal,
    pub sales_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Report {
    pub period: ReportPeriod,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
    pub sales_count: usize,
    pub expense_count: usize,
    pub average_sale: Decimal,
    /// Net profit as a percentage of revenue, one decimal place
    pub profit_margin: Decimal,
    pub sales_by_payment_method: BTreeMap<String, Decimal>,
    pub expenses_by_category: BTreeMap<String, Decimal>,
    pub top_products: Vec<ProductPerformance>,
    pub breakdown: Vec<DailyBreakdown>,
}

/// Aggregates already-loaded sales and expenses into reports
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    sales: Vec<SaleEntry>,
    expenses: Vec<ExpenseEntry>,
}

impl ReportGenerator {
    pub fn new(sales: Vec<SaleEntry>, expenses: Vec<ExpenseEntry>) -> Self {
        Self { sales, expenses }
    }

    pub fn sales(&self) -> &[SaleEntry] {
        &self.sales
    }

    pub fn expenses(&self) -> &[ExpenseEntry] {
        &self.expenses
    }

    /// Sales dated within `[start, end]`
    pub fn filter_sales(&self, start: NaiveDate, end: NaiveDate) -> Vec<&SaleEntry> {
        self.sales
            .iter()
            .filter(|s| s.date >= start && s.date <= end)
            .collect()
    }

    /// Expenses dated within `[start, end]`
    pub fn filter_expenses(&self, start: NaiveDate, end: NaiveDate) -> Vec<&ExpenseEntry> {
        self.expenses
            .iter()
            .filter(|e| e.date >= start && e.date <= end)
            .collect()
    }

    pub fn generate_report(&self, start: NaiveDate, end: NaiveDate) -> Report {
        let sales = self.filter_sales(start, end);
        let expenses = self.filter_expenses(start, end);

        let total_revenue: Decimal = sales.iter().map(|s| s.revenue()).sum();
        let total_expenses: Decimal = expenses.iter().map(|e| e.cost()).sum();
        let net_profit = total_revenue - total_expenses;

        let average_sale = if sales.is_empty() {
            Decimal::ZERO
        } else {
            (total_revenue / Decimal::from(sales.len())).round_dp(2)
        };

        let mut sales_by_payment_method = BTreeMap::new();
        for sale in &sales {
            *sales_by_payment_method
                .entry(sale.payment_method.as_str().to_string())
                .or_insert(Decimal::ZERO) += sale.revenue();
        }

        let mut expenses_by_category = BTreeMap::new();
        for expense in &expenses {
            *expenses_by_category
                .entry(expense.category_label().to_string())
                .or_insert(Decimal::ZERO) += expense.cost();
        }

        let mut top_products = rank_products(sales.iter().copied());
        top_products.truncate(TOP_PRODUCTS_IN_REPORT);

        Report {
            period: ReportPeriod { start, end },
            total_revenue,
            total_expenses,
            net_profit,
            sales_count: sales.len(),
            expense_count: expenses.len(),
            average_sale,
            profit_margin: profit_margin(total_revenue, net_profit),
            sales_by_payment_method,
            expenses_by_category,
            top_products,
            breakdown: daily_breakdown(start, end, &sales, &expenses),
        }
    }

    pub fn generate_daily_report(&self, date: NaiveDate) -> Report {
        self.generate_report(date, date)
    }

    /// Seven days starting at `start`
    pub fn generate_weekly_report(&self, start: NaiveDate) -> Report {
        self.generate_report(start, start + Duration::days(6))
    }

    pub fn generate_monthly_report(&self, year: i32, month: u32) -> Result<Report, ReportError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(ReportError::InvalidMonth { year, month })?;
        Ok(self.generate_report(first, end_of_month(first)))
    }

    pub fn generate_custom_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Report, ReportError> {
        super::check_range(start, end)?;
        Ok(self.generate_report(start, end))
    }

    /// Revenue per bucket, sorted by key
    pub fn group_sales_by(&self, period: Period) -> Vec<Bucket> {
        group(self.sales.iter().map(|s| (period.key(s.date), s.revenue())))
    }

    /// Expense total per bucket, sorted by key
    pub fn group_expenses_by(&self, period: Period) -> Vec<Bucket> {
        group(self.expenses.iter().map(|e| (period.key(e.date), e.cost())))
    }

    /// Best sellers by revenue, ties broken by name
    pub fn top_products(&self, limit: usize) -> Vec<ProductPerformance> {
        let mut ranked = rank_products(self.sales.iter());
        ranked.truncate(limit);
        ranked
    }
}

/// Percentage of revenue kept as profit; zero when there is no revenue
pub fn profit_margin(revenue: Decimal, net_profit: Decimal) -> Decimal {
    if revenue <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (net_profit / revenue * Decimal::ONE_HUNDRED).round_dp(1)
}

fn group(items: impl Iterator<Item = (String, Decimal)>) -> Vec<Bucket> {
    let mut buckets: BTreeMap<String, (Decimal, usize)> = BTreeMap::new();
    for (key, amount) in items {
        let slot = buckets.entry(key).or_insert((Decimal::ZERO, 0));
        slot.0 += amount;
        slot.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(key, (total, count))| Bucket { key, total, count })
        .collect()
}

fn rank_products<'a>(sales: impl Iterator<Item = &'a SaleEntry>) -> Vec<ProductPerformance> {
    let mut by_name: HashMap<&str, ProductPerformance> = HashMap::new();
    for sale in sales {
        let entry = by_name
            .entry(sale.product_name.as_str())
            .or_insert_with(|| ProductPerformance {
                product_name: sale.product_name.clone(),
                quantity: Decimal::ZERO,
                revenue: Decimal::ZERO,
                sales_count: 0,
            });
        entry.quantity += sale.quantity;
        entry.revenue += sale.revenue();
        entry.sales_count += 1;
    }

    let mut ranked: Vec<_> = by_name.into_values().collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked
}

fn daily_breakdown(
    start: NaiveDate,
    end: NaiveDate,
    sales: &[&SaleEntry],
    expenses: &[&ExpenseEntry],
) -> Vec<DailyBreakdown> {
    let mut days: BTreeMap<NaiveDate, DailyBreakdown> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            (
                date,
                DailyBreakdown {
                    date,
                    revenue: Decimal::ZERO,
                    expenses: Decimal::ZERO,
                    net_profit: Decimal::ZERO,
                    sales_count: 0,
                },
            )
        })
        .collect();

    for sale in sales {
        if let Some(day) = days.get_mut(&sale.date) {
            day.revenue += sale.revenue();
            day.sales_count += 1;
        }
    }
    for expense in expenses {
        if let Some(day) = days.get_mut(&expense.date) {
            day.expenses += expense.cost();
        }
    }

    days.into_values()
        .map(|mut day| {
            day.net_profit = day.revenue - day.expenses;
            day
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sale(date: &str, product: &str, total: Option<Decimal>, method: PaymentMethod) -> SaleEntry {
        SaleEntry {
            product_name: product.to_string(),
            quantity: dec!(1),
            total,
            payment_method: method,
            date: d(date),
        }
    }

    fn expense(date: &str, category: Option<&str>, amount: Option<Decimal>) -> ExpenseEntry {
        ExpenseEntry {
            description: "expense".to_string(),
            category: category.map(str::to_string),
            amount,
            date: d(date),
        }
    }

    #[test]
    fn weekly_report_sums_the_week() {
        let generator = ReportGenerator::new(
            vec![
                sale("2024-01-01", "Sugar", Some(dec!(100)), PaymentMethod::Cash),
                sale("2024-01-02", "Milk", Some(dec!(50)), PaymentMethod::Cash),
            ],
            vec![],
        );

        let report = generator.generate_weekly_report(d("2024-01-01"));
        assert_eq!(report.total_revenue, dec!(150));
        assert_eq!(report.net_profit, dec!(150));
        assert_eq!(report.period.end, d("2024-01-07"));
        assert_eq!(report.breakdown.len(), 7);
        assert_eq!(report.breakdown[1].revenue, dec!(50));
        assert_eq!(report.profit_margin, dec!(100.0));
    }

    #[test]
    fn missing_amounts_count_as_zero() {
        let generator = ReportGenerator::new(
            vec![
                sale("2024-01-01", "Sugar", None, PaymentMethod::Cash),
                sale("2024-01-01", "Salt", Some(dec!(30)), PaymentMethod::Mpesa),
            ],
            vec![
                expense("2024-01-01", None, Some(dec!(10))),
                expense("2024-01-01", Some("  "), None),
                expense("2024-01-01", Some("Rent"), Some(dec!(5))),
            ],
        );

        let report = generator.generate_daily_report(d("2024-01-01"));
        assert_eq!(report.total_revenue, dec!(30));
        assert_eq!(report.total_expenses, dec!(15));
        assert_eq!(report.net_profit, dec!(15));
        assert_eq!(report.sales_count, 2);
        assert_eq!(report.average_sale, dec!(15));
        assert_eq!(report.expenses_by_category[UNCATEGORIZED], dec!(10));
        assert_eq!(report.expenses_by_category["Rent"], dec!(5));
        assert_eq!(report.sales_by_payment_method["mpesa"], dec!(30));
    }

    #[test]
    fn empty_range_has_zero_margin_and_average() {
        let report = ReportGenerator::default().generate_daily_report(d("2024-01-01"));
        assert_eq!(report.average_sale, Decimal::ZERO);
        assert_eq!(report.profit_margin, Decimal::ZERO);
        assert!(report.top_products.is_empty());
    }

    #[test]
    fn monthly_report_covers_calendar_month() {
        let generator = ReportGenerator::new(
            vec![
                sale("2024-02-01", "A", Some(dec!(10)), PaymentMethod::Cash),
                sale("2024-02-29", "A", Some(dec!(20)), PaymentMethod::Cash),
                sale("2024-03-01", "A", Some(dec!(40)), PaymentMethod::Cash),
            ],
            vec![],
        );
        let report = generator.generate_monthly_report(2024, 2).unwrap();
        assert_eq!(report.total_revenue, dec!(30));
        assert_eq!(report.breakdown.len(), 29);

        assert_matches!(
            generator.generate_monthly_report(2024, 13),
            Err(ReportError::InvalidMonth { month: 13, .. })
        );
    }

    #[test]
    fn custom_report_rejects_reversed_range() {
        let generator = ReportGenerator::default();
        assert_matches!(
            generator.generate_custom_report(d("2024-02-01"), d("2024-01-01")),
            Err(ReportError::InvalidRange { .. })
        );
        assert!(generator
            .generate_custom_report(d("2024-01-01"), d("2024-01-01"))
            .is_ok());
    }

    #[rstest]
    #[case(Period::Day, vec!["2024-01-06", "2024-01-07", "2024-02-01"])]
    #[case(Period::Week, vec!["2023-12-31", "2024-01-07", "2024-01-28"])]
    #[case(Period::Month, vec!["2024-01", "2024-02"])]
    fn groups_by_period(#[case] period: Period, #[case] keys: Vec<&str>) {
        let generator = ReportGenerator::new(
            vec![
                sale("2024-01-06", "A", Some(dec!(1)), PaymentMethod::Cash),
                sale("2024-01-07", "A", Some(dec!(2)), PaymentMethod::Cash),
                sale("2024-02-01", "A", Some(dec!(4)), PaymentMethod::Cash),
            ],
            vec![],
        );
        let buckets = generator.group_sales_by(period);
        let got: Vec<_> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(got, keys);
        let total: Decimal = buckets.iter().map(|b| b.total).sum();
        assert_eq!(total, dec!(7));
    }

    #[test]
    fn top_products_rank_by_revenue_then_name() {
        let generator = ReportGenerator::new(
            vec![
                sale("2024-01-01", "Bread", Some(dec!(50)), PaymentMethod::Cash),
                sale("2024-01-01", "Milk", Some(dec!(80)), PaymentMethod::Cash),
                sale("2024-01-02", "Bread", Some(dec!(50)), PaymentMethod::Debt),
                sale("2024-01-02", "Apples", Some(dec!(80)), PaymentMethod::Cash),
            ],
            vec![],
        );
        let top = generator.top_products(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_name, "Bread");
        assert_eq!(top[0].revenue, dec!(100));
        assert_eq!(top[0].sales_count, 2);
        assert_eq!(top[1].product_name, "Apples");
    }

    proptest! {
        #[test]
        fn net_profit_is_revenue_minus_expenses(
            sales in prop::collection::vec((0u32..28, 0i64..1_000_000), 0..20),
            costs in prop::collection::vec((0u32..28, 0i64..1_000_000), 0..20),
        ) {
            let base = d("2024-02-01");
            let generator = ReportGenerator::new(
                sales.iter().map(|(day, cents)| SaleEntry {
                    product_name: "P".into(),
                    quantity: Decimal::ONE,
                    total: Some(Decimal::new(*cents, 2)),
                    payment_method: PaymentMethod::Cash,
                    date: base + Duration::days(i64::from(*day)),
                }).collect(),
                costs.iter().map(|(day, cents)| ExpenseEntry {
                    description: "E".into(),
                    category: None,
                    amount: Some(Decimal::new(*cents, 2)),
                    date: base + Duration::days(i64::from(*day)),
                }).collect(),
            );
            let report = generator.generate_monthly_report(2024, 2).unwrap();
            prop_assert_eq!(report.net_profit, report.total_revenue - report.total_expenses);
            let daily: Decimal = report.breakdown.iter().map(|b| b.net_profit).sum();
            prop_assert_eq!(daily, report.net_profit);
            prop_assert_eq!(report.sales_count, sales.len());
        }
    }
}
