use rust_decimal::Decimal;
use serde::Serialize;

use super::trade::TradeDetails;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub report_currency: String,
    pub use_deemed_acquisition_cost: bool,
}

impl ReportOptions {
    pub fn new(report_currency: &str, use_deemed_acquisition_cost: bool) -> Self {
        ReportOptions {
            report_currency: report_currency.trim().to_uppercase(),
            use_deemed_acquisition_cost,
        }
    }
}

/// Totals are rounded to cents, details are kept as calculated.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub report_currency: String,
    pub use_deemed_acquisition_cost: bool,
    pub prices: Decimal,
    pub gains: Decimal,
    pub losses: Decimal,
    pub details: Vec<TradeDetails>,
}
