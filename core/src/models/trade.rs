use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::Tabled;

/// Result of one closed lot, amounts in the report currency.
#[derive(Debug, Tabled, Clone, PartialEq, Serialize)]
pub struct TradeDetails {
    pub symbol: String,
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub price: Decimal,
    pub realized: Decimal,
}
