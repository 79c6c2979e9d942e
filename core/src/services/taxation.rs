use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::parsers::subtract_years;

/// Holding period after which the higher deemed acquisition cost applies.
pub const LONG_HOLDING_YEARS: u32 = 10;

/// Share of the selling price that may be declared as profit when the deemed
/// acquisition cost is used instead of the real one.
///
/// The deemed acquisition cost is 20% of the selling price, or 40% when the
/// shares were held for at least ten years.
pub fn deemed_profit_multiplier(buy_date: NaiveDate, sell_date: NaiveDate) -> Decimal {
    match subtract_years(sell_date, LONG_HOLDING_YEARS) {
        Some(threshold) if buy_date <= threshold => dec!(0.6),
        _ => dec!(0.8),
    }
}

pub fn deemed_profit(sell_price: Decimal, buy_date: NaiveDate, sell_date: NaiveDate) -> Decimal {
    deemed_profit_multiplier(buy_date, sell_date) * sell_price
}

/// Realized result of a lot, lowered to the deemed profit when that is more
/// favourable. Losses are never affected.
pub fn apply_deemed_acquisition_cost(
    realized: Decimal,
    sell_price: Decimal,
    buy_date: NaiveDate,
    sell_date: NaiveDate,
) -> Decimal {
    realized.min(deemed_profit(sell_price, buy_date, sell_date))
}
