use num_format::{Locale, ToFormattedString};
use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::services::{
    market_data::{exchange_rates::ExchangeRates, fx_rates::EcbRateSource},
    shared::env::Settings,
    storage::RateStore,
};

/// Rounds to cents and groups thousands, e.g. `1,234.50 EUR`.
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let rounded = rounded.abs();
    let units = rounded.trunc().to_u64().unwrap_or_default();
    let cents = (rounded.fract() * Decimal::ONE_HUNDRED)
        .to_u64()
        .unwrap_or_default();
    format!(
        "{}{}.{:02} {}",
        sign,
        units.to_formatted_string(&Locale::en),
        cents,
        currency
    )
}

pub async fn load_rates(settings: &Settings, refresh: bool) -> anyhow::Result<ExchangeRates> {
    let store = RateStore::from_settings(settings)?;
    let source = EcbRateSource::from_settings(settings);
    let rates =
        ExchangeRates::load_current(&store, &source, refresh, settings.max_backtrack_days).await?;
    Ok(rates)
}
