use std::sync::Arc;

use rust_decimal::Decimal;

use super::{
    importers::ibkr::TradeLedger, market_data::exchange_rates::ExchangeRates,
    shared::round_to_decimals,
};
use crate::{
    error::{ReportError, Result},
    models::{
        report::{ReportOptions, ReportSummary},
        trade::TradeDetails,
    },
};

/// Total selling prices, capital gains and capital losses of one or more
/// trade exports.
#[derive(Debug, Clone)]
pub struct Report {
    options: ReportOptions,
    rates: Arc<ExchangeRates>,
    prices: Decimal,
    gains: Decimal,
    losses: Decimal,
    details: Vec<TradeDetails>,
}

impl Report {
    pub fn new(
        report_currency: &str,
        use_deemed_acquisition_cost: bool,
        rates: Arc<ExchangeRates>,
    ) -> Self {
        Report {
            options: ReportOptions::new(report_currency, use_deemed_acquisition_cost),
            rates,
            prices: Decimal::ZERO,
            gains: Decimal::ZERO,
            losses: Decimal::ZERO,
            details: Vec::new(),
        }
    }

    /// Adds the trades of one export. Row matching starts over for every
    /// export, and nothing is added when the export is rejected.
    pub fn add_trades(&mut self, file_content: &[u8]) -> Result<()> {
        let mut ledger = TradeLedger::new(&self.rates, &self.options);
        ledger.process(file_content)?;
        let totals = ledger.finish();

        let sum = |total: Decimal, added: Decimal| {
            total
                .checked_add(added)
                .ok_or_else(|| ReportError::InvalidNumber(added.to_string()))
        };
        let prices = sum(self.prices, totals.prices)?;
        let gains = sum(self.gains, totals.gains)?;
        let losses = sum(self.losses, totals.losses)?;

        self.prices = prices;
        self.gains = gains;
        self.losses = losses;
        self.details.extend(totals.details);
        Ok(())
    }

    pub fn report_currency(&self) -> &str {
        &self.options.report_currency
    }

    pub fn prices(&self) -> Decimal {
        self.prices
    }

    pub fn gains(&self) -> Decimal {
        self.gains
    }

    pub fn losses(&self) -> Decimal {
        self.losses
    }

    pub fn details(&self) -> &[TradeDetails] {
        &self.details
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            report_currency: self.options.report_currency.clone(),
            use_deemed_acquisition_cost: self.options.use_deemed_acquisition_cost,
            prices: round_to_decimals(self.prices),
            gains: round_to_decimals(self.gains),
            losses: round_to_decimals(self.losses),
            details: self.details.clone(),
        }
    }
}
