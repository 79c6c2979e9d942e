use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use super::{fx_rates::RateSource, rate_table::RateTable};
use crate::{
    error::{ReportError, Result},
    services::{
        parsers::parse_date,
        storage::{rates_filename, RateStore},
    },
};

const EUR: &str = "EUR";

/// Resolves the exchange rate between any two currencies on a given day,
/// pivoting through the euro reference rates.
#[derive(Debug, Clone)]
pub struct ExchangeRates {
    rates: Arc<RateTable>,
    max_backtrack_days: u32,
}

impl ExchangeRates {
    pub fn new(rates: Arc<RateTable>, max_backtrack_days: u32) -> Self {
        ExchangeRates {
            rates,
            max_backtrack_days,
        }
    }

    /// Loads today's rate table from storage, falls back to yesterday's
    /// unless `refresh` is set, and downloads a fresh table from `source`
    /// when storage has nothing. A downloaded table is saved under today's
    /// key.
    pub async fn load(
        store: &RateStore,
        source: &dyn RateSource,
        today: NaiveDate,
        refresh: bool,
        max_backtrack_days: u32,
    ) -> Result<Self> {
        let filename = rates_filename(today);
        let mut rates = store.load(&filename).await?;

        if rates.is_empty() && !refresh {
            if let Some(yesterday) = today.pred_opt() {
                rates = store.load(&rates_filename(yesterday)).await?;
            }
        }

        if rates.is_empty() {
            let fresh = source.fetch().await?;
            if fresh.is_empty() {
                return Err(ReportError::RateFeed(
                    "no exchange rates found in the downloaded data".to_string(),
                ));
            }
            let fresh = Arc::new(fresh);
            store.save(fresh.clone(), &filename).await?;
            rates = fresh;
        }

        Ok(Self::new(rates, max_backtrack_days))
    }

    /// Same as [`ExchangeRates::load`] for the current UTC date.
    pub async fn load_current(
        store: &RateStore,
        source: &dyn RateSource,
        refresh: bool,
        max_backtrack_days: u32,
    ) -> Result<Self> {
        let today = Utc::now().date_naive();
        Self::load(store, source, today, refresh, max_backtrack_days).await
    }

    pub fn table(&self) -> &RateTable {
        &self.rates
    }

    pub fn max_backtrack_days(&self) -> u32 {
        self.max_backtrack_days
    }

    /// Exchange rate between two currencies on a given day: how many units of
    /// `currency_to` one unit of `currency_from` is worth.
    pub fn get_rate(
        &self,
        currency_from: &str,
        currency_to: &str,
        date_str: &str,
    ) -> Result<Decimal> {
        if currency_from == currency_to {
            return Ok(Decimal::ONE);
        }
        self.rate_on(currency_from, currency_to, parse_date(date_str)?)
    }

    pub fn rate_on(
        &self,
        currency_from: &str,
        currency_to: &str,
        date: NaiveDate,
    ) -> Result<Decimal> {
        if currency_from == currency_to {
            return Ok(Decimal::ONE);
        }
        let from_rate = self.eur_rate(currency_from, date)?;
        let to_rate = self.eur_rate(currency_to, date)?;
        to_rate.checked_div(from_rate).ok_or_else(|| {
            ReportError::RateFeed(format!(
                "{} to {} rate on {} is out of range",
                currency_from, currency_to, date
            ))
        })
    }

    /// Units of `currency` per euro, taken from the closest publication day
    /// at or before `date`. Reference rates are not published on weekends
    /// and holidays.
    fn eur_rate(&self, currency: &str, date: NaiveDate) -> Result<Decimal> {
        if currency == EUR {
            return Ok(Decimal::ONE);
        }

        let mut search_date = date;
        for _ in 0..self.max_backtrack_days {
            if let Some(rate) = self.rates.rate(search_date, currency) {
                if search_date != date {
                    debug!("{} rate for {} taken from {}", currency, date, search_date);
                }
                return Ok(rate);
            }
            match search_date.pred_opt() {
                Some(previous) => search_date = previous,
                None => break,
            }
        }

        Err(ReportError::RateNotFound {
            currency: currency.to_string(),
            original_date: date,
            search_stopped_at: search_date,
        })
    }
}
