//! Euro reference rates keyed by publication date.
//!
//! Values are kept exactly as published by the ECB: units of the currency per
//! one euro (`"USD": "1.1579"` means 1 EUR = 1.1579 USD).

use std::{
    collections::BTreeMap,
    io::Write,
    str::FromStr,
    sync::LazyLock,
};

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{ReportError, Result},
    services::parsers::{is_number, DATE_FORMAT},
};

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("ISO date pattern compiles"));

const DATE_HEADER: &str = "Date";

pub type DateRates = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: BTreeMap<NaiveDate, DateRates>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Number of publication dates in the table.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rates.keys().next_back().copied()
    }

    pub fn rates_on(&self, date: NaiveDate) -> Option<&DateRates> {
        self.rates.get(&date)
    }

    pub fn rate(&self, date: NaiveDate, currency: &str) -> Option<Decimal> {
        self.rates
            .get(&date)
            .and_then(|date_rates| date_rates.get(currency))
            .and_then(|rate| Decimal::from_str(rate).ok())
            .filter(|rate| *rate > Decimal::ZERO)
    }

    pub fn insert(&mut self, date: NaiveDate, date_rates: DateRates) {
        self.rates.insert(date, date_rates);
    }

    /// Overlays `other` on top of this table. A date present in both ends up
    /// with the rates of `other`.
    pub fn merge(&mut self, other: RateTable) {
        self.rates.extend(other.rates);
    }

    /// Builds a table from one ECB CSV payload: a `Date,USD,JPY,...` header
    /// followed by `2015-01-20,1.1579,137.37,...` rows. Cells that are not
    /// positive numbers (`N/A`, blanks) are skipped.
    pub fn from_csv(payload: &[u8]) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(payload);

        let mut table = RateTable::new();
        let mut currencies: Vec<String> = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| ReportError::RateFeed(e.to_string()))?;
            let Some(first) = record.get(0) else {
                continue;
            };
            if first == DATE_HEADER {
                currencies = record.iter().map(str::to_string).collect();
                continue;
            }
            if currencies.is_empty() || !ISO_DATE.is_match(first) {
                continue;
            }
            let Ok(date) = NaiveDate::parse_from_str(first, DATE_FORMAT) else {
                warn!("Skipping rates of invalid date '{}'", first);
                continue;
            };

            let date_rates: DateRates = currencies
                .iter()
                .zip(record.iter())
                .skip(1)
                .filter(|(currency, value)| {
                    !currency.is_empty() && is_number(value) && is_positive(value)
                })
                .map(|(currency, value)| (currency.clone(), value.to_string()))
                .collect();

            if !date_rates.is_empty() {
                table.insert(date, date_rates);
            }
        }
        debug!("Adding currency data from {} rows.", table.len());
        Ok(table)
    }

    /// Persisted form shared by every storage backend: gzip-compressed JSON.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self)
            .map_err(|e| ReportError::Storage(format!("unable to serialize rates: {}", e)))?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        serde_json::from_reader(GzDecoder::new(data))
            .map_err(|e| ReportError::Storage(format!("unable to decode saved rates: {}", e)))
    }
}

fn is_positive(value: &str) -> bool {
    Decimal::from_str(value).is_ok_and(|rate| rate > Decimal::ZERO)
}
