//! Shared test helpers.
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use ibkr_report::error::{ReportError, Result};
use ibkr_report::services::market_data::exchange_rates::ExchangeRates;
use ibkr_report::services::market_data::fx_rates::RateSource;
use ibkr_report::services::market_data::rate_table::RateTable;
use ibkr_report::services::report::Report;

/// Units per euro. Nothing is published on 2021-03-13 and 2021-03-14.
pub const RATES_CSV: &str = "Date,USD,SEK,\n\
    2021-03-15,2,10,\n\
    2021-03-12,1.25,10.5,\n\
    2020-01-02,1.25,11,\n\
    2010-03-15,1.5,9,\n";

pub const SINGLE_ACCOUNT_HEADER: &str = "Trades,Header,DataDiscriminator,Asset Category,Currency,Symbol,Date/Time,Exchange,Quantity,T. Price,Proceeds,Comm/Fee,Basis,Realized P/L,Code";
pub const MULTI_ACCOUNT_HEADER: &str = "Trades,Header,DataDiscriminator,Asset Category,Currency,Account,Symbol,Date/Time,Exchange,Quantity,T. Price,Proceeds,Comm/Fee,Basis,Realized P/L,Code";

pub fn rate_table() -> RateTable {
    RateTable::from_csv(RATES_CSV.as_bytes()).unwrap()
}

pub fn exchange_rates() -> Arc<ExchangeRates> {
    Arc::new(ExchangeRates::new(Arc::new(rate_table()), 7))
}

pub fn report(currency: &str, use_deemed_acquisition_cost: bool) -> Report {
    Report::new(currency, use_deemed_acquisition_cost, exchange_rates())
}

/// Rate source returning a fixed table, or failing when there is none.
pub struct StaticRateSource {
    table: Option<RateTable>,
    calls: AtomicUsize,
}

impl StaticRateSource {
    pub fn new(table: RateTable) -> Self {
        StaticRateSource {
            table: Some(table),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        StaticRateSource {
            table: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch(&self) -> Result<RateTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table.clone().ok_or(ReportError::RatesUnavailable)
    }
}

/// One `Trades,Data` row of an export.
#[derive(Debug, Clone)]
pub struct Row {
    pub discriminator: &'static str,
    pub category: &'static str,
    pub currency: &'static str,
    pub symbol: &'static str,
    pub date_time: &'static str,
    pub quantity: &'static str,
    pub price: &'static str,
    pub proceeds: &'static str,
    pub fee: &'static str,
}

impl Row {
    pub fn trade(
        currency: &'static str,
        symbol: &'static str,
        date_time: &'static str,
        quantity: &'static str,
        price: &'static str,
        proceeds: &'static str,
        fee: &'static str,
    ) -> Self {
        Row {
            discriminator: "Trade",
            category: "Stocks",
            currency,
            symbol,
            date_time,
            quantity,
            price,
            proceeds,
            fee,
        }
    }

    pub fn closed_lot(
        currency: &'static str,
        symbol: &'static str,
        date_time: &'static str,
        quantity: &'static str,
        price: &'static str,
    ) -> Self {
        Row {
            discriminator: "ClosedLot",
            category: "Stocks",
            currency,
            symbol,
            date_time,
            quantity,
            price,
            proceeds: "",
            fee: "",
        }
    }

    pub fn option(mut self) -> Self {
        self.category = "Equity and Index Options";
        self
    }

    pub fn single_account(&self) -> String {
        format!(
            "Trades,Data,{},{},{},{},\"{}\",,\"{}\",\"{}\",\"{}\",\"{}\",,,",
            self.discriminator,
            self.category,
            self.currency,
            self.symbol,
            self.date_time,
            self.quantity,
            self.price,
            self.proceeds,
            self.fee
        )
    }

    pub fn multi_account(&self) -> String {
        format!(
            "Trades,Data,{},{},{},U1234567,{},\"{}\",,\"{}\",\"{}\",\"{}\",\"{}\",,,",
            self.discriminator,
            self.category,
            self.currency,
            self.symbol,
            self.date_time,
            self.quantity,
            self.price,
            self.proceeds,
            self.fee
        )
    }
}

fn export(header: &str, rows: Vec<String>) -> String {
    let mut lines = vec![
        "Statement,Header,Field Name,Field Value".to_string(),
        "Statement,Data,BrokerName,Interactive Brokers".to_string(),
        header.to_string(),
    ];
    lines.extend(rows);
    lines.push("Trades,SubTotal,,Stocks,USD,ABC,,,-10,,500,-2,,,".to_string());
    lines.push("Dividends,Data,USD,2021-03-15,ABC Cash Dividend,12.5".to_string());
    lines.join("\n") + "\n"
}

pub fn single_account_export(rows: &[Row]) -> String {
    export(
        SINGLE_ACCOUNT_HEADER,
        rows.iter().map(Row::single_account).collect(),
    )
}

pub fn multi_account_export(rows: &[Row]) -> String {
    export(
        MULTI_ACCOUNT_HEADER,
        rows.iter().map(Row::multi_account).collect(),
    )
}

/// A USD sale with one lot and a EUR sale with two lots, one of them held
/// for more than ten years and one closed at a loss.
///
/// In EUR: prices 450, gains 39 (53 without the deemed acquisition cost),
/// losses 33.
pub fn stock_rows() -> Vec<Row> {
    vec![
        Row::trade("USD", "ABC", "2021-03-15, 10:00:00", "-10", "50", "500", "-2"),
        Row::closed_lot("USD", "ABC", "2020-01-04", "10", "30"),
        Row::trade("EUR", "XYZ", "2021-03-15 12:30:00", "-20", "10", "200", "-4"),
        Row::closed_lot("EUR", "XYZ", "2010-03-15", "5", "1"),
        Row::closed_lot("EUR", "XYZ", "2020-01-02", "15", "12"),
    ]
}

/// Short sale opened in 2020 and covered in 2021.
///
/// In EUR: prices 200, gains 160 (189 without the deemed acquisition cost).
pub fn short_sale_rows() -> Vec<Row> {
    vec![
        Row::trade("EUR", "SHRT", "2020-01-02", "-10", "20", "200", "-1"),
        Row::trade("EUR", "SHRT", "2021-03-15", "10", "1", "-10", "-1"),
        Row::closed_lot("EUR", "SHRT", "2020-01-02", "-10", "20"),
    ]
}
