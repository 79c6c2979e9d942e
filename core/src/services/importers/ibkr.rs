use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::{
    error::{ReportError, Result},
    models::{report::ReportOptions, trade::TradeDetails},
    services::{
        market_data::exchange_rates::ExchangeRates,
        parsers::{decimal_cleanup, parse_date},
        taxation::apply_deemed_acquisition_cost,
    },
};

pub const SINGLE_ACCOUNT_HEADER: [&str; 15] = [
    "Trades",
    "Header",
    "DataDiscriminator",
    "Asset Category",
    "Currency",
    "Symbol",
    "Date/Time",
    "Exchange",
    "Quantity",
    "T. Price",
    "Proceeds",
    "Comm/Fee",
    "Basis",
    "Realized P/L",
    "Code",
];

/// Same as the single account header with `Account` after `Currency`.
pub const MULTI_ACCOUNT_HEADER: [&str; 16] = [
    "Trades",
    "Header",
    "DataDiscriminator",
    "Asset Category",
    "Currency",
    "Account",
    "Symbol",
    "Date/Time",
    "Exchange",
    "Quantity",
    "T. Price",
    "Proceeds",
    "Comm/Fee",
    "Basis",
    "Realized P/L",
    "Code",
];

const FIELD_COUNT: usize = 11;

const TRADES_SECTION: &str = "Trades";
const DATA_ROW: &str = "Data";

/// Columns the ledger reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Section,
    RowKind,
    DataDiscriminator,
    AssetCategory,
    Currency,
    Symbol,
    DateTime,
    Quantity,
    TransactionPrice,
    Proceeds,
    CommissionAndFees,
}

impl Field {
    const ALL: [Field; FIELD_COUNT] = [
        Field::Section,
        Field::RowKind,
        Field::DataDiscriminator,
        Field::AssetCategory,
        Field::Currency,
        Field::Symbol,
        Field::DateTime,
        Field::Quantity,
        Field::TransactionPrice,
        Field::Proceeds,
        Field::CommissionAndFees,
    ];

    /// Column name in the header row. The first two header cells name the
    /// section and row kind columns.
    pub fn column_name(&self) -> &'static str {
        match self {
            Field::Section => "Trades",
            Field::RowKind => "Header",
            Field::DataDiscriminator => "DataDiscriminator",
            Field::AssetCategory => "Asset Category",
            Field::Currency => "Currency",
            Field::Symbol => "Symbol",
            Field::DateTime => "Date/Time",
            Field::Quantity => "Quantity",
            Field::TransactionPrice => "T. Price",
            Field::Proceeds => "Proceeds",
            Field::CommissionAndFees => "Comm/Fee",
        }
    }
}

/// Column positions of the current section, derived from its header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    indices: [usize; FIELD_COUNT],
    width: usize,
}

impl FieldLayout {
    /// Returns a layout when `record` is one of the known header rows.
    pub fn from_header(record: &StringRecord) -> Option<Self> {
        let is_known_header = record.iter().eq(SINGLE_ACCOUNT_HEADER.iter().copied())
            || record.iter().eq(MULTI_ACCOUNT_HEADER.iter().copied());
        if !is_known_header {
            return None;
        }

        let mut indices = [0; FIELD_COUNT];
        for (slot, field) in indices.iter_mut().zip(Field::ALL.iter()) {
            *slot = record
                .iter()
                .position(|column| column == field.column_name())?;
        }
        Some(FieldLayout {
            indices,
            width: record.len(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn index(&self, field: Field) -> usize {
        self.indices[field as usize]
    }

    pub fn get<'r>(&self, record: &'r StringRecord, field: Field) -> &'r str {
        record.get(self.index(field)).unwrap_or_default()
    }

    /// Trade or ClosedLot row of a stock or option, in this layout.
    fn kind_of(&self, record: &StringRecord) -> Option<(DataDiscriminator, AssetCategory)> {
        if record.len() != self.width
            || self.get(record, Field::Section) != TRADES_SECTION
            || self.get(record, Field::RowKind) != DATA_ROW
        {
            return None;
        }
        let discriminator = DataDiscriminator::parse(self.get(record, Field::DataDiscriminator))?;
        let category = AssetCategory::parse(self.get(record, Field::AssetCategory))?;
        Some((discriminator, category))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDiscriminator {
    Trade,
    ClosedLot,
}

impl DataDiscriminator {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Trade" => Some(DataDiscriminator::Trade),
            "ClosedLot" => Some(DataDiscriminator::ClosedLot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Stocks,
    Options,
}

impl AssetCategory {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Stocks" => Some(AssetCategory::Stocks),
            "Equity and Index Options" => Some(AssetCategory::Options),
            _ => None,
        }
    }

    /// One option contract covers 100 shares of the underlying.
    pub fn multiplier(&self) -> Decimal {
        match self {
            AssetCategory::Stocks => Decimal::ONE,
            AssetCategory::Options => Decimal::ONE_HUNDRED,
        }
    }
}

/// Values of one Trade or ClosedLot row, prices in the report currency.
#[derive(Debug, Clone)]
pub struct RowFields {
    pub symbol: String,
    pub raw_date_time: String,
    pub date: NaiveDate,
    pub rate: Decimal,
    pub price_per_share: Decimal,
    pub quantity: Decimal,
}

#[derive(Debug, Clone)]
pub struct OpenTrade {
    pub fields: RowFields,
    pub fee: Decimal,
    pub closed_quantity: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerTotals {
    pub prices: Decimal,
    pub gains: Decimal,
    pub losses: Decimal,
    pub details: Vec<TradeDetails>,
}

/// Matches ClosedLot rows to the Trade row preceding them and adds up the
/// realized results of one export.
pub struct TradeLedger<'a> {
    rates: &'a ExchangeRates,
    options: &'a ReportOptions,
    layout: Option<FieldLayout>,
    open_trade: Option<OpenTrade>,
    totals: LedgerTotals,
}

impl<'a> TradeLedger<'a> {
    pub fn new(rates: &'a ExchangeRates, options: &'a ReportOptions) -> Self {
        TradeLedger {
            rates,
            options,
            layout: None,
            open_trade: None,
            totals: LedgerTotals::default(),
        }
    }

    pub fn finish(self) -> LedgerTotals {
        self.totals
    }

    /// Reads a whole export. Any error aborts the pass and the totals
    /// gathered so far should be discarded.
    pub fn process(&mut self, file_content: &[u8]) -> Result<()> {
        std::str::from_utf8(file_content).map_err(|_| ReportError::InvalidEncoding)?;

        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file_content);

        for result in rdr.records() {
            let record = result?;
            self.process_record(&record)?;
        }
        Ok(())
    }

    pub fn process_record(&mut self, record: &StringRecord) -> Result<()> {
        if let Some(layout) = FieldLayout::from_header(record) {
            self.layout = Some(layout);
            self.open_trade = None;
            return Ok(());
        }

        let Some(layout) = self.layout else {
            return Ok(());
        };
        match layout.kind_of(record) {
            Some((DataDiscriminator::Trade, _)) => self.start_trade(&layout, record),
            Some((DataDiscriminator::ClosedLot, category)) => {
                self.close_lot(&layout, record, category)
            }
            None => Ok(()),
        }
    }

    fn row_fields(&self, layout: &FieldLayout, record: &StringRecord) -> Result<RowFields> {
        let raw_date_time = layout.get(record, Field::DateTime).to_string();
        let date = parse_date(&raw_date_time)?;
        let rate = self.rates.rate_on(
            &self.options.report_currency,
            layout.get(record, Field::Currency),
            date,
        )?;
        let price_per_share =
            in_report_currency(layout.get(record, Field::TransactionPrice), rate)?;
        let quantity = decimal_cleanup(layout.get(record, Field::Quantity))?;

        Ok(RowFields {
            symbol: layout.get(record, Field::Symbol).to_string(),
            raw_date_time,
            date,
            rate,
            price_per_share,
            quantity,
        })
    }

    fn start_trade(&mut self, layout: &FieldLayout, record: &StringRecord) -> Result<()> {
        let fields = self.row_fields(layout, record)?;
        let fee = in_report_currency(layout.get(record, Field::CommissionAndFees), fields.rate)?;

        // Sold shares have a negative quantity
        if fields.quantity < Decimal::ZERO {
            let proceeds = layout.get(record, Field::Proceeds);
            self.totals.prices = self
                .totals
                .prices
                .checked_add(in_report_currency(proceeds, fields.rate)?)
                .ok_or_else(|| ReportError::InvalidNumber(proceeds.to_string()))?;
        }

        debug!(
            "Trade: \"{}\" \"{}\" {:.2}",
            fields.raw_date_time, fields.symbol, fields.quantity
        );
        self.open_trade = Some(OpenTrade {
            fields,
            fee,
            closed_quantity: Decimal::ZERO,
        });
        Ok(())
    }

    fn close_lot(
        &mut self,
        layout: &FieldLayout,
        record: &StringRecord,
        category: AssetCategory,
    ) -> Result<()> {
        if self.open_trade.is_none() {
            return Err(ReportError::ClosedLotWithoutTrade);
        }
        let lot = self.row_fields(layout, record)?;
        let use_deemed_acquisition_cost = self.options.use_deemed_acquisition_cost;
        let trade = self
            .open_trade
            .as_mut()
            .ok_or(ReportError::ClosedLotWithoutTrade)?;

        if trade.fields.symbol != lot.symbol {
            return Err(ReportError::SymbolMismatch {
                date: lot.date,
                trade: trade.fields.symbol.clone(),
                closed_lot: lot.symbol,
            });
        }
        // Results too large for a decimal are reported against the lot size
        let out_of_range =
            || ReportError::InvalidNumber(layout.get(record, Field::Quantity).to_string());

        let opened = trade.fields.quantity.abs();
        let remaining = trade
            .fields
            .quantity
            .checked_add(lot.quantity)
            .ok_or_else(out_of_range)?;
        let closed_quantity = trade
            .closed_quantity
            .checked_add(lot.quantity)
            .ok_or_else(out_of_range)?;
        if opened.is_zero() || remaining.abs() > opened || closed_quantity.abs() > opened {
            return Err(ReportError::QuantityMismatch {
                date: lot.date,
                symbol: lot.symbol,
            });
        }

        let (mut sell_date, mut sell_price) = (trade.fields.date, trade.fields.price_per_share);
        let (mut buy_date, mut buy_price) = (lot.date, lot.price_per_share);
        // A negative lot closes a short position, the lot row is the sale
        if lot.quantity < Decimal::ZERO {
            std::mem::swap(&mut sell_date, &mut buy_date);
            std::mem::swap(&mut sell_price, &mut buy_price);
        }

        let multiplier = category.multiplier();
        let quantity = lot.quantity.abs();
        let total_sell_price = quantity
            .checked_mul(sell_price)
            .and_then(|total| total.checked_mul(multiplier))
            .ok_or_else(out_of_range)?;
        let total_buy_price = quantity
            .checked_mul(buy_price)
            .and_then(|total| total.checked_mul(multiplier))
            .ok_or_else(out_of_range)?;
        let lot_fee = lot
            .quantity
            .checked_mul(trade.fee)
            .and_then(|fee| fee.checked_div(trade.fields.quantity))
            .ok_or_else(out_of_range)?;
        let mut realized = total_sell_price
            .checked_sub(total_buy_price)
            .and_then(|result| result.checked_sub(lot_fee))
            .ok_or_else(out_of_range)?;
        if use_deemed_acquisition_cost {
            realized =
                apply_deemed_acquisition_cost(realized, total_sell_price, buy_date, sell_date);
        }

        info!(
            "Symbol: {}, Quantity: {:.2}, Buy date: {}, Sell date: {}, Selling price: {:.2}, Gains/Losses: {:.2}",
            lot.symbol, quantity, buy_date, sell_date, total_sell_price, realized
        );

        trade.closed_quantity = closed_quantity;
        if (closed_quantity + trade.fields.quantity).is_zero() {
            debug!("All lots closed");
        }

        if realized > Decimal::ZERO {
            self.totals.gains = self
                .totals
                .gains
                .checked_add(realized)
                .ok_or_else(out_of_range)?;
        } else {
            self.totals.losses = self
                .totals
                .losses
                .checked_sub(realized)
                .ok_or_else(out_of_range)?;
        }
        self.totals.details.push(TradeDetails {
            symbol: lot.symbol,
            quantity,
            buy_date,
            sell_date,
            price: total_sell_price,
            realized,
        });
        Ok(())
    }
}

/// Converts an amount cell with the given rate into the report currency.
fn in_report_currency(value: &str, rate: Decimal) -> Result<Decimal> {
    decimal_cleanup(value)?
        .checked_div(rate)
        .ok_or_else(|| ReportError::InvalidNumber(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn single_account_layout() {
        let layout = FieldLayout::from_header(&record(&SINGLE_ACCOUNT_HEADER)).unwrap();
        assert_eq!(layout.width(), 15);
        assert_eq!(layout.index(Field::Currency), 4);
        assert_eq!(layout.index(Field::Symbol), 5);
        assert_eq!(layout.index(Field::CommissionAndFees), 11);
    }

    #[test]
    fn multi_account_layout_is_shifted_after_currency() {
        let layout = FieldLayout::from_header(&record(&MULTI_ACCOUNT_HEADER)).unwrap();
        assert_eq!(layout.width(), 16);
        assert_eq!(layout.index(Field::DataDiscriminator), 2);
        assert_eq!(layout.index(Field::Currency), 4);
        assert_eq!(layout.index(Field::Symbol), 6);
        assert_eq!(layout.index(Field::Quantity), 9);
        assert_eq!(layout.index(Field::CommissionAndFees), 12);
    }

    #[test]
    fn other_headers_are_not_layouts() {
        assert!(FieldLayout::from_header(&record(&["Statement", "Header", "Field Name"])).is_none());

        let mut reordered = SINGLE_ACCOUNT_HEADER;
        reordered.swap(5, 6);
        assert!(FieldLayout::from_header(&record(&reordered)).is_none());
    }

    #[test]
    fn only_stock_and_option_trade_rows_are_processed() {
        let layout = FieldLayout::from_header(&record(&SINGLE_ACCOUNT_HEADER)).unwrap();
        let row = |section: &str, kind: &str, discriminator: &str, category: &str| {
            record(&[
                section, kind, discriminator, category, "USD", "ABC", "2021-03-15", "", "-1",
                "1", "1", "0", "", "", "",
            ])
        };

        assert_eq!(
            layout.kind_of(&row("Trades", "Data", "Trade", "Stocks")),
            Some((DataDiscriminator::Trade, AssetCategory::Stocks))
        );
        assert_eq!(
            layout.kind_of(&row("Trades", "Data", "ClosedLot", "Equity and Index Options")),
            Some((DataDiscriminator::ClosedLot, AssetCategory::Options))
        );
        assert_eq!(layout.kind_of(&row("Trades", "SubTotal", "Trade", "Stocks")), None);
        assert_eq!(layout.kind_of(&row("Dividends", "Data", "Trade", "Stocks")), None);
        assert_eq!(layout.kind_of(&row("Trades", "Data", "Order", "Stocks")), None);
        assert_eq!(layout.kind_of(&row("Trades", "Data", "Trade", "Forex")), None);
        assert_eq!(layout.kind_of(&record(&["Trades", "Data", "Trade"])), None);
    }
}
