use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Input data not in UTF-8 text format.")]
    InvalidEncoding,

    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("Tried to close a lot without trades.")]
    ClosedLotWithoutTrade,

    #[error("Symbol mismatch! Date: {date}, Trade: {trade}, ClosedLot: {closed_lot}")]
    SymbolMismatch {
        date: NaiveDate,
        trade: String,
        closed_lot: String,
    },

    #[error(
        "Invalid data. \"Trade\" and \"ClosedLot\" quantities do not match. Date: {date}, Symbol: {symbol}"
    )]
    QuantityMismatch { date: NaiveDate, symbol: String },

    #[error("Currency {currency} not found near date {original_date} - ended search at {search_stopped_at}")]
    RateNotFound {
        currency: String,
        original_date: NaiveDate,
        search_stopped_at: NaiveDate,
    },

    #[error("Maximum number of retries exceeded. Could not retrieve currency exchange rates.")]
    RatesUnavailable,

    #[error("{0}")]
    Configuration(String),

    #[error("Malformed exchange rate data: {0}")]
    RateFeed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Errors caused by the submitted data rather than by the service itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReportError::InvalidEncoding
                | ReportError::InvalidDate(_)
                | ReportError::InvalidNumber(_)
                | ReportError::ClosedLotWithoutTrade
                | ReportError::SymbolMismatch { .. }
                | ReportError::QuantityMismatch { .. }
                | ReportError::RateNotFound { .. }
                | ReportError::Csv(_)
        )
    }
}

impl From<object_store::Error> for ReportError {
    fn from(err: object_store::Error) -> Self {
        ReportError::Storage(err.to_string())
    }
}

impl From<zip::result::ZipError> for ReportError {
    fn from(err: zip::result::ZipError) -> Self {
        ReportError::RateFeed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
