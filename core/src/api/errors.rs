use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::error::ReportError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    status: u16,     // HTTP status code
    error: String,   // Short error identifier
    message: String, // Human-readable error message
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: &str, message: &str) -> Self {
        ErrorResponse {
            status: status.as_u16(),
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

fn error_identifier(err: &ReportError) -> &'static str {
    match err {
        ReportError::InvalidEncoding => "invalid_encoding",
        ReportError::InvalidDate(_) => "invalid_date",
        ReportError::InvalidNumber(_) => "invalid_number",
        ReportError::ClosedLotWithoutTrade => "closed_lot_without_trade",
        ReportError::SymbolMismatch { .. } => "symbol_mismatch",
        ReportError::QuantityMismatch { .. } => "quantity_mismatch",
        ReportError::RateNotFound { .. } => "rate_not_found",
        ReportError::RatesUnavailable => "rates_unavailable",
        ReportError::Configuration(_) => "configuration",
        ReportError::RateFeed(_) => "rate_feed",
        ReportError::Storage(_) => "storage",
        ReportError::Csv(_) => "invalid_csv",
        ReportError::Io(_) => "io",
    }
}

impl From<ReportError> for ErrorResponse {
    fn from(err: ReportError) -> Self {
        let status = if err.is_client_error() {
            debug!("Rejected request: {}", err);
            StatusCode::BAD_REQUEST
        } else {
            error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        ErrorResponse::new(status, error_identifier(&err), &err.to_string())
    }
}
