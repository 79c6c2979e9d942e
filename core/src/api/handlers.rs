use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, Json, Multipart, Query, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
};
use serde::Deserialize;
use tracing::error;

use super::{errors::ErrorResponse, AppState};
use crate::{
    models::report::ReportSummary,
    services::{
        market_data::exchange_rates::ExchangeRates, report::Report,
        shared::constants::DEFAULT_REPORT_CURRENCY,
    },
};

const CRON_HEADER: &str = "X-Appengine-Cron";
const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub currency: Option<String>,
    pub deemed: Option<bool>,
}

/// Takes a CSV export either as the `file` field of a multipart form or as
/// the raw request body.
pub async fn result(
    State(state): State<AppState>,
    Query(query): Query<ResultQuery>,
    request: Request,
) -> Result<Json<ReportSummary>, ErrorResponse> {
    let body = read_export(request, &state).await?;
    let rates = ExchangeRates::load_current(
        &state.store,
        state.source.as_ref(),
        false,
        state.settings.max_backtrack_days,
    )
    .await?;

    let mut report = Report::new(
        query.currency.as_deref().unwrap_or(DEFAULT_REPORT_CURRENCY),
        query.deemed.unwrap_or(true),
        Arc::new(rates),
    );
    report.add_trades(&body)?;
    Ok(Json(report.summary()))
}

async fn read_export(request: Request, state: &AppState) -> Result<Bytes, ErrorResponse> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if !is_form {
        return Bytes::from_request(request, state).await.map_err(|rejection| {
            ErrorResponse::new(rejection.status(), "invalid_body", &rejection.body_text())
        });
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|rejection| {
            ErrorResponse::new(rejection.status(), "invalid_form", &rejection.body_text())
        })?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ErrorResponse::new(err.status(), "invalid_form", &err.body_text()))?
    {
        if field.name() == Some(FILE_FIELD) {
            return field
                .bytes()
                .await
                .map_err(|err| ErrorResponse::new(err.status(), "invalid_form", &err.body_text()));
        }
    }

    Err(ErrorResponse::new(
        StatusCode::BAD_REQUEST,
        "missing_file",
        "No 'file' field in the submitted form.",
    ))
}

/// Fetches today's exchange rates into the bucket when they are missing.
pub async fn cron(State(state): State<AppState>, headers: HeaderMap) -> (StatusCode, String) {
    if !headers.contains_key(CRON_HEADER) {
        return (StatusCode::FORBIDDEN, "Forbidden".to_string());
    }
    if state.settings.bucket_id.is_none() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "BUCKET_ID missing!".to_string(),
        );
    }

    match ExchangeRates::load_current(
        &state.store,
        state.source.as_ref(),
        true,
        state.settings.max_backtrack_days,
    )
    .await
    {
        Ok(_) => (StatusCode::OK, "Done!".to_string()),
        Err(err) => {
            error!("Exchange rate refresh failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
