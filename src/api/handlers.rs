use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use log::{error, info, warn};
use std::sync::Arc;

use super::models::{
    ApiInfo, HealthResponse, LanguageInfo, LimitsInfo, SummarizeRequest, ValidateRequest, ValidateResponse,
};
use super::{ApiState, MAX_BODY_BYTES, SERVICE_NAME};
use crate::app_config::{SUM_MAX_LENGTH_RANGE, SUM_MIN_LENGTH_FLOOR};
use crate::errors::{ErrorPayload, FailureKind};
use crate::language_utils;
use crate::summarization::SummaryParams;

pub const MAX_LENGTH_RANGE: [i64; 2] = [SUM_MAX_LENGTH_RANGE[0] as i64, SUM_MAX_LENGTH_RANGE[1] as i64];
pub const MIN_LENGTH_FLOOR: i64 = SUM_MIN_LENGTH_FLOOR as i64;

impl IntoResponse for ErrorPayload {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

fn rejection_payload(rejection: JsonRejection) -> ErrorPayload {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => ErrorPayload::new(
            "Invalid Content-Type",
            "Request must have Content-Type: application/json",
            "invalid_request",
            400,
        ),
        other => ErrorPayload::bad_request(other.body_text()),
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn info(State(state): State<Arc<ApiState>>) -> Json<ApiInfo> {
    let pipeline_config = state.pipeline.config();
    let languages = state
        .pipeline
        .policy()
        .supported_codes()
        .into_iter()
        .map(|code| LanguageInfo {
            name: language_utils::display_name(&code),
            translated: code != crate::language_policy::WORKING_LANGUAGE,
            code,
        })
        .collect();

    Json(ApiInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.clone(),
        model: state.model.clone(),
        languages,
        limits: LimitsInfo {
            input_max_length: pipeline_config.input_max_length,
            default_max_length: pipeline_config.summary.max_length,
            default_min_length: pipeline_config.summary.min_length,
            default_num_beams: pipeline_config.summary.num_beams,
            max_length_range: MAX_LENGTH_RANGE,
            min_length_floor: MIN_LENGTH_FLOOR,
            max_body_bytes: MAX_BODY_BYTES,
        },
    })
}

/// Check request parameters and merge them with the defaults
pub fn resolve_params(request: &SummarizeRequest, defaults: &SummaryParams) -> Result<SummaryParams, ErrorPayload> {
    if request.text.trim().is_empty() {
        return Err(ErrorPayload::new(
            "Missing Text",
            "The 'text' parameter is required and must be a non-empty string",
            "invalid_request",
            400,
        ));
    }

    let max_length = request.max_length.unwrap_or(defaults.max_length as i64);
    if !(MAX_LENGTH_RANGE[0]..=MAX_LENGTH_RANGE[1]).contains(&max_length) {
        return Err(ErrorPayload::new(
            "Invalid max_length",
            format!(
                "max_length must be an integer between {} and {}",
                MAX_LENGTH_RANGE[0], MAX_LENGTH_RANGE[1]
            ),
            "invalid_request",
            400,
        ));
    }

    let min_length = request.min_length.unwrap_or(defaults.min_length as i64);
    if min_length < MIN_LENGTH_FLOOR || min_length >= max_length {
        return Err(ErrorPayload::new(
            "Invalid min_length",
            format!("min_length must be an integer between {} and {}", MIN_LENGTH_FLOOR, max_length - 1),
            "invalid_request",
            400,
        ));
    }

    let num_beams = request.num_beams.unwrap_or(defaults.num_beams as i64);
    let num_beams = u32::try_from(num_beams).ok().filter(|beams| *beams > 0).ok_or_else(|| {
        ErrorPayload::new(
            "Invalid num_beams",
            "num_beams must be a positive integer",
            "invalid_request",
            400,
        )
    })?;

    Ok(SummaryParams {
        min_length: min_length as usize,
        max_length: max_length as usize,
        num_beams,
    })
}

pub async fn summarize(
    State(state): State<Arc<ApiState>>,
    body: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("[{}] Rejected request body: {}", request_id, rejection.body_text());
            return with_request_id(rejection_payload(rejection).into_response(), &request_id);
        }
    };

    let params = match resolve_params(&request, &state.pipeline.config().summary) {
        Ok(params) => params,
        Err(payload) => {
            warn!("[{}] {}", request_id, payload.message);
            return with_request_id(payload.into_response(), &request_id);
        }
    };

    info!(
        "[{}] Summarization request - text length: {}, max_length: {}, min_length: {}",
        request_id,
        request.text.chars().count(),
        params.max_length,
        params.min_length
    );

    let response = match state.pipeline.process_with_params(&request.text, &params).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            match e.kind() {
                FailureKind::Client => warn!("[{}] {}", request_id, e),
                FailureKind::Server => error!("[{}] {}", request_id, e),
            }
            ErrorPayload::from(&e).into_response()
        }
    };
    with_request_id(response, &request_id)
}

pub async fn validate(body: Result<Json<ValidateRequest>, JsonRejection>) -> Response {
    match body {
        Ok(Json(request)) => {
            let length = request.text.chars().count();
            Json(ValidateResponse {
                valid: !request.text.trim().is_empty(),
                length,
                word_count: request.text.split_whitespace().count(),
                estimated_processing_time: length as f64 / 1000.0,
            })
            .into_response()
        }
        Err(rejection) => rejection_payload(rejection).into_response(),
    }
}

fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
