use crate::{
    error::GateCheckError,
    models::{ApiResponse, AttendanceRecord},
    services::{Analytics, CheckInContext, CheckInResult, CheckInService},
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub checkin: Arc<CheckInService>,
    pub analytics: Arc<Analytics>,
}

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    /// Raw scanner output or manually typed code.
    pub code: String,
    pub operator_id: String,
    pub location: Option<String>,
    pub device_info: Option<Value>,
}

pub async fn submit_check_in(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<ApiResponse<AttendanceRecord>>, GateCheckError> {
    let ctx = CheckInContext {
        event_id: event_id.clone(),
        operator_id: request.operator_id,
        location: request.location,
        device_info: request.device_info,
    };

    let result = state.checkin.submit_scan(&request.code, ctx).await?;

    match result {
        CheckInResult::Committed(record) => {
            state.analytics.record_check_in(&event_id).await;
            Ok(Json(ApiResponse {
                success: true,
                data: record,
                timestamp: Utc::now(),
                request_id: Uuid::new_v4().to_string(),
            }))
        }
        CheckInResult::Rejected(reason) => {
            state.analytics.record_rejection(reason).await;
            Err(GateCheckError::Rejected(reason))
        }
    }
}

pub async fn list_attendance(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<AttendanceRecord>>>, GateCheckError> {
    let records = state.checkin.event_attendance(&event_id).await?;

    Ok(Json(ApiResponse {
        success: true,
        data: records,
        timestamp: Utc::now(),
        request_id: Uuid::new_v4().to_string(),
    }))
}
