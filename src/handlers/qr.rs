use crate::{
    error::GateCheckError,
    handlers::checkin::AppState,
    models::ApiResponse,
    services::IssuedQr,
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

pub async fn issue_ticket_qr(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<ApiResponse<IssuedQr>>, GateCheckError> {
    let issued = state.checkin.issue_qr(&ticket_id).await?;

    Ok(Json(ApiResponse {
        success: true,
        data: issued,
        timestamp: Utc::now(),
        request_id: Uuid::new_v4().to_string(),
    }))
}
