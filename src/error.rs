use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::stores::StoreError;

/// Why a scan was turned away. These are expected outcomes of the check-in
/// procedure, carried as data through the service layer and only rendered as
/// HTTP errors at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    Malformed,
    WrongEvent,
    Tampered,
    TicketNotFound,
    AlreadyUsed,
    Cancelled,
    DuplicateCheckin,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::Malformed => "malformed",
            RejectionReason::WrongEvent => "wrong_event",
            RejectionReason::Tampered => "tampered",
            RejectionReason::TicketNotFound => "ticket_not_found",
            RejectionReason::AlreadyUsed => "already_used",
            RejectionReason::Cancelled => "cancelled",
            RejectionReason::DuplicateCheckin => "duplicate_checkin",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            RejectionReason::Malformed => "Scan could not be read - no ticket identifier found",
            RejectionReason::WrongEvent => "This QR code is not valid for this event",
            RejectionReason::Tampered => "Invalid QR code - data may have been tampered with",
            RejectionReason::TicketNotFound => "Ticket not found or invalid",
            RejectionReason::AlreadyUsed => "This ticket has already been used",
            RejectionReason::Cancelled => "This ticket has been cancelled",
            RejectionReason::DuplicateCheckin => "This ticket has already been checked in",
        }
    }
}

#[derive(Error, Debug)]
pub enum GateCheckError {
    #[error("{}", .0.user_message())]
    Rejected(RejectionReason),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for GateCheckError {
    fn from(err: StoreError) -> Self {
        match err {
            // Should already be mapped by the check-in service; kept as a
            // rejection here so a stray violation never reads as an outage.
            StoreError::UniqueViolation(_) => {
                GateCheckError::Rejected(RejectionReason::DuplicateCheckin)
            }
            other => GateCheckError::StoreUnavailable(other.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub retryable: bool,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for GateCheckError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();

        let (status, error_code, retryable) = match &self {
            GateCheckError::Rejected(reason) => {
                let status = match reason {
                    RejectionReason::Malformed => StatusCode::BAD_REQUEST,
                    RejectionReason::Tampered => StatusCode::UNPROCESSABLE_ENTITY,
                    RejectionReason::TicketNotFound => StatusCode::NOT_FOUND,
                    RejectionReason::WrongEvent
                    | RejectionReason::AlreadyUsed
                    | RejectionReason::Cancelled
                    | RejectionReason::DuplicateCheckin => StatusCode::CONFLICT,
                };
                (status, reason.code(), false)
            }
            GateCheckError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", true)
            }
            GateCheckError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", false)
            }
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            retryable,
            timestamp: Utc::now(),
            request_id,
        };

        match &self {
            GateCheckError::Rejected(reason) => {
                tracing::warn!(reason = reason.code(), "Check-in rejected");
            }
            _ => {
                tracing::error!(error = ?self, error_code = error_code, "Request failed");
            }
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_codes_match_the_wire_taxonomy() {
        assert_eq!(RejectionReason::DuplicateCheckin.code(), "duplicate_checkin");
        assert_eq!(
            serde_json::to_string(&RejectionReason::WrongEvent).unwrap(),
            "\"wrong_event\""
        );
    }

    #[test]
    fn unique_violation_converts_to_a_rejection_not_an_outage() {
        let err: GateCheckError = StoreError::UniqueViolation("attendance".to_string()).into();
        assert!(matches!(
            err,
            GateCheckError::Rejected(RejectionReason::DuplicateCheckin)
        ));
    }

    #[test]
    fn infrastructure_failures_are_retryable() {
        let err: GateCheckError = StoreError::Unavailable("timeout".to_string()).into();
        assert!(matches!(err, GateCheckError::StoreUnavailable(_)));
    }
}
