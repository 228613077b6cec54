use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;

use crate::error::ErrorResponse;
use crate::models::{ApiResponse, AttendanceRecord};

/// HTTP client for a door scanner station: submits scanned or typed codes to
/// the check-in endpoint of one event.
pub struct StationClient {
    client: Client,
    base_url: String,
    event_id: String,
    operator_id: String,
    location: Option<String>,
}

/// What the server said about one submitted code.
#[derive(Debug)]
pub enum SubmitOutcome {
    CheckedIn {
        ticket_id: String,
        attendee_name: String,
    },
    Rejected {
        error_code: String,
        message: String,
        retryable: bool,
    },
}

impl StationClient {
    pub fn new(
        base_url: impl Into<String>,
        event_id: impl Into<String>,
        operator_id: impl Into<String>,
        location: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            event_id: event_id.into(),
            operator_id: operator_id.into(),
            location,
        }
    }

    pub async fn submit(&self, code: &str) -> Result<SubmitOutcome> {
        let url = format!(
            "{}/api/events/{}/check-in",
            self.base_url, self.event_id
        );

        let body = json!({
            "code": code,
            "operator_id": self.operator_id,
            "location": self.location,
            "device_info": {
                "station": "scan-station",
                "version": env!("CARGO_PKG_VERSION"),
            },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("check-in request failed")?;

        if response.status().is_success() {
            let body: ApiResponse<AttendanceRecord> = response
                .json()
                .await
                .context("unexpected check-in response body")?;
            return Ok(SubmitOutcome::CheckedIn {
                ticket_id: body.data.ticket_id,
                attendee_name: body
                    .data
                    .attendee_name
                    .unwrap_or_else(|| "Unknown".to_string()),
            });
        }

        let body: ErrorResponse = response
            .json()
            .await
            .context("unexpected error response body")?;
        Ok(SubmitOutcome::Rejected {
            error_code: body.error_code,
            message: body.error,
            retryable: body.retryable,
        })
    }
}
