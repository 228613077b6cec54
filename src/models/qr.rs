//! Signed QR payloads for ticket check-in.
//!
//! The signature is a reversible base64 encoding of the signed fields, not a
//! keyed MAC: it detects accidental corruption and naive field edits, but
//! anyone who knows the encoding can forge a matching signature. This is a
//! known limitation of the scheme, accepted for low-stakes door check-in.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QrCodePayload {
    pub ticket_id: String,
    pub event_id: String,
    pub attendee_id: String,
    /// Display name shown on the scanner. Informational only, not signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee_name: Option<String>,
    pub timestamp: String,
    pub signature: String,
}

/// Encoding/decoding failures, distinct from a signature mismatch.
#[derive(Error, Debug)]
pub enum QrCodecError {
    #[error("QR payload could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("QR payload could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

impl QrCodePayload {
    /// Issues a freshly signed payload for a ticket, stamped with the current
    /// time (RFC 3339, millisecond precision, UTC).
    pub fn issue(
        ticket_id: impl Into<String>,
        event_id: impl Into<String>,
        attendee_id: impl Into<String>,
        attendee_name: Option<String>,
    ) -> Self {
        let ticket_id = ticket_id.into();
        let event_id = event_id.into();
        let attendee_id = attendee_id.into();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let signature = sign(&ticket_id, &event_id, &attendee_id, &timestamp);

        Self {
            ticket_id,
            event_id,
            attendee_id,
            attendee_name,
            timestamp,
            signature,
        }
    }

    /// Recomputes the signature from the payload's own fields and compares it
    /// to the embedded one. Never fails: any irregularity reads as invalid.
    pub fn verify(&self) -> bool {
        let expected = sign(
            &self.ticket_id,
            &self.event_id,
            &self.attendee_id,
            &self.timestamp,
        );
        self.signature == expected
    }

    /// Serializes the payload to the JSON string printed into QR images.
    pub fn to_qr_string(&self) -> Result<String, QrCodecError> {
        serde_json::to_string(self).map_err(QrCodecError::Encode)
    }

    /// Parses a scanned JSON string back into a payload.
    pub fn from_qr_string(raw: &str) -> Result<Self, QrCodecError> {
        serde_json::from_str(raw).map_err(QrCodecError::Decode)
    }
}

fn sign(ticket_id: &str, event_id: &str, attendee_id: &str, timestamp: &str) -> String {
    let input = format!("{}-{}-{}-{}", ticket_id, event_id, attendee_id, timestamp);
    STANDARD.encode(input.as_bytes())
}
