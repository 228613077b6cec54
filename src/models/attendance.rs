use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One check-in. Created exactly once per `(ticket_id, event_id)` pair and
/// never mutated afterwards, except for the minting fields owned by the badge
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub ticket_id: String,
    pub event_id: String,
    pub attendee_id: String,
    pub checked_in_at: DateTime<Utc>,
    pub checked_in_by: Option<String>,
    pub check_in_location: Option<String>,
    pub device_info: Option<Value>,
    pub qr_code_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub nft_status: Option<NftStatus>,
    pub nft_minted_at: Option<DateTime<Utc>>,
    pub nft_mint_address: Option<String>,
    pub nft_metadata_uri: Option<String>,
    /// Resolved display name, attached to responses only (not a stored column).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee_name: Option<String>,
}

/// Insert shape for a new check-in.
#[derive(Debug, Clone, Serialize)]
pub struct NewAttendance {
    pub ticket_id: String,
    pub event_id: String,
    pub attendee_id: String,
    pub checked_in_at: DateTime<Utc>,
    pub checked_in_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft_status: Option<NftStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NftStatus {
    Pending,
    Minted,
    Failed,
}
