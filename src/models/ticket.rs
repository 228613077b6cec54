use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub event_id: String,
    pub owner_id: String,
    pub status: TicketStatus,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub qr_code_data: Option<Value>,
    pub qr_code_generated_at: Option<DateTime<Utc>>,
    pub metadata: Option<Value>,
}

/// `used` and `cancelled` are terminal for check-in purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Used,
    Cancelled,
}
