use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub creator_id: String,
    pub nft_enabled: Option<bool>,
}

impl Event {
    /// Whether successful check-ins should trigger an attendance badge mint.
    pub fn mints_badges(&self) -> bool {
        self.nft_enabled.unwrap_or(false)
    }
}
