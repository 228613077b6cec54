pub mod memory;
pub mod postgrest;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{AttendanceRecord, Event, NewAttendance, Ticket};

/// Errors produced by the storage backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Insert collided with an existing row (unique constraint).
    #[error("Duplicate record: {0}")]
    UniqueViolation(String),

    /// The backend could not be reached or refused the request.
    #[error("Store request failed: {0}")]
    Unavailable(String),

    /// The backend answered with something we could not interpret.
    #[error("Unexpected store response: {0}")]
    Backend(String),
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn get_by_id(&self, ticket_id: &str) -> Result<Option<Ticket>, StoreError>;

    /// Marks a ticket as used and stamps its check-in time.
    async fn mark_used(
        &self,
        ticket_id: &str,
        checked_in_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Persists an issued QR payload onto the ticket row.
    async fn store_qr_data(
        &self,
        ticket_id: &str,
        payload: Value,
        generated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_by_ticket_and_event(
        &self,
        ticket_id: &str,
        event_id: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Inserts a check-in. The backing store enforces uniqueness on
    /// `(ticket_id, event_id)` and must surface a collision as
    /// [`StoreError::UniqueViolation`].
    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    /// An event's attendance, newest first.
    async fn list_for_event(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, StoreError>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn get_by_id(&self, event_id: &str) -> Result<Option<Event>, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn display_name(&self, attendee_id: &str) -> Result<Option<String>, StoreError>;
}

/// The full set of store handles the services need, bundled so wiring stays
/// in one place.
#[derive(Clone)]
pub struct Stores {
    pub tickets: Arc<dyn TicketStore>,
    pub attendance: Arc<dyn AttendanceStore>,
    pub events: Arc<dyn EventStore>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl Stores {
    /// Every store handle backed by one shared implementation.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: TicketStore + AttendanceStore + EventStore + ProfileStore + 'static,
    {
        Self {
            tickets: backend.clone(),
            attendance: backend.clone(),
            events: backend.clone(),
            profiles: backend,
        }
    }
}
