use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{AttendanceRecord, Event, NewAttendance, Ticket, TicketStatus};
use crate::stores::{AttendanceStore, EventStore, ProfileStore, StoreError, TicketStore};

/// In-process store used when no database backend is configured (local
/// development) and by the service tests. Enforces the same `(ticket_id,
/// event_id)` uniqueness constraint the hosted schema declares, atomically
/// under the write lock.
#[derive(Default)]
pub struct MemoryStore {
    tickets: RwLock<HashMap<String, Ticket>>,
    events: RwLock<HashMap<String, Event>>,
    profiles: RwLock<HashMap<String, String>>,
    attendance: RwLock<HashMap<(String, String), AttendanceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_ticket(&self, ticket: Ticket) {
        self.tickets.write().await.insert(ticket.id.clone(), ticket);
    }

    pub async fn add_event(&self, event: Event) {
        self.events.write().await.insert(event.id.clone(), event);
    }

    pub async fn add_profile(&self, attendee_id: &str, display_name: &str) {
        self.profiles
            .write()
            .await
            .insert(attendee_id.to_string(), display_name.to_string());
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn get_by_id(&self, ticket_id: &str) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tickets.read().await.get(ticket_id).cloned())
    }

    async fn mark_used(
        &self,
        ticket_id: &str,
        checked_in_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(ticket) = self.tickets.write().await.get_mut(ticket_id) {
            ticket.status = TicketStatus::Used;
            ticket.checked_in_at = Some(checked_in_at);
        }
        Ok(())
    }

    async fn store_qr_data(
        &self,
        ticket_id: &str,
        payload: Value,
        generated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(ticket) = self.tickets.write().await.get_mut(ticket_id) {
            ticket.qr_code_data = Some(payload);
            ticket.qr_code_generated_at = Some(generated_at);
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_by_ticket_and_event(
        &self,
        ticket_id: &str,
        event_id: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let key = (ticket_id.to_string(), event_id.to_string());
        Ok(self.attendance.read().await.get(&key).cloned())
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let key = (record.ticket_id.clone(), record.event_id.clone());
        let mut attendance = self.attendance.write().await;

        if attendance.contains_key(&key) {
            return Err(StoreError::UniqueViolation(format!(
                "attendance already recorded for ticket {} at event {}",
                record.ticket_id, record.event_id
            )));
        }

        let stored = AttendanceRecord {
            id: Uuid::new_v4().to_string(),
            ticket_id: record.ticket_id,
            event_id: record.event_id,
            attendee_id: record.attendee_id,
            checked_in_at: record.checked_in_at,
            checked_in_by: Some(record.checked_in_by),
            check_in_location: record.check_in_location,
            device_info: record.device_info,
            qr_code_data: record.qr_code_data,
            created_at: Utc::now(),
            nft_status: record.nft_status,
            nft_minted_at: None,
            nft_mint_address: None,
            nft_metadata_uri: None,
            attendee_name: None,
        };

        attendance.insert(key, stored.clone());
        Ok(stored)
    }

    async fn list_for_event(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut records: Vec<AttendanceRecord> = self
            .attendance
            .read()
            .await
            .values()
            .filter(|record| record.event_id == event_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.checked_in_at.cmp(&a.checked_in_at));
        Ok(records)
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn get_by_id(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        Ok(self.events.read().await.get(event_id).cloned())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn display_name(&self, attendee_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.profiles.read().await.get(attendee_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_attendance(ticket_id: &str, event_id: &str) -> NewAttendance {
        NewAttendance {
            ticket_id: ticket_id.to_string(),
            event_id: event_id.to_string(),
            attendee_id: "A1".to_string(),
            checked_in_at: Utc::now(),
            checked_in_by: "operator".to_string(),
            check_in_location: None,
            device_info: None,
            qr_code_data: None,
            nft_status: None,
        }
    }

    #[test]
    fn second_insert_for_same_ticket_and_event_is_a_unique_violation() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            store.insert(new_attendance("T1", "E1")).await.unwrap();

            let err = store.insert(new_attendance("T1", "E1")).await.unwrap_err();
            assert!(matches!(err, StoreError::UniqueViolation(_)));

            // Same ticket at a different event is a separate pair.
            store.insert(new_attendance("T1", "E2")).await.unwrap();
        });
    }

    #[test]
    fn list_for_event_is_newest_first() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            store.insert(new_attendance("T1", "E1")).await.unwrap();
            store.insert(new_attendance("T2", "E1")).await.unwrap();
            store.insert(new_attendance("T3", "E2")).await.unwrap();

            let records = store.list_for_event("E1").await.unwrap();
            assert_eq!(records.len(), 2);
            assert!(records[0].checked_in_at >= records[1].checked_in_at);
        });
    }
}
