use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{GateCheckError, RejectionReason};
use crate::models::{
    AttendanceRecord, NewAttendance, NftStatus, QrCodePayload, ScannedCode, TicketStatus,
};
use crate::services::{CacheService, MintService};
use crate::stores::{AttendanceStore, EventStore, ProfileStore, StoreError, Stores, TicketStore};

/// Everything the scanner station knows about one scan attempt.
#[derive(Debug, Clone)]
pub struct CheckInContext {
    /// Event the scanning station is bound to.
    pub event_id: String,
    /// Operator running the station.
    pub operator_id: String,
    pub location: Option<String>,
    pub device_info: Option<Value>,
}

/// Outcome of one scan attempt. Rejections are ordinary results here, not
/// errors; infrastructure failures travel separately as [`StoreError`].
#[derive(Debug)]
pub enum CheckInResult {
    Committed(AttendanceRecord),
    Rejected(RejectionReason),
}

/// A freshly issued, signed QR payload plus its printable encoding.
#[derive(Debug, Serialize)]
pub struct IssuedQr {
    pub payload: QrCodePayload,
    pub qr_string: String,
}

/// The check-in decision procedure. Stateless across invocations: every
/// decision re-reads current store state, and the only shared mutable
/// resource is the store itself.
pub struct CheckInService {
    stores: Stores,
    cache: Arc<CacheService>,
    mint: Arc<MintService>,
}

impl CheckInService {
    pub fn new(stores: Stores, cache: Arc<CacheService>, mint: Arc<MintService>) -> Self {
        Self { stores, cache, mint }
    }

    /// Runs a scanned or typed code through the check-in sequence:
    /// decode, event match, signature check, ticket resolution, status gate,
    /// duplicate gate, then the committed insert-and-mark transition.
    /// Checks run strictly in that order and stop at the first failure.
    pub async fn submit_scan(
        &self,
        raw_code: &str,
        ctx: CheckInContext,
    ) -> Result<CheckInResult, StoreError> {
        let Some(code) = ScannedCode::parse(raw_code) else {
            return Ok(CheckInResult::Rejected(RejectionReason::Malformed));
        };

        if let ScannedCode::Modern(payload) = &code {
            if payload.event_id != ctx.event_id {
                return Ok(CheckInResult::Rejected(RejectionReason::WrongEvent));
            }
            if !payload.verify() {
                return Ok(CheckInResult::Rejected(RejectionReason::Tampered));
            }
        }

        let ticket_id = code.ticket_id().to_string();
        let Some(ticket) = self.stores.tickets.get_by_id(&ticket_id).await? else {
            return Ok(CheckInResult::Rejected(RejectionReason::TicketNotFound));
        };

        // Covers legacy scans too: a bare id carries no event binding, so the
        // ticket row decides which event it belongs to.
        if ticket.event_id != ctx.event_id {
            return Ok(CheckInResult::Rejected(RejectionReason::WrongEvent));
        }

        match ticket.status {
            TicketStatus::Used => {
                return Ok(CheckInResult::Rejected(RejectionReason::AlreadyUsed))
            }
            TicketStatus::Cancelled => {
                return Ok(CheckInResult::Rejected(RejectionReason::Cancelled))
            }
            TicketStatus::Active => {}
        }

        if self
            .stores
            .attendance
            .find_by_ticket_and_event(&ticket_id, &ctx.event_id)
            .await?
            .is_some()
        {
            return Ok(CheckInResult::Rejected(RejectionReason::DuplicateCheckin));
        }

        // Badge eligibility decides the record's initial minting status. A
        // missing event degrades to "no badges" rather than blocking the door.
        let mints_badges = match self.stores.events.get_by_id(&ctx.event_id).await {
            Ok(Some(event)) => event.mints_badges(),
            Ok(None) => {
                tracing::warn!("Event {} not found while resolving badge settings", ctx.event_id);
                false
            }
            Err(e) => {
                tracing::warn!("Event lookup failed for {}: {}", ctx.event_id, e);
                false
            }
        };

        let attendee_id = match &code {
            ScannedCode::Modern(payload) => payload.attendee_id.clone(),
            ScannedCode::Legacy(_) => ticket.owner_id.clone(),
        };

        let payload_name = match &code {
            ScannedCode::Modern(payload) => payload.attendee_name.clone(),
            ScannedCode::Legacy(_) => None,
        };
        let attendee_name = self
            .resolve_display_name(&attendee_id)
            .await
            .or(payload_name)
            .unwrap_or_else(|| "Unknown".to_string());

        let qr_code_data = match &code {
            ScannedCode::Modern(payload) => serde_json::to_value(payload).ok(),
            ScannedCode::Legacy(raw) => Some(Value::String(raw.clone())),
        };

        let new_record = NewAttendance {
            ticket_id: ticket.id.clone(),
            event_id: ctx.event_id.clone(),
            attendee_id,
            checked_in_at: Utc::now(),
            checked_in_by: ctx.operator_id,
            check_in_location: ctx.location,
            device_info: ctx.device_info,
            qr_code_data,
            nft_status: mints_badges.then_some(NftStatus::Pending),
        };

        let mut record = match self.stores.attendance.insert(new_record).await {
            Ok(record) => record,
            // Lost the race against another station between the duplicate
            // pre-check and the insert. Same outcome as the pre-check.
            Err(StoreError::UniqueViolation(_)) => {
                return Ok(CheckInResult::Rejected(RejectionReason::DuplicateCheckin));
            }
            Err(e) => return Err(e),
        };

        // The attendance row is the source of truth for "did check-in
        // happen". The ticket flag is bookkeeping: a failed update is logged
        // and the check-in stands.
        if let Err(e) = self
            .stores
            .tickets
            .mark_used(&record.ticket_id, record.checked_in_at)
            .await
        {
            tracing::warn!(
                "Ticket {} status update failed after check-in: {}",
                record.ticket_id,
                e
            );
        }

        if mints_badges {
            self.mint.request_mint(&record.id, None);
        }

        record.attendee_name = Some(attendee_name);

        tracing::info!(
            "Checked in ticket {} for event {}",
            record.ticket_id,
            record.event_id
        );

        Ok(CheckInResult::Committed(record))
    }

    /// An event's attendance feed, newest first.
    pub async fn event_attendance(
        &self,
        event_id: &str,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.stores.attendance.list_for_event(event_id).await
    }

    /// Issues (or reissues) the signed QR payload for a ticket and persists a
    /// copy on the ticket row so the holder can re-display it.
    pub async fn issue_qr(&self, ticket_id: &str) -> Result<IssuedQr, GateCheckError> {
        let Some(ticket) = self.stores.tickets.get_by_id(ticket_id).await? else {
            return Err(GateCheckError::Rejected(RejectionReason::TicketNotFound));
        };

        match ticket.status {
            TicketStatus::Used => {
                return Err(GateCheckError::Rejected(RejectionReason::AlreadyUsed))
            }
            TicketStatus::Cancelled => {
                return Err(GateCheckError::Rejected(RejectionReason::Cancelled))
            }
            TicketStatus::Active => {}
        }

        let attendee_name = self
            .resolve_display_name(&ticket.owner_id)
            .await
            .unwrap_or_else(|| "Unknown".to_string());

        let payload = QrCodePayload::issue(
            ticket.id.clone(),
            ticket.event_id.clone(),
            ticket.owner_id.clone(),
            Some(attendee_name),
        );
        let qr_string = payload
            .to_qr_string()
            .map_err(|e| GateCheckError::Internal(e.into()))?;

        // Issuance succeeds even if the persisted copy misses.
        if let Ok(value) = serde_json::to_value(&payload) {
            if let Err(e) = self
                .stores
                .tickets
                .store_qr_data(&ticket.id, value, Utc::now())
                .await
            {
                tracing::warn!("Could not persist QR payload for ticket {}: {}", ticket.id, e);
            }
        }

        tracing::info!("Issued QR payload for ticket {}", ticket.id);
        Ok(IssuedQr { payload, qr_string })
    }

    async fn resolve_display_name(&self, attendee_id: &str) -> Option<String> {
        let cache_key = format!("profile:name:{}", attendee_id);
        if let Some(name) = self.cache.get::<String>(&cache_key).await.ok().flatten() {
            return Some(name);
        }

        match self.stores.profiles.display_name(attendee_id).await {
            Ok(Some(name)) => {
                let _ = self.cache.set(&cache_key, &name, 300).await;
                Some(name)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Profile lookup failed for {}: {}", attendee_id, e);
                None
            }
        }
    }
}
