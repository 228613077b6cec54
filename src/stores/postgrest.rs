use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::{AttendanceRecord, Event, NewAttendance, Ticket};
use crate::stores::{AttendanceStore, EventStore, ProfileStore, StoreError, TicketStore};

/// Store implementation over the hosted Postgres REST API. Each row type maps
/// to one table; filters use the `column=eq.value` query syntax.
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .authed(self.client.get(self.table_url(table)).query(query))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "{} select returned {}",
                table,
                response.status()
            )));
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn patch_row(
        &self,
        table: &str,
        id: &str,
        body: Value,
    ) -> Result<(), StoreError> {
        let response = self
            .authed(
                self.client
                    .patch(self.table_url(table))
                    .query(&[("id", format!("eq.{}", id))])
                    .json(&body),
            )
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "{} update returned {}",
                table,
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for PostgrestStore {
    async fn get_by_id(&self, ticket_id: &str) -> Result<Option<Ticket>, StoreError> {
        let query = [
            ("id", format!("eq.{}", ticket_id)),
            ("select", "*".to_string()),
            ("limit", "1".to_string()),
        ];
        let mut rows: Vec<Ticket> = self.select_rows("tickets", &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn mark_used(
        &self,
        ticket_id: &str,
        checked_in_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let body = json!({
            "status": "used",
            "checked_in_at": checked_in_at,
        });
        self.patch_row("tickets", ticket_id, body).await
    }

    async fn store_qr_data(
        &self,
        ticket_id: &str,
        payload: Value,
        generated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let body = json!({
            "qr_code_data": payload,
            "qr_code_generated_at": generated_at,
        });
        self.patch_row("tickets", ticket_id, body).await
    }
}

#[async_trait]
impl AttendanceStore for PostgrestStore {
    async fn find_by_ticket_and_event(
        &self,
        ticket_id: &str,
        event_id: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let query = [
            ("ticket_id", format!("eq.{}", ticket_id)),
            ("event_id", format!("eq.{}", event_id)),
            ("select", "*".to_string()),
            ("limit", "1".to_string()),
        ];
        let mut rows: Vec<AttendanceRecord> = self.select_rows("attendance", &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let response = self
            .authed(
                self.client
                    .post(self.table_url("attendance"))
                    .header("Prefer", "return=representation")
                    .json(&record),
            )
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // The unique index on (ticket_id, event_id) surfaces as 409 here;
        // callers treat it as "already checked in", not an outage.
        if response.status() == StatusCode::CONFLICT {
            let detail = response.text().await.unwrap_or_default();
            return Err(StoreError::UniqueViolation(detail));
        }

        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "attendance insert returned {}",
                response.status()
            )));
        }

        let mut rows: Vec<AttendanceRecord> = response
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        rows.into_iter().next().ok_or_else(|| {
            StoreError::Backend("attendance insert returned no representation".to_string())
        })
    }

    async fn list_for_event(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, StoreError> {
        let query = [
            ("event_id", format!("eq.{}", event_id)),
            ("select", "*".to_string()),
            ("order", "checked_in_at.desc".to_string()),
        ];
        self.select_rows("attendance", &query).await
    }
}

#[async_trait]
impl EventStore for PostgrestStore {
    async fn get_by_id(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        let query = [
            ("id", format!("eq.{}", event_id)),
            ("select", "*".to_string()),
            ("limit", "1".to_string()),
        ];
        let mut rows: Vec<Event> = self.select_rows("events", &query).await?;
        Ok(rows.into_iter().next())
    }
}

#[derive(Deserialize)]
struct ProfileRow {
    display_name: Option<String>,
}

#[async_trait]
impl ProfileStore for PostgrestStore {
    async fn display_name(&self, attendee_id: &str) -> Result<Option<String>, StoreError> {
        let query = [
            ("id", format!("eq.{}", attendee_id)),
            ("select", "display_name".to_string()),
            ("limit", "1".to_string()),
        ];
        let mut rows: Vec<ProfileRow> = self.select_rows("profiles", &query).await?;
        Ok(rows.into_iter().next().and_then(|row| row.display_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketStatus;
    use mockito::Matcher;

    fn ticket_row(id: &str, status: &str) -> String {
        format!(
            r#"[{{
                "id": "{id}",
                "event_id": "E1",
                "owner_id": "A1",
                "status": "{status}",
                "checked_in_at": null,
                "purchase_date": null,
                "qr_code_data": null,
                "qr_code_generated_at": null,
                "metadata": null
            }}]"#
        )
    }

    #[tokio::test]
    async fn get_ticket_parses_the_first_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/tickets")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "eq.T1".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ticket_row("T1", "active"))
            .create_async()
            .await;

        let store = PostgrestStore::new(server.url(), "test-key");
        let ticket = TicketStore::get_by_id(&store, "T1").await.unwrap().unwrap();
        assert_eq!(ticket.id, "T1");
        assert_eq!(ticket.status, TicketStatus::Active);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_ticket_is_none_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/tickets")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let store = PostgrestStore::new(server.url(), "test-key");
        assert!(TicketStore::get_by_id(&store, "missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn insert_conflict_maps_to_unique_violation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/attendance")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"23505","message":"duplicate key value"}"#)
            .create_async()
            .await;

        let store = PostgrestStore::new(server.url(), "test-key");
        let record = NewAttendance {
            ticket_id: "T1".to_string(),
            event_id: "E1".to_string(),
            attendee_id: "A1".to_string(),
            checked_in_at: Utc::now(),
            checked_in_by: "operator".to_string(),
            check_in_location: None,
            device_info: None,
            qr_code_data: None,
            nft_status: None,
        };

        let err = store.insert(record).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn server_error_is_an_availability_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/tickets")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let store = PostgrestStore::new(server.url(), "test-key");
        let err = TicketStore::get_by_id(&store, "T1").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
