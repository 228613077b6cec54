use anyhow::{Context, Result};
use gatecheck::client::{StationClient, SubmitOutcome};
use std::io::{self, BufRead};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Load configuration
    dotenvy::dotenv().ok();

    let base_url =
        std::env::var("GATECHECK_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let event_id = std::env::var("EVENT_ID").context("EVENT_ID required")?;
    let operator_id =
        std::env::var("OPERATOR_ID").unwrap_or_else(|_| "scan-station".to_string());
    let location = std::env::var("CHECKIN_LOCATION").ok();

    println!("gatecheck scan station");
    println!("======================");
    println!("Server:   {}", base_url);
    println!("Event:    {}", event_id);
    println!("Operator: {}", operator_id);
    println!();
    println!("Scan a code or type a ticket id, then press Enter. Ctrl-D quits.");
    println!();

    let client = StationClient::new(base_url, event_id, operator_id, location);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let code = line?;
        if code.trim().is_empty() {
            continue;
        }

        match client.submit(&code).await {
            Ok(SubmitOutcome::CheckedIn {
                ticket_id,
                attendee_name,
            }) => {
                println!("[OK] {} checked in (ticket {})", attendee_name, ticket_id);
            }
            Ok(SubmitOutcome::Rejected {
                error_code,
                message,
                retryable,
            }) => {
                if retryable {
                    println!("[RETRY] {} - try again in a moment", message);
                } else {
                    println!("[REJECTED] {} ({})", message, error_code);
                }
            }
            Err(e) => {
                println!("[FAILED] {}", e);
            }
        }
    }

    Ok(())
}
