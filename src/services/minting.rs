use serde_json::json;

/// Fire-and-forget trigger for the attendance badge minting function.
///
/// Minting runs out-of-band: a failed or slow mint never affects the
/// check-in that requested it. Errors are logged and dropped.
pub struct MintService {
    client: reqwest::Client,
    functions_url: Option<String>,
    api_key: Option<String>,
    default_chain: String,
}

impl MintService {
    pub fn new(
        functions_url: Option<String>,
        api_key: Option<String>,
        default_chain: String,
    ) -> Self {
        if functions_url.is_none() {
            tracing::info!("No functions URL configured, badge minting disabled");
        }
        Self {
            client: reqwest::Client::new(),
            functions_url,
            api_key,
            default_chain,
        }
    }

    /// A mint service that never calls out. Used when minting is not
    /// configured and throughout the tests.
    pub fn disabled() -> Self {
        Self::new(None, None, "base".to_string())
    }

    /// Requests a badge mint for a recorded check-in and returns immediately.
    pub fn request_mint(&self, attendance_id: &str, chain: Option<&str>) {
        let Some(base_url) = self.functions_url.clone() else {
            tracing::debug!(
                "Badge minting disabled, skipping mint for attendance {}",
                attendance_id
            );
            return;
        };

        let url = format!("{}/mint-attendance-nft", base_url.trim_end_matches('/'));
        let body = json!({
            "attendanceId": attendance_id,
            "chain": chain.unwrap_or(&self.default_chain),
        });
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let attendance_id = attendance_id.to_string();

        tokio::spawn(async move {
            let mut request = client.post(&url).json(&body);
            if let Some(key) = api_key {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::info!("Badge mint requested for attendance {}", attendance_id);
                }
                Ok(response) => {
                    tracing::warn!(
                        "Badge mint request for attendance {} returned {}",
                        attendance_id,
                        response.status()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Badge mint request for attendance {} failed: {}",
                        attendance_id,
                        e
                    );
                }
            }
        });
    }
}
