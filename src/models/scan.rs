use crate::models::qr::QrCodePayload;

/// A scanned or hand-typed code, normalized into one of the two formats the
/// door scanner accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum ScannedCode {
    /// Full signed payload (current ticket format).
    Modern(QrCodePayload),
    /// Bare ticket identifier with no event binding or signature. Older
    /// tickets were printed with just the id, so this path stays supported.
    Legacy(String),
}

impl ScannedCode {
    /// Normalizes raw scanner input. Ordered, first match wins:
    /// a JSON payload carrying all required fields is `Modern`; anything else
    /// non-blank falls through to `Legacy`. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<ScannedCode> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(payload) = QrCodePayload::from_qr_string(trimmed) {
            if has_required_fields(&payload) {
                return Some(ScannedCode::Modern(payload));
            }
        }

        Some(ScannedCode::Legacy(trimmed.to_string()))
    }

    /// The ticket identifier this code resolves to.
    pub fn ticket_id(&self) -> &str {
        match self {
            ScannedCode::Modern(payload) => &payload.ticket_id,
            ScannedCode::Legacy(ticket_id) => ticket_id,
        }
    }
}

fn has_required_fields(payload: &QrCodePayload) -> bool {
    !payload.ticket_id.is_empty()
        && !payload.event_id.is_empty()
        && !payload.attendee_id.is_empty()
        && !payload.signature.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_payload_parses_as_modern() {
        let payload = QrCodePayload::issue("T1", "E1", "A1", None);
        let raw = payload.to_qr_string().unwrap();

        match ScannedCode::parse(&raw) {
            Some(ScannedCode::Modern(decoded)) => assert_eq!(decoded, payload),
            other => panic!("expected modern code, got {:?}", other),
        }
    }

    #[test]
    fn bare_identifier_parses_as_legacy() {
        assert_eq!(
            ScannedCode::parse("TICKET-1234"),
            Some(ScannedCode::Legacy("TICKET-1234".to_string()))
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            ScannedCode::parse("  T1\n"),
            Some(ScannedCode::Legacy("T1".to_string()))
        );
    }

    #[test]
    fn json_missing_required_fields_falls_back_to_legacy() {
        let raw = r#"{"ticketId":"T1","eventId":"E1"}"#;
        assert_eq!(
            ScannedCode::parse(raw),
            Some(ScannedCode::Legacy(raw.to_string()))
        );
    }

    #[test]
    fn json_with_empty_required_field_falls_back_to_legacy() {
        let raw = r#"{"ticketId":"T1","eventId":"E1","attendeeId":"","timestamp":"t","signature":"s"}"#;
        assert!(matches!(
            ScannedCode::parse(raw),
            Some(ScannedCode::Legacy(_))
        ));
    }

    #[test]
    fn blank_input_is_rejected() {
        assert_eq!(ScannedCode::parse(""), None);
        assert_eq!(ScannedCode::parse("   \t"), None);
    }

    #[test]
    fn ticket_id_resolves_for_both_formats() {
        let payload = QrCodePayload::issue("T9", "E1", "A1", None);
        assert_eq!(ScannedCode::Modern(payload).ticket_id(), "T9");
        assert_eq!(ScannedCode::Legacy("T7".to_string()).ticket_id(), "T7");
    }
}
