//! Audit trail records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::WatchEvent;

/// One lifecycle event as stored in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Watch generation that produced the event.
    pub watch_id: Uuid,
    /// Watched account (base-58).
    pub address: String,
    /// Event type discriminator (e.g. `"mint_found"`).
    pub event_type: String,
    /// Full event as JSON.
    pub payload: serde_json::Value,
    /// Time the record was written.
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Builds a record for `event`, stamped now.
    #[must_use]
    pub fn from_event(event: &WatchEvent) -> Self {
        Self {
            watch_id: *event.watch_id().as_uuid(),
            address: event.address().to_string(),
            event_type: event.event_type_str().to_string(),
            payload: serde_json::to_value(event).unwrap_or_default(),
            recorded_at: Utc::now(),
        }
    }

    /// Text-log line: `timestamp event_type address json`.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {}",
            self.recorded_at.to_rfc3339(),
            self.event_type,
            self.address,
            self.payload
        )
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AccountAddress, WatchId};

    #[test]
    fn record_captures_event_identity() {
        let Ok(address) = AccountAddress::parse(&"D".repeat(40)) else {
            panic!("valid address rejected");
        };
        let watch_id = WatchId::new();
        let event = WatchEvent::MintFound {
            watch_id,
            address,
            rule_label: "r".to_string(),
            mint: "M".to_string(),
            signature: "S".to_string(),
            timestamp: Utc::now(),
        };

        let record = AuditRecord::from_event(&event);
        assert_eq!(record.watch_id, *watch_id.as_uuid());
        assert_eq!(record.event_type, "mint_found");
        assert_eq!(record.payload["signature"], "S");

        let line = record.to_line();
        let fields: Vec<&str> = line.splitn(4, ' ').collect();
        assert_eq!(fields.get(1), Some(&"mint_found"));
        assert_eq!(fields.get(2).map(|s| s.len()), Some(40));
        assert!(fields.get(3).is_some_and(|json| json.starts_with('{')));
    }
}
