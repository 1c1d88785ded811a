//! Watch and trigger DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{WatchId, WatchSummary};
use crate::service::TriggerOutcome;
use crate::trigger::InboundMessage;

/// One live watch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WatchDto {
    /// Watch generation identifier.
    pub watch_id: WatchId,
    /// Watched account (base-58).
    pub address: String,
    /// Label of the arming rule.
    pub rule_label: String,
    /// Registration timestamp.
    pub armed_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub deadline: DateTime<Utc>,
}

impl From<WatchSummary> for WatchDto {
    fn from(s: WatchSummary) -> Self {
        Self {
            watch_id: s.watch_id,
            address: s.address.into(),
            rule_label: s.rule_label,
            armed_at: s.armed_at,
            deadline: s.deadline,
        }
    }
}

/// Paginated response for `GET /watches`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WatchListResponse {
    /// Watches on this page, oldest first.
    pub data: Vec<WatchDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response for `DELETE /watches`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelAllResponse {
    /// Number of watches cancelled.
    pub cancelled: usize,
}

/// Request body for `POST /triggers`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TriggerRequest {
    /// Message text, as a transfer notification would carry it.
    pub text: String,
    /// Hyperlink entity targets, in message order.
    #[serde(default)]
    pub links: Vec<String>,
}

impl From<TriggerRequest> for InboundMessage {
    fn from(req: TriggerRequest) -> Self {
        Self {
            chat_id: None,
            text: req.text,
            links: req.links,
        }
    }
}

/// Response for `POST /triggers`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TriggerResponse {
    /// `armed`, `already_watched` or `ignored`.
    pub outcome: String,
    /// New watch id when armed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_id: Option<WatchId>,
    /// Address the message resolved to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Matching rule when armed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_label: Option<String>,
}

impl From<TriggerOutcome> for TriggerResponse {
    fn from(outcome: TriggerOutcome) -> Self {
        match outcome {
            TriggerOutcome::Armed {
                watch_id,
                address,
                rule_label,
            } => Self {
                outcome: "armed".to_string(),
                watch_id: Some(watch_id),
                address: Some(address.into()),
                rule_label: Some(rule_label),
            },
            TriggerOutcome::AlreadyWatched { address } => Self {
                outcome: "already_watched".to_string(),
                watch_id: None,
                address: Some(address.into()),
                rule_label: None,
            },
            TriggerOutcome::Ignored => Self {
                outcome: "ignored".to_string(),
                watch_id: None,
                address: None,
                rule_label: None,
            },
        }
    }
}
