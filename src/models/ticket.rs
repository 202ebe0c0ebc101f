use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{ListParams, text_enum, validation};
use crate::error::AppError;

text_enum!(
    TicketStatus {
        Open => "OPEN",
        InProgress => "IN_PROGRESS",
        Resolved => "RESOLVED",
        Closed => "CLOSED",
    }
);

text_enum!(
    TicketPriority {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
    }
);

/// SupportTicket
///
/// A customer's support request. Customers only ever see their own tickets.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct SupportTicket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub status: TicketStatus,
    #[sqlx(try_from = "String")]
    pub priority: TicketPriority,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl SupportTicket {
    pub const SORTABLE: &'static [&'static str] = &["updated_at", "created_at"];

    /// Status the ticket moves to when a reply is posted. Replies on CLOSED tickets
    /// are refused; the first staff reply on an OPEN ticket starts work on it.
    pub fn status_after_reply(&self, from_staff: bool) -> Result<TicketStatus, AppError> {
        match (self.status, from_staff) {
            (TicketStatus::Closed, _) => Err(AppError::BadRequest(
                "Ticket is closed and cannot receive replies".to_string(),
            )),
            (TicketStatus::Open, true) => Ok(TicketStatus::InProgress),
            // A customer writing back on a resolved ticket reopens it.
            (TicketStatus::Resolved, false) => Ok(TicketStatus::Open),
            (status, _) => Ok(status),
        }
    }
}

/// TicketReply
///
/// One message in a ticket's conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct TicketReply {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub is_staff: bool,
    pub message: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TicketDetail {
    pub ticket: SupportTicket,
    pub replies: Vec<TicketReply>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub message: String,
    #[serde(default = "default_priority")]
    pub priority: TicketPriority,
}

fn default_priority() -> TicketPriority {
    TicketPriority::Medium
}

impl CreateTicketRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_length("subject", &self.subject, 5, 150)?;
        validation::require_length("message", &self.message, 10, 5000)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateTicketRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
}

impl UpdateTicketRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.status.is_none() && self.priority.is_none() {
            return Err(AppError::Validation(
                "status or priority is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TicketReplyRequest {
    pub message: String,
}

impl TicketReplyRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_length("message", &self.message, 1, 5000)
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TicketQuery {
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub list: ListParams,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    /// Set for customer listings; restricts results to the caller's tickets.
    pub user_id: Option<Uuid>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &SupportTicket) -> bool {
        if self.status.is_some_and(|s| s != ticket.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != ticket.priority) {
            return false;
        }
        if self.user_id.is_some_and(|u| u != ticket.user_id) {
            return false;
        }
        match self.list.needle() {
            Some(needle) => {
                ticket.subject.to_lowercase().contains(&needle)
                    || ticket.message.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}
