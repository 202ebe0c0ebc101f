use axum::extract::State;
use chrono::Utc;
use uuid::Uuid;

use super::{CreatedResult, JsonResult, ListResult, created, found, ok, paginated};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    models::{
        CreateTicketRequest, ListQuery, SupportTicket, TicketDetail, TicketFilter,
        TicketPriority, TicketQuery, TicketReply, TicketReplyRequest, TicketStatus,
        UnknownVariant, UpdateTicketRequest,
    },
    repository::RepositoryState,
};

fn ticket_filter(
    list: &ListQuery,
    query: &TicketQuery,
    user_id: Option<Uuid>,
) -> AppResult<TicketFilter> {
    let priority = match query.priority.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<TicketPriority>()
                .map_err(|e: UnknownVariant| AppError::Validation(e.to_string()))?,
        ),
    };

    Ok(TicketFilter {
        list: list.params(SupportTicket::SORTABLE),
        status: list.status()?,
        priority,
        user_id,
    })
}

/// Loads a ticket; customers get a 404 for tickets they do not own.
async fn load_ticket(
    repo: &RepositoryState,
    id: Uuid,
    owner: Option<Uuid>,
) -> AppResult<SupportTicket> {
    let ticket = repo
        .get_ticket(id)
        .await?
        .filter(|t| owner.is_none_or(|owner| owner == t.user_id));
    found(ticket, "Ticket")
}

async fn detail(repo: &RepositoryState, ticket: SupportTicket) -> AppResult<TicketDetail> {
    let replies = repo.list_ticket_replies(ticket.id).await?;
    Ok(TicketDetail { ticket, replies })
}

async fn post_reply(
    repo: &RepositoryState,
    ticket: &SupportTicket,
    author: &AuthUser,
    from_staff: bool,
    payload: TicketReplyRequest,
) -> AppResult<TicketReply> {
    payload.validate()?;
    let next = ticket.status_after_reply(from_staff)?;
    let reply = TicketReply {
        id: Uuid::new_v4(),
        ticket_id: ticket.id,
        author_id: author.id,
        is_staff: from_staff,
        message: payload.message.trim().to_string(),
        created_at: Utc::now(),
    };
    let reply = repo.add_ticket_reply(&reply, next).await?;
    tracing::debug!(ticket_id = %ticket.id, status = next.as_str(), from_staff, "ticket reply");
    Ok(reply)
}

/// create_ticket
///
/// [Customer Route] Opens a support ticket in OPEN state.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Opened", body = SupportTicket),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_ticket(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTicketRequest>,
) -> CreatedResult<SupportTicket> {
    payload.validate()?;

    let now = Utc::now();
    let ticket = SupportTicket {
        id: Uuid::new_v4(),
        user_id: user.id,
        subject: payload.subject.trim().to_string(),
        message: payload.message.trim().to_string(),
        status: TicketStatus::Open,
        priority: payload.priority,
        created_at: now,
        updated_at: now,
    };
    let ticket = state.repo.insert_ticket(&ticket).await?;
    tracing::info!(ticket_id = %ticket.id, user_id = %user.id, "ticket opened");
    created(ticket, "Ticket created")
}

#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    params(ListQuery, TicketQuery),
    responses((status = 200, description = "Caller's tickets", body = [SupportTicket]))
)]
pub async fn list_my_tickets(
    user: AuthUser,
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(query): Query<TicketQuery>,
) -> ListResult<SupportTicket> {
    let filter = ticket_filter(&list, &query, Some(user.id))?;
    let page = state.repo.list_tickets(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket with replies", body = TicketDetail),
        (status = 404, description = "Not found or not the caller's")
    )
)]
pub async fn get_my_ticket(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<TicketDetail> {
    let ticket = load_ticket(&state.repo, id, Some(user.id)).await?;
    ok(detail(&state.repo, ticket).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/replies",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = TicketReplyRequest,
    responses(
        (status = 201, description = "Reply posted", body = TicketReply),
        (status = 400, description = "Ticket closed")
    )
)]
pub async fn reply_my_ticket(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TicketReplyRequest>,
) -> CreatedResult<TicketReply> {
    let ticket = load_ticket(&state.repo, id, Some(user.id)).await?;
    let reply = post_reply(&state.repo, &ticket, &user, false, payload).await?;
    created(reply, "Reply posted")
}

/// [Admin Route] Support inbox across all customers.
#[utoipa::path(
    get,
    path = "/api/v1/admin/tickets",
    params(ListQuery, TicketQuery),
    responses((status = 200, description = "Tickets", body = [SupportTicket]))
)]
pub async fn list_tickets(
    user: AuthUser,
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(query): Query<TicketQuery>,
) -> ListResult<SupportTicket> {
    user.require_admin()?;
    let filter = ticket_filter(&list, &query, None)?;
    let page = state.repo.list_tickets(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses((status = 200, description = "Ticket with replies", body = TicketDetail))
)]
pub async fn get_ticket(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<TicketDetail> {
    user.require_admin()?;
    let ticket = load_ticket(&state.repo, id, None).await?;
    ok(detail(&state.repo, ticket).await?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = UpdateTicketRequest,
    responses((status = 200, description = "Updated", body = SupportTicket))
)]
pub async fn update_ticket(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTicketRequest>,
) -> JsonResult<SupportTicket> {
    user.require_admin()?;
    payload.validate()?;

    let mut ticket = load_ticket(&state.repo, id, None).await?;
    if let Some(status) = payload.status {
        ticket.status = status;
    }
    if let Some(priority) = payload.priority {
        ticket.priority = priority;
    }
    ticket.updated_at = Utc::now();
    ok(found(state.repo.update_ticket(&ticket).await?, "Ticket")?)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/tickets/{id}/replies",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = TicketReplyRequest,
    responses(
        (status = 201, description = "Staff reply posted", body = TicketReply),
        (status = 400, description = "Ticket closed")
    )
)]
pub async fn reply_ticket(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TicketReplyRequest>,
) -> CreatedResult<TicketReply> {
    user.require_admin()?;
    let ticket = load_ticket(&state.repo, id, None).await?;
    let reply = post_reply(&state.repo, &ticket, &user, true, payload).await?;
    created(reply, "Reply posted")
}
