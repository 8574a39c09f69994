//! Direct-message conversations between two users.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use room_common::id::{prefix, prefixed_ulid};
use scoped_futures::ScopedFutureExt;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::{current_profile, AuthUser};
use crate::db::schema::{conversation_participants, conversations, direct_messages};
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::conversation::{
    Conversation, DirectMessage, NewConversation, NewConversationParticipant, NewDirectMessage,
};
use crate::models::profile;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            post(open_conversation).get(list_conversations),
        )
        .route(
            "/conversations/{conversation_id}/messages",
            get(list_messages).post(send_message),
        )
}

/// Returns the conversation only if the caller participates in it.
async fn load_own_conversation(
    conn: &mut diesel_async::AsyncPgConnection,
    conversation_id: &str,
    user_id: &str,
) -> Result<Conversation, ApiError> {
    diesel_async::RunQueryDsl::get_result(
        conversations::table
            .inner_join(conversation_participants::table)
            .filter(conversations::id.eq(conversation_id))
            .filter(conversation_participants::user_id.eq(user_id))
            .select(Conversation::as_select()),
        conn,
    )
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found("Conversation not found"))
}

// ---------------------------------------------------------------------------
// POST /api/v1/conversations
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenConversationRequest {
    pub other_user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationView {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub participant_ids: Vec<String>,
}

/// Get or create the two-person conversation between the caller and
/// `other_user_id`.
#[utoipa::path(
    post,
    path = "/api/v1/conversations",
    tag = "Conversations",
    security(("bearer" = [])),
    request_body = OpenConversationRequest,
    responses(
        (status = 200, description = "Existing or new conversation", body = ConversationView),
        (status = 400, description = "Cannot message yourself", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody),
    ),
)]
pub async fn open_conversation(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<OpenConversationRequest>,
) -> Result<Json<ConversationView>, ApiError> {
    let me = current_profile(&state, &auth).await?;

    if me.id == body.other_user_id {
        return Err(ApiError::validation(vec![FieldError {
            field: "other_user_id".to_string(),
            message: "You cannot open a conversation with yourself".to_string(),
        }]));
    }

    profile::find(&state.db, &body.other_user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut conn = state.db.get().await?;

    let conversation = {
        let me_id = me.id.clone();
        let other_id = body.other_user_id.clone();
        use diesel_async::AsyncConnection;
        conn.transaction::<Conversation, ApiError, _>(|conn| {
            async move {
                // Existing conversation where both users participate.
                let (mine, theirs) = diesel::alias!(
                    conversation_participants as mine,
                    conversation_participants as theirs
                );
                let existing: Option<Conversation> = diesel_async::RunQueryDsl::get_result(
                    conversations::table
                        .inner_join(
                            mine.on(mine
                                .field(conversation_participants::conversation_id)
                                .eq(conversations::id)),
                        )
                        .inner_join(
                            theirs.on(theirs
                                .field(conversation_participants::conversation_id)
                                .eq(conversations::id)),
                        )
                        .filter(mine.field(conversation_participants::user_id).eq(&me_id))
                        .filter(
                            theirs
                                .field(conversation_participants::user_id)
                                .eq(&other_id),
                        )
                        .select(Conversation::as_select()),
                    conn,
                )
                .await
                .optional()?;

                if let Some(existing) = existing {
                    return Ok(existing);
                }

                let now = Utc::now();
                let id = prefixed_ulid(prefix::CONVERSATION);
                let conversation: Conversation = diesel_async::RunQueryDsl::get_result(
                    diesel::insert_into(conversations::table)
                        .values(NewConversation {
                            id: &id,
                            created_at: now,
                            updated_at: now,
                        })
                        .returning(Conversation::as_returning()),
                    conn,
                )
                .await?;

                diesel_async::RunQueryDsl::execute(
                    diesel::insert_into(conversation_participants::table).values(vec![
                        NewConversationParticipant {
                            conversation_id: &id,
                            user_id: &me_id,
                            joined_at: now,
                        },
                        NewConversationParticipant {
                            conversation_id: &id,
                            user_id: &other_id,
                            joined_at: now,
                        },
                    ]),
                    conn,
                )
                .await?;

                Ok(conversation)
            }
            .scope_boxed()
        })
        .await?
    };

    Ok(Json(ConversationView {
        participant_ids: vec![me.id, body.other_user_id],
        conversation,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/conversations
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    tag = "Conversations",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's conversations, most recent first", body = [Conversation]),
    ),
)]
pub async fn list_conversations(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let mut conn = state.db.get().await?;

    let rows: Vec<Conversation> = diesel_async::RunQueryDsl::load(
        conversations::table
            .inner_join(conversation_participants::table)
            .filter(conversation_participants::user_id.eq(&auth.user_id))
            .order(conversations::updated_at.desc())
            .select(Conversation::as_select()),
        &mut conn,
    )
    .await?;

    Ok(Json(rows))
}

// ---------------------------------------------------------------------------
// GET /api/v1/conversations/:conversation_id/messages
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MessagesParams {
    pub limit: Option<i64>,
    pub before: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessagesPage {
    pub messages: Vec<DirectMessage>,
    pub has_more: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/conversations/{conversation_id}/messages",
    tag = "Conversations",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Messages, newest first", body = MessagesPage),
        (status = 404, description = "Conversation not found", body = ApiErrorBody),
    ),
)]
pub async fn list_messages(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Query(params): Query<MessagesParams>,
) -> Result<Json<MessagesPage>, ApiError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 100);
    let mut conn = state.db.get().await?;

    load_own_conversation(&mut conn, &conversation_id, &auth.user_id).await?;

    let mut query = direct_messages::table
        .filter(direct_messages::conversation_id.eq(&conversation_id))
        .order(direct_messages::id.desc())
        .limit(limit + 1)
        .select(DirectMessage::as_select())
        .into_boxed();

    if let Some(before) = params.before {
        query = query.filter(direct_messages::id.lt(before));
    }

    let mut rows: Vec<DirectMessage> =
        diesel_async::RunQueryDsl::load(query, &mut conn).await?;

    let has_more = rows.len() as i64 > limit;
    rows.truncate(limit as usize);

    // Fetching the thread marks the other side's messages as read.
    diesel_async::RunQueryDsl::execute(
        diesel::update(
            direct_messages::table
                .filter(direct_messages::conversation_id.eq(&conversation_id))
                .filter(direct_messages::sender_id.ne(&auth.user_id))
                .filter(direct_messages::is_read.eq(false)),
        )
        .set(direct_messages::is_read.eq(true)),
        &mut conn,
    )
    .await?;

    Ok(Json(MessagesPage {
        messages: rows,
        has_more,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/conversations/:conversation_id/messages
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/conversations/{conversation_id}/messages",
    tag = "Conversations",
    security(("bearer" = [])),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = DirectMessage),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
        (status = 404, description = "Conversation not found", body = ApiErrorBody),
    ),
)]
pub async fn send_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(axum::http::StatusCode, Json<DirectMessage>), ApiError> {
    let me = current_profile(&state, &auth).await?;

    let content = body.content.trim();
    if content.is_empty() || content.len() > 2000 {
        return Err(ApiError::validation(vec![FieldError {
            field: "content".to_string(),
            message: "Message must be 1-2000 characters".to_string(),
        }]));
    }

    let mut conn = state.db.get().await?;
    load_own_conversation(&mut conn, &conversation_id, &me.id).await?;

    let now = Utc::now();
    let id = prefixed_ulid(prefix::DIRECT_MESSAGE);

    let message: DirectMessage = diesel_async::RunQueryDsl::get_result(
        diesel::insert_into(direct_messages::table)
            .values(NewDirectMessage {
                id: &id,
                conversation_id: &conversation_id,
                sender_id: &me.id,
                content,
                is_read: false,
                created_at: now,
            })
            .returning(DirectMessage::as_returning()),
        &mut conn,
    )
    .await?;

    diesel_async::RunQueryDsl::execute(
        diesel::update(conversations::table.find(&conversation_id))
            .set(conversations::updated_at.eq(now)),
        &mut conn,
    )
    .await?;

    Ok((axum::http::StatusCode::CREATED, Json(message)))
}
