use axum::{
	Json, Router,
	extract::{Path, Query, Request, State, rejection::JsonRejection},
	http::StatusCode,
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use folio_service::{
	AuthResponse, CommentItem, CommentPage, CreateCommentRequest, CreateNoteRequest, Error,
	FeedResponse, LikeResponse, LoginRequest, NoteDetail, PageRequest, RegisterRequest,
	UserProfile,
};

use crate::{
	auth::{AuthUser, MaybeUser},
	state::AppState,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/v1/health", get(api_health))
		.route("/api/v1/auth/register", post(register))
		.route("/api/v1/auth/login", post(login))
		.route("/api/v1/auth/me", get(me))
		.route("/api/v1/notes", post(create_note))
		.route("/api/v1/notes/feed", get(feed))
		.route("/api/v1/notes/{id}", get(get_note))
		.route("/api/v1/notes/{id}/comments", get(list_comments).post(create_comment))
		.route("/api/v1/notes/{id}/like", post(like_note).delete(unlike_note))
		.route("/api/v1/notes/{id}/favorite", post(favorite_note).delete(unfavorite_note))
		.route("/api/v1/comments/{id}/like", post(like_comment).delete(unlike_comment))
		.route("/api/v1/users/{id}/notes", get(author_notes))
		.layer(middleware::from_fn(log_requests))
		.with_state(state)
}

/// Success envelope shared by every `/api` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
	code: u16,
	msg: String,
	data: Option<T>,
	request_id: String,
}

fn ok<T>(data: T) -> Json<Envelope<T>> {
	Json(Envelope {
		code: 0,
		msg: "ok".to_string(),
		data: Some(data),
		request_id: Uuid::new_v4().to_string(),
	})
}

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// Raw page parameters. `limit` stays a string so a malformed value falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
struct PageQuery {
	cursor: Option<String>,
	limit: Option<String>,
}
impl From<PageQuery> for PageRequest {
	fn from(query: PageQuery) -> Self {
		Self {
			cursor: query.cursor,
			limit: query.limit.and_then(|limit| limit.trim().parse::<i64>().ok()),
		}
	}
}

async fn log_requests(request: Request, next: Next) -> Response {
	let method = request.method().clone();
	let path = request.uri().path().to_string();
	let response = next.run(request).await;

	if path.starts_with("/api") {
		tracing::info!(%method, %path, status = response.status().as_u16(), "Handled request.");
	}

	response
}

async fn health() -> (StatusCode, &'static str) {
	(StatusCode::OK, "OK")
}

async fn api_health() -> Json<Envelope<Value>> {
	ok(json!({ "status": "ok" }))
}

async fn register(
	State(state): State<AppState>,
	payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<AuthResponse> {
	let payload = json_body(payload)?;
	let response = state.service.register(payload).await?;

	Ok(ok(response))
}

async fn login(
	State(state): State<AppState>,
	payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthResponse> {
	let payload = json_body(payload)?;
	let response = state.service.login(payload).await?;

	Ok(ok(response))
}

async fn me(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> ApiResult<UserProfile> {
	let response = state.service.me(user_id).await?;

	Ok(ok(response))
}

async fn feed(
	State(state): State<AppState>,
	MaybeUser(viewer): MaybeUser,
	Query(query): Query<PageQuery>,
) -> ApiResult<FeedResponse> {
	let response = state.service.feed(viewer, query.into()).await?;

	Ok(ok(response))
}

async fn author_notes(
	State(state): State<AppState>,
	MaybeUser(viewer): MaybeUser,
	Path(raw_id): Path<String>,
	Query(query): Query<PageQuery>,
) -> ApiResult<FeedResponse> {
	let author_id = path_id(&raw_id, "User")?;
	let response = state.service.author_notes(viewer, author_id, query.into()).await?;

	Ok(ok(response))
}

async fn create_note(
	State(state): State<AppState>,
	AuthUser(user_id): AuthUser,
	payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> ApiResult<NoteDetail> {
	let payload = json_body(payload)?;
	let response = state.service.create_note(user_id, payload).await?;

	Ok(ok(response))
}

async fn get_note(
	State(state): State<AppState>,
	MaybeUser(viewer): MaybeUser,
	Path(raw_id): Path<String>,
) -> ApiResult<NoteDetail> {
	let note_id = path_id(&raw_id, "Note")?;
	let response = state.service.get_note(viewer, note_id).await?;

	Ok(ok(response))
}

async fn list_comments(
	State(state): State<AppState>,
	MaybeUser(viewer): MaybeUser,
	Path(raw_id): Path<String>,
	Query(query): Query<PageQuery>,
) -> ApiResult<CommentPage> {
	let note_id = path_id(&raw_id, "Note")?;
	let response = state.service.list_comments(viewer, note_id, query.into()).await?;

	Ok(ok(response))
}

async fn create_comment(
	State(state): State<AppState>,
	AuthUser(user_id): AuthUser,
	Path(raw_id): Path<String>,
	payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> ApiResult<CommentItem> {
	let note_id = path_id(&raw_id, "Note")?;
	let payload = json_body(payload)?;
	let response = state.service.create_comment(user_id, note_id, payload).await?;

	Ok(ok(response))
}

async fn like_note(
	State(state): State<AppState>,
	AuthUser(user_id): AuthUser,
	Path(raw_id): Path<String>,
) -> ApiResult<LikeResponse> {
	let note_id = path_id(&raw_id, "Note")?;
	let outcome = state.service.toggle_note_like(user_id, note_id, true).await?;

	Ok(ok(outcome.into()))
}

async fn unlike_note(
	State(state): State<AppState>,
	AuthUser(user_id): AuthUser,
	Path(raw_id): Path<String>,
) -> ApiResult<LikeResponse> {
	let note_id = path_id(&raw_id, "Note")?;
	let outcome = state.service.toggle_note_like(user_id, note_id, false).await?;

	Ok(ok(outcome.into()))
}

async fn favorite_note(
	State(state): State<AppState>,
	AuthUser(user_id): AuthUser,
	Path(raw_id): Path<String>,
) -> ApiResult<LikeResponse> {
	let note_id = path_id(&raw_id, "Note")?;
	let outcome = state.service.toggle_note_favorite(user_id, note_id, true).await?;

	Ok(ok(outcome.into()))
}

async fn unfavorite_note(
	State(state): State<AppState>,
	AuthUser(user_id): AuthUser,
	Path(raw_id): Path<String>,
) -> ApiResult<LikeResponse> {
	let note_id = path_id(&raw_id, "Note")?;
	let outcome = state.service.toggle_note_favorite(user_id, note_id, false).await?;

	Ok(ok(outcome.into()))
}

async fn like_comment(
	State(state): State<AppState>,
	AuthUser(user_id): AuthUser,
	Path(raw_id): Path<String>,
) -> ApiResult<LikeResponse> {
	let comment_id = path_id(&raw_id, "Comment")?;
	let outcome = state.service.toggle_comment_like(user_id, comment_id, true).await?;

	Ok(ok(outcome.into()))
}

async fn unlike_comment(
	State(state): State<AppState>,
	AuthUser(user_id): AuthUser,
	Path(raw_id): Path<String>,
) -> ApiResult<LikeResponse> {
	let comment_id = path_id(&raw_id, "Comment")?;
	let outcome = state.service.toggle_comment_like(user_id, comment_id, false).await?;

	Ok(ok(outcome.into()))
}

/// Ids that do not parse name nothing, so they read as missing resources.
fn path_id(raw: &str, resource: &str) -> Result<i64, ApiError> {
	raw.trim().parse::<i64>().map_err(|_| {
		json_error(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{resource} does not exist."))
	})
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
	payload.map(|Json(body)| body).map_err(|rejection| {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	})
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
	code: u16,
	msg: String,
	data: Option<()>,
	request_id: String,
	error_code: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}

	pub fn unauthorized(message: impl Into<String>) -> Self {
		Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::Unauthorized { message } => {
				tracing::debug!(%message, "Rejected credentials.");

				ApiError::unauthorized("Unauthorized or token expired.")
			},
			Error::NotFound { message } => json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			Error::Conflict { message } => json_error(StatusCode::CONFLICT, "CONFLICT", message),
			Error::TransactionConflict { message } => {
				tracing::warn!(%message, "Transaction lost a serialization race.");

				json_error(
					StatusCode::CONFLICT,
					"TRANSACTION_CONFLICT",
					"Concurrent update detected. Retry the request.",
				)
			},
			Error::Storage { message } => {
				tracing::error!(%message, "Storage failure.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", "Internal server error.")
			},
			Error::Internal { message } => {
				tracing::error!(%message, "Internal failure.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal server error.")
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			code: self.status.as_u16(),
			msg: self.message,
			data: None,
			request_id: Uuid::new_v4().to_string(),
			error_code: self.error_code,
		};

		(self.status, Json(body)).into_response()
	}
}
