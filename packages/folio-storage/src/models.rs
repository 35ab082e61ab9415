use sqlx::types::Json;
use time::OffsetDateTime;

use folio_domain::Keyed;

use crate::filter::{Column, FilterRow, FilterValue};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
	pub id: i64,
	pub nickname: String,
	pub avatar_url: Option<String>,
	pub bio: Option<String>,
	pub gender: Option<String>,
	pub city: Option<String>,
	pub account: String,
	pub password_hash: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewUser {
	pub nickname: String,
	pub account: String,
	pub password_hash: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Note {
	pub id: i64,
	pub author_id: i64,
	pub title: Option<String>,
	pub cover_url: Option<String>,
	pub cover_width: Option<i32>,
	pub cover_height: Option<i32>,
	pub is_video: bool,
	pub media_url: Option<String>,
	pub images: Option<Json<Vec<String>>>,
	pub like_count: i64,
	pub comment_count: i64,
	pub favorite_count: i64,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub is_public: bool,
	pub status: i16,
}
impl Keyed for Note {
	fn sort_key(&self) -> (OffsetDateTime, i64) {
		(self.created_at, self.id)
	}
}
impl FilterRow for Note {
	fn value(&self, column: Column) -> Option<FilterValue> {
		match column {
			Column::Id => Some(FilterValue::Int(self.id)),
			Column::CreatedAt => Some(FilterValue::Time(self.created_at)),
			Column::AuthorId => Some(FilterValue::Int(self.author_id)),
			Column::IsPublic => Some(FilterValue::Bool(self.is_public)),
			Column::NoteId => None,
		}
	}
}

#[derive(Debug)]
pub struct NewNote {
	pub author_id: i64,
	pub title: Option<String>,
	pub cover_url: Option<String>,
	pub cover_width: Option<i32>,
	pub cover_height: Option<i32>,
	pub is_video: bool,
	pub media_url: Option<String>,
	pub images: Vec<String>,
	pub is_public: bool,
	pub created_at: OffsetDateTime,
}

/// A note joined with its author's display fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoteWithAuthor {
	#[sqlx(flatten)]
	pub note: Note,
	pub author_nickname: String,
	pub author_avatar_url: Option<String>,
}
impl Keyed for NoteWithAuthor {
	fn sort_key(&self) -> (OffsetDateTime, i64) {
		self.note.sort_key()
	}
}
impl FilterRow for NoteWithAuthor {
	fn value(&self, column: Column) -> Option<FilterValue> {
		self.note.value(column)
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
	pub id: i64,
	pub note_id: i64,
	pub user_id: i64,
	pub parent_id: Option<i64>,
	pub content: String,
	pub location: Option<String>,
	pub like_count: i64,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl Keyed for Comment {
	fn sort_key(&self) -> (OffsetDateTime, i64) {
		(self.created_at, self.id)
	}
}
impl FilterRow for Comment {
	fn value(&self, column: Column) -> Option<FilterValue> {
		match column {
			Column::Id => Some(FilterValue::Int(self.id)),
			Column::CreatedAt => Some(FilterValue::Time(self.created_at)),
			Column::NoteId => Some(FilterValue::Int(self.note_id)),
			Column::AuthorId | Column::IsPublic => None,
		}
	}
}

#[derive(Debug)]
pub struct NewComment {
	pub note_id: i64,
	pub user_id: i64,
	pub parent_id: Option<i64>,
	pub content: String,
	pub location: Option<String>,
	pub created_at: OffsetDateTime,
}

/// A comment joined with the commenter's display fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithUser {
	#[sqlx(flatten)]
	pub comment: Comment,
	pub user_nickname: String,
	pub user_avatar_url: Option<String>,
}
impl Keyed for CommentWithUser {
	fn sort_key(&self) -> (OffsetDateTime, i64) {
		self.comment.sort_key()
	}
}
impl FilterRow for CommentWithUser {
	fn value(&self, column: Column) -> Option<FilterValue> {
		self.comment.value(column)
	}
}
