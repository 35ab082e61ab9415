use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use folio_domain::cursor;
use folio_storage::{
	comments,
	filter::{Column, FilterExpr, FilterValue},
	models::{CommentWithUser, NewComment},
	notes,
	relations::{self, Relation},
	users,
};

use crate::{CommentItem, Error, FolioService, PageRequest, Result, assembly};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
	pub total: i64,
	pub next_cursor: Option<String>,
	pub list: Vec<CommentItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
	pub content: String,
	pub parent_id: Option<i64>,
	pub location: Option<String>,
}

impl FolioService {
	pub async fn list_comments(
		&self,
		viewer: Option<i64>,
		note_id: i64,
		req: PageRequest,
	) -> Result<CommentPage> {
		let limit = self.page_limit(req.limit);
		let cursor = crate::decode_cursor(req.cursor.as_deref());
		let mut tx = self.db.begin().await?;

		crate::notes::visible_note(&mut *tx, viewer, note_id).await?;

		let filter = FilterExpr::eq(Column::NoteId, FilterValue::Int(note_id));
		let page = comments::page_comments(&mut *tx, &filter, cursor.as_ref(), limit).await?;
		let total = comments::count_by_note(&mut *tx, note_id).await?;
		let parents =
			comments::parent_authors(&mut *tx, &assembly::parent_ids(&page.items)).await?;
		let liked = match viewer {
			Some(user_id) => {
				let ids: Vec<i64> = page.items.iter().map(|row| row.comment.id).collect();

				relations::membership_set(&mut *tx, Relation::CommentLike, user_id, &ids).await?
			},
			None => HashSet::new(),
		};

		tx.commit().await?;

		tracing::debug!(note_id, items = page.items.len(), limit, "Served comment page.");

		Ok(CommentPage {
			total,
			next_cursor: page.next_cursor.map(|cursor| cursor.encode()),
			list: assembly::comment_items(page.items, &liked, &parents),
		})
	}

	/// Inserts the comment and bumps the note's comment counter in one transaction.
	pub async fn create_comment(
		&self,
		user_id: i64,
		note_id: i64,
		req: CreateCommentRequest,
	) -> Result<CommentItem> {
		let content = req.content.trim();

		if content.is_empty() {
			return Err(Error::InvalidRequest { message: "content must not be empty.".to_string() });
		}

		let mut tx = self.db.begin().await?;

		crate::notes::visible_note(&mut *tx, Some(user_id), note_id).await?;

		let mut parents = HashMap::new();

		if let Some(parent_id) = req.parent_id {
			let Some(parent) = comments::find_comment(&mut *tx, parent_id).await? else {
				return Err(Error::InvalidRequest {
					message: format!("Parent comment {parent_id} does not exist."),
				});
			};

			if parent.note_id != note_id {
				return Err(Error::InvalidRequest {
					message: format!("Parent comment {parent_id} belongs to another note."),
				});
			}

			parents = comments::parent_authors(&mut *tx, &[parent_id]).await?;
		}

		let Some(author) = users::find_user(&mut *tx, user_id).await? else {
			return Err(Error::Unauthorized { message: "User does not exist.".to_string() });
		};
		let comment = comments::insert_comment(
			&mut *tx,
			&NewComment {
				note_id,
				user_id,
				parent_id: req.parent_id,
				content: content.to_string(),
				location: req.location.filter(|location| !location.trim().is_empty()),
				created_at: cursor::truncate_to_millis(OffsetDateTime::now_utc()),
			},
		)
		.await?;
		let comment_count = notes::add_comment_count(&mut *tx, note_id, 1).await?;

		tx.commit().await?;

		tracing::info!(
			note_id,
			comment_id = comment.id,
			user_id,
			comment_count,
			"Created comment."
		);

		let row = CommentWithUser {
			comment,
			user_nickname: author.nickname,
			user_avatar_url: author.avatar_url,
		};

		Ok(assembly::comment_item(row, &HashSet::new(), &parents))
	}
}
