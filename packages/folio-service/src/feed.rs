use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use folio_storage::{
	filter::{Column, FilterExpr, FilterValue},
	notes,
	relations::{self, Relation},
	users,
};

use crate::{Error, FolioService, NoteItem, Result, assembly};

/// Query parameters shared by every paged read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRequest {
	pub cursor: Option<String>,
	pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
	pub list: Vec<NoteItem>,
	pub next_cursor: Option<String>,
}

impl FolioService {
	/// Public notes, newest first.
	pub async fn feed(&self, viewer: Option<i64>, req: PageRequest) -> Result<FeedResponse> {
		let filter = FilterExpr::eq(Column::IsPublic, FilterValue::Bool(true));

		self.note_page(viewer, &filter, req).await
	}

	/// One author's notes. Private notes are visible only to the author.
	pub async fn author_notes(
		&self,
		viewer: Option<i64>,
		author_id: i64,
		req: PageRequest,
	) -> Result<FeedResponse> {
		if users::find_user(&self.db.pool, author_id).await?.is_none() {
			return Err(Error::NotFound { message: format!("User {author_id} does not exist.") });
		}

		let mut filter = FilterExpr::eq(Column::AuthorId, FilterValue::Int(author_id));

		if viewer != Some(author_id) {
			filter = filter.and(FilterExpr::eq(Column::IsPublic, FilterValue::Bool(true)));
		}

		self.note_page(viewer, &filter, req).await
	}

	async fn note_page(
		&self,
		viewer: Option<i64>,
		filter: &FilterExpr,
		req: PageRequest,
	) -> Result<FeedResponse> {
		let limit = self.page_limit(req.limit);
		let cursor = crate::decode_cursor(req.cursor.as_deref());
		let mut tx = self.db.begin().await?;
		let page = notes::page_notes(&mut *tx, filter, cursor.as_ref(), limit).await?;
		let liked = match viewer {
			Some(user_id) => {
				let ids: Vec<i64> = page.items.iter().map(|row| row.note.id).collect();

				relations::membership_set(&mut *tx, Relation::NoteLike, user_id, &ids).await?
			},
			None => HashSet::new(),
		};

		tx.commit().await?;

		tracing::debug!(
			items = page.items.len(),
			limit,
			has_next = page.next_cursor.is_some(),
			"Served note page."
		);

		Ok(FeedResponse {
			next_cursor: page.next_cursor.map(|cursor| cursor.encode()),
			list: assembly::note_items(page.items, &liked),
		})
	}
}
