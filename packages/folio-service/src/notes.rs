use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use folio_domain::cursor;
use sqlx::{Executor, Postgres};

use folio_storage::{
	models::{NewNote, Note},
	notes,
	relations::{self, Relation},
};

use crate::{Error, FolioService, NoteDetail, Result, assembly};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
	pub title: Option<String>,
	pub cover_url: Option<String>,
	pub cover_width: Option<i32>,
	pub cover_height: Option<i32>,
	#[serde(default)]
	pub is_video: bool,
	pub media_url: Option<String>,
	#[serde(default)]
	pub images: Vec<String>,
	#[serde(default = "default_public")]
	pub is_public: bool,
}

fn default_public() -> bool {
	true
}

impl FolioService {
	/// A single note with the viewer's like and favorite state. Private notes resolve only for
	/// their author.
	pub async fn get_note(&self, viewer: Option<i64>, note_id: i64) -> Result<NoteDetail> {
		let mut tx = self.db.begin().await?;
		let row = notes::find_note_with_author(&mut *tx, note_id)
			.await?
			.filter(|row| is_visible(&row.note, viewer));
		let Some(row) = row else {
			return Err(Error::NotFound { message: format!("Note {note_id} does not exist.") });
		};
		let (is_liked, is_favorited) = match viewer {
			Some(user_id) => (
				relations::is_member(&mut *tx, Relation::NoteLike, user_id, note_id).await?,
				relations::is_member(&mut *tx, Relation::NoteFavorite, user_id, note_id).await?,
			),
			None => (false, false),
		};

		tx.commit().await?;

		Ok(assembly::note_detail(row, is_liked, is_favorited))
	}

	pub async fn create_note(&self, author_id: i64, req: CreateNoteRequest) -> Result<NoteDetail> {
		let new_note = validate_note(author_id, req, OffsetDateTime::now_utc())?;
		let mut tx = self.db.begin().await?;
		let note = notes::insert_note(&mut *tx, &new_note).await?;
		let Some(row) = notes::find_note_with_author(&mut *tx, note.id).await? else {
			return Err(Error::NotFound { message: format!("Note {} does not exist.", note.id) });
		};

		tx.commit().await?;

		tracing::info!(note_id = note.id, author_id, "Created note.");

		Ok(assembly::note_detail(row, false, false))
	}
}

/// Loads a note the viewer may see. Private notes read as missing for everyone but their author.
pub(crate) async fn visible_note<'e, E>(
	executor: E,
	viewer: Option<i64>,
	note_id: i64,
) -> Result<Note>
where
	E: Executor<'e, Database = Postgres>,
{
	notes::find_note(executor, note_id)
		.await?
		.filter(|note| is_visible(note, viewer))
		.ok_or_else(|| Error::NotFound { message: format!("Note {note_id} does not exist.") })
}

fn is_visible(note: &Note, viewer: Option<i64>) -> bool {
	note.is_public || viewer == Some(note.author_id)
}

fn validate_note(author_id: i64, req: CreateNoteRequest, now: OffsetDateTime) -> Result<NewNote> {
	let title = non_blank(req.title);
	let cover_url = non_blank(req.cover_url);
	let media_url = non_blank(req.media_url);

	if req.is_video && media_url.is_none() {
		return Err(Error::InvalidRequest {
			message: "mediaUrl is required for video notes.".to_string(),
		});
	}
	if req.images.iter().any(|image| image.trim().is_empty()) {
		return Err(Error::InvalidRequest {
			message: "images must not contain blank entries.".to_string(),
		});
	}
	if title.is_none() && cover_url.is_none() && media_url.is_none() && req.images.is_empty() {
		return Err(Error::InvalidRequest {
			message: "A note needs a title or some media.".to_string(),
		});
	}
	for (field, value) in [("coverWidth", req.cover_width), ("coverHeight", req.cover_height)] {
		if value.is_some_and(|value| value <= 0) {
			return Err(Error::InvalidRequest {
				message: format!("{field} must be greater than zero."),
			});
		}
	}

	Ok(NewNote {
		author_id,
		title,
		cover_url,
		cover_width: req.cover_width,
		cover_height: req.cover_height,
		is_video: req.is_video,
		media_url,
		images: req.images,
		is_public: req.is_public,
		created_at: cursor::truncate_to_millis(now),
	})
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn blank_fields_become_absent() {
		let req = CreateNoteRequest {
			title: Some("  hello  ".to_string()),
			cover_url: Some("   ".to_string()),
			..Default::default()
		};
		let note = validate_note(1, req, datetime!(2024-05-01 0:00:00.123456 UTC))
			.expect("Note must validate.");

		assert_eq!(note.title.as_deref(), Some("hello"));
		assert_eq!(note.cover_url, None);
		assert_eq!(note.created_at, datetime!(2024-05-01 0:00:00.123 UTC));
	}

	#[test]
	fn empty_notes_are_rejected() {
		let err = validate_note(1, CreateNoteRequest::default(), OffsetDateTime::UNIX_EPOCH)
			.expect_err("Expected validation error.");

		assert!(matches!(err, Error::InvalidRequest { .. }));
	}

	#[test]
	fn videos_need_media() {
		let req = CreateNoteRequest {
			title: Some("clip".to_string()),
			is_video: true,
			..Default::default()
		};

		assert!(validate_note(1, req, OffsetDateTime::UNIX_EPOCH).is_err());
	}

	#[test]
	fn dimensions_must_be_positive() {
		let req = CreateNoteRequest {
			title: Some("pic".to_string()),
			cover_width: Some(0),
			..Default::default()
		};
		let err = validate_note(1, req, OffsetDateTime::UNIX_EPOCH)
			.expect_err("Expected validation error.");

		assert!(err.to_string().contains("coverWidth must be greater than zero."));
	}
}
