use sqlx::{Executor, Postgres, QueryBuilder, types::Json};

use folio_domain::{Cursor, Page};

use crate::{
	Result,
	filter::{self, FilterExpr},
	models::{NewNote, Note, NoteWithAuthor},
};

const NOTE_COLUMNS: &str = "\
n.id,
	n.author_id,
	n.title,
	n.cover_url,
	n.cover_width,
	n.cover_height,
	n.is_video,
	n.media_url,
	n.images,
	n.like_count,
	n.comment_count,
	n.favorite_count,
	n.created_at,
	n.updated_at,
	n.is_public,
	n.status";

pub async fn insert_note<'e, E>(executor: E, note: &NewNote) -> Result<Note>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!(
		"\
INSERT INTO notes AS n (
	author_id,
	title,
	cover_url,
	cover_width,
	cover_height,
	is_video,
	media_url,
	images,
	created_at,
	updated_at,
	is_public
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10)
RETURNING {NOTE_COLUMNS}"
	);
	let row = sqlx::query_as::<_, Note>(&sql)
		.bind(note.author_id)
		.bind(note.title.as_deref())
		.bind(note.cover_url.as_deref())
		.bind(note.cover_width)
		.bind(note.cover_height)
		.bind(note.is_video)
		.bind(note.media_url.as_deref())
		.bind(Json(&note.images))
		.bind(note.created_at)
		.bind(note.is_public)
		.fetch_one(executor)
		.await?;

	Ok(row)
}

pub async fn find_note<'e, E>(executor: E, note_id: i64) -> Result<Option<Note>>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!("SELECT {NOTE_COLUMNS} FROM notes n WHERE n.id = $1");
	let row = sqlx::query_as::<_, Note>(&sql).bind(note_id).fetch_optional(executor).await?;

	Ok(row)
}

pub async fn find_note_with_author<'e, E>(
	executor: E,
	note_id: i64,
) -> Result<Option<NoteWithAuthor>>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!(
		"\
SELECT
	{NOTE_COLUMNS},
	u.nickname AS author_nickname,
	u.avatar_url AS author_avatar_url
FROM notes n
JOIN users u ON u.id = n.author_id
WHERE n.id = $1"
	);
	let row =
		sqlx::query_as::<_, NoteWithAuthor>(&sql).bind(note_id).fetch_optional(executor).await?;

	Ok(row)
}

/// One keyset page of notes with author display fields, newest first.
pub async fn page_notes<'e, E>(
	executor: E,
	filter: &FilterExpr,
	cursor: Option<&Cursor>,
	limit: u32,
) -> Result<Page<NoteWithAuthor>>
where
	E: Executor<'e, Database = Postgres>,
{
	let mut builder = QueryBuilder::<Postgres>::new(format!(
		"\
SELECT
	{NOTE_COLUMNS},
	u.nickname AS author_nickname,
	u.avatar_url AS author_avatar_url
FROM notes n
JOIN users u ON u.id = n.author_id"
	));

	filter::push_page_clause(&mut builder, "n", filter, cursor, limit);

	let rows: Vec<NoteWithAuthor> = builder.build_query_as().fetch_all(executor).await?;

	Ok(Page::from_items(rows, limit))
}

/// Adjusts the denormalized comment counter. `None` when the note does not exist.
pub async fn add_comment_count<'e, E>(executor: E, note_id: i64, delta: i64) -> Result<Option<i64>>
where
	E: Executor<'e, Database = Postgres>,
{
	let count = sqlx::query_scalar::<_, i64>(
		"\
UPDATE notes
SET comment_count = comment_count + $1
WHERE id = $2
RETURNING comment_count",
	)
	.bind(delta)
	.bind(note_id)
	.fetch_optional(executor)
	.await?;

	Ok(count)
}
