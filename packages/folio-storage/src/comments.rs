use std::collections::HashMap;

use sqlx::{Executor, Postgres, QueryBuilder};

use folio_domain::{Cursor, Page};

use crate::{
	Result,
	filter::{self, FilterExpr},
	models::{Comment, CommentWithUser, NewComment},
};

const COMMENT_COLUMNS: &str = "\
c.id,
	c.note_id,
	c.user_id,
	c.parent_id,
	c.content,
	c.location,
	c.like_count,
	c.created_at,
	c.updated_at";

pub async fn insert_comment<'e, E>(executor: E, comment: &NewComment) -> Result<Comment>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!(
		"\
INSERT INTO comments AS c (
	note_id,
	user_id,
	parent_id,
	content,
	location,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $6)
RETURNING {COMMENT_COLUMNS}"
	);
	let row = sqlx::query_as::<_, Comment>(&sql)
		.bind(comment.note_id)
		.bind(comment.user_id)
		.bind(comment.parent_id)
		.bind(comment.content.as_str())
		.bind(comment.location.as_deref())
		.bind(comment.created_at)
		.fetch_one(executor)
		.await?;

	Ok(row)
}

pub async fn find_comment<'e, E>(executor: E, comment_id: i64) -> Result<Option<Comment>>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.id = $1");
	let row = sqlx::query_as::<_, Comment>(&sql).bind(comment_id).fetch_optional(executor).await?;

	Ok(row)
}

/// One keyset page of comments with commenter display fields, newest first.
pub async fn page_comments<'e, E>(
	executor: E,
	filter: &FilterExpr,
	cursor: Option<&Cursor>,
	limit: u32,
) -> Result<Page<CommentWithUser>>
where
	E: Executor<'e, Database = Postgres>,
{
	let mut builder = QueryBuilder::<Postgres>::new(format!(
		"\
SELECT
	{COMMENT_COLUMNS},
	u.nickname AS user_nickname,
	u.avatar_url AS user_avatar_url
FROM comments c
JOIN users u ON u.id = c.user_id"
	));

	filter::push_page_clause(&mut builder, "c", filter, cursor, limit);

	let rows: Vec<CommentWithUser> = builder.build_query_as().fetch_all(executor).await?;

	Ok(Page::from_items(rows, limit))
}

pub async fn count_by_note<'e, E>(executor: E, note_id: i64) -> Result<i64>
where
	E: Executor<'e, Database = Postgres>,
{
	let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE note_id = $1")
		.bind(note_id)
		.fetch_one(executor)
		.await?;

	Ok(total)
}

/// Maps parent comment ids to their authors' nicknames in one round trip. Ids that no longer
/// resolve are absent from the map.
pub async fn parent_authors<'e, E>(executor: E, parent_ids: &[i64]) -> Result<HashMap<i64, String>>
where
	E: Executor<'e, Database = Postgres>,
{
	if parent_ids.is_empty() {
		return Ok(HashMap::new());
	}

	let rows = sqlx::query_as::<_, (i64, String)>(
		"\
SELECT c.id, u.nickname
FROM comments c
JOIN users u ON u.id = c.user_id
WHERE c.id = ANY($1)",
	)
	.bind(parent_ids)
	.fetch_all(executor)
	.await?;

	Ok(rows.into_iter().collect())
}
