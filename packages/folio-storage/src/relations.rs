//! Set-membership relations and the counters they keep in sync.
//!
//! A toggle writes membership first and touches the parent counter only when membership actually
//! changed, both inside the caller's transaction. Table and column names come from [`Relation`]
//! and are never derived from input.

use std::collections::HashSet;

use sqlx::{Connection, Executor, Postgres};
use time::OffsetDateTime;

use crate::{Error, Result, db::Tx, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
	NoteLike,
	NoteFavorite,
	CommentLike,
}
impl Relation {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::NoteLike => "note_like",
			Self::NoteFavorite => "note_favorite",
			Self::CommentLike => "comment_like",
		}
	}

	pub fn table(self) -> &'static str {
		match self {
			Self::NoteLike => "note_likes",
			Self::NoteFavorite => "note_favorites",
			Self::CommentLike => "comment_likes",
		}
	}

	pub fn target_table(self) -> &'static str {
		match self {
			Self::NoteLike | Self::NoteFavorite => "notes",
			Self::CommentLike => "comments",
		}
	}

	pub fn counter_column(self) -> &'static str {
		match self {
			Self::NoteLike | Self::CommentLike => "like_count",
			Self::NoteFavorite => "favorite_count",
		}
	}
}

/// Adds `(user_id, target_id)` to the relation. Returns `false` when the pair is already present.
///
/// The insert runs in a savepoint so a duplicate key leaves the outer transaction usable.
pub async fn toggle_on(
	tx: &mut Tx,
	relation: Relation,
	user_id: i64,
	target_id: i64,
	now: OffsetDateTime,
) -> Result<bool> {
	let sql =
		format!("INSERT INTO {} (user_id, target_id, created_at) VALUES ($1, $2, $3)", relation.table());
	let mut savepoint = Connection::begin(&mut **tx).await?;
	let result = sqlx::query(&sql)
		.bind(user_id)
		.bind(target_id)
		.bind(now)
		.execute(&mut *savepoint)
		.await;

	match result {
		Ok(_) => {
			savepoint.commit().await?;

			Ok(true)
		},
		Err(err) if error::is_unique_violation(&err) => {
			savepoint.rollback().await?;

			tracing::debug!(
				relation = relation.as_str(),
				user_id,
				target_id,
				"Membership already present."
			);

			Ok(false)
		},
		Err(err) => Err(err.into()),
	}
}

/// Removes `(user_id, target_id)` from the relation. Returns `false` when the pair was absent.
pub async fn toggle_off<'e, E>(
	executor: E,
	relation: Relation,
	user_id: i64,
	target_id: i64,
) -> Result<bool>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!("DELETE FROM {} WHERE user_id = $1 AND target_id = $2", relation.table());
	let result = sqlx::query(&sql).bind(user_id).bind(target_id).execute(executor).await?;

	Ok(result.rows_affected() > 0)
}

/// Adds `delta` to the target's counter and returns the new value. The counter is not clamped.
pub async fn increment_counter<'e, E>(
	executor: E,
	relation: Relation,
	target_id: i64,
	delta: i64,
) -> Result<i64>
where
	E: Executor<'e, Database = Postgres>,
{
	let column = relation.counter_column();
	let sql = format!(
		"UPDATE {table} SET {column} = {column} + $1 WHERE id = $2 RETURNING {column}",
		table = relation.target_table(),
	);

	sqlx::query_scalar::<_, i64>(&sql)
		.bind(delta)
		.bind(target_id)
		.fetch_optional(executor)
		.await?
		.ok_or_else(|| Error::NotFound(format!("{} {target_id}", relation.target_table())))
}

pub async fn current_count<'e, E>(
	executor: E,
	relation: Relation,
	target_id: i64,
) -> Result<Option<i64>>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!(
		"SELECT {} FROM {} WHERE id = $1",
		relation.counter_column(),
		relation.target_table()
	);
	let count = sqlx::query_scalar::<_, i64>(&sql).bind(target_id).fetch_optional(executor).await?;

	Ok(count)
}

pub async fn is_member<'e, E>(
	executor: E,
	relation: Relation,
	user_id: i64,
	target_id: i64,
) -> Result<bool>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!(
		"SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND target_id = $2)",
		relation.table()
	);
	let member = sqlx::query_scalar::<_, bool>(&sql)
		.bind(user_id)
		.bind(target_id)
		.fetch_one(executor)
		.await?;

	Ok(member)
}

/// The subset of `target_ids` the user holds membership for. Empty input never reaches storage.
pub async fn membership_set<'e, E>(
	executor: E,
	relation: Relation,
	user_id: i64,
	target_ids: &[i64],
) -> Result<HashSet<i64>>
where
	E: Executor<'e, Database = Postgres>,
{
	if target_ids.is_empty() {
		return Ok(HashSet::new());
	}

	let sql =
		format!("SELECT target_id FROM {} WHERE user_id = $1 AND target_id = ANY($2)", relation.table());
	let rows = sqlx::query_scalar::<_, i64>(&sql)
		.bind(user_id)
		.bind(target_ids)
		.fetch_all(executor)
		.await?;

	Ok(rows.into_iter().collect())
}
