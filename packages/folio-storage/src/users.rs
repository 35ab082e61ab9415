use sqlx::{Executor, Postgres};

use crate::{
	Error, Result, error,
	models::{NewUser, User},
};

const USER_COLUMNS: &str = "\
id,
	nickname,
	avatar_url,
	bio,
	gender,
	city,
	account,
	password_hash,
	created_at,
	updated_at";

/// Fails with [`Error::Conflict`] when the account is already taken.
pub async fn insert_user<'e, E>(executor: E, user: &NewUser) -> Result<User>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!(
		"\
INSERT INTO users (nickname, account, password_hash, created_at, updated_at)
VALUES ($1, $2, $3, $4, $4)
RETURNING {USER_COLUMNS}"
	);
	let result = sqlx::query_as::<_, User>(&sql)
		.bind(user.nickname.as_str())
		.bind(user.account.as_str())
		.bind(user.password_hash.as_str())
		.bind(user.created_at)
		.fetch_one(executor)
		.await;

	match result {
		Ok(row) => Ok(row),
		Err(err) if error::is_unique_violation(&err) =>
			Err(Error::Conflict(format!("account {} already exists", user.account))),
		Err(err) => Err(err.into()),
	}
}

pub async fn find_user<'e, E>(executor: E, user_id: i64) -> Result<Option<User>>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
	let row = sqlx::query_as::<_, User>(&sql).bind(user_id).fetch_optional(executor).await?;

	Ok(row)
}

pub async fn find_user_by_account<'e, E>(executor: E, account: &str) -> Result<Option<User>>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE account = $1");
	let row = sqlx::query_as::<_, User>(&sql).bind(account).fetch_optional(executor).await?;

	Ok(row)
}
