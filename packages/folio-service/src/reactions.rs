use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use folio_storage::{
	comments,
	relations::{self, Relation},
};

use crate::{Error, FolioService, Result};

/// Result of one toggle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
	/// Membership state the caller asked for, which now holds.
	pub active: bool,
	/// Counter value read after the toggle committed.
	pub count: i64,
	/// Whether membership actually changed. A repeated toggle reports `false`.
	pub applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
	pub is_liked: bool,
	pub likes: i64,
}
impl From<ToggleOutcome> for LikeResponse {
	fn from(outcome: ToggleOutcome) -> Self {
		Self { is_liked: outcome.active, likes: outcome.count }
	}
}

/// Toggles run at the configured isolation level. Under `REPEATABLE READ`, concurrent toggles by
/// different users on one hot target can lose the race on its counter row and fail with
/// [`Error::TransactionConflict`] (HTTP 409). The losing transaction is rolled back in full, so
/// retrying the call is safe.
impl FolioService {
	pub async fn toggle_note_like(
		&self,
		user_id: i64,
		note_id: i64,
		active: bool,
	) -> Result<ToggleOutcome> {
		self.toggle(Relation::NoteLike, user_id, note_id, active).await
	}

	pub async fn toggle_note_favorite(
		&self,
		user_id: i64,
		note_id: i64,
		active: bool,
	) -> Result<ToggleOutcome> {
		self.toggle(Relation::NoteFavorite, user_id, note_id, active).await
	}

	pub async fn toggle_comment_like(
		&self,
		user_id: i64,
		comment_id: i64,
		active: bool,
	) -> Result<ToggleOutcome> {
		self.toggle(Relation::CommentLike, user_id, comment_id, active).await
	}

	async fn toggle(
		&self,
		relation: Relation,
		user_id: i64,
		target_id: i64,
		active: bool,
	) -> Result<ToggleOutcome> {
		let mut tx = self.db.begin().await?;
		let note_id = match relation {
			Relation::NoteLike | Relation::NoteFavorite => target_id,
			Relation::CommentLike => match comments::find_comment(&mut *tx, target_id).await? {
				Some(comment) => comment.note_id,
				None =>
					return Err(Error::NotFound {
						message: format!("Comment {target_id} does not exist."),
					}),
			},
		};

		crate::notes::visible_note(&mut *tx, Some(user_id), note_id).await?;

		let applied = if active {
			relations::toggle_on(&mut tx, relation, user_id, target_id, OffsetDateTime::now_utc())
				.await?
		} else {
			relations::toggle_off(&mut *tx, relation, user_id, target_id).await?
		};

		if applied {
			let delta = if active { 1 } else { -1 };

			relations::increment_counter(&mut *tx, relation, target_id, delta).await?;
		}

		tx.commit().await?;

		let count = relations::current_count(&self.db.pool, relation, target_id).await?.unwrap_or(0);

		tracing::info!(
			relation = relation.as_str(),
			user_id,
			target_id,
			active,
			applied,
			count,
			"Toggled membership."
		);

		Ok(ToggleOutcome { active, count, applied })
	}
}
