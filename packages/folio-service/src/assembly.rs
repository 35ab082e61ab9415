//! Turns joined storage rows into response items.
//!
//! Everything here is pure: viewer state and reply targets are looked up by the caller and passed
//! in. Output order is input order.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use folio_domain::display;
use folio_storage::models::{CommentWithUser, NoteWithAuthor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteItem {
	pub id: i64,
	pub title: Option<String>,
	pub user_name: String,
	pub avatar: Option<String>,
	pub cover: Option<String>,
	pub cover_width: Option<i32>,
	pub cover_height: Option<i32>,
	pub likes: i64,
	pub is_video: bool,
	pub is_liked: bool,
	pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
	pub id: i64,
	pub title: Option<String>,
	pub user_name: String,
	pub avatar: Option<String>,
	pub cover: Option<String>,
	pub cover_width: Option<i32>,
	pub cover_height: Option<i32>,
	pub likes: i64,
	pub comments: i64,
	pub favorites: i64,
	pub is_video: bool,
	pub is_liked: bool,
	pub is_favorited: bool,
	pub images: Option<Vec<String>>,
	pub media_url: Option<String>,
	pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentItem {
	pub id: i64,
	pub user_name: String,
	pub avatar: Option<String>,
	pub content: String,
	pub timestamp: String,
	pub location: Option<String>,
	pub likes: i64,
	pub is_liked: bool,
	pub reply_to_username: Option<String>,
	pub parent_comment_id: Option<i64>,
}

pub fn note_items(rows: Vec<NoteWithAuthor>, liked: &HashSet<i64>) -> Vec<NoteItem> {
	rows.into_iter()
		.map(|row| {
			let is_liked = liked.contains(&row.note.id);

			NoteItem {
				id: row.note.id,
				title: row.note.title,
				user_name: row.author_nickname,
				avatar: row.author_avatar_url,
				cover: row.note.cover_url,
				cover_width: row.note.cover_width,
				cover_height: row.note.cover_height,
				likes: row.note.like_count,
				is_video: row.note.is_video,
				is_liked,
				images: row.note.images.map(|images| images.0),
			}
		})
		.collect()
}

pub fn note_detail(row: NoteWithAuthor, is_liked: bool, is_favorited: bool) -> NoteDetail {
	let created_at = display::note_timestamp(row.note.created_at);

	NoteDetail {
		id: row.note.id,
		title: row.note.title,
		user_name: row.author_nickname,
		avatar: row.author_avatar_url,
		cover: row.note.cover_url,
		cover_width: row.note.cover_width,
		cover_height: row.note.cover_height,
		likes: row.note.like_count,
		comments: row.note.comment_count,
		favorites: row.note.favorite_count,
		is_video: row.note.is_video,
		is_liked,
		is_favorited,
		images: row.note.images.map(|images| images.0),
		media_url: row.note.media_url,
		created_at,
	}
}

/// Distinct parent ids in first-seen order.
pub fn parent_ids(rows: &[CommentWithUser]) -> Vec<i64> {
	let mut seen = HashSet::new();

	rows.iter()
		.filter_map(|row| row.comment.parent_id)
		.filter(|parent_id| seen.insert(*parent_id))
		.collect()
}

pub fn comment_items(
	rows: Vec<CommentWithUser>,
	liked: &HashSet<i64>,
	parent_authors: &HashMap<i64, String>,
) -> Vec<CommentItem> {
	rows.into_iter().map(|row| comment_item(row, liked, parent_authors)).collect()
}

pub fn comment_item(
	row: CommentWithUser,
	liked: &HashSet<i64>,
	parent_authors: &HashMap<i64, String>,
) -> CommentItem {
	let comment = row.comment;

	CommentItem {
		id: comment.id,
		user_name: row.user_nickname,
		avatar: row.user_avatar_url,
		content: comment.content,
		timestamp: display::comment_timestamp(comment.created_at),
		location: comment.location,
		likes: comment.like_count,
		is_liked: liked.contains(&comment.id),
		reply_to_username: comment
			.parent_id
			.and_then(|parent_id| parent_authors.get(&parent_id).cloned()),
		parent_comment_id: comment.parent_id,
	}
}

#[cfg(test)]
mod tests {
	use sqlx::types::Json;
	use time::{OffsetDateTime, macros::datetime};

	use folio_storage::models::{Comment, Note};

	use super::*;

	fn note_row(id: i64, created_at: OffsetDateTime) -> NoteWithAuthor {
		NoteWithAuthor {
			note: Note {
				id,
				author_id: 1,
				title: Some(format!("note {id}")),
				cover_url: Some("https://img.example/cover.png".to_string()),
				cover_width: Some(720),
				cover_height: Some(960),
				is_video: false,
				media_url: None,
				images: Some(Json(vec!["https://img.example/1.png".to_string()])),
				like_count: id * 10,
				comment_count: 2,
				favorite_count: 1,
				created_at,
				updated_at: created_at,
				is_public: true,
				status: 0,
			},
			author_nickname: "alice".to_string(),
			author_avatar_url: None,
		}
	}

	fn comment_row(id: i64, parent_id: Option<i64>) -> CommentWithUser {
		let created_at = datetime!(2024-05-01 16:05:59 UTC);

		CommentWithUser {
			comment: Comment {
				id,
				note_id: 1,
				user_id: 2,
				parent_id,
				content: format!("comment {id}"),
				location: None,
				like_count: 0,
				created_at,
				updated_at: created_at,
			},
			user_nickname: "bob".to_string(),
			user_avatar_url: Some("https://img.example/bob.png".to_string()),
		}
	}

	#[test]
	fn note_items_keep_input_order_and_mark_likes() {
		let ts = datetime!(2024-05-01 0:00 UTC);
		let rows = vec![note_row(3, ts), note_row(1, ts), note_row(2, ts)];
		let liked = HashSet::from([1]);
		let items = note_items(rows, &liked);

		assert_eq!(items.iter().map(|item| item.id).collect::<Vec<_>>(), vec![3, 1, 2]);
		assert_eq!(items.iter().map(|item| item.is_liked).collect::<Vec<_>>(), vec![
			false, true, false
		]);
		assert_eq!(items[0].likes, 30);
		assert_eq!(items[0].user_name, "alice");
	}

	#[test]
	fn note_detail_formats_creation_time() {
		let detail = note_detail(note_row(1, datetime!(2024-05-01 16:05:59 UTC)), true, false);

		assert_eq!(detail.created_at, "2024-05-02 00:05:59");
		assert!(detail.is_liked);
		assert!(!detail.is_favorited);
		assert_eq!(detail.comments, 2);
		assert_eq!(detail.favorites, 1);
	}

	#[test]
	fn note_items_serialize_camel_case() {
		let items = note_items(vec![note_row(1, datetime!(2024-05-01 0:00 UTC))], &HashSet::new());
		let value = serde_json::to_value(&items[0]).expect("Failed to serialize note item.");

		assert_eq!(value["userName"], "alice");
		assert_eq!(value["coverWidth"], 720);
		assert_eq!(value["isLiked"], false);
		assert_eq!(value["images"][0], "https://img.example/1.png");
	}

	#[test]
	fn parent_ids_are_distinct_in_first_seen_order() {
		let rows = vec![
			comment_row(5, Some(2)),
			comment_row(4, None),
			comment_row(3, Some(1)),
			comment_row(6, Some(2)),
		];

		assert_eq!(parent_ids(&rows), vec![2, 1]);
	}

	#[test]
	fn comments_resolve_reply_targets() {
		let rows = vec![comment_row(5, Some(2)), comment_row(4, None), comment_row(3, Some(9))];
		let parents = HashMap::from([(2, "carol".to_string())]);
		let liked = HashSet::from([4]);
		let items = comment_items(rows, &liked, &parents);

		assert_eq!(items.iter().map(|item| item.id).collect::<Vec<_>>(), vec![5, 4, 3]);
		assert_eq!(items[0].reply_to_username.as_deref(), Some("carol"));
		assert_eq!(items[0].parent_comment_id, Some(2));
		assert_eq!(items[1].reply_to_username, None);
		assert!(items[1].is_liked);
		// An unresolved parent keeps its id but names nobody.
		assert_eq!(items[2].reply_to_username, None);
		assert_eq!(items[2].parent_comment_id, Some(9));
		assert_eq!(items[0].timestamp, "2024-05-02 00:05");
	}
}
