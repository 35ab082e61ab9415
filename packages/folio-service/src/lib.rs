pub mod assembly;
pub mod auth;
pub mod comments;
pub mod feed;
pub mod notes;
pub mod reactions;

mod error;

pub use assembly::{CommentItem, NoteDetail, NoteItem};
pub use auth::{
	AuthResponse, LoginRequest, PasswordHasher, RegisterRequest, TokenSigner, UserProfile,
};
pub use comments::{CommentPage, CreateCommentRequest};
pub use error::{Error, Result};
pub use feed::{FeedResponse, PageRequest};
pub use notes::CreateNoteRequest;
pub use reactions::{LikeResponse, ToggleOutcome};

use folio_config::Config;
use folio_domain::{Cursor, page};
use folio_storage::db::Db;

pub struct FolioService {
	pub cfg: Config,
	pub db: Db,
	pub tokens: TokenSigner,
	pub passwords: PasswordHasher,
}
impl FolioService {
	pub fn new(cfg: Config, db: Db) -> Self {
		let tokens = TokenSigner::new(&cfg.security);

		Self { cfg, db, tokens, passwords: PasswordHasher::default() }
	}

	pub(crate) fn page_limit(&self, requested: Option<i64>) -> u32 {
		page::clamp_limit(requested, self.cfg.feed.default_limit, self.cfg.feed.max_limit)
	}
}

/// Malformed tokens read as "no cursor" and serve the first page.
pub(crate) fn decode_cursor(token: Option<&str>) -> Option<Cursor> {
	let cursor = Cursor::decode(token);

	if cursor.is_none() && token.is_some_and(|token| !token.trim().is_empty()) {
		tracing::debug!("Ignoring malformed cursor.");
	}

	cursor
}
