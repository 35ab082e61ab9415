use argon2::{
	Argon2,
	password_hash::{
		PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
	},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::task::{self, JoinError};

use folio_domain::cursor;
use folio_storage::{
	models::{NewUser, User},
	users,
};

use crate::{Error, FolioService, Result};

const MIN_PASSWORD_CHARS: usize = 6;
const GENERATED_NICKNAME_MODULUS: i128 = 100_000;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
	uid: i64,
	iss: String,
	aud: String,
	iat: i64,
	exp: i64,
}

/// Issues and verifies HS256 bearer tokens carrying the user id in `uid`.
pub struct TokenSigner {
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
	validation: Validation,
	issuer: String,
	audience: String,
	ttl_secs: i64,
}
impl TokenSigner {
	pub fn new(cfg: &folio_config::Security) -> Self {
		let mut validation = Validation::new(Algorithm::HS256);

		validation.set_issuer(&[cfg.jwt_issuer.as_str()]);
		validation.set_audience(&[cfg.jwt_audience.as_str()]);

		Self {
			encoding_key: EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
			decoding_key: DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
			validation,
			issuer: cfg.jwt_issuer.clone(),
			audience: cfg.jwt_audience.clone(),
			ttl_secs: cfg.token_ttl_secs,
		}
	}

	pub fn issue(&self, user_id: i64) -> Result<String> {
		self.issue_at(user_id, OffsetDateTime::now_utc())
	}

	pub fn issue_at(&self, user_id: i64, now: OffsetDateTime) -> Result<String> {
		let iat = now.unix_timestamp();
		let claims = Claims {
			uid: user_id,
			iss: self.issuer.clone(),
			aud: self.audience.clone(),
			iat,
			exp: iat.saturating_add(self.ttl_secs),
		};

		jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
			.map_err(|err| Error::Internal { message: format!("Failed to sign token: {err}.") })
	}

	/// Returns the user id of a valid, unexpired token.
	pub fn verify(&self, token: &str) -> Result<i64> {
		jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
			.map(|data| data.claims.uid)
			.map_err(|err| Error::Unauthorized { message: format!("Invalid token: {err}.") })
	}
}

/// Argon2id password hashing with a random salt per hash.
#[derive(Clone, Default)]
pub struct PasswordHasher {
	argon2: Argon2<'static>,
}
impl PasswordHasher {
	pub fn hash(&self, password: &str) -> Result<String> {
		let salt = SaltString::generate(&mut OsRng);

		self.argon2
			.hash_password(password.as_bytes(), &salt)
			.map(|hash| hash.to_string())
			.map_err(|err| Error::Internal { message: format!("Failed to hash password: {err}.") })
	}

	/// Malformed stored hashes never verify.
	pub fn verify(&self, password: &str, hash: &str) -> bool {
		match PasswordHash::new(hash) {
			Ok(parsed) => self.argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
			Err(_) => false,
		}
	}

	/// [`Self::hash`] on the blocking thread pool.
	pub async fn hash_blocking(&self, password: String) -> Result<String> {
		let hasher = self.clone();

		task::spawn_blocking(move || hasher.hash(&password)).await.map_err(join_error)?
	}

	/// [`Self::verify`] on the blocking thread pool.
	pub async fn verify_blocking(&self, password: String, hash: String) -> Result<bool> {
		let hasher = self.clone();

		task::spawn_blocking(move || hasher.verify(&password, &hash)).await.map_err(join_error)
	}
}

fn join_error(err: JoinError) -> Error {
	Error::Internal { message: format!("Password task failed: {err}.") }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
	pub account: String,
	pub password: String,
	#[serde(default)]
	pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
	pub account: String,
	pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
	pub id: i64,
	pub nickname: String,
	pub avatar: Option<String>,
	pub bio: Option<String>,
	pub gender: Option<String>,
	pub city: Option<String>,
}
impl From<User> for UserProfile {
	fn from(user: User) -> Self {
		Self {
			id: user.id,
			nickname: user.nickname,
			avatar: user.avatar_url,
			bio: user.bio,
			gender: user.gender,
			city: user.city,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
	pub token: String,
	pub user: UserProfile,
}

impl FolioService {
	pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse> {
		let account = req.account.trim();

		if account.is_empty() || req.password.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "account and password are required.".to_string(),
			});
		}
		if req.password.chars().count() < MIN_PASSWORD_CHARS {
			return Err(Error::InvalidRequest {
				message: format!("password must be at least {MIN_PASSWORD_CHARS} characters."),
			});
		}

		let now = OffsetDateTime::now_utc();
		let nickname = match req.nickname.trim() {
			"" => generated_nickname(now),
			nickname => nickname.to_string(),
		};
		let password_hash = self.passwords.hash_blocking(req.password).await?;
		let user = users::insert_user(
			&self.db.pool,
			&NewUser {
				nickname,
				account: account.to_string(),
				password_hash,
				created_at: cursor::truncate_to_millis(now),
			},
		)
		.await?;
		let token = self.tokens.issue(user.id)?;

		tracing::info!(user_id = user.id, "Registered account.");

		Ok(AuthResponse { token, user: user.into() })
	}

	pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse> {
		let account = req.account.trim();

		if account.is_empty() || req.password.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "account and password are required.".to_string(),
			});
		}

		let Some(user) = users::find_user_by_account(&self.db.pool, account).await? else {
			return Err(Error::Unauthorized { message: "Invalid account or password.".to_string() });
		};

		if !self.passwords.verify_blocking(req.password, user.password_hash.clone()).await? {
			return Err(Error::Unauthorized { message: "Invalid account or password.".to_string() });
		}

		let token = self.tokens.issue(user.id)?;

		Ok(AuthResponse { token, user: user.into() })
	}

	pub async fn me(&self, user_id: i64) -> Result<UserProfile> {
		let Some(user) = users::find_user(&self.db.pool, user_id).await? else {
			return Err(Error::Unauthorized { message: "User does not exist.".to_string() });
		};

		Ok(user.into())
	}

	/// Resolves a bearer token to the caller's user id.
	pub fn authenticate(&self, token: &str) -> Result<i64> {
		self.tokens.verify(token)
	}
}

fn generated_nickname(now: OffsetDateTime) -> String {
	let millis = now.unix_timestamp_nanos() / 1_000_000;

	format!("user{}", millis.rem_euclid(GENERATED_NICKNAME_MODULUS))
}
