//! Bearer-token extractors.

use std::convert::Infallible;

use axum::{
	extract::FromRequestParts,
	http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::{routes::ApiError, state::AppState};

/// The authenticated caller. Rejects with 401 when the token is missing or invalid.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);
impl FromRequestParts<AppState> for AuthUser {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let Some(token) = bearer_token(&parts.headers) else {
			return Err(ApiError::unauthorized("Missing bearer token."));
		};
		let user_id = state.service.authenticate(token)?;

		Ok(Self(user_id))
	}
}

/// The caller when a valid token is present. Public reads use this for viewer state, so a bad
/// token degrades to anonymous instead of failing the request.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<i64>);
impl FromRequestParts<AppState> for MaybeUser {
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let user_id = bearer_token(&parts.headers).and_then(|token| {
			state
				.service
				.authenticate(token)
				.inspect_err(|err| tracing::debug!(error = %err, "Ignoring invalid bearer token."))
				.ok()
		});

		Ok(Self(user_id))
	}
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	let (scheme, token) = value.trim().split_once(' ')?;

	if !scheme.eq_ignore_ascii_case("bearer") {
		return None;
	}

	let token = token.trim();

	(!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;

	use super::*;

	fn headers(value: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, HeaderValue::from_str(value).expect("Invalid header value."));

		headers
	}

	#[test]
	fn extracts_bearer_tokens() {
		assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
		assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc"));
	}

	#[test]
	fn ignores_other_schemes_and_blank_tokens() {
		assert_eq!(bearer_token(&headers("Basic dXNlcg==")), None);
		assert_eq!(bearer_token(&headers("Bearer ")), None);
		assert_eq!(bearer_token(&headers("Bearer")), None);
		assert_eq!(bearer_token(&HeaderMap::new()), None);
	}
}
