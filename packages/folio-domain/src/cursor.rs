//! Opaque pagination tokens.
//!
//! A cursor marks a position in the `(created_at DESC, id DESC)` ordering; a page fetched with it
//! holds only items strictly before that position. The wire form is
//! `base64url_nopad("{epoch_millis}:{id}")`. Tokens are not signed.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use time::{Duration, OffsetDateTime};

const SEPARATOR: char = ':';
const NANOS_PER_MILLI: i128 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
	pub timestamp: OffsetDateTime,
	pub id: i64,
}
impl Cursor {
	pub fn new(timestamp: OffsetDateTime, id: i64) -> Self {
		Self { timestamp, id }
	}

	pub fn encode(&self) -> String {
		let raw = format!("{}{SEPARATOR}{}", epoch_millis(self.timestamp), self.id);

		URL_SAFE_NO_PAD.encode(raw.as_bytes())
	}

	/// Returns `None` for anything that is not a well-formed token. Callers treat `None` the same
	/// as an absent cursor and serve the first page.
	pub fn decode(token: Option<&str>) -> Option<Self> {
		let token = token?.trim();

		if token.is_empty() {
			return None;
		}

		let bytes = URL_SAFE_NO_PAD.decode(token.as_bytes()).ok()?;
		let raw = String::from_utf8(bytes).ok()?;
		let mut parts = raw.split(SEPARATOR);
		let millis = parts.next()?.parse::<i64>().ok()?;
		let id = parts.next()?.parse::<i64>().ok()?;

		if parts.next().is_some() {
			return None;
		}

		let timestamp =
			OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI).ok()?;

		Some(Self { timestamp, id })
	}
}

pub fn epoch_millis(ts: OffsetDateTime) -> i64 {
	(ts.unix_timestamp_nanos() / NANOS_PER_MILLI) as i64
}

/// Drops sub-millisecond precision so stored timestamps survive a cursor round trip unchanged.
pub fn truncate_to_millis(ts: OffsetDateTime) -> OffsetDateTime {
	ts - Duration::nanoseconds(i64::from(ts.nanosecond() % 1_000_000))
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn round_trips_timestamp_and_id() {
		let cursor = Cursor::new(datetime!(2024-05-01 12:30:45.123 UTC), 42);
		let token = cursor.encode();

		assert_eq!(Cursor::decode(Some(&token)), Some(cursor));
	}

	#[test]
	fn round_trips_epoch_and_negative_values() {
		for cursor in [
			Cursor::new(OffsetDateTime::UNIX_EPOCH, 0),
			Cursor::new(datetime!(1969-12-31 23:59:59.999 UTC), 7),
			Cursor::new(datetime!(2100-01-01 00:00:00 UTC), i64::MAX),
		] {
			assert_eq!(Cursor::decode(Some(&cursor.encode())), Some(cursor));
		}
	}

	#[test]
	fn token_is_url_safe_and_unpadded() {
		let token = Cursor::new(datetime!(2024-05-01 0:00 UTC), 1).encode();

		assert!(!token.contains('='));
		assert!(!token.contains('+'));
		assert!(!token.contains('/'));
		assert_eq!(URL_SAFE_NO_PAD.decode(&token).unwrap(), b"1714521600000:1".to_vec());
	}

	#[test]
	fn rejects_missing_and_blank_tokens() {
		assert_eq!(Cursor::decode(None), None);
		assert_eq!(Cursor::decode(Some("")), None);
		assert_eq!(Cursor::decode(Some("   ")), None);
	}

	#[test]
	fn rejects_garbage() {
		assert_eq!(Cursor::decode(Some("%%%not-base64%%%")), None);
		assert_eq!(Cursor::decode(Some("abc=")), None);
	}

	#[test]
	fn rejects_wrong_field_count() {
		let single = URL_SAFE_NO_PAD.encode("1714521600000");
		let triple = URL_SAFE_NO_PAD.encode("1:2:3");

		assert_eq!(Cursor::decode(Some(&single)), None);
		assert_eq!(Cursor::decode(Some(&triple)), None);
	}

	#[test]
	fn rejects_non_numeric_fields() {
		for raw in ["abc:1", "1:abc", ":1", "1:", "1.5:2"] {
			let token = URL_SAFE_NO_PAD.encode(raw);

			assert_eq!(Cursor::decode(Some(&token)), None, "{raw}");
		}
	}

	#[test]
	fn rejects_out_of_range_timestamp() {
		let token = URL_SAFE_NO_PAD.encode(format!("{}:1", i64::MAX));

		assert_eq!(Cursor::decode(Some(&token)), None);
	}

	#[test]
	fn truncation_keeps_whole_milliseconds() {
		let ts = datetime!(2024-05-01 12:00:00.123456789 UTC);

		assert_eq!(truncate_to_millis(ts), datetime!(2024-05-01 12:00:00.123 UTC));

		let cursor = Cursor::new(truncate_to_millis(ts), 9);

		assert_eq!(Cursor::decode(Some(&cursor.encode())), Some(cursor));
	}
}
