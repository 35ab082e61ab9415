use time::OffsetDateTime;

use crate::Cursor;

/// Anything that sits in the `(created_at DESC, id DESC)` ordering.
pub trait Keyed {
	fn sort_key(&self) -> (OffsetDateTime, i64);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub next_cursor: Option<Cursor>,
}
impl<T> Page<T>
where
	T: Keyed,
{
	pub fn from_items(items: Vec<T>, limit: u32) -> Self {
		let next_cursor = next_cursor(&items, limit);

		Self { items, next_cursor }
	}
}
impl<T> Page<T> {
	pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
		Page { items: self.items.into_iter().map(f).collect(), next_cursor: self.next_cursor }
	}
}

/// Resolves the effective page size. Missing values use `default`; everything else is clamped to
/// `1..=max`.
pub fn clamp_limit(requested: Option<i64>, default: u32, max: u32) -> u32 {
	let max = max.max(1);

	match requested {
		None => default.clamp(1, max),
		Some(value) => value.clamp(1, i64::from(max)) as u32,
	}
}

/// A full page may have a successor; a short or empty page ends the stream.
pub fn next_cursor<T>(items: &[T], limit: u32) -> Option<Cursor>
where
	T: Keyed,
{
	if limit == 0 || items.len() != limit as usize {
		return None;
	}

	items.last().map(|item| {
		let (timestamp, id) = item.sort_key();

		Cursor::new(timestamp, id)
	})
}

/// Reference ordering: newest first, larger id first on equal timestamps.
pub fn compare_desc<T>(a: &T, b: &T) -> std::cmp::Ordering
where
	T: Keyed,
{
	b.sort_key().cmp(&a.sort_key())
}

/// Whether `item` falls strictly after `cursor` in the descending ordering.
pub fn is_before_cursor<T>(item: &T, cursor: &Cursor) -> bool
where
	T: Keyed,
{
	let (created_at, id) = item.sort_key();

	created_at < cursor.timestamp || (created_at == cursor.timestamp && id < cursor.id)
}
