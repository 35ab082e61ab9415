use time::{
	OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
	macros::offset,
};

/// Every display timestamp is rendered in China Standard Time.
const DISPLAY_OFFSET: UtcOffset = offset!(+8);

const DATE_TIME_SECONDS: &[BorrowedFormatItem<'_>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATE_TIME_MINUTES: &[BorrowedFormatItem<'_>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]");

pub fn note_timestamp(ts: OffsetDateTime) -> String {
	render(ts, DATE_TIME_SECONDS)
}

pub fn comment_timestamp(ts: OffsetDateTime) -> String {
	render(ts, DATE_TIME_MINUTES)
}

fn render(ts: OffsetDateTime, format: &[BorrowedFormatItem<'_>]) -> String {
	ts.to_offset(DISPLAY_OFFSET).format(format).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn renders_in_display_offset() {
		let ts = datetime!(2024-05-01 18:30:15 UTC);

		assert_eq!(note_timestamp(ts), "2024-05-02 02:30:15");
		assert_eq!(comment_timestamp(ts), "2024-05-02 02:30");
	}
}
