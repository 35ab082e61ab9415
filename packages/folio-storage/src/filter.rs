//! Composable row predicates for keyset pages.
//!
//! A [`FilterExpr`] renders to SQL with bound parameters and evaluates against an in-memory row
//! with identical semantics, so the page contract can be checked without a database. Column names
//! come only from [`Column`]; user input never reaches the SQL text.

use std::cmp::Ordering;

use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use folio_domain::{Cursor, Keyed, Page, page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
	Id,
	CreatedAt,
	AuthorId,
	IsPublic,
	NoteId,
}
impl Column {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Id => "id",
			Self::CreatedAt => "created_at",
			Self::AuthorId => "author_id",
			Self::IsPublic => "is_public",
			Self::NoteId => "note_id",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValue {
	Int(i64),
	Bool(bool),
	Time(OffsetDateTime),
}
impl FilterValue {
	fn compare(&self, other: &Self) -> Option<Ordering> {
		match (self, other) {
			(Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
			(Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
			(Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
	Eq,
	Lt,
	Lte,
	Gt,
	Gte,
}
impl CompareOp {
	fn as_sql(self) -> &'static str {
		match self {
			Self::Eq => " = ",
			Self::Lt => " < ",
			Self::Lte => " <= ",
			Self::Gt => " > ",
			Self::Gte => " >= ",
		}
	}

	fn holds(self, ordering: Ordering) -> bool {
		match self {
			Self::Eq => ordering == Ordering::Equal,
			Self::Lt => ordering == Ordering::Less,
			Self::Lte => ordering != Ordering::Greater,
			Self::Gt => ordering == Ordering::Greater,
			Self::Gte => ordering != Ordering::Less,
		}
	}
}

/// Rows that can be checked against a [`FilterExpr`] in memory.
pub trait FilterRow {
	/// `None` when the row has no such column; any comparison on it is false.
	fn value(&self, column: Column) -> Option<FilterValue>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
	And(Vec<FilterExpr>),
	Or(Vec<FilterExpr>),
	Compare { column: Column, op: CompareOp, value: FilterValue },
}
impl FilterExpr {
	pub fn all() -> Self {
		Self::And(Vec::new())
	}

	pub fn eq(column: Column, value: FilterValue) -> Self {
		Self::Compare { column, op: CompareOp::Eq, value }
	}

	pub fn lt(column: Column, value: FilterValue) -> Self {
		Self::Compare { column, op: CompareOp::Lt, value }
	}

	pub fn lte(column: Column, value: FilterValue) -> Self {
		Self::Compare { column, op: CompareOp::Lte, value }
	}

	pub fn gt(column: Column, value: FilterValue) -> Self {
		Self::Compare { column, op: CompareOp::Gt, value }
	}

	pub fn gte(column: Column, value: FilterValue) -> Self {
		Self::Compare { column, op: CompareOp::Gte, value }
	}

	pub fn and(self, other: Self) -> Self {
		match self {
			Self::And(mut terms) => {
				terms.push(other);

				Self::And(terms)
			},
			expr => Self::And(vec![expr, other]),
		}
	}

	pub fn or(self, other: Self) -> Self {
		match self {
			Self::Or(mut terms) => {
				terms.push(other);

				Self::Or(terms)
			},
			expr => Self::Or(vec![expr, other]),
		}
	}

	/// Rows strictly after `cursor` in `(created_at DESC, id DESC)` order.
	pub fn keyset_before(cursor: &Cursor) -> Self {
		let ts = FilterValue::Time(cursor.timestamp);
		let id = FilterValue::Int(cursor.id);

		Self::lt(Column::CreatedAt, ts)
			.or(Self::eq(Column::CreatedAt, ts).and(Self::lt(Column::Id, id)))
	}

	pub fn evaluate<R>(&self, row: &R) -> bool
	where
		R: FilterRow + ?Sized,
	{
		match self {
			Self::And(terms) => terms.iter().all(|term| term.evaluate(row)),
			Self::Or(terms) => terms.iter().any(|term| term.evaluate(row)),
			Self::Compare { column, op, value } => row
				.value(*column)
				.and_then(|actual| actual.compare(value))
				.is_some_and(|ordering| op.holds(ordering)),
		}
	}

	/// Appends the predicate with every value bound. `alias` qualifies column names.
	pub fn push_sql(&self, alias: &str, builder: &mut QueryBuilder<'_, Postgres>) {
		match self {
			Self::And(terms) => push_group(terms, " AND ", "TRUE", alias, builder),
			Self::Or(terms) => push_group(terms, " OR ", "FALSE", alias, builder),
			Self::Compare { column, op, value } => {
				builder.push(alias);
				builder.push(".");
				builder.push(column.as_str());
				builder.push(op.as_sql());

				match *value {
					FilterValue::Int(v) => builder.push_bind(v),
					FilterValue::Bool(v) => builder.push_bind(v),
					FilterValue::Time(v) => builder.push_bind(v),
				};
			},
		}
	}
}

fn push_group(
	terms: &[FilterExpr],
	separator: &str,
	empty: &str,
	alias: &str,
	builder: &mut QueryBuilder<'_, Postgres>,
) {
	if terms.is_empty() {
		builder.push(empty);

		return;
	}

	builder.push("(");

	for (idx, term) in terms.iter().enumerate() {
		if idx > 0 {
			builder.push(separator);
		}

		term.push_sql(alias, builder);
	}

	builder.push(")");
}

/// Appends `WHERE filter [AND keyset] ORDER BY ... LIMIT limit` for a keyset page over `alias`.
pub fn push_page_clause(
	builder: &mut QueryBuilder<'_, Postgres>,
	alias: &str,
	filter: &FilterExpr,
	cursor: Option<&Cursor>,
	limit: u32,
) {
	let predicate = match cursor {
		Some(cursor) => filter.clone().and(FilterExpr::keyset_before(cursor)),
		None => filter.clone(),
	};

	builder.push(" WHERE ");
	predicate.push_sql(alias, builder);
	builder.push(format!(" ORDER BY {alias}.created_at DESC, {alias}.id DESC LIMIT "));
	builder.push_bind(i64::from(limit));
}

/// In-memory counterpart of a keyset page query.
pub fn select_page<T>(rows: &[T], filter: &FilterExpr, cursor: Option<&Cursor>, limit: u32) -> Page<T>
where
	T: FilterRow + Keyed + Clone,
{
	let mut matched: Vec<T> = rows
		.iter()
		.filter(|row| filter.evaluate(*row))
		.filter(|row| cursor.is_none_or(|cursor| page::is_before_cursor(*row, cursor)))
		.cloned()
		.collect();

	matched.sort_by(page::compare_desc);
	matched.truncate(limit as usize);

	Page::from_items(matched, limit)
}
