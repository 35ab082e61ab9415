pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Unauthorized: {message}")]
	Unauthorized { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	/// A concurrent transaction won a serialization race. Nothing was written; the client may
	/// retry.
	#[error("Transaction conflict: {message}")]
	TransactionConflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Internal error: {message}")]
	Internal { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		if folio_storage::is_serialization_failure(&err) {
			return Self::TransactionConflict { message: err.to_string() };
		}

		Self::Storage { message: err.to_string() }
	}
}

impl From<folio_storage::Error> for Error {
	fn from(err: folio_storage::Error) -> Self {
		match err {
			folio_storage::Error::Sqlx(inner) => inner.into(),
			folio_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			folio_storage::Error::NotFound(message) => Self::NotFound { message },
			folio_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn storage_errors_keep_their_kind() {
		let err: Error = folio_storage::Error::Conflict("account taken".to_string()).into();

		assert!(matches!(err, Error::Conflict { .. }));

		let err: Error = folio_storage::Error::NotFound("notes 1".to_string()).into();

		assert!(matches!(err, Error::NotFound { .. }));

		let err: Error = folio_storage::Error::Sqlx(sqlx::Error::RowNotFound).into();

		assert!(matches!(err, Error::Storage { .. }));
	}
}
