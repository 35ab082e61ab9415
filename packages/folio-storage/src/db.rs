use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};

use folio_config::Isolation;

use crate::{Result, schema};

pub type Tx = Transaction<'static, Postgres>;

pub struct Db {
	pub pool: PgPool,
	pub isolation: Isolation,
}
impl Db {
	pub async fn connect(cfg: &folio_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool, isolation: cfg.isolation })
	}

	/// Builds the pool without opening a connection until the first query.
	pub fn connect_lazy(cfg: &folio_config::Postgres) -> Result<Self> {
		let pool = PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect_lazy(&cfg.dsn)?;

		Ok(Self { pool, isolation: cfg.isolation })
	}

	/// Opens a transaction at the configured isolation level. The `SET TRANSACTION` must be the
	/// first statement of the transaction, so callers always go through here.
	pub async fn begin(&self) -> Result<Tx> {
		let mut tx = self.pool.begin().await?;
		let statement = format!("SET TRANSACTION ISOLATION LEVEL {}", self.isolation.as_sql());

		sqlx::query(&statement).execute(&mut *tx).await?;

		Ok(tx)
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let lock_id: i64 = 6_110_905;
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and automatically released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
