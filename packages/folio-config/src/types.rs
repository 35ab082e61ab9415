use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub security: Security,
	#[serde(default)]
	pub feed: Feed,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// Isolation level applied to every transaction opened by the storage layer.
	#[serde(default)]
	pub isolation: Isolation,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
	ReadCommitted,
	#[default]
	RepeatableRead,
	Serializable,
}
impl Isolation {
	pub fn as_sql(self) -> &'static str {
		match self {
			Self::ReadCommitted => "READ COMMITTED",
			Self::RepeatableRead => "REPEATABLE READ",
			Self::Serializable => "SERIALIZABLE",
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub jwt_secret: String,
	pub jwt_issuer: String,
	pub jwt_audience: String,
	#[serde(default = "default_token_ttl_secs")]
	pub token_ttl_secs: i64,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Feed {
	#[serde(default = "default_limit")]
	pub default_limit: u32,
	#[serde(default = "max_limit")]
	pub max_limit: u32,
}
impl Default for Feed {
	fn default() -> Self {
		Self { default_limit: default_limit(), max_limit: max_limit() }
	}
}

fn default_token_ttl_secs() -> i64 {
	7 * 24 * 60 * 60
}

fn default_limit() -> u32 {
	20
}

fn max_limit() -> u32 {
	50
}
