mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Feed, Isolation, Postgres, Security, Service, Storage};

use std::{fs, path::Path};

/// Hard ceiling for any page size a deployment may configure.
pub const MAX_PAGE_LIMIT: u32 = 100;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("security.jwt_secret", &cfg.security.jwt_secret),
		("security.jwt_issuer", &cfg.security.jwt_issuer),
		("security.jwt_audience", &cfg.security.jwt_audience),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.security.token_ttl_secs <= 0 {
		return Err(Error::Validation {
			message: "security.token_ttl_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.feed.default_limit == 0 {
		return Err(Error::Validation {
			message: "feed.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.feed.default_limit > cfg.feed.max_limit {
		return Err(Error::Validation {
			message: "feed.default_limit must not exceed feed.max_limit.".to_string(),
		});
	}
	if cfg.feed.max_limit > MAX_PAGE_LIMIT {
		return Err(Error::Validation {
			message: format!("feed.max_limit must be {MAX_PAGE_LIMIT} or less."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	cfg.security.jwt_issuer = cfg.security.jwt_issuer.trim().to_string();
	cfg.security.jwt_audience = cfg.security.jwt_audience.trim().to_string();
}
