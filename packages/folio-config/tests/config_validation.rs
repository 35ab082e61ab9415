use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use folio_config::{Config, Error, Isolation};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("folio_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> folio_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = folio_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation(payload: String, needle: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");
	assert!(message.contains(needle), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
		.expect("Sample config must be valid.");

	assert_eq!(cfg.storage.postgres.isolation, Isolation::RepeatableRead);
	assert_eq!(cfg.feed.default_limit, 20);
	assert_eq!(cfg.feed.max_limit, 50);
	assert_eq!(cfg.security.token_ttl_secs, 604_800);
}

#[test]
fn feed_section_is_optional() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove("feed");

	let cfg: Config =
		toml::from_str(&toml::to_string(&root).expect("Failed to render template config."))
			.expect("Failed to parse config without [feed].");

	assert_eq!(cfg.feed.default_limit, 20);
	assert_eq!(cfg.feed.max_limit, 50);
	assert!(folio_config::validate(&cfg).is_ok());
}

#[test]
fn isolation_rejects_unknown_level() {
	let payload = sample_toml_with(
		"storage.postgres",
		"isolation",
		Value::String("snapshot".to_string()),
	);
	let err = load_payload(payload).expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error kind: {err:?}");
}

#[test]
fn pool_size_must_be_positive() {
	expect_validation(
		sample_toml_with("storage.postgres", "pool_max_conns", Value::Integer(0)),
		"storage.postgres.pool_max_conns must be greater than zero.",
	);
}

#[test]
fn jwt_secret_must_be_non_empty() {
	expect_validation(
		sample_toml_with("security", "jwt_secret", Value::String("   ".to_string())),
		"security.jwt_secret must be non-empty.",
	);
}

#[test]
fn token_ttl_must_be_positive() {
	expect_validation(
		sample_toml_with("security", "token_ttl_secs", Value::Integer(0)),
		"security.token_ttl_secs must be greater than zero.",
	);
}

#[test]
fn default_limit_cannot_exceed_max_limit() {
	expect_validation(
		sample_toml_with("feed", "default_limit", Value::Integer(60)),
		"feed.default_limit must not exceed feed.max_limit.",
	);
}

#[test]
fn max_limit_has_a_hard_ceiling() {
	expect_validation(
		sample_toml_with("feed", "max_limit", Value::Integer(500)),
		"feed.max_limit must be 100 or less.",
	);
}

#[test]
fn blank_log_level_falls_back_to_info() {
	let cfg = load_payload(sample_toml_with("service", "log_level", Value::String(String::new())))
		.expect("Config must load.");

	assert_eq!(cfg.service.log_level, "info");
}
