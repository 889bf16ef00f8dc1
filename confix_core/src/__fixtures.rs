use std::collections::HashMap;
use std::sync::Arc;

use crate::ConfigFileHandler;
use crate::ConfixResult;
use crate::FileType;
use crate::Filter;
use crate::FilterFactory;
use crate::FilterParams;
use crate::FilterPlugin;
use crate::FilterRegistry;
use crate::Scalar;
use crate::TemplateEngine;
use crate::handler_for;
use crate::render_entries;

pub fn variables() -> HashMap<String, String> {
	[
		("X", "123"),
		("ABC", "abc"),
		("SPACED", " a bc "),
		("LONG", "adgadgadgqadg"),
		("TEST1", "http://url.tld"),
		("TEST2", "path"),
		("TEST3", "something"),
		("DB_HOST", "db.internal"),
		("DB_PORT", "5432"),
		("ENVIRONMENT", "production"),
		("RATIO", "0.75"),
		("OUTER", "outer"),
		("INNER", "inner"),
	]
	.into_iter()
	.map(|(key, value)| (key.to_string(), value.to_string()))
	.collect()
}

pub fn engine() -> TemplateEngine {
	TemplateEngine::new(FilterRegistry::with_builtins()).with_variables(variables())
}

pub fn engine_with(extra: &[(&str, &str)]) -> TemplateEngine {
	let mut variables = variables();
	for (key, value) in extra {
		variables.insert((*key).to_string(), (*value).to_string());
	}
	TemplateEngine::new(FilterRegistry::with_builtins()).with_variables(variables)
}

/// Run `input` through the handler for `file_type` and return the written
/// document.
pub fn process_str(file_type: FileType, input: &str, engine: &TemplateEngine) -> ConfixResult<String> {
	let mut handler = handler_for(file_type, engine);
	handler.read(&mut input.as_bytes())?;
	render_entries(handler.as_mut(), engine)?;

	let mut output = Vec::new();
	handler.write(&mut output)?;

	Ok(String::from_utf8_lossy(&output).into_owned())
}

/// `(path, value)` of every entry after reading `input`.
pub fn entry_paths(handler: &mut dyn ConfigFileHandler, input: &str) -> ConfixResult<Vec<(String, String)>> {
	handler.read(&mut input.as_bytes())?;
	Ok(handler
		.entries()
		.map(|entry| (entry.path(), entry.value()))
		.collect())
}

pub const JSON_DOCUMENT: &str = r#"{
  "name": "${DB_HOST}",
  "port": 8080,
  "replicas": "${X|to_int|multiply(m=2)}",
  "${ENVIRONMENT}": {
    "url": "jdbc://${DB_HOST}:${DB_PORT}/app",
    "enabled": true
  },
  "tags": ["${ABC|upper}", "static"]
}
"#;

pub const YAML_DOCUMENT: &str = r#"server:
  host: "${DB_HOST}"
  port: 8080
  debug: false
"${ENVIRONMENT}":
  replicas: "${X}"
  ratio: 0.5
items:
  - "${ABC|upper}"
  - plain
"#;

pub const XML_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<config env="${ENVIRONMENT}">
  <!-- database -->
  <database host="${DB_HOST}" port="${DB_PORT}">
    <name>${ABC|upper}</name>
    <options><![CDATA[{"ratio": "${RATIO}", "tags": ["a", "b"]}]]></options>
  </database>
  <static>unchanged &amp; kept</static>
  <empty/>
</config>
"#;

pub const PROPERTIES_DOCUMENT: &str = "# database settings
db.host=${DB_HOST}
db.port : ${DB_PORT}
name ${ABC|upper}
plain=value
";

/// Reverses the characters of the string form.
#[derive(Debug, Default)]
pub struct ReverseFilter;

impl Filter for ReverseFilter {
	fn process(&self, value: Scalar) -> ConfixResult<Scalar> {
		Ok(Scalar::String(value.into_string().chars().rev().collect()))
	}
}

/// Prefixes the string form with the `with` parameter.
#[derive(Debug, Default)]
pub struct PrefixFilter {
	prefix: String,
}

impl Filter for PrefixFilter {
	fn process(&self, value: Scalar) -> ConfixResult<Scalar> {
		Ok(Scalar::String(format!("{}{value}", self.prefix)))
	}

	fn accept_params(&mut self, params: &FilterParams) {
		self.prefix = params.get("with").cloned().unwrap_or_default();
	}
}

pub fn reverse_factory() -> FilterFactory {
	Arc::new(|| -> Box<dyn Filter> { Box::new(ReverseFilter) })
}

pub fn prefix_factory() -> FilterFactory {
	Arc::new(|| -> Box<dyn Filter> { Box::new(PrefixFilter::default()) })
}

/// Contributes one valid filter and three that must be rejected.
pub struct SamplePlugin;

impl FilterPlugin for SamplePlugin {
	fn name(&self) -> &str {
		"sample"
	}

	fn filters(&self) -> Vec<(String, FilterFactory)> {
		vec![
			("reverse".to_string(), reverse_factory()),
			("upper".to_string(), reverse_factory()),
			(String::new(), reverse_factory()),
			("bad|name".to_string(), reverse_factory()),
		]
	}
}

pub struct PrefixPlugin;

impl FilterPlugin for PrefixPlugin {
	fn name(&self) -> &str {
		"prefix"
	}

	fn filters(&self) -> Vec<(String, FilterFactory)> {
		vec![("prefix".to_string(), prefix_factory())]
	}
}
