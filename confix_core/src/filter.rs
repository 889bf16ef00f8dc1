use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use md5::Digest;
use md5::Md5;

use crate::ConfixError;
use crate::ConfixResult;
use crate::Scalar;

/// Keyword arguments bound to a filter, e.g. `m=2` in `multiply(m=2)`.
pub type FilterParams = BTreeMap<String, String>;

/// Builds a fresh filter instance. Every expression gets its own instances so
/// parameters bound by one expression never leak into another.
pub type FilterFactory = Arc<dyn Fn() -> Box<dyn Filter> + Send + Sync>;

/// Bytes accepted by bcrypt before it would silently truncate the input.
pub const BCRYPT_MAX_INPUT_LEN: usize = 72;

/// A named, chainable value transformation.
pub trait Filter {
	/// Transform `value` into the next value of the chain.
	fn process(&self, value: Scalar) -> ConfixResult<Scalar>;

	/// Bind keyword arguments. Called at most once, before [`Filter::process`].
	/// Filters that take no arguments ignore them.
	fn accept_params(&mut self, _params: &FilterParams) {}
}

/// Where the leading token of an expression is looked up.
pub trait VariableSource {
	fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads variables from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl VariableSource for ProcessEnvironment {
	fn lookup(&self, name: &str) -> Option<String> {
		std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
	}
}

impl<S: std::hash::BuildHasher> VariableSource for HashMap<String, String, S> {
	fn lookup(&self, name: &str) -> Option<String> {
		self.get(name).cloned()
	}
}

/// Replaces the incoming value with the named variable. An unset variable
/// resolves to an empty string.
pub struct EnvironmentFilter<'a> {
	name: String,
	source: &'a dyn VariableSource,
}

impl<'a> EnvironmentFilter<'a> {
	pub fn new(name: impl Into<String>, source: &'a dyn VariableSource) -> Self {
		Self {
			name: name.into(),
			source,
		}
	}
}

impl Filter for EnvironmentFilter<'_> {
	fn process(&self, _value: Scalar) -> ConfixResult<Scalar> {
		Ok(Scalar::String(
			self.source.lookup(&self.name).unwrap_or_default(),
		))
	}
}

/// Dereferences `@path` values into the contents of the file at `path`.
/// Values whose path does not exist pass through untouched, `@` included.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileReferenceFilter;

impl Filter for FileReferenceFilter {
	fn process(&self, value: Scalar) -> ConfixResult<Scalar> {
		let Scalar::String(text) = &value else {
			return Ok(value);
		};

		let Some(path) = text.strip_prefix('@') else {
			return Ok(value);
		};

		if !Path::new(path).exists() {
			return Ok(value);
		}

		let content = std::fs::read_to_string(path).map_err(|e| {
			ConfixError::FilterExecution {
				filter: "file".to_string(),
				reason: format!("failed to read `{path}`: {e}"),
			}
		})?;

		Ok(Scalar::String(content))
	}
}

/// Stand-in for filter names nobody registered. The value passes through.
#[derive(Debug, Clone)]
pub struct PassthroughFilter {
	pub name: String,
}

impl Filter for PassthroughFilter {
	fn process(&self, value: Scalar) -> ConfixResult<Scalar> {
		Ok(value)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuiltinFilterType {
	/// Uppercase the string form.
	Upper,
	/// Lowercase the string form.
	Lower,
	/// Strip leading and trailing whitespace.
	Trim,
	/// Strip leading spaces.
	TrimLeft,
	/// Strip trailing spaces.
	TrimRight,
	/// Parse a base-10 integer.
	ToInt,
	/// Multiply an integer by the `m` parameter (default `1`).
	Multiply,
	/// Lowercase hex MD5 digest.
	Md5,
	/// Bcrypt hash at the default cost.
	Bcrypt,
}

impl BuiltinFilterType {
	pub const ALL: [BuiltinFilterType; 9] = [
		Self::Upper,
		Self::Lower,
		Self::Trim,
		Self::TrimLeft,
		Self::TrimRight,
		Self::ToInt,
		Self::Multiply,
		Self::Md5,
		Self::Bcrypt,
	];
}

impl std::fmt::Display for BuiltinFilterType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Upper => write!(f, "upper"),
			Self::Lower => write!(f, "lower"),
			Self::Trim => write!(f, "trim"),
			Self::TrimLeft => write!(f, "trimleft"),
			Self::TrimRight => write!(f, "trimright"),
			Self::ToInt => write!(f, "to_int"),
			Self::Multiply => write!(f, "multiply"),
			Self::Md5 => write!(f, "md5"),
			Self::Bcrypt => write!(f, "bcrypt"),
		}
	}
}

/// One of the filters that ship with confix, together with its bound
/// parameters.
#[derive(Debug, Clone)]
pub struct BuiltinFilter {
	pub r#type: BuiltinFilterType,
	pub params: FilterParams,
}

impl BuiltinFilter {
	pub fn new(r#type: BuiltinFilterType) -> Self {
		Self {
			r#type,
			params: FilterParams::new(),
		}
	}

	fn failure(&self, reason: impl Into<String>) -> ConfixError {
		ConfixError::FilterExecution {
			filter: self.r#type.to_string(),
			reason: reason.into(),
		}
	}
}

impl Filter for BuiltinFilter {
	fn process(&self, value: Scalar) -> ConfixResult<Scalar> {
		let result = match self.r#type {
			BuiltinFilterType::Upper => Scalar::String(value.into_string().to_uppercase()),
			BuiltinFilterType::Lower => Scalar::String(value.into_string().to_lowercase()),
			BuiltinFilterType::Trim => Scalar::String(value.into_string().trim().to_string()),
			BuiltinFilterType::TrimLeft => {
				Scalar::String(value.into_string().trim_start_matches(' ').to_string())
			}
			BuiltinFilterType::TrimRight => {
				Scalar::String(value.into_string().trim_end_matches(' ').to_string())
			}
			BuiltinFilterType::ToInt => {
				match value {
					Scalar::Int(number) => Scalar::Int(number),
					other => {
						let text = other.into_string();
						let number = text
							.parse::<i64>()
							.map_err(|e| self.failure(format!("`{text}` is not an integer: {e}")))?;
						Scalar::Int(number)
					}
				}
			}
			BuiltinFilterType::Multiply => {
				let multiplier = self.params.get("m").map_or("1", String::as_str);
				let multiplier = multiplier.parse::<i64>().map_err(|e| {
					self.failure(format!("parameter `m={multiplier}` is not an integer: {e}"))
				})?;
				let Scalar::Int(number) = value else {
					return Err(self.failure(format!(
						"expected an integer input, got {} `{value}`",
						value.type_name()
					)));
				};
				let product = number
					.checked_mul(multiplier)
					.ok_or_else(|| self.failure(format!("{number} * {multiplier} overflows")))?;
				Scalar::Int(product)
			}
			BuiltinFilterType::Md5 => {
				let digest = Md5::digest(value.into_string().as_bytes());
				Scalar::String(hex::encode(digest))
			}
			BuiltinFilterType::Bcrypt => {
				let text = value.into_string();
				if text.len() > BCRYPT_MAX_INPUT_LEN {
					return Err(self.failure(format!(
						"input is {} bytes, bcrypt accepts at most {BCRYPT_MAX_INPUT_LEN}",
						text.len()
					)));
				}
				let hash = bcrypt::hash(text.as_bytes(), bcrypt::DEFAULT_COST)
					.map_err(|e| self.failure(e.to_string()))?;
				Scalar::String(hash)
			}
		};

		Ok(result)
	}

	fn accept_params(&mut self, params: &FilterParams) {
		self.params.clone_from(params);
	}
}

/// Supplies filters from outside the crate, e.g. from a dynamically loaded
/// library.
pub trait FilterPlugin {
	/// Name used when reporting rejected registrations.
	fn name(&self) -> &str;
	/// The filters this plugin contributes, by name.
	fn filters(&self) -> Vec<(String, FilterFactory)>;
}

/// Name → factory table consulted when building filter chains.
///
/// Built once at startup. After that it is only read.
#[derive(Clone, Default)]
pub struct FilterRegistry {
	factories: HashMap<String, FilterFactory>,
}

impl std::fmt::Debug for FilterRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut names = self.names();
		names.sort_unstable();
		f.debug_struct("FilterRegistry")
			.field("filters", &names)
			.finish()
	}
}

impl FilterRegistry {
	/// A registry without any filters.
	pub fn empty() -> Self {
		Self::default()
	}

	/// A registry holding every [`BuiltinFilterType`].
	pub fn with_builtins() -> Self {
		let mut registry = Self::empty();
		for r#type in BuiltinFilterType::ALL {
			registry.register(
				r#type.to_string(),
				Arc::new(move || -> Box<dyn Filter> { Box::new(BuiltinFilter::new(r#type)) }),
			);
		}
		registry
	}

	/// Register `factory` under `name`, replacing any previous registration.
	pub fn register(&mut self, name: impl Into<String>, factory: FilterFactory) {
		self.factories.insert(name.into(), factory);
	}

	pub fn contains(&self, name: &str) -> bool {
		self.factories.contains_key(name)
	}

	pub fn names(&self) -> Vec<&str> {
		self.factories.keys().map(String::as_str).collect()
	}

	/// Build a filter for `name` with `params` bound. Unknown names produce a
	/// [`PassthroughFilter`].
	pub fn instantiate(&self, name: &str, params: &FilterParams) -> Box<dyn Filter> {
		let mut filter: Box<dyn Filter> = match self.factories.get(name) {
			Some(factory) => factory(),
			None => {
				tracing::debug!(filter = name, "unknown filter, passing value through");
				Box::new(PassthroughFilter {
					name: name.to_string(),
				})
			}
		};

		if !params.is_empty() {
			filter.accept_params(params);
		}

		filter
	}

	/// Register filters supplied by a plugin. Existing names are never
	/// overwritten. Each rejected filter is logged and skipped, and the
	/// rejections are returned.
	pub fn add_plugin_filters(
		&mut self,
		plugin: &str,
		filters: impl IntoIterator<Item = (String, FilterFactory)>,
	) -> Vec<ConfixError> {
		let mut rejected = Vec::new();

		for (name, factory) in filters {
			let reason = if !is_valid_filter_name(&name) {
				Some("name must be a non-empty run of characters outside `|(),=\"'` and whitespace")
			} else if self.contains(&name) {
				Some("a filter with this name is already registered")
			} else {
				None
			};

			if let Some(reason) = reason {
				let error = ConfixError::Plugin {
					plugin: plugin.to_string(),
					name,
					reason: reason.to_string(),
				};
				tracing::warn!("{error}");
				rejected.push(error);
				continue;
			}

			tracing::debug!(plugin, filter = %name, "registered plugin filter");
			self.register(name, factory);
		}

		rejected
	}

	/// Register the filters of every plugin in turn.
	pub fn load_plugins<'p>(
		&mut self,
		plugins: impl IntoIterator<Item = &'p dyn FilterPlugin>,
	) -> Vec<ConfixError> {
		let mut rejected = Vec::new();
		for plugin in plugins {
			rejected.extend(self.add_plugin_filters(plugin.name(), plugin.filters()));
		}
		rejected
	}
}

/// Filter names must survive a round trip through the template syntax.
pub fn is_valid_filter_name(name: &str) -> bool {
	!name.is_empty()
		&& !name
			.chars()
			.any(|ch| ch.is_whitespace() || matches!(ch, '|' | '(' | ')' | ',' | '=' | '"' | '\'' | '{' | '}'))
}
