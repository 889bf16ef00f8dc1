use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::ConfixError;
use crate::ConfixResult;
use crate::FileType;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["confix.toml", ".confix.toml", ".config/confix.toml"];

/// Configuration loaded from a `confix.toml` file.
///
/// ```toml
/// log_level = "info"
///
/// [extensions]
/// conf = "properties"
/// jsonc = "json"
/// ```
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ConfixConfig {
	/// Log level used when `--log-level` is not passed.
	#[serde(default)]
	pub log_level: Option<String>,
	/// Extra file extensions, without the leading dot, and the format they
	/// are read as. These take precedence over the built-in extensions.
	#[serde(default)]
	pub extensions: HashMap<String, FileType>,
}

impl ConfixConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> ConfixResult<Option<ConfixConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_file(&config_path).map(Some)
	}

	/// Load the config from an explicit path.
	pub fn load_file(path: &Path) -> ConfixResult<ConfixConfig> {
		let content = std::fs::read_to_string(path)?;
		Self::parse(&content)
	}

	pub fn parse(content: &str) -> ConfixResult<ConfixConfig> {
		let mut config: ConfixConfig =
			toml::from_str(content).map_err(|e| ConfixError::ConfigParse(e.to_string()))?;

		config.extensions = config
			.extensions
			.into_iter()
			.map(|(extension, file_type)| {
				(
					extension.trim_start_matches('.').to_ascii_lowercase(),
					file_type,
				)
			})
			.collect();

		Ok(config)
	}
}
