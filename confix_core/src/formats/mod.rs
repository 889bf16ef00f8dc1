use std::collections::HashMap;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use json::JsonHandler;
pub use properties::PropertiesHandler;
pub use xml::XmlHandler;
pub use yaml::YamlHandler;

use crate::ConfigEntry;
use crate::ConfixError;
use crate::ConfixResult;
use crate::TemplateEngine;

mod json;
mod properties;
mod xml;
mod yaml;

/// Supported configuration formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum FileType {
	Json,
	Yaml,
	Xml,
	Properties,
}

impl FileType {
	pub const ALL: [FileType; 4] = [Self::Json, Self::Yaml, Self::Xml, Self::Properties];

	/// Infer the type from the extension of `path`. `aliases` maps extra
	/// extensions (without the dot) to a type and takes precedence.
	pub fn from_path<S: std::hash::BuildHasher>(
		path: &Path,
		aliases: &HashMap<String, FileType, S>,
	) -> ConfixResult<Self> {
		let extension = path
			.extension()
			.and_then(|extension| extension.to_str())
			.unwrap_or_default()
			.to_ascii_lowercase();

		if let Some(file_type) = aliases.get(&extension) {
			return Ok(*file_type);
		}

		extension.parse()
	}
}

impl std::fmt::Display for FileType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Json => write!(f, "json"),
			Self::Yaml => write!(f, "yaml"),
			Self::Xml => write!(f, "xml"),
			Self::Properties => write!(f, "properties"),
		}
	}
}

impl FromStr for FileType {
	type Err = ConfixError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.to_ascii_lowercase().as_str() {
			"json" => Ok(Self::Json),
			"yaml" | "yml" => Ok(Self::Yaml),
			"xml" => Ok(Self::Xml),
			"properties" => Ok(Self::Properties),
			_ => Err(ConfixError::UnsupportedFileType(value.to_string())),
		}
	}
}

impl TryFrom<String> for FileType {
	type Error = ConfixError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// Reads one document, exposes its templatable entries and writes it back.
///
/// A handler is used for exactly one read → template → write cycle.
pub trait ConfigFileHandler {
	/// Parse the document from `reader`.
	fn read(&mut self, reader: &mut dyn Read) -> ConfixResult<()>;

	/// The entries of the parsed document, in document order.
	fn entries(&mut self) -> Box<dyn Iterator<Item = &mut dyn ConfigEntry> + '_>;

	/// Serialize the document with every edited entry applied.
	fn write(&mut self, writer: &mut dyn Write) -> ConfixResult<()>;
}

/// The handler for `file_type`. XML templates CDATA sections while reading,
/// so it borrows the engine.
pub fn handler_for(file_type: FileType, engine: &TemplateEngine) -> Box<dyn ConfigFileHandler + '_> {
	match file_type {
		FileType::Json => Box::new(JsonHandler::default()),
		FileType::Yaml => Box::new(YamlHandler::default()),
		FileType::Xml => Box::new(XmlHandler::new(engine)),
		FileType::Properties => Box::new(PropertiesHandler::default()),
	}
}

fn read_to_string(reader: &mut dyn Read, format: FileType) -> ConfixResult<String> {
	let mut content = String::new();
	reader.read_to_string(&mut content).map_err(|e| {
		ConfixError::DocumentParse {
			format: format.to_string(),
			reason: e.to_string(),
		}
	})?;
	Ok(content)
}

fn document_error(format: FileType, reason: impl std::fmt::Display) -> ConfixError {
	ConfixError::DocumentParse {
		format: format.to_string(),
		reason: reason.to_string(),
	}
}

fn write_error(format: FileType, reason: impl std::fmt::Display) -> ConfixError {
	ConfixError::Write {
		format: format.to_string(),
		reason: reason.to_string(),
	}
}

/// Error for handlers asked to write or iterate before `read`.
fn not_read(format: FileType) -> ConfixError {
	write_error(format, "no document has been read")
}
