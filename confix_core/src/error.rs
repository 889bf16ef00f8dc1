use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum ConfixError {
	#[error(transparent)]
	#[diagnostic(code(confix::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid template expression in `{input}`: {reason}")]
	#[diagnostic(
		code(confix::template_parse),
		help("expressions look like `${{NAME}}`, `${{NAME|upper}}` or `${{NAME|multiply(m=2)}}`")
	)]
	Parse { input: String, reason: String },

	#[error("failed to parse {format} document: {reason}")]
	#[diagnostic(code(confix::document_parse))]
	DocumentParse { format: String, reason: String },

	#[error("cannot convert `{value}` at `{path}` back to {expected}")]
	#[diagnostic(
		code(confix::type_conversion),
		help("the rendered value must keep the type of the value it replaces")
	)]
	TypeConversion {
		path: String,
		value: String,
		expected: String,
	},

	#[error("unsupported value type `{type_name}` at `{path}`")]
	#[diagnostic(
		code(confix::unsupported_type),
		help("only strings, integers, floats and booleans can be templated")
	)]
	UnsupportedType { path: String, type_name: String },

	#[error("filter `{filter}` failed: {reason}")]
	#[diagnostic(code(confix::filter_execution))]
	FilterExecution { filter: String, reason: String },

	#[error("failed to write {format} document: {reason}")]
	#[diagnostic(code(confix::write))]
	Write { format: String, reason: String },

	#[error("output file `{0}` already exists")]
	#[diagnostic(
		code(confix::target_exists),
		help("pass `-w` / `--overwrite` if replacing the file is intended")
	)]
	TargetExists(String),

	#[error("path `{0}` does not resolve to a node in the document")]
	#[diagnostic(code(confix::path_not_found))]
	PathNotFound(String),

	#[error("rejected filter `{name}` from plugin `{plugin}`: {reason}")]
	#[diagnostic(code(confix::plugin))]
	Plugin {
		plugin: String,
		name: String,
		reason: String,
	},

	#[error("unsupported file type: `{0}`")]
	#[diagnostic(
		code(confix::unsupported_file_type),
		help("supported types: json, yaml, yml, xml, properties")
	)]
	UnsupportedFileType(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(confix::config_parse),
		help("check that confix.toml is valid TOML with an optional [extensions] table")
	)]
	ConfigParse(String),
}

pub type ConfixResult<T> = Result<T, ConfixError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
