use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::ConfigFileHandler;
use crate::ConfixError;
use crate::ConfixResult;
use crate::FileType;
use crate::TemplateEngine;
use crate::handler_for;

/// Drives one file through read → template → write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProcessor {
	path: PathBuf,
	file_type: FileType,
}

impl FileProcessor {
	/// A processor for `path`. Without an explicit `file_type` the type is
	/// inferred from the extension.
	pub fn new(path: impl Into<PathBuf>, file_type: Option<FileType>) -> ConfixResult<Self> {
		Self::with_extensions(path, file_type, &HashMap::new())
	}

	/// Like [`FileProcessor::new`], consulting `extensions` before the
	/// built-in extension table.
	pub fn with_extensions<S: std::hash::BuildHasher>(
		path: impl Into<PathBuf>,
		file_type: Option<FileType>,
		extensions: &HashMap<String, FileType, S>,
	) -> ConfixResult<Self> {
		let path = path.into();
		let file_type = match file_type {
			Some(file_type) => file_type,
			None => FileType::from_path(&path, extensions)?,
		};

		Ok(Self { path, file_type })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn file_type(&self) -> FileType {
		self.file_type
	}

	/// Process the file and write the result to `output`.
	pub fn process(&self, engine: &TemplateEngine, output: &mut dyn Write) -> ConfixResult<()> {
		let mut handler = handler_for(self.file_type, engine);

		{
			let file = File::open(&self.path)?;
			let mut reader = BufReader::new(file);
			handler.read(&mut reader)?;
		}

		let edited = render_entries(handler.as_mut(), engine)?;
		tracing::info!(
			path = %self.path.display(),
			file_type = %self.file_type,
			edited,
			"rendered file"
		);

		handler.write(output)
	}

	/// Process the file into a buffer. Nothing is written anywhere unless the
	/// whole run succeeds.
	pub fn render(&self, engine: &TemplateEngine) -> ConfixResult<Vec<u8>> {
		let mut buffer = Vec::new();
		self.process(engine, &mut buffer)?;
		Ok(buffer)
	}
}

/// Template every entry of `handler` that was not rendered while reading and
/// return how many changed.
pub fn render_entries(handler: &mut dyn ConfigFileHandler, engine: &TemplateEngine) -> ConfixResult<usize> {
	let mut edited = 0;

	for entry in handler.entries() {
		if entry.is_rendered() {
			continue;
		}

		let value = entry.value();
		let rendered = engine.render(&value)?;
		entry.set_rendered(rendered);

		if entry.is_edited() {
			edited += 1;
			tracing::debug!(path = %entry.path(), "templated entry");
		}
	}

	Ok(edited)
}

/// Where rendered output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
	Stdout,
	File {
		path: PathBuf,
		/// Replacing an existing file requires explicit permission.
		overwrite: bool,
	},
}

impl OutputTarget {
	/// Parse a command-line output argument. `-` is standard output.
	pub fn from_arg(output: &str, overwrite: bool) -> Self {
		if output == "-" {
			Self::Stdout
		} else {
			Self::File {
				path: PathBuf::from(output),
				overwrite,
			}
		}
	}

	/// Fail with [`ConfixError::TargetExists`] when writing would replace a
	/// file without permission.
	pub fn ensure_writable(&self) -> ConfixResult<()> {
		match self {
			Self::File {
				path,
				overwrite: false,
			} if path.exists() => Err(ConfixError::TargetExists(path.display().to_string())),
			_ => Ok(()),
		}
	}

	pub fn write_output(&self, content: &[u8]) -> ConfixResult<()> {
		self.ensure_writable()?;

		match self {
			Self::Stdout => {
				let mut stdout = std::io::stdout().lock();
				stdout.write_all(content)?;
				stdout.flush()?;
			}
			Self::File { path, .. } => {
				std::fs::write(path, content)?;
				tracing::debug!(path = %path.display(), bytes = content.len(), "wrote output");
			}
		}

		Ok(())
	}
}
