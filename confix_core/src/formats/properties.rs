use std::io::Read;
use std::io::Write;

use encoding_rs::UTF_8;
use java_properties::PropertiesIter;
use java_properties::PropertiesWriter;

use super::ConfigFileHandler;
use super::FileType;
use super::document_error;
use super::write_error;
use crate::ConfigEntry;
use crate::ConfixResult;
use crate::PropertyEntry;

pub const KEY_VALUE_SEPARATOR: &str = " = ";

/// Java properties files, kept as an ordered table. A key that appears more
/// than once keeps its first position and its last value. Files are read and
/// written as UTF-8.
#[derive(Debug, Default)]
pub struct PropertiesHandler {
	entries: Vec<PropertyEntry>,
}

impl ConfigFileHandler for PropertiesHandler {
	fn read(&mut self, reader: &mut dyn Read) -> ConfixResult<()> {
		let mut entries: Vec<PropertyEntry> = vec![];

		PropertiesIter::new_with_encoding(reader, UTF_8)
			.read_into(|key, value| {
				match entries.iter_mut().find(|entry| entry.key() == key) {
					Some(entry) => *entry = PropertyEntry::new(key, value),
					None => entries.push(PropertyEntry::new(key, value)),
				}
			})
			.map_err(|e| document_error(FileType::Properties, e))?;

		self.entries = entries;
		Ok(())
	}

	fn entries(&mut self) -> Box<dyn Iterator<Item = &mut dyn ConfigEntry> + '_> {
		Box::new(
			self.entries
				.iter_mut()
				.map(|entry| entry as &mut dyn ConfigEntry),
		)
	}

	fn write(&mut self, writer: &mut dyn Write) -> ConfixResult<()> {
		let mut properties = PropertiesWriter::new_with_encoding(writer, UTF_8);
		properties
			.set_kv_separator(KEY_VALUE_SEPARATOR)
			.map_err(|e| write_error(FileType::Properties, e))?;

		for entry in &self.entries {
			properties
				.write(entry.key(), &entry.value())
				.map_err(|e| write_error(FileType::Properties, e))?;
		}

		properties
			.finish()
			.map_err(|e| write_error(FileType::Properties, e))?;

		Ok(())
	}
}
