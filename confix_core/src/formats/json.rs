use std::io::Read;
use std::io::Write;

use serde_json::Value;

use super::ConfigFileHandler;
use super::FileType;
use super::document_error;
use super::not_read;
use super::read_to_string;
use super::write_error;
use crate::ConfigEntry;
use crate::ConfixResult;
use crate::Scalar;
use crate::tree::NodeKind;
use crate::tree::Segment;
use crate::tree::TreeDocument;
use crate::tree::TreeNode;

impl TreeNode for Value {
	fn kind(&self) -> NodeKind {
		match self {
			Value::Object(map) => NodeKind::Map(map.keys().cloned().collect()),
			Value::Array(items) => NodeKind::Sequence(items.len()),
			Value::String(value) => NodeKind::Scalar(Scalar::String(value.clone())),
			Value::Bool(value) => NodeKind::Scalar(Scalar::Bool(*value)),
			Value::Number(number) => {
				match number.as_i64() {
					Some(value) => NodeKind::Scalar(Scalar::Int(value)),
					None => {
						number.as_f64().map_or_else(
							|| NodeKind::Unsupported(format!("number {number}")),
							|value| NodeKind::Scalar(Scalar::Float(value)),
						)
					}
				}
			}
			Value::Null => NodeKind::Unsupported("null".to_string()),
		}
	}

	fn child(&self, segment: &Segment) -> Option<&Self> {
		match (self, segment) {
			(Value::Object(map), Segment::Key(key)) => map.get(key),
			(Value::Array(items), Segment::Index(index)) => items.get(*index),
			_ => None,
		}
	}

	fn child_mut(&mut self, segment: &Segment) -> Option<&mut Self> {
		match (self, segment) {
			(Value::Object(map), Segment::Key(key)) => map.get_mut(key),
			(Value::Array(items), Segment::Index(index)) => items.get_mut(*index),
			_ => None,
		}
	}

	fn set_scalar(&mut self, value: Scalar) {
		*self = match value {
			Scalar::String(value) => Value::String(value),
			Scalar::Int(value) => Value::from(value),
			Scalar::Float(value) => Value::from(value),
			Scalar::Bool(value) => Value::Bool(value),
		};
	}

	fn rename_key(&mut self, old: &str, new: String) -> bool {
		let Value::Object(map) = self else {
			return false;
		};

		if !map.contains_key(old) {
			return false;
		}

		let entries = std::mem::take(map);
		for (key, value) in entries {
			if key == old {
				map.insert(new.clone(), value);
			} else {
				map.insert(key, value);
			}
		}

		true
	}
}

/// JSON documents, written back pretty-printed with two-space indentation.
#[derive(Debug, Default)]
pub struct JsonHandler {
	document: Option<TreeDocument<Value>>,
}

impl ConfigFileHandler for JsonHandler {
	fn read(&mut self, reader: &mut dyn Read) -> ConfixResult<()> {
		let content = read_to_string(reader, FileType::Json)?;
		let root: Value =
			serde_json::from_str(&content).map_err(|e| document_error(FileType::Json, e))?;
		self.document = Some(TreeDocument::new(root)?);

		Ok(())
	}

	fn entries(&mut self) -> Box<dyn Iterator<Item = &mut dyn ConfigEntry> + '_> {
		match self.document.as_mut() {
			Some(document) => Box::new(document.entries_mut()),
			None => Box::new(std::iter::empty::<&mut dyn ConfigEntry>()),
		}
	}

	fn write(&mut self, writer: &mut dyn Write) -> ConfixResult<()> {
		let document = self.document.as_mut().ok_or_else(|| not_read(FileType::Json))?;
		let root = document.apply()?;

		let mut output =
			serde_json::to_string_pretty(root).map_err(|e| write_error(FileType::Json, e))?;
		output.push('\n');
		writer.write_all(output.as_bytes())?;

		Ok(())
	}
}
