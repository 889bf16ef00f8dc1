use std::io::Read;
use std::io::Write;

use serde_yaml_ng::Mapping;
use serde_yaml_ng::Value;

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

/// The text of a mapping key. Only scalar keys can be addressed.
fn key_text(key: &Value) -> Option<String> {
	match key {
		Value::String(value) => Some(value.clone()),
		Value::Number(value) => Some(value.to_string()),
		Value::Bool(value) => Some(value.to_string()),
		_ => None,
	}
}

fn find_mut<'a>(mapping: &'a mut Mapping, key: &str) -> Option<&'a mut Value> {
	mapping
		.iter_mut()
		.find(|(candidate, _)| key_text(candidate).as_deref() == Some(key))
		.map(|(_, value)| value)
}

impl TreeNode for Value {
	fn kind(&self) -> NodeKind {
		match self {
			Value::Mapping(mapping) => {
				let keys: Option<Vec<String>> = mapping.keys().map(key_text).collect();
				keys.map_or_else(
					|| NodeKind::Unsupported("mapping with a non-scalar key".to_string()),
					NodeKind::Map,
				)
			}
			Value::Sequence(items) => NodeKind::Sequence(items.len()),
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
			Value::Tagged(tagged) => NodeKind::Unsupported(format!("tagged value {}", tagged.tag)),
		}
	}

	fn child(&self, segment: &Segment) -> Option<&Self> {
		match (self, segment) {
			(Value::Mapping(mapping), Segment::Key(key)) => {
				mapping
					.iter()
					.find(|(candidate, _)| key_text(candidate).as_deref() == Some(key.as_str()))
					.map(|(_, value)| value)
			}
			(Value::Sequence(items), Segment::Index(index)) => items.get(*index),
			_ => None,
		}
	}

	fn child_mut(&mut self, segment: &Segment) -> Option<&mut Self> {
		match (self, segment) {
			(Value::Mapping(mapping), Segment::Key(key)) => find_mut(mapping, key),
			(Value::Sequence(items), Segment::Index(index)) => items.get_mut(*index),
			_ => None,
		}
	}

	fn set_scalar(&mut self, value: Scalar) {
		*self = match value {
			Scalar::String(value) => Value::String(value),
			Scalar::Int(value) => Value::Number(value.into()),
			Scalar::Float(value) => Value::Number(value.into()),
			Scalar::Bool(value) => Value::Bool(value),
		};
	}

	fn rename_key(&mut self, old: &str, new: String) -> bool {
		let Value::Mapping(mapping) = self else {
			return false;
		};

		if find_mut(mapping, old).is_none() {
			return false;
		}

		let entries = std::mem::take(mapping);
		for (key, value) in entries {
			if key_text(&key).as_deref() == Some(old) {
				mapping.insert(Value::String(new.clone()), value);
			} else {
				mapping.insert(key, value);
			}
		}

		true
	}
}

/// YAML documents, written back through the canonical emitter.
#[derive(Debug, Default)]
pub struct YamlHandler {
	document: Option<TreeDocument<Value>>,
}

impl ConfigFileHandler for YamlHandler {
	fn read(&mut self, reader: &mut dyn Read) -> ConfixResult<()> {
		let content = read_to_string(reader, FileType::Yaml)?;
		let root: Value =
			serde_yaml_ng::from_str(&content).map_err(|e| document_error(FileType::Yaml, e))?;
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
		let document = self.document.as_mut().ok_or_else(|| not_read(FileType::Yaml))?;
		let root = document.apply()?;

		let output = serde_yaml_ng::to_string(root).map_err(|e| write_error(FileType::Yaml, e))?;
		writer.write_all(output.as_bytes())?;

		Ok(())
	}
}
