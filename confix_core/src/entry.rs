use crate::Scalar;

/// A single templatable location in a configuration document.
///
/// Handlers hand out entries for every key and value they can rewrite. The
/// processor renders [`ConfigEntry::value`] and stores the result with
/// [`ConfigEntry::set_rendered`]. Only entries that end up edited are written
/// back.
pub trait ConfigEntry {
	/// The local name: a map key, attribute name, element name or property
	/// key.
	fn key(&self) -> &str;

	/// Format-specific address of the entry, unique within one document.
	fn path(&self) -> String;

	/// The text that gets templated.
	fn value(&self) -> String;

	/// Store a new string value. Marks the entry edited when `value` differs
	/// from the current value.
	fn set_value(&mut self, value: String);

	/// Store a rendered scalar. Entries that can hold typed values keep the
	/// type, everything else stores the string form.
	fn set_rendered(&mut self, value: Scalar) {
		self.set_value(value.into_string());
	}

	fn is_edited(&self) -> bool;

	/// Entries whose value was already rendered while the document was read.
	/// The processor leaves them alone.
	fn is_rendered(&self) -> bool {
		false
	}
}

/// A flat key/value entry, used by the properties handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
	key: String,
	value: String,
	edited: bool,
}

impl PropertyEntry {
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
			edited: false,
		}
	}
}

impl ConfigEntry for PropertyEntry {
	fn key(&self) -> &str {
		&self.key
	}

	fn path(&self) -> String {
		self.key.clone()
	}

	fn value(&self) -> String {
		self.value.clone()
	}

	fn set_value(&mut self, value: String) {
		if value != self.value {
			self.value = value;
			self.edited = true;
		}
	}

	fn is_edited(&self) -> bool {
		self.edited
	}
}
