//! Reversible flattening of nested documents.
//!
//! JSON and YAML documents are walked depth first into a flat list of
//! [`HierarchicalEntry`] values, one per map key and one per scalar leaf.
//! After templating, [`apply`] writes the edited entries back into the same
//! tree: values first, then key renames from the deepest key upwards so that
//! no rename invalidates a path that is still pending. Keys that render to an
//! empty string are not renamed.

use std::fmt::Display;

use derive_more::Deref;
use derive_more::DerefMut;

use crate::ConfigEntry;
use crate::ConfixError;
use crate::ConfixResult;
use crate::Scalar;

/// One step of a [`Hierarchy`].
///
/// Map keys and sequence indices are kept apart so that a map key `"0"` is
/// never mistaken for the first element of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
	Key(String),
	Index(usize),
}

impl Display for Segment {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Segment::Key(key) => write!(f, "{key}"),
			Segment::Index(index) => write!(f, "{index}"),
		}
	}
}

/// Segments leading from the document root to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deref, DerefMut)]
pub struct Hierarchy(Vec<Segment>);

impl Hierarchy {
	pub fn root() -> Self {
		Self::default()
	}

	/// A new hierarchy one level below `self`.
	#[must_use]
	pub fn child(&self, segment: Segment) -> Self {
		let mut segments = self.0.clone();
		segments.push(segment);
		Self(segments)
	}

	/// Everything but the last segment.
	pub fn parent(&self) -> Option<Self> {
		let (_, parent) = self.0.split_last()?;
		Some(Self(parent.to_vec()))
	}
}

impl From<Vec<Segment>> for Hierarchy {
	fn from(segments: Vec<Segment>) -> Self {
		Self(segments)
	}
}

/// The canonical path: segments joined by `.`.
impl Display for Hierarchy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for (index, segment) in self.0.iter().enumerate() {
			if index > 0 {
				write!(f, ".")?;
			}
			write!(f, "{segment}")?;
		}
		Ok(())
	}
}

/// What a [`TreeNode`] holds, as far as the walker is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	/// A map, with its keys in document order.
	Map(Vec<String>),
	/// A sequence of the given length.
	Sequence(usize),
	Scalar(Scalar),
	/// Anything that cannot be templated, described by name.
	Unsupported(String),
}

/// A node of a plain value tree such as `serde_json::Value` or
/// `serde_yaml_ng::Value`.
pub trait TreeNode: Sized {
	fn kind(&self) -> NodeKind;

	fn child(&self, segment: &Segment) -> Option<&Self>;

	fn child_mut(&mut self, segment: &Segment) -> Option<&mut Self>;

	/// Replace this node with a scalar.
	fn set_scalar(&mut self, value: Scalar);

	/// Rename the key `old` of this map to `new`, keeping its position.
	/// Returns `false` when this node is not a map or has no key `old`.
	fn rename_key(&mut self, old: &str, new: String) -> bool;
}

/// The node reached by following `hierarchy` from `root`.
pub fn resolve<'a, N: TreeNode>(root: &'a N, hierarchy: &Hierarchy) -> Option<&'a N> {
	hierarchy
		.iter()
		.try_fold(root, |node, segment| node.child(segment))
}

pub fn resolve_mut<'a, N: TreeNode>(root: &'a mut N, hierarchy: &Hierarchy) -> Option<&'a mut N> {
	hierarchy
		.iter()
		.try_fold(root, |node, segment| node.child_mut(segment))
}

/// A scalar leaf. The rendered text is converted back to the type of the
/// original scalar on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueEntry {
	pub hierarchy: Hierarchy,
	pub original: Scalar,
	value: String,
	edited: bool,
}

impl ValueEntry {
	pub fn new(hierarchy: Hierarchy, original: Scalar) -> Self {
		Self {
			value: original.to_string(),
			hierarchy,
			original,
			edited: false,
		}
	}

	/// The edited value with the type of the original scalar.
	pub fn typed_value(&self) -> ConfixResult<Scalar> {
		self.original.convert(&self.value, &self.hierarchy.to_string())
	}
}

impl ConfigEntry for ValueEntry {
	fn key(&self) -> &str {
		match self.hierarchy.last() {
			Some(Segment::Key(key)) => key,
			_ => "",
		}
	}

	fn path(&self) -> String {
		self.hierarchy.to_string()
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

/// A map key. The hierarchy ends with the key itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
	pub hierarchy: Hierarchy,
	key: String,
	value: String,
	edited: bool,
}

impl KeyEntry {
	pub fn new(hierarchy: Hierarchy, key: impl Into<String>) -> Self {
		let key = key.into();
		Self {
			hierarchy,
			value: key.clone(),
			key,
			edited: false,
		}
	}
}

impl ConfigEntry for KeyEntry {
	fn key(&self) -> &str {
		&self.key
	}

	fn path(&self) -> String {
		self.hierarchy.to_string()
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchicalEntry {
	Key(KeyEntry),
	Value(ValueEntry),
}

impl HierarchicalEntry {
	fn inner(&self) -> &dyn ConfigEntry {
		match self {
			HierarchicalEntry::Key(entry) => entry,
			HierarchicalEntry::Value(entry) => entry,
		}
	}

	fn inner_mut(&mut self) -> &mut dyn ConfigEntry {
		match self {
			HierarchicalEntry::Key(entry) => entry,
			HierarchicalEntry::Value(entry) => entry,
		}
	}
}

impl ConfigEntry for HierarchicalEntry {
	fn key(&self) -> &str {
		self.inner().key()
	}

	fn path(&self) -> String {
		self.inner().path()
	}

	fn value(&self) -> String {
		self.inner().value()
	}

	fn set_value(&mut self, value: String) {
		self.inner_mut().set_value(value);
	}

	fn is_edited(&self) -> bool {
		self.inner().is_edited()
	}
}

/// Flatten `root` into entries in document order. Every map key yields a
/// [`KeyEntry`] followed by the entries of its value.
pub fn linearize<N: TreeNode>(root: &N) -> ConfixResult<Vec<HierarchicalEntry>> {
	let mut entries = vec![];
	linearize_into(root, &Hierarchy::root(), &mut entries)?;
	Ok(entries)
}

fn linearize_into<N: TreeNode>(
	node: &N,
	hierarchy: &Hierarchy,
	entries: &mut Vec<HierarchicalEntry>,
) -> ConfixResult<()> {
	match node.kind() {
		NodeKind::Map(keys) => {
			for key in keys {
				let segment = Segment::Key(key.clone());
				let child_hierarchy = hierarchy.child(segment.clone());
				let child = node
					.child(&segment)
					.ok_or_else(|| ConfixError::PathNotFound(child_hierarchy.to_string()))?;

				entries.push(HierarchicalEntry::Key(KeyEntry::new(
					child_hierarchy.clone(),
					key,
				)));
				linearize_into(child, &child_hierarchy, entries)?;
			}
		}
		NodeKind::Sequence(len) => {
			for index in 0..len {
				let segment = Segment::Index(index);
				let child_hierarchy = hierarchy.child(segment.clone());
				let child = node
					.child(&segment)
					.ok_or_else(|| ConfixError::PathNotFound(child_hierarchy.to_string()))?;

				linearize_into(child, &child_hierarchy, entries)?;
			}
		}
		NodeKind::Scalar(scalar) => {
			entries.push(HierarchicalEntry::Value(ValueEntry::new(
				hierarchy.clone(),
				scalar,
			)));
		}
		NodeKind::Unsupported(type_name) => {
			return Err(ConfixError::UnsupportedType {
				path: hierarchy.to_string(),
				type_name,
			});
		}
	}

	Ok(())
}

/// Write the edited entries back into `root`.
pub fn apply<N: TreeNode>(root: &mut N, entries: &[HierarchicalEntry]) -> ConfixResult<()> {
	for entry in entries {
		let HierarchicalEntry::Value(entry) = entry else {
			continue;
		};

		if !entry.is_edited() {
			continue;
		}

		let value = entry.typed_value()?;
		let node = resolve_mut(root, &entry.hierarchy)
			.ok_or_else(|| ConfixError::PathNotFound(entry.path()))?;
		node.set_scalar(value);
	}

	let mut renames: Vec<&KeyEntry> = entries
		.iter()
		.filter_map(|entry| {
			match entry {
				// A key that renders empty keeps its original name.
				HierarchicalEntry::Key(entry) if entry.is_edited() && !entry.value().is_empty() => {
					Some(entry)
				}
				_ => None,
			}
		})
		.collect();
	renames.sort_by(|a, b| b.hierarchy.len().cmp(&a.hierarchy.len()));

	for entry in renames {
		let parent_hierarchy = entry.hierarchy.parent().unwrap_or_default();
		let renamed = resolve_mut(root, &parent_hierarchy)
			.is_some_and(|parent| parent.rename_key(entry.key(), entry.value()));

		if !renamed {
			return Err(ConfixError::PathNotFound(entry.path()));
		}
	}

	Ok(())
}

/// A parsed nested document together with its entries.
#[derive(Debug, Clone)]
pub struct TreeDocument<N> {
	root: N,
	entries: Vec<HierarchicalEntry>,
}

impl<N: TreeNode> TreeDocument<N> {
	pub fn new(root: N) -> ConfixResult<Self> {
		let entries = linearize(&root)?;
		Ok(Self { root, entries })
	}

	pub fn entries(&self) -> &[HierarchicalEntry] {
		&self.entries
	}

	pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut dyn ConfigEntry> + '_ {
		self.entries
			.iter_mut()
			.map(|entry| entry as &mut dyn ConfigEntry)
	}

	/// Apply the edited entries and return the updated tree.
	pub fn apply(&mut self) -> ConfixResult<&N> {
		apply(&mut self.root, &self.entries)?;
		Ok(&self.root)
	}
}
