use std::cell::RefCell;
use std::io::Read;
use std::io::Write;
use std::rc::Rc;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::BytesCData;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;

use super::ConfigFileHandler;
use super::FileType;
use super::document_error;
use super::read_to_string;
use super::write_error;
use crate::ConfigEntry;
use crate::ConfixResult;
use crate::TemplateEngine;

/// A node of the parsed document.
#[derive(Debug, Clone)]
pub enum XmlNode {
	Element(Rc<RefCell<XmlElement>>),
	/// Character data, stored unescaped.
	Text(String),
	/// A CDATA section, stored verbatim.
	CData(String),
	/// Comments, declarations, processing instructions and doctypes, which
	/// are written back unchanged.
	Other(Event<'static>),
}

#[derive(Debug, Clone, Default)]
pub struct XmlElement {
	pub name: String,
	/// Attributes in document order, values unescaped.
	pub attributes: Vec<(String, String)>,
	pub children: Vec<XmlNode>,
}

impl XmlElement {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Default::default()
		}
	}

	/// Replace the value of `key`, appending the attribute when it is missing.
	pub fn set_attribute(&mut self, key: &str, value: String) {
		match self.attributes.iter_mut().find(|(name, _)| name == key) {
			Some((_, current)) => *current = value,
			None => self.attributes.push((key.to_string(), value)),
		}
	}

	/// Index of the child holding this element's templatable text: the first
	/// CDATA section or non-blank text node.
	fn text_index(&self) -> Option<usize> {
		self.children.iter().position(|child| {
			match child {
				XmlNode::CData(_) => true,
				XmlNode::Text(text) => !text.trim().is_empty(),
				_ => false,
			}
		})
	}
}

/// Element text. Reads and writes go straight through to the shared node.
#[derive(Debug, Clone)]
pub struct XmlElementEntry {
	element: Rc<RefCell<XmlElement>>,
	text_index: usize,
	key: String,
	path: String,
	edited: bool,
}

impl ConfigEntry for XmlElementEntry {
	fn key(&self) -> &str {
		&self.key
	}

	fn path(&self) -> String {
		self.path.clone()
	}

	fn value(&self) -> String {
		match self.element.borrow().children.get(self.text_index) {
			Some(XmlNode::Text(text) | XmlNode::CData(text)) => text.clone(),
			_ => String::new(),
		}
	}

	fn set_value(&mut self, value: String) {
		let mut element = self.element.borrow_mut();
		let Some(XmlNode::Text(text) | XmlNode::CData(text)) =
			element.children.get_mut(self.text_index)
		else {
			return;
		};

		if *text != value {
			*text = value;
			self.edited = true;
		}
	}

	fn is_edited(&self) -> bool {
		self.edited
	}

	/// CDATA text is rendered during parsing.
	fn is_rendered(&self) -> bool {
		matches!(
			self.element.borrow().children.get(self.text_index),
			Some(XmlNode::CData(_))
		)
	}
}

/// An attribute value copy. Edited values are set on the owning element when
/// the document is written.
#[derive(Debug, Clone)]
pub struct XmlAttributeEntry {
	element: Rc<RefCell<XmlElement>>,
	key: String,
	path: String,
	value: String,
	edited: bool,
}

impl ConfigEntry for XmlAttributeEntry {
	fn key(&self) -> &str {
		&self.key
	}

	fn path(&self) -> String {
		self.path.clone()
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

#[derive(Debug, Clone)]
pub enum XmlEntry {
	Element(XmlElementEntry),
	Attribute(XmlAttributeEntry),
}

impl XmlEntry {
	fn inner(&self) -> &dyn ConfigEntry {
		match self {
			XmlEntry::Element(entry) => entry,
			XmlEntry::Attribute(entry) => entry,
		}
	}

	fn inner_mut(&mut self) -> &mut dyn ConfigEntry {
		match self {
			XmlEntry::Element(entry) => entry,
			XmlEntry::Attribute(entry) => entry,
		}
	}
}

impl ConfigEntry for XmlEntry {
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

	fn is_rendered(&self) -> bool {
		self.inner().is_rendered()
	}
}

/// XML documents.
///
/// CDATA sections are templated while the document is read, so their content
/// never has to survive a round trip through plain text.
pub struct XmlHandler<'e> {
	engine: &'e TemplateEngine,
	nodes: Vec<XmlNode>,
	entries: Vec<XmlEntry>,
}

impl std::fmt::Debug for XmlHandler<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("XmlHandler")
			.field("nodes", &self.nodes)
			.field("entries", &self.entries)
			.finish_non_exhaustive()
	}
}

impl<'e> XmlHandler<'e> {
	pub fn new(engine: &'e TemplateEngine) -> Self {
		Self {
			engine,
			nodes: vec![],
			entries: vec![],
		}
	}

	/// The document element.
	pub fn root(&self) -> Option<Rc<RefCell<XmlElement>>> {
		self.nodes.iter().find_map(|node| {
			match node {
				XmlNode::Element(element) => Some(Rc::clone(element)),
				_ => None,
			}
		})
	}

	fn parse(&self, content: &str) -> ConfixResult<Vec<XmlNode>> {
		let mut reader = Reader::from_str(content);
		let mut nodes: Vec<XmlNode> = vec![];
		let mut stack: Vec<Rc<RefCell<XmlElement>>> = vec![];

		loop {
			let event = reader.read_event().map_err(|e| {
				document_error(
					FileType::Xml,
					format!("{e} at byte {}", reader.error_position()),
				)
			})?;

			let node = match event {
				Event::Eof => break,
				Event::Start(start) => {
					let element = Rc::new(RefCell::new(element_from_start(&start)?));
					push_node(&mut nodes, &stack, XmlNode::Element(Rc::clone(&element)));
					stack.push(element);
					continue;
				}
				Event::End(_) => {
					stack.pop();
					continue;
				}
				Event::Empty(start) => {
					XmlNode::Element(Rc::new(RefCell::new(element_from_start(&start)?)))
				}
				Event::Text(text) => {
					let text = text.unescape().map_err(|e| document_error(FileType::Xml, e))?;
					XmlNode::Text(text.into_owned())
				}
				Event::CData(cdata) => {
					let raw = std::str::from_utf8(&cdata).map_err(|e| document_error(FileType::Xml, e))?;
					XmlNode::CData(self.engine.render(raw)?.into_string())
				}
				other => XmlNode::Other(other.into_owned()),
			};

			push_node(&mut nodes, &stack, node);
		}

		if !stack.is_empty() {
			return Err(document_error(FileType::Xml, "unexpected end of document"));
		}

		Ok(nodes)
	}
}

fn element_from_start(start: &BytesStart<'_>) -> ConfixResult<XmlElement> {
	let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));

	for attribute in start.attributes() {
		let attribute = attribute.map_err(|e| document_error(FileType::Xml, e))?;
		let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
		let value = attribute
			.unescape_value()
			.map_err(|e| document_error(FileType::Xml, e))?
			.into_owned();
		element.attributes.push((key, value));
	}

	Ok(element)
}

fn push_node(nodes: &mut Vec<XmlNode>, stack: &[Rc<RefCell<XmlElement>>], node: XmlNode) {
	match stack.last() {
		Some(parent) => parent.borrow_mut().children.push(node),
		None => nodes.push(node),
	}
}

/// Depth first: the element's text, its attributes, then its children.
fn collect_entries(element: &Rc<RefCell<XmlElement>>, parent_path: &str, entries: &mut Vec<XmlEntry>) {
	let node = element.borrow();
	let path = format!("{parent_path}/{}", node.name);

	if let Some(text_index) = node.text_index() {
		entries.push(XmlEntry::Element(XmlElementEntry {
			element: Rc::clone(element),
			text_index,
			key: node.name.clone(),
			path: path.clone(),
			edited: false,
		}));
	}

	for (key, value) in &node.attributes {
		entries.push(XmlEntry::Attribute(XmlAttributeEntry {
			element: Rc::clone(element),
			key: key.clone(),
			path: format!("{path}@{key}"),
			value: value.clone(),
			edited: false,
		}));
	}

	for child in &node.children {
		if let XmlNode::Element(child) = child {
			collect_entries(child, &path, entries);
		}
	}
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &XmlNode) -> ConfixResult<()> {
	match node {
		XmlNode::Element(element) => {
			let element = element.borrow();
			let mut start = BytesStart::new(element.name.as_str());
			for (key, value) in &element.attributes {
				start.push_attribute((key.as_str(), value.as_str()));
			}

			if element.children.is_empty() {
				writer
					.write_event(Event::Empty(start))
					.map_err(|e| write_error(FileType::Xml, e))?;
				return Ok(());
			}

			writer
				.write_event(Event::Start(start))
				.map_err(|e| write_error(FileType::Xml, e))?;
			for child in &element.children {
				write_node(writer, child)?;
			}
			writer
				.write_event(Event::End(BytesEnd::new(element.name.as_str())))
				.map_err(|e| write_error(FileType::Xml, e))?;
		}
		XmlNode::Text(text) => {
			writer
				.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))
				.map_err(|e| write_error(FileType::Xml, e))?;
		}
		XmlNode::CData(text) => {
			// `]]>` cannot appear inside a section, so it is split across two.
			for section in BytesCData::escaped(text) {
				writer
					.write_event(Event::CData(section))
					.map_err(|e| write_error(FileType::Xml, e))?;
			}
		}
		XmlNode::Other(event) => {
			writer
				.write_event(event.clone())
				.map_err(|e| write_error(FileType::Xml, e))?;
		}
	}

	Ok(())
}

impl ConfigFileHandler for XmlHandler<'_> {
	fn read(&mut self, reader: &mut dyn Read) -> ConfixResult<()> {
		let content = read_to_string(reader, FileType::Xml)?;
		self.nodes = self.parse(&content)?;

		let root = self
			.root()
			.ok_or_else(|| document_error(FileType::Xml, "no root element found"))?;

		self.entries.clear();
		collect_entries(&root, "", &mut self.entries);

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
		for entry in &self.entries {
			if let XmlEntry::Attribute(attribute) = entry {
				if attribute.edited {
					attribute
						.element
						.borrow_mut()
						.set_attribute(&attribute.key, attribute.value.clone());
				}
			}
		}

		let mut xml_writer = Writer::new(writer);
		for node in &self.nodes {
			write_node(&mut xml_writer, node)?;
		}

		Ok(())
	}
}
