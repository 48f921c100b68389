/*!
# XML writer

[`Writer`] serializes XML to any [`std::io::Write`] either call by call or
from a complete [`Document`]. Output is always UTF-8.

A start tag stays open after [`Writer::write_start_element`] so that
attributes and namespace declarations can follow; the next call which writes
anything else closes it.
*/
use std::io;

use bytes::{BufMut, BytesMut};
use log::warn;
use smartstring::alias::String as SmartString;

use picoxml_validation::{is_space, validate_name};

use crate::error::{Result, StateError};
use crate::escape::{escape_into, ATTR_SPECIALS, TEXT_SPECIALS};
use crate::model::{Attributes, CharRef, CharRefBase, Document, Element, Misc, Node};
use crate::strings::{Name, PREFIX_XML, PREFIX_XMLNS, XMLNS_XML};

/// Writer configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
	self_close_empty: bool,
	check_prefixes: bool,
}

impl WriterOptions {
	/// Write elements without content as `<x />` instead of `<x></x>`.
	pub fn self_close_empty(mut self, enabled: bool) -> Self {
		self.self_close_empty = enabled;
		self
	}

	/// Fail with [`StateError::UnknownPrefix`] when a start tag is
	/// completed with an element or attribute prefix that has no binding in
	/// scope.
	pub fn check_prefixes(mut self, enabled: bool) -> Self {
		self.check_prefixes = enabled;
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	DocumentNotOpened,
	/// Outside of the root element.
	DocumentOpen,
	/// Inside a start tag.
	ElementOpen,
	ElementClosedChildrenAllowed,
	DocumentClosed,
}

#[derive(Debug)]
struct OpenElement {
	prefix: Option<SmartString>,
	local_name: SmartString,
	// prefix ("" for the default namespace) and URI
	bindings: Vec<(SmartString, String)>,
	// names written into the start tag so far, namespace declarations
	// included
	attributes: Vec<Name>,
}

/**
# Streaming XML serializer

```rust
use picoxml::Writer;

let mut w = Writer::new(Vec::new());
w.write_start_document(None, Some("UTF-8")).unwrap();
w.write_start_element(None, "greeting").unwrap();
w.write_attribute(None, "to", "you & me").unwrap();
w.write_characters("1 < 2").unwrap();
w.write_empty_element(None, "x").unwrap();
w.write_end_element().unwrap();
w.write_end_document().unwrap();
assert_eq!(
	w.into_inner().unwrap(),
	b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><greeting to=\"you &amp; me\">1 &lt; 2<x /></greeting>"
);
```
*/
pub struct Writer<W: io::Write> {
	sink: W,
	buf: BytesMut,
	state: State,
	stack: Vec<OpenElement>,
	// the open start tag belongs to an empty element
	pending_empty: bool,
	root_written: bool,
	options: WriterOptions,
}

impl<W: io::Write> Writer<W> {
	pub fn new(sink: W) -> Self {
		Self::with_options(sink, WriterOptions::default())
	}

	pub fn with_options(sink: W, options: WriterOptions) -> Self {
		Self {
			sink,
			buf: BytesMut::with_capacity(1024),
			state: State::DocumentNotOpened,
			stack: Vec::new(),
			pending_empty: false,
			root_written: false,
			options,
		}
	}

	/// Number of elements which have been started but not ended.
	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	// hand the staged bytes to the sink
	fn drain(&mut self) -> Result<()> {
		if self.buf.len() > 0 {
			self.sink.write_all(&self.buf)?;
			self.buf.clear();
		}
		Ok(())
	}

	fn put_name(&mut self, prefix: Option<&str>, local_name: &str) {
		if let Some(prefix) = prefix {
			self.buf.put_slice(prefix.as_bytes());
			self.buf.put_u8(b':');
		}
		self.buf.put_slice(local_name.as_bytes());
	}

	fn put_attribute(&mut self, prefix: Option<&str>, local_name: &str, value: &str) {
		self.buf.put_u8(b' ');
		self.put_name(prefix, local_name);
		self.buf.put_slice(b"=\"");
		escape_into(&mut self.buf, value, ATTR_SPECIALS);
		self.buf.put_u8(b'"');
	}

	fn check_open(&self) -> Result<()> {
		match self.state {
			State::DocumentNotOpened => Err(StateError::DocumentNotOpen.into()),
			State::DocumentClosed => Err(StateError::DocumentClosed.into()),
			_ => Ok(()),
		}
	}

	fn check_prefix(&self, prefix: Option<&str>) -> Result<()> {
		match prefix {
			Some(prefix) if prefix != PREFIX_XMLNS => {
				if self.namespace_for_prefix(Some(prefix)).is_none() {
					return Err(StateError::UnknownPrefix(prefix.to_string()).into());
				}
				Ok(())
			}
			_ => Ok(()),
		}
	}

	// prefixes used by the open start tag must be bound
	fn check_start_tag(&self) -> Result<()> {
		if !self.options.check_prefixes {
			return Ok(());
		}
		if let Some(top) = self.stack.last() {
			self.check_prefix(top.prefix.as_deref())?;
			for name in top.attributes.iter() {
				if !name.is_namespace_declaration() {
					self.check_prefix(name.prefix())?;
				}
			}
		}
		Ok(())
	}

	// complete a pending start tag
	fn close_start_tag(&mut self) -> Result<()> {
		if self.state != State::ElementOpen {
			return Ok(());
		}
		self.check_start_tag()?;
		if self.pending_empty {
			self.pending_empty = false;
			self.buf.put_slice(b" />");
			self.pop_element();
		} else {
			self.buf.put_u8(b'>');
			self.state = State::ElementClosedChildrenAllowed;
		}
		Ok(())
	}

	fn pop_element(&mut self) {
		self.stack.pop();
		if self.stack.is_empty() {
			self.state = State::DocumentOpen;
			self.root_written = true;
		} else {
			self.state = State::ElementClosedChildrenAllowed;
		}
	}

	// state check for element content
	fn begin_content(&mut self) -> Result<()> {
		self.check_open()?;
		if self.state == State::DocumentOpen {
			return Err(StateError::ContentNotAllowed.into());
		}
		self.close_start_tag()
	}

	// state check for nodes which may also appear outside the root
	fn begin_misc(&mut self) -> Result<()> {
		self.check_open()?;
		self.close_start_tag()
	}

	// state check for attributes; also records the name on the open start
	// tag and rejects repeats
	fn begin_attribute(&mut self, prefix: Option<&str>, local_name: &str) -> Result<()> {
		self.check_open()?;
		if self.state != State::ElementOpen {
			return Err(StateError::AttributeNotAllowed.into());
		}
		let top = match self.stack.last_mut() {
			Some(top) => top,
			None => return Err(StateError::AttributeNotAllowed.into()),
		};
		let name = Name::new(prefix, local_name);
		if top.attributes.contains(&name) {
			return Err(StateError::DuplicateAttribute(name.to_string()).into());
		}
		top.attributes.push(name);
		Ok(())
	}

	/// Open the document and write the XML declaration.
	///
	/// The version defaults to `1.0`; the encoding is omitted if not given.
	/// The writer always produces UTF-8, whatever the declared encoding.
	pub fn write_start_document(&mut self, version: Option<&str>, encoding: Option<&str>) -> Result<()> {
		self.begin_document()?;
		self.buf.put_slice(b"<?xml");
		self.put_attribute(None, "version", version.unwrap_or("1.0"));
		if let Some(encoding) = encoding {
			self.put_attribute(None, "encoding", encoding);
		}
		self.buf.put_slice(b"?>");
		self.drain()
	}

	fn begin_document(&mut self) -> Result<()> {
		match self.state {
			State::DocumentNotOpened => {
				self.state = State::DocumentOpen;
				Ok(())
			}
			State::DocumentClosed => Err(StateError::DocumentClosed.into()),
			_ => Err(StateError::DocumentAlreadyOpen.into()),
		}
	}

	/// End all open elements and close the document.
	pub fn write_end_document(&mut self) -> Result<()> {
		self.check_open()?;
		while self.stack.len() > 0 {
			self.end_element();
		}
		self.state = State::DocumentClosed;
		self.drain()
	}

	fn start_element(&mut self, prefix: Option<&str>, local_name: &str, empty: bool) -> Result<()> {
		self.check_open()?;
		self.close_start_tag()?;
		if self.state == State::DocumentOpen && self.root_written {
			return Err(StateError::ElementNotAllowed.into());
		}
		self.buf.put_u8(b'<');
		self.put_name(prefix, local_name);
		self.stack.push(OpenElement {
			prefix: prefix.map(SmartString::from),
			local_name: local_name.into(),
			bindings: Vec::new(),
			attributes: Vec::new(),
		});
		self.state = State::ElementOpen;
		self.pending_empty = empty;
		self.drain()
	}

	/// Start an element; its start tag stays open for attributes.
	pub fn write_start_element(&mut self, prefix: Option<&str>, local_name: &str) -> Result<()> {
		self.start_element(prefix, local_name, false)
	}

	/// Start an element which is ended as soon as its start tag is
	/// complete, that is, with the next call writing anything other than an
	/// attribute or namespace declaration.
	pub fn write_empty_element(&mut self, prefix: Option<&str>, local_name: &str) -> Result<()> {
		self.start_element(prefix, local_name, true)
	}

	fn end_element(&mut self) {
		if self.state == State::ElementOpen {
			if self.pending_empty || self.options.self_close_empty {
				self.pending_empty = false;
				self.buf.put_slice(b" />");
				self.pop_element();
				return;
			}
			self.buf.put_u8(b'>');
		}
		if let Some(top) = self.stack.last() {
			self.buf.put_slice(b"</");
			if let Some(prefix) = top.prefix.as_deref() {
				self.buf.put_slice(prefix.as_bytes());
				self.buf.put_u8(b':');
			}
			self.buf.put_slice(top.local_name.as_bytes());
			self.buf.put_u8(b'>');
		}
		self.pop_element();
	}

	/// End the innermost open element.
	///
	/// A pending empty element is completed first, so this ends its parent.
	pub fn write_end_element(&mut self) -> Result<()> {
		self.check_open()?;
		if self.pending_empty {
			self.close_start_tag()?;
		} else if self.state == State::ElementOpen {
			self.check_start_tag()?;
		}
		if self.stack.is_empty() {
			return Err(StateError::NoOpenElement.into());
		}
		self.end_element();
		self.drain()
	}

	/// Add an attribute to the open start tag; the value is escaped.
	///
	/// Each name may appear only once per start tag.
	pub fn write_attribute(&mut self, prefix: Option<&str>, local_name: &str, value: &str) -> Result<()> {
		self.begin_attribute(prefix, local_name)?;
		self.put_attribute(prefix, local_name, value);
		self.drain()
	}

	/// Declare the default namespace on the open start tag.
	///
	/// The empty URI undeclares the default namespace.
	pub fn write_default_namespace(&mut self, uri: &str) -> Result<()> {
		self.begin_attribute(None, PREFIX_XMLNS)?;
		self.put_attribute(None, PREFIX_XMLNS, uri);
		if let Some(top) = self.stack.last_mut() {
			top.bindings.push((SmartString::new(), uri.to_string()));
		}
		self.drain()
	}

	/// Bind `prefix` to `uri` on the open start tag.
	pub fn write_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
		if uri.len() == 0 {
			return Err(StateError::EmptyNamespaceUri(prefix.to_string()).into());
		}
		self.begin_attribute(Some(PREFIX_XMLNS), prefix)?;
		self.put_attribute(Some(PREFIX_XMLNS), prefix, uri);
		if let Some(top) = self.stack.last_mut() {
			top.bindings.push((prefix.into(), uri.to_string()));
		}
		self.drain()
	}

	/// Namespace URI bound to `prefix` (or the default namespace for `None`)
	/// by the open elements.
	pub fn namespace_for_prefix(&self, prefix: Option<&str>) -> Option<&str> {
		let wanted = prefix.unwrap_or("");
		for element in self.stack.iter().rev() {
			for (bound, uri) in element.bindings.iter().rev() {
				if bound.as_str() == wanted {
					if uri.len() == 0 {
						return None;
					}
					return Some(uri.as_str());
				}
			}
		}
		if wanted == PREFIX_XML {
			return Some(XMLNS_XML);
		}
		None
	}

	/// Innermost prefix currently bound to `uri`; the empty string stands
	/// for the default namespace.
	pub fn prefix_for_namespace(&self, uri: &str) -> Option<&str> {
		for element in self.stack.iter().rev() {
			for (prefix, bound) in element.bindings.iter().rev() {
				if bound.as_str() != uri {
					continue;
				}
				let lookup = if prefix.len() == 0 {
					None
				} else {
					Some(prefix.as_str())
				};
				// skip bindings shadowed further in
				if self.namespace_for_prefix(lookup) == Some(uri) {
					return Some(prefix.as_str());
				}
			}
		}
		if uri == XMLNS_XML {
			return Some(PREFIX_XML);
		}
		None
	}

	/// Write escaped character data.
	pub fn write_characters(&mut self, text: &str) -> Result<()> {
		self.begin_content()?;
		escape_into(&mut self.buf, text, TEXT_SPECIALS);
		self.drain()
	}

	/// Write whitespace verbatim; allowed outside of the root element too.
	pub fn write_whitespace(&mut self, text: &str) -> Result<()> {
		if !text.chars().all(is_space) {
			return Err(StateError::NotWhitespace.into());
		}
		self.begin_misc()?;
		self.buf.put_slice(text.as_bytes());
		self.drain()
	}

	/// Write a CDATA section; `data` must not contain `]]>`.
	pub fn write_cdata(&mut self, data: &str) -> Result<()> {
		if data.contains("]]>") {
			return Err(StateError::MalformedContent("CDATA section contains ']]>'").into());
		}
		self.begin_content()?;
		self.buf.put_slice(b"<![CDATA[");
		self.buf.put_slice(data.as_bytes());
		self.buf.put_slice(b"]]>");
		self.drain()
	}

	/// Write a comment; `data` must not contain `--` or end with `-`.
	pub fn write_comment(&mut self, data: &str) -> Result<()> {
		if data.contains("--") || data.ends_with('-') {
			return Err(StateError::MalformedContent(
				"comment contains '--' or ends with '-'",
			)
			.into());
		}
		self.begin_misc()?;
		self.buf.put_slice(b"<!--");
		self.buf.put_slice(data.as_bytes());
		self.buf.put_slice(b"-->");
		self.drain()
	}

	pub fn write_entity_ref(&mut self, name: &str) -> Result<()> {
		self.begin_content()?;
		self.buf.put_u8(b'&');
		self.buf.put_slice(name.as_bytes());
		self.buf.put_u8(b';');
		self.drain()
	}

	/// Write a character reference in its recorded base.
	pub fn write_char_ref(&mut self, reference: &CharRef) -> Result<()> {
		self.begin_content()?;
		self.buf.put_slice(b"&#");
		if reference.base() == CharRefBase::Hexadecimal {
			self.buf.put_u8(b'x');
		}
		self.buf.put_slice(reference.digits().as_bytes());
		self.buf.put_u8(b';');
		self.drain()
	}

	/// Write a processing instruction.
	///
	/// The target must be a name other than `xml` in any case, and the
	/// data must not contain `?>`.
	pub fn write_processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<()> {
		if validate_name(target).is_err() {
			return Err(StateError::MalformedContent(
				"processing instruction target is not a name",
			)
			.into());
		}
		if target.eq_ignore_ascii_case(PREFIX_XML) {
			return Err(StateError::MalformedContent(
				"processing instruction target 'xml' is reserved",
			)
			.into());
		}
		if data.map(|d| d.contains("?>")).unwrap_or(false) {
			return Err(StateError::MalformedContent(
				"processing instruction data contains '?>'",
			)
			.into());
		}
		self.begin_misc()?;
		self.buf.put_slice(b"<?");
		self.buf.put_slice(target.as_bytes());
		match data {
			Some(data) if data.len() > 0 => {
				self.buf.put_u8(b' ');
				self.buf.put_slice(data.as_bytes());
			}
			_ => (),
		}
		self.buf.put_slice(b"?>");
		self.drain()
	}

	/// Write a complete document.
	///
	/// The XML declaration is written with its pseudo-attributes as stored;
	/// text is escaped, everything else is written verbatim.
	pub fn write_document(&mut self, doc: &Document) -> Result<()> {
		self.begin_document()?;
		if let Some(declaration) = doc.declaration() {
			self.put_declaration(declaration.attributes());
		}
		for misc in doc.before() {
			self.write_misc(misc)?;
		}
		self.write_tree(doc.root())?;
		for misc in doc.after() {
			self.write_misc(misc)?;
		}
		self.write_end_document()
	}

	fn put_declaration(&mut self, attributes: &Attributes) {
		self.buf.put_slice(b"<?xml");
		for attr in attributes {
			self.put_attribute(attr.prefix(), attr.local_name(), attr.value());
		}
		self.buf.put_slice(b"?>");
	}

	fn write_misc(&mut self, misc: &Misc) -> Result<()> {
		match misc {
			Misc::Comment(data) => self.write_comment(data),
			Misc::ProcessingInstruction(pi) => {
				self.write_processing_instruction(pi.target(), Some(pi.data()))
			}
			Misc::WhiteSpace(ws) => self.write_whitespace(ws),
		}
	}

	fn write_element_head(&mut self, element: &Element) -> Result<()> {
		self.write_start_element(element.prefix(), element.local_name())?;
		for attr in element.attributes() {
			if !attr.is_namespace_declaration() {
				self.write_attribute(attr.prefix(), attr.local_name(), attr.value())?;
			} else if attr.prefix().is_none() {
				self.write_default_namespace(attr.value())?;
			} else {
				self.write_namespace(attr.local_name(), attr.value())?;
			}
		}
		Ok(())
	}

	// iterative, so that deep trees do not exhaust the call stack
	fn write_tree(&mut self, root: &Element) -> Result<()> {
		self.write_element_head(root)?;
		let mut stack = vec![root.children().iter()];
		while let Some(children) = stack.last_mut() {
			let node = match children.next() {
				Some(node) => node,
				None => {
					stack.pop();
					self.write_end_element()?;
					continue;
				}
			};
			match node {
				Node::Element(element) => {
					self.write_element_head(element)?;
					stack.push(element.children().iter());
				}
				Node::Text(text) => self.write_characters(text)?,
				Node::WhiteSpace(ws) => self.write_whitespace(ws)?,
				Node::CData(data) => self.write_cdata(data)?,
				Node::Comment(data) => self.write_comment(data)?,
				Node::ProcessingInstruction(pi) => {
					self.write_processing_instruction(pi.target(), Some(pi.data()))?
				}
				Node::EntityRef(name) => self.write_entity_ref(name)?,
				Node::CharRef(reference) => self.write_char_ref(reference)?,
			}
		}
		Ok(())
	}

	/// Flush the underlying sink.
	pub fn flush(&mut self) -> Result<()> {
		self.drain()?;
		self.sink.flush()?;
		Ok(())
	}

	/// Flush and release the sink.
	///
	/// The sink is dropped even if elements are still open; that case is
	/// reported as [`StateError::UnclosedElements`].
	pub fn close(mut self) -> Result<()> {
		let flushed = self.flush();
		let open = self.stack.len();
		drop(self);
		flushed?;
		if open > 0 {
			warn!("writer closed with {} element(s) still open", open);
			return Err(StateError::UnclosedElements(open).into());
		}
		Ok(())
	}

	/// Flush and return the sink, regardless of the document state.
	pub fn into_inner(mut self) -> Result<W> {
		self.flush()?;
		Ok(self.sink)
	}
}
